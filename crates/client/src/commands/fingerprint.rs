//! Print the host device fingerprint

use anyhow::Result;
use clap::Parser;
use client_bootstrap::HostProbe;
use run_core::DeviceFingerprint;

/// Print this host's device fingerprint
#[derive(Parser, Debug)]
pub struct Fingerprint {
    /// Also print the attributes the hash was derived from
    #[arg(short, long)]
    pub verbose: bool,
}

impl Fingerprint {
    pub fn execute(self) -> Result<()> {
        let fingerprint = DeviceFingerprint::compute(&HostProbe::new());
        println!("{}", fingerprint.hash);

        if self.verbose {
            println!("version: {}", fingerprint.version);
            if let Some(attributes) = &fingerprint.attributes {
                println!("canonical: {}", attributes.canonical_string());
            }
        }
        Ok(())
    }
}
