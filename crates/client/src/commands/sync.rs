//! Fetch relay-signed progress

use anyhow::Result;
use clap::Parser;
use client_bootstrap::{ClientConfig, RuntimeBuilder};
use client_claim_core::Address;
use runtime::UnsupportedSampler;

/// Fetch relay-signed progress for a wallet
#[derive(Parser, Debug)]
pub struct SyncProgress {
    /// Wallet address (0x-prefixed hex)
    pub wallet: Address,
}

impl SyncProgress {
    pub async fn execute(self, config: ClientConfig) -> Result<()> {
        let runtime = RuntimeBuilder::new(config)
            .sampler(UnsupportedSampler)
            .build()
            .await?;

        let synced = runtime.handle().sync_progress(self.wallet).await?;
        println!("{}", serde_json::to_string_pretty(&synced.snapshot)?);
        if let Some(digest) = synced.digest {
            println!("digest: 0x{}", hex::encode(digest));
        }

        runtime.shutdown().await?;
        Ok(())
    }
}
