//! Lynx - Agent wallet trading engine for Solana/Jupiter
//!
//! Runs buy/hold/sell cycles per agent wallet and moves SOL between a
//! user's wallets.

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (secrets go here, not in lynx.toml)
    dotenvy::dotenv().ok();

    let app = lynx::adapters::cli::init();
    lynx::adapters::cli::execute(app).await
}
