pub mod rpc;
pub mod wallet;

pub use rpc::{parse_commitment, SolanaClient};
pub use wallet::{parse_address, WalletError, WalletManager};
