pub mod client;
pub mod protocol;
pub mod signer;
pub mod types;

pub use client::ExchangeClient;
pub use protocol::ApiVariant;
pub use signer::Signer;
