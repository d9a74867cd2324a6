//! # Gatewayエンドポイント

pub mod health;
pub mod ipfs_metadata;
pub mod kms_address;
pub mod kms_sign_digest;
pub mod send_raw_transaction;

#[cfg(test)]
pub mod test_helpers;

pub use health::handle_health;
pub use ipfs_metadata::{handle_batch_ipfs_metadata, handle_ipfs_metadata};
pub use kms_address::handle_kms_address;
pub use kms_sign_digest::handle_kms_sign_digest;
pub use send_raw_transaction::handle_send_raw_transaction;
