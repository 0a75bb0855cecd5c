pub mod cache;
pub mod encoding;
pub mod error;
pub mod http;
pub mod serde;
