//! CLI command implementations

pub mod cache;
pub mod config;
pub mod lock;

pub use cache::execute as cache;
pub use config::execute as config;
pub use lock::execute as lock;
