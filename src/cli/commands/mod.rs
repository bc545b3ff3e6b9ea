//! CLI command implementations

pub mod config;
pub mod releases;
pub mod resolve;

pub use config::execute as config;
pub use releases::execute as releases;
pub use resolve::execute as resolve;
