//! Mirror run configuration.
//!
//! Split between core types and the type-safe builder pattern.

pub mod builder;
pub mod types;

pub use builder::MirrorConfigBuilder;
pub use types::MirrorConfig;
