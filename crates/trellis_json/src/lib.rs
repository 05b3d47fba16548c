#![doc = include_str!("../README.md")]

// -----------------------------------------------------------------------------
// Modules

mod config;
mod engine;
mod error;

pub mod de;
pub mod describe;
pub mod meta;
pub mod ser;
pub mod token;
pub mod writer;

// -----------------------------------------------------------------------------
// Top-Level exports

pub use config::{EngineConfig, TypeAliases, TypeMetadataMode, UnknownKeys};
pub use describe::Rule;
pub use engine::Engine;
pub use error::{DeserializeError, SerializeError};
