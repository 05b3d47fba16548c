#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use trellis_json as json;
pub use trellis_reflect as reflect;

pub use trellis_json::{DeserializeError, Engine, EngineConfig, SerializeError};
pub use trellis_reflect::{DynValue, Shared, derive};
