//! Protocol buffer types for Terraform Plugin Protocol v6.9
//!
//! Generated at build time by tonic-build from `proto/tfplugin6.9.proto`.
//!
//! Request/Response types are nested in snake_case modules per RPC
//! (e.g. `read_resource::Request`). Several generated types share names with
//! framework types, so always refer to them with the `proto::` prefix:
//!
//! ```rust,ignore
//! let wire = tfplug::proto::DynamicValue::default();   // msgpack/json bytes
//! let value = tfplug::DynamicValue::null();             // framework value
//! ```

include!(concat!(env!("OUT_DIR"), "/tfplugin6.rs"));

pub use provider_server::{Provider as ProviderService, ProviderServer};
