//! Mock router options.

use serde::{Deserialize, Serialize};

/// Default upper bound on bytes drained from one response body
pub const DEFAULT_READ_MAX_BYTES: u64 = 0xFFFF_FFFF;

/// JSON format options forwarded to the RPC router
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonOptions {
    /// Ignore unknown fields when reading JSON
    pub ignore_unknown_fields: bool,
    /// Emit fields holding their default value
    pub emit_default_values: bool,
    /// Write enum values as integers
    pub enum_as_integer: bool,
    /// Use proto field names instead of lowerCamelCase
    pub use_proto_field_name: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            ignore_unknown_fields: true,
            emit_default_values: false,
            enum_as_integer: false,
            use_proto_field_name: false,
        }
    }
}

/// Binary wire format options forwarded to the RPC router
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct BinaryOptions {
    pub read_unknown_fields: bool,
    pub write_unknown_fields: bool,
}

impl Default for BinaryOptions {
    fn default() -> Self {
        Self {
            read_unknown_fields: true,
            write_unknown_fields: true,
        }
    }
}

/// Format options handed to the router with every handler it builds
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouterOptions {
    pub json_options: JsonOptions,
    pub binary_options: BinaryOptions,
}

/// Options for a [`MockRouter`](crate::MockRouter)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MockRouterOptions {
    /// Base URL of the API server whose routes are intercepted
    pub base_url: String,
    #[serde(default)]
    pub json_options: JsonOptions,
    #[serde(default)]
    pub binary_options: BinaryOptions,
    /// Maximum number of bytes drained from a mocked response body
    #[serde(default = "default_read_max_bytes")]
    pub read_max_bytes: u64,
}

fn default_read_max_bytes() -> u64 {
    DEFAULT_READ_MAX_BYTES
}

impl MockRouterOptions {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            json_options: JsonOptions::default(),
            binary_options: BinaryOptions::default(),
            read_max_bytes: DEFAULT_READ_MAX_BYTES,
        }
    }

    pub fn router_options(&self) -> RouterOptions {
        RouterOptions {
            json_options: self.json_options.clone(),
            binary_options: self.binary_options.clone(),
        }
    }
}
