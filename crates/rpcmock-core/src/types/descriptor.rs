//! Service and method descriptors.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Streaming shape of an RPC method
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MethodKind {
    Unary,
    ServerStreaming,
    ClientStreaming,
    #[serde(rename = "bidi_streaming")]
    BiDiStreaming,
}

impl MethodKind {
    pub fn is_unary(self) -> bool {
        self == MethodKind::Unary
    }
}

impl fmt::Display for MethodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MethodKind::Unary => "unary",
            MethodKind::ServerStreaming => "server_streaming",
            MethodKind::ClientStreaming => "client_streaming",
            MethodKind::BiDiStreaming => "bidi_streaming",
        };
        f.write_str(name)
    }
}

/// RPC method definition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MethodDescriptor {
    /// Wire name, as it appears in the request path (e.g. `Say`)
    pub name: String,
    /// Streaming shape
    pub kind: MethodKind,
    /// Fully qualified input message type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<String>,
    /// Fully qualified output message type
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>, kind: MethodKind) -> Self {
        Self {
            name: name.into(),
            kind,
            input: None,
            output: None,
        }
    }

    pub fn unary(name: impl Into<String>) -> Self {
        Self::new(name, MethodKind::Unary)
    }
}

/// RPC service definition.
///
/// Methods are keyed by their local name (`say`), which is the key test code
/// uses in partial implementation maps. The wire name lives on the method.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDescriptor {
    /// Fully qualified service name (e.g. `connectrpc.eliza.v1.ElizaService`)
    pub type_name: String,
    /// Methods by local name
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDescriptor>,
}

impl ServiceDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            methods: BTreeMap::new(),
        }
    }

    /// Add a method under its local name
    pub fn with_method(mut self, local_name: impl Into<String>, method: MethodDescriptor) -> Self {
        self.methods.insert(local_name.into(), method);
        self
    }

    /// Look up a method by local name
    pub fn method(&self, local_name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(local_name)
    }

    /// Look up a method by wire name
    pub fn method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.values().find(|m| m.name == name)
    }

    /// Identity of one of this service's methods
    pub fn identity(&self, method: &MethodDescriptor) -> MethodIdentity {
        MethodIdentity::new(&self.type_name, &method.name)
    }
}

/// Key used for override comparisons: service type name plus method wire name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MethodIdentity {
    pub service: String,
    pub method: String,
}

impl MethodIdentity {
    pub fn new(service: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            method: method.into(),
        }
    }
}

impl fmt::Display for MethodIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service, self.method)
    }
}
