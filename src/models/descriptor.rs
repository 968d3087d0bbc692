//! Operation descriptors for documentation and tooling.

use serde::Serialize;

/// Static description of one operation a resource exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationDescriptor {
    /// Operation name (`create`, `get`, ...).
    pub name: &'static str,

    /// HTTP method used on the wire.
    pub method: &'static str,

    /// Endpoint template relative to the zone base URL (e.g. `/Tickets/{id}`).
    pub endpoint: String,

    /// Parameters the caller must supply.
    pub required_params: Vec<&'static str>,

    /// Parameters the caller may supply.
    pub optional_params: Vec<&'static str>,

    /// Declared return type name.
    pub returns: &'static str,
}
