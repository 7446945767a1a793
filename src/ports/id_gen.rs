//! ID generator port.

/// Produces the opaque unique part of task identifiers.
pub trait IdGenerator: Send + Sync {
    /// Generates a new unique identifier string.
    fn generate_id(&self) -> String;
}
