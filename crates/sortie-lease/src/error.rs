//! Error types for the lease layer.

/// Errors returned by [`LeaseRegistry`](crate::LeaseRegistry).
#[derive(Debug, thiserror::Error)]
pub enum LeaseError {
    /// A lease must last at least one tick.
    #[error("lease for {0} must last at least one tick")]
    ZeroLifetime(String),
}
