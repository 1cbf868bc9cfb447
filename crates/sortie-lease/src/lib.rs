//! Tick-counted leases on temporary resources.
//!
//! A lease is a countdown attached to a resource key. The tick driver
//! calls [`LeaseRegistry::tick`] once per tick; when a countdown reaches
//! zero the lease is forgotten and the caller's destroy callback runs for
//! that key exactly once.
//!
//! The registry is generic over the key so it can track any resource the
//! host can name. Sortie itself uses it with `WorldKey`.

mod error;
mod registry;

pub use error::LeaseError;
pub use registry::LeaseRegistry;
