//! # Addresses for workers and mailboxes.
//!
//! An [`Address`] is a globally unique, immutable 128-bit identifier. The
//! runtime uses the same identifier space for worker identities and mailbox
//! identities; by convention a worker's "own" mailbox shares the worker's
//! address, but the dispatcher never distinguishes the two.
//!
//! Addresses are random (UUID v4), so uniqueness is probabilistic and the
//! runtime does not defend against collisions of freshly generated values.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Globally unique identifier for a worker or a mailbox.
///
/// Cheap to copy, hashable, and stable for the lifetime of the entity it
/// names. Serializes as the canonical hyphenated UUID string, which is also
/// the form task documents use.
///
/// ## Example
/// ```rust
/// use worknode::Address;
///
/// let a = Address::generate();
/// let b: Address = a.to_string().parse().unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(Uuid);

impl Address {
    /// Generates a fresh random address.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID.
    ///
    /// Useful when the embedding application derives addresses
    /// deterministically (e.g. from configuration).
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Address {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::from_str(s).map(Self)
    }
}

impl From<Uuid> for Address {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}
