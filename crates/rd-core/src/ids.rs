//! Strongly typed string identifier wrappers.
//!
//! Node, region and holder identifiers come from in-world configuration and
//! vehicle records, so they are opaque strings rather than dense indices.
//! All IDs are `Clone + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  Ordering is lexicographic on the
//! underlying string, which is what every deterministic tie-break in the
//! workspace relies on.

use std::borrow::Borrow;
use std::fmt;

/// Generate a typed ID wrapper around a `String`.
macro_rules! string_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        $vis struct $name(String);

        impl $name {
            #[inline]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// `true` for the empty string, which is never a valid identifier.
            #[inline]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a topology node, unique within a network region.
    pub struct NodeId;
}

string_id! {
    /// Identifier of an independently built network region.
    pub struct RegionId;
}

string_id! {
    /// Identifier of an occupancy claim holder (usually a vehicle).
    pub struct HolderId;
}
