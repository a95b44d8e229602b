//! Type-safe index wrappers for consumers and goods.
//!
//! An economy addresses its consumers and goods by position: consumer `i`
//! is the `i`-th bliss point / endowment pair, good `k` is the `k`-th
//! component of every vector. Wrapping the raw `usize` keeps the two from
//! being mixed up in reports and error payloads.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around a `usize` position with standard derives.
macro_rules! define_index {
    (
        $(#[$meta:meta])*
        $name:ident, $label:literal
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub usize);

        impl $name {
            /// Return the inner position.
            pub const fn into_inner(self) -> usize {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}#{}", $label, self.0)
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl From<$name> for usize {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_index! {
    /// Position of a consumer within an economy.
    ConsumerId, "consumer"
}

define_index! {
    /// Position of a good within every price, bliss and endowment vector.
    /// Good 0 is the numeraire.
    GoodId, "good"
}

impl GoodId {
    /// The numeraire good whose price is pinned to 1.
    pub const NUMERAIRE: Self = Self(0);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_kind() {
        assert_eq!(ConsumerId(3).to_string(), "consumer#3");
        assert_eq!(GoodId(0).to_string(), "good#0");
    }

    #[test]
    fn serializes_as_bare_index() {
        let json = serde_json::to_string(&ConsumerId(2)).ok();
        assert_eq!(json.as_deref(), Some("2"));
        let restored: Result<GoodId, _> = serde_json::from_str("4");
        assert_eq!(restored.ok(), Some(GoodId(4)));
    }

    #[test]
    fn numeraire_is_first_good() {
        assert_eq!(GoodId::NUMERAIRE.into_inner(), 0);
    }
}
