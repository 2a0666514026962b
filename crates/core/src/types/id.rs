//! Newtype IDs for shipping and catalog entities.
//!
//! The external API keys every entity by an integer. Wrapping each one in its
//! own type keeps a `ZoneId` from being passed where a `ZoneMethodId` is
//! expected, which matters in the join-heavy shipping model.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i32()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `FromStr` so ids can come straight out of path segments and form fields
///
/// # Example
///
/// ```rust
/// # use segishop_core::define_id;
/// define_id!(ZoneId);
/// define_id!(MethodId);
///
/// let zone = ZoneId::new(1);
/// let method = MethodId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: ZoneId = method;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Whether this id refers to a persisted entity.
            ///
            /// The API never hands out ids below 1, so `0` doubles as
            /// "nothing selected" in forms.
            #[must_use]
            pub const fn is_set(&self) -> bool {
                self.0 > 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                s.trim().parse::<i32>().map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Shipping
define_id!(ZoneId);
define_id!(RegionId);
define_id!(MethodId);
define_id!(ZoneMethodId);
define_id!(ClassId);
define_id!(ClassCostId);

// Catalog
define_id!(ProductId);
define_id!(CategoryId);
define_id!(ReviewId);

// Customers
define_id!(UserId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_serializes_as_bare_integer() {
        let id = ZoneMethodId::new(42);
        assert_eq!(serde_json::to_string(&id).unwrap(), "42");

        let parsed: ZoneMethodId = serde_json::from_str("42").unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_id_from_str_trims() {
        let id: ClassId = " 7 ".parse().unwrap();
        assert_eq!(id.as_i32(), 7);
        assert!("seven".parse::<ClassId>().is_err());
    }

    #[test]
    fn test_is_set() {
        assert!(ZoneId::new(1).is_set());
        assert!(!ZoneId::new(0).is_set());
        assert!(!ZoneId::new(-3).is_set());
    }
}
