use serde::{Deserialize, Serialize};

/// Declares an integer-backed identifier newtype.
///
/// Identifiers are assigned by whichever service owns the entity (storage
/// sequences for orders, the user and product services for the others), so
/// they are plain `i64` values on the wire.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates an identifier from its raw value.
            pub const fn new(value: i64) -> Self {
                Self(value)
            }

            /// Returns the raw value.
            pub const fn get(&self) -> i64 {
                self.0
            }

            /// Returns true if the value is a usable identifier (strictly positive).
            pub const fn is_valid(&self) -> bool {
                self.0 > 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifier of a registered user, owned by the user service.
    UserId
);

define_id!(
    /// Identifier of an order, assigned when the order is persisted.
    OrderId
);

define_id!(
    /// Identifier of a product, owned by the product service.
    ProductId
);
