use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ValidationError;

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "IdRepr", into = "String")]
        pub struct $name(String);

        impl $name {
            pub fn parse(input: &str) -> Result<Self, ValidationError> {
                let trimmed = input.trim();
                if trimmed.is_empty() {
                    return Err(ValidationError::EmptyId);
                }
                Ok(Self(trimmed.to_owned()))
            }

            /// Fresh random identifier, used by the in-memory gateway.
            pub fn generate() -> Self {
                Self(Uuid::new_v4().simple().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<IdRepr> for $name {
            type Error = ValidationError;

            fn try_from(value: IdRepr) -> Result<Self, Self::Error> {
                match value {
                    IdRepr::Text(text) => Self::parse(&text),
                    IdRepr::Number(number) => Ok(Self(number.to_string())),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

/// Backends emit ids either as strings or as numeric primary keys.
#[derive(Deserialize)]
#[serde(untagged)]
pub enum IdRepr {
    Text(String),
    Number(u64),
}

opaque_id!(
    /// Identifier of a registered user.
    UserId
);
opaque_id!(
    /// Identifier of a watchlist.
    WatchlistId
);
opaque_id!(
    /// Identifier of an instrument entry inside a watchlist.
    InstrumentId
);
