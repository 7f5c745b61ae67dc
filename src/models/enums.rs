//! Shared domain enums.
//!
//! Numeric enums serialize as their integer value so payloads stay
//! compatible with services that store them as plain integers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A string or integer did not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseEnumError {
    fn new(kind: &'static str, value: impl ToString) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Client platform a request came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Web,
    Wechat,
    App,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Web => "web",
            Platform::Wechat => "wechat",
            Platform::App => "app",
        }
    }
}

impl FromStr for Platform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "web" => Ok(Platform::Web),
            "wechat" => Ok(Platform::Wechat),
            "app" => Ok(Platform::App),
            other => Err(ParseEnumError::new("platform", other)),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declares a `u8`-backed enum with name parsing and numeric serde.
macro_rules! numeric_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal {
            $($(#[$vmeta:meta])* $variant:ident = $value:literal => $label:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub enum $name {
            $($(#[$vmeta])* $variant = $value,)+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label,)+
                }
            }
        }

        impl TryFrom<u8> for $name {
            type Error = ParseEnumError;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                match value {
                    $($value => Ok($name::$variant),)+
                    other => Err(ParseEnumError::new($kind, other)),
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value as u8
            }
        }

        /// Accepts the label or the numeric value.
        impl FromStr for $name {
            type Err = ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($label => Ok($name::$variant),)+
                    other => other
                        .parse::<u8>()
                        .map_err(|_| ParseEnumError::new($kind, other))
                        .and_then($name::try_from),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

numeric_enum! {
    /// Account role, most privileged first.
    UserRole, "user role" {
        Admin = 0 => "admin",
        User = 1 => "user",
        Guest = 2 => "guest",
    }
}

numeric_enum! {
    UserStatus, "user status" {
        Active = 0 => "active",
        /// Banned from all access.
        Blacklisted = 1 => "blacklisted",
    }
}

numeric_enum! {
    /// Moderation state of a post.
    #[derive(Default)]
    PostStatus, "post status" {
        #[default]
        Pending = 0 => "pending",
        Approved = 1 => "approved",
        Rejected = 2 => "rejected",
    }
}

numeric_enum! {
    /// Badge shown on a post.
    #[derive(Default)]
    OfficialTag, "official tag" {
        #[default]
        None = 0 => "none",
        Certified = 1 => "certified",
        /// Author has paid a deposit.
        Deposit = 2 => "deposit",
        /// Fast response guaranteed.
        Rapid = 3 => "rapid",
    }
}
