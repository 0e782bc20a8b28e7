//! Macro for implementing Display and FromStr for wire-name enums
//!
//! Several enums in the client map one-to-one onto fixed strings: handler ids
//! sent to the remote operation log, error kind labels used in logs. This
//! macro generates both directions of the mapping from a single table.
//!
//! # Example
//!
//! ```rust
//! use basket_domain::impl_wire_name_conversions;
//!
//! #[derive(Debug, Clone, Copy, PartialEq, Eq)]
//! pub enum Mode {
//!     Token,
//!     SignedUser,
//! }
//!
//! impl_wire_name_conversions!(Mode {
//!     Token => "token",
//!     SignedUser => "signed-user",
//! });
//!
//! assert_eq!(Mode::SignedUser.to_string(), "signed-user");
//! ```

/// Implements Display and FromStr traits for enums with fixed wire names
///
/// Parsing is case-insensitive; display always yields the table spelling.
#[macro_export]
macro_rules! impl_wire_name_conversions {
    ($enum_name:ident { $($variant:ident => $str:literal),+ $(,)? }) => {
        impl $enum_name {
            /// The fixed wire spelling of this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $str,)+
                }
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = ::std::string::String;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s.to_lowercase().as_str() {
                    $($str => ::std::result::Result::Ok(Self::$variant),)+
                    _ => ::std::result::Result::Err(::std::format!(
                        "Invalid {}: {}",
                        ::std::stringify!($enum_name),
                        s
                    )),
                }
            }
        }
    };
}
