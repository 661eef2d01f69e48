// grc-core/src/domain/mod.rs

// String <-> enum plumbing shared by every stored enum (as_str, Display, FromStr).
macro_rules! str_enum {
    ($ty:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s,)+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $ty {
            type Err = crate::domain::error::DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $(
                    if s.eq_ignore_ascii_case($s) {
                        return Ok(Self::$variant);
                    }
                )+
                Err(crate::domain::error::DomainError::Validation(format!(
                    "Unknown {}: {}",
                    stringify!($ty),
                    s
                )))
            }
        }
    };
}

pub mod compliance;
pub mod control;
pub mod error;
pub mod notification;
pub mod page;
pub mod policy;
pub mod schedule;
pub mod user;

// Re-exports pratiques pour simplifier les imports ailleurs
pub use error::DomainError;
pub use page::{Page, Window};
pub use user::User;
