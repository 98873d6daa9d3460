//! Error types for the protection module.

use std::fmt;

use super::flag::FlagKind;

/// Errors produced by region management and flag resolution. All are local,
/// recoverable conditions returned to the caller; none are fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtectionError {
    /// A region with this name already exists in the world.
    DuplicateName { name: String },
    /// No region with this name exists in the world.
    NotFound { name: String },
    /// Assigning this parent would make the region its own ancestor.
    ParentCycle { name: String, parent: String },
    /// The flag key is not registered.
    UnknownFlag { key: String },
    /// A flag value of the wrong kind was supplied for a registered flag.
    FlagKindMismatch { key: String, expected: FlagKind },
}

impl fmt::Display for ProtectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtectionError::DuplicateName { name } => {
                write!(f, "region '{name}' already exists")
            }
            ProtectionError::NotFound { name } => {
                write!(f, "region '{name}' not found")
            }
            ProtectionError::ParentCycle { name, parent } => {
                write!(f, "setting parent '{parent}' on '{name}' would create a cycle")
            }
            ProtectionError::UnknownFlag { key } => {
                write!(f, "flag '{key}' is not registered")
            }
            ProtectionError::FlagKindMismatch { key, expected } => {
                write!(f, "flag '{key}' expects a {expected:?} value")
            }
        }
    }
}

impl std::error::Error for ProtectionError {}
