//! Error taxonomy for the enchantment core.
//!
//! Nothing here is fatal: every variant describes a single ability doing
//! nothing for one action or one tick.

use std::path::PathBuf;

use enchantry_types::{ItemKind, NumeralError};
use thiserror::Error;

/// A lore line that looks like an enchantment tag but cannot be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("malformed level in lore line {line:?}: {source}")]
    Numeral {
        line: String,
        #[source]
        source: NumeralError,
    },
}

/// Why `apply` left an item untouched.
///
/// The `Display` text is short enough to show to the acting player.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("Unknown enchantment: {0}")]
    UnknownEnchantment(String),
    #[error("Invalid level {level}. The maximum level for {name} is {max}.")]
    InvalidLevel { name: String, level: u32, max: u32 },
    #[error("{name} cannot be applied to this item ({kind:?}).")]
    WrongItemKind { name: String, kind: ItemKind },
    #[error("This enchantment conflicts with {with}.")]
    Conflict { with: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("enchantment '{0}' is already registered")]
    RegistrationConflict(String),
    #[error("enchantment name must not be empty")]
    EmptyName,
    #[error("enchantment name '{0}' may only use letters, digits, '_' and spaces")]
    InvalidName(String),
}

/// Why a running sequence was stopped before its last phase completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CancelReason {
    #[error("bound target is no longer live")]
    TargetInvalidated,
    #[error("cancelled on request")]
    Requested,
    #[error("linked parent sequence was cancelled")]
    ParentCancelled,
    #[error("phase driver aborted the sequence")]
    Aborted,
    #[error("engine shutdown")]
    Shutdown,
}

/// Errors that can occur while loading or saving settings files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Parse error in {path:?}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("Serialize error for {path:?}: {source}")]
    Serialize {
        path: PathBuf,
        source: toml::ser::Error,
    },
}
