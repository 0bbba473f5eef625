//! Plugin flag registry.
//!
//! # Responsibilities
//! - Collect flag declarations from plugins, namespaced by plugin name
//! - Parse process arguments exactly once into an immutable value set
//! - Provide typed accessors for plugin configuration
//!
//! # Design Decisions
//! - No global mutable flag state: parsing yields a `FlagValues` built once
//!   during `init` and passed by reference thereafter
//! - Flags are long options only (`--http-port 4000`), built dynamically
//!   from the registered specs

use std::collections::HashMap;
use std::ffi::OsString;

use clap::{Arg, Command};
use thiserror::Error;

/// A single declared flag.
#[derive(Debug, Clone)]
pub struct FlagSpec {
    /// Full flag name, `<plugin>-<option>`.
    pub name: String,
    /// Default value used when the flag is not passed.
    pub default: String,
    /// Help text shown by `--help`.
    pub help: String,
}

/// Flag declaration surface handed to a plugin during registration.
///
/// Every option registered through it is prefixed with the owning plugin's
/// name.
#[derive(Debug)]
pub struct FlagSet {
    prefix: String,
    specs: Vec<FlagSpec>,
}

impl FlagSet {
    /// Create a flag set scoped to a plugin name.
    pub fn scoped(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            specs: Vec::new(),
        }
    }

    /// Declare one option. The stored name is `<prefix>-<option>`.
    pub fn register(&mut self, option: &str, default: &str, help: &str) {
        self.specs.push(FlagSpec {
            name: format!("{}-{}", self.prefix, option),
            default: default.to_string(),
            help: help.to_string(),
        });
    }

    /// Consume the set, yielding its declarations.
    pub fn into_specs(self) -> Vec<FlagSpec> {
        self.specs
    }
}

/// Flag registry failures.
#[derive(Debug, Error)]
pub enum FlagError {
    #[error("duplicate flag {0}")]
    Duplicate(String),

    #[error("argument parsing failed: {0}")]
    Parse(#[from] clap::Error),

    #[error("flag {0} is not registered")]
    Missing(String),

    #[error("flag {name} has invalid value {value:?}")]
    Invalid { name: String, value: String },
}

/// Parsed, immutable flag values.
#[derive(Debug, Clone, Default)]
pub struct FlagValues {
    values: HashMap<String, String>,
}

impl FlagValues {
    /// Raw string value of a flag, if registered.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    fn require(&self, name: &str) -> Result<&str, FlagError> {
        self.get(name).ok_or_else(|| FlagError::Missing(name.to_string()))
    }

    pub fn get_u16(&self, name: &str) -> Result<u16, FlagError> {
        let raw = self.require(name)?;
        raw.parse().map_err(|_| FlagError::Invalid {
            name: name.to_string(),
            value: raw.to_string(),
        })
    }

    pub fn get_u64(&self, name: &str) -> Result<u64, FlagError> {
        let raw = self.require(name)?;
        raw.parse().map_err(|_| FlagError::Invalid {
            name: name.to_string(),
            value: raw.to_string(),
        })
    }
}

/// Parse process arguments against the collected specs.
///
/// Called exactly once, from the orchestrator's `init`, before any
/// concurrent work begins. `args` must not include the binary name.
pub fn parse<I, T>(specs: &[FlagSpec], args: I) -> Result<FlagValues, FlagError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut seen = HashMap::new();
    for spec in specs {
        if seen.insert(spec.name.clone(), ()).is_some() {
            return Err(FlagError::Duplicate(spec.name.clone()));
        }
    }

    let mut command = Command::new("servicekit").no_binary_name(true);
    for spec in specs {
        command = command.arg(
            Arg::new(spec.name.clone())
                .long(spec.name.clone())
                .default_value(spec.default.clone())
                .help(spec.help.clone()),
        );
    }

    let matches = command.try_get_matches_from(args)?;

    let mut values = HashMap::new();
    for spec in specs {
        if let Some(value) = matches.get_one::<String>(&spec.name) {
            values.insert(spec.name.clone(), value.clone());
        }
    }

    Ok(FlagValues { values })
}
