// src/models.rs

use std::fmt;
use std::path::PathBuf;
use std::process::ExitCode;

// =========================================================================
// === 1. CONFIGURATION MODELS
// =========================================================================
// These structs are built once by the config loader and are immutable for
// the rest of the process. The loader owns the whole tree; the query layer
// hands out borrows.

/// A position inside the configuration file (or the invocation string).
/// Every parsed entity and every reported error carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Location {
    pub line: u32,
    pub column: u32,
    pub line_text: String,
}

impl Location {
    pub fn new(line: u32, column: u32, line_text: impl Into<String>) -> Self {
        Self {
            line,
            column,
            line_text: line_text.into(),
        }
    }
}

/// What happens to a script's output while it runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Output {
    /// Stream output lines to the terminal as they arrive.
    #[default]
    Unchanged,
    /// Capture output without printing it.
    Silent,
}

/// A runnable command as declared in the configuration file.
///
/// `script` and `locations` are parallel: entry `i` of `locations` is the
/// position of script line `i` in the configuration file, used for
/// template diagnostics.
#[derive(Debug, Clone, Default)]
pub struct Command {
    pub name: String,
    pub script: Vec<String>,
    pub locations: Vec<Location>,
    pub description: Option<String>,
    pub example: Option<String>,
    pub directory: Vec<PathBuf>,
    pub output: Output,
    pub child_commands: Vec<Command>,
}

impl Command {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// The type of a parameter. Array parameters carry the list of accepted
/// values, so an `Array` is never without its options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    String,
    Boolean,
    Array(Vec<String>),
}

/// A parameter as declared under `[params]`.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub shortcut: Option<String>,
    pub description: String,
    pub ty: ParameterType,
    pub default_value: Option<String>,
}

impl Parameter {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            shortcut: None,
            description: String::new(),
            ty: ParameterType::String,
            default_value: None,
        }
    }
}

// =========================================================================
// === 2. RUNTIME MODELS
// =========================================================================

/// The value bound to a parameter for the duration of one scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariableValue {
    String(String),
    Boolean(bool),
}

/// A parameter bound to a value by the CLI parse, living in a scope frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub name: String,
    pub value: VariableValue,
}

impl Variable {
    pub fn string(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: VariableValue::String(value.into()),
        }
    }

    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self {
            name: name.into(),
            value: VariableValue::Boolean(value),
        }
    }

    /// A fresh variable for a parameter, carrying the type's identity
    /// value: `true` for booleans (naming a flag means enabling it),
    /// the default or the empty string otherwise.
    pub fn from_parameter(parameter: &Parameter) -> Self {
        match parameter.ty {
            ParameterType::Boolean => Self::boolean(parameter.name.clone(), true),
            ParameterType::String | ParameterType::Array(_) => Self::string(
                parameter.name.clone(),
                parameter.default_value.clone().unwrap_or_default(),
            ),
        }
    }
}

/// Process outcome of a run or a single script execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success,
    Failure,
}

impl From<ExitStatus> for ExitCode {
    fn from(status: ExitStatus) -> Self {
        match status {
            ExitStatus::Success => Self::SUCCESS,
            ExitStatus::Failure => Self::FAILURE,
        }
    }
}

impl fmt::Display for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => write!(f, "unchanged"),
            Self::Silent => write!(f, "silent"),
        }
    }
}
