//! Course model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A course that sits one exam.
///
/// Immutable once loaded. `code` is the unique key used everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    /// Unique course code (e.g., "EGCO111").
    pub code: String,
    /// Human-readable name.
    pub name: String,
    /// Owning department.
    #[serde(default)]
    pub department: Department,
    /// Academic level.
    #[serde(default)]
    pub level: Level,
}

/// Academic department.
///
/// Serialized as its short name. Names outside the known set load as
/// [`Department::Other`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Department {
    /// Computer engineering ("CE").
    ComputerEngineering,
    /// Electrical and electronic engineering ("EEE").
    Electrical,
    /// Electronics and communication engineering ("ECE").
    Electronics,
    /// Shared / general education ("GEN").
    #[default]
    General,
    /// Any other department.
    Other(String),
}

/// Academic level ("Dip", "AdvDip", "Bach", or anything else as `Other`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Level {
    Diploma,
    AdvancedDiploma,
    #[default]
    Bachelor,
    Other(String),
}

impl Course {
    /// Creates a course in the general department at bachelor level.
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
            department: Department::default(),
            level: Level::default(),
        }
    }

    /// Sets the department.
    pub fn with_department(mut self, department: Department) -> Self {
        self.department = department;
        self
    }

    /// Sets the level.
    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }
}

impl fmt::Display for Department {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ComputerEngineering => f.write_str("CE"),
            Self::Electrical => f.write_str("EEE"),
            Self::Electronics => f.write_str("ECE"),
            Self::General => f.write_str("GEN"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

impl From<String> for Department {
    fn from(name: String) -> Self {
        match name.as_str() {
            "CE" => Self::ComputerEngineering,
            "EEE" => Self::Electrical,
            "ECE" => Self::Electronics,
            "GEN" => Self::General,
            _ => Self::Other(name),
        }
    }
}

impl From<Department> for String {
    fn from(department: Department) -> Self {
        match department {
            Department::Other(name) => name,
            known => known.to_string(),
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Diploma => f.write_str("Dip"),
            Self::AdvancedDiploma => f.write_str("AdvDip"),
            Self::Bachelor => f.write_str("Bach"),
            Self::Other(name) => f.write_str(name),
        }
    }
}

impl From<String> for Level {
    fn from(name: String) -> Self {
        match name.as_str() {
            "Dip" => Self::Diploma,
            "AdvDip" => Self::AdvancedDiploma,
            "Bach" => Self::Bachelor,
            _ => Self::Other(name),
        }
    }
}

impl From<Level> for String {
    fn from(level: Level) -> Self {
        match level {
            Level::Other(name) => name,
            known => known.to_string(),
        }
    }
}
