//!
//! Base print pipeline definitions
//!
use std::{collections::BTreeSet, fmt, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque printer identifier, unique within a backend.
///
/// PrintNode hands out integers; they are kept as text and written back as numbers.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TargetId(String);

impl TargetId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        TargetId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty or whitespace-only ids name no printer
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetId {
    fn from(id: &str) -> Self {
        TargetId::new(id)
    }
}

impl From<String> for TargetId {
    fn from(id: String) -> Self {
        TargetId(id)
    }
}

impl From<u64> for TargetId {
    fn from(id: u64) -> Self {
        TargetId(id.to_string())
    }
}

impl Serialize for TargetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<u64>() {
            Ok(numeric) if numeric.to_string() == self.0 => serializer.serialize_u64(numeric),
            _ => serializer.serialize_str(&self.0),
        }
    }
}

impl<'de> Deserialize<'de> for TargetId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Number(n) => TargetId::from(n),
            Raw::Text(s) => TargetId(s),
        })
    }
}

/// Backend job identifier returned by a successful submit
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monotonically increasing print attempt identifier
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AttemptId(pub u64);

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Printer availability
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Availability {
    Online,
    Offline,
}

/// Printer capabilities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub supports_color: bool,
    pub supports_duplex: bool,
    pub paper_formats: BTreeSet<String>,
}

/// Addressable printer snapshot produced by discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintTarget {
    pub id: TargetId,
    pub display_name: String,
    pub description: Option<String>,
    pub availability: Availability,
    pub capabilities: Capabilities,
}

impl PrintTarget {
    pub fn is_online(&self) -> bool {
        self.availability == Availability::Online
    }
}

/// Language of user-facing status messages
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    English,
    French,
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "en" | "english" => Ok(Locale::English),
            "fr" | "french" => Ok(Locale::French),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

/// Closed set of print statuses
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrintStatus {
    #[default]
    Idle,
    Printing,
    Success,
    NoTargetSelected,
    DocumentNotFound,
    FetchFailed,
    SubmitFailed,
    UnknownError,
}

impl PrintStatus {
    /// True for the statuses an attempt ends in
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PrintStatus::Idle | PrintStatus::Printing)
    }

    pub fn is_success(&self) -> bool {
        *self == PrintStatus::Success
    }

    /// Errors nobody planned for; UIs show a secondary alert for these
    /// on top of the regular status banner.
    pub fn is_unexpected(&self) -> bool {
        *self == PrintStatus::UnknownError
    }

    /// Human-readable message for this status
    pub fn message(&self, locale: Locale) -> &'static str {
        match locale {
            Locale::English => match self {
                PrintStatus::Idle => "Ready to print.",
                PrintStatus::Printing => "Printing...",
                PrintStatus::Success => "Printed successfully!",
                PrintStatus::NoTargetSelected => "No printer selected.",
                PrintStatus::DocumentNotFound => "PDF file not found.",
                PrintStatus::FetchFailed => "Failed to download the document.",
                PrintStatus::SubmitFailed => "Print error.",
                PrintStatus::UnknownError => "An unknown error occurred.",
            },
            Locale::French => match self {
                PrintStatus::Idle => "Prêt à imprimer.",
                PrintStatus::Printing => "Impression en cours...",
                PrintStatus::Success => "Impression réussie !",
                PrintStatus::NoTargetSelected => "Aucune imprimante sélectionnée.",
                PrintStatus::DocumentNotFound => "Fichier PDF introuvable.",
                PrintStatus::FetchFailed => "Echec du téléchargement du document.",
                PrintStatus::SubmitFailed => "Erreur d'impression.",
                PrintStatus::UnknownError => "Une erreur inconnue est survenue.",
            },
        }
    }
}

impl fmt::Display for PrintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Result of one pipeline invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutcome {
    pub succeeded: bool,
    pub status: PrintStatus,
    pub message: String,
    /// Underlying error text for failed attempts
    pub detail: Option<String>,
    pub duration_ms: u64,
    pub attempt: AttemptId,
    pub job_id: Option<JobId>,
}
