//! Import-wide settings. A `Configuration` is validated on construction and
//! is read-only for the whole import run.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::filespec::{self, FileSpec};

pub mod cmd;
mod file;

pub use file::ConfigurationFile;

/// Separator used to join pseudo-identifier values unless configured.
pub const DEFAULT_SEPARATOR: &str = "|";
/// Role that a migrated legacy identifier is written to unless configured.
pub const DEFAULT_IDENTIFIER_ROLE: &str = "internal_reference";
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
pub const CURRENT_VERSION: u32 = 3;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("unsupported duplicate_detection_method {0:?}, want one of classic, cell, none")]
    UnknownDetectionMethod(String),
    #[error("cell duplicate detection requires a pseudo-identifier with at least one source column")]
    CellWithoutIdentifier,
    #[error("{method} duplicate detection must not carry a pseudo-identifier")]
    IdentifierWithoutCell { method: &'static str },
    #[error("pseudo-identifier cannot be written to role {0:?}")]
    IdentifierRole(String),
    #[error("unsupported grouped_transaction_handling {0:?}, want split or single")]
    UnknownGrouping(String),
    #[error("unknown timezone {0:?}")]
    UnknownTimezone(String),
    #[error("unsupported delimiter {0:?}, want comma, semicolon or tab")]
    UnknownDelimiter(String),
    #[error("unknown encoding label {0:?}")]
    UnknownEncoding(String),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetectionMethod {
    Classic,
    Cell,
    None,
}

impl DetectionMethod {
    pub fn name(self) -> &'static str {
        match self {
            DetectionMethod::Classic => "classic",
            DetectionMethod::Cell => "cell",
            DetectionMethod::None => "none",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "classic" => Ok(DetectionMethod::Classic),
            "cell" => Ok(DetectionMethod::Cell),
            "none" => Ok(DetectionMethod::None),
            other => Err(ConfigError::UnknownDetectionMethod(other.to_string())),
        }
    }
}

/// A synthetic duplicate-detection key: the values of `source_columns`, in
/// order, joined by `separator` and written to `role`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PseudoIdentifier {
    pub source_columns: Vec<usize>,
    pub separator: String,
    pub role: crate::role::Role,
}

impl PseudoIdentifier {
    /// Builds the identifier from one row's (or split's) column values.
    /// Columns past the end of the row contribute an empty value.
    pub fn value(&self, columns: &[String]) -> String {
        itertools::join(
            self.source_columns
                .iter()
                .map(|i| columns.get(*i).map(String::as_str).unwrap_or_default()),
            &self.separator,
        )
    }
}

impl fmt::Display for PseudoIdentifier {
    /// A single column shows as its index, several as a comma-joined list.
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(&itertools::join(&self.source_columns, ","))
    }
}

/// How duplicates are avoided. Only `Cell` carries a pseudo-identifier.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DuplicateDetection {
    Classic,
    Cell(PseudoIdentifier),
    None,
}

impl DuplicateDetection {
    pub fn method(&self) -> DetectionMethod {
        match self {
            DuplicateDetection::Classic => DetectionMethod::Classic,
            DuplicateDetection::Cell(_) => DetectionMethod::Cell,
            DuplicateDetection::None => DetectionMethod::None,
        }
    }

    pub fn pseudo_identifier(&self) -> Option<&PseudoIdentifier> {
        match self {
            DuplicateDetection::Cell(pi) => Some(pi),
            DuplicateDetection::Classic | DuplicateDetection::None => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GroupedTransactionHandling {
    /// One facade per entry, one split per detail.
    Split,
    /// One facade per detail.
    Single,
}

impl GroupedTransactionHandling {
    pub fn name(self) -> &'static str {
        match self {
            GroupedTransactionHandling::Split => "split",
            GroupedTransactionHandling::Single => "single",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "split" => Ok(GroupedTransactionHandling::Split),
            "single" => Ok(GroupedTransactionHandling::Single),
            other => Err(ConfigError::UnknownGrouping(other.to_string())),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Delimiter {
    Comma,
    Semicolon,
    Tab,
}

impl Delimiter {
    pub fn name(self) -> &'static str {
        match self {
            Delimiter::Comma => "comma",
            Delimiter::Semicolon => "semicolon",
            Delimiter::Tab => "tab",
        }
    }

    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        match s {
            "comma" | "," => Ok(Delimiter::Comma),
            "semicolon" | ";" => Ok(Delimiter::Semicolon),
            "tab" | "\t" => Ok(Delimiter::Tab),
            other => Err(ConfigError::UnknownDelimiter(other.to_string())),
        }
    }

    pub fn byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
            Delimiter::Tab => b'\t',
        }
    }
}

/// Assigns a destination role to a named CAMT field.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct FieldRole {
    pub field: String,
    pub role: String,
}

impl FieldRole {
    pub fn new(field: &str, role: &str) -> Self {
        Self {
            field: field.to_string(),
            role: role.to_string(),
        }
    }
}

/// Field roles used for CAMT imports that do not list their own.
pub fn default_camt_fields() -> Vec<FieldRole> {
    vec![
        FieldRole::new("statementAccountIban", "account-iban"),
        FieldRole::new("statementAccountNumber", "account-number"),
        FieldRole::new("entryValueDate", "date_transaction"),
        FieldRole::new("entryBookingDate", "date_book"),
        FieldRole::new("entryAmount", "amount"),
        FieldRole::new("entryAmountCurrency", "currency-code"),
        FieldRole::new("entryAdditionalInfo", "description"),
        FieldRole::new("entryAccountServicerReference", "internal_reference"),
        FieldRole::new("entryDetailAmount", "amount"),
        FieldRole::new("entryDetailAmountCurrency", "currency-code"),
        FieldRole::new(
            "entryDetailRemittanceInformationUnstructuredBlockMessage",
            "description",
        ),
        FieldRole::new("entryDetailOpposingName", "opposing-name"),
        FieldRole::new("entryDetailOpposingAccountIban", "opposing-iban"),
        FieldRole::new("entryDetailOpposingAccountNumber", "opposing-number"),
    ]
}

#[derive(Clone, Debug, PartialEq)]
pub struct Configuration {
    pub version: u32,
    /// chrono format string for dates that are not RFC 3339.
    pub date_format: String,
    pub timezone: Tz,
    pub default_account: Option<u64>,
    pub apply_rules: bool,
    pub ignore_duplicate_transactions: bool,
    pub duplicate_detection: DuplicateDetection,
    pub grouped_transaction_handling: GroupedTransactionHandling,
    pub use_entire_opposing_address: bool,
    pub headers: bool,
    pub delimiter: Delimiter,
    pub encoding: &'static encoding_rs::Encoding,
    /// CSV: role name per column index.
    pub roles: Vec<String>,
    /// CAMT: ordered field to role assignments. The position in this list is
    /// the "column" index used by pseudo-identifiers.
    pub camt_fields: Vec<FieldRole>,
    /// Role name -> raw value -> destination id.
    pub mapping: BTreeMap<String, BTreeMap<String, u64>>,
    /// Raw tag -> destination tag name.
    pub tag_mapping: BTreeMap<String, String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            timezone: Tz::UTC,
            default_account: None,
            apply_rules: true,
            ignore_duplicate_transactions: true,
            duplicate_detection: DuplicateDetection::Classic,
            grouped_transaction_handling: GroupedTransactionHandling::Split,
            use_entire_opposing_address: false,
            headers: true,
            delimiter: Delimiter::Comma,
            encoding: encoding_rs::UTF_8,
            roles: Vec::new(),
            camt_fields: default_camt_fields(),
            mapping: BTreeMap::new(),
            tag_mapping: BTreeMap::new(),
        }
    }
}

impl Configuration {
    pub fn is_ignore_duplicate_transactions(&self) -> bool {
        self.ignore_duplicate_transactions
    }

    /// Looks up the destination id that a raw value of `role` is mapped to.
    pub fn mapped_id(&self, role: crate::role::Role, raw: &str) -> Option<u64> {
        self.mapping
            .get(role.name())
            .and_then(|table| table.get(raw))
            .copied()
    }

    /// Parses a configuration from JSON text.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let file: ConfigurationFile = serde_json::from_str(s).context("parsing JSON configuration")?;
        Self::try_from(file).context("validating configuration")
    }

    /// Reads a configuration, as RON when the path ends in `.ron` and as JSON
    /// otherwise.
    pub fn from_filespec(file_spec: &FileSpec) -> Result<Self> {
        let mut content = String::new();
        file_spec
            .reader()?
            .read_to_string(&mut content)
            .with_context(|| format!("reading {}", file_spec))?;
        if is_ron(file_spec) {
            let file: ConfigurationFile =
                ron::from_str(&content).with_context(|| format!("parsing {} as RON", file_spec))?;
            Self::try_from(file).with_context(|| format!("validating configuration {}", file_spec))
        } else {
            Self::from_json_str(&content).with_context(|| format!("loading {}", file_spec))
        }
    }

    /// Writes the configuration in its current form. Legacy fields are never
    /// written back.
    pub fn to_filespec(&self, file_spec: &FileSpec) -> Result<()> {
        let file = ConfigurationFile::from(self);
        let content = if is_ron(file_spec) {
            ron::ser::to_string_pretty(&file, ron::ser::PrettyConfig::default())?
        } else {
            serde_json::to_string_pretty(&file)?
        };
        filespec::write_file(file_spec, &content)
    }
}

fn is_ron(file_spec: &FileSpec) -> bool {
    match file_spec {
        FileSpec::Path(path) => has_extension(path, "ron"),
        FileSpec::Stdio => false,
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case(ext))
        .unwrap_or(false)
}
