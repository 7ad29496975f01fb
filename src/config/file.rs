//! Persisted form of a `Configuration`, including the legacy single-column
//! identifier fields that are migrated on load.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::{
    default_camt_fields, ConfigError, Configuration, Delimiter, DetectionMethod,
    DuplicateDetection, FieldRole, GroupedTransactionHandling, PseudoIdentifier,
    CURRENT_VERSION, DEFAULT_DATE_FORMAT, DEFAULT_IDENTIFIER_ROLE, DEFAULT_SEPARATOR,
};
use crate::role::Role;

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct ConfigurationFile {
    pub version: Option<u32>,
    pub date: Option<String>,
    pub timezone: Option<String>,
    pub default_account: Option<u64>,
    pub rules: Option<bool>,
    pub ignore_duplicate_transactions: Option<bool>,
    pub duplicate_detection_method: Option<String>,
    /// Legacy scalar identifier column. Read, never written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_column_index: Option<usize>,
    /// Legacy identifier target role. Read, never written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique_column_type: Option<String>,
    pub pseudo_identifier: Option<PseudoIdentifierFile>,
    pub grouped_transaction_handling: Option<String>,
    pub use_entire_opposing_address: bool,
    pub headers: Option<bool>,
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
    pub roles: Vec<String>,
    pub camt_fields: Option<Vec<FieldRole>>,
    pub mapping: BTreeMap<String, BTreeMap<String, u64>>,
    pub tag_mapping: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PseudoIdentifierFile {
    pub source_columns: Vec<usize>,
    #[serde(default = "default_separator")]
    pub separator: String,
    #[serde(default = "default_identifier_role")]
    pub role: String,
}

fn default_separator() -> String {
    DEFAULT_SEPARATOR.to_string()
}

fn default_identifier_role() -> String {
    DEFAULT_IDENTIFIER_ROLE.to_string()
}

impl TryFrom<ConfigurationFile> for Configuration {
    type Error = ConfigError;

    fn try_from(file: ConfigurationFile) -> Result<Self, ConfigError> {
        let duplicate_detection = duplicate_detection(
            file.duplicate_detection_method.as_deref(),
            file.pseudo_identifier,
            file.unique_column_index,
            file.unique_column_type,
        )?;

        let timezone = match file.timezone.as_deref() {
            None => Tz::UTC,
            Some(name) => {
                Tz::from_str(name).map_err(|_| ConfigError::UnknownTimezone(name.to_string()))?
            }
        };

        let encoding = match file.encoding.as_deref() {
            None => encoding_rs::UTF_8,
            Some(label) => encoding_rs::Encoding::for_label(label.as_bytes())
                .ok_or_else(|| ConfigError::UnknownEncoding(label.to_string()))?,
        };

        Ok(Configuration {
            version: file.version.unwrap_or(CURRENT_VERSION),
            date_format: file
                .date
                .unwrap_or_else(|| DEFAULT_DATE_FORMAT.to_string()),
            timezone,
            default_account: file.default_account,
            apply_rules: file.rules.unwrap_or(true),
            ignore_duplicate_transactions: file.ignore_duplicate_transactions.unwrap_or(true),
            duplicate_detection,
            grouped_transaction_handling: file
                .grouped_transaction_handling
                .as_deref()
                .map(GroupedTransactionHandling::parse)
                .transpose()?
                .unwrap_or(GroupedTransactionHandling::Split),
            use_entire_opposing_address: file.use_entire_opposing_address,
            headers: file.headers.unwrap_or(true),
            delimiter: file
                .delimiter
                .as_deref()
                .map(Delimiter::parse)
                .transpose()?
                .unwrap_or(Delimiter::Comma),
            encoding,
            roles: file.roles,
            camt_fields: file.camt_fields.unwrap_or_else(default_camt_fields),
            mapping: file.mapping,
            tag_mapping: file.tag_mapping,
        })
    }
}

fn duplicate_detection(
    method: Option<&str>,
    pseudo_identifier: Option<PseudoIdentifierFile>,
    legacy_index: Option<usize>,
    legacy_type: Option<String>,
) -> Result<DuplicateDetection, ConfigError> {
    let method = DetectionMethod::parse(method.unwrap_or("classic"))?;
    match method {
        DetectionMethod::Classic | DetectionMethod::None => {
            if pseudo_identifier.is_some() {
                return Err(ConfigError::IdentifierWithoutCell {
                    method: method.name(),
                });
            }
            if let Some(index) = legacy_index {
                debug!(
                    "ignoring legacy unique_column_index {} for {} duplicate detection",
                    index,
                    method.name()
                );
            }
            Ok(match method {
                DetectionMethod::None => DuplicateDetection::None,
                _ => DuplicateDetection::Classic,
            })
        }
        DetectionMethod::Cell => {
            let file = match (pseudo_identifier, legacy_index) {
                (Some(pi), _) => pi,
                (None, Some(index)) => {
                    info!(
                        "migrating legacy unique_column_index {} to a pseudo-identifier",
                        index
                    );
                    PseudoIdentifierFile {
                        source_columns: vec![index],
                        separator: default_separator(),
                        role: legacy_type.unwrap_or_else(default_identifier_role),
                    }
                }
                (None, None) => return Err(ConfigError::CellWithoutIdentifier),
            };
            if file.source_columns.is_empty() {
                return Err(ConfigError::CellWithoutIdentifier);
            }
            let role = Role::from_str(&file.role)
                .ok()
                .filter(|r| r.can_hold_identifier())
                .ok_or(ConfigError::IdentifierRole(file.role))?;
            Ok(DuplicateDetection::Cell(PseudoIdentifier {
                source_columns: file.source_columns,
                separator: file.separator,
                role,
            }))
        }
    }
}

impl From<&Configuration> for ConfigurationFile {
    fn from(config: &Configuration) -> Self {
        Self {
            version: Some(config.version),
            date: Some(config.date_format.clone()),
            timezone: Some(config.timezone.name().to_string()),
            default_account: config.default_account,
            rules: Some(config.apply_rules),
            ignore_duplicate_transactions: Some(config.ignore_duplicate_transactions),
            duplicate_detection_method: Some(config.duplicate_detection.method().name().to_string()),
            unique_column_index: None,
            unique_column_type: None,
            pseudo_identifier: config
                .duplicate_detection
                .pseudo_identifier()
                .map(|pi| PseudoIdentifierFile {
                    source_columns: pi.source_columns.clone(),
                    separator: pi.separator.clone(),
                    role: pi.role.name().to_string(),
                }),
            grouped_transaction_handling: Some(
                config.grouped_transaction_handling.name().to_string(),
            ),
            use_entire_opposing_address: config.use_entire_opposing_address,
            headers: Some(config.headers),
            delimiter: Some(config.delimiter.name().to_string()),
            encoding: Some(config.encoding.name().to_string()),
            roles: config.roles.clone(),
            camt_fields: Some(config.camt_fields.clone()),
            mapping: config.mapping.clone(),
            tag_mapping: config.tag_mapping.clone(),
        }
    }
}
