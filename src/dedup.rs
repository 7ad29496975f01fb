//! The duplicate-detection contract, applied once all entries are mapped.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;

use crate::config::{Configuration, DetectionMethod, PseudoIdentifier};
use crate::fingerprint::FingerprintBuilder;
use crate::ledger::{LedgerEntry, Split};
use crate::report::ImportReport;
use crate::role::Role;

/// Writes the pseudo-identifier built from `columns` into the split field for
/// its role.
pub fn write_identifier(split: &mut Split, pi: &PseudoIdentifier, columns: &[String]) {
    let value = pi.value(columns);
    match pi.role {
        Role::InternalReference => split.internal_reference = Some(value),
        Role::ExternalId => split.external_id = Some(value),
        Role::Note => split.append_note(&value),
        Role::Description => split.description = value,
        // Other roles are rejected when the configuration is validated.
        _ => {}
    }
}

/// Applies the batch-wide part of the contract. Only `classic` keeps the
/// per-entry flag; `cell` and `none` clear it on every entry.
pub fn apply(config: &Configuration, entries: &mut [LedgerEntry], report: &mut ImportReport) {
    match config.duplicate_detection.method() {
        DetectionMethod::Classic => {
            if config.is_ignore_duplicate_transactions() {
                warn_repeated(entries, report);
            }
        }
        DetectionMethod::Cell | DetectionMethod::None => {
            for entry in entries.iter_mut() {
                entry.error_if_duplicate_hash = false;
            }
        }
    }
}

/// Reports every entry whose content matches an earlier entry of the batch.
fn warn_repeated(entries: &[LedgerEntry], report: &mut ImportReport) {
    let mut seen: HashMap<String, usize> = HashMap::new();
    for entry in entries {
        let fingerprint = FingerprintBuilder::new()
            .with_fingerprintable(entry)
            .build();
        match seen.entry(fingerprint) {
            Entry::Occupied(first) => report.warning(
                entry.source_index,
                format!(
                    "same content as transaction {}, will be rejected as a duplicate",
                    first.get()
                ),
            ),
            Entry::Vacant(slot) => {
                slot.insert(entry.source_index);
            }
        }
    }
    debug!("{} distinct fingerprints in {} entries", seen.len(), entries.len());
}
