//! Per-run accumulation of errors, warnings and informational messages.
//!
//! Entries are keyed by source index (facade order for CAMT, line number for
//! CSV) and are append-only. Every entry is also logged as it is recorded.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use tracing::{error, info, warn};

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImportReport {
    pub errors: BTreeMap<usize, Vec<String>>,
    pub warnings: BTreeMap<usize, Vec<String>>,
    pub messages: BTreeMap<usize, Vec<String>>,
}

impl ImportReport {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn error<S: Into<String>>(&mut self, index: usize, msg: S) {
        let msg = msg.into();
        error!(index = index, "{}", msg);
        self.errors.entry(index).or_default().push(msg);
    }

    pub fn warning<S: Into<String>>(&mut self, index: usize, msg: S) {
        let msg = msg.into();
        warn!(index = index, "{}", msg);
        self.warnings.entry(index).or_default().push(msg);
    }

    pub fn message<S: Into<String>>(&mut self, index: usize, msg: S) {
        let msg = msg.into();
        info!(index = index, "{}", msg);
        self.messages.entry(index).or_default().push(msg);
    }

    pub fn error_count(&self) -> usize {
        self.errors.values().map(Vec::len).sum()
    }

    pub fn warning_count(&self) -> usize {
        self.warnings.values().map(Vec::len).sum()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        for (label, map) in [
            ("error", &self.errors),
            ("warning", &self.warnings),
            ("message", &self.messages),
        ] {
            for (index, msgs) in map {
                for msg in msgs {
                    writeln!(f, "#{} {}: {}", index, label, msg)?;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_only_per_index() {
        let mut report = ImportReport::new();
        report.error(2, "first");
        report.error(2, "second");
        report.warning(1, "careful");
        assert_eq!(
            Some(&vec!["first".to_string(), "second".to_string()]),
            report.errors.get(&2)
        );
        assert_eq!(2, report.error_count());
        assert_eq!(1, report.warning_count());
        assert!(report.has_errors());
    }

    #[test]
    fn display_lists_everything() {
        let mut report = ImportReport::new();
        report.error(4, "bad amount");
        report.warning(2, "odd date");
        assert_eq!(
            "#4 error: bad amount\n#2 warning: odd date\n",
            report.to_string()
        );
    }
}
