use std::io::Read;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::camt::converter::ConversionError;
use crate::config::Configuration;
use crate::filespec::FileSpec;
use crate::importers::importer::TransactionImporter;
use crate::pseudo::{PseudoSplit, PseudoTransaction, RoleValue};
use crate::report::ImportReport;
use crate::role::Role;

#[derive(Debug, Args)]
/// Converts from delimited text with a configured column layout.
pub struct Delimited {
    /// CSV file to read from. "-" reads from stdin.
    input: FileSpec,
}

impl TransactionImporter for Delimited {
    fn get_transactions(
        &self,
        config: &Configuration,
        report: &mut ImportReport,
    ) -> Result<Vec<PseudoTransaction>> {
        let reader = self.input.reader()?;
        read_transactions(reader, config, report)
            .with_context(|| format!("reading CSV from {}", self.input))
    }
}

/// Reads one pseudo-transaction of exactly one split per row. Transactions
/// are indexed by the line their row starts on.
pub fn read_transactions<R: Read>(
    reader: R,
    config: &Configuration,
    report: &mut ImportReport,
) -> Result<Vec<PseudoTransaction>, csv::Error> {
    let reader = encoding_rs_io::DecodeReaderBytesBuilder::new()
        .encoding(Some(config.encoding))
        .build(reader);
    let mut csv_rdr = csv::ReaderBuilder::new()
        .has_headers(config.headers)
        .delimiter(config.delimiter.byte())
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let mut pseudos = Vec::new();
    for record in csv_rdr.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e),
            Err(e) => {
                let line = e.position().map(|p| p.line() as usize).unwrap_or_default();
                report.error(line, e.to_string());
                continue;
            }
        };
        let index = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or_default();

        let mut pseudo = PseudoTransaction {
            index,
            group_title: None,
            duplicate_flag: config.is_ignore_duplicate_transactions(),
            expected_splits: 1,
            splits: Default::default(),
        };
        match convert_row(config, &record) {
            Ok(split) => {
                pseudo.splits.insert(0, split);
            }
            Err(e) => report.error(index, e.to_string()),
        }
        pseudos.push(pseudo);
    }

    info!("read {} rows", pseudos.len());
    Ok(pseudos)
}

/// Tags each cell with the role configured for its column. Cells past the
/// configured roles are ignored.
fn convert_row(
    config: &Configuration,
    record: &csv::StringRecord,
) -> Result<PseudoSplit, ConversionError> {
    let mut split = PseudoSplit {
        columns: record.iter().map(str::to_string).collect(),
        ..Default::default()
    };
    for (column, value) in record.iter().enumerate() {
        let name = match config.roles.get(column) {
            Some(name) => name,
            None => continue,
        };
        let role: Role = name.parse().map_err(|_| ConversionError::UnknownRole {
            role: name.clone(),
            field: format!("column {}", column),
            split: 0,
        })?;
        if role == Role::Ignore || value.is_empty() {
            continue;
        }
        split.values.push(RoleValue::new(role, value));
    }
    Ok(split)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Delimiter, DuplicateDetection, PseudoIdentifier};
    use crate::importers::finish;
    use crate::ledger::{LedgerEntry, TransactionType};

    fn roles(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn import(config: &Configuration, input: &[u8]) -> (Vec<LedgerEntry>, ImportReport) {
        let mut report = ImportReport::new();
        let pseudos = read_transactions(input, config, &mut report).expect("read");
        let entries = finish(config, &pseudos, &mut report);
        (entries, report)
    }

    #[test]
    fn debit_and_credit_columns() {
        let config = Configuration {
            delimiter: Delimiter::Semicolon,
            date_format: "%d-%m-%Y".to_string(),
            default_account: Some(1),
            roles: roles(&[
                "date_transaction",
                "description",
                "amount_debit",
                "amount_credit",
                "opposing-name",
                "tags-comma",
            ]),
            ..Default::default()
        };
        let input = textwrap::dedent(
            r#"
            Date;Description;Debit;Credit;Counterparty;Tags
            01-03-2024;Coffee;3,50;;Cafe Central;food
            02-03-2024;Salary;;2500,00;Employer BV;
            "#,
        );
        let (entries, report) = import(&config, input.trim().as_bytes());
        assert_eq!(ImportReport::new(), report);
        assert_eq!(2, entries.len());

        let coffee = &entries[0];
        assert_eq!(2, coffee.source_index);
        assert_eq!(None, coffee.group_title);
        let split = &coffee.transactions[0];
        assert_eq!(TransactionType::Withdrawal, split.type_);
        assert_eq!("2024-03-01T00:00:00+00:00", split.date);
        assert_eq!("3.50", split.amount);
        assert_eq!("Coffee", split.description);
        assert_eq!(Some(1), split.source_id);
        assert_eq!(Some("Cafe Central"), split.destination_name.as_deref());
        assert_eq!(vec!["food"], split.tags);

        let salary = &entries[1];
        assert_eq!(3, salary.source_index);
        let split = &salary.transactions[0];
        assert_eq!(TransactionType::Deposit, split.type_);
        assert_eq!("2500.00", split.amount);
        assert_eq!(Some("Employer BV"), split.source_name.as_deref());
        assert_eq!(Some(1), split.destination_id);
    }

    #[test]
    fn configured_encoding() {
        let config = Configuration {
            encoding: encoding_rs::WINDOWS_1252,
            roles: roles(&["date_transaction", "description", "amount", "currency-code"]),
            ..Default::default()
        };
        let input = b"date,description,amount,currency\n2024-03-01,Caf\xe9,-1.00,EUR\n";
        let (entries, report) = import(&config, input);
        assert!(!report.has_errors(), "{}", report);
        assert_eq!("Caf\u{e9}", entries[0].transactions[0].description);
        assert_eq!("EUR", entries[0].transactions[0].currency_code);
    }

    #[test]
    fn failing_rows_are_reported_by_line() {
        let config = Configuration {
            headers: false,
            delimiter: Delimiter::Tab,
            roles: roles(&["date_transaction", "amount"]),
            ..Default::default()
        };
        let input = "2024-03-01\t-1.00\n2024-03-02\tlots\n2024-03-03\t2.00\n";
        let (entries, report) = import(&config, input.as_bytes());
        let indexes: Vec<usize> = entries.iter().map(|e| e.source_index).collect();
        assert_eq!(vec![1, 3], indexes);
        assert_eq!(1, report.error_count());
        assert!(report.errors[&2][0].contains("lots"), "{}", report);
    }

    #[test]
    fn unknown_role_fails_every_row() {
        let config = Configuration {
            headers: false,
            roles: roles(&["date_transaction", "amount_in_cents"]),
            ..Default::default()
        };
        let (entries, report) = import(&config, b"2024-03-01,100\n2024-03-02,200\n");
        assert!(entries.is_empty());
        assert_eq!(2, report.error_count());
        assert!(report.errors[&1][0].contains("amount_in_cents"));
        assert!(report.messages.contains_key(&2));
    }

    #[test]
    fn cell_identifier_from_columns() {
        let config = Configuration {
            duplicate_detection: DuplicateDetection::Cell(PseudoIdentifier {
                source_columns: vec![0, 3],
                separator: "|".to_string(),
                role: Role::InternalReference,
            }),
            roles: roles(&["date_transaction", "amount", "_ignore", "_ignore"]),
            ..Default::default()
        };
        let input = textwrap::dedent(
            r#"
            date,amount,memo,ref
            2024-03-01,-1.00,lunch,A-1
            2024-03-02,-2.00
            "#,
        );
        let (entries, _) = import(&config, input.trim().as_bytes());
        let refs: Vec<Option<&str>> = entries
            .iter()
            .map(|e| e.transactions[0].internal_reference.as_deref())
            .collect();
        assert_eq!(vec![Some("2024-03-01|A-1"), Some("2024-03-02|")], refs);
        assert!(entries.iter().all(|e| !e.error_if_duplicate_hash));
    }
}
