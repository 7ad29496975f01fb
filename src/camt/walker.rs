//! Walks a `Message` into `TransactionFacade`s according to the configured
//! grouping policy.

use tracing::debug;

use crate::camt::facade::TransactionFacade;
use crate::camt::{Entry, Message};
use crate::config::{Configuration, GroupedTransactionHandling};
use crate::report::ImportReport;

/// Produces facades in source order: statement, then entry, then (for the
/// `single` policy) detail. Every entry yields at least one facade.
///
/// Facade `n` (zero based) is reported on as index `n + 1`.
pub fn walk<'a>(
    config: &'a Configuration,
    message: &'a Message,
    report: &mut ImportReport,
) -> Vec<TransactionFacade<'a>> {
    let mut facades = Vec::new();

    for statement in &message.statements {
        for entry in &statement.entries {
            let index = facades.len() + 1;
            check_detail_amounts(entry, index, report);

            if entry.details.is_empty() {
                facades.push(TransactionFacade::new(
                    config,
                    message,
                    statement,
                    entry,
                    Vec::new(),
                ));
                continue;
            }

            match config.grouped_transaction_handling {
                GroupedTransactionHandling::Split => {
                    facades.push(TransactionFacade::new(
                        config,
                        message,
                        statement,
                        entry,
                        entry.details.iter().collect(),
                    ));
                }
                GroupedTransactionHandling::Single => {
                    for detail in &entry.details {
                        facades.push(TransactionFacade::new(
                            config,
                            message,
                            statement,
                            entry,
                            vec![detail],
                        ));
                    }
                }
            }
        }
    }

    debug!(
        "walked {} statements into {} transactions",
        message.statements.len(),
        facades.len()
    );
    facades
}

/// Warns when the details of an entry carry amounts that do not add up to the
/// entry amount. Only checked when every detail has an amount in the entry's
/// currency. Magnitudes are compared, since details may be signed
/// individually.
fn check_detail_amounts(entry: &Entry, index: usize, report: &mut ImportReport) {
    if entry.details.is_empty() {
        return;
    }
    let mut sum = Some(0i64);
    for detail in &entry.details {
        match detail.resolved_amount() {
            Some(m) if m.currency == entry.amount.currency => {
                sum = sum.and_then(|s| s.checked_add(m.minor_units.checked_abs()?));
            }
            _ => return,
        }
    }
    let entry_total = entry.amount.minor_units.checked_abs();
    if sum.is_some() && sum == entry_total {
        return;
    }
    let details_total = match sum {
        Some(s) => crate::money::Money::new(s, entry.amount.currency.clone()).to_string(),
        None => "out of range".to_string(),
    };
    report.warning(
        index,
        format!(
            "entry amount {} {} differs from the sum of its {} details ({} {})",
            entry.amount,
            entry.amount.currency,
            entry.details.len(),
            details_total,
            entry.amount.currency,
        ),
    );
}
