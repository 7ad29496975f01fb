use anyhow::Result;
use tracing::info;

use crate::config::Configuration;
use crate::dedup;
use crate::ledger::LedgerEntry;
use crate::mapper::Mapper;
use crate::pseudo::PseudoTransaction;
use crate::report::ImportReport;

pub mod camt;
pub mod cmd;
pub mod delimited;
mod importer;

#[cfg(test)]
mod testutil;

pub use importer::TransactionImporter;

/// Runs `importer` and the shared mapping and duplicate-detection steps.
pub fn import(
    importer: &dyn TransactionImporter,
    config: &Configuration,
) -> Result<(Vec<LedgerEntry>, ImportReport)> {
    let mut report = ImportReport::new();
    let pseudos = importer.get_transactions(config, &mut report)?;
    let entries = finish(config, &pseudos, &mut report);
    Ok((entries, report))
}

/// Maps pseudo-transactions to ledger entries and applies the
/// duplicate-detection contract.
pub fn finish(
    config: &Configuration,
    pseudos: &[PseudoTransaction],
    report: &mut ImportReport,
) -> Vec<LedgerEntry> {
    let mut entries = Mapper::new(config).map_all(pseudos, report);
    dedup::apply(config, &mut entries, report);
    info!(
        "{} ledger entries from {} transactions, {} errors, {} warnings",
        entries.len(),
        pseudos.len(),
        report.error_count(),
        report.warning_count(),
    );
    entries
}
