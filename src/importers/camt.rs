use std::io::Read;

use anyhow::{Context, Result};
use clap::Args;
use tracing::info;

use crate::camt::converter::Converter;
use crate::camt::walker;
use crate::camt::xml::{self, CamtReadError};
use crate::config::Configuration;
use crate::filespec::FileSpec;
use crate::importers::importer::TransactionImporter;
use crate::pseudo::PseudoTransaction;
use crate::report::ImportReport;

#[derive(Debug, Args)]
/// Converts from ISO 20022 camt.052/camt.053 XML.
pub struct Camt {
    /// CAMT file to read from. "-" reads from stdin.
    input: FileSpec,
}

impl TransactionImporter for Camt {
    fn get_transactions(
        &self,
        config: &Configuration,
        report: &mut ImportReport,
    ) -> Result<Vec<PseudoTransaction>> {
        let reader = self.input.reader()?;
        read_transactions(reader, config, report)
            .with_context(|| format!("reading CAMT statement from {}", self.input))
    }
}

/// Reads a CAMT message and converts its entries under the configured
/// grouping policy.
pub fn read_transactions<R: Read>(
    reader: R,
    config: &Configuration,
    report: &mut ImportReport,
) -> Result<Vec<PseudoTransaction>, CamtReadError> {
    let message = xml::read_message(reader)?;
    let facades = walker::walk(config, &message, report);
    info!(
        "message {}: {} transactions under the {} policy",
        message.id,
        facades.len(),
        config.grouped_transaction_handling.name(),
    );
    Ok(Converter::new(config).convert_all(&facades, report))
}
