use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use crate::config::Configuration;
use crate::filespec::{self, FileSpec};
use crate::importers;
use crate::importers::importer::TransactionImporter;

#[derive(Debug, Subcommand)]
pub enum Importer {
    /// Converts from ISO 20022 camt.052/camt.053 XML to ledger entries.
    #[command(name = "camt")]
    Camt(importers::camt::Camt),
    /// Converts from delimited text, laid out as the configuration's column
    /// roles say, to ledger entries.
    #[command(name = "csv")]
    Csv(importers::delimited::Delimited),
}

impl Importer {
    fn get_importer(&self) -> &dyn TransactionImporter {
        use Importer::*;
        match self {
            Camt(imp) => imp,
            Csv(imp) => imp,
        }
    }
}

#[derive(Debug, Args)]
pub struct Command {
    /// The import configuration to use (JSON, or RON for a ".ron" file).
    #[arg(short = 'c', long = "config")]
    config: FileSpec,
    /// The JSON file to write ledger entries to (overwrites any existing
    /// file). "-" writes to stdout.
    #[arg(short = 'o', long = "output", default_value = "-")]
    output: FileSpec,
    /// The JSON file to write the import report to.
    #[arg(long = "report")]
    report: Option<FileSpec>,
    /// The importer type to use to read transactions.
    #[command(subcommand)]
    importer: Importer,
}

impl Command {
    pub fn run(&self) -> Result<()> {
        let config = Configuration::from_filespec(&self.config)?;
        let (entries, report) = importers::import(self.importer.get_importer(), &config)?;
        filespec::write_json_file(&self.output, &entries)?;
        if let Some(report_file) = &self.report {
            filespec::write_json_file(report_file, &report)?;
        }
        info!(
            "wrote {} entries to {} ({} errors, {} warnings, {} messages)",
            entries.len(),
            self.output,
            report.error_count(),
            report.warning_count(),
            report.messages.values().map(Vec::len).sum::<usize>(),
        );
        Ok(())
    }
}
