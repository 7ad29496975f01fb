use std::fmt::Write;

use anyhow::Result;
use clap::{Args, Subcommand};
use tracing::info;

use crate::config::{Configuration, DuplicateDetection, CURRENT_VERSION};
use crate::filespec::{self, FileSpec};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Prints a summary of an import configuration.
    #[command(name = "show")]
    Show(Show),
    /// Loads an import configuration, migrating legacy fields, and writes it
    /// back in its current form.
    #[command(name = "upgrade")]
    Upgrade(Upgrade),
}

impl Command {
    pub fn run(&self) -> Result<()> {
        use Command::*;
        match self {
            Show(cmd) => cmd.run(),
            Upgrade(cmd) => cmd.run(),
        }
    }
}

#[derive(Debug, Args)]
pub struct Show {
    /// The configuration to describe.
    config: FileSpec,
}

impl Show {
    fn run(&self) -> Result<()> {
        let config = Configuration::from_filespec(&self.config)?;
        filespec::write_file(&FileSpec::Stdio, &summary(&config)?)
    }
}

#[derive(Debug, Args)]
pub struct Upgrade {
    /// The configuration to upgrade.
    config: FileSpec,
    /// Where to write the upgraded configuration. Defaults to overwriting the
    /// input.
    #[arg(short = 'o', long = "output")]
    output: Option<FileSpec>,
}

impl Upgrade {
    fn run(&self) -> Result<()> {
        let mut config = Configuration::from_filespec(&self.config)?;
        if config.version != CURRENT_VERSION {
            info!(
                "upgrading configuration from version {} to {}",
                config.version, CURRENT_VERSION
            );
            config.version = CURRENT_VERSION;
        }
        config.to_filespec(self.output.as_ref().unwrap_or(&self.config))
    }
}

/// Renders the settings that govern an import run.
pub fn summary(config: &Configuration) -> Result<String> {
    let mut s = String::new();
    writeln!(s, "version: {}", config.version)?;
    writeln!(
        s,
        "dates: {} in {}",
        config.date_format,
        config.timezone.name()
    )?;
    match config.default_account {
        Some(id) => writeln!(s, "default account: {}", id)?,
        None => writeln!(s, "default account: none")?,
    }
    writeln!(s, "apply rules: {}", config.apply_rules)?;
    writeln!(
        s,
        "ignore duplicate transactions: {}",
        config.ignore_duplicate_transactions
    )?;
    match &config.duplicate_detection {
        DuplicateDetection::Cell(pi) => writeln!(
            s,
            "duplicate detection: cell, columns {} joined by {:?} into {}",
            pi, pi.separator, pi.role
        )?,
        other => writeln!(s, "duplicate detection: {}", other.method().name())?,
    }
    writeln!(
        s,
        "grouped transactions: {}",
        config.grouped_transaction_handling.name()
    )?;
    writeln!(
        s,
        "opposing party: {}",
        if config.use_entire_opposing_address {
            "name and address"
        } else {
            "name"
        }
    )?;
    writeln!(
        s,
        "csv: {}, {} delimited, {}, {} column roles",
        if config.headers {
            "header row"
        } else {
            "no header row"
        },
        config.delimiter.name(),
        config.encoding.name(),
        config.roles.len()
    )?;
    writeln!(s, "camt fields: {}", config.camt_fields.len())?;
    writeln!(
        s,
        "mappings: {} values over {} roles, {} tags",
        config.mapping.values().map(|m| m.len()).sum::<usize>(),
        config.mapping.len(),
        config.tag_mapping.len()
    )?;
    Ok(s)
}
