//! Turns `TransactionFacade`s into `PseudoTransaction`s by reading each
//! configured field for every split and tagging it with its role.

use thiserror::Error;
use tracing::debug;

use crate::camt::facade::{FieldError, TransactionFacade};
use crate::camt::field::{EntryField, Field, Level, StatementField};
use crate::config::Configuration;
use crate::pseudo::{PseudoSplit, PseudoTransaction, RoleValue};
use crate::report::ImportReport;
use crate::role::Role;

#[derive(Debug, Error, PartialEq)]
pub enum ConversionError {
    #[error("unhandled role {role:?} for field {field:?} in split {split}")]
    UnknownRole {
        role: String,
        field: String,
        split: usize,
    },
}

pub struct Converter<'c> {
    config: &'c Configuration,
}

impl<'c> Converter<'c> {
    pub fn new(config: &'c Configuration) -> Self {
        Self { config }
    }

    /// Converts all facades. A facade that fails is reported and left out; the
    /// rest of the batch carries on.
    pub fn convert_all(
        &self,
        facades: &[TransactionFacade],
        report: &mut ImportReport,
    ) -> Vec<PseudoTransaction> {
        let mut out = Vec::with_capacity(facades.len());
        for (i, facade) in facades.iter().enumerate() {
            let index = i + 1;
            match self.convert(facade, index, report) {
                Ok(pseudo) => out.push(pseudo),
                Err(e) => report.error(index, e.to_string()),
            }
        }
        debug!("converted {} of {} transactions", out.len(), facades.len());
        out
    }

    /// Converts one facade. An unknown field fails the whole facade; an
    /// unknown role only drops the split it occurs in.
    pub fn convert(
        &self,
        facade: &TransactionFacade,
        index: usize,
        report: &mut ImportReport,
    ) -> Result<PseudoTransaction, FieldError> {
        let expected_splits = facade.count_splits().max(1);
        let mut pseudo = PseudoTransaction {
            index,
            group_title: None,
            duplicate_flag: self.config.is_ignore_duplicate_transactions(),
            expected_splits,
            splits: Default::default(),
        };

        for split_index in 0..expected_splits {
            let raw = self.read_fields(facade, split_index)?;
            match self.tag_roles(facade, raw, split_index) {
                Ok(split) => {
                    pseudo.splits.insert(split_index, split);
                }
                Err(e) => report.error(index, e.to_string()),
            }
        }

        if expected_splits > 1 {
            let descriptions: Vec<&RoleValue> = pseudo
                .splits
                .values()
                .flat_map(|split| split.values_for(Role::Description))
                .filter(|v| !v.value.is_empty())
                .collect();
            let title = descriptions
                .iter()
                .find(|v| !v.from_detail)
                .or_else(|| descriptions.first())
                .map(|v| v.value.clone())
                .or_else(|| identifying_title(facade));
            pseudo.group_title = title;
        }

        Ok(pseudo)
    }

    /// Reads every configured field for one split, in configuration order,
    /// noting which come from level D.
    fn read_fields(
        &self,
        facade: &TransactionFacade,
        split_index: usize,
    ) -> Result<Vec<(bool, String)>, FieldError> {
        self.config
            .camt_fields
            .iter()
            .map(|fr| {
                let value = facade.get_field_by_index(&fr.field, split_index)?;
                let from_detail = matches!(
                    fr.field.parse::<Field>().map(Field::level),
                    Ok(Level::Detail)
                );
                Ok((from_detail, value))
            })
            .collect()
    }

    fn tag_roles(
        &self,
        facade: &TransactionFacade,
        raw: Vec<(bool, String)>,
        split_index: usize,
    ) -> Result<PseudoSplit, ConversionError> {
        let mut split = PseudoSplit {
            date: facade.resolve(Field::Entry(EntryField::ValueDate), split_index),
            currency_code: facade.resolve(Field::Entry(EntryField::AmountCurrency), split_index),
            columns: Vec::with_capacity(raw.len()),
            values: Vec::with_capacity(raw.len()),
        };

        for ((from_detail, value), fr) in raw.into_iter().zip(&self.config.camt_fields) {
            let role: Role = fr.role.parse().map_err(|_| ConversionError::UnknownRole {
                role: fr.role.clone(),
                field: fr.field.clone(),
                split: split_index,
            })?;
            split.columns.push(value.clone());
            if role == Role::Ignore {
                continue;
            }
            split.values.push(if from_detail {
                RoleValue::from_detail(role, value)
            } else {
                RoleValue::new(role, value)
            });
        }

        Ok(split)
    }
}

/// Titles a group that has no description after the entry's references,
/// else its statement.
fn identifying_title(facade: &TransactionFacade) -> Option<String> {
    [
        Field::Entry(EntryField::AccountServicerReference),
        Field::Entry(EntryField::Reference),
        Field::Statement(StatementField::StatementId),
    ]
    .into_iter()
    .map(|field| facade.resolve(field, 0))
    .find(|v| !v.is_empty())
}
