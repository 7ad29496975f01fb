//! Maps `PseudoTransaction`s onto `LedgerEntry`s.
//!
//! Direction follows the sign of the amount: zero or less is a withdrawal
//! (own account pays the opposing party), more than zero is a deposit. The
//! emitted amount is always the magnitude.

use std::str::FromStr;

use itertools::Itertools;
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::config::Configuration;
use crate::dates::{self, DateError};
use crate::dedup;
use crate::ledger::{AccountRef, LedgerEntry, Split, TransactionType};
use crate::money::{Money, MoneyError};
use crate::pseudo::{PseudoSplit, PseudoTransaction};
use crate::report::ImportReport;
use crate::role::Role;

pub const UNKNOWN_OPPOSING: &str = "(unknown opposing account)";
pub const NO_DESCRIPTION: &str = "(no description)";

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("split {split} has no amount")]
    MissingAmount { split: usize },
    #[error("split {split} has no date")]
    MissingDate { split: usize },
    #[error("cannot read {role} value {value:?} in split {split} as an amount")]
    BadAmount {
        role: Role,
        value: String,
        split: usize,
    },
    #[error("split {split}: {source}")]
    Money { split: usize, source: MoneyError },
    #[error("cannot read {role} in split {split}: {source}")]
    BadDate {
        role: Role,
        split: usize,
        source: DateError,
    },
    #[error("{role} value {value:?} in split {split} is not a numeric id")]
    BadId {
        role: Role,
        value: String,
        split: usize,
    },
}

/// The roles that describe one side of a transfer.
struct AccountRoles {
    id: Role,
    iban: Role,
    number: Role,
    name: Role,
    bic: Option<Role>,
}

const OWN_ACCOUNT: AccountRoles = AccountRoles {
    id: Role::AccountId,
    iban: Role::AccountIban,
    number: Role::AccountNumber,
    name: Role::AccountName,
    bic: None,
};

const OPPOSING_ACCOUNT: AccountRoles = AccountRoles {
    id: Role::OpposingId,
    iban: Role::OpposingIban,
    number: Role::OpposingNumber,
    name: Role::OpposingName,
    bic: Some(Role::OpposingBic),
};

pub struct Mapper<'c> {
    config: &'c Configuration,
}

impl<'c> Mapper<'c> {
    pub fn new(config: &'c Configuration) -> Self {
        Self { config }
    }

    /// Maps every pseudo-transaction, in order. Failures are reported against
    /// the transaction's index and the transaction is left out.
    pub fn map_all(
        &self,
        pseudos: &[PseudoTransaction],
        report: &mut ImportReport,
    ) -> Vec<LedgerEntry> {
        let mut entries = Vec::with_capacity(pseudos.len());
        for pseudo in pseudos {
            match self.map(pseudo) {
                Ok(Some(entry)) => entries.push(entry),
                Ok(None) => report.message(pseudo.index, "no splits left to import"),
                Err(e) => report.error(pseudo.index, e.to_string()),
            }
        }
        entries
    }

    /// Maps one pseudo-transaction. Splits missing from it are skipped; if
    /// none remain there is nothing to emit.
    pub fn map(&self, pseudo: &PseudoTransaction) -> Result<Option<LedgerEntry>, MapError> {
        let mut splits = Vec::with_capacity(pseudo.expected_splits);
        for index in 0..pseudo.expected_splits {
            match pseudo.splits.get(&index) {
                Some(ps) => splits.push(self.map_split(ps, index)?),
                None => debug!("transaction {} lacks split {}, skipping", pseudo.index, index),
            }
        }
        if splits.is_empty() {
            return Ok(None);
        }

        let group_title = if splits.len() > 1 {
            pseudo
                .group_title
                .clone()
                .or_else(|| {
                    splits
                        .iter()
                        .map(|s| &s.description)
                        .find(|d| d.as_str() != NO_DESCRIPTION)
                        .or(Some(&splits[0].description))
                        .cloned()
                })
        } else {
            None
        };

        Ok(Some(LedgerEntry {
            source_index: pseudo.index,
            group_title,
            error_if_duplicate_hash: pseudo.duplicate_flag,
            apply_rules: self.config.apply_rules,
            transactions: splits,
        }))
    }

    fn map_split(&self, ps: &PseudoSplit, index: usize) -> Result<Split, MapError> {
        let currency = text(ps, Role::CurrencyCode).unwrap_or_else(|| ps.currency_code.clone());
        let amount = Money::from_decimal(self.amount(ps, index)?, currency.clone())
            .map_err(|source| MapError::Money {
                split: index,
                source,
            })?;
        let type_ = if amount.is_positive() {
            TransactionType::Deposit
        } else {
            TransactionType::Withdrawal
        };

        let date = match text(ps, Role::DateTransaction) {
            Some(v) => self.date(Role::DateTransaction, &v, index)?,
            None if !ps.date.is_empty() => self.date(Role::DateTransaction, &ps.date, index)?,
            None => return Err(MapError::MissingDate { split: index }),
        };

        let mut split = Split::new(
            type_,
            date,
            Money::new(amount.minor_units.abs(), amount.currency.clone()).to_string(),
            currency.clone(),
        );

        let own = match self.account(ps, &OWN_ACCOUNT, index)? {
            acc if acc.is_empty() => AccountRef {
                id: self.config.default_account,
                ..Default::default()
            },
            acc => acc,
        };
        let opposing = match self.account(ps, &OPPOSING_ACCOUNT, index)? {
            acc if acc.id.is_none()
                && acc.name.is_none()
                && acc.iban.is_none()
                && acc.number.is_none() =>
            {
                AccountRef {
                    name: Some(UNKNOWN_OPPOSING.to_string()),
                    ..acc
                }
            }
            acc => acc,
        };
        match type_ {
            TransactionType::Withdrawal => {
                split.set_source(own);
                split.set_destination(opposing);
            }
            TransactionType::Deposit => {
                split.set_source(opposing);
                split.set_destination(own);
            }
        }

        split.description =
            text(ps, Role::Description).unwrap_or_else(|| NO_DESCRIPTION.to_string());
        if let Some(notes) = text(ps, Role::Note) {
            split.append_note(&notes);
        }

        if let Some(raw) = text(ps, Role::AmountForeign) {
            let foreign_currency = text(ps, Role::ForeignCurrencyCode).unwrap_or_else(|| currency.clone());
            let foreign = parse_amount(&raw).ok_or_else(|| MapError::BadAmount {
                role: Role::AmountForeign,
                value: raw.clone(),
                split: index,
            })?;
            let foreign = Money::from_decimal(foreign.abs(), foreign_currency.clone())
                .map_err(|source| MapError::Money {
                    split: index,
                    source,
                })?;
            split.foreign_amount = Some(foreign.to_string());
            split.foreign_currency_code = Some(foreign_currency);
        }

        split.book_date = self.opt_date(ps, Role::DateBook, index)?;
        split.process_date = self.opt_date(ps, Role::DateProcess, index)?;
        split.interest_date = self.opt_date(ps, Role::DateInterest, index)?;
        split.due_date = self.opt_date(ps, Role::DateDue, index)?;
        split.payment_date = self.opt_date(ps, Role::DatePayment, index)?;
        split.invoice_date = self.opt_date(ps, Role::DateInvoice, index)?;

        split.tags = self.tags(ps);

        (split.category_id, split.category_name) =
            self.named_id(ps, Role::CategoryId, Role::CategoryName, index)?;
        (split.budget_id, split.budget_name) =
            self.named_id(ps, Role::BudgetId, Role::BudgetName, index)?;
        (split.bill_id, split.bill_name) = self.named_id(ps, Role::BillId, Role::BillName, index)?;

        split.internal_reference = text(ps, Role::InternalReference);
        split.external_id = text(ps, Role::ExternalId);
        split.external_url = text(ps, Role::ExternalUrl);

        if let Some(pi) = self.config.duplicate_detection.pseudo_identifier() {
            dedup::write_identifier(&mut split, pi, &ps.columns);
        }

        Ok(split)
    }

    /// The signed amount. A plain amount wins; otherwise the first non-zero
    /// of the debit, credit and negated amounts. A debit/credit indicator
    /// forces the sign.
    fn amount(&self, ps: &PseudoSplit, index: usize) -> Result<Decimal, MapError> {
        let read = |role: Role| -> Result<Option<Decimal>, MapError> {
            match text(ps, role) {
                None => Ok(None),
                Some(raw) => parse_amount(&raw).map(Some).ok_or(MapError::BadAmount {
                    role,
                    value: raw,
                    split: index,
                }),
            }
        };

        let amount = match read(Role::Amount)? {
            Some(amount) => amount,
            None => {
                let candidates = [
                    read(Role::AmountDebit)?.map(|a| -a.abs()),
                    read(Role::AmountCredit)?.map(|a| a.abs()),
                    read(Role::AmountNegated)?.map(|a| -a),
                ];
                let mut present = candidates.iter().flatten().peekable();
                match present.peek() {
                    None => return Err(MapError::MissingAmount { split: index }),
                    Some(first) => {
                        let first = **first;
                        present.find(|a| !a.is_zero()).copied().unwrap_or(first)
                    }
                }
            }
        };

        Ok(match text(ps, Role::GenericDebitCredit).as_deref().and_then(is_debit) {
            Some(true) => -amount.abs(),
            Some(false) => amount.abs(),
            None => amount,
        })
    }

    fn account(
        &self,
        ps: &PseudoSplit,
        roles: &AccountRoles,
        index: usize,
    ) -> Result<AccountRef, MapError> {
        let mut acc = AccountRef::default();
        if let Some(raw) = text(ps, roles.id) {
            acc.id = Some(parse_id(roles.id, &raw, index)?);
        }
        for (role, slot) in [
            (roles.iban, &mut acc.iban),
            (roles.number, &mut acc.number),
            (roles.name, &mut acc.name),
        ] {
            if let Some(raw) = text(ps, role) {
                if acc.id.is_none() {
                    acc.id = self.config.mapped_id(role, &raw);
                }
                *slot = Some(raw);
            }
        }
        let bic = roles.bic.and_then(|role| text(ps, role));
        Ok(match acc.id {
            Some(id) => AccountRef {
                id: Some(id),
                bic,
                ..Default::default()
            },
            None => AccountRef { bic, ..acc },
        })
    }

    fn date(&self, role: Role, raw: &str, index: usize) -> Result<String, MapError> {
        dates::parse(raw, &self.config.date_format, self.config.timezone)
            .map(|dt| dt.to_rfc3339())
            .map_err(|source| MapError::BadDate {
                role,
                split: index,
                source,
            })
    }

    fn opt_date(&self, ps: &PseudoSplit, role: Role, index: usize) -> Result<Option<String>, MapError> {
        text(ps, role)
            .map(|raw| self.date(role, &raw, index))
            .transpose()
    }

    /// Tags from both tag roles, translated through the tag mapping, without
    /// duplicates.
    fn tags(&self, ps: &PseudoSplit) -> Vec<String> {
        let comma = ps
            .values_for(Role::TagsComma)
            .flat_map(|v| v.value.split(','));
        let space = ps
            .values_for(Role::TagsSpace)
            .flat_map(|v| v.value.split_whitespace());
        comma
            .chain(space)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                self.config
                    .tag_mapping
                    .get(t)
                    .cloned()
                    .unwrap_or_else(|| t.to_string())
            })
            .unique()
            .collect()
    }

    /// Resolves an object that is referred to by id or by name. A mapped name
    /// becomes an id.
    fn named_id(
        &self,
        ps: &PseudoSplit,
        id_role: Role,
        name_role: Role,
        index: usize,
    ) -> Result<(Option<u64>, Option<String>), MapError> {
        if let Some(raw) = text(ps, id_role) {
            return Ok((Some(parse_id(id_role, &raw, index)?), None));
        }
        Ok(match text(ps, name_role) {
            None => (None, None),
            Some(name) => match self.config.mapped_id(name_role, &name) {
                Some(id) => (Some(id), None),
                None => (None, Some(name)),
            },
        })
    }
}

/// The value of `role`: for single-valued roles the picked value, for others
/// all non-empty values joined by a space.
fn text(ps: &PseudoSplit, role: Role) -> Option<String> {
    if role.is_single_valued() {
        return ps.pick(role).map(str::to_string);
    }
    let joined = ps
        .values_for(role)
        .map(|v| v.value.trim())
        .filter(|v| !v.is_empty())
        .join(" ");
    if joined.is_empty() {
        None
    } else {
        Some(joined)
    }
}

fn parse_id(role: Role, raw: &str, index: usize) -> Result<u64, MapError> {
    raw.trim().parse().map_err(|_| MapError::BadId {
        role,
        value: raw.to_string(),
        split: index,
    })
}

/// Reads the indicator of a `generic-debit-credit` value: `Some(true)` for a
/// debit, `Some(false)` for a credit.
fn is_debit(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "d" | "db" | "dbit" | "debit" | "af" | "-" => Some(true),
        "c" | "cr" | "crdt" | "credit" | "bij" | "+" => Some(false),
        _ => None,
    }
}

lazy_static! {
    static ref AMOUNT_NOISE: Regex = Regex::new(r"[^0-9.,+\-]").unwrap();
}

/// Reads an amount as written in bank exports: currency symbols and spaces
/// are dropped, a trailing minus counts, and of `.` and `,` the last one is
/// the decimal separator (a separator that occurs more than once groups
/// thousands).
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned = AMOUNT_NOISE.replace_all(raw.trim(), "");
    let negative = cleaned.starts_with('-') || cleaned.ends_with('-');
    let digits = cleaned.trim_matches(|c: char| c == '-' || c == '+');
    if digits.is_empty() || digits.contains(|c: char| c == '-' || c == '+') {
        return None;
    }

    let decimal_sep = digits
        .rfind(|c: char| c == '.' || c == ',')
        .map(|i| digits.as_bytes()[i] as char)
        .filter(|sep| digits.matches(*sep).count() == 1);
    let normalized: String = digits
        .chars()
        .filter_map(|c| match c {
            '.' | ',' if Some(c) == decimal_sep => Some('.'),
            '.' | ',' => None,
            c => Some(c),
        })
        .collect();

    let value = Decimal::from_str(&normalized).ok()?;
    Some(if negative { -value } else { value })
}
