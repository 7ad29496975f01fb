//! Destination roles that a source column or CAMT field can be assigned to.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("unknown role {0:?}")]
pub struct ParseRoleError(pub String);

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Role {
    Ignore,
    Amount,
    AmountDebit,
    AmountCredit,
    AmountNegated,
    AmountForeign,
    CurrencyCode,
    ForeignCurrencyCode,
    AccountId,
    AccountIban,
    AccountNumber,
    AccountName,
    OpposingId,
    OpposingIban,
    OpposingNumber,
    OpposingName,
    OpposingBic,
    Description,
    Note,
    DateTransaction,
    DateBook,
    DateProcess,
    DateInterest,
    DateDue,
    DatePayment,
    DateInvoice,
    TagsComma,
    TagsSpace,
    CategoryId,
    CategoryName,
    BudgetId,
    BudgetName,
    BillId,
    BillName,
    InternalReference,
    ExternalId,
    ExternalUrl,
    GenericDebitCredit,
}

use Role::*;

const ROLE_NAMES: &[(&str, Role)] = &[
    ("_ignore", Ignore),
    ("amount", Amount),
    ("amount_debit", AmountDebit),
    ("amount_credit", AmountCredit),
    ("amount_negated", AmountNegated),
    ("amount_foreign", AmountForeign),
    ("currency-code", CurrencyCode),
    ("foreign-currency-code", ForeignCurrencyCode),
    ("account-id", AccountId),
    ("account-iban", AccountIban),
    ("account-number", AccountNumber),
    ("account-name", AccountName),
    ("opposing-id", OpposingId),
    ("opposing-iban", OpposingIban),
    ("opposing-number", OpposingNumber),
    ("opposing-name", OpposingName),
    ("opposing-bic", OpposingBic),
    ("description", Description),
    ("note", Note),
    ("date_transaction", DateTransaction),
    ("date_book", DateBook),
    ("date_process", DateProcess),
    ("date_interest", DateInterest),
    ("date_due", DateDue),
    ("date_payment", DatePayment),
    ("date_invoice", DateInvoice),
    ("tags-comma", TagsComma),
    ("tags-space", TagsSpace),
    ("category-id", CategoryId),
    ("category-name", CategoryName),
    ("budget-id", BudgetId),
    ("budget-name", BudgetName),
    ("bill-id", BillId),
    ("bill-name", BillName),
    ("internal_reference", InternalReference),
    ("external-id", ExternalId),
    ("external-url", ExternalUrl),
    ("generic-debit-credit", GenericDebitCredit),
];

impl Role {
    pub fn name(self) -> &'static str {
        ROLE_NAMES
            .iter()
            .find(|(_, role)| *role == self)
            .map(|(name, _)| *name)
            .unwrap_or("_ignore")
    }

    /// Roles that hold a single value per split. When several sources feed
    /// one of these, the first non-empty value wins (Level-D values first).
    pub fn is_single_valued(self) -> bool {
        !matches!(self, Ignore | Description | Note | TagsComma | TagsSpace)
    }

    /// Roles that a pseudo-identifier may be written to.
    pub fn can_hold_identifier(self) -> bool {
        matches!(self, InternalReference | ExternalId | Note | Description)
    }
}

impl FromStr for Role {
    type Err = ParseRoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ROLE_NAMES
            .iter()
            .find(|(name, _)| *name == s)
            .map(|(_, role)| *role)
            .ok_or_else(|| ParseRoleError(s.to_string()))
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}
