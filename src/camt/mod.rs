//! ISO 20022 CAMT statement object graph, and the pipeline stages that walk
//! it into pseudo-transactions.
//!
//! The graph has four levels: a `Message` (level A) holds `Statement`s
//! (level B), each of which holds booked `Entry`s (level C), each of which
//! may hold `Detail`s (level D, "EntryTransactionDetail").

use chrono::{DateTime, FixedOffset};

use crate::money::Money;

pub mod converter;
pub mod facade;
pub mod field;
pub mod opposing;
pub mod walker;
pub mod xml;

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub id: String,
    pub created_on: Option<DateTime<FixedOffset>>,
    pub statements: Vec<Statement>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Statement {
    pub id: String,
    pub created_on: Option<DateTime<FixedOffset>>,
    pub account: Account,
    pub entries: Vec<Entry>,
}

/// Identification scheme of an account.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccountScheme {
    Iban,
    Bban,
    Other,
    Proprietary,
    Upic,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Account {
    pub scheme: AccountScheme,
    pub identification: String,
}

impl Account {
    pub fn iban<S: Into<String>>(identification: S) -> Self {
        Self {
            scheme: AccountScheme::Iban,
            identification: identification.into(),
        }
    }

    pub fn other<S: Into<String>>(scheme: AccountScheme, identification: S) -> Self {
        Self {
            scheme,
            identification: identification.into(),
        }
    }

    /// The identification if this is an IBAN account.
    pub fn as_iban(&self) -> Option<&str> {
        match self.scheme {
            AccountScheme::Iban => Some(&self.identification),
            AccountScheme::Bban
            | AccountScheme::Other
            | AccountScheme::Proprietary
            | AccountScheme::Upic => None,
        }
    }

    /// The identification if this is any non-IBAN account.
    pub fn as_number(&self) -> Option<&str> {
        match self.scheme {
            AccountScheme::Iban => None,
            AccountScheme::Bban
            | AccountScheme::Other
            | AccountScheme::Proprietary
            | AccountScheme::Upic => Some(&self.identification),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CreditDebit {
    Credit,
    Debit,
}

impl CreditDebit {
    pub fn code(self) -> &'static str {
        match self {
            CreditDebit::Credit => "CRDT",
            CreditDebit::Debit => "DBIT",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BankTransactionCode {
    pub domain: Option<DomainCode>,
    pub proprietary: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct DomainCode {
    pub code: String,
    pub family_code: String,
    pub sub_family_code: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// Signed by `credit_debit`: debits are negative.
    pub amount: Money,
    pub credit_debit: CreditDebit,
    pub value_date: Option<DateTime<FixedOffset>>,
    pub booking_date: Option<DateTime<FixedOffset>>,
    pub bank_transaction_code: Option<BankTransactionCode>,
    pub account_servicer_reference: Option<String>,
    pub reference: Option<String>,
    pub additional_info: Option<String>,
    pub details: Vec<Detail>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Detail {
    /// Signed amount of this sub-transaction, if the bank reported one.
    pub amount: Option<Money>,
    /// Signed transaction amount from the nested amount details block.
    pub amount_details: Option<Money>,
    pub credit_debit: Option<CreditDebit>,
    pub reference: Option<String>,
    pub account_servicer_reference: Option<String>,
    pub bank_transaction_code: Option<BankTransactionCode>,
    pub remittance: Option<RemittanceInformation>,
    pub related_parties: Vec<RelatedParty>,
}

impl Detail {
    /// The detail's own amount, falling back to the amount details block.
    pub fn resolved_amount(&self) -> Option<&Money> {
        self.amount.as_ref().or(self.amount_details.as_ref())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RemittanceInformation {
    pub unstructured: Vec<String>,
    pub structured: Vec<StructuredRemittance>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StructuredRemittance {
    pub additional_info: Vec<String>,
    pub creditor_reference: Option<String>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PartyRole {
    Creditor,
    Debtor,
    UltimateCreditor,
    UltimateDebtor,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RelatedParty {
    pub role: PartyRole,
    pub name: Option<String>,
    pub address_lines: Vec<String>,
    pub account: Option<Account>,
}
