//! Named fields that can be read out of the CAMT graph.
//!
//! Each field belongs to exactly one level of the graph, and its resolver only
//! ever sees that level's data. Names are looked up in per-level tables.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::camt::opposing::{opposing_party, party_name};
use crate::camt::{BankTransactionCode, Detail, DomainCode, Entry, Message, Statement};
use crate::money;

#[derive(Debug, Error, PartialEq)]
#[error("unknown CAMT field {0:?}")]
pub struct ParseFieldError(pub String);

#[derive(Clone, Copy, Debug, Eq, Ord, PartialEq, PartialOrd)]
pub enum Level {
    Message,
    Statement,
    Entry,
    Detail,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MessageField {
    MessageId,
    MessageCreationDate,
}

const MESSAGE_FIELDS: &[(&str, MessageField)] = &[
    ("messageId", MessageField::MessageId),
    ("messageCreationDate", MessageField::MessageCreationDate),
];

impl MessageField {
    pub fn resolve(self, message: &Message) -> String {
        match self {
            MessageField::MessageId => message.id.clone(),
            MessageField::MessageCreationDate => format_date(message.created_on.as_ref()),
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StatementField {
    StatementId,
    StatementCreationDate,
    StatementAccountIban,
    StatementAccountNumber,
}

const STATEMENT_FIELDS: &[(&str, StatementField)] = &[
    ("statementId", StatementField::StatementId),
    ("statementCreationDate", StatementField::StatementCreationDate),
    ("statementAccountIban", StatementField::StatementAccountIban),
    ("statementAccountNumber", StatementField::StatementAccountNumber),
];

impl StatementField {
    pub fn resolve(self, statement: &Statement) -> String {
        match self {
            StatementField::StatementId => statement.id.clone(),
            StatementField::StatementCreationDate => format_date(statement.created_on.as_ref()),
            StatementField::StatementAccountIban => {
                statement.account.as_iban().unwrap_or_default().to_string()
            }
            StatementField::StatementAccountNumber => {
                statement.account.as_number().unwrap_or_default().to_string()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EntryField {
    Amount,
    AmountCurrency,
    ValueDate,
    BookingDate,
    CreditDebitIndicator,
    BtcDomainCode,
    BtcFamilyCode,
    BtcSubFamilyCode,
    BtcProprietaryCode,
    Reference,
    AdditionalInfo,
    AccountServicerReference,
}

const ENTRY_FIELDS: &[(&str, EntryField)] = &[
    ("entryAmount", EntryField::Amount),
    ("entryAmountCurrency", EntryField::AmountCurrency),
    ("entryValueDate", EntryField::ValueDate),
    ("entryBookingDate", EntryField::BookingDate),
    ("entryCreditDebitIndicator", EntryField::CreditDebitIndicator),
    ("entryBtcDomainCode", EntryField::BtcDomainCode),
    ("entryBtcFamilyCode", EntryField::BtcFamilyCode),
    ("entryBtcSubFamilyCode", EntryField::BtcSubFamilyCode),
    ("entryBtcProprietaryCode", EntryField::BtcProprietaryCode),
    ("entryReference", EntryField::Reference),
    ("entryAdditionalInfo", EntryField::AdditionalInfo),
    ("entryAccountServicerReference", EntryField::AccountServicerReference),
];

impl EntryField {
    pub fn resolve(self, entry: &Entry) -> String {
        let btc = entry.bank_transaction_code.as_ref();
        match self {
            EntryField::Amount => entry.amount.to_string(),
            EntryField::AmountCurrency => entry.amount.currency.clone(),
            EntryField::ValueDate => format_date(entry.value_date.as_ref()),
            EntryField::BookingDate => format_date(entry.booking_date.as_ref()),
            EntryField::CreditDebitIndicator => entry.credit_debit.code().to_string(),
            EntryField::BtcDomainCode => domain_part(btc, |d| &d.code),
            EntryField::BtcFamilyCode => domain_part(btc, |d| &d.family_code),
            EntryField::BtcSubFamilyCode => domain_part(btc, |d| &d.sub_family_code),
            EntryField::BtcProprietaryCode => btc
                .and_then(|btc| btc.proprietary.clone())
                .unwrap_or_default(),
            EntryField::Reference => entry.reference.clone().unwrap_or_default(),
            EntryField::AdditionalInfo => entry.additional_info.clone().unwrap_or_default(),
            EntryField::AccountServicerReference => {
                entry.account_servicer_reference.clone().unwrap_or_default()
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetailField {
    Amount,
    AmountCurrency,
    Reference,
    AccountServicerReference,
    UnstructuredMessage,
    StructuredAdditionalInfo,
    StructuredCreditorReference,
    BtcDomainCode,
    BtcFamilyCode,
    BtcSubFamilyCode,
    OpposingName,
    OpposingAccountIban,
    OpposingAccountNumber,
}

const DETAIL_FIELDS: &[(&str, DetailField)] = &[
    ("entryDetailAmount", DetailField::Amount),
    ("entryDetailAmountCurrency", DetailField::AmountCurrency),
    ("entryDetailReference", DetailField::Reference),
    (
        "entryDetailAccountServicerReference",
        DetailField::AccountServicerReference,
    ),
    (
        "entryDetailRemittanceInformationUnstructuredBlockMessage",
        DetailField::UnstructuredMessage,
    ),
    (
        "entryDetailRemittanceInformationStructuredBlockAdditionalRemittanceInformation",
        DetailField::StructuredAdditionalInfo,
    ),
    (
        "entryDetailRemittanceInformationStructuredBlockCreditorReference",
        DetailField::StructuredCreditorReference,
    ),
    ("entryDetailBtcDomainCode", DetailField::BtcDomainCode),
    ("entryDetailBtcFamilyCode", DetailField::BtcFamilyCode),
    ("entryDetailBtcSubFamilyCode", DetailField::BtcSubFamilyCode),
    ("entryDetailOpposingName", DetailField::OpposingName),
    ("entryDetailOpposingAccountIban", DetailField::OpposingAccountIban),
    ("entryDetailOpposingAccountNumber", DetailField::OpposingAccountNumber),
];

/// Options that alter how level D fields are rendered.
#[derive(Clone, Copy, Debug, Default)]
pub struct DetailOptions {
    pub include_opposing_address: bool,
}

impl DetailField {
    /// Resolves against a bound detail. A missing detail yields the empty
    /// string for every field.
    pub fn resolve(self, detail: Option<&Detail>, opts: DetailOptions) -> String {
        let detail = match detail {
            Some(d) => d,
            None => return String::new(),
        };
        let btc = detail.bank_transaction_code.as_ref();
        match self {
            DetailField::Amount => money::format_opt(detail.resolved_amount()),
            DetailField::AmountCurrency => detail
                .resolved_amount()
                .map(|m| m.currency.clone())
                .unwrap_or_default(),
            DetailField::Reference => detail.reference.clone().unwrap_or_default(),
            DetailField::AccountServicerReference => {
                detail.account_servicer_reference.clone().unwrap_or_default()
            }
            DetailField::UnstructuredMessage => detail
                .remittance
                .as_ref()
                .map(|r| r.unstructured.join(" "))
                .unwrap_or_default(),
            DetailField::StructuredAdditionalInfo => detail
                .remittance
                .as_ref()
                .map(|r| {
                    itertools::join(
                        r.structured.iter().flat_map(|s| s.additional_info.iter()),
                        " ",
                    )
                })
                .unwrap_or_default(),
            DetailField::StructuredCreditorReference => detail
                .remittance
                .as_ref()
                .and_then(|r| r.structured.iter().find_map(|s| s.creditor_reference.clone()))
                .unwrap_or_default(),
            DetailField::BtcDomainCode => domain_part(btc, |d| &d.code),
            DetailField::BtcFamilyCode => domain_part(btc, |d| &d.family_code),
            DetailField::BtcSubFamilyCode => domain_part(btc, |d| &d.sub_family_code),
            DetailField::OpposingName => opposing_party(detail)
                .map(|p| party_name(p, opts.include_opposing_address))
                .unwrap_or_default(),
            DetailField::OpposingAccountIban => opposing_party(detail)
                .and_then(|p| p.account.as_ref())
                .and_then(|a| a.as_iban())
                .unwrap_or_default()
                .to_string(),
            DetailField::OpposingAccountNumber => opposing_party(detail)
                .and_then(|p| p.account.as_ref())
                .and_then(|a| a.as_number())
                .unwrap_or_default()
                .to_string(),
        }
    }
}

/// A field of the CAMT graph, tagged with the level that owns it.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Field {
    Message(MessageField),
    Statement(StatementField),
    Entry(EntryField),
    Detail(DetailField),
}

impl Field {
    pub fn level(self) -> Level {
        match self {
            Field::Message(_) => Level::Message,
            Field::Statement(_) => Level::Statement,
            Field::Entry(_) => Level::Entry,
            Field::Detail(_) => Level::Detail,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Field::Message(f) => lookup_name(MESSAGE_FIELDS, f),
            Field::Statement(f) => lookup_name(STATEMENT_FIELDS, f),
            Field::Entry(f) => lookup_name(ENTRY_FIELDS, f),
            Field::Detail(f) => lookup_name(DETAIL_FIELDS, f),
        }
    }
}

impl FromStr for Field {
    type Err = ParseFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup_field(MESSAGE_FIELDS, s)
            .map(Field::Message)
            .or_else(|| lookup_field(STATEMENT_FIELDS, s).map(Field::Statement))
            .or_else(|| lookup_field(ENTRY_FIELDS, s).map(Field::Entry))
            .or_else(|| lookup_field(DETAIL_FIELDS, s).map(Field::Detail))
            .ok_or_else(|| ParseFieldError(s.to_string()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        f.write_str(self.name())
    }
}

fn lookup_field<F: Copy>(table: &[(&'static str, F)], name: &str) -> Option<F> {
    table.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}

fn lookup_name<F: Copy + PartialEq>(table: &[(&'static str, F)], field: F) -> &'static str {
    table
        .iter()
        .find(|(_, f)| *f == field)
        .map(|(n, _)| *n)
        .unwrap_or_default()
}

fn format_date(date: Option<&DateTime<FixedOffset>>) -> String {
    date.map(DateTime::to_rfc3339).unwrap_or_default()
}

/// Bank transaction code sub-fields are only meaningful when a domain code is
/// present.
fn domain_part<F>(btc: Option<&BankTransactionCode>, part: F) -> String
where
    F: Fn(&DomainCode) -> &String,
{
    btc.and_then(|btc| btc.domain.as_ref())
        .map(|domain| part(domain).clone())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::camt::{Account, AccountScheme, PartyRole, RemittanceInformation};
    use crate::money::Money;
    use crate::testutil::{detail, entry, party, statement};

    #[test]
    fn names_round_trip() {
        let all = MESSAGE_FIELDS
            .iter()
            .map(|(n, f)| (*n, Field::Message(*f)))
            .chain(STATEMENT_FIELDS.iter().map(|(n, f)| (*n, Field::Statement(*f))))
            .chain(ENTRY_FIELDS.iter().map(|(n, f)| (*n, Field::Entry(*f))))
            .chain(DETAIL_FIELDS.iter().map(|(n, f)| (*n, Field::Detail(*f))));
        for (name, field) in all {
            assert_eq!(Ok(field), name.parse::<Field>());
            assert_eq!(name, field.name());
        }
    }

    #[test_case("messageId" => Ok(Level::Message))]
    #[test_case("statementAccountIban" => Ok(Level::Statement))]
    #[test_case("entryBtcFamilyCode" => Ok(Level::Entry))]
    #[test_case("entryDetailOpposingName" => Ok(Level::Detail))]
    #[test_case("entryOpposingName" => Err(ParseFieldError("entryOpposingName".to_string())) ; "unknown")]
    fn level_of(name: &str) -> Result<Level, ParseFieldError> {
        name.parse::<Field>().map(Field::level)
    }

    #[test_case(AccountScheme::Iban => ("NL00BANK0123456789".to_string(), "".to_string()))]
    #[test_case(AccountScheme::Bban => ("".to_string(), "NL00BANK0123456789".to_string()))]
    #[test_case(AccountScheme::Upic => ("".to_string(), "NL00BANK0123456789".to_string()))]
    #[test_case(AccountScheme::Proprietary => ("".to_string(), "NL00BANK0123456789".to_string()))]
    fn account_by_scheme(scheme: AccountScheme) -> (String, String) {
        let mut stmt = statement("NL00BANK0123456789", vec![]);
        stmt.account = Account::other(scheme, "NL00BANK0123456789");
        (
            StatementField::StatementAccountIban.resolve(&stmt),
            StatementField::StatementAccountNumber.resolve(&stmt),
        )
    }

    #[test]
    fn bank_transaction_code_without_domain_is_empty() {
        let mut e = entry(-100, vec![]);
        e.bank_transaction_code = Some(BankTransactionCode {
            domain: None,
            proprietary: Some("NTRF".to_string()),
        });
        assert_eq!("", EntryField::BtcDomainCode.resolve(&e));
        assert_eq!("", EntryField::BtcFamilyCode.resolve(&e));
        assert_eq!("", EntryField::BtcSubFamilyCode.resolve(&e));
        assert_eq!("NTRF", EntryField::BtcProprietaryCode.resolve(&e));

        e.bank_transaction_code = Some(BankTransactionCode {
            domain: Some(DomainCode {
                code: "PMNT".to_string(),
                family_code: "RCDT".to_string(),
                sub_family_code: "ESCT".to_string(),
            }),
            proprietary: None,
        });
        assert_eq!("PMNT", EntryField::BtcDomainCode.resolve(&e));
        assert_eq!("RCDT", EntryField::BtcFamilyCode.resolve(&e));
        assert_eq!("ESCT", EntryField::BtcSubFamilyCode.resolve(&e));
    }

    #[test]
    fn entry_amount_and_dates() {
        let e = entry(-12345, vec![]);
        assert_eq!("-123.45", EntryField::Amount.resolve(&e));
        assert_eq!("EUR", EntryField::AmountCurrency.resolve(&e));
        assert_eq!("2024-03-01T00:00:00+00:00", EntryField::ValueDate.resolve(&e));
        assert_eq!("DBIT", EntryField::CreditDebitIndicator.resolve(&e));
        assert_eq!("", EntryField::Reference.resolve(&e));
    }

    #[test]
    fn missing_detail_is_empty() {
        let opts = DetailOptions::default();
        assert_eq!("", DetailField::Amount.resolve(None, opts));
        assert_eq!("", DetailField::AmountCurrency.resolve(None, opts));
        assert_eq!("", DetailField::OpposingName.resolve(None, opts));
    }

    #[test]
    fn detail_amount_absent_is_empty_not_zero() {
        let d = Detail::default();
        let opts = DetailOptions::default();
        assert_eq!("", DetailField::Amount.resolve(Some(&d), opts));
        assert_eq!("", DetailField::AmountCurrency.resolve(Some(&d), opts));
    }

    #[test]
    fn detail_amount_falls_back_to_amount_details() {
        let mut d = Detail::default();
        d.amount_details = Some(Money::new(-4200, "USD"));
        let opts = DetailOptions::default();
        assert_eq!("-42.00", DetailField::Amount.resolve(Some(&d), opts));
        assert_eq!("USD", DetailField::AmountCurrency.resolve(Some(&d), opts));
    }

    #[test]
    fn remittance_blocks() {
        let mut d = detail(-100, vec![]);
        d.remittance = Some(RemittanceInformation {
            unstructured: vec!["Invoice 12".to_string(), "and 13".to_string()],
            structured: vec![crate::camt::StructuredRemittance {
                additional_info: vec!["extra".to_string()],
                creditor_reference: Some("RF18539007547034".to_string()),
            }],
        });
        let opts = DetailOptions::default();
        assert_eq!(
            "Invoice 12 and 13",
            DetailField::UnstructuredMessage.resolve(Some(&d), opts)
        );
        assert_eq!(
            "extra",
            DetailField::StructuredAdditionalInfo.resolve(Some(&d), opts)
        );
        assert_eq!(
            "RF18539007547034",
            DetailField::StructuredCreditorReference.resolve(Some(&d), opts)
        );
    }

    #[test]
    fn opposing_fields() {
        let mut creditor = party(PartyRole::Creditor, Some("Acme Corp"), &["Main St 1"]);
        creditor.account = Some(Account::iban("DE89370400440532013000"));
        let mut debtor = party(PartyRole::Debtor, None, &["Elm St 2", "Utrecht"]);
        debtor.account = Some(Account::other(AccountScheme::Bban, "123456"));

        let outgoing = detail(-6000, vec![creditor.clone(), debtor.clone()]);
        let incoming = detail(4000, vec![creditor, debtor]);
        let opts = DetailOptions::default();

        assert_eq!("Acme Corp", DetailField::OpposingName.resolve(Some(&outgoing), opts));
        assert_eq!(
            "DE89370400440532013000",
            DetailField::OpposingAccountIban.resolve(Some(&outgoing), opts)
        );
        assert_eq!("", DetailField::OpposingAccountNumber.resolve(Some(&outgoing), opts));

        assert_eq!(
            "Elm St 2, Utrecht",
            DetailField::OpposingName.resolve(Some(&incoming), opts)
        );
        assert_eq!("", DetailField::OpposingAccountIban.resolve(Some(&incoming), opts));
        assert_eq!(
            "123456",
            DetailField::OpposingAccountNumber.resolve(Some(&incoming), opts)
        );

        let with_address = DetailOptions {
            include_opposing_address: true,
        };
        assert_eq!(
            "Acme Corp, Main St 1",
            DetailField::OpposingName.resolve(Some(&outgoing), with_address)
        );
    }

    #[test]
    fn undefined_opposing_party_is_empty() {
        let d = detail(-100, vec![party(PartyRole::Debtor, Some("Me"), &[])]);
        let opts = DetailOptions::default();
        assert_eq!("", DetailField::OpposingName.resolve(Some(&d), opts));
        assert_eq!("", DetailField::OpposingAccountIban.resolve(Some(&d), opts));
        assert_eq!("", DetailField::OpposingAccountNumber.resolve(Some(&d), opts));
    }
}
