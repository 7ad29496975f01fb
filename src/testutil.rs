use chrono::{DateTime, FixedOffset};

use crate::camt::{Account, CreditDebit, Detail, Entry, Message, PartyRole, RelatedParty, Statement};
use crate::money::Money;

pub const TEST_DATE: &str = "2024-03-01T00:00:00+00:00";

pub fn test_date() -> DateTime<FixedOffset> {
    DateTime::parse_from_rfc3339(TEST_DATE).expect("test date did not parse")
}

fn credit_debit(minor_units: i64) -> CreditDebit {
    if minor_units < 0 {
        CreditDebit::Debit
    } else {
        CreditDebit::Credit
    }
}

pub fn message(id: &str, statements: Vec<Statement>) -> Message {
    Message {
        id: id.to_string(),
        created_on: Some(test_date()),
        statements,
    }
}

pub fn statement(iban: &str, entries: Vec<Entry>) -> Statement {
    Statement {
        id: format!("STMT-{}", iban),
        created_on: Some(test_date()),
        account: Account::iban(iban),
        entries,
    }
}

/// A EUR entry of `minor_units`, booked and valued on `TEST_DATE`.
pub fn entry(minor_units: i64, details: Vec<Detail>) -> Entry {
    Entry {
        amount: Money::new(minor_units, "EUR"),
        credit_debit: credit_debit(minor_units),
        value_date: Some(test_date()),
        booking_date: Some(test_date()),
        bank_transaction_code: None,
        account_servicer_reference: None,
        reference: None,
        additional_info: None,
        details,
    }
}

pub fn detail(minor_units: i64, related_parties: Vec<RelatedParty>) -> Detail {
    Detail {
        amount: Some(Money::new(minor_units, "EUR")),
        credit_debit: Some(credit_debit(minor_units)),
        related_parties,
        ..Default::default()
    }
}

pub fn party(role: PartyRole, name: Option<&str>, address_lines: &[&str]) -> RelatedParty {
    RelatedParty {
        role,
        name: name.map(str::to_string),
        address_lines: address_lines.iter().map(|s| s.to_string()).collect(),
        account: None,
    }
}

pub fn format_json<T: serde::Serialize>(value: &T) -> String {
    let mut s = serde_json::to_string_pretty(value).expect("value did not serialize");
    s.push('\n');
    s
}
