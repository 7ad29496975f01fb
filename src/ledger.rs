//! Ledger entries as handed to the posting API.

use serde::Serialize;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Withdrawal,
    Deposit,
}

/// One side of a split. Either `id` (a known destination account) or some of
/// the raw identifying values are set.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AccountRef {
    pub id: Option<u64>,
    pub name: Option<String>,
    pub iban: Option<String>,
    pub number: Option<String>,
    pub bic: Option<String>,
}

impl AccountRef {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Split {
    #[serde(rename = "type")]
    pub type_: TransactionType,
    pub date: String,
    /// Absolute amount, fixed point at the currency's precision.
    pub amount: String,
    pub currency_code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_currency_code: Option<String>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_bic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_iban: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination_bic: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub book_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub process_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interest_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_id: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bill_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_url: Option<String>,
}

impl Split {
    pub fn new(type_: TransactionType, date: String, amount: String, currency_code: String) -> Self {
        Self {
            type_,
            date,
            amount,
            currency_code,
            foreign_amount: None,
            foreign_currency_code: None,
            description: String::new(),
            source_id: None,
            source_name: None,
            source_iban: None,
            source_number: None,
            source_bic: None,
            destination_id: None,
            destination_name: None,
            destination_iban: None,
            destination_number: None,
            destination_bic: None,
            tags: Vec::new(),
            notes: None,
            book_date: None,
            process_date: None,
            interest_date: None,
            due_date: None,
            payment_date: None,
            invoice_date: None,
            category_id: None,
            category_name: None,
            budget_id: None,
            budget_name: None,
            bill_id: None,
            bill_name: None,
            internal_reference: None,
            external_id: None,
            external_url: None,
        }
    }

    pub fn set_source(&mut self, account: AccountRef) {
        self.source_id = account.id;
        self.source_name = account.name;
        self.source_iban = account.iban;
        self.source_number = account.number;
        self.source_bic = account.bic;
    }

    pub fn set_destination(&mut self, account: AccountRef) {
        self.destination_id = account.id;
        self.destination_name = account.name;
        self.destination_iban = account.iban;
        self.destination_number = account.number;
        self.destination_bic = account.bic;
    }

    /// Appends `text` to the notes, space separated.
    pub fn append_note(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match &mut self.notes {
            Some(notes) if !notes.is_empty() => {
                notes.push(' ');
                notes.push_str(text);
            }
            _ => self.notes = Some(text.to_string()),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct LedgerEntry {
    /// Index of the source transaction, for reporting.
    #[serde(skip)]
    pub source_index: usize,
    /// Set for entries with more than one split.
    pub group_title: Option<String>,
    pub error_if_duplicate_hash: bool,
    pub apply_rules: bool,
    pub transactions: Vec<Split>,
}
