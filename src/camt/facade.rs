use thiserror::Error;

use crate::camt::field::{DetailOptions, Field};
use crate::camt::{Detail, Entry, Message, Statement};
use crate::config::Configuration;

#[derive(Debug, Error, PartialEq)]
pub enum FieldError {
    #[error("unknown field {field:?} requested for split {index}")]
    UnknownField { field: String, index: usize },
}

/// One logical transaction as seen by the converter: an `Entry` bound to zero
/// or more of its `Detail`s, with read access to the enclosing `Statement` and
/// `Message`.
#[derive(Clone, Debug)]
pub struct TransactionFacade<'a> {
    config: &'a Configuration,
    message: &'a Message,
    statement: &'a Statement,
    entry: &'a Entry,
    details: Vec<&'a Detail>,
}

impl<'a> TransactionFacade<'a> {
    pub fn new(
        config: &'a Configuration,
        message: &'a Message,
        statement: &'a Statement,
        entry: &'a Entry,
        details: Vec<&'a Detail>,
    ) -> Self {
        Self {
            config,
            message,
            statement,
            entry,
            details,
        }
    }

    /// Number of bound details. Zero means the entry is one implicit split.
    pub fn count_splits(&self) -> usize {
        self.details.len()
    }

    /// Resolves `field` for the split at `index`. Levels above D ignore the
    /// index; level D yields the empty string when the index is not bound.
    pub fn resolve(&self, field: Field, index: usize) -> String {
        match field {
            Field::Message(f) => f.resolve(self.message),
            Field::Statement(f) => f.resolve(self.statement),
            Field::Entry(f) => f.resolve(self.entry),
            Field::Detail(f) => f.resolve(self.details.get(index).copied(), self.detail_options()),
        }
    }

    /// Resolves a field by name.
    pub fn get_field_by_index(&self, name: &str, index: usize) -> Result<String, FieldError> {
        let field: Field = name.parse().map_err(|_| FieldError::UnknownField {
            field: name.to_string(),
            index,
        })?;
        Ok(self.resolve(field, index))
    }

    fn detail_options(&self) -> DetailOptions {
        DetailOptions {
            include_opposing_address: self.config.use_entire_opposing_address,
        }
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::camt::PartyRole;
    use crate::testutil::{detail, entry, message, party, statement};

    fn fixture() -> (Configuration, Message) {
        let e = entry(
            -10000,
            vec![
                detail(-6000, vec![party(PartyRole::Creditor, Some("Acme Corp"), &[])]),
                detail(-4000, vec![party(PartyRole::Creditor, Some("Other Ltd"), &[])]),
            ],
        );
        let msg = message("MSG-1", vec![statement("NL00BANK0123456789", vec![e])]);
        (Configuration::default(), msg)
    }

    #[test_case("messageId", 0 => Ok("MSG-1".to_string()))]
    #[test_case("messageId", 7 => Ok("MSG-1".to_string()) ; "level A ignores index")]
    #[test_case("statementAccountIban", 1 => Ok("NL00BANK0123456789".to_string()))]
    #[test_case("statementAccountNumber", 0 => Ok("".to_string()) ; "scheme mismatch is empty")]
    #[test_case("entryAmount", 1 => Ok("-100.00".to_string()))]
    #[test_case("entryDetailAmount", 0 => Ok("-60.00".to_string()))]
    #[test_case("entryDetailAmount", 1 => Ok("-40.00".to_string()))]
    #[test_case("entryDetailAmount", 2 => Ok("".to_string()) ; "index out of range")]
    #[test_case("entryDetailOpposingName", 1 => Ok("Other Ltd".to_string()))]
    #[test_case("entryDetailOpposingName", 5 => Ok("".to_string()) ; "opposing out of range")]
    #[test_case("bogus", 3 => Err(FieldError::UnknownField { field: "bogus".to_string(), index: 3 }))]
    fn get_field(name: &str, index: usize) -> Result<String, FieldError> {
        let (config, msg) = fixture();
        let stmt = &msg.statements[0];
        let e = &stmt.entries[0];
        let facade = TransactionFacade::new(&config, &msg, stmt, e, e.details.iter().collect());
        facade.get_field_by_index(name, index)
    }

    #[test]
    fn unbound_details_resolve_empty() {
        let (config, msg) = fixture();
        let stmt = &msg.statements[0];
        let e = &stmt.entries[0];
        let facade = TransactionFacade::new(&config, &msg, stmt, e, vec![]);
        assert_eq!(0, facade.count_splits());
        assert_eq!(Ok("".to_string()), facade.get_field_by_index("entryDetailAmount", 0));
        assert_eq!(Ok("-100.00".to_string()), facade.get_field_by_index("entryAmount", 0));
    }
}
