//! Intermediate record passed from a converter to the `Mapper`: one logical
//! transfer with its splits, each carrying role-tagged raw values.

use std::collections::BTreeMap;

use crate::role::Role;

/// A raw value destined for `role`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RoleValue {
    pub role: Role,
    pub value: String,
    /// Set for values read from a CAMT level D detail. These take precedence
    /// over values from higher levels for single-valued roles.
    pub from_detail: bool,
}

impl RoleValue {
    pub fn new<S: Into<String>>(role: Role, value: S) -> Self {
        Self {
            role,
            value: value.into(),
            from_detail: false,
        }
    }

    pub fn from_detail<S: Into<String>>(role: Role, value: S) -> Self {
        Self {
            role,
            value: value.into(),
            from_detail: true,
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PseudoSplit {
    /// Default transaction date, used when no `date_transaction` value is set.
    pub date: String,
    /// Default currency, used when no `currency-code` value is set.
    pub currency_code: String,
    /// Raw values in source column order, for pseudo-identifiers.
    pub columns: Vec<String>,
    pub values: Vec<RoleValue>,
}

impl PseudoSplit {
    /// Values for `role`, in source order.
    pub fn values_for(&self, role: Role) -> impl Iterator<Item = &RoleValue> {
        self.values.iter().filter(move |v| v.role == role)
    }

    /// The value a single-valued role takes: the first non-empty level D
    /// value, else the first non-empty value.
    pub fn pick(&self, role: Role) -> Option<&str> {
        let non_empty = || self.values_for(role).filter(|v| !v.value.is_empty());
        non_empty()
            .find(|v| v.from_detail)
            .or_else(|| non_empty().next())
            .map(|v| v.value.as_str())
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PseudoTransaction {
    /// Source index used when reporting on this transaction.
    pub index: usize,
    pub group_title: Option<String>,
    pub duplicate_flag: bool,
    /// Number of splits the source produced. Splits that failed conversion
    /// are missing from `splits`.
    pub expected_splits: usize,
    pub splits: BTreeMap<usize, PseudoSplit>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pick_prefers_detail_values() {
        let split = PseudoSplit {
            values: vec![
                RoleValue::new(Role::Amount, "-100.00"),
                RoleValue::from_detail(Role::Amount, "-60.00"),
            ],
            ..Default::default()
        };
        assert_eq!(Some("-60.00"), split.pick(Role::Amount));
    }

    #[test]
    fn pick_skips_empty_detail_values() {
        let split = PseudoSplit {
            values: vec![
                RoleValue::new(Role::Amount, "-100.00"),
                RoleValue::from_detail(Role::Amount, ""),
            ],
            ..Default::default()
        };
        assert_eq!(Some("-100.00"), split.pick(Role::Amount));
        assert_eq!(None, split.pick(Role::CurrencyCode));
    }
}
