//! Works out which related party of a `Detail` is the other side of the
//! transaction. CAMT does not say this explicitly; it follows from the sign
//! of the amount.

use crate::camt::{Detail, PartyRole, RelatedParty};

/// Money coming in (positive) was paid by the debtor; anything else (zero
/// included) went to the creditor.
pub fn target_role(detail: &Detail) -> PartyRole {
    match detail.resolved_amount() {
        Some(amount) if amount.is_positive() => PartyRole::Debtor,
        _ => PartyRole::Creditor,
    }
}

/// The first related party with the target role, if any.
pub fn opposing_party(detail: &Detail) -> Option<&RelatedParty> {
    let target = target_role(detail);
    detail.related_parties.iter().find(|party| party.role == target)
}

/// Display name of a party. A party without a name is described by its
/// address; `include_address` appends the address to a present name too.
pub fn party_name(party: &RelatedParty, include_address: bool) -> String {
    let address = party.address_lines.join(", ");
    match &party.name {
        Some(name) if include_address && !address.is_empty() => format!("{}, {}", name, address),
        Some(name) => name.clone(),
        None => address,
    }
}
