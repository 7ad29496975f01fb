//! Reads camt.052 (account report) and camt.053 (statement) documents into
//! the `Message` graph.
//!
//! Amounts in the XML are unsigned; the credit/debit indicator is applied
//! here so that every `Money` in the graph carries its sign. Details without
//! their own indicator take the indicator of their entry.

use std::io::Read;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Offset, TimeZone, Utc};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::debug;

use crate::camt::{
    Account, AccountScheme, BankTransactionCode, CreditDebit, Detail, DomainCode, Entry, Message,
    PartyRole, RelatedParty, RemittanceInformation, Statement, StructuredRemittance,
};
use crate::money::{Money, MoneyError};

#[derive(Debug, Error)]
pub enum CamtReadError {
    #[error("reading CAMT document: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed CAMT document: {0}")]
    Xml(#[from] quick_xml::de::DeError),
    #[error("document holds neither BkToCstmrStmt nor BkToCstmrAcctRpt")]
    UnsupportedDocument,
    #[error("bad amount {value:?}: {source}")]
    BadAmount {
        value: String,
        source: rust_decimal::Error,
    },
    #[error(transparent)]
    Money(#[from] MoneyError),
    #[error("bad credit/debit indicator {0:?}")]
    BadCreditDebit(String),
    #[error("bad date {0:?}")]
    BadDate(String),
    #[error("statement {0:?} has no account identification")]
    MissingAccount(String),
}

pub fn read_message<R: Read>(mut reader: R) -> Result<Message, CamtReadError> {
    let mut xml = String::new();
    reader.read_to_string(&mut xml)?;
    parse_message(&xml)
}

pub fn parse_message(xml: &str) -> Result<Message, CamtReadError> {
    let doc: de::Document = quick_xml::de::from_str(xml)?;
    let (container, kind) = match (doc.statement, doc.report) {
        (Some(c), _) => (c, "camt.053"),
        (None, Some(c)) => (c, "camt.052"),
        (None, None) => return Err(CamtReadError::UnsupportedDocument),
    };

    let statements = container
        .stmt
        .into_iter()
        .chain(container.rpt)
        .map(convert_statement)
        .collect::<Result<Vec<Statement>, CamtReadError>>()?;
    debug!(
        "read {} message {:?} with {} statements",
        kind,
        container.grp_hdr.msg_id,
        statements.len()
    );

    Ok(Message {
        id: container.grp_hdr.msg_id,
        created_on: container
            .grp_hdr
            .cre_dt_tm
            .as_deref()
            .map(parse_date_time)
            .transpose()?,
        statements,
    })
}

fn convert_statement(stmt: de::Statement) -> Result<Statement, CamtReadError> {
    let account = convert_account(stmt.acct.id)
        .ok_or_else(|| CamtReadError::MissingAccount(stmt.id.clone()))?;
    Ok(Statement {
        created_on: stmt.cre_dt_tm.as_deref().map(parse_date_time).transpose()?,
        account,
        entries: stmt
            .ntry
            .into_iter()
            .map(convert_entry)
            .collect::<Result<_, _>>()?,
        id: stmt.id,
    })
}

fn convert_account(id: de::AccountId) -> Option<Account> {
    if let Some(iban) = id.iban {
        return Some(Account::iban(iban));
    }
    let other = id.othr?;
    let scheme = match other.schme_nm {
        Some(de::SchemeName { cd: Some(cd), .. }) if cd == "BBAN" => AccountScheme::Bban,
        Some(de::SchemeName { cd: Some(cd), .. }) if cd == "UPIC" => AccountScheme::Upic,
        Some(de::SchemeName { prtry: Some(_), .. }) => AccountScheme::Proprietary,
        _ => AccountScheme::Other,
    };
    Some(Account::other(scheme, other.id))
}

fn convert_entry(ntry: de::Entry) -> Result<Entry, CamtReadError> {
    let credit_debit = parse_credit_debit(&ntry.cdt_dbt_ind)?;
    let details = ntry
        .ntry_dtls
        .into_iter()
        .flat_map(|d| d.tx_dtls)
        .map(|tx| convert_detail(tx, credit_debit))
        .collect::<Result<_, _>>()?;
    Ok(Entry {
        amount: signed_money(&ntry.amt, credit_debit)?,
        credit_debit,
        value_date: ntry.val_dt.as_ref().map(parse_date_choice).transpose()?,
        booking_date: ntry.bookg_dt.as_ref().map(parse_date_choice).transpose()?,
        bank_transaction_code: ntry.bk_tx_cd.map(convert_btc),
        account_servicer_reference: ntry.acct_svcr_ref,
        reference: ntry.ntry_ref,
        additional_info: ntry.addtl_ntry_inf,
        details,
    })
}

fn convert_detail(tx: de::TransactionDetails, entry_cd: CreditDebit) -> Result<Detail, CamtReadError> {
    let credit_debit = tx
        .cdt_dbt_ind
        .as_deref()
        .map(parse_credit_debit)
        .transpose()?;
    let cd = credit_debit.unwrap_or(entry_cd);

    let amount_details = tx
        .amt_dtls
        .and_then(|d| d.tx_amt.or(d.instd_amt))
        .map(|a| signed_money(&a.amt, cd))
        .transpose()?;

    let (reference, account_servicer_reference) = match tx.refs {
        Some(refs) => (refs.end_to_end_id.or(refs.tx_id), refs.acct_svcr_ref),
        None => (None, None),
    };

    Ok(Detail {
        amount: tx.amt.as_ref().map(|a| signed_money(a, cd)).transpose()?,
        amount_details,
        credit_debit,
        reference,
        account_servicer_reference,
        bank_transaction_code: tx.bk_tx_cd.map(convert_btc),
        remittance: tx.rmt_inf.map(|r| RemittanceInformation {
            unstructured: r.ustrd,
            structured: r
                .strd
                .into_iter()
                .map(|s| StructuredRemittance {
                    additional_info: s.addtl_rmt_inf,
                    creditor_reference: s.cdtr_ref_inf.and_then(|c| c.r#ref),
                })
                .collect(),
        }),
        related_parties: tx.rltd_pties.map(convert_parties).unwrap_or_default(),
    })
}

fn convert_parties(p: de::RelatedParties) -> Vec<RelatedParty> {
    let convert = |role, party: Option<de::Party>, acct: Option<de::CashAccount>| {
        party.map(|party| {
            let ident = match party.pty {
                Some(inner) => inner,
                None => de::PartyIdentification {
                    nm: party.nm,
                    pstl_adr: party.pstl_adr,
                },
            };
            RelatedParty {
                role,
                name: ident.nm,
                address_lines: ident.pstl_adr.map(address_lines).unwrap_or_default(),
                account: acct.and_then(|a| convert_account(a.id)),
            }
        })
    };
    [
        convert(PartyRole::Debtor, p.dbtr, p.dbtr_acct),
        convert(PartyRole::Creditor, p.cdtr, p.cdtr_acct),
        convert(PartyRole::UltimateDebtor, p.ultmt_dbtr, None),
        convert(PartyRole::UltimateCreditor, p.ultmt_cdtr, None),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Unstructured address lines when present, otherwise lines composed from
/// the structured address parts.
fn address_lines(adr: de::PostalAddress) -> Vec<String> {
    if !adr.adr_line.is_empty() {
        return adr.adr_line;
    }
    let join = |parts: [Option<String>; 2]| {
        let line = itertools::join(parts.iter().flatten(), " ");
        if line.is_empty() {
            None
        } else {
            Some(line)
        }
    };
    [
        join([adr.strt_nm, adr.bldg_nb]),
        join([adr.pst_cd, adr.twn_nm]),
        adr.ctry,
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn convert_btc(btc: de::BankTransactionCode) -> BankTransactionCode {
    BankTransactionCode {
        domain: btc.domn.map(|d| DomainCode {
            code: d.cd,
            family_code: d.fmly.cd,
            sub_family_code: d.fmly.sub_fmly_cd,
        }),
        proprietary: btc.prtry.map(|p| p.cd),
    }
}

fn parse_credit_debit(s: &str) -> Result<CreditDebit, CamtReadError> {
    match s.trim() {
        "CRDT" => Ok(CreditDebit::Credit),
        "DBIT" => Ok(CreditDebit::Debit),
        other => Err(CamtReadError::BadCreditDebit(other.to_string())),
    }
}

fn signed_money(amt: &de::Amount, cd: CreditDebit) -> Result<Money, CamtReadError> {
    let value = amt.value.trim();
    let decimal = Decimal::from_str(value).map_err(|source| CamtReadError::BadAmount {
        value: value.to_string(),
        source,
    })?;
    let money = Money::from_decimal(decimal, amt.currency.trim())?;
    Ok(match cd {
        CreditDebit::Credit => money,
        CreditDebit::Debit => money.negated(),
    })
}

fn parse_date_choice(choice: &de::DateChoice) -> Result<DateTime<FixedOffset>, CamtReadError> {
    match (&choice.dt_tm, &choice.dt) {
        (Some(dt_tm), _) => parse_date_time(dt_tm),
        (None, Some(dt)) => NaiveDate::parse_from_str(dt.trim(), "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| Utc.fix().from_utc_datetime(&naive))
            .ok_or_else(|| CamtReadError::BadDate(dt.clone())),
        (None, None) => Err(CamtReadError::BadDate(String::new())),
    }
}

/// ISO date times with an offset keep it; those without are taken as UTC.
fn parse_date_time(s: &str) -> Result<DateTime<FixedOffset>, CamtReadError> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| Utc.fix().from_utc_datetime(&naive))
        })
        .ok_or_else(|| CamtReadError::BadDate(s.to_string()))
}

/// Transport structs mirroring the subset of ISO 20022 that is read.
mod de {
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    pub struct Document {
        #[serde(rename = "BkToCstmrStmt")]
        pub statement: Option<Container>,
        #[serde(rename = "BkToCstmrAcctRpt")]
        pub report: Option<Container>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Container {
        pub grp_hdr: GroupHeader,
        #[serde(default)]
        pub stmt: Vec<Statement>,
        #[serde(default)]
        pub rpt: Vec<Statement>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct GroupHeader {
        pub msg_id: String,
        pub cre_dt_tm: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Statement {
        pub id: String,
        pub cre_dt_tm: Option<String>,
        pub acct: CashAccount,
        #[serde(default)]
        pub ntry: Vec<Entry>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct CashAccount {
        pub id: AccountId,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct AccountId {
        #[serde(rename = "IBAN")]
        pub iban: Option<String>,
        pub othr: Option<OtherAccount>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct OtherAccount {
        pub id: String,
        pub schme_nm: Option<SchemeName>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct SchemeName {
        pub cd: Option<String>,
        pub prtry: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Entry {
        pub ntry_ref: Option<String>,
        pub amt: Amount,
        pub cdt_dbt_ind: String,
        pub bookg_dt: Option<DateChoice>,
        pub val_dt: Option<DateChoice>,
        pub acct_svcr_ref: Option<String>,
        pub bk_tx_cd: Option<BankTransactionCode>,
        #[serde(default)]
        pub ntry_dtls: Vec<EntryDetails>,
        pub addtl_ntry_inf: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Amount {
        #[serde(rename = "@Ccy")]
        pub currency: String,
        #[serde(rename = "$text")]
        pub value: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct DateChoice {
        pub dt: Option<String>,
        pub dt_tm: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct BankTransactionCode {
        pub domn: Option<Domain>,
        pub prtry: Option<ProprietaryCode>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Domain {
        pub cd: String,
        pub fmly: Family,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Family {
        pub cd: String,
        pub sub_fmly_cd: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct ProprietaryCode {
        pub cd: String,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct EntryDetails {
        #[serde(default)]
        pub tx_dtls: Vec<TransactionDetails>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct TransactionDetails {
        pub refs: Option<References>,
        pub amt: Option<Amount>,
        pub cdt_dbt_ind: Option<String>,
        pub amt_dtls: Option<AmountDetails>,
        pub bk_tx_cd: Option<BankTransactionCode>,
        pub rltd_pties: Option<RelatedParties>,
        pub rmt_inf: Option<RemittanceInformation>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct References {
        pub acct_svcr_ref: Option<String>,
        pub end_to_end_id: Option<String>,
        pub tx_id: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct AmountDetails {
        pub instd_amt: Option<AmountHolder>,
        pub tx_amt: Option<AmountHolder>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct AmountHolder {
        pub amt: Amount,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct RelatedParties {
        pub dbtr: Option<Party>,
        pub dbtr_acct: Option<CashAccount>,
        pub ultmt_dbtr: Option<Party>,
        pub cdtr: Option<Party>,
        pub cdtr_acct: Option<CashAccount>,
        pub ultmt_cdtr: Option<Party>,
    }

    /// Older schema versions put the name directly in the party, newer ones
    /// wrap it in `Pty`.
    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct Party {
        pub nm: Option<String>,
        pub pstl_adr: Option<PostalAddress>,
        pub pty: Option<PartyIdentification>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct PartyIdentification {
        pub nm: Option<String>,
        pub pstl_adr: Option<PostalAddress>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct PostalAddress {
        pub strt_nm: Option<String>,
        pub bldg_nb: Option<String>,
        pub pst_cd: Option<String>,
        pub twn_nm: Option<String>,
        pub ctry: Option<String>,
        #[serde(default)]
        pub adr_line: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct RemittanceInformation {
        #[serde(default)]
        pub ustrd: Vec<String>,
        #[serde(default)]
        pub strd: Vec<StructuredRemittance>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct StructuredRemittance {
        pub cdtr_ref_inf: Option<CreditorReference>,
        #[serde(default)]
        pub addtl_rmt_inf: Vec<String>,
    }

    #[derive(Debug, Deserialize)]
    #[serde(rename_all = "PascalCase")]
    pub struct CreditorReference {
        pub r#ref: Option<String>,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{detail, entry, message, party, statement};

    const SPLIT_BOOKING: &str = include_str!("../../testdata/camt/split_booking.xml");

    #[test]
    fn reads_statement_graph() {
        let got = parse_message(SPLIT_BOOKING).expect("parse failed");
        let want = message(
            "MSG-1",
            vec![statement(
                "NL00BANK0123456789",
                vec![entry(
                    -10000,
                    vec![
                        detail(-6000, vec![party(PartyRole::Creditor, Some("Acme Corp"), &[])]),
                        detail(4000, vec![party(PartyRole::Debtor, Some("Jane Doe"), &[])]),
                    ],
                )],
            )],
        );
        assert_eq!(want, got);
    }

    #[test]
    fn report_with_details_and_accounts() {
        let xml = textwrap::dedent(
            r#"
            <Document>
              <BkToCstmrAcctRpt>
                <GrpHdr><MsgId>RPT-7</MsgId></GrpHdr>
                <Rpt>
                  <Id>R1</Id>
                  <Acct>
                    <Id>
                      <Othr>
                        <Id>123456789</Id>
                        <SchmeNm><Cd>BBAN</Cd></SchmeNm>
                      </Othr>
                    </Id>
                  </Acct>
                  <Ntry>
                    <NtryRef>REF-1</NtryRef>
                    <Amt Ccy="JPY">1500</Amt>
                    <CdtDbtInd>CRDT</CdtDbtInd>
                    <ValDt><DtTm>2024-03-02T10:15:00</DtTm></ValDt>
                    <AcctSvcrRef>BANKREF</AcctSvcrRef>
                    <BkTxCd>
                      <Domn>
                        <Cd>PMNT</Cd>
                        <Fmly><Cd>RCDT</Cd><SubFmlyCd>ESCT</SubFmlyCd></Fmly>
                      </Domn>
                    </BkTxCd>
                    <NtryDtls>
                      <TxDtls>
                        <Refs>
                          <AcctSvcrRef>TXREF</AcctSvcrRef>
                          <EndToEndId>E2E-1</EndToEndId>
                        </Refs>
                        <AmtDtls><TxAmt><Amt Ccy="JPY">1500</Amt></TxAmt></AmtDtls>
                        <RltdPties>
                          <Dbtr>
                            <Nm>Jane Doe</Nm>
                            <PstlAdr>
                              <StrtNm>Elm St</StrtNm>
                              <BldgNb>2</BldgNb>
                              <TwnNm>Utrecht</TwnNm>
                            </PstlAdr>
                          </Dbtr>
                          <DbtrAcct><Id><IBAN>DE89370400440532013000</IBAN></Id></DbtrAcct>
                        </RltdPties>
                        <RmtInf>
                          <Ustrd>Invoice 12</Ustrd>
                          <Ustrd>and 13</Ustrd>
                          <Strd>
                            <CdtrRefInf><Ref>RF18539007547034</Ref></CdtrRefInf>
                          </Strd>
                        </RmtInf>
                      </TxDtls>
                    </NtryDtls>
                    <AddtlNtryInf>SEPA credit</AddtlNtryInf>
                  </Ntry>
                </Rpt>
              </BkToCstmrAcctRpt>
            </Document>
            "#,
        );
        let msg = parse_message(xml.trim()).expect("parse failed");
        assert_eq!("RPT-7", msg.id);
        assert_eq!(None, msg.created_on);

        let stmt = &msg.statements[0];
        assert_eq!(Account::other(AccountScheme::Bban, "123456789"), stmt.account);

        let e = &stmt.entries[0];
        assert_eq!(Money::new(1500, "JPY"), e.amount);
        assert_eq!(Some("REF-1"), e.reference.as_deref());
        assert_eq!(Some("BANKREF"), e.account_servicer_reference.as_deref());
        assert_eq!(Some("SEPA credit"), e.additional_info.as_deref());
        assert_eq!(None, e.booking_date);
        assert_eq!(
            "2024-03-02T10:15:00+00:00",
            e.value_date.map(|d| d.to_rfc3339()).unwrap_or_default()
        );
        let domain = e
            .bank_transaction_code
            .as_ref()
            .and_then(|b| b.domain.as_ref())
            .expect("domain code");
        assert_eq!("ESCT", domain.sub_family_code);

        let d = &e.details[0];
        assert_eq!(None, d.amount);
        assert_eq!(None, d.credit_debit);
        assert_eq!(Some(Money::new(1500, "JPY")), d.amount_details);
        assert_eq!(Some("E2E-1"), d.reference.as_deref());
        assert_eq!(Some("TXREF"), d.account_servicer_reference.as_deref());
        let remittance = d.remittance.as_ref().expect("remittance");
        assert_eq!(vec!["Invoice 12", "and 13"], remittance.unstructured);
        assert_eq!(
            Some("RF18539007547034"),
            remittance.structured[0].creditor_reference.as_deref()
        );
        let debtor = &d.related_parties[0];
        assert_eq!(PartyRole::Debtor, debtor.role);
        assert_eq!(vec!["Elm St 2", "Utrecht"], debtor.address_lines);
        assert_eq!(Some(Account::iban("DE89370400440532013000")), debtor.account);
    }

    #[test]
    fn nested_party_identification() {
        let xml = SPLIT_BOOKING.replace(
            "<Cdtr><Nm>Acme Corp</Nm></Cdtr>",
            "<Cdtr><Pty><Nm>Acme Corp</Nm><PstlAdr><AdrLine>Main St 1</AdrLine></PstlAdr></Pty></Cdtr>",
        );
        let msg = parse_message(&xml).expect("parse failed");
        let creditor = &msg.statements[0].entries[0].details[0].related_parties[0];
        assert_eq!(Some("Acme Corp"), creditor.name.as_deref());
        assert_eq!(vec!["Main St 1"], creditor.address_lines);
    }

    #[test]
    fn rejects_unknown_indicator() {
        let xml = SPLIT_BOOKING.replacen("<CdtDbtInd>DBIT</CdtDbtInd>", "<CdtDbtInd>XXXX</CdtDbtInd>", 1);
        match parse_message(&xml) {
            Err(CamtReadError::BadCreditDebit(s)) => assert_eq!("XXXX", s),
            other => panic!("got {:?}, want BadCreditDebit", other),
        }
    }

    #[test]
    fn rejects_over_precise_amount() {
        let xml = SPLIT_BOOKING.replacen("100.00", "100.001", 1);
        assert!(matches!(
            parse_message(&xml),
            Err(CamtReadError::Money(MoneyError::Precision { .. }))
        ));
    }

    #[test]
    fn rejects_other_documents() {
        let xml = "<Document><BkToCstmrDbtCdtNtfctn/></Document>";
        assert!(matches!(
            parse_message(xml),
            Err(CamtReadError::UnsupportedDocument)
        ));
    }
}
