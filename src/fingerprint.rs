use base64::display::Base64Display;
use base64::engine::general_purpose::STANDARD_NO_PAD;
use byteorder::{BigEndian, ByteOrder};
use sha1::{Digest, Sha1};

use crate::ledger::{LedgerEntry, Split, TransactionType};

pub trait Fingerprintable {
    fn fingerprint(&self, fpb: FingerprintBuilder) -> FingerprintBuilder;
}

/// Builds a fingerprint based on length-prefixed values.
#[derive(Debug, Clone)]
pub struct FingerprintBuilder {
    acc: Accumulator,
}

impl FingerprintBuilder {
    pub fn new() -> Self {
        Self {
            acc: Accumulator::new(),
        }
    }

    pub fn build(self) -> String {
        self.build_with_prefix("")
    }

    pub fn build_with_prefix(self, prefix: &str) -> String {
        self.acc.build_with_prefix(prefix)
    }

    pub fn with_fingerprintable<T>(self, v: &T) -> Self
    where
        T: Fingerprintable,
    {
        v.fingerprint(self)
    }

    pub fn with_str(self, v: &str) -> Self {
        self.acc
            .with_usize(v.len())
            .with_str(v)
            .as_fingerprint_builder()
    }

    /// Absent values are distinct from empty ones.
    pub fn with_opt_str(self, v: Option<&str>) -> Self {
        match v {
            None => self.acc.with_u8(0).as_fingerprint_builder(),
            Some(v) => self.acc.with_u8(1).as_fingerprint_builder().with_str(v),
        }
    }

    pub fn with_opt_u64(self, v: Option<u64>) -> Self {
        match v {
            None => self.acc.with_u8(0),
            Some(v) => self.acc.with_u8(1).with_usize(8).with_u64(v),
        }
        .as_fingerprint_builder()
    }
}

impl Fingerprintable for Split {
    fn fingerprint(&self, fpb: FingerprintBuilder) -> FingerprintBuilder {
        fpb.with_str(match self.type_ {
            TransactionType::Withdrawal => "withdrawal",
            TransactionType::Deposit => "deposit",
        })
        .with_str(&self.date)
        .with_str(&self.amount)
        .with_str(&self.currency_code)
        .with_opt_str(self.foreign_amount.as_deref())
        .with_str(&self.description)
        .with_opt_u64(self.source_id)
        .with_opt_str(self.source_name.as_deref())
        .with_opt_str(self.source_iban.as_deref())
        .with_opt_str(self.source_number.as_deref())
        .with_opt_u64(self.destination_id)
        .with_opt_str(self.destination_name.as_deref())
        .with_opt_str(self.destination_iban.as_deref())
        .with_opt_str(self.destination_number.as_deref())
    }
}

impl Fingerprintable for LedgerEntry {
    fn fingerprint(&self, fpb: FingerprintBuilder) -> FingerprintBuilder {
        self.transactions
            .iter()
            .fold(fpb.with_opt_str(self.group_title.as_deref()), |fpb, split| {
                fpb.with_fingerprintable(split)
            })
    }
}

/// Builds parts of a fingerprint based on raw values.
///
/// This does *not* write length prefixes, unlike `FingerprintBuilder`, but is
/// used *by* `FingerprintBuilder`.
#[derive(Debug, Clone)]
struct Accumulator {
    hasher: Sha1,
}

impl Accumulator {
    fn new() -> Self {
        Self {
            hasher: Sha1::new(),
        }
    }

    fn build_with_prefix(self, prefix: &str) -> String {
        let digest = self.hasher.finalize();
        format!("{}{}", prefix, Base64Display::new(&digest, &STANDARD_NO_PAD))
    }

    fn as_fingerprint_builder(self) -> FingerprintBuilder {
        FingerprintBuilder { acc: self }
    }

    fn with_bytes(mut self, v: &[u8]) -> Self {
        self.hasher.update(v);
        self
    }

    fn with_str(self, v: &str) -> Self {
        self.with_bytes(v.as_bytes())
    }

    fn with_u8(self, v: u8) -> Self {
        let buf: [u8; 1] = [v];
        self.with_bytes(&buf)
    }

    fn with_u64(self, v: u64) -> Self {
        let mut buf: [u8; 8] = Default::default();
        BigEndian::write_u64(&mut buf, v);
        self.with_bytes(&buf)
    }

    fn with_usize(self, v: usize) -> Self {
        self.with_u64(v as u64)
    }
}
