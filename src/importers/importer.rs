use anyhow::Result;

use crate::config::Configuration;
use crate::pseudo::PseudoTransaction;
use crate::report::ImportReport;

pub trait TransactionImporter {
    /// Reads the source and converts it into pseudo-transactions. Failures
    /// confined to one transaction go to `report`; only failures to read the
    /// source at all are returned.
    fn get_transactions(
        &self,
        config: &Configuration,
        report: &mut ImportReport,
    ) -> Result<Vec<PseudoTransaction>>;
}
