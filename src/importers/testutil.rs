use std::io::Write;

use goldenfile::Mint;

use crate::ledger::LedgerEntry;
use crate::testutil::format_json;

pub fn golden_test(entries: &[LedgerEntry], golden_path: &str) {
    let mut mint = Mint::new("testdata/golden");
    let differ = Box::new(goldenfile::differs::text_diff);
    let mut out = mint
        .new_goldenfile_with_differ(golden_path, differ)
        .expect("new goldenfile");

    out.write_all(format_json(&entries).as_bytes())
        .expect("write output");
}
