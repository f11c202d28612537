#![no_main]

use libfuzzer_sys::fuzz_target;
use tgate_types::ColumnSpec;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(records) = tgate_ingest::parse_benchmark_csv(s, &ColumnSpec::default()) {
            // Row numbers are dense and 1-based.
            for (i, r) in records.iter().enumerate() {
                assert_eq!(r.row, i + 1);
            }
        }
    }
});
