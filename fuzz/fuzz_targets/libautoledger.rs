#![no_main]
use libfuzzer_sys::fuzz_target;

use libautoledger::{extract_transactions, parse_document};

fuzz_target!(|data: &[u8]| {
    if let Ok(journal) = std::str::from_utf8(data) {
        if let Ok(document) = parse_document(journal) {
            let ledger = extract_transactions(&document);
            let _ = ledger.derive(ledger.automatic_transactions());
        }
    }
});
