#![no_main]
use imgdescr::xml::{from_str, to_pretty_string};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(doc) = from_str(s) {
            // Whatever parses must survive a serialize/parse cycle
            let out = to_pretty_string(&doc.root);
            assert!(from_str(&out).is_ok(), "unparseable output:\n{out}");
        }
    }
});
