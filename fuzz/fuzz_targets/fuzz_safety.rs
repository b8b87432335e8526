#![no_main]

use deepwalker::services::safety::{describe, scan_content};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let matches = scan_content(data);
    let _ = describe(&matches);
});
