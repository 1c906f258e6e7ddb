#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(line) = std::str::from_utf8(data) {
        // Any line either parses, is skipped, or is a grammar error
        let _ = dtswatch::parse_declaration(line);
        let _ = dtswatch::parse_declaration(&format!("export declare function {line}"));
    }
});
