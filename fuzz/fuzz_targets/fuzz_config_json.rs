#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        // Fuzz config parsing - this should never panic
        if let Ok(config) = dtswatch::Config::from_json(content) {
            let _ = dtswatch::Config::from_json(&config.to_json());
        }
    }
});
