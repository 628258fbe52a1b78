#![no_main]

use formspool::{decode_with_config, SpoolConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let config = SpoolConfig::new().memory_threshold(256);

    if let Ok(parts) = decode_with_config(data, "X-BOUNDARY", config) {
        for part in parts {
            let len = part.len();
            let bytes = part.bytes().expect("sealed part is readable");
            assert_eq!(bytes.len() as u64, len);
        }
    }
});
