#![no_main]

use libfuzzer_sys::fuzz_target;
use postbox_protocol::record::EncryptedRecord;

fuzz_target!(|data: &[u8]| {
    // Slots may hold arbitrary foreign bytes; decoding must never panic.
    if let Ok(record) = EncryptedRecord::decode(data) {
        if let Ok(encoded) = record.encode() {
            let reparsed = EncryptedRecord::decode(&encoded);
            assert_eq!(reparsed.ok(), Some(record));
        }
    }
});
