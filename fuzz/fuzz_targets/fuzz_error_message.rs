#![no_main]

use evtb_client::messages;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let status = u16::from_be_bytes([data[0], data[1]]);

    if let Ok(body) = serde_json::from_slice::<serde_json::Value>(&data[2..]) {
        // Always produces something to show the user
        let message = messages::message_for(status, &body);
        assert!(!message.is_empty());
    }
});
