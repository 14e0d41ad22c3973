#![no_main]

use std::sync::Arc;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use evtb_client::{ManualClock, MemoryStore, TokenManager};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let manager = TokenManager::new(Arc::new(MemoryStore::new()))
        .with_clock(Arc::new(ManualClock::at_timestamp(1_700_000_000)));

    // Raw input as a whole token
    if let Ok(s) = std::str::from_utf8(data) {
        let _ = evtb_client::decode_claims(s);
        let expired = manager.is_token_expired(s);
        let soon = manager.is_token_expiring_soon(s);
        // Expired implies expiring soon
        assert!(!expired || soon);
    }

    // Input as a well-formed token's payload segment
    let token = format!("e30.{}.sig", URL_SAFE_NO_PAD.encode(data));
    match evtb_client::decode_claims(&token) {
        Some(claims) => {
            assert!(serde_json::from_slice::<serde_json::Value>(data)
                .map(|v| v.is_object())
                .unwrap_or(false));
            let _ = claims.subject();
            let _ = claims.roles();
            let _ = claims.expires_at();
        }
        None => {
            // Undecodable payloads are never treated as expired
            assert!(!manager.is_token_expired(&token));
        }
    }
});
