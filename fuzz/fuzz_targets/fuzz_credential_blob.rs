#![no_main]

use std::sync::Arc;

use evtb_client::{CredentialStore, MemoryStore, TokenManager, DEFAULT_STORAGE_KEY};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        let store = Arc::new(MemoryStore::new());
        store.set(DEFAULT_STORAGE_KEY, s).unwrap();

        // Corrupt blobs read as signed out, never panic
        let manager = TokenManager::new(store);
        if let Some(credential) = manager.get_credential() {
            assert_eq!(manager.get_token(), Some(credential.token.clone()));
        } else {
            assert_eq!(manager.get_token(), None);
        }
    }
});
