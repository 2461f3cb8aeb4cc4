// Copyright (c) 2026 Amunchain
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;
use stakeledger::core::types::{AccountId, Amount, PoolId, TxId};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(tx) = TxId::parse(s) {
            assert_eq!(tx.as_str().len(), 64);
        }
        let _ = AccountId::parse(s);
        let _ = PoolId::parse(s);
        // Display must re-parse to the same amount.
        if let Ok(a) = s.parse::<Amount>() {
            assert_eq!(a.to_string().parse::<Amount>().ok(), Some(a));
        }
    }
});
