// Copyright (c) 2026 Amunchain
// Licensed under the Apache-2.0 License.

#![no_main]
#![forbid(unsafe_code)]

use libfuzzer_sys::fuzz_target;
use stakeledger::core::economics::pool::Pool;
use stakeledger::core::economics::stake::StakePosition;
use stakeledger::core::state::persistent_state::TxUse;
use stakeledger::core::types::{decode_canonical_limited, MAX_RECORD_BYTES};

fuzz_target!(|data: &[u8]| {
    // Stored records are untrusted on read; decoding must fail cleanly.
    let _ = decode_canonical_limited::<Pool>(data, MAX_RECORD_BYTES);
    let _ = decode_canonical_limited::<StakePosition>(data, MAX_RECORD_BYTES);
    let _ = decode_canonical_limited::<TxUse>(data, MAX_RECORD_BYTES);
});
