#![no_main]

//! Fuzz target for generate_history arguments
//!
//! Arbitrary JSON must produce either a response or a client error, never a
//! panic. Accepted ranges are bounded so a single input stays cheap.

use chrono::Utc;
use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};

use timewarp_git::MemoryDriver;
use timewarp_mcp::handlers::{GenerateInput, handle_generate_history};

/// Longest range worth synthesizing per input
const MAX_DAYS: i64 = 400;

fuzz_target!(|data: &[u8]| {
    let Ok(args) = serde_json::from_slice::<Map<String, Value>>(data) else {
        return;
    };

    let Ok(input) = serde_json::from_value::<GenerateInput>(Value::Object(args.clone())) else {
        return;
    };
    if let Ok(request) = input.validate(&Utc) {
        let span = request.end_date.calendar_day(&Utc) - request.start_date.calendar_day(&Utc);
        if span.num_days() > MAX_DAYS {
            return;
        }
    }

    let mut driver = MemoryDriver::new();
    let result = handle_generate_history(&mut driver, StdRng::seed_from_u64(0), &Utc, Some(args));
    if let Err(err) = result {
        assert_eq!(err.status_code(), 400);
    }
});
