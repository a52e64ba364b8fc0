#![no_main]

//! Fuzz target for date and intensity parsing
//!
//! Arbitrary strings must never panic the validators, and anything accepted
//! must resolve to an instant in a concrete zone.

use chrono::Utc;
use libfuzzer_sys::fuzz_target;

use timewarp_mcp::validation::{is_valid_date, is_valid_intensity, parse_date, Intensity};

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Some(date) = parse_date(s) {
            assert!(is_valid_date(s));
            let _ = date.in_zone(&Utc);
            let _ = date.calendar_day(&Utc);
        }

        if let Some(intensity) = Intensity::parse(s) {
            assert!(is_valid_intensity(s));
            assert!((0.0..=1.0).contains(&intensity.value()));
        }
    }
});
