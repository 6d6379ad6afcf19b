#![allow(dead_code)]

use std::sync::Once;

use chrono::{DateTime, TimeZone, Utc};
use journy::models::Trip;
use tracing_subscriber::EnvFilter;

static INIT: Once = Once::new();

/// Log to the test output, filtered by `RUST_LOG`
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_test_writer()
            .init();
    });
}

pub fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
}

pub fn paris_trip() -> Trip {
    Trip::new("Paris", "Paris, France", at(2024, 5, 1, 0), at(2024, 5, 5, 0))
}
