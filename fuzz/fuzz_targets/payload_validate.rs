#![no_main]

//! Fuzz target for boundary validation.
//!
//! Any JSON value is checked against every table shape. A payload accepted by the
//! structural validator must also decode into the typed shape.

use agencydb_contract::{decode_insert, decode_row, decode_update, registry, validate};
use agencydb_types::Shape;
use agencydb_types::tables::{Subscriptions, Tickets, Users};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(payload) = serde_json::from_str::<serde_json::Value>(s) else {
        return;
    };

    for table in registry::tables() {
        for shape in Shape::ALL {
            let _ = validate(table, shape, &payload);
        }
    }

    // Tables covering timestamps, enums and tri-state nullable updates.
    for result in [
        decode_row::<Tickets>(payload.clone()).map(|_| ()),
        decode_insert::<Tickets>(payload.clone()).map(|_| ()),
        decode_update::<Tickets>(payload.clone()).map(|_| ()),
        decode_insert::<Users>(payload.clone()).map(|_| ()),
        decode_update::<Subscriptions>(payload.clone()).map(|_| ()),
    ] {
        if let Err(e) = result {
            assert!(e.is_mismatch(), "validated payload failed to decode: {e}");
        }
    }
});
