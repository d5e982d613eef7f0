#![no_main]

//! Fuzz target for introspection snapshot parsing and drift detection.

use agencydb_contract::{detect_drift, drift_report};
use agencydb_types::report::ReportToolInfo;
use agencydb_types::snapshot::SchemaSnapshot;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(snapshot) = serde_json::from_str::<SchemaSnapshot>(s) else {
        return;
    };

    let drift = detect_drift(&snapshot);
    let report = drift_report(
        &drift,
        &[],
        ReportToolInfo {
            name: "agencydb-fuzz".to_string(),
            version: "0.0.0".to_string(),
        },
        None,
    );
    assert_eq!(report.findings.len(), drift.len());
    let _ = serde_json::to_string(&report);
});
