//! End-to-end pipeline checks: a file arriving in a receive directory is
//! archived, staged for transmit, and removed from receive, all through the
//! monitor's event handler.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use notify::event::{AccessKind, AccessMode, CreateKind};
use notify::EventKind;

use vigil::config::{Config, DataKind, StreamConfig};
use vigil::monitor::{EventOutcome, Monitor};

fn close_write() -> EventKind {
    EventKind::Access(AccessKind::Close(AccessMode::Write))
}

fn node_config(root: &Path) -> Config {
    Config {
        data_root: root.to_path_buf(),
        streams: vec![
            StreamConfig {
                name: "soil".into(),
                kind: DataKind::Gas,
                soh: false,
            },
            StreamConfig {
                name: "gnss-a".into(),
                kind: DataKind::Gnss,
                soh: false,
            },
            StreamConfig {
                name: "seismic-a".into(),
                kind: DataKind::Seismic,
                soh: true,
            },
        ],
        telemetry: None,
        relay: None,
        gnss_site_lookup: HashMap::from([("10".to_string(), "STA1".to_string())]),
        instruments: Default::default(),
    }
}

#[test]
fn monitor_creates_the_watched_layout() {
    let dir = tempfile::tempdir().unwrap();
    Monitor::new(node_config(dir.path())).unwrap();

    for expected in [
        "soil/receive",
        "soil/transmit",
        "gnss-a/receive",
        "seismic-a/SOH/receive",
        "seismic-a/SOH/transmit",
    ] {
        assert!(dir.path().join(expected).is_dir(), "missing {expected}");
    }
}

#[test]
fn receive_arrival_is_archived_staged_and_removed() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = Monitor::new(node_config(dir.path())).unwrap();

    let source = dir.path().join("soil/receive/STA1.2023.165.0600.CO2.csv");
    fs::write(&source, "time,co2_ppm\n2023-165T06:00:00,412\n").unwrap();

    let outcome = monitor.handle_event(&source, &close_write());
    assert!(matches!(outcome, EventOutcome::Migrated { .. }));

    let archived = dir
        .path()
        .join("soil/ARCHIVE/2023/STA1/STA1.2023.165.CO2.csv");
    assert_eq!(
        fs::read_to_string(&archived).unwrap(),
        "time,co2_ppm\n2023-165T06:00:00,412\n"
    );
    assert!(dir
        .path()
        .join("soil/transmit/STA1.2023.165.0600.CO2.csv")
        .is_file());
    assert!(!source.exists(), "receive source should be cleaned up");
}

#[test]
fn gnss_arrival_lands_in_the_raw_tree() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = Monitor::new(node_config(dir.path())).unwrap();

    let source = dir.path().join("gnss-a/receive/0A10N6E9.sbf");
    fs::write(&source, b"sbf-bytes").unwrap();

    let outcome = monitor.handle_event(&source, &close_write());
    assert!(matches!(outcome, EventOutcome::Migrated { .. }));

    let archived = dir
        .path()
        .join("gnss-a/ARCHIVE/raw/2023/165/STA1/STA100US_R_20231650900_01D_30S_MO.sbf");
    assert_eq!(fs::read(&archived).unwrap(), b"sbf-bytes");
}

#[test]
fn unrecognized_formats_are_left_in_place() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = Monitor::new(node_config(dir.path())).unwrap();

    let source = dir.path().join("soil/receive/notes.txt");
    fs::write(&source, b"field notes").unwrap();

    let outcome = monitor.handle_event(&source, &close_write());
    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert!(source.exists());
}

#[test]
fn hidden_and_non_arrival_events_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = Monitor::new(node_config(dir.path())).unwrap();

    let hidden = dir.path().join("soil/receive/.partial.csv");
    fs::write(&hidden, b"x").unwrap();
    assert!(matches!(
        monitor.handle_event(&hidden, &close_write()),
        EventOutcome::Skipped(_)
    ));
    assert!(hidden.exists());

    let source = dir.path().join("soil/receive/STA1.2023.165.0600.CO2.csv");
    fs::write(&source, "h\nd\n").unwrap();
    assert!(matches!(
        monitor.handle_event(&source, &EventKind::Create(CreateKind::File)),
        EventOutcome::Skipped(_)
    ));
    assert!(source.exists());
}

#[test]
fn transmit_arrival_without_telemetry_config_stays_staged() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = Monitor::new(node_config(dir.path())).unwrap();

    let staged = dir.path().join("soil/transmit/STA1.2023.165.0600.CO2.csv");
    fs::write(&staged, "h\nd\n").unwrap();

    let outcome = monitor.handle_event(&staged, &close_write());
    assert!(matches!(outcome, EventOutcome::Skipped(_)));
    assert!(staged.exists());
}

#[test]
fn soh_arrival_archives_under_the_stream_and_stages_in_soh_transmit() {
    let dir = tempfile::tempdir().unwrap();
    let monitor = Monitor::new(node_config(dir.path())).unwrap();

    // 48-byte fixed header: sequence, quality 'D', space, then padding.
    let mut record = Vec::new();
    record.extend_from_slice(b"000001D ");
    record.resize(48, b' ');
    record.extend_from_slice(b"payload");

    let source = dir
        .path()
        .join("seismic-a/SOH/receive/AV.STA2..VEC.D.2023.165.m");
    fs::write(&source, &record).unwrap();

    let outcome = monitor.handle_event(&source, &close_write());
    assert!(matches!(outcome, EventOutcome::Migrated { .. }));

    let archived = dir
        .path()
        .join("seismic-a/ARCHIVE/2023/AV/STA2/VEC.D/AV.STA2..VEC.D.2023.165");
    assert!(archived.is_file());
    assert!(dir
        .path()
        .join("seismic-a/SOH/transmit/AV.STA2..VEC.D.2023.165.m")
        .is_file());
    assert!(!source.exists());
}
