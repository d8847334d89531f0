// Integration tests for trap descriptor loading
use netmeta::registry::RegistryLoader;
use netmeta::NetmetaError;
use std::fs;
use tempfile::TempDir;

const LINK_TRAPS: &str = r#"
from: IF-MIB
traps:
  - trap_oid: 1.3.6.1.6.3.1.1.5.3
    trap_name: linkDown
    drop_undefined: true
    events:
      - OID: 1.3.6.1.2.1.2.2.1.1
        name: ifIndex
      - OID: 1.3.6.1.2.1.2.2.1.7
        name: ifAdminStatus
        tag: admin
        enum:
          Up: 1
          Down: 2
          Testing: 3
  - trap_oid: .1.3.6.1.6.3.1.1.5.4
    trap_name: linkUp
    events:
      - OID: 1.3.6.1.2.1.2.2.1.1
        name: ifIndex
"#;

const VENDOR_TRAPS: &str = r#"
traps:
  - trap_oid: 1.3.6.1.4.1.9.9.41.2.0.1
    trap_name: clogMessageGenerated
    events:
      - OID: 1.3.6.1.4.1.9.9.41.1.2.3.1.2
        name: clogHistFacility
        conversion: to_string
"#;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[test]
fn test_load_file_and_query() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "if-mib.yml", LINK_TRAPS);

    let mut loader = RegistryLoader::new();
    let summary = loader.load(&path).unwrap();
    assert_eq!(summary.source, "IF-MIB");
    assert_eq!(summary.traps, 2);
    assert_eq!(summary.variables, 3);

    let registry = loader.finish();
    assert_eq!(registry.trap_count(), 2);
    // ifIndex is declared under both traps and stored once
    assert_eq!(registry.variable_count(), 2);

    let trap = registry.trap("1.3.6.1.6.3.1.1.5.3").unwrap();
    assert_eq!(trap.name, "linkDown");
    assert_eq!(trap.events.len(), 2);
    assert!(registry.drop_undefined_vars(".1.3.6.1.6.3.1.1.5.3"));
    assert!(!registry.drop_undefined_vars("1.3.6.1.6.3.1.1.5.4"));
    assert!(!registry.drop_undefined_vars("1.3.6.1.6.3.1.1.5.99"));

    let admin = registry.variable(".1.3.6.1.2.1.2.2.1.7").unwrap();
    assert_eq!(admin.name, "ifAdminStatus");
    assert_eq!(admin.tag, "admin");
    assert_eq!(admin.trap_name, "linkDown");
    assert_eq!(admin.enum_value("Down"), Some(2));
    assert_eq!(admin.enum_value("down"), Some(2));
    assert_eq!(admin.enum_value("DOWN"), Some(2));
    assert_eq!(admin.enum_label(3), Some("Testing"));
}

#[test]
fn test_oid_lookup_ignores_leading_dot() {
    let mut loader = RegistryLoader::new();
    loader.load_str("inline", LINK_TRAPS).unwrap();
    let registry = loader.finish();

    for oid in ["1.3.6.1.6.3.1.1.5.4", ".1.3.6.1.6.3.1.1.5.4"] {
        assert_eq!(registry.trap(oid).unwrap().name, "linkUp");
    }
    assert_eq!(registry.traps().count(), 2);
    assert!(registry.trap("1.3.6.1.6.3.1.1.5.5").is_none());
}

#[test]
fn test_source_defaults_to_file_name() {
    let temp = TempDir::new().unwrap();
    let path = write(&temp, "cisco.yaml", VENDOR_TRAPS);

    let mut loader = RegistryLoader::new();
    let summary = loader.load(&path).unwrap();
    assert_eq!(summary.source, "cisco.yaml");

    let registry = loader.finish();
    let entry = registry.variable("1.3.6.1.4.1.9.9.41.1.2.3.1.2").unwrap();
    assert_eq!(entry.conversion, "to_string");
    assert!(!entry.has_enum());
}

#[test]
fn test_malformed_file_leaves_registry_untouched() {
    let temp = TempDir::new().unwrap();
    let good = write(&temp, "a.yml", VENDOR_TRAPS);
    // second trap's events is not a list
    let bad = write(
        &temp,
        "b.yml",
        r#"
traps:
  - trap_oid: 1.3.6.1.4.1.2.0.1
    trap_name: first
  - trap_oid: 1.3.6.1.4.1.2.0.2
    trap_name: second
    events: 5
"#,
    );

    let mut loader = RegistryLoader::new();
    loader.load(&good).unwrap();
    let err = loader.load(&bad).unwrap_err();
    assert!(matches!(err, NetmetaError::Descriptor { .. }));

    let registry = loader.finish();
    assert_eq!(registry.trap_count(), 1);
    assert!(registry.trap("1.3.6.1.4.1.2.0.1").is_none());
}

#[test]
fn test_missing_file_is_io_error() {
    let temp = TempDir::new().unwrap();
    let mut loader = RegistryLoader::new();
    let err = loader.load(&temp.path().join("absent.yml")).unwrap_err();
    assert!(matches!(err, NetmetaError::Io { .. }));
    assert!(loader.registry().is_empty());
}

#[test]
fn test_later_file_overwrites_same_oid() {
    let temp = TempDir::new().unwrap();
    write(&temp, "01-base.yml", LINK_TRAPS);
    write(
        &temp,
        "02-override.yml",
        r#"
traps:
  - trap_oid: 1.3.6.1.6.3.1.1.5.3
    trap_name: linkDownOverride
"#,
    );

    let mut loader = RegistryLoader::new();
    let report = loader.load_dir(temp.path()).unwrap();
    assert!(report.is_clean());
    assert_eq!(report.loaded.len(), 2);

    let registry = loader.finish();
    let trap = registry.trap("1.3.6.1.6.3.1.1.5.3").unwrap();
    assert_eq!(trap.name, "linkDownOverride");
    assert!(!trap.drop_undefined_vars());
    // variables merged by the first file survive
    assert!(registry.variable("1.3.6.1.2.1.2.2.1.7").is_some());
}

#[test]
fn test_load_dir_skips_bad_and_foreign_files() {
    let temp = TempDir::new().unwrap();
    write(&temp, "a.yml", VENDOR_TRAPS);
    write(&temp, "b.yml", "traps: [this is: not valid");
    write(&temp, "c.yaml", LINK_TRAPS);
    write(&temp, "notes.txt", "ignored");

    let mut loader = RegistryLoader::new();
    let report = loader.load_dir(temp.path()).unwrap();

    assert!(!report.is_clean());
    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].0.ends_with("b.yml"));
    let sources: Vec<_> = report.loaded.iter().map(|s| s.source.as_str()).collect();
    assert_eq!(sources, vec!["a.yml", "IF-MIB"]);

    assert_eq!(loader.finish().trap_count(), 3);
}
