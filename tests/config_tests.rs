use std::fs;

use refcheck::{load_config, ConfigError, ContextPolicy, FamilySpec, ScanConfig, ScanError, Scanner, Variant};

#[test]
fn default_config_is_valid() {
    let config = ScanConfig::default();
    config.validate().unwrap();
    assert_eq!(config.variant, Variant::DecreeAware);
    assert_eq!(config.families().len(), 20);
    assert_eq!(ScanConfig::legacy().families().len(), 14);
    assert!(ScanConfig::legacy().families().iter().all(|f| f.class == ContextPolicy::Standard));
}

#[test]
fn loads_yaml_with_defaults_for_missing_keys() {
    let td = tempfile::tempdir().unwrap();
    let path = td.path().join("refcheck.yaml");
    fs::write(
        &path,
        "variant: legacy\nwindows:\n  forward: 40\nregistry:\n  path: TCKT.csv\n  shape: 5\nworkers: 2\n",
    )
    .unwrap();

    let config = load_config(&path).unwrap();
    assert_eq!(config.variant, Variant::Legacy);
    assert_eq!(config.windows.forward, 40);
    assert_eq!(config.windows.fallback, 24);
    assert_eq!(config.registry.shape, 5);
    assert_eq!(config.registry.key_column, 1);
    assert_eq!(config.workers, Some(2));
    assert_eq!(config.expired_marker, "Hết hiệu lực");
    assert_eq!(config.rewrite_tokens, vec!["TCVN".to_string(), "QCVN".to_string()]);
}

#[test]
fn invalid_values_are_rejected() {
    let mut config = ScanConfig::default();
    config.registry.shape = 4;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let mut config = ScanConfig::default();
    config.windows.fallback = 60;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config = ScanConfig { workers: Some(0), ..ScanConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

    let config = ScanConfig { families: Some(Vec::new()), ..ScanConfig::default() };
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn unreadable_or_malformed_files() {
    let td = tempfile::tempdir().unwrap();
    assert!(matches!(load_config(&td.path().join("missing.yaml")), Err(ConfigError::Read(_))));

    let bad = td.path().join("bad.yaml");
    fs::write(&bad, "variant: [unterminated\n").unwrap();
    assert!(matches!(load_config(&bad), Err(ConfigError::Parse(_))));

    let invalid = td.path().join("invalid.yaml");
    fs::write(&invalid, "registry:\n  shape: 7\n").unwrap();
    assert!(matches!(load_config(&invalid), Err(ConfigError::Invalid(_))));
}

#[test]
fn custom_family_with_bad_regex_fails_scanner_build() {
    let config = ScanConfig {
        families: Some(vec![FamilySpec {
            name: "iso".into(),
            pattern: r"ISO\s*(\d+".into(),
            token: "ISO".into(),
            case_insensitive: false,
            class: ContextPolicy::Standard,
        }]),
        ..ScanConfig::default()
    };
    match Scanner::new(&config) {
        Err(ScanError::Config(ConfigError::Pattern { family, .. })) => assert_eq!(family, "iso"),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("bad pattern accepted"),
    }
}

#[test]
fn custom_family_table_replaces_builtin() {
    let config = ScanConfig {
        families: Some(vec![FamilySpec {
            name: "iso".into(),
            pattern: r"ISO\s*\d+(?::\d+)?".into(),
            token: "ISO".into(),
            case_insensitive: false,
            class: ContextPolicy::Standard,
        }]),
        ..ScanConfig::default()
    };
    let scanner = Scanner::new(&config).unwrap();
    assert_eq!(scanner.table().tokens(), vec!["ISO".to_string()]);
}
