use std::path::PathBuf;

use tgveil_core::load_from_path;

#[test]
fn missing_config_file_falls_back_to_defaults() {
    let cfg = load_from_path("/nonexistent/path/tgveil.toml").expect("defaults must load");
    assert_eq!(cfg.capture.tcp_ports, vec![443, 80, 8080, 8443]);
    assert!(cfg.fragmentation.adaptive);
}

#[test]
fn present_and_well_formed_file_overrides_defaults() {
    let path = tempfile_with_contents(
        r#"
        [capture]
        tcp_ports = [443]
        udp_ports = []

        [fragmentation]
        adaptive = false
        fragment_size = 4
        delay_ms = 7.5

        [targets]
        prefixes = ["203.0.113."]

        [ip_refresh]
        enabled = false
        "#,
    );
    let cfg = load_from_path(&path).expect("valid config must load");
    assert_eq!(cfg.capture.tcp_ports, vec![443]);
    assert!(cfg.capture.udp_ports.is_empty());
    assert!(!cfg.fragmentation.adaptive);
    assert_eq!(cfg.fragmentation.fragment_size, 4);
    assert_eq!(cfg.targets.prefixes, vec!["203.0.113.".to_string()]);
    assert!(!cfg.ip_refresh.enabled);

    let _ = std::fs::remove_file(&path);
}

#[test]
fn malformed_toml_is_rejected() {
    let path = tempfile_with_contents("this is not valid toml {{{");
    let err = load_from_path(&path);
    assert!(err.is_err());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn internally_inconsistent_config_is_rejected() {
    let path = tempfile_with_contents(
        r#"
        [capture]
        tcp_ports = []
        udp_ports = []
        "#,
    );
    let err = load_from_path(&path);
    assert!(err.is_err());
    let _ = std::fs::remove_file(&path);
}

fn tempfile_with_contents(contents: &str) -> PathBuf {
    use std::io::Write;

    let path = std::env::temp_dir().join(format!(
        "tgveil-config-test-{}-{}.toml",
        std::process::id(),
        contents.len()
    ));
    let mut file = std::fs::File::create(&path).expect("failed to create temp config file");
    file.write_all(contents.as_bytes()).unwrap();
    path
}
