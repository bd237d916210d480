use super::*;

use std::collections::HashMap;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn write_config(dir: &tempfile::TempDir, body: &str) -> PathBuf {
    let path = dir.path().join("chartdesk.toml");
    fs::write(&path, body).expect("write config");
    path
}

#[test]
fn defaults_apply_without_file_or_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "");

    let settings =
        load_settings_with(Some(&path), &Overrides::default(), env_from(&[])).expect("load");
    assert_eq!(settings.server_url.as_str(), "http://127.0.0.1:5000/");
    assert_eq!(settings.download_dir, PathBuf::from("./downloads"));
    assert_eq!(settings.log_filter, "info");
}

#[test]
fn file_then_env_then_cli_take_precedence() {
    let dir = tempfile::tempdir().expect("tempdir");
    let body = concat!(
        "server_url = \"http://file.example:8000\"\n",
        "download_dir = \"file-dl\"\n",
        "log_filter = \"debug\"\n",
    );
    let path = write_config(&dir, body);

    let from_file =
        load_settings_with(Some(&path), &Overrides::default(), env_from(&[])).expect("load");
    assert_eq!(from_file.server_url.host_str(), Some("file.example"));
    assert_eq!(from_file.download_dir, PathBuf::from("file-dl"));
    assert_eq!(from_file.log_filter, "debug");

    let env = env_from(&[
        ("CHARTDESK_SERVER_URL", "http://env.example"),
        ("APP__DOWNLOAD_DIR", "env-dl"),
    ]);
    let from_env = load_settings_with(Some(&path), &Overrides::default(), env).expect("load");
    assert_eq!(from_env.server_url.host_str(), Some("env.example"));
    assert_eq!(from_env.download_dir, PathBuf::from("env-dl"));

    let overrides = Overrides {
        server_url: Some("https://cli.example/app".into()),
        download_dir: None,
    };
    let env = env_from(&[("CHARTDESK_SERVER_URL", "http://env.example")]);
    let from_cli = load_settings_with(Some(&path), &overrides, env).expect("load");
    assert_eq!(from_cli.server_url.as_str(), "https://cli.example/app");
    assert_eq!(from_cli.download_dir, PathBuf::from("file-dl"));
}

#[test]
fn log_filter_env_overrides_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "log_filter = \"debug\"\n");
    let env = env_from(&[("CHARTDESK_LOG", "client_core=trace,warn")]);

    let settings = load_settings_with(Some(&path), &Overrides::default(), env).expect("load");
    assert_eq!(settings.log_filter, "client_core=trace,warn");
}

#[test]
fn app_prefixed_env_wins_over_plain_env() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "");
    let env = env_from(&[
        ("CHARTDESK_SERVER_URL", "http://plain.example"),
        ("APP__SERVER_URL", "http://app.example"),
    ]);

    let settings = load_settings_with(Some(&path), &Overrides::default(), env).expect("load");
    assert_eq!(settings.server_url.host_str(), Some("app.example"));
}

#[test]
fn rejects_non_http_server_url() {
    let overrides = Overrides {
        server_url: Some("ftp://files.example".into()),
        download_dir: None,
    };
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "");

    let err = load_settings_with(Some(&path), &overrides, env_from(&[])).expect_err("must fail");
    assert!(err.to_string().contains("http or https"), "{err}");
}

#[test]
fn missing_explicit_config_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("absent.toml");

    assert!(load_settings_with(Some(&path), &Overrides::default(), env_from(&[])).is_err());
}

#[test]
fn unknown_keys_are_rejected() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = write_config(&dir, "bind_addr = \"0.0.0.0:1\"\n");

    let err = load_settings_with(Some(&path), &Overrides::default(), env_from(&[]))
        .expect_err("must fail");
    assert!(err.to_string().contains("invalid config file"), "{err}");
}
