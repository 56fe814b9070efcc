// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Configuration file loading tests
//!
//! Covers the loading priority chain (explicit --config, XDG directory),
//! YAML error reporting, and the path from a profile on disk to a fully
//! resolved tunnel configuration.

use std::path::Path;

use serial_test::serial;
use tempfile::TempDir;

use btun::config::Config;

const SAMPLE_CONFIG: &str = r#"
defaults:
  user: admin
  timeout_ms: 20000

tunnels:
  staging-db:
    host: staging.example.com
    port: 2200
    target_host: db.internal
    target_port: 5432
    local_port: 15432
    jump_hosts:
      - bastion.example.com
"#;

#[tokio::test]
async fn test_load_explicit_config_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("custom.yaml");
    std::fs::write(&path, SAMPLE_CONFIG).unwrap();

    let config = Config::load_with_priority(&path)
        .await
        .expect("explicit config file should load");

    assert_eq!(config.defaults.user.as_deref(), Some("admin"));
    let profile = config.get_tunnel("staging-db").expect("profile present");
    assert_eq!(profile.host.as_deref(), Some("staging.example.com"));
    assert_eq!(profile.target_port, Some(5432));
}

#[tokio::test]
async fn test_load_missing_file_gives_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("does-not-exist.yaml");

    let config = Config::load(&path).await.expect("missing file is not an error");
    assert!(config.tunnels.is_empty());
    assert!(config.defaults.user.is_none());
}

#[tokio::test]
async fn test_load_reports_yaml_errors() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.yaml");
    std::fs::write(&path, "tunnels:\n  broken: [unclosed\n").unwrap();

    let err = Config::load(&path).await.expect_err("invalid YAML must fail");
    assert!(
        err.to_string().contains("Failed to parse YAML"),
        "error should point at YAML parsing: {err:#}"
    );
}

#[tokio::test]
#[serial]
async fn test_load_with_priority_uses_xdg_directory() {
    let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();

    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join("btun");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(config_dir.join("config.yaml"), SAMPLE_CONFIG).unwrap();
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    // Passing the default path means "nothing explicit", so the XDG
    // location wins.
    let result = Config::load_with_priority(Path::new("~/.config/btun/config.yaml")).await;

    if let Some(xdg) = original_xdg {
        std::env::set_var("XDG_CONFIG_HOME", xdg);
    } else {
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    let config = result.expect("XDG config should load");
    assert!(config.get_tunnel("staging-db").is_some());
}

#[tokio::test]
#[serial]
async fn test_load_with_priority_defaults_to_empty() {
    let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();

    // An empty XDG directory hides any real user configuration.
    let dir = TempDir::new().unwrap();
    std::env::set_var("XDG_CONFIG_HOME", dir.path());

    let result = Config::load_with_priority(Path::new("~/.config/btun/config.yaml")).await;

    if let Some(xdg) = original_xdg {
        std::env::set_var("XDG_CONFIG_HOME", xdg);
    } else {
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    let config = result.expect("no config anywhere still succeeds");
    assert!(config.tunnels.is_empty());
}

#[tokio::test]
#[serial]
async fn test_load_with_priority_prefers_explicit_over_xdg() {
    let original_xdg = std::env::var("XDG_CONFIG_HOME").ok();

    let xdg_dir = TempDir::new().unwrap();
    let config_dir = xdg_dir.path().join("btun");
    std::fs::create_dir_all(&config_dir).unwrap();
    std::fs::write(
        config_dir.join("config.yaml"),
        "defaults:\n  user: from-xdg\n",
    )
    .unwrap();
    std::env::set_var("XDG_CONFIG_HOME", xdg_dir.path());

    let explicit_dir = TempDir::new().unwrap();
    let explicit = explicit_dir.path().join("mine.yaml");
    std::fs::write(&explicit, "defaults:\n  user: from-explicit\n").unwrap();

    let result = Config::load_with_priority(&explicit).await;

    if let Some(xdg) = original_xdg {
        std::env::set_var("XDG_CONFIG_HOME", xdg);
    } else {
        std::env::remove_var("XDG_CONFIG_HOME");
    }

    let config = result.expect("explicit config should load");
    assert_eq!(config.defaults.user.as_deref(), Some("from-explicit"));
}

#[tokio::test]
async fn test_profile_resolves_to_tunnel_config() {
    use btun::config::resolve_request;
    use btun::port::SystemPortAllocator;
    use clap::Parser;

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, SAMPLE_CONFIG).unwrap();

    let config = Config::load_with_priority(&path).await.unwrap();
    let cli = btun::Cli::try_parse_from(["btun", "-c", "staging-db"]).unwrap();
    let request = resolve_request(&cli, &config).unwrap();

    let allocator = SystemPortAllocator;
    let tunnel = request
        .resolve(&allocator)
        .await
        .expect("profile carries everything a tunnel needs");

    assert_eq!(tunnel.remote_host, "staging.example.com");
    assert_eq!(tunnel.remote_port, 2200);
    assert_eq!(tunnel.user.as_deref(), Some("admin"));
    assert_eq!(tunnel.local_port, 15432);
    assert_eq!(tunnel.target_host, "db.internal");
    assert_eq!(tunnel.target_port, 5432);
    assert_eq!(tunnel.jump_hosts.len(), 1);
    assert_eq!(tunnel.timeout, std::time::Duration::from_millis(20000));
}
