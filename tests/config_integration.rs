//! Integration tests for configuration loading
//!
//! Tests that verify config loading from files and environment variables.

use std::fs;
use std::path::PathBuf;

use oncoming::config::{AppConfig, DriverKind};
use oncoming::game::CollisionSnapshot;
use serial_test::serial;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("oncoming-{name}-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
#[serial]
fn test_repository_defaults_load() {
    let config = AppConfig::load().unwrap();
    assert_eq!(config.game.tick_millis, 50);
    assert_eq!(config.game.collision_snapshot, CollisionSnapshot::PreStep);
    assert_eq!(config.driver.kind, DriverKind::Lua);
    assert!(config.driver.script.is_some());
}

#[test]
#[serial]
fn test_env_override() {
    std::env::set_var("ONCOMING_SESSION__SEED", "7");
    std::env::set_var("ONCOMING_GAME__COLLISION_SNAPSHOT", "post_step");
    let config = AppConfig::load();
    std::env::remove_var("ONCOMING_SESSION__SEED");
    std::env::remove_var("ONCOMING_GAME__COLLISION_SNAPSHOT");

    let config = config.unwrap();
    assert_eq!(config.session.seed, Some(7));
    assert_eq!(config.game.collision_snapshot, CollisionSnapshot::PostStep);
}

#[test]
#[serial]
fn test_user_file_overrides_default_file() {
    let dir = scratch_dir("layers");
    fs::write(
        dir.join("default.toml"),
        "[game]\nspawn_chance = 0.1\nmax_x = 80.0\n[render]\nenabled = false\n",
    )
    .unwrap();
    fs::write(dir.join("user.toml"), "[game]\nspawn_chance = 0.2\n").unwrap();

    let config = AppConfig::load_from(&dir).unwrap();
    fs::remove_dir_all(&dir).unwrap();

    assert_eq!(config.game.spawn_chance, 0.2);
    assert_eq!(config.game.max_x, 80.0);
    assert!(!config.render.enabled);
    assert_eq!(config.driver.kind, DriverKind::Scripted);
}

#[test]
#[serial]
fn test_invalid_rules_are_rejected() {
    let dir = scratch_dir("invalid");
    fs::write(dir.join("default.toml"), "[game]\nspawn_chance = 2.0\n").unwrap();

    let result = AppConfig::load_from(&dir);
    fs::remove_dir_all(&dir).unwrap();

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_missing_directory_falls_back_to_defaults() {
    let config = AppConfig::load_from("no/such/config/dir").unwrap();
    assert_eq!(config.game.spawn_chance, 0.05);
    assert_eq!(config.render.columns, 40);
}
