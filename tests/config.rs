mod support;

use std::time::Duration;

use taskboard::config::{config_path, resolve_data_dir, Config};
use taskboard::Error;

use support::TestBoardDir;

#[test]
fn config_defaults_when_missing() {
    let dir = TestBoardDir::new();
    let config = Config::load_from_dir(dir.path()).expect("config");

    assert!(config.activity.enabled);
    assert_eq!(config.activity.interval().expect("interval"), Duration::from_secs(12));
    assert_eq!(config.log.capacity, 20);
    assert_eq!(
        config.editing.lease_ttl().expect("ttl"),
        chrono::Duration::minutes(5)
    );
}

#[test]
fn partial_config_keeps_other_defaults() {
    let dir = TestBoardDir::new();
    dir.write_config("[activity]\nprobability = 0.9\n");

    let config = Config::load_from_dir(dir.path()).expect("config");
    assert!((config.activity.probability - 0.9).abs() < f64::EPSILON);
    assert_eq!(config.activity.interval, "12s");
    assert_eq!(config.log.capacity, 20);
}

#[test]
fn invalid_values_are_rejected() {
    let dir = TestBoardDir::new();
    let cases = [
        "[activity]\nprobability = 1.5\n",
        "[log]\ncapacity = 0\n",
        "[editing]\nlease_ttl = \"soon\"\n",
        "[activity]\ninterval = \"0s\"\n",
    ];

    for contents in cases {
        let path = dir.write_config(contents);
        let err = Config::load(&path).unwrap_err();
        assert!(
            matches!(err, Error::InvalidConfig(_)),
            "{contents:?} gave {err}"
        );
        assert!(matches!(
            Config::load_from_dir(dir.path()),
            Err(Error::InvalidConfig(_))
        ));
    }
}

#[test]
fn save_then_load_round_trips() {
    let dir = TestBoardDir::new();
    let mut config = Config::default();
    config.activity.interval = "3s".to_string();
    config.editing.lease_ttl = "1h".to_string();

    let path = config_path(dir.path());
    config.save(&path).expect("save");
    let loaded = Config::load(&path).expect("load");
    assert_eq!(loaded.activity.interval().expect("interval"), Duration::from_secs(3));
    assert_eq!(
        loaded.editing.lease_ttl().expect("ttl"),
        chrono::Duration::hours(1)
    );
}

#[test]
fn explicit_data_dir_wins() {
    let dir = TestBoardDir::new();
    assert_eq!(resolve_data_dir(Some(dir.path())), dir.path().to_path_buf());
}
