use std::collections::HashMap;
use std::path::{Path, PathBuf};

use mindcheck_core::commands::ensure_root;
use mindcheck_core::config::{
    CoreConfig, ENV_CONFIDENCE_THRESHOLD, ENV_LE_PATH, ENV_MODEL_DIR,
};

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn defaults_without_a_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = CoreConfig::load_with(dir.path(), no_env).unwrap();
    assert_eq!(cfg.model.dir, dir.path().join("model"));
    assert_eq!(cfg.model.label_encoder, dir.path().join("label_encoder.json"));
    assert_eq!(cfg.model.model_path(), dir.path().join("model").join("model.onnx"));
    assert_eq!(cfg.model.max_seq_len, 128);
    assert_eq!(cfg.model.confidence_threshold, 0.45);
    assert_eq!(cfg.model.model_version, "roberta-v1");
    assert_eq!(cfg.model.intra_threads, 1);
    assert_eq!(cfg.store.db_path, dir.path().join("journal.db"));
    assert_eq!(cfg.logbook.path, dir.path().join("logbook/classifications.jsonl"));
    assert!(cfg.logbook.enabled);
    assert_eq!(cfg.insights.offset().unwrap().local_minus_utc(), 0);
}

#[test]
fn partial_file_keeps_other_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("config.toml"),
        r#"
[model]
confidence_threshold = 0.6
dir = "/opt/models/roberta"

[insights]
utc_offset_minutes = -300
"#,
    )
    .unwrap();
    let cfg = CoreConfig::load_with(dir.path(), no_env).unwrap();
    assert_eq!(cfg.model.confidence_threshold, 0.6);
    assert_eq!(cfg.model.dir, PathBuf::from("/opt/models/roberta"));
    assert_eq!(cfg.model.max_seq_len, 128);
    assert_eq!(cfg.insights.offset().unwrap().local_minus_utc(), -300 * 60);
}

#[test]
fn environment_overrides_win() {
    let dir = tempfile::tempdir().unwrap();
    let env: HashMap<&str, &str> = [
        (ENV_MODEL_DIR, "/srv/saved_roberta"),
        (ENV_LE_PATH, "/srv/label_encoder.json"),
        (ENV_CONFIDENCE_THRESHOLD, " 0.3 "),
    ]
    .into_iter()
    .collect();
    let cfg = CoreConfig::load_with(dir.path(), |k| env.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(cfg.model.dir, PathBuf::from("/srv/saved_roberta"));
    assert_eq!(cfg.model.label_encoder, PathBuf::from("/srv/label_encoder.json"));
    assert_eq!(cfg.model.confidence_threshold, 0.3);
}

#[test]
fn invalid_values_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let bad_env = |k: &str| (k == ENV_CONFIDENCE_THRESHOLD).then(|| "1.2".to_string());
    assert!(CoreConfig::load_with(dir.path(), bad_env).is_err());

    let not_a_number = |k: &str| (k == ENV_CONFIDENCE_THRESHOLD).then(|| "high".to_string());
    assert!(CoreConfig::load_with(dir.path(), not_a_number).is_err());

    std::fs::write(dir.path().join("config.toml"), "[model]\nintra_threads = 0\n").unwrap();
    assert!(CoreConfig::load_with(dir.path(), no_env).is_err());

    std::fs::write(dir.path().join("config.toml"), "[insights]\nutc_offset_minutes = 2000\n").unwrap();
    assert!(CoreConfig::load_with(dir.path(), no_env).is_err());
}

#[test]
fn ensure_root_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("mc");

    let first = ensure_root(&root).unwrap();
    assert!(first.created.contains(&"config.toml".to_string()));
    assert!(first.created.contains(&"model".to_string()));
    assert!(first
        .created
        .contains(&Path::new("logbook").join("classifications.jsonl").display().to_string()));
    assert!(root.join("config.toml").is_file());
    assert!(first.config.logbook.path.is_file());

    std::fs::write(root.join("config.toml"), "[model]\nmodel_version = \"custom\"\n").unwrap();

    let second = ensure_root(&root).unwrap();
    assert!(second.created.is_empty());
    assert!(second.existed.contains(&"config.toml".to_string()));
    assert!(second.existed.contains(&".".to_string()));
    assert!(second.existed.iter().all(|label| !Path::new(label).is_absolute()));
    assert_eq!(second.config.model.model_version, "custom");

    let log = std::fs::read_to_string(&second.config.logbook.path).unwrap();
    assert_eq!(log.lines().count(), 1);
    assert!(log.contains("system_init"));
}

#[test]
fn seeded_config_matches_defaults() {
    let dir = tempfile::tempdir().unwrap();
    ensure_root(dir.path()).unwrap();
    let seeded = CoreConfig::load_with(dir.path(), no_env).unwrap();
    assert_eq!(seeded.model.confidence_threshold, 0.45);
    assert_eq!(seeded.model.max_seq_len, 128);
    assert_eq!(seeded.store.db_path, dir.path().join("journal.db"));
    assert_eq!(seeded.logbook.path, dir.path().join("logbook/classifications.jsonl"));
}
