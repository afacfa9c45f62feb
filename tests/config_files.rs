// tests/config_files.rs
use internship_sentinel::config::Settings;
use internship_sentinel::discovery::config::{load_watchers_from, AtsKind};
use std::path::Path;
use std::time::Duration;

#[test]
fn watchers_fixture_loads_valid_entries_only() {
    let cfgs = load_watchers_from(Path::new("tests/fixtures/watchers.json"))
        .expect("watchers fixture parses");

    let names: Vec<_> = cfgs.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Acme", "Beta", "Gamma", "Hooli", "Initech"]);

    let hooli = cfgs.iter().find(|c| c.name == "Hooli").unwrap();
    assert_eq!(hooli.ats_kind, AtsKind::WorkdayIntercept);
    let initech = cfgs.iter().find(|c| c.name == "Initech").unwrap();
    assert_eq!(initech.applied_facets["jobFamilyGroup"], vec!["a1b2c3"]);
}

#[test]
fn settings_file_overrides_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sentinel.toml");
    std::fs::write(
        &path,
        r#"
watchers_path = "/srv/sentinel/watchers.json"
state_dir = "/srv/sentinel/state"
workday_timeout_secs = 45
"#,
    )
    .unwrap();

    let s = Settings::load_from(&path).unwrap();
    assert_eq!(s.state_paths().notified, Path::new("/srv/sentinel/state/notified.json"));
    assert_eq!(s.state_paths().snapshot, Path::new("/srv/sentinel/state/jobs.json"));
    assert_eq!(s.workday_timeout(), Duration::from_secs(45));
    assert_eq!(s.http_timeout(), Duration::from_secs(15));
}

#[test]
fn unknown_settings_keys_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sentinel.toml");
    std::fs::write(&path, "poll_interval = 5\n").unwrap();
    assert!(Settings::load_from(&path).is_err());
}
