use super::*;

#[test]
fn load_resolves_state_dir_from_env() {
    std::env::set_var("PERLES_STATE_DIR", "/tmp/perles-config-test");
    let config = Config::load().unwrap();
    assert_eq!(config.state_dir, PathBuf::from("/tmp/perles-config-test"));
    std::env::remove_var("PERLES_STATE_DIR");
}

#[test]
fn default_config_validates() {
    std::env::set_var("PERLES_STATE_DIR", "/tmp/perles-config-test-2");
    let config = Config::load().unwrap();
    assert!(config.validate().is_ok());
    std::env::remove_var("PERLES_STATE_DIR");
}

#[test]
fn broker_capacity_matches_resolved_open_question() {
    std::env::set_var("PERLES_STATE_DIR", "/tmp/perles-config-test-3");
    let config = Config::load().unwrap();
    assert_eq!(config.broker_capacity, 64);
    std::env::remove_var("PERLES_STATE_DIR");
}
