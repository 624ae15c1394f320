use super::*;
use clap::Parser;

fn base_cli() -> Cli {
    Cli::parse_from(["focusfield-core"])
}

#[test]
fn defaults_pass_validation() {
    FocusFieldConfig::default().validate().expect("defaults should be valid");
}

#[test]
fn defaults_match_spec_literals() {
    let cfg = FocusFieldConfig::default();
    assert_eq!(cfg.doa.bin_size_deg, 2.0);
    assert_eq!(cfg.doa.update_hz, 10.0);
    assert_eq!(cfg.doa.top_k_peaks, 3);
    assert_eq!(cfg.fusion.max_assoc_deg, 20.0);
    assert_eq!(cfg.lock.acquire_threshold, 0.6);
    assert_eq!(cfg.lock.drop_threshold, 0.35);
    assert_eq!(cfg.lock.acquire_dwell_ms, 150);
    assert_eq!(cfg.lock.hold_ms, 800);
    assert_eq!(cfg.lock.handoff_min_ms, 700);
    assert_eq!(cfg.beamform.use_last_lock_ms, 500);
    assert_eq!(cfg.bus.default_capacity, 32);
    assert_eq!(cfg.bus.overflow_policy, OverflowPolicyConfig::DropNewest);
}

#[test]
fn rejects_drop_threshold_without_hysteresis_margin() {
    let mut cfg = FocusFieldConfig::default();
    cfg.lock.drop_threshold = cfg.lock.acquire_threshold;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_weights_that_do_not_sum_to_one() {
    let mut cfg = FocusFieldConfig::default();
    cfg.fusion.weights = AssociationWeights { mouth: 0.5, face: 0.5, doa: 0.5 };
    assert!(cfg.validate().is_err());
}

#[test]
fn accepts_weights_within_tolerance() {
    let mut cfg = FocusFieldConfig::default();
    cfg.fusion.weights = AssociationWeights { mouth: 0.4001, face: 0.2, doa: 0.4 };
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_too_few_mic_positions() {
    let mut cfg = FocusFieldConfig::default();
    cfg.array.mic_positions_m = vec![MicPosition { x: 0.0, y: 0.0 }];
    assert!(matches!(cfg.validate(), Err(ConfigError::DegenerateGeometry)));
}

#[test]
fn rejects_collinear_three_mic_array() {
    let mut cfg = FocusFieldConfig::default();
    cfg.array.mic_positions_m = vec![
        MicPosition { x: -1.0, y: 0.0 },
        MicPosition { x: 0.0, y: 0.0 },
        MicPosition { x: 1.0, y: 0.0 },
    ];
    assert!(matches!(cfg.validate(), Err(ConfigError::DegenerateGeometry)));
}

#[test]
fn accepts_two_mic_linear_array() {
    let mut cfg = FocusFieldConfig::default();
    cfg.array.mic_positions_m = vec![MicPosition { x: -1.0, y: 0.0 }, MicPosition { x: 1.0, y: 0.0 }];
    assert!(cfg.validate().is_ok());
}

#[test]
fn accepts_nonlinear_three_mic_array() {
    let mut cfg = FocusFieldConfig::default();
    cfg.array.mic_positions_m = vec![
        MicPosition { x: -1.0, y: 0.0 },
        MicPosition { x: 0.0, y: 0.5 },
        MicPosition { x: 1.0, y: 0.0 },
    ];
    assert!(cfg.validate().is_ok());
}

#[test]
fn rejects_bin_size_not_dividing_360() {
    let mut cfg = FocusFieldConfig::default();
    cfg.doa.bin_size_deg = 0.0;
    assert!(cfg.validate().is_err());
    cfg.doa.bin_size_deg = 400.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_inverted_frequency_band() {
    let mut cfg = FocusFieldConfig::default();
    cfg.doa.freq_band_hz = FreqBand { lo_hz: 4000.0, hi_hz: 3000.0 };
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_staleness_red_not_above_yellow() {
    let mut cfg = FocusFieldConfig::default();
    cfg.health.staleness_red_ms = cfg.health.staleness_yellow_ms;
    assert!(cfg.validate().is_err());
}

#[test]
fn rejects_health_publish_hz_above_slow_cadence_bound() {
    let mut cfg = FocusFieldConfig::default();
    cfg.health.publish_hz = 5.0;
    assert!(cfg.validate().is_err());
}

#[test]
fn cli_overrides_apply_on_top_of_defaults() {
    let mut cli = base_cli();
    cli.lock_acquire_dwell_ms = Some(250);
    cli.bus_overflow_policy = Some(OverflowPolicyConfig::DropOldest);
    let mut cfg = FocusFieldConfig::default();
    cli.apply_overrides(&mut cfg);
    assert_eq!(cfg.lock.acquire_dwell_ms, 250);
    assert_eq!(cfg.bus.overflow_policy, OverflowPolicyConfig::DropOldest);
    // Untouched fields keep their defaults.
    assert_eq!(cfg.lock.hold_ms, 800);
}

#[test]
fn load_without_config_file_uses_defaults_plus_overrides() {
    let mut cli = base_cli();
    cli.doa_top_k_peaks = Some(5);
    let cfg = FocusFieldConfig::load(&cli).expect("defaults with one override should validate");
    assert_eq!(cfg.doa.top_k_peaks, 5);
    assert_eq!(cfg.doa.bin_size_deg, 2.0);
}

#[test]
fn load_from_yaml_file_merges_with_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("focusfield.yaml");
    std::fs::write(&path, "doa:\n  top_k_peaks: 5\nlock:\n  acquire_threshold: 0.7\n").unwrap();
    let mut cli = base_cli();
    cli.config = Some(path);
    let cfg = FocusFieldConfig::load(&cli).expect("yaml file should load");
    assert_eq!(cfg.doa.top_k_peaks, 5);
    assert_eq!(cfg.lock.acquire_threshold, 0.7);
    // Fields the file didn't mention keep their defaults.
    assert_eq!(cfg.lock.hold_ms, 800);
}

#[test]
fn load_from_json_file_merges_with_defaults() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("focusfield.json");
    std::fs::write(&path, r#"{"bus": {"default_capacity": 64}}"#).unwrap();
    let mut cli = base_cli();
    cli.config = Some(path);
    let cfg = FocusFieldConfig::load(&cli).expect("json file should load");
    assert_eq!(cfg.bus.default_capacity, 64);
}

#[test]
fn load_surfaces_read_error_for_missing_file() {
    let mut cli = base_cli();
    cli.config = Some(std::path::PathBuf::from("/nonexistent/focusfield.yaml"));
    assert!(matches!(FocusFieldConfig::load(&cli), Err(ConfigError::Read { .. })));
}

#[test]
fn load_surfaces_parse_error_for_malformed_file() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("focusfield.json");
    std::fs::write(&path, "{ not json").unwrap();
    let mut cli = base_cli();
    cli.config = Some(path);
    assert!(matches!(FocusFieldConfig::load(&cli), Err(ConfigError::Parse { .. })));
}

#[test]
fn cli_override_that_breaks_validation_is_caught_at_load() {
    let mut cli = base_cli();
    cli.lock_drop_threshold = Some(0.9);
    cli.lock_acquire_threshold = Some(0.5);
    assert!(FocusFieldConfig::load(&cli).is_err());
}

#[test]
fn config_round_trips_through_yaml() {
    let cfg = FocusFieldConfig::default();
    let yaml = serde_yaml::to_string(&cfg).unwrap();
    let back: FocusFieldConfig = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(cfg, back);
}
