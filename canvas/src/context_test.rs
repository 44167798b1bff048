#![allow(clippy::float_cmp)]

use super::*;

// =============================================================
// EditorConfig
// =============================================================

#[test]
fn config_defaults_match_consts() {
    let cfg = EditorConfig::default();
    assert_eq!(cfg.min_shape_size, MIN_SHAPE_SIZE);
    assert_eq!(cfg.history_max_size, HISTORY_MAX_SIZE);
    assert_eq!(cfg.interactive_zoom, ZoomRange::INTERACTIVE);
    assert_eq!(cfg.fit_zoom, ZoomRange::FIT);
    assert!(!cfg.grid.snap);
}

#[test]
fn config_deserializes_partial_json() {
    let cfg: EditorConfig = serde_json::from_str(r#"{ "historyMaxSize": 5, "dragThresholdPx": 2.5 }"#).unwrap();
    assert_eq!(cfg.history_max_size, 5);
    assert_eq!(cfg.drag_threshold_px, 2.5);
    assert_eq!(cfg.min_shape_size, MIN_SHAPE_SIZE);
}

// =============================================================
// FeatureFlags
// =============================================================

#[test]
fn flags_defaults() {
    let flags = FeatureFlags::default();
    assert!(flags.is_enabled(FLAG_MARQUEE_SELECTION));
    assert!(flags.is_enabled(FLAG_GROUP_SELECTION));
    assert!(!flags.is_enabled(FLAG_CHECK_SELF_INTERSECTION));
    assert!(!flags.is_enabled("no_such_flag"));
}

#[test]
fn flags_overrides_parse_common_spellings() {
    let flags = FeatureFlags::default().with_overrides("group_selection=off, experimental=1 ,marquee_selection=FALSE");
    assert!(!flags.is_enabled(FLAG_GROUP_SELECTION));
    assert!(!flags.is_enabled(FLAG_MARQUEE_SELECTION));
    assert!(flags.is_enabled("experimental"));
}

#[test]
fn flags_overrides_skip_malformed_entries() {
    let flags = FeatureFlags::default().with_overrides("group_selection,marquee_selection=maybe,,");
    assert_eq!(flags, FeatureFlags::default());
}

// =============================================================
// PerfMonitor
// =============================================================

#[test]
fn perf_records_count_last_max_mean() {
    let perf = PerfMonitor::default();
    perf.record("marquee.hits", 2.0);
    perf.record("marquee.hits", 6.0);
    perf.record("marquee.hits", 4.0);
    let stat = perf.stat("marquee.hits").unwrap();
    assert_eq!(stat.count, 3);
    assert_eq!(stat.last, 4.0);
    assert_eq!(stat.max, 6.0);
    assert_eq!(stat.mean(), 4.0);
}

#[test]
fn perf_reset_clears() {
    let perf = PerfMonitor::default();
    perf.record("a", 1.0);
    perf.reset();
    assert!(perf.stat("a").is_none());
    assert!(perf.snapshot().is_empty());
}

#[test]
fn perf_stat_mean_of_empty_is_zero() {
    assert_eq!(PerfStat::default().mean(), 0.0);
}

// =============================================================
// EditorContext
// =============================================================

#[test]
fn context_uses_injected_clock() {
    let ctx = EditorContext::default().with_clock(Box::new(|| 1_700_000_000_000));
    assert_eq!(ctx.now(), 1_700_000_000_000);
}

#[test]
fn context_system_clock_is_after_2020() {
    let ctx = EditorContext::default();
    assert!(ctx.now() > 1_577_836_800_000);
}
