use super::*;

// =============================================================
// Helpers
// =============================================================

const MB: usize = 1024 * 1024;

fn cache(max_entries: usize, max_memory_mb: usize) -> BoundedCache<&'static str> {
    BoundedCache::with_limits(max_entries, max_memory_mb)
}

fn sorted_keys<T>(c: &BoundedCache<T>) -> Vec<String> {
    let mut keys: Vec<String> = c.keys().into_iter().map(str::to_string).collect();
    keys.sort();
    keys
}

// =============================================================
// Config
// =============================================================

#[test]
fn default_config_is_fifty_entries_and_hundred_mb() {
    let config = CacheConfig::default();
    assert_eq!(config.max_entries, 50);
    assert_eq!(config.max_memory_bytes, 100 * MB);
}

#[test]
fn with_limits_converts_megabytes() {
    let c = cache(3, 2);
    assert_eq!(c.config(), CacheConfig { max_entries: 3, max_memory_bytes: 2 * MB });
}

// =============================================================
// get / peek / has
// =============================================================

#[test]
fn get_hit_and_miss_update_counters() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    assert_eq!(c.get("a"), Some(&"tex-a"));
    assert_eq!(c.get("missing"), None);
    let stats = c.stats();
    assert_eq!(stats.hits, 1);
    assert_eq!(stats.misses, 1);
    assert!((stats.hit_rate - 0.5).abs() < 1e-9);
}

#[test]
fn hit_rate_is_zero_before_any_lookup() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    assert!(c.stats().hit_rate.abs() < f64::EPSILON);
}

#[test]
fn get_increments_access_count() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    c.get("a");
    c.get("a");
    let entry = c.entries()[0];
    assert_eq!(entry.access_count, 3);
}

#[test]
fn peek_does_not_touch_recency_or_counters() {
    let mut c = cache(2, 1);
    c.set("a", "tex-a", 10);
    c.set("b", "tex-b", 10);
    assert_eq!(c.peek("a"), Some(&"tex-a"));
    assert_eq!(c.stats().hits, 0);
    c.set("c", "tex-c", 10);
    assert!(!c.has("a"), "peek must not protect a from eviction");
}

#[test]
fn has_reports_presence() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 1);
    assert!(c.has("a"));
    assert!(!c.has("b"));
}

// =============================================================
// set
// =============================================================

#[test]
fn set_tracks_memory() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    c.set("b", "tex-b", 250);
    assert_eq!(c.memory_usage(), 350);
    assert_eq!(c.len(), 2);
}

#[test]
fn replacing_a_key_swaps_its_size() {
    let mut c = cache(10, 1);
    c.set("a", "old", 100);
    c.set("b", "tex-b", 50);
    c.set("a", "new", 300);
    assert_eq!(c.memory_usage(), 350);
    assert_eq!(c.peek("a"), Some(&"new"));
    assert_eq!(c.stats().evictions, 0);
}

#[test]
fn replacing_a_key_at_count_limit_does_not_evict() {
    let mut c = cache(2, 1);
    c.set("a", "tex-a", 10);
    c.set("b", "tex-b", 10);
    c.set("a", "tex-a2", 20);
    assert_eq!(c.len(), 2);
    assert_eq!(c.stats().evictions, 0);
}

#[test]
fn growing_an_entry_past_budget_evicts_others_but_not_itself() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 400_000);
    c.set("b", "tex-b", 400_000);
    c.set("b", "tex-b2", 900_000);
    assert_eq!(sorted_keys(&c), vec!["b"]);
    assert_eq!(c.memory_usage(), 900_000);
    assert_eq!(c.stats().evictions, 1);
}

#[test]
fn oversized_entry_is_admitted_into_empty_cache() {
    let mut c = cache(10, 1);
    c.set("huge", "tex", 5 * MB);
    assert!(c.has("huge"));
    assert_eq!(c.memory_usage(), 5 * MB);
}

#[test]
fn oversized_entry_evicts_everything_else() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    c.set("b", "tex-b", 100);
    c.set("huge", "tex", 2 * MB);
    assert_eq!(sorted_keys(&c), vec!["huge"]);
    assert_eq!(c.stats().evictions, 2);
}

// =============================================================
// Eviction scenarios
// =============================================================

#[test]
fn count_limit_evicts_oldest_on_third_insert() {
    let mut c = cache(2, 1);
    c.set("a", "tex-a", 500_000);
    c.set("b", "tex-b", 500_000);
    c.set("c", "tex-c", 100);
    assert_eq!(sorted_keys(&c), vec!["b", "c"]);
    assert_eq!(c.stats().evictions, 1);
    assert_eq!(c.memory_usage(), 500_100);
}

#[test]
fn recently_read_entry_survives_eviction() {
    let mut c = cache(3, 1);
    c.set("a", "tex-a", 10);
    c.set("b", "tex-b", 10);
    c.set("c", "tex-c", 10);
    c.get("a");
    c.set("d", "tex-d", 10);
    assert_eq!(sorted_keys(&c), vec!["a", "c", "d"]);
}

#[test]
fn memory_limit_evicts_until_incoming_fits() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 400_000);
    c.set("b", "tex-b", 400_000);
    c.set("c", "tex-c", 200_000);
    c.set("d", "tex-d", 500_000);
    // a and b go; c + d = 700_000 fits.
    assert_eq!(sorted_keys(&c), vec!["c", "d"]);
    assert_eq!(c.stats().evictions, 2);
}

#[test]
fn budgets_hold_after_every_set() {
    let mut c = cache(4, 1);
    for i in 0..40usize {
        let size = (i * 37_000) % 600_000 + 1;
        c.set(format!("k{}", i % 9), "tex", size);
        assert!(c.len() <= 4);
        if c.len() > 1 {
            assert!(c.memory_usage() <= MB, "over budget after set {i}");
        }
    }
}

#[test]
fn keys_are_least_recent_first() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 1);
    c.set("b", "tex-b", 1);
    c.set("c", "tex-c", 1);
    c.get("a");
    assert_eq!(c.keys(), vec!["b", "c", "a"]);
    assert_eq!(c.values(), vec![&"tex-b", &"tex-c", &"tex-a"]);
}

#[test]
fn snapshot_views_do_not_change_recency() {
    let mut c = cache(2, 1);
    c.set("a", "tex-a", 1);
    c.set("b", "tex-b", 1);
    c.entries();
    c.keys();
    c.values();
    c.set("c", "tex-c", 1);
    assert!(!c.has("a"));
}

// =============================================================
// delete / clear
// =============================================================

#[test]
fn delete_releases_memory() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    c.set("b", "tex-b", 200);
    assert!(c.delete("a"));
    assert!(!c.delete("a"));
    assert_eq!(c.memory_usage(), 200);
    assert_eq!(c.stats().evictions, 0);
}

#[test]
fn clear_empties_and_resets_memory() {
    let mut c = cache(10, 1);
    c.set("a", "tex-a", 100);
    c.get("a");
    c.clear();
    assert!(c.is_empty());
    assert_eq!(c.memory_usage(), 0);
    assert_eq!(c.stats().hits, 1);
}
