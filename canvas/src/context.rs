//! Per-session editor context: configuration, feature flags, clock, and counters.
//!
//! An [`EditorContext`] is constructed once when an editor session opens and
//! is owned by the [`crate::engine::EngineCore`]. Every engine reads it by
//! reference; nothing in this crate consults ambient global state.

#[cfg(test)]
#[path = "context_test.rs"]
mod context_test;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::camera::ZoomRange;
use crate::consts::{
    DRAG_THRESHOLD_PX, FIT_PADDING, GRID_SIZE, HANDLE_RADIUS_PX, HISTORY_MAX_SIZE, MIN_SHAPE_SIZE, NUDGE_STEP,
    NUDGE_STEP_LARGE, SNAPSHOT_VERSION, WHEEL_ZOOM_STEP,
};

/// Flag gating drag-rectangle selection.
pub const FLAG_MARQUEE_SELECTION: &str = "marquee_selection";
/// Flag gating group expansion on click and marquee.
pub const FLAG_GROUP_SELECTION: &str = "group_selection";
/// Flag reserved for polygon self-intersection checks. No check consults it yet.
pub const FLAG_CHECK_SELF_INTERSECTION: &str = "check_self_intersection";

/// Grid overlay and snapping configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridConfig {
    /// Cell size in world units.
    pub size: f64,
    /// Whether the host should draw the grid.
    pub visible: bool,
    /// Whether moves and drawn corners snap to the grid.
    pub snap: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { size: GRID_SIZE, visible: true, snap: false }
    }
}

/// Tunable numeric behaviour of the editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub min_shape_size: f64,
    pub drag_threshold_px: f64,
    pub handle_radius_px: f64,
    pub history_max_size: usize,
    pub interactive_zoom: ZoomRange,
    pub fit_zoom: ZoomRange,
    pub fit_padding: f64,
    pub wheel_zoom_step: f64,
    pub nudge_step: f64,
    pub nudge_step_large: f64,
    pub snapshot_version: u32,
    pub grid: GridConfig,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_shape_size: MIN_SHAPE_SIZE,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            handle_radius_px: HANDLE_RADIUS_PX,
            history_max_size: HISTORY_MAX_SIZE,
            interactive_zoom: ZoomRange::INTERACTIVE,
            fit_zoom: ZoomRange::FIT,
            fit_padding: FIT_PADDING,
            wheel_zoom_step: WHEEL_ZOOM_STEP,
            nudge_step: NUDGE_STEP,
            nudge_step_large: NUDGE_STEP_LARGE,
            snapshot_version: SNAPSHOT_VERSION,
            grid: GridConfig::default(),
        }
    }
}

/// Named boolean switches with defaults and explicit overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureFlags {
    flags: BTreeMap<String, bool>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        let mut flags = BTreeMap::new();
        flags.insert(FLAG_MARQUEE_SELECTION.to_string(), true);
        flags.insert(FLAG_GROUP_SELECTION.to_string(), true);
        flags.insert(FLAG_CHECK_SELF_INTERSECTION.to_string(), false);
        Self { flags }
    }
}

impl FeatureFlags {
    /// Whether `name` is on. Unknown flags are off.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Force `name` to `enabled`.
    pub fn set(&mut self, name: &str, enabled: bool) {
        self.flags.insert(name.to_string(), enabled);
    }

    /// Apply a `name=bool,name=bool` override string on top of the defaults.
    ///
    /// Accepts `true/false`, `1/0`, `on/off`. Malformed entries are skipped
    /// with a warning.
    #[must_use]
    pub fn with_overrides(mut self, raw: &str) -> Self {
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let Some((name, value)) = entry.split_once('=') else {
                tracing::warn!(entry, "ignoring feature flag override without '='");
                continue;
            };
            match parse_flag_value(value.trim()) {
                Some(enabled) => self.set(name.trim(), enabled),
                None => tracing::warn!(entry, "ignoring feature flag override with invalid value"),
            }
        }
        self
    }
}

fn parse_flag_value(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "on" => Some(true),
        "false" | "0" | "off" => Some(false),
        _ => None,
    }
}

/// Source of wall-clock time in epoch milliseconds.
pub type Clock = Box<dyn Fn() -> i64>;

/// Epoch milliseconds from the platform clock.
#[cfg(target_arch = "wasm32")]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn system_now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// Epoch milliseconds from the platform clock.
#[cfg(not(target_arch = "wasm32"))]
#[must_use]
pub fn system_now_ms() -> i64 {
    match std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH) {
        Ok(elapsed) => i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX),
        Err(_) => 0,
    }
}

/// Aggregate for one counter name.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PerfStat {
    pub count: u64,
    pub last: f64,
    pub max: f64,
    pub total: f64,
}

impl PerfStat {
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            #[allow(clippy::cast_precision_loss)]
            let count = self.count as f64;
            self.total / count
        }
    }
}

/// Lightweight named counters for editor operations (shape counts, hit sizes).
#[derive(Debug, Default)]
pub struct PerfMonitor {
    stats: RefCell<BTreeMap<&'static str, PerfStat>>,
}

impl PerfMonitor {
    /// Record one sample for `name`.
    pub fn record(&self, name: &'static str, value: f64) {
        let mut stats = self.stats.borrow_mut();
        let stat = stats.entry(name).or_default();
        stat.count += 1;
        stat.last = value;
        stat.total += value;
        if value > stat.max {
            stat.max = value;
        }
    }

    #[must_use]
    pub fn stat(&self, name: &str) -> Option<PerfStat> {
        self.stats.borrow().get(name).copied()
    }

    /// All counters, sorted by name.
    #[must_use]
    pub fn snapshot(&self) -> Vec<(&'static str, PerfStat)> {
        self.stats.borrow().iter().map(|(k, v)| (*k, *v)).collect()
    }

    pub fn reset(&self) {
        self.stats.borrow_mut().clear();
    }
}

/// Everything an editor session shares across its engines.
pub struct EditorContext {
    pub config: EditorConfig,
    pub flags: FeatureFlags,
    pub perf: PerfMonitor,
    clock: Clock,
}

impl fmt::Debug for EditorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditorContext")
            .field("config", &self.config)
            .field("flags", &self.flags)
            .field("perf", &self.perf)
            .finish_non_exhaustive()
    }
}

impl Default for EditorContext {
    fn default() -> Self {
        Self::new(EditorConfig::default(), FeatureFlags::default())
    }
}

impl EditorContext {
    /// Context using the platform clock.
    #[must_use]
    pub fn new(config: EditorConfig, flags: FeatureFlags) -> Self {
        Self { config, flags, perf: PerfMonitor::default(), clock: Box::new(system_now_ms) }
    }

    /// Replace the clock, e.g. with a fixed one in tests.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Current time in epoch milliseconds.
    #[must_use]
    pub fn now(&self) -> i64 {
        (self.clock)()
    }
}
