//! Pattern budgets over `canvas/src`, excluding `*_test.rs` files.
//!
//! Each budget is the most occurrences allowed. They are all zero today and
//! should stay there. Clock reads go through `EditorContext::now`, so only
//! `context.rs` may touch the platform clock.

use std::fs;
use std::path::{Path, PathBuf};

const CLOCK_OWNER: &str = "context.rs";

fn walk(dir: &Path, out: &mut Vec<(PathBuf, String)>) {
    let Ok(entries) = fs::read_dir(dir) else { return };
    for path in entries.flatten().map(|e| e.path()) {
        if path.is_dir() {
            walk(&path, out);
            continue;
        }
        let is_source = path.extension().is_some_and(|ext| ext == "rs");
        let is_test = path.to_string_lossy().ends_with("_test.rs");
        if is_source && !is_test {
            if let Ok(text) = fs::read_to_string(&path) {
                out.push((path, text));
            }
        }
    }
}

fn production_sources() -> Vec<(PathBuf, String)> {
    let mut out = Vec::new();
    walk(Path::new("src"), &mut out);
    out
}

/// Lines containing any of `needles`, reported as `path:line`.
fn offenders(sources: &[(PathBuf, String)], needles: &[&str]) -> Vec<String> {
    let mut found = Vec::new();
    for (path, text) in sources {
        for (no, line) in text.lines().enumerate() {
            if needles.iter().any(|n| line.contains(n)) {
                found.push(format!("{}:{}", path.display(), no + 1));
            }
        }
    }
    found
}

fn check(label: &str, budget: usize, sources: &[(PathBuf, String)], needles: &[&str]) {
    let found = offenders(sources, needles);
    assert!(found.len() <= budget, "{label}: {} over a budget of {budget}\n  {}", found.len(), found.join("\n  "));
}

macro_rules! budget {
    ($($name:ident: $max:expr => [$($needle:expr),+ $(,)?];)+) => {
        $(
            #[test]
            fn $name() {
                check(stringify!($name), $max, &production_sources(), &[$($needle),+]);
            }
        )+
    };
}

budget! {
    no_unwrap: 0 => [".unwrap()"];
    no_expect: 0 => [".expect("];
    no_panic: 0 => ["panic!("];
    no_unreachable: 0 => ["unreachable!("];
    no_todo: 0 => ["todo!("];
    no_unimplemented: 0 => ["unimplemented!("];
    no_discarded_result: 0 => ["let _ ="];
    no_dropped_error: 0 => [".ok()"];
    no_dead_code_allow: 0 => ["#[allow(dead_code)]"];
}

#[test]
fn clock_reads_stay_in_context() {
    let sources: Vec<_> = production_sources().into_iter().filter(|(p, _)| !p.ends_with(CLOCK_OWNER)).collect();
    check("clock reads outside context.rs", 0, &sources, &["SystemTime::now", "Date::now"]);
}
