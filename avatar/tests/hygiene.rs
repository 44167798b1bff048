//! Pattern budgets over `avatar/src`, excluding `*_test.rs` files.
//!
//! Playback is driven by host timestamps and the preview handle is an `Rc`,
//! so the crate neither reads a clock nor spawns threads.

use std::fs;
use std::path::{Path, PathBuf};

fn production_sources() -> Vec<(PathBuf, String)> {
    let mut pending = vec![PathBuf::from("src")];
    let mut out = Vec::new();
    while let Some(dir) = pending.pop() {
        let Ok(entries) = fs::read_dir(&dir) else { continue };
        for path in entries.flatten().map(|e| e.path()) {
            if path.is_dir() {
                pending.push(path);
            } else if path.extension().is_some_and(|ext| ext == "rs") && !path.to_string_lossy().ends_with("_test.rs") {
                if let Ok(text) = fs::read_to_string(&path) {
                    out.push((path, text));
                }
            }
        }
    }
    out
}

fn assert_budget(label: &str, budget: usize, needles: &[&str]) {
    let found: Vec<String> = production_sources()
        .iter()
        .flat_map(|(path, text): &(PathBuf, String)| {
            text.lines()
                .enumerate()
                .filter(|(_, line)| needles.iter().any(|n| line.contains(n)))
                .map(move |(no, _)| format!("{}:{}", Path::new(path).display(), no + 1))
                .collect::<Vec<_>>()
        })
        .collect();
    assert!(found.len() <= budget, "{label}: {} over a budget of {budget}\n  {}", found.len(), found.join("\n  "));
}

macro_rules! budget {
    ($($name:ident: $max:expr => [$($needle:expr),+ $(,)?];)+) => {
        $(
            #[test]
            fn $name() {
                assert_budget(stringify!($name), $max, &[$($needle),+]);
            }
        )+
    };
}

budget! {
    no_unwrap: 0 => [".unwrap()"];
    no_expect: 0 => [".expect("];
    no_panic: 0 => ["panic!(", "unreachable!("];
    no_stubs: 0 => ["todo!(", "unimplemented!("];
    no_discarded_result: 0 => ["let _ ="];
    no_dropped_error: 0 => [".ok()"];
    no_dead_code_allow: 0 => ["#[allow(dead_code)]"];
    no_clock_reads: 0 => ["SystemTime::now", "Instant::now", "Date::now"];
    no_threads: 0 => ["thread::spawn"];
}
