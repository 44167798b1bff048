use super::*;
use crate::sheet::FrameRect;

// =============================================================
// Helpers
// =============================================================

fn looping(frames: usize) -> FramePlayer {
    FramePlayer::new(frames, 100.0, true)
}

fn one_shot(frames: usize) -> FramePlayer {
    FramePlayer::new(frames, 100.0, false)
}

// =============================================================
// FramePlayer
// =============================================================

#[test]
fn first_tick_starts_clock_without_advancing() {
    let mut p = looping(4);
    assert_eq!(p.tick(5_000.0), 0);
}

#[test]
fn advances_once_interval_elapses() {
    let mut p = looping(4);
    p.tick(0.0);
    assert_eq!(p.tick(99.0), 0);
    assert_eq!(p.tick(100.0), 1);
    assert_eq!(p.tick(150.0), 1);
    assert_eq!(p.tick(200.0), 2);
}

#[test]
fn leftover_time_carries_over() {
    let mut p = looping(10);
    p.tick(0.0);
    assert_eq!(p.tick(130.0), 1);
    // 70 ms more completes the second interval.
    assert_eq!(p.tick(200.0), 2);
}

#[test]
fn long_gap_catches_up_and_wraps() {
    let mut p = looping(4);
    p.tick(0.0);
    assert_eq!(p.tick(650.0), 2); // 6 steps mod 4
    assert_eq!(p.tick(700.0), 3);
}

#[test]
fn one_shot_holds_last_frame() {
    let mut p = one_shot(3);
    p.tick(0.0);
    assert_eq!(p.tick(100.0), 1);
    assert!(!p.is_finished());
    assert_eq!(p.tick(10_000.0), 2);
    assert!(p.is_finished());
    assert_eq!(p.tick(20_000.0), 2);
}

#[test]
fn clock_going_backwards_restarts_timing() {
    let mut p = looping(4);
    p.tick(1_000.0);
    assert_eq!(p.tick(500.0), 0);
    assert_eq!(p.tick(600.0), 1);
}

#[test]
fn non_positive_duration_never_advances() {
    let mut p = FramePlayer::new(4, 0.0, true);
    p.tick(0.0);
    assert_eq!(p.tick(1_000.0), 0);
}

#[test]
fn reset_rewinds() {
    let mut p = looping(4);
    p.tick(0.0);
    p.tick(250.0);
    p.reset();
    assert_eq!(p.current(), 0);
    assert_eq!(p.tick(900.0), 0);
}

#[test]
fn built_from_clip() {
    let rect = FrameRect { x: 0, y: 0, width: 8, height: 8 };
    let clip = AnimationClip {
        sheet_id: "s".into(),
        name: "wave".into(),
        frames: vec![rect; 3],
        frame_duration_ms: 50.0,
        looping: false,
    };
    let mut p = FramePlayer::from_clip(&clip);
    p.tick(0.0);
    assert_eq!(p.tick(50.0), 1);
    assert_eq!(p.tick(500.0), 2);
    assert!(p.is_finished());
}

#[test]
fn built_from_animation() {
    let anim = AnimationDefinition { name: "idle".into(), frames: vec![0, 1], frame_rate: 5.0, looping: true };
    let mut p = FramePlayer::from_animation(&anim);
    p.tick(0.0);
    assert_eq!(p.tick(200.0), 1);
    assert_eq!(p.tick(400.0), 0);
}

// =============================================================
// PreviewLoop
// =============================================================

#[test]
fn loop_continues_while_handle_alive() {
    let (mut preview, handle) = PreviewLoop::start(looping(2));
    assert_eq!(preview.on_frame(0.0), FrameStep::Continue { frame: 0 });
    assert_eq!(preview.on_frame(100.0), FrameStep::Continue { frame: 1 });
    assert!(handle.is_active());
}

#[test]
fn cancel_stops_rescheduling() {
    let (mut preview, handle) = PreviewLoop::start(looping(2));
    preview.on_frame(0.0);
    handle.cancel();
    assert!(!handle.is_active());
    assert!(preview.is_cancelled());
    assert_eq!(preview.on_frame(100.0), FrameStep::Stop);
}

#[test]
fn dropping_handle_stops_loop() {
    let (mut preview, handle) = PreviewLoop::start(looping(2));
    drop(handle);
    assert_eq!(preview.on_frame(0.0), FrameStep::Stop);
}

#[test]
fn one_shot_draws_last_frame_then_stops() {
    let (mut preview, _handle) = PreviewLoop::start(one_shot(2));
    assert_eq!(preview.on_frame(0.0), FrameStep::Continue { frame: 0 });
    assert_eq!(preview.on_frame(100.0), FrameStep::Continue { frame: 1 });
    assert_eq!(preview.on_frame(116.0), FrameStep::Stop);
}

#[test]
fn single_frame_one_shot_draws_once() {
    let (mut preview, _handle) = PreviewLoop::start(one_shot(1));
    assert_eq!(preview.on_frame(0.0), FrameStep::Continue { frame: 0 });
    assert_eq!(preview.on_frame(16.0), FrameStep::Stop);
    assert_eq!(preview.player().current(), 0);
}
