//! Frame stepping for sprite-sheet previews.
//!
//! The host owns the animation-frame scheduling: each callback passes the
//! current timestamp to [`PreviewLoop::on_frame`] and schedules the next
//! callback only when it gets [`FrameStep::Continue`]. The loop stops when its
//! [`PlaybackHandle`] is cancelled or dropped, which is how a dismounted view
//! tears it down, and after a non-looping animation has shown its last frame.

#[cfg(test)]
#[path = "playback_test.rs"]
mod playback_test;

use std::cell::Cell;
use std::rc::Rc;

use crate::renderer::AnimationClip;
use crate::sheet::AnimationDefinition;

/// Advances an index into an animation's frame list against wall-clock time.
#[derive(Debug, Clone, PartialEq)]
pub struct FramePlayer {
    frame_count: usize,
    frame_duration_ms: f64,
    looping: bool,
    index: usize,
    last_advance: Option<f64>,
}

impl FramePlayer {
    /// A zero frame count is treated as one frame; a non-positive duration never advances.
    #[must_use]
    pub fn new(frame_count: usize, frame_duration_ms: f64, looping: bool) -> Self {
        Self {
            frame_count: frame_count.max(1),
            frame_duration_ms,
            looping,
            index: 0,
            last_advance: None,
        }
    }

    #[must_use]
    pub fn from_clip(clip: &AnimationClip) -> Self {
        Self::new(clip.frames.len(), clip.frame_duration_ms, clip.looping)
    }

    #[must_use]
    pub fn from_animation(animation: &AnimationDefinition) -> Self {
        Self::new(animation.frames.len(), animation.frame_duration_ms(), animation.looping)
    }

    /// Advance for the time elapsed since the last advance and return the current index.
    ///
    /// The first call only starts the clock. After a long gap every missed
    /// frame is stepped over at once; the leftover time carries into the next
    /// call. A timestamp earlier than the last advance restarts the clock.
    pub fn tick(&mut self, now_ms: f64) -> usize {
        let Some(last) = self.last_advance else {
            self.last_advance = Some(now_ms);
            return self.index;
        };
        let elapsed = now_ms - last;
        if elapsed < 0.0 {
            self.last_advance = Some(now_ms);
            return self.index;
        }
        if !(self.frame_duration_ms > 0.0 && self.frame_duration_ms.is_finite()) || elapsed < self.frame_duration_ms {
            return self.index;
        }

        let steps = (elapsed / self.frame_duration_ms).floor();
        self.last_advance = Some(last + steps * self.frame_duration_ms);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let wrapped = (steps % self.frame_count as f64) as usize;
        if self.looping {
            self.index = (self.index + wrapped) % self.frame_count;
        } else {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
            let capped = steps.min(self.frame_count as f64) as usize;
            self.index = (self.index + capped).min(self.frame_count - 1);
        }
        self.index
    }

    #[must_use]
    pub fn current(&self) -> usize {
        self.index
    }

    /// A non-looping player resting on its last frame.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        !self.looping && self.index + 1 >= self.frame_count
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.last_advance = None;
    }
}

/// What the host should do after an animation-frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStep {
    /// Draw `frame` and schedule another callback.
    Continue { frame: usize },
    /// Do not reschedule.
    Stop,
}

/// Cancels its [`PreviewLoop`] when cancelled or dropped.
#[derive(Debug)]
pub struct PlaybackHandle {
    cancelled: Rc<Cell<bool>>,
}

impl PlaybackHandle {
    pub fn cancel(&self) {
        if !self.cancelled.replace(true) {
            tracing::debug!("preview playback cancelled");
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.cancelled.get()
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

/// A cancellable preview of one animation.
#[derive(Debug)]
pub struct PreviewLoop {
    player: FramePlayer,
    cancelled: Rc<Cell<bool>>,
    started: bool,
}

impl PreviewLoop {
    /// Start a loop. Keep the handle alive for as long as the preview is on screen.
    #[must_use]
    pub fn start(player: FramePlayer) -> (Self, PlaybackHandle) {
        let cancelled = Rc::new(Cell::new(false));
        let handle = PlaybackHandle { cancelled: Rc::clone(&cancelled) };
        (Self { player, cancelled, started: false }, handle)
    }

    /// Handle one animation-frame callback.
    pub fn on_frame(&mut self, now_ms: f64) -> FrameStep {
        if self.cancelled.get() {
            return FrameStep::Stop;
        }
        // The final frame of a one-shot animation is drawn once before stopping.
        let was_finished = self.player.is_finished() && self.started;
        self.started = true;
        let frame = self.player.tick(now_ms);
        if was_finished {
            return FrameStep::Stop;
        }
        FrameStep::Continue { frame }
    }

    #[must_use]
    pub fn player(&self) -> &FramePlayer {
        &self.player
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.get()
    }
}
