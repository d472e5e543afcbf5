//! # Frame Clock
//!
//! [`FrameScheduler`] backed by a shared pending flag.
//!
//! The poller requests a frame; the runtime loop ticks at the display rate
//! and runs the frame callback only when a request is pending. A request is
//! consumed by the tick that serves it, so the callback runs at most once
//! per tick and stops entirely once the poller stops re-requesting.
//!
//! ## Usage
//!
//! ```
//! use teleop_input::input::frame_clock::FrameClock;
//! use teleop_input::input::host::FrameScheduler;
//!
//! let clock = FrameClock::new();
//! let mut scheduler = clock.clone();
//!
//! assert!(!clock.take_request());
//! scheduler.request_frame();
//! scheduler.request_frame(); // coalesced
//! assert!(clock.take_request());
//! assert!(!clock.take_request());
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, Interval, MissedTickBehavior};

use super::host::FrameScheduler;

/// Pending-frame flag shared between the poller and the runtime loop.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    pending: Arc<AtomicBool>,
}

impl FrameClock {
    /// Creates a clock with no pending request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes the pending request. Returns true if there was one.
    pub fn take_request(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }
}

impl FrameScheduler for FrameClock {
    fn request_frame(&mut self) {
        self.pending.store(true, Ordering::Release);
    }
}

/// Period of one display frame at `rate_hz`.
///
/// # Examples
///
/// ```
/// use teleop_input::input::frame_clock::frame_period;
/// use std::time::Duration;
///
/// assert_eq!(frame_period(50), Duration::from_millis(20));
/// ```
#[must_use]
pub fn frame_period(rate_hz: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(rate_hz.max(1)))
}

/// Tokio interval ticking once per display frame.
///
/// Late ticks are skipped rather than bursted, so a stalled loop never runs
/// several frames back to back.
///
/// Must be called from within a tokio runtime.
#[must_use]
pub fn frame_interval(rate_hz: u32) -> Interval {
    let mut ticker = interval(frame_period(rate_hz));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    ticker
}
