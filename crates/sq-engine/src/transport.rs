//! Timeline transport and playhead

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sq_core::TimelineLayout;

/// Play/stop state of the timeline.
///
/// The liveness flag is shared with playhead poll loops; once it drops,
/// polling yields `None`.
#[derive(Debug, Default)]
pub struct Transport {
    playing: Arc<AtomicBool>,
    started_at: f64,
}

impl Transport {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.playing.load(Ordering::Relaxed)
    }

    /// Start playback at host time `now`
    pub fn start(&mut self, now: f64) {
        self.started_at = now;
        self.playing.store(true, Ordering::Relaxed);
        log::debug!("Transport started at t={:.3}", now);
    }

    pub fn stop(&mut self) {
        self.playing.store(false, Ordering::Relaxed);
        log::debug!("Transport stopped");
    }

    /// Host time playback started at
    pub fn started_at(&self) -> f64 {
        self.started_at
    }

    /// Shared liveness flag for poll loops
    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.playing)
    }

    /// Seconds since start, `None` when stopped
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        self.is_playing()
            .then(|| (now - self.started_at).max(0.0))
    }

    /// Playhead x-coordinate, `None` when stopped
    pub fn playhead_x(&self, layout: &TimelineLayout, now: f64) -> Option<f64> {
        self.elapsed(now).map(|e| layout.playhead_x(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playhead_follows_clock() {
        let layout = TimelineLayout::default();
        let mut transport = Transport::new();
        assert_eq!(transport.playhead_x(&layout, 1.0), None);

        transport.start(2.0);
        assert_eq!(transport.playhead_x(&layout, 2.0), Some(50.0));
        assert_eq!(transport.playhead_x(&layout, 3.5), Some(200.0));

        transport.stop();
        assert_eq!(transport.playhead_x(&layout, 4.0), None);
    }

    #[test]
    fn test_liveness_flag_is_shared() {
        let mut transport = Transport::new();
        let flag = transport.liveness();
        transport.start(0.0);
        assert!(flag.load(Ordering::Relaxed));
        transport.stop();
        assert!(!flag.load(Ordering::Relaxed));
    }
}
