//! Input/output level meter polling

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use sq_core::{LevelMeter, MeterSettings};

/// Fill fractions (0-1) of both meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterReading {
    pub input: f64,
    pub output: f64,
}

/// Result of one meter poll
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeterPoll {
    /// Liveness flag dropped; stop polling
    Stopped,
    /// Inside the update interval; keep the previous display
    Throttled,
    Updated(MeterReading),
}

/// Input and output meters sharing one liveness flag
#[derive(Debug)]
pub struct MeterBank {
    input: LevelMeter,
    output: LevelMeter,
    live: Arc<AtomicBool>,
}

impl MeterBank {
    pub fn new(settings: MeterSettings) -> Self {
        Self {
            input: LevelMeter::new(settings),
            output: LevelMeter::new(settings),
            live: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start(&mut self) {
        self.input.reset();
        self.output.reset();
        self.live.store(true, Ordering::Relaxed);
    }

    pub fn stop(&self) {
        self.live.store(false, Ordering::Relaxed);
    }

    pub fn is_live(&self) -> bool {
        self.live.load(Ordering::Relaxed)
    }

    pub fn liveness(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.live)
    }

    /// Feed one 8-bit time-domain frame per meter
    pub fn poll(
        &mut self,
        timestamp_ms: f64,
        input_frame: &[u8],
        output_frame: &[u8],
    ) -> MeterPoll {
        if !self.is_live() {
            return MeterPoll::Stopped;
        }
        match (
            self.input.update(timestamp_ms, input_frame),
            self.output.update(timestamp_ms, output_frame),
        ) {
            (Some(input), Some(output)) => MeterPoll::Updated(MeterReading { input, output }),
            _ => MeterPoll::Throttled,
        }
    }

    pub fn reading(&self) -> MeterReading {
        MeterReading {
            input: self.input.fill(),
            output: self.output.fill(),
        }
    }
}

impl Default for MeterBank {
    fn default() -> Self {
        Self::new(MeterSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_poll_requires_liveness() {
        let mut meters = MeterBank::default();
        assert_eq!(meters.poll(0.0, &[0; 8], &[0; 8]), MeterPoll::Stopped);

        meters.start();
        match meters.poll(0.0, &[192, 64], &[128, 128]) {
            MeterPoll::Updated(reading) => {
                // rms 0.5 scaled by 3, clamped
                assert_relative_eq!(reading.input, 1.0);
                assert_relative_eq!(reading.output, 0.0);
            }
            other => panic!("expected update, got {other:?}"),
        }
        assert_eq!(meters.poll(20.0, &[0; 8], &[0; 8]), MeterPoll::Throttled);

        meters.stop();
        assert_eq!(meters.poll(200.0, &[0; 8], &[0; 8]), MeterPoll::Stopped);
    }
}
