//! Decoded audio bound to clip slots
//!
//! Snapshots only carry clip placements. Buffers stay here, indexed by clip
//! slot, so undoing and redoing a clip edit finds its audio again.

use crate::{AudioHandle, DecodedAudio};

#[derive(Debug, Default)]
pub struct AudioPool {
    slots: Vec<Option<DecodedAudio>>,
}

impl AudioPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind audio to a freshly added clip slot.
    ///
    /// Slots at or beyond `clip` belong to clips discarded with the redo path
    /// and are dropped first.
    pub fn bind(&mut self, clip: usize, audio: DecodedAudio) {
        self.slots.truncate(clip);
        self.slots.resize(clip, None);
        self.slots.push(Some(audio));
    }

    /// Audio of a clip slot, if it has any
    pub fn get(&self, clip: usize) -> Option<&DecodedAudio> {
        self.slots.get(clip).and_then(Option::as_ref)
    }

    pub fn handle(&self, clip: usize) -> Option<AudioHandle> {
        self.get(clip).map(|a| a.handle)
    }

    /// Number of slots holding audio
    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn audio(id: u64) -> DecodedAudio {
        DecodedAudio {
            handle: AudioHandle(id),
            duration_secs: 1.0,
        }
    }

    #[test]
    fn test_bind_and_rebind() {
        let mut pool = AudioPool::new();
        pool.bind(0, audio(1));
        pool.bind(1, audio(2));
        assert_eq!(pool.handle(1), Some(AudioHandle(2)));

        // Clip 1 was undone and a new clip took its slot
        pool.bind(1, audio(3));
        assert_eq!(pool.handle(1), Some(AudioHandle(3)));
        assert_eq!(pool.bound_count(), 2);
    }

    #[test]
    fn test_gap_slots_are_empty() {
        let mut pool = AudioPool::new();
        pool.bind(2, audio(7));
        assert_eq!(pool.get(0), None);
        assert_eq!(pool.get(1), None);
        assert_eq!(pool.handle(2), Some(AudioHandle(7)));
        assert_eq!(pool.get(3), None);
    }
}
