//! Single-slot hand-off of spectrum frames to the display
//!
//! The producer offers a frame; if the display has not taken the previous
//! one yet, the new frame is dropped and the old one stays intact. Frames
//! are never queued, so the display always shows the oldest undrawn frame
//! and never falls behind.

use crossbeam_channel::{bounded, Receiver, Sender, TryRecvError, TrySendError};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Log a dropped-frame warning once every this many drops.
const DROP_LOG_INTERVAL: u64 = 100;

/// A power spectrum ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFrame {
    /// Power per bin in dB
    pub power_db: Vec<f32>,
    /// Whether DC is already in the middle
    pub centered: bool,
    /// Producer sequence number
    pub sequence: u64,
}

impl SpectrumFrame {
    pub fn new(power_db: Vec<f32>, centered: bool) -> Self {
        Self {
            power_db,
            centered,
            sequence: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.power_db.len()
    }

    pub fn is_empty(&self) -> bool {
        self.power_db.is_empty()
    }
}

#[derive(Debug, Default)]
struct Counters {
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Delivery counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    pub delivered: u64,
    pub dropped: u64,
}

/// Shared handle to the slot. Clones refer to the same slot.
#[derive(Debug, Clone)]
pub struct FrameMailbox {
    tx: Sender<SpectrumFrame>,
    rx: Receiver<SpectrumFrame>,
    counters: Arc<Counters>,
}

impl Default for FrameMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameMailbox {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        Self {
            tx,
            rx,
            counters: Arc::new(Counters::default()),
        }
    }

    /// Place `frame` in the slot. Returns `false` if the slot was occupied
    /// and the frame was dropped.
    pub fn offer(&self, frame: SpectrumFrame) -> bool {
        match self.tx.try_send(frame) {
            Ok(()) => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                let dropped = self.counters.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped % DROP_LOG_INTERVAL == 1 {
                    tracing::warn!("Display busy; {} spectrum frames dropped so far", dropped);
                }
                false
            }
        }
    }

    /// Take the waiting frame, freeing the slot.
    pub fn take(&self) -> Option<SpectrumFrame> {
        match self.rx.try_recv() {
            Ok(frame) => Some(frame),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn is_occupied(&self) -> bool {
        !self.rx.is_empty()
    }

    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            dropped: self.counters.dropped.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(value: f32) -> SpectrumFrame {
        SpectrumFrame::new(vec![value; 4], true)
    }

    #[test]
    fn test_second_frame_dropped_first_intact() {
        let mailbox = FrameMailbox::new();
        assert!(mailbox.offer(frame(1.0)));
        assert!(mailbox.is_occupied());
        assert!(!mailbox.offer(frame(2.0)));

        assert_eq!(mailbox.take(), Some(frame(1.0)));
        assert!(!mailbox.is_occupied());
        assert_eq!(mailbox.take(), None);
        assert_eq!(
            mailbox.stats(),
            MailboxStats {
                delivered: 1,
                dropped: 1
            }
        );
    }

    #[test]
    fn test_slot_reusable_after_take() {
        let mailbox = FrameMailbox::new();
        let producer = mailbox.clone();
        producer.offer(frame(1.0));
        mailbox.take();
        assert!(producer.offer(frame(3.0)));
        assert_eq!(mailbox.take().map(|f| f.power_db[0]), Some(3.0));
    }

    #[test]
    fn test_cross_thread_offer() {
        let mailbox = FrameMailbox::new();
        let producer = mailbox.clone();
        std::thread::spawn(move || {
            for i in 0..10 {
                producer.offer(frame(i as f32));
            }
        })
        .join()
        .unwrap();

        // Only the first one made it
        assert_eq!(mailbox.take().map(|f| f.power_db[0]), Some(0.0));
        assert_eq!(mailbox.stats().dropped, 9);
    }
}
