use std::collections::VecDeque;

use log::{debug, warn};

use cybex_core::Marker;

/// Destination for named, implicitly-timestamped marker events.
///
/// Pushes are fire-and-forget; the sink stamps its own receive time.
pub trait MarkerSink {
    fn push_marker(&mut self, name: &str);
}

/// Fallback sink when no recording stream is configured: markers are logged
/// and dropped, never fatal.
pub struct NullMarkerSink;

impl MarkerSink for NullMarkerSink {
    fn push_marker(&mut self, name: &str) {
        debug!("marker {name} dropped (no recording sink configured)");
    }
}

/// FIFO of pending markers, drained one per tick.
///
/// Enqueue is unconditional and never rejects. Sink latency is bounded by
/// queue depth times the tick period.
#[derive(Default)]
pub struct MarkerQueue {
    pending: VecDeque<Marker>,
}

impl MarkerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, marker: Marker) {
        self.pending.push_back(marker);
    }

    /// Enqueues an externally supplied name; unknown names are warned and
    /// dropped without halting the queue.
    pub fn enqueue_named(&mut self, name: &str) -> bool {
        match Marker::from_name(name) {
            Some(marker) => {
                self.enqueue(marker);
                true
            }
            None => {
                warn!("unrecognized marker name {name:?} dropped");
                false
            }
        }
    }

    /// Dispatches at most one pending marker to the sink.
    pub fn drain_one(&mut self, sink: &mut dyn MarkerSink) -> Option<Marker> {
        let marker = self.pending.pop_front()?;
        sink.push_marker(marker.name());
        debug!("marker {} dispatched", marker.name());
        Some(marker)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct RecordingSink {
        names: Vec<String>,
    }

    impl MarkerSink for RecordingSink {
        fn push_marker(&mut self, name: &str) {
            self.names.push(name.to_string());
        }
    }

    #[test]
    fn drains_one_marker_per_call_in_fifo_order() {
        let mut queue = MarkerQueue::new();
        let mut sink = RecordingSink::default();
        queue.enqueue(Marker::Start);
        queue.enqueue(Marker::MindfulnessBegin);
        queue.enqueue(Marker::Sickness);

        assert_eq!(queue.drain_one(&mut sink), Some(Marker::Start));
        assert_eq!(sink.names, vec!["Start"]);
        queue.drain_one(&mut sink);
        queue.drain_one(&mut sink);
        assert_eq!(sink.names, vec!["Start", "MindfulnessBegin", "Sickness"]);
        assert_eq!(queue.drain_one(&mut sink), None);
    }

    #[test]
    fn named_enqueue_rejects_unknown_names() {
        let mut queue = MarkerQueue::new();
        assert!(queue.enqueue_named("RestBegin"));
        assert!(!queue.enqueue_named("NotAMarker"));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn drain_on_empty_queue_is_a_no_op() {
        let mut queue = MarkerQueue::new();
        let mut sink = RecordingSink::default();
        assert_eq!(queue.drain_one(&mut sink), None);
        assert!(sink.names.is_empty());
    }
}
