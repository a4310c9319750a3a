//! Recording sinks
//!
//! A `RecordingSink` records every frame it accepts and can be switched into a
//! failing state, which is how a client disconnect looks to the relay.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use petcardio::backend::realtime::{Frame, Sink, SinkError};

#[derive(Clone, Default)]
pub struct SinkRecorder {
    frames: Arc<Mutex<Vec<String>>>,
    failing: Arc<AtomicBool>,
    attempts: Arc<AtomicUsize>,
}

impl SinkRecorder {
    pub fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    /// Timestamps of the readings received, in arrival order
    pub fn timestamps(&self) -> Vec<i64> {
        self.frames()
            .iter()
            .map(|frame| {
                let value: serde_json::Value = serde_json::from_str(frame).unwrap();
                value["timestamp"].as_i64().unwrap()
            })
            .collect()
    }

    /// Make every following send fail
    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

pub struct RecordingSink {
    recorder: SinkRecorder,
}

impl Sink for RecordingSink {
    fn send(&self, frame: &Frame) -> Result<(), SinkError> {
        self.recorder.attempts.fetch_add(1, Ordering::SeqCst);
        if self.recorder.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Closed);
        }
        self.recorder.frames.lock().unwrap().push(frame.to_string());
        Ok(())
    }
}

pub fn recording_sink() -> (RecordingSink, SinkRecorder) {
    let recorder = SinkRecorder::default();
    (RecordingSink { recorder: recorder.clone() }, recorder)
}

/// Sink that is born broken
pub fn failing_sink() -> (RecordingSink, SinkRecorder) {
    let (sink, recorder) = recording_sink();
    recorder.fail();
    (sink, recorder)
}
