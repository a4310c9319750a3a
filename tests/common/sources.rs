//! Scripted reading source
//!
//! Each call to `subscribe` consumes the next step of the script. Once the
//! script is exhausted, subscriptions stay open without yielding anything.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};

use petcardio::backend::source::{ReadingSource, ReadingStream, SourceError};
use petcardio::shared::Reading;

pub enum Step {
    /// `subscribe` fails
    Fail,
    /// The subscription yields these readings, then ends
    Finite(Vec<Reading>),
    /// The subscription yields these readings, then stays open
    Open(Vec<Reading>),
    /// The subscription yields these readings, then a stream error
    Broken(Vec<Reading>),
}

#[derive(Default)]
pub struct ScriptedSource {
    script: Mutex<VecDeque<Step>>,
    subscriptions: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            script: Mutex::new(steps.into()),
            subscriptions: AtomicUsize::new(0),
        }
    }

    /// Number of `subscribe` calls so far
    pub fn subscriptions(&self) -> usize {
        self.subscriptions.load(Ordering::SeqCst)
    }
}

fn items(readings: Vec<Reading>) -> stream::Iter<std::vec::IntoIter<Result<Reading, SourceError>>> {
    let items: Vec<Result<Reading, SourceError>> = readings.into_iter().map(Ok).collect();
    stream::iter(items)
}

#[async_trait]
impl ReadingSource for ScriptedSource {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn latest(&self) -> Result<Option<Reading>, SourceError> {
        Ok(None)
    }

    async fn subscribe(&self) -> Result<ReadingStream, SourceError> {
        self.subscriptions.fetch_add(1, Ordering::SeqCst);
        let step = self.script.lock().unwrap().pop_front();
        match step {
            None => Ok(stream::pending().boxed()),
            Some(Step::Fail) => Err(SourceError::Unavailable("scripted failure".to_string())),
            Some(Step::Finite(readings)) => Ok(items(readings).boxed()),
            Some(Step::Open(readings)) => Ok(items(readings).chain(stream::pending()).boxed()),
            Some(Step::Broken(readings)) => Ok(items(readings)
                .chain(stream::once(async {
                    Err(SourceError::Cancelled("scripted cancel".to_string()))
                }))
                .boxed()),
        }
    }
}
