//! Periodic background save.
//!
//! At most one worker thread exists per [`AutoSave`]. The worker blocks on its stop channel
//! with a timeout equal to the interval, so turning auto-save off wakes it immediately
//! instead of after the next sleep.

use crate::document::{self, SharedDocument};
use crate::persist::PersistError;
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default wake-up interval.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// What a wake-up did, reported back to the UI thread.
#[derive(Debug)]
pub enum AutoSaveEvent {
    Saved(PathBuf),
    Failed(PersistError),
}

struct Worker {
    stop_tx: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct AutoSave {
    interval: Duration,
    worker: Option<Worker>,
    events_tx: Sender<AutoSaveEvent>,
    events_rx: Receiver<AutoSaveEvent>,
}

impl Default for AutoSave {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl AutoSave {
    pub fn new(interval: Duration) -> Self {
        let (events_tx, events_rx) = mpsc::channel();
        Self { interval, worker: None, events_tx, events_rx }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawn the worker. Returns `false` without spawning if one is already running.
    pub fn start(&mut self, doc: &SharedDocument) -> bool {
        if self.worker.is_some() {
            return false;
        }
        let (stop_tx, stop_rx) = mpsc::channel();
        let doc = SharedDocument::clone(doc);
        let events = self.events_tx.clone();
        let interval = self.interval;

        let handle = thread::spawn(move || run_worker(&doc, interval, &stop_rx, &events));
        self.worker = Some(Worker { stop_tx, handle });
        tracing::info!(interval_secs = interval.as_secs_f64(), "auto-save started");
        true
    }

    /// Stop and join the worker, if any.
    pub fn stop(&mut self) {
        let Some(worker) = self.worker.take() else { return; };
        // A send error means the worker already exited.
        let _ = worker.stop_tx.send(());
        if worker.handle.join().is_err() {
            tracing::error!("auto-save worker panicked");
        }
        tracing::info!("auto-save stopped");
    }

    /// Flip the enabled state; returns the new state.
    pub fn toggle(&mut self, doc: &SharedDocument) -> bool {
        if self.is_enabled() {
            self.stop();
        } else {
            self.start(doc);
        }
        self.is_enabled()
    }

    /// Drain the events reported since the last call.
    pub fn poll_events(&self) -> Vec<AutoSaveEvent> {
        self.events_rx.try_iter().collect()
    }
}

impl Drop for AutoSave {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run_worker(
    doc: &SharedDocument,
    interval: Duration,
    stop_rx: &Receiver<()>,
    events: &Sender<AutoSaveEvent>,
) {
    loop {
        match stop_rx.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => return,
        }
        let Some(result) = tick(doc, interval, Instant::now()) else { continue; };
        let event = match result {
            Ok(path) => AutoSaveEvent::Saved(path),
            Err(e) => {
                tracing::warn!(error = %e, "auto-save failed");
                AutoSaveEvent::Failed(e)
            }
        };
        if events.send(event).is_err() {
            return;
        }
    }
}

/// One wake-up: save if the document has a path, is dirty, and at least `interval` has
/// passed since it was last saved. Returns `None` when nothing was attempted.
pub fn tick(
    doc: &SharedDocument,
    interval: Duration,
    now: Instant,
) -> Option<Result<PathBuf, PersistError>> {
    let mut doc = document::lock(doc);
    let path = doc.path()?.to_path_buf();
    if !doc.is_dirty() {
        return None;
    }
    if let Some(last) = doc.last_saved() {
        if now.saturating_duration_since(last) < interval {
            return None;
        }
    }
    tracing::debug!(path = %path.display(), "auto-save tick");
    Some(doc.save_to(&path).map(|()| path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use std::fs;
    use std::sync::{Arc, Mutex};

    fn shared(doc: Document) -> SharedDocument {
        Arc::new(Mutex::new(doc))
    }

    fn saved_doc(dir: &tempfile::TempDir) -> (SharedDocument, PathBuf) {
        let path = dir.path().join("auto.py");
        let mut doc = Document::new();
        doc.insert(0, "v1");
        doc.save_to(&path).unwrap();
        (shared(doc), path)
    }

    #[test]
    fn tick_without_path_does_nothing() {
        let mut doc = Document::new();
        doc.insert(0, "unsaved");
        let doc = shared(doc);
        let later = Instant::now() + Duration::from_secs(3600);
        assert!(tick(&doc, Duration::ZERO, later).is_none());
    }

    #[test]
    fn tick_skips_clean_document() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, _) = saved_doc(&dir);
        let later = Instant::now() + Duration::from_secs(3600);
        assert!(tick(&doc, Duration::from_secs(1), later).is_none());
    }

    #[test]
    fn tick_waits_for_the_interval() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, path) = saved_doc(&dir);
        document::lock(&doc).insert(2, " v2");
        let interval = Duration::from_secs(300);

        assert!(tick(&doc, interval, Instant::now()).is_none());
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1");

        let later = Instant::now() + interval;
        let saved = tick(&doc, interval, later).unwrap().unwrap();
        assert_eq!(saved, path);
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1 v2");
        assert!(!document::lock(&doc).is_dirty());
    }

    #[test]
    fn worker_saves_dirty_document() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, path) = saved_doc(&dir);
        document::lock(&doc).insert(2, " edited");
        thread::sleep(Duration::from_millis(40));

        let mut auto = AutoSave::new(Duration::from_millis(30));
        assert!(auto.start(&doc));

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
            events = auto.poll_events();
        }
        auto.stop();

        assert!(matches!(events.first(), Some(AutoSaveEvent::Saved(p)) if *p == path));
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1 edited");
    }

    #[test]
    fn only_one_worker_at_a_time() {
        let doc = shared(Document::new());
        let mut auto = AutoSave::new(Duration::from_secs(60));
        assert!(auto.start(&doc));
        assert!(!auto.start(&doc));
        assert!(auto.is_enabled());
        auto.stop();
        assert!(!auto.is_enabled());
        assert!(auto.start(&doc));
    }

    #[test]
    fn stopping_wakes_the_worker_without_saving() {
        let dir = tempfile::tempdir().unwrap();
        let (doc, path) = saved_doc(&dir);
        document::lock(&doc).insert(2, " never");

        let mut auto = AutoSave::new(Duration::from_secs(60));
        assert!(auto.toggle(&doc));
        let begun = Instant::now();
        assert!(!auto.toggle(&doc));
        assert!(begun.elapsed() < Duration::from_secs(5));

        assert!(auto.poll_events().is_empty());
        assert_eq!(fs::read_to_string(&path).unwrap(), "v1");
    }
}
