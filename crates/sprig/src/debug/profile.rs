//! # Profiler — Chrome Trace Output
//!
//! A [`Profiler`] session writes one JSON file loadable by `chrome://tracing`
//! or Perfetto. Timing happens on the calling thread; formatting and file IO
//! happen on a single background worker so the frame never waits on disk.
//!
//! ```ignore
//! let profiler = Profiler::new();
//! profiler.begin_session("Runtime", "profile-runtime.json")?;
//! {
//!     let _scope = profiler.scope("Scene::on_update");
//!     scene.on_update(dt, &mut renderer);
//! }
//! profiler.end_session()?;
//! ```
//!
//! Scopes opened with no active session cost one mutex check and record
//! nothing.

use std::cell::Cell;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use serde::Serialize;

use super::thread_pool::ThreadPool;
use crate::error::ProfileError;

/// One complete ("X" phase) trace event.
#[derive(Debug, Clone, Serialize)]
struct TraceEvent {
    name: String,
    cat: &'static str,
    ph: &'static str,
    /// Microseconds since session start.
    ts: f64,
    dur: f64,
    pid: u32,
    tid: u64,
}

struct TraceWriter {
    out: BufWriter<File>,
    events: usize,
}

impl TraceWriter {
    fn create(path: &Path) -> std::io::Result<Self> {
        let mut out = BufWriter::new(File::create(path)?);
        out.write_all(b"{\"otherData\":{},\"traceEvents\":[")?;
        Ok(Self { out, events: 0 })
    }

    fn write_event(&mut self, event: &TraceEvent) -> std::io::Result<()> {
        if self.events > 0 {
            self.out.write_all(b",")?;
        }
        serde_json::to_writer(&mut self.out, event)?;
        self.events += 1;
        Ok(())
    }

    fn finish(&mut self) -> std::io::Result<()> {
        self.out.write_all(b"]}")?;
        self.out.flush()
    }
}

struct Session {
    name: String,
    path: PathBuf,
    start: Instant,
    writer: Arc<Mutex<TraceWriter>>,
    pool: ThreadPool,
}

pub struct Profiler {
    session: Mutex<Option<Session>>,
}

impl Profiler {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn begin_session(
        &self,
        name: impl Into<String>,
        path: impl AsRef<Path>,
    ) -> Result<(), ProfileError> {
        let mut session = self.lock();
        if let Some(active) = session.as_ref() {
            return Err(ProfileError::SessionActive(active.name.clone()));
        }

        let name = name.into();
        let path = path.as_ref().to_path_buf();
        let writer = TraceWriter::create(&path)?;
        let pool = ThreadPool::new("sprig-profiler", 1)?;

        log::info!("profiling session '{name}' → {}", path.display());
        *session = Some(Session {
            name,
            path,
            start: Instant::now(),
            writer: Arc::new(Mutex::new(writer)),
            pool,
        });
        Ok(())
    }

    /// Drain pending records, close the JSON document, stop the worker.
    pub fn end_session(&self) -> Result<(), ProfileError> {
        let Some(mut session) = self.lock().take() else {
            log::warn!("end_session called with no active profiling session");
            return Ok(());
        };
        session.pool.stop();
        let mut writer = session
            .writer
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.finish()?;
        log::info!(
            "profiling session '{}' closed: {} events in {}",
            session.name,
            writer.events,
            session.path.display()
        );
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn session_name(&self) -> Option<String> {
        self.lock().as_ref().map(|s| s.name.clone())
    }

    /// Time from now until the returned guard drops.
    pub fn scope(&self, name: impl Into<String>) -> ProfileScope<'_> {
        ProfileScope {
            profiler: self,
            name: Some(name.into()),
            start: Instant::now(),
        }
    }

    fn record(&self, name: String, start: Instant, end: Instant) {
        let session = self.lock();
        let Some(session) = session.as_ref() else {
            return;
        };
        let event = TraceEvent {
            name,
            cat: "function",
            ph: "X",
            ts: micros_between(session.start, start),
            dur: micros_between(start, end),
            pid: 0,
            tid: current_thread_id(),
        };
        let writer = session.writer.clone();
        session.pool.enqueue(move || {
            let mut writer = writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Err(e) = writer.write_event(&event) {
                log::error!("failed to write profile event '{}': {e}", event.name);
            }
        });
    }
}

impl Default for Profiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Profiler {
    fn drop(&mut self) {
        if !self.is_active() {
            return;
        }
        if let Err(e) = self.end_session() {
            log::error!("failed to close profiling session: {e}");
        }
    }
}

/// Records one trace event when dropped.
pub struct ProfileScope<'p> {
    profiler: &'p Profiler,
    name: Option<String>,
    start: Instant,
}

impl ProfileScope<'_> {
    /// End the scope early.
    pub fn stop(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if let Some(name) = self.name.take() {
            self.profiler.record(name, self.start, Instant::now());
        }
    }
}

impl Drop for ProfileScope<'_> {
    fn drop(&mut self) {
        self.finish();
    }
}

fn micros_between(from: Instant, to: Instant) -> f64 {
    to.saturating_duration_since(from).as_secs_f64() * 1_000_000.0
}

/// Small, stable per-thread ids for the trace viewer.
fn current_thread_id() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static ID: Cell<u64> = const { Cell::new(0) };
    }
    ID.with(|id| {
        if id.get() == 0 {
            id.set(NEXT.fetch_add(1, Ordering::Relaxed));
        }
        id.get()
    })
}
