//! Out-of-band diagnostics: a small worker pool and a Chrome-trace profiler
//! built on it. Nothing here runs on the frame-critical path.

pub mod profile;
pub mod thread_pool;

pub use profile::{ProfileScope, Profiler};
pub use thread_pool::ThreadPool;
