use std::thread::{self, JoinHandle};

use crate::error::ProfileError;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Fixed set of worker threads fed by one flume channel.
///
/// [`stop`](Self::stop) closes the channel, lets the workers drain what is
/// already queued, then joins them. Dropping the pool stops it.
pub struct ThreadPool {
    name: String,
    sender: Option<flume::Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(name: impl Into<String>, size: usize) -> Result<Self, ProfileError> {
        let name = name.into();
        let (sender, receiver) = flume::unbounded::<Job>();

        let mut workers = Vec::with_capacity(size.max(1));
        for i in 0..size.max(1) {
            let receiver = receiver.clone();
            let handle = thread::Builder::new()
                .name(format!("{name}-{i}"))
                .spawn(move || {
                    // recv fails once every sender is gone and the queue is empty.
                    while let Ok(job) = receiver.recv() {
                        job();
                    }
                })
                .map_err(|e| ProfileError::Worker(e.to_string()))?;
            workers.push(handle);
        }

        log::debug!("thread pool '{name}' started with {} workers", workers.len());
        Ok(Self {
            name,
            sender: Some(sender),
            workers,
        })
    }

    /// Queue a job. Returns `false` once the pool has been stopped.
    pub fn enqueue(&self, job: impl FnOnce() + Send + 'static) -> bool {
        match &self.sender {
            Some(sender) => sender.send(Box::new(job)).is_ok(),
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.sender.is_some()
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Stop accepting work, drain the queue, join every worker.
    pub fn stop(&mut self) {
        if self.sender.take().is_none() {
            return;
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("a worker in thread pool '{}' panicked", self.name);
            }
        }
        log::debug!("thread pool '{}' stopped", self.name);
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop();
    }
}
