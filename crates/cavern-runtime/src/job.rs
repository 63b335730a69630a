use std::sync::Arc;

use crossbeam_channel::{Receiver, TryRecvError, bounded};
use rayon::{ThreadPool, ThreadPoolBuilder};

/// Result slot of one unit of work running on [`Workers`].
///
/// The job owns whatever buffers it was given until it finishes; they come
/// back through [`JobHandle::into_inner`].
pub struct JobHandle<T> {
    rx: Receiver<T>,
    result: Option<T>,
}

impl<T> JobHandle<T> {
    fn new(rx: Receiver<T>) -> Self {
        Self { rx, result: None }
    }

    /// Non-blocking poll.
    pub fn is_completed(&mut self) -> bool {
        if self.result.is_some() {
            return true;
        }
        match self.rx.try_recv() {
            Ok(value) => {
                self.result = Some(value);
                true
            }
            Err(TryRecvError::Empty) => false,
            Err(TryRecvError::Disconnected) => panic!("worker dropped its job result"),
        }
    }

    /// Blocks until the job has finished. Safe to call more than once.
    pub fn complete(&mut self) {
        if self.result.is_none() {
            self.result = Some(self.recv_blocking());
        }
    }

    /// Blocks if needed and returns the job's output.
    pub fn into_inner(mut self) -> T {
        match self.result.take() {
            Some(value) => value,
            None => self.recv_blocking(),
        }
    }

    fn recv_blocking(&self) -> T {
        match self.rx.recv() {
            Ok(value) => value,
            Err(_) => panic!("worker dropped its job result"),
        }
    }
}

/// Shared rayon pool that executes field and mesh jobs.
#[derive(Clone)]
pub struct Workers {
    pool: Arc<ThreadPool>,
}

impl Workers {
    pub fn new(threads: usize) -> Self {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads.max(1))
            .thread_name(|i| format!("cavern-worker-{i}"))
            .build()
            .expect("worker pool");
        Self {
            pool: Arc::new(pool),
        }
    }

    /// One thread per core, capped at `max`.
    pub fn with_max_threads(max: usize) -> Self {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(8);
        Self::new(cores.min(max))
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn spawn<T, F>(&self, job: F) -> JobHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (tx, rx) = bounded(1);
        self.pool.spawn(move || {
            let _ = tx.send(job());
        });
        JobHandle::new(rx)
    }
}

/// Fixed number of pipeline slots shared by every chunk record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerBudget {
    capacity: usize,
    available: usize,
}

impl WorkerBudget {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "worker budget must be positive");
        Self {
            capacity,
            available: capacity,
        }
    }

    pub fn try_acquire(&mut self) -> bool {
        if self.available == 0 {
            return false;
        }
        self.available -= 1;
        true
    }

    pub fn release(&mut self) {
        assert!(
            self.available < self.capacity,
            "worker slot released more often than acquired"
        );
        self.available += 1;
    }

    #[inline]
    pub fn available(&self) -> usize {
        self.available
    }

    #[inline]
    pub fn in_use(&self) -> usize {
        self.capacity - self.available
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_returns_job_output() {
        let workers = Workers::new(2);
        let mut job = workers.spawn(|| 21 * 2);
        job.complete();
        job.complete();
        assert!(job.is_completed());
        assert_eq!(job.into_inner(), 42);
    }

    #[test]
    fn handle_moves_buffers_back() {
        let workers = Workers::new(1);
        let buf = vec![0u8; 16];
        let ptr = buf.as_ptr();
        let job = workers.spawn(move || {
            let mut buf = buf;
            buf[0] = 7;
            buf
        });
        let back = job.into_inner();
        assert_eq!(back[0], 7);
        assert_eq!(back.as_ptr(), ptr);
    }

    #[test]
    fn budget_tracks_slots() {
        let mut budget = WorkerBudget::new(2);
        assert!(budget.try_acquire());
        assert!(budget.try_acquire());
        assert!(!budget.try_acquire());
        assert_eq!(budget.in_use(), 2);
        budget.release();
        assert_eq!(budget.available(), 1);
    }

    #[test]
    #[should_panic(expected = "released more often")]
    fn budget_rejects_extra_release() {
        let mut budget = WorkerBudget::new(1);
        budget.release();
    }
}
