//! Background evaluation of window snapshots.
//!
//! Ingestion must never wait for an evaluation. Snapshots go through a
//! bounded queue; when it is full the oldest queued snapshot is discarded to
//! make room for the new one.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, unbounded, Receiver, Sender, TrySendError};

use crate::{estimator::estimate, ResetReport, RotationSample};

/// Producer side of a bounded, drop-oldest queue.
#[derive(Debug)]
pub struct EvaluationQueue<T> {
    sender: Sender<T>,
    // a receiver clone, only used to pop the oldest item when the queue is full
    overflow: Receiver<T>,
    discarded: u64,
}

impl<T> EvaluationQueue<T> {
    /// Creates a queue holding at most `capacity` items, together with its
    /// consumer side. A capacity of `0` is rounded up to `1`.
    #[must_use]
    pub fn bounded(capacity: usize) -> (Self, Receiver<T>) {
        let (sender, receiver) = bounded(capacity.max(1));
        let queue = Self {
            sender,
            overflow: receiver.clone(),
            discarded: 0,
        };
        (queue, receiver)
    }

    /// Enqueues `item` without blocking, discarding the oldest queued items
    /// while the queue is full.
    pub fn push(&mut self, item: T) {
        let mut item = item;
        loop {
            match self.sender.try_send(item) {
                Err(TrySendError::Full(returned)) => {
                    if self.overflow.try_recv().is_ok() {
                        self.discarded += 1;
                        tracing::debug!(
                            discarded = self.discarded,
                            "evaluation queue full, dropped oldest"
                        );
                    }
                    item = returned;
                }
                // the queue keeps its own receiver, so it never disconnects
                Ok(()) | Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    /// Number of items discarded because the queue was full.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.discarded
    }
}

/// Runs [`estimate`] on window snapshots on a dedicated thread.
///
/// Reports come out on [`Self::reports`] in submission order, minus the
/// snapshots that were discarded. The output channel is unbounded, so the
/// consumer is expected to keep draining it.
///
/// # Example
///
/// ```
/// use nalgebra::Vector3;
/// use so3_reset::{worker::EvaluationWorker, RotationSample};
///
/// let mut worker = EvaluationWorker::spawn(4);
/// worker.submit(vec![RotationSample::new(Vector3::z(), 0.2, 0.01)]);
/// let reports = worker.shutdown();
///
/// assert_eq!(reports.len(), 1);
/// assert!((reports[0].theta_net - 0.2).abs() < 1e-9);
/// ```
#[derive(Debug)]
pub struct EvaluationWorker {
    queue: Option<EvaluationQueue<Vec<RotationSample>>>,
    reports: Receiver<ResetReport>,
    handle: Option<JoinHandle<()>>,
}

impl EvaluationWorker {
    /// Spawns the evaluation thread with a queue of `queue_capacity`
    /// snapshots.
    #[must_use]
    pub fn spawn(queue_capacity: usize) -> Self {
        let (queue, snapshots) = EvaluationQueue::bounded(queue_capacity);
        let (report_sender, reports) = unbounded();

        let handle = thread::spawn(move || Self::run(&snapshots, &report_sender));

        Self {
            queue: Some(queue),
            reports,
            handle: Some(handle),
        }
    }

    fn run(snapshots: &Receiver<Vec<RotationSample>>, reports: &Sender<ResetReport>) {
        tracing::debug!("evaluation worker started");
        for snapshot in snapshots {
            if reports.send(estimate(&snapshot)).is_err() {
                break;
            }
        }
        tracing::debug!("evaluation worker exiting");
    }

    /// Queues a snapshot for evaluation. Never blocks.
    ///
    /// Returns `false`, and drops the snapshot, if the worker thread has
    /// already stopped.
    pub fn submit(&mut self, snapshot: Vec<RotationSample>) -> bool {
        let running = self
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished());

        match self.queue.as_mut() {
            Some(queue) if running => {
                queue.push(snapshot);
                true
            }
            _ => false,
        }
    }

    /// Channel the reports are delivered on.
    #[must_use]
    pub fn reports(&self) -> &Receiver<ResetReport> {
        &self.reports
    }

    /// Number of snapshots discarded because the queue was full.
    #[must_use]
    pub fn discarded(&self) -> u64 {
        self.queue.as_ref().map_or(0, EvaluationQueue::discarded)
    }

    /// Stops accepting snapshots, waits for the queued ones to be evaluated
    /// and returns every report that was not consumed yet.
    #[must_use]
    pub fn shutdown(mut self) -> Vec<ResetReport> {
        self.stop();
        self.reports.try_iter().collect()
    }

    fn stop(&mut self) {
        // closing the queue ends the worker loop once it is drained
        self.queue = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("evaluation worker panicked");
            }
        }
    }
}

impl Drop for EvaluationWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
