//! In-process frontier
//!
//! Pending tasks live in one of three containers depending on the strategy:
//! a `VecDeque` (breadth-first), a `Vec` used as a stack (depth-first), or a
//! `BinaryHeap` keyed on `(priority, insertion order)`.
//!
//! Outstanding work is tracked as the number of tasks handed out by `get()`
//! and not yet released by `mark_done()`. When the queue is empty and nothing
//! is outstanding, no worker can produce more work, so the frontier stops
//! itself and every waiting `get()` returns `None`.

use crate::frontier::{CrawlTask, Frontier, FrontierResult, Strategy};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

/// Default upper bound on a single wait inside `get()`
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// A task with its insertion sequence number, ordered for the max-heap
#[derive(Debug, Clone)]
struct RankedTask {
    task: CrawlTask,
    seq: u64,
}

// Higher priority pops first; among equal priorities the older entry wins
impl Ord for RankedTask {
    fn cmp(&self, other: &Self) -> Ordering {
        self.task
            .priority
            .total_cmp(&other.task.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for RankedTask {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for RankedTask {
    fn eq(&self, other: &Self) -> bool {
        self.seq == other.seq
    }
}

impl Eq for RankedTask {}

#[derive(Debug)]
enum Pending {
    Fifo(VecDeque<CrawlTask>),
    Lifo(Vec<CrawlTask>),
    Priority(BinaryHeap<RankedTask>),
}

impl Pending {
    fn new(strategy: Strategy) -> Self {
        match strategy {
            Strategy::BreadthFirst => Self::Fifo(VecDeque::new()),
            Strategy::DepthFirst => Self::Lifo(Vec::new()),
            Strategy::Priority => Self::Priority(BinaryHeap::new()),
        }
    }

    fn push(&mut self, task: CrawlTask, seq: u64) {
        match self {
            Self::Fifo(queue) => queue.push_back(task),
            Self::Lifo(stack) => stack.push(task),
            Self::Priority(heap) => heap.push(RankedTask { task, seq }),
        }
    }

    fn pop(&mut self) -> Option<CrawlTask> {
        match self {
            Self::Fifo(queue) => queue.pop_front(),
            Self::Lifo(stack) => stack.pop(),
            Self::Priority(heap) => heap.pop().map(|ranked| ranked.task),
        }
    }

    fn len(&self) -> usize {
        match self {
            Self::Fifo(queue) => queue.len(),
            Self::Lifo(stack) => stack.len(),
            Self::Priority(heap) => heap.len(),
        }
    }

    /// Pending tasks in insertion order
    fn in_insertion_order(&self) -> Vec<CrawlTask> {
        match self {
            Self::Fifo(queue) => queue.iter().cloned().collect(),
            Self::Lifo(stack) => stack.clone(),
            Self::Priority(heap) => {
                let mut ranked: Vec<&RankedTask> = heap.iter().collect();
                ranked.sort_by_key(|r| r.seq);
                ranked.into_iter().map(|r| r.task.clone()).collect()
            }
        }
    }
}

#[derive(Debug)]
struct QueueState {
    pending: Pending,
    next_seq: u64,
    /// Tasks handed out by `get()` and not yet released
    in_flight: usize,
}

impl QueueState {
    fn push(&mut self, task: CrawlTask) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(task, seq);
    }
}

/// In-memory frontier for single-process crawls
#[derive(Debug)]
pub struct LocalFrontier {
    strategy: Strategy,
    state: Mutex<QueueState>,
    notify: Notify,
    stopped: AtomicBool,
    poll_interval: Duration,
}

impl LocalFrontier {
    /// Creates an empty frontier with the given ordering discipline
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            state: Mutex::new(QueueState {
                pending: Pending::new(strategy),
                next_seq: 0,
                in_flight: 0,
            }),
            notify: Notify::new(),
            stopped: AtomicBool::new(false),
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Overrides the bounded wait used by `get()` while work is outstanding
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    /// Number of tasks handed out and not yet released
    pub async fn in_flight(&self) -> usize {
        self.state.lock().await.in_flight
    }
}

#[async_trait]
impl Frontier for LocalFrontier {
    async fn add(&self, task: CrawlTask) -> FrontierResult<()> {
        if self.is_stopped() {
            tracing::trace!("Frontier stopped, dropping {}", task.url);
            return Ok(());
        }

        self.state.lock().await.push(task);
        self.notify.notify_waiters();
        Ok(())
    }

    async fn get(&self) -> Option<CrawlTask> {
        loop {
            // Created before the check so a concurrent notify is not missed
            let notified = self.notify.notified();

            {
                let mut state = self.state.lock().await;

                if let Some(task) = state.pending.pop() {
                    state.in_flight += 1;
                    return Some(task);
                }

                if self.is_stopped() {
                    return None;
                }

                if state.in_flight == 0 {
                    drop(state);
                    tracing::debug!("Frontier is empty with no outstanding work, stopping");
                    self.stop();
                    return None;
                }
            }

            let _ = tokio::time::timeout(self.poll_interval, notified).await;
        }
    }

    async fn mark_done(&self, _task: &CrawlTask) {
        {
            let mut state = self.state.lock().await;
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }

    async fn requeue(&self, task: CrawlTask) -> FrontierResult<()> {
        {
            let mut state = self.state.lock().await;
            state.in_flight = state.in_flight.saturating_sub(1);
            state.push(task);
        }
        self.notify.notify_waiters();
        Ok(())
    }

    fn stop(&self) {
        self.stopped.store(true, AtomicOrdering::SeqCst);
        self.notify.notify_waiters();
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(AtomicOrdering::SeqCst)
    }

    async fn snapshot(&self) -> FrontierResult<Vec<CrawlTask>> {
        // Holding the lock serializes the copy against concurrent adds
        let state = self.state.lock().await;
        Ok(state.pending.in_insertion_order())
    }

    async fn restore(&self, tasks: Vec<CrawlTask>) -> FrontierResult<()> {
        {
            let mut state = self.state.lock().await;
            for task in tasks {
                state.push(task);
            }
        }
        self.notify.notify_waiters();
        Ok(())
    }

    async fn len(&self) -> usize {
        self.state.lock().await.pending.len()
    }
}
