//! Bounded parallel dispatch
//!
//! Every item is handed to its own worker thread. Results travel back to the dispatching
//! thread over a channel tagged with their submission index, and are handed to a single
//! writer callback strictly in submission order. A task's permit travels with its result
//! and is only returned once that result has been written or skipped, so at most `N`
//! items are running or waiting for reordering at any time. A worker that fails or
//! panics is reported as a [`DispatchError`] rather than being lost.

mod semaphore;

pub use semaphore::{Permit, Semaphore};

use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, error, warn};
use parking_lot::Mutex;

use crate::error::{ConfigError, DispatchError, Result};
use crate::features::{FeatureExtractor, FeatureRecord};
use crate::Record;

/// Trait for types that can process items on worker threads
///
/// The processor is cloned once per task, so per-task state can live in `&mut self`.
pub trait ParallelProcessor<T>: Send + Clone + 'static {
    /// Value handed to the writer for each successfully processed item
    type Output: Send + 'static;

    /// Process a single item
    fn process(&mut self, item: T) -> Result<Self::Output>;

    /// Short description of an item, used when reporting its failure
    #[allow(unused_variables)]
    fn label(&self, item: &T) -> String {
        String::new()
    }
}

impl ParallelProcessor<Record> for FeatureExtractor {
    type Output = FeatureRecord;

    fn process(&mut self, record: Record) -> Result<FeatureRecord> {
        self.extract(record)
    }

    fn label(&self, record: &Record) -> String {
        record.header().to_string()
    }
}

/// Summary of a dispatch run
#[derive(Debug, Default)]
pub struct DispatchReport {
    /// Number of items submitted
    pub submitted: usize,
    /// Number of outputs handed to the writer
    pub written: usize,
    /// Failed items, in submission order
    pub failures: Vec<DispatchError>,
}
impl DispatchReport {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.written == self.submitted
    }

    /// Converts a report with failures into [`DispatchError::IncompleteRun`]
    pub fn into_result(self) -> Result<Self> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(DispatchError::IncompleteRun(self.failures.len(), self.submitted).into())
        }
    }

    /// Surfaces the first failure with its underlying error unwrapped
    pub fn into_first_error(self) -> Result<()> {
        match self.failures.into_iter().next() {
            None => Ok(()),
            Some(DispatchError::TaskFailed { source, .. }) => Err(*source),
            Some(e) => Err(e.into()),
        }
    }
}

type Outcome<O> = std::result::Result<O, DispatchError>;

/// A task's result, still holding the task's permit
type Message<O> = (usize, Outcome<O>, Permit);

/// Runs a processor over many items with a concurrency cap
#[derive(Debug, Clone, Copy)]
pub struct Dispatcher {
    workers: NonZeroUsize,
}
impl Dispatcher {
    /// Creates a dispatcher allowing at most `workers` concurrent tasks
    pub fn new(workers: usize) -> Result<Self> {
        let workers = NonZeroUsize::new(workers).ok_or(ConfigError::ZeroWorkers)?;
        let cores = num_cpus::get();
        if workers.get() > cores {
            warn!(
                "Requested {} workers but only {cores} cores are available",
                workers.get()
            );
        }
        Ok(Self { workers })
    }

    #[must_use]
    pub fn workers(&self) -> usize {
        self.workers.get()
    }

    /// Processes every item exactly once, feeding outputs to `writer` in submission order
    ///
    /// Failed items are skipped by the writer and collected in the returned report. An
    /// error returned by `writer` stops dispatching; tasks already running are joined
    /// before the error is returned.
    pub fn process_parallel<T, P, F>(
        &self,
        items: Vec<T>,
        processor: P,
        writer: F,
    ) -> Result<DispatchReport>
    where
        T: Send + 'static,
        P: ParallelProcessor<T>,
        F: FnMut(usize, P::Output) -> Result<()>,
    {
        let semaphore = Semaphore::new(self.workers);
        let (tx, rx) = mpsc::channel();
        let mut collector = Collector::new(items.len(), rx, writer);

        // the gate: starting a task and sweeping the live list happen under this lock
        let live: Mutex<Vec<JoinHandle<()>>> = Mutex::new(Vec::new());

        let mut halted = None;
        for (index, item) in items.into_iter().enumerate() {
            // no free permit means every slot is running or waiting to be written
            let permit = loop {
                if let Some(permit) = semaphore.try_acquire() {
                    break Some(permit);
                }
                if let Err(e) = collector.recv_one() {
                    halted = Some(e);
                    break None;
                }
            };
            let Some(permit) = permit else { break };
            {
                let mut live = live.lock();
                match spawn_task(index, item, processor.clone(), permit, tx.clone()) {
                    Ok(handle) => live.push(handle),
                    Err(e) => {
                        halted = Some(e);
                        break;
                    }
                }
                sweep(&mut live);
            }

            if let Err(e) = collector.drain() {
                halted = Some(e);
                break;
            }
        }
        drop(tx);

        for handle in live.into_inner() {
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally after reporting");
            }
        }

        // dropping the collector releases any permits still parked in it
        let result = match halted {
            Some(e) => {
                drop(collector);
                Err(e)
            }
            None => collector.finish(),
        };
        debug_assert_eq!(semaphore.available(), semaphore.capacity());
        result
    }
}

/// Joins and removes every finished task from the live list
fn sweep(live: &mut Vec<JoinHandle<()>>) {
    let mut i = 0;
    while i < live.len() {
        if live[i].is_finished() {
            let handle = live.swap_remove(i);
            if handle.join().is_err() {
                error!("Worker thread terminated abnormally after reporting");
            }
        } else {
            i += 1;
        }
    }
}

fn spawn_task<T, P>(
    index: usize,
    item: T,
    mut processor: P,
    permit: Permit,
    tx: Sender<Message<P::Output>>,
) -> Result<JoinHandle<()>>
where
    T: Send + 'static,
    P: ParallelProcessor<T>,
{
    let handle = thread::Builder::new()
        .name(format!("lncfeat-worker-{index}"))
        .spawn(move || {
            let outcome = match panic::catch_unwind(AssertUnwindSafe(|| {
                let label = processor.label(&item);
                processor.process(item).map_err(|source| (label, source))
            })) {
                Ok(Ok(output)) => Ok(output),
                Ok(Err((label, source))) => Err(DispatchError::TaskFailed {
                    index,
                    label,
                    source: Box::new(source),
                }),
                Err(_) => Err(DispatchError::WorkerPanicked(index)),
            };
            // the receiver only hangs up when the dispatcher has already failed
            let _ = tx.send((index, outcome, permit));
        })?;
    Ok(handle)
}

/// Single writer that restores submission order from completion order
struct Collector<O, F> {
    expected: usize,
    received: usize,
    next: usize,
    pending: BTreeMap<usize, (Outcome<O>, Permit)>,
    rx: Receiver<Message<O>>,
    writer: F,
    report: DispatchReport,
}
impl<O, F> Collector<O, F>
where
    F: FnMut(usize, O) -> Result<()>,
{
    fn new(expected: usize, rx: Receiver<Message<O>>, writer: F) -> Self {
        Self {
            expected,
            received: 0,
            next: 0,
            pending: BTreeMap::new(),
            rx,
            writer,
            report: DispatchReport {
                submitted: expected,
                ..Default::default()
            },
        }
    }

    /// Accepts everything already delivered without blocking
    fn drain(&mut self) -> Result<()> {
        while let Ok(message) = self.rx.try_recv() {
            self.accept(message)?;
        }
        Ok(())
    }

    /// Blocks for the next delivered result
    ///
    /// Only called while the dispatcher still holds a sender, so the channel stays open.
    fn recv_one(&mut self) -> Result<()> {
        match self.rx.recv() {
            Ok(message) => self.accept(message),
            Err(_) => Err(DispatchError::ChannelClosed(self.received, self.expected).into()),
        }
    }

    /// Blocks until every submitted item is accounted for
    fn finish(mut self) -> Result<DispatchReport> {
        while self.received < self.expected {
            match self.rx.recv() {
                Ok(message) => self.accept(message)?,
                Err(_) => {
                    return Err(DispatchError::ChannelClosed(self.received, self.expected).into())
                }
            }
        }
        debug_assert!(self.pending.is_empty());
        debug!(
            "Dispatch finished: {} written, {} failed",
            self.report.written,
            self.report.failures.len()
        );
        Ok(self.report)
    }

    fn accept(&mut self, (index, outcome, permit): Message<O>) -> Result<()> {
        self.received += 1;
        self.pending.insert(index, (outcome, permit));
        while let Some((outcome, _permit)) = self.pending.remove(&self.next) {
            match outcome {
                Ok(output) => {
                    (self.writer)(self.next, output)?;
                    self.report.written += 1;
                }
                Err(e) => {
                    error!("{e}");
                    self.report.failures.push(e);
                }
            }
            self.next += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    /// Sleeps longer for earlier items so that completion order is reversed
    #[derive(Clone)]
    struct Staggered {
        active: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
        n_items: usize,
    }
    impl Staggered {
        fn new(n_items: usize) -> Self {
            Self {
                active: Arc::new(AtomicUsize::new(0)),
                peak: Arc::new(AtomicUsize::new(0)),
                n_items,
            }
        }
    }
    impl ParallelProcessor<usize> for Staggered {
        type Output = usize;

        fn process(&mut self, item: usize) -> Result<usize> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(2 * (self.n_items - item) as u64));
            self.active.fetch_sub(1, Ordering::SeqCst);
            Ok(item * 10)
        }
    }

    /// Fails on multiples of three and panics on multiples of five
    #[derive(Clone)]
    struct Faulty;
    impl ParallelProcessor<usize> for Faulty {
        type Output = usize;

        fn process(&mut self, item: usize) -> Result<usize> {
            if item % 5 == 4 {
                panic!("injected fault on {item}");
            }
            if item % 3 == 2 {
                return Err(anyhow::anyhow!("injected error on {item}").into());
            }
            Ok(item)
        }

        fn label(&self, item: &usize) -> String {
            format!("item-{item}")
        }
    }

    /// Output that tracks how many instances are alive
    struct Tracked {
        live: Arc<AtomicUsize>,
    }
    impl Drop for Tracked {
        fn drop(&mut self) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Stalls on the first item while later items finish quickly
    #[derive(Clone, Default)]
    struct SlowHead {
        live: Arc<AtomicUsize>,
        peak: Arc<AtomicUsize>,
    }
    impl ParallelProcessor<usize> for SlowHead {
        type Output = Tracked;

        fn process(&mut self, item: usize) -> Result<Tracked> {
            if item == 0 {
                thread::sleep(Duration::from_millis(200));
            }
            let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            Ok(Tracked {
                live: Arc::clone(&self.live),
            })
        }
    }

    #[test]
    fn test_zero_workers_rejected() {
        assert!(matches!(
            Dispatcher::new(0),
            Err(crate::Error::ConfigError(ConfigError::ZeroWorkers))
        ));
    }

    #[test]
    fn test_submission_order_preserved() -> anyhow::Result<()> {
        for workers in [1, 2, 4, 8] {
            let n_items = 24;
            let mut seen = Vec::new();
            let report = Dispatcher::new(workers)?.process_parallel(
                (0..n_items).collect(),
                Staggered::new(n_items),
                |index, output| {
                    assert_eq!(output, index * 10);
                    seen.push(index);
                    Ok(())
                },
            )?;
            assert!(report.is_complete());
            assert_eq!(report.written, n_items);
            assert_eq!(seen, (0..n_items).collect::<Vec<_>>());
        }
        Ok(())
    }

    #[test]
    fn test_concurrency_cap() -> anyhow::Result<()> {
        let processor = Staggered::new(32);
        let peak = Arc::clone(&processor.peak);
        Dispatcher::new(3)?.process_parallel((0..32).collect(), processor, |_, _| Ok(()))?;
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak}");
        assert!(peak >= 1);
        Ok(())
    }

    #[test]
    fn test_buffered_outputs_bounded_by_workers() -> anyhow::Result<()> {
        let processor = SlowHead::default();
        let live = Arc::clone(&processor.live);
        let peak = Arc::clone(&processor.peak);
        let report =
            Dispatcher::new(2)?.process_parallel((0..200).collect(), processor, |_, _| Ok(()))?;
        assert_eq!(report.written, 200);
        let peak = peak.load(Ordering::SeqCst);
        assert!(peak <= 2, "peak buffered outputs {peak}");
        assert_eq!(live.load(Ordering::SeqCst), 0);
        Ok(())
    }

    #[test]
    fn test_faults_are_isolated() -> anyhow::Result<()> {
        let n_items = 20;
        let mut seen = Vec::new();
        let report = Dispatcher::new(4)?.process_parallel(
            (0..n_items).collect(),
            Faulty,
            |index, output| {
                assert_eq!(index, output);
                seen.push(output);
                Ok(())
            },
        )?;

        let expected: Vec<_> = (0..n_items)
            .filter(|i| i % 5 != 4 && i % 3 != 2)
            .collect();
        assert_eq!(seen, expected);
        assert_eq!(report.written + report.failures.len(), n_items);
        assert!(!report.is_complete());

        let panicked = report
            .failures
            .iter()
            .filter(|e| matches!(e, DispatchError::WorkerPanicked(_)))
            .count();
        assert_eq!(panicked, 4);
        assert!(report.failures.iter().any(|e| matches!(
            e,
            DispatchError::TaskFailed { index: 2, label, .. } if label == "item-2"
        )));
        assert!(matches!(
            report.into_result(),
            Err(crate::Error::DispatchError(DispatchError::IncompleteRun(_, 20)))
        ));
        Ok(())
    }

    #[test]
    fn test_first_error_unwrapped() -> anyhow::Result<()> {
        let report =
            Dispatcher::new(2)?.process_parallel((0..4).collect(), Faulty, |_, _| Ok(()))?;
        // only item 2 fails
        assert!(matches!(
            report.into_first_error(),
            Err(crate::Error::AnyhowError(_))
        ));
        Ok(())
    }

    #[test]
    fn test_writer_error_halts() -> anyhow::Result<()> {
        let result = Dispatcher::new(2)?.process_parallel(
            (0..10).collect(),
            Staggered::new(10),
            |index, _| {
                if index == 3 {
                    Err(anyhow::anyhow!("disk full").into())
                } else {
                    Ok(())
                }
            },
        );
        assert!(matches!(result, Err(crate::Error::AnyhowError(_))));
        Ok(())
    }

    #[test]
    fn test_empty_input() -> anyhow::Result<()> {
        let report =
            Dispatcher::new(2)?.process_parallel(Vec::<usize>::new(), Faulty, |_, _| Ok(()))?;
        assert_eq!(report.submitted, 0);
        assert!(report.is_complete());
        Ok(())
    }
}
