//! Coalescing, single-flight rebuild scheduler.
//!
//! Any number of change events that arrive while a build runs collapse into
//! exactly one follow-up build:
//!
//! ```text
//!            Changed / StartBuild
//!   ┌──────┐ ─────────────────▶ ┌──────────┐  Changed   ┌─────────────────────┐
//!   │ Idle │                    │ Building │ ─────────▶ │ BuildingWithPending │ ◀─┐
//!   └──────┘ ◀───────────────── └──────────┘            └─────────────────────┘ ──┘
//!                 Finished           ▲    Finished / StartBuild   │        Changed
//!                                    └────────────────────────────┘
//! ```
//!
//! The transitions are a pure function ([`SchedulerState::on`]); the actor
//! ([`RebuildScheduler::run`]) only executes the actions it returns.

use crate::log;
use anyhow::Result;
use std::sync::Arc;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SchedulerState {
    #[default]
    Idle,
    Building,
    BuildingWithPending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// A watched file changed.
    Changed,
    /// The running build completed, successfully or not.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartBuild,
    None,
}

impl SchedulerState {
    pub const fn on(self, signal: Signal) -> (Self, Action) {
        match (self, signal) {
            (Self::Idle, Signal::Changed) => (Self::Building, Action::StartBuild),
            (Self::Building | Self::BuildingWithPending, Signal::Changed) => {
                (Self::BuildingWithPending, Action::None)
            }
            (Self::Building, Signal::Finished) => (Self::Idle, Action::None),
            (Self::BuildingWithPending, Signal::Finished) => (Self::Building, Action::StartBuild),
            (Self::Idle, Signal::Finished) => (Self::Idle, Action::None),
        }
    }

    pub const fn is_building(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

/// How a build ended.
enum Outcome {
    Done,
    Failed(anyhow::Error),
    Panicked(String),
}

/// Runs a blocking build function in response to change events.
pub struct RebuildScheduler<F> {
    build: Arc<F>,
    state: SchedulerState,
    builds: usize,
}

impl<F> RebuildScheduler<F>
where
    F: Fn() -> Result<()> + Send + Sync + 'static,
{
    pub fn new(build: F) -> Self {
        Self {
            build: Arc::new(build),
            state: SchedulerState::Idle,
            builds: 0,
        }
    }

    /// Consume change events until the channel closes.
    ///
    /// Pending events are always drained before a build completion is
    /// processed. After the channel closes, the in-flight build and its
    /// follow-up (if any) still run. Returns the number of builds started.
    pub async fn run<E>(mut self, mut events: mpsc::Receiver<E>) -> usize {
        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let mut open = true;

        while open || self.state.is_building() {
            let signal = tokio::select! {
                biased;

                event = events.recv(), if open => match event {
                    Some(_) => Signal::Changed,
                    None => {
                        open = false;
                        continue;
                    }
                },
                Some(outcome) = done_rx.recv() => {
                    report(outcome);
                    Signal::Finished
                }
            };

            let (next, action) = self.state.on(signal);
            self.state = next;
            if action == Action::StartBuild {
                self.start(&done_tx);
            }
        }

        self.builds
    }

    /// Run one build on the blocking pool; its outcome comes back on `done`.
    fn start(&mut self, done: &mpsc::UnboundedSender<Outcome>) {
        self.builds += 1;
        let build = Arc::clone(&self.build);
        let done = done.clone();

        tokio::spawn(async move {
            let outcome = match tokio::task::spawn_blocking(move || build()).await {
                Ok(Ok(())) => Outcome::Done,
                Ok(Err(err)) => Outcome::Failed(err),
                Err(err) => Outcome::Panicked(err.to_string()),
            };
            // Receiver lives as long as the run loop.
            let _ = done.send(outcome);
        });
    }
}

fn report(outcome: Outcome) {
    match outcome {
        Outcome::Done => {}
        Outcome::Failed(err) => log!("error"; "rebuild failed: {:#}", err),
        Outcome::Panicked(reason) => log!("error"; "rebuild panicked: {}", reason),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_transition_table() {
        use Action::{None as Nothing, StartBuild};
        use SchedulerState::*;
        use Signal::*;

        assert_eq!(Idle.on(Changed), (Building, StartBuild));
        assert_eq!(Building.on(Changed), (BuildingWithPending, Nothing));
        assert_eq!(BuildingWithPending.on(Changed), (BuildingWithPending, Nothing));
        assert_eq!(Building.on(Finished), (Idle, Nothing));
        assert_eq!(BuildingWithPending.on(Finished), (Building, StartBuild));
        assert_eq!(Idle.on(Finished), (Idle, Nothing));
    }

    #[test]
    fn test_burst_during_build_folds_into_one() {
        let mut state = SchedulerState::Idle;
        let mut started = 0;
        let mut step = |signal| {
            let (next, action) = state.on(signal);
            state = next;
            if action == Action::StartBuild {
                started += 1;
            }
        };

        step(Signal::Changed);
        for _ in 0..5 {
            step(Signal::Changed);
        }
        step(Signal::Finished);
        step(Signal::Finished);

        assert_eq!(started, 2);
        assert_eq!(state, SchedulerState::Idle);
    }

    #[tokio::test]
    async fn test_five_events_during_build_one_follow_up() {
        let (gate_tx, gate_rx) = std::sync::mpsc::channel::<()>();
        let gate_rx = Mutex::new(gate_rx);
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);

        let scheduler = RebuildScheduler::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            gate_rx.lock().recv().ok();
            Ok(())
        });
        let (tx, rx) = mpsc::channel(16);
        let handle = tokio::spawn(scheduler.run(rx));

        tx.send(()).await.unwrap();
        for _ in 0..5 {
            tx.send(()).await.unwrap();
        }
        drop(tx);
        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();

        assert_eq!(handle.await.unwrap(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_build_releases_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = RebuildScheduler::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            bail!("broken document")
        });
        let (tx, rx) = mpsc::channel(4);

        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);

        assert_eq!(scheduler.run(rx).await, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_build_releases_state() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let scheduler = RebuildScheduler::new(move || {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                panic!("first build explodes");
            }
            Ok(())
        });
        let (tx, rx) = mpsc::channel(4);

        tx.send(()).await.unwrap();
        tx.send(()).await.unwrap();
        drop(tx);

        assert_eq!(scheduler.run(rx).await, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_closed_channel_without_events() {
        let scheduler = RebuildScheduler::new(|| Ok(()));
        let (tx, rx) = mpsc::channel::<()>(1);
        drop(tx);

        assert_eq!(scheduler.run(rx).await, 0);
    }
}
