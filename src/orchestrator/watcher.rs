//! Per-boundary stage watcher.
//!
//! ```text
//! Idle --event--> Debounced --deadline--> StabilityCheck --stable--> Running --> Idle
//!                                               |
//!                                               +--not stable after N attempts--> Idle
//! ```
//!
//! One trigger cycle runs to completion before the next batch of events is
//! looked at, so a watcher never overlaps runs of its stage.

use crate::config::WatcherConfig;
use crate::error::Result;
use crate::orchestrator::change_detector::{ChangeDetector, ChangeEvent, ChangeKind};
use crate::orchestrator::clock::{Clock, SizeProbe};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatcherState {
    Idle,
    Debounced { deadline: Instant },
    StabilityCheck,
    Running,
}

/// Which filesystem events concern a watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventFilter {
    Extension(String),
    Files(Vec<PathBuf>),
}

impl EventFilter {
    pub fn matches(&self, path: &Path) -> bool {
        match self {
            EventFilter::Extension(ext) => {
                path.extension().and_then(|e| e.to_str()) == Some(ext.as_str())
            }
            EventFilter::Files(files) => files.iter().any(|f| f == path),
        }
    }
}

/// Files that must be stable before the stage may run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// The files whose events triggered the cycle
    Triggers,
    Artifacts(Vec<PathBuf>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StabilityPolicy {
    pub debounce: Duration,
    pub stability_wait: Duration,
    pub attempts: u32,
    pub retry_interval: Duration,
    pub min_bytes: u64,
}

impl From<&WatcherConfig> for StabilityPolicy {
    fn from(config: &WatcherConfig) -> Self {
        Self {
            debounce: config.debounce(),
            stability_wait: config.stability_wait(),
            attempts: config.stability_attempts.max(1),
            retry_interval: config.retry_interval(),
            min_bytes: config.min_stable_bytes,
        }
    }
}

impl Default for StabilityPolicy {
    fn default() -> Self {
        Self::from(&WatcherConfig::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Completed,
    Failed(String),
    Abandoned,
}

/// The next stage's entry point, invoked synchronously by a watcher
pub trait StageRunner {
    fn name(&self) -> &str;
    fn run(&mut self, triggers: &[PathBuf]) -> Result<()>;
}

pub struct StageWatcher<C, P> {
    filter: EventFilter,
    readiness: Readiness,
    policy: StabilityPolicy,
    clock: C,
    probe: P,
    state: WatcherState,
    pending: BTreeSet<PathBuf>,
}

impl<C: Clock, P: SizeProbe> StageWatcher<C, P> {
    pub fn new(
        filter: EventFilter,
        readiness: Readiness,
        policy: StabilityPolicy,
        clock: C,
        probe: P,
    ) -> Self {
        Self {
            filter,
            readiness,
            policy,
            clock,
            probe,
            state: WatcherState::Idle,
            pending: BTreeSet::new(),
        }
    }

    pub fn state(&self) -> WatcherState {
        self.state
    }

    pub fn pending(&self) -> impl Iterator<Item = &PathBuf> {
        self.pending.iter()
    }

    /// Accept an event; the first accepted event opens the debounce window.
    ///
    /// A removal only withdraws a trigger that is still pending.
    pub fn on_event(&mut self, event: &ChangeEvent) -> bool {
        if event.kind == ChangeKind::Removed {
            self.pending.remove(&event.path);
            return false;
        }
        if !self.filter.matches(&event.path) {
            return false;
        }

        self.pending.insert(event.path.clone());
        if self.state == WatcherState::Idle {
            self.state = WatcherState::Debounced {
                deadline: self.clock.now() + self.policy.debounce,
            };
            debug!("Change on {}, debouncing", event.path.display());
        }
        true
    }

    /// Advance the state machine; returns the outcome of a finished cycle
    pub fn poll(&mut self, runner: &mut dyn StageRunner) -> Option<CycleOutcome> {
        let WatcherState::Debounced { deadline } = self.state else {
            return None;
        };
        if self.clock.now() < deadline {
            return None;
        }

        self.state = WatcherState::StabilityCheck;
        let triggers: Vec<PathBuf> = std::mem::take(&mut self.pending).into_iter().collect();
        let targets = match &self.readiness {
            Readiness::Triggers => triggers.clone(),
            Readiness::Artifacts(paths) => paths.clone(),
        };

        if !self.wait_until_stable(&targets) {
            warn!(
                stage = runner.name(),
                "Inputs did not settle after {} attempts, abandoning trigger",
                self.policy.attempts
            );
            // Keep the triggers for the next cycle
            self.pending.extend(triggers);
            self.state = WatcherState::Idle;
            return Some(CycleOutcome::Abandoned);
        }

        self.state = WatcherState::Running;
        info!(stage = runner.name(), triggers = triggers.len(), "Running stage");
        let outcome = match runner.run(&triggers) {
            Ok(()) => CycleOutcome::Completed,
            Err(e) => {
                error!(stage = runner.name(), "Stage failed: {}", e);
                CycleOutcome::Failed(e.to_string())
            }
        };

        self.state = WatcherState::Idle;
        Some(outcome)
    }

    /// Poll change events and drive cycles until `shutdown` is set.
    ///
    /// The flag is checked between cycles, so an in-flight run finishes.
    pub fn run_until(
        &mut self,
        detector: &mut ChangeDetector,
        runner: &mut dyn StageRunner,
        scan_interval: Duration,
        shutdown: &AtomicBool,
    ) {
        info!(
            stage = runner.name(),
            "Watching {}",
            detector.root().display()
        );

        while !shutdown.load(Ordering::SeqCst) {
            match detector.scan() {
                Ok(events) => {
                    for event in &events {
                        self.on_event(event);
                    }
                }
                Err(e) => warn!(stage = runner.name(), "Change scan failed: {}", e),
            }

            self.poll(runner);
            self.clock.sleep(scan_interval);
        }

        info!(stage = runner.name(), "Watcher stopped");
    }

    fn wait_until_stable(&self, targets: &[PathBuf]) -> bool {
        for attempt in 1..=self.policy.attempts {
            if targets.iter().all(|t| self.is_stable(t)) {
                return true;
            }
            debug!("Stability attempt {} failed", attempt);
            if attempt < self.policy.attempts {
                self.clock.sleep(self.policy.retry_interval);
            }
        }
        false
    }

    /// Two size samples one wait apart, equal and at least `min_bytes`
    fn is_stable(&self, path: &Path) -> bool {
        let first = self.probe.size(path);
        self.clock.sleep(self.policy.stability_wait);
        let second = self.probe.size(path);

        matches!((first, second), (Some(a), Some(b)) if a == b && a >= self.policy.min_bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::orchestrator::clock::{ManualClock, ScriptedProbe};
    use pretty_assertions::assert_eq;

    struct RecordingRunner {
        runs: Vec<Vec<PathBuf>>,
        fail: bool,
    }

    impl RecordingRunner {
        fn new() -> Self {
            Self {
                runs: Vec::new(),
                fail: false,
            }
        }
    }

    impl StageRunner for RecordingRunner {
        fn name(&self) -> &str {
            "test"
        }

        fn run(&mut self, triggers: &[PathBuf]) -> Result<()> {
            self.runs.push(triggers.to_vec());
            if self.fail {
                return Err(PipelineError::Watcher("boom".to_string()));
            }
            Ok(())
        }
    }

    fn created(path: &str) -> ChangeEvent {
        ChangeEvent {
            path: PathBuf::from(path),
            kind: ChangeKind::Created,
        }
    }

    fn watcher(clock: &ManualClock, probe: &ScriptedProbe) -> StageWatcher<ManualClock, ScriptedProbe> {
        StageWatcher::new(
            EventFilter::Extension("txt".to_string()),
            Readiness::Triggers,
            StabilityPolicy::default(),
            clock.clone(),
            probe.clone(),
        )
    }

    #[test]
    fn test_debounce_delays_run() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("raw/a.txt", &[120]);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();

        assert!(watcher.on_event(&created("raw/a.txt")));
        assert!(matches!(watcher.state(), WatcherState::Debounced { .. }));
        assert_eq!(watcher.poll(&mut runner), None);

        clock.advance(Duration::from_millis(800));
        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Completed));
        assert_eq!(runner.runs, vec![vec![PathBuf::from("raw/a.txt")]]);
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn test_events_are_filtered() {
        let clock = ManualClock::new();
        let mut watcher = watcher(&clock, &ScriptedProbe::new());

        assert!(!watcher.on_event(&created("raw/notes.md")));
        assert!(!watcher.on_event(&ChangeEvent {
            path: PathBuf::from("raw/a.txt"),
            kind: ChangeKind::Removed,
        }));
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn test_growing_file_waits_for_matching_samples() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("raw/a.txt", &[100, 200, 200, 200]);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();

        watcher.on_event(&created("raw/a.txt"));
        clock.advance(Duration::from_millis(800));

        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Completed));
        assert_eq!(probe.samples(), 4);
        // Two stability waits plus one retry interval
        assert_eq!(clock.slept(), Duration::from_millis(1300));
    }

    #[test]
    fn test_unsettled_file_is_abandoned() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        let sizes: Vec<u64> = (1..=40).map(|i| i * 100).collect();
        probe.script("raw/a.txt", &sizes);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();

        watcher.on_event(&created("raw/a.txt"));
        clock.advance(Duration::from_millis(800));

        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Abandoned));
        assert!(runner.runs.is_empty());
        assert_eq!(probe.samples(), 16);
        assert_eq!(watcher.state(), WatcherState::Idle);
    }

    #[test]
    fn test_tiny_file_is_not_ready() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("raw/a.txt", &[3]);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();

        watcher.on_event(&created("raw/a.txt"));
        clock.advance(Duration::from_secs(1));
        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Abandoned));
    }

    #[test]
    fn test_stage_failure_returns_to_idle() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("raw/a.txt", &[64]);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();
        runner.fail = true;

        watcher.on_event(&created("raw/a.txt"));
        clock.advance(Duration::from_secs(1));

        assert_eq!(
            watcher.poll(&mut runner),
            Some(CycleOutcome::Failed("Watcher error: boom".to_string()))
        );
        assert_eq!(watcher.state(), WatcherState::Idle);

        // The next event starts a fresh cycle
        assert!(watcher.on_event(&created("raw/a.txt")));
        assert!(matches!(watcher.state(), WatcherState::Debounced { .. }));
    }

    #[test]
    fn test_artifact_readiness_checks_all_files() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("cleaned/daily-final.csv", &[500]);
        probe.script("cleaned/hourly-final.csv", &[900]);

        let mut watcher = StageWatcher::new(
            EventFilter::Files(vec![PathBuf::from("cleaned/daily-final.csv")]),
            Readiness::Artifacts(vec![
                PathBuf::from("cleaned/daily-final.csv"),
                PathBuf::from("cleaned/hourly-final.csv"),
            ]),
            StabilityPolicy::default(),
            clock.clone(),
            probe.clone(),
        );
        let mut runner = RecordingRunner::new();

        watcher.on_event(&created("cleaned/daily-final.csv"));
        clock.advance(Duration::from_secs(1));
        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Completed));
        assert_eq!(probe.samples(), 4);
    }

    #[test]
    fn test_abandoned_cycle_keeps_stable_triggers() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("raw/a.txt", &[500]);
        // Still growing through every sample of the first cycle
        let mut growing: Vec<u64> = (1..=16).map(|i| i * 100).collect();
        growing.push(1700);
        probe.script("raw/b.txt", &growing);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();

        watcher.on_event(&created("raw/a.txt"));
        watcher.on_event(&created("raw/b.txt"));
        clock.advance(Duration::from_secs(1));
        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Abandoned));
        assert_eq!(watcher.pending().count(), 2);

        watcher.on_event(&ChangeEvent {
            path: PathBuf::from("raw/b.txt"),
            kind: ChangeKind::Modified,
        });
        clock.advance(Duration::from_secs(1));
        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Completed));
        assert_eq!(
            runner.runs,
            vec![vec![PathBuf::from("raw/a.txt"), PathBuf::from("raw/b.txt")]]
        );
    }

    #[test]
    fn test_removed_file_is_withdrawn_from_pending() {
        let clock = ManualClock::new();
        let probe = ScriptedProbe::new();
        probe.script("raw/a.txt", &[3]);
        let mut watcher = watcher(&clock, &probe);
        let mut runner = RecordingRunner::new();

        watcher.on_event(&created("raw/a.txt"));
        clock.advance(Duration::from_secs(1));
        assert_eq!(watcher.poll(&mut runner), Some(CycleOutcome::Abandoned));

        watcher.on_event(&ChangeEvent {
            path: PathBuf::from("raw/a.txt"),
            kind: ChangeKind::Removed,
        });
        assert_eq!(watcher.pending().count(), 0);
        assert_eq!(watcher.state(), WatcherState::Idle);
    }
}
