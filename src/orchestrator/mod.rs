pub mod change_detector;
pub mod clock;
pub mod pipeline;
pub mod stages;
pub mod watcher;

pub use change_detector::{ChangeDetector, ChangeEvent, ChangeKind};
pub use clock::{Clock, FsProbe, ManualClock, ScriptedProbe, SizeProbe, SystemClock};
pub use pipeline::{IngestBatch, Pipeline, RunSummary};
pub use stages::{watch_stage, CleanStage, EnrichStage, IngestStage, WatchPlan};
pub use watcher::{
    CycleOutcome, EventFilter, Readiness, StabilityPolicy, StageRunner, StageWatcher,
    WatcherState,
};
