use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Time source for the watcher; the only place a watcher pauses
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&self, duration: Duration);
}

/// Size of a file as seen right now, `None` when it cannot be read
pub trait SizeProbe {
    fn size(&self, path: &Path) -> Option<u64>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FsProbe;

impl SizeProbe for FsProbe {
    fn size(&self, path: &Path) -> Option<u64> {
        std::fs::metadata(path).ok().map(|m| m.len())
    }
}

/// Clock that only moves when slept on or advanced; clones share time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Instant>>,
    slept: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
            slept: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, duration: Duration) {
        self.now.set(self.now.get() + duration);
    }

    /// Total time spent in `sleep`
    pub fn slept(&self) -> Duration {
        self.slept.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.now.get()
    }

    fn sleep(&self, duration: Duration) {
        self.advance(duration);
        self.slept.set(self.slept.get() + duration);
    }
}

/// Probe that replays scripted sizes per path; the last size repeats
#[derive(Debug, Clone, Default)]
pub struct ScriptedProbe {
    scripts: Rc<RefCell<HashMap<PathBuf, VecDeque<u64>>>>,
    samples: Rc<Cell<usize>>,
}

impl ScriptedProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, path: impl Into<PathBuf>, sizes: &[u64]) {
        self.scripts
            .borrow_mut()
            .insert(path.into(), sizes.iter().copied().collect());
    }

    /// Number of size samples taken so far
    pub fn samples(&self) -> usize {
        self.samples.get()
    }
}

impl SizeProbe for ScriptedProbe {
    fn size(&self, path: &Path) -> Option<u64> {
        self.samples.set(self.samples.get() + 1);
        let mut scripts = self.scripts.borrow_mut();
        let sizes = scripts.get_mut(path)?;
        if sizes.len() > 1 {
            sizes.pop_front()
        } else {
            sizes.front().copied()
        }
    }
}
