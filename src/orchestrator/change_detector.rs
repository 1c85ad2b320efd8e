use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::WalkDir;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: PathBuf,
    pub kind: ChangeKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    len: u64,
    modified: Option<SystemTime>,
}

/// Polling watcher over one directory tree.
///
/// The first snapshot is the baseline: files already present when the
/// detector starts produce no events.
pub struct ChangeDetector {
    root: PathBuf,
    max_depth: usize,
    snapshot: HashMap<PathBuf, FileStamp>,
}

impl ChangeDetector {
    pub fn new(root: impl Into<PathBuf>, max_depth: usize) -> Result<Self> {
        let mut detector = Self {
            root: root.into(),
            max_depth,
            snapshot: HashMap::new(),
        };
        detector.snapshot = detector.take_snapshot()?;
        Ok(detector)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Diff the tree against the previous scan
    pub fn scan(&mut self) -> Result<Vec<ChangeEvent>> {
        let current = self.take_snapshot()?;
        let mut events = Vec::new();

        for (path, stamp) in &current {
            match self.snapshot.get(path) {
                None => events.push(ChangeEvent {
                    path: path.clone(),
                    kind: ChangeKind::Created,
                }),
                Some(previous) if previous != stamp => events.push(ChangeEvent {
                    path: path.clone(),
                    kind: ChangeKind::Modified,
                }),
                Some(_) => {}
            }
        }

        for path in self.snapshot.keys() {
            if !current.contains_key(path) {
                events.push(ChangeEvent {
                    path: path.clone(),
                    kind: ChangeKind::Removed,
                });
            }
        }

        events.sort_by(|a, b| a.path.cmp(&b.path));
        self.snapshot = current;
        Ok(events)
    }

    fn take_snapshot(&self) -> Result<HashMap<PathBuf, FileStamp>> {
        let mut snapshot = HashMap::new();
        if !self.root.exists() {
            return Ok(snapshot);
        }

        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(self.max_depth) {
            let entry = match entry {
                Ok(entry) => entry,
                // A file renamed away mid-walk is picked up next scan
                Err(e) if e.io_error().is_some_and(|io| io.kind() == std::io::ErrorKind::NotFound) => {
                    continue
                }
                Err(e) => return Err(e.into()),
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(_) => continue,
            };
            snapshot.insert(
                entry.into_path(),
                FileStamp {
                    len: metadata.len(),
                    modified: metadata.modified().ok(),
                },
            );
        }

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_baseline_then_changes() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("old.txt"), "existing")?;

        let mut detector = ChangeDetector::new(dir.path(), 1)?;
        assert!(detector.scan()?.is_empty());

        fs::write(dir.path().join("new.txt"), "fresh")?;
        fs::write(dir.path().join("old.txt"), "existing plus more")?;

        let events = detector.scan()?;
        assert_eq!(
            events,
            vec![
                ChangeEvent {
                    path: dir.path().join("new.txt"),
                    kind: ChangeKind::Created
                },
                ChangeEvent {
                    path: dir.path().join("old.txt"),
                    kind: ChangeKind::Modified
                },
            ]
        );

        fs::remove_file(dir.path().join("new.txt"))?;
        let events = detector.scan()?;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ChangeKind::Removed);

        Ok(())
    }

    #[test]
    fn test_depth_limit() -> Result<()> {
        let dir = TempDir::new()?;
        let mut detector = ChangeDetector::new(dir.path(), 1)?;

        fs::create_dir_all(dir.path().join("nested"))?;
        fs::write(dir.path().join("nested/deep.csv"), "x")?;
        assert!(detector.scan()?.is_empty());

        Ok(())
    }

    #[test]
    fn test_missing_root_is_empty() -> Result<()> {
        let mut detector = ChangeDetector::new("/nonexistent/raw", 1)?;
        assert!(detector.scan()?.is_empty());
        Ok(())
    }
}
