//! Periodic directory scanning with fan-out to subscribers.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use regex::Regex;
use tokio::sync::mpsc;
use walkdir::WalkDir;

use crate::error::{WatchError, WatchResult};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Walks a directory tree on a fixed interval and publishes every file
/// whose path matches the configured pattern.
///
/// Matching paths are delivered to all subscribers in registration
/// order on every pass; no deduplication is applied, so a file keeps
/// producing events until it is removed from the tree.
#[derive(Debug)]
pub struct DirectoryScanner {
    base_dir: PathBuf,
    pattern: Regex,
    interval: Duration,
    subscribers: Vec<mpsc::Sender<PathBuf>>,
    started: AtomicBool,
}

impl DirectoryScanner {
    /// Build a scanner over `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `base_dir` cannot be inspected or is not a
    /// directory, or if `pattern` is not a valid regular expression.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        pattern: &str,
        interval: Duration,
    ) -> WatchResult<Self> {
        const OPERATION: &str = "scanner_init";
        let base_dir = base_dir.into();
        let metadata = std::fs::metadata(&base_dir)
            .map_err(|source| WatchError::io(OPERATION, &base_dir, source))?;
        if !metadata.is_dir() {
            return Err(WatchError::not_a_directory(base_dir));
        }
        let pattern =
            Regex::new(pattern).map_err(|source| WatchError::pattern(pattern, source))?;
        Ok(Self {
            base_dir,
            pattern,
            interval,
            subscribers: Vec::new(),
            started: AtomicBool::new(false),
        })
    }

    /// Register a new subscriber and return its event receiver.
    ///
    /// Subscriptions made after [`DirectoryScanner::start`] are not
    /// seen by the running scan loop.
    #[must_use]
    pub fn subscribe(&mut self) -> mpsc::Receiver<PathBuf> {
        let (sender, receiver) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        self.subscribers.push(sender);
        receiver
    }

    /// Spawn the background scan loop.
    ///
    /// The first pass runs immediately; subsequent passes are spaced by
    /// the configured interval. Calling this more than once has no
    /// effect.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let base_dir = self.base_dir.clone();
        let pattern = self.pattern.clone();
        let interval = self.interval;
        let subscribers = self.subscribers.clone();
        tokio::spawn(async move {
            loop {
                scan_once(&base_dir, &pattern, &subscribers).await;
                tokio::time::sleep(interval).await;
            }
        });
    }
}

async fn scan_once(base_dir: &Path, pattern: &Regex, subscribers: &[mpsc::Sender<PathBuf>]) {
    for entry in WalkDir::new(base_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(error) => {
                tracing::debug!(error = %error, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        // Paths that are not valid UTF-8 cannot match the pattern.
        let Some(text) = path.to_str() else { continue };
        if !pattern.is_match(text) {
            continue;
        }
        for subscriber in subscribers {
            if subscriber.send(path.to_path_buf()).await.is_err() {
                tracing::debug!(path = %path.display(), "subscriber closed, event dropped");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::timeout;

    fn drain(receiver: &mut mpsc::Receiver<PathBuf>) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        while let Ok(path) = receiver.try_recv() {
            paths.push(path);
        }
        paths.sort();
        paths
    }

    #[tokio::test]
    async fn scan_delivers_matching_files_to_every_subscriber() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("a.torrent"), b"x").expect("write a");
        std::fs::write(dir.path().join("notes.txt"), b"x").expect("write notes");
        std::fs::create_dir(dir.path().join("nested")).expect("create nested");
        std::fs::write(dir.path().join("nested").join("b.torrent"), b"x").expect("write b");

        let mut scanner =
            DirectoryScanner::new(dir.path(), r".*?\.torrent", Duration::from_secs(60))
                .expect("scanner");
        let mut first = scanner.subscribe();
        let mut second = scanner.subscribe();

        scan_once(&scanner.base_dir, &scanner.pattern, &scanner.subscribers).await;

        let expected = vec![
            dir.path().join("a.torrent"),
            dir.path().join("nested").join("b.torrent"),
        ];
        assert_eq!(drain(&mut first), expected);
        assert_eq!(drain(&mut second), expected);
    }

    #[tokio::test]
    async fn removed_files_stop_producing_events() {
        let dir = tempfile::tempdir().expect("temp dir");
        let file = dir.path().join("solo.torrent");
        std::fs::write(&file, b"x").expect("write file");

        let mut scanner =
            DirectoryScanner::new(dir.path(), r".*?\.torrent", Duration::from_secs(60))
                .expect("scanner");
        let mut events = scanner.subscribe();

        scan_once(&scanner.base_dir, &scanner.pattern, &scanner.subscribers).await;
        assert_eq!(drain(&mut events), vec![file.clone()]);

        std::fs::remove_file(&file).expect("remove file");
        scan_once(&scanner.base_dir, &scanner.pattern, &scanner.subscribers).await;
        assert!(drain(&mut events).is_empty());
    }

    #[tokio::test]
    async fn start_spawns_a_single_scan_loop() {
        let dir = tempfile::tempdir().expect("temp dir");
        std::fs::write(dir.path().join("once.torrent"), b"x").expect("write file");

        let mut scanner =
            DirectoryScanner::new(dir.path(), r".*?\.torrent", Duration::from_secs(60))
                .expect("scanner");
        let mut events = scanner.subscribe();

        scanner.start();
        scanner.start();

        let first = timeout(Duration::from_secs(1), events.recv())
            .await
            .expect("first scan pass should deliver an event");
        assert_eq!(first, Some(dir.path().join("once.torrent")));

        // A second running loop would deliver a duplicate immediately.
        assert!(
            timeout(Duration::from_millis(200), events.recv())
                .await
                .is_err(),
            "no duplicate event expected before the next interval"
        );
    }

    #[test]
    fn rejects_missing_directory_and_bad_pattern() {
        let dir = tempfile::tempdir().expect("temp dir");

        let missing = DirectoryScanner::new(
            dir.path().join("absent"),
            r".*?\.torrent",
            Duration::from_secs(1),
        );
        assert!(matches!(missing, Err(WatchError::Io { .. })));

        let not_dir_path = dir.path().join("plain.txt");
        std::fs::write(&not_dir_path, b"x").expect("write file");
        let not_dir = DirectoryScanner::new(&not_dir_path, r".*?\.torrent", Duration::from_secs(1));
        assert!(matches!(not_dir, Err(WatchError::NotADirectory { .. })));

        let bad_pattern = DirectoryScanner::new(dir.path(), "([", Duration::from_secs(1));
        assert!(matches!(bad_pattern, Err(WatchError::Pattern { .. })));
    }
}
