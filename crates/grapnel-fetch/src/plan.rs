//! Flattens a content tree into an ordered list of download tasks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use grapnel_remote::{ContentNode, FileNode};

use crate::filter;

/// Options controlling how a content tree becomes download tasks.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlanOptions {
    /// Keep only known video files, dropping blacklisted names.
    pub video_only: bool,
    /// Discard directory structure and place every file in the root.
    pub flatten: bool,
}

/// A single file to fetch, with its final on-disk destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    /// Destination path the bytes will be written to.
    pub destination: PathBuf,
    /// Source URL for the file's bytes.
    pub url: String,
    /// Expected size in bytes.
    pub size: u64,
}

/// Turn `content` into download tasks rooted at `root`, sorted by
/// destination ascending.
///
/// Directory nodes recurse; file nodes are dropped when video-only
/// filtering rejects them. Wire paths are `/`-separated and are
/// re-joined with the local separator unless flattening keeps only the
/// base name.
#[must_use]
pub fn plan_downloads(
    root: &Path,
    content: &BTreeMap<String, ContentNode>,
    options: PlanOptions,
) -> Vec<DownloadTask> {
    let mut tasks = Vec::new();
    collect(root, content, options, &mut tasks);
    tasks.sort_by(|a, b| a.destination.cmp(&b.destination));
    tasks
}

fn collect(
    root: &Path,
    nodes: &BTreeMap<String, ContentNode>,
    options: PlanOptions,
    tasks: &mut Vec<DownloadTask>,
) {
    for node in nodes.values() {
        match node {
            ContentNode::File(file) => {
                if options.video_only && !filter::is_downloadable_video(file) {
                    continue;
                }
                tasks.push(to_task(root, file, options.flatten));
            }
            ContentNode::Dir(dir) => collect(root, &dir.children, options, tasks),
        }
    }
}

fn to_task(root: &Path, file: &FileNode, flatten: bool) -> DownloadTask {
    let wire_path = if file.path.is_empty() {
        file.name.as_str()
    } else {
        file.path.as_str()
    };
    let destination = if flatten {
        root.join(basename(wire_path))
    } else {
        root.join(relative_path(wire_path))
    };

    DownloadTask {
        destination,
        url: file.url.clone(),
        size: file.size,
    }
}

fn relative_path(path: &str) -> PathBuf {
    path.split('/').collect()
}

fn basename(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, path: &str, ext: &str, size: u64) -> ContentNode {
        ContentNode::File(FileNode {
            name: name.to_string(),
            path: path.to_string(),
            url: format!("https://cdn/{path}"),
            ext: ext.to_string(),
            size,
        })
    }

    fn sample_tree() -> BTreeMap<String, ContentNode> {
        let mut subs = BTreeMap::new();
        subs.insert(
            "eng.srt".to_string(),
            file("eng.srt", "Movie/Subs/eng.srt", "srt", 3),
        );

        let mut movie = BTreeMap::new();
        movie.insert(
            "movie.mkv".to_string(),
            file("movie.mkv", "Movie/movie.mkv", "mkv", 700),
        );
        movie.insert(
            "movie.sample.mkv".to_string(),
            file("movie.sample.mkv", "Movie/movie.sample.mkv", "mkv", 50),
        );
        movie.insert(
            "Subs".to_string(),
            ContentNode::Dir(grapnel_remote::DirNode { children: subs }),
        );

        let mut root = BTreeMap::new();
        root.insert(
            "Movie".to_string(),
            ContentNode::Dir(grapnel_remote::DirNode { children: movie }),
        );
        root
    }

    #[test]
    fn plan_preserves_tree_paths_with_local_separators() {
        let tasks = plan_downloads(Path::new("dl"), &sample_tree(), PlanOptions::default());

        let destinations: Vec<_> = tasks.iter().map(|task| task.destination.clone()).collect();
        assert_eq!(
            destinations,
            vec![
                Path::new("dl").join("Movie").join("Subs").join("eng.srt"),
                Path::new("dl").join("Movie").join("movie.mkv"),
                Path::new("dl").join("Movie").join("movie.sample.mkv"),
            ]
        );
    }

    #[test]
    fn video_only_drops_non_video_and_blacklisted_files() {
        let options = PlanOptions {
            video_only: true,
            flatten: false,
        };
        let tasks = plan_downloads(Path::new("dl"), &sample_tree(), options);

        assert_eq!(tasks.len(), 1);
        assert_eq!(
            tasks[0].destination,
            Path::new("dl").join("Movie").join("movie.mkv")
        );
        assert_eq!(tasks[0].size, 700);
    }

    #[test]
    fn flatten_keeps_only_base_names() {
        let options = PlanOptions {
            video_only: false,
            flatten: true,
        };
        let tasks = plan_downloads(Path::new("dl"), &sample_tree(), options);

        let destinations: Vec<_> = tasks.iter().map(|task| task.destination.clone()).collect();
        assert_eq!(
            destinations,
            vec![
                Path::new("dl").join("eng.srt"),
                Path::new("dl").join("movie.mkv"),
                Path::new("dl").join("movie.sample.mkv"),
            ]
        );
    }

    #[test]
    fn tasks_are_sorted_by_destination() {
        let mut root = BTreeMap::new();
        root.insert("zeta.bin".to_string(), file("zeta.bin", "zeta.bin", "bin", 1));
        root.insert(
            "alpha.bin".to_string(),
            file("alpha.bin", "alpha.bin", "bin", 1),
        );
        root.insert("mid.bin".to_string(), file("mid.bin", "mid.bin", "bin", 1));

        let tasks = plan_downloads(Path::new("out"), &root, PlanOptions::default());
        let mut sorted = tasks.clone();
        sorted.sort_by(|a, b| a.destination.cmp(&b.destination));
        assert_eq!(tasks, sorted);
    }

    #[test]
    fn empty_wire_path_falls_back_to_name() {
        let mut root = BTreeMap::new();
        root.insert("solo.mkv".to_string(), file("solo.mkv", "", "mkv", 9));

        let tasks = plan_downloads(Path::new("out"), &root, PlanOptions::default());
        assert_eq!(tasks[0].destination, Path::new("out").join("solo.mkv"));
    }
}
