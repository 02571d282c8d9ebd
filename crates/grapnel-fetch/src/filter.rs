//! Video-file selection rules applied by the planner.

use grapnel_remote::FileNode;

/// Container extensions accepted when video-only filtering is active.
const VIDEO_EXTENSIONS: [&str; 30] = [
    "webm", "mkv", "flv", "vob", "ogg", "ogv", "drc", "avi", "qt", "wmv", "rm", "rmvb", "asf",
    "amv", "mp4", "m4p", "m4v", "mpg", "mp2", "mpeg", "mpe", "mpv", "m2v", "3gp", "3g2", "mxf",
    "f4v", "f4p", "f4a", "f4b",
];

/// Substrings that disqualify a file name regardless of extension.
/// Matched with both sides lowercased.
const NAME_BLACKLIST: [&str; 2] = ["sample", "ragb"];

/// Whether `ext` names a known video container, ignoring case.
#[must_use]
pub fn is_video_extension(ext: &str) -> bool {
    let ext = ext.to_ascii_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str())
}

/// Whether `name` contains a blacklisted substring, ignoring case.
#[must_use]
pub fn is_blacklisted(name: &str) -> bool {
    let name = name.to_lowercase();
    NAME_BLACKLIST.iter().any(|word| name.contains(word))
}

/// Whether `file` passes the video-only filter: a known video
/// extension and no blacklisted substring in its display name.
#[must_use]
pub fn is_downloadable_video(file: &FileNode) -> bool {
    is_video_extension(&file.ext) && !is_blacklisted(&file.name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, ext: &str) -> FileNode {
        FileNode {
            name: name.to_string(),
            path: name.to_string(),
            url: format!("https://cdn/{name}"),
            ext: ext.to_string(),
            size: 1,
        }
    }

    #[test]
    fn extension_check_ignores_case() {
        assert!(is_video_extension("mkv"));
        assert!(is_video_extension("MKV"));
        assert!(!is_video_extension("srt"));
        assert!(!is_video_extension(""));
    }

    #[test]
    fn blacklist_matches_either_case() {
        assert!(is_blacklisted("Movie.SAMPLE.mkv"));
        assert!(is_blacklisted("movie.sample.mkv"));
        assert!(is_blacklisted("Ragb-Release.mkv"));
        assert!(is_blacklisted("ragb-release.mkv"));
        assert!(!is_blacklisted("movie.mkv"));
    }

    #[test]
    fn downloadable_video_requires_both_rules() {
        assert!(is_downloadable_video(&file("movie.mkv", "mkv")));
        assert!(!is_downloadable_video(&file("movie.sample.mkv", "mkv")));
        assert!(!is_downloadable_video(&file("subtitles.srt", "srt")));
    }
}
