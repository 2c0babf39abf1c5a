//! Course manifests and the deterministic mapping from items to files.

use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::fs::FileSystem;

/// Item type eligible for download.
pub const VIDEO_KIND: &str = "video";

/// One entry of a course manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    /// Position of the item within the course.
    pub index: i64,
    /// Opaque identifier used to query the platform.
    #[serde(rename = "dynamic-part")]
    pub dynamic_part: String,
    /// Set once the video has been fully written to disk.
    #[serde(default)]
    pub downloaded: bool,
    /// Display name, also used to derive the file name.
    pub name: String,
    /// Item type; only `video` items are downloaded.
    #[serde(rename = "type")]
    pub kind: String,
    /// Fields this tool does not interpret, kept across rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Item {
    /// Returns true for `video` items.
    #[must_use]
    pub fn is_video(&self) -> bool {
        self.kind == VIDEO_KIND
    }

    /// Returns true for videos not yet downloaded.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.is_video() && !self.downloaded
    }
}

/// A course: a named list of items and their completion state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// Course name, used as the output subdirectory.
    pub name: String,
    /// Declared item count. Not trusted; use `items.len()`.
    #[serde(
        rename = "item-count",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub item_count: Option<i64>,
    /// Course items in manifest order.
    pub items: Vec<Item>,
    /// Fields this tool does not interpret, kept across rewrites.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Manifest {
    /// Decodes a manifest from JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if the text is not a valid manifest.
    pub fn from_json(path: &Path, text: &str) -> Result<Self> {
        let manifest: Self = serde_json::from_str(text).map_err(|source| Error::Manifest {
            path: path.display().to_string(),
            source,
        })?;
        if let Some(count) = manifest.item_count
            && usize::try_from(count).ok() != Some(manifest.items.len())
        {
            log::warn!(
                "{}: item-count is {count} but {} items are listed; using the listed items",
                path.display(),
                manifest.items.len()
            );
        }
        Ok(manifest)
    }

    /// Reads and decodes a manifest file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or decoded.
    pub async fn load<F: FileSystem + ?Sized>(fs: &F, path: &Path) -> Result<Self> {
        let text = fs.read_to_string(path).await?;
        Self::from_json(path, &text)
    }

    /// Encodes the manifest as indented JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Manifest`] if encoding fails.
    pub fn to_pretty_json(&self, path: &Path) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|source| Error::Manifest {
            path: path.display().to_string(),
            source,
        })
    }

    /// Rewrites the manifest file in full, atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if encoding or writing fails. The previous file is
    /// left intact in that case.
    pub async fn save<F: FileSystem + ?Sized>(&self, fs: &F, path: &Path) -> Result<()> {
        let json = self.to_pretty_json(path)?;
        fs.write_atomic(path, json.as_bytes()).await?;
        Ok(())
    }

    /// Number of `video` items.
    #[must_use]
    pub fn video_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_video()).count()
    }

    /// Number of videos still to download.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_pending()).count()
    }
}

/// Replaces path separators in an item name so it stays one path component.
#[must_use]
pub fn sanitize_name(name: &str) -> String {
    name.replace('/', "_")
}

/// Turns a manifest name into a path relative to the output root.
///
/// Only normal components are kept, so root, drive prefix, `.` and `..`
/// cannot move a course outside the output directory.
fn relative_course_path(manifest_name: &str) -> PathBuf {
    let relative: PathBuf = Path::new(manifest_name)
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect();
    if relative.as_os_str().is_empty() {
        PathBuf::from("_")
    } else {
        relative
    }
}

/// Maps manifest items to output files.
///
/// The target of an item depends only on the manifest name and item name,
/// so repeated runs and the verification pass agree on every path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetLayout {
    output_dir: PathBuf,
    extension: String,
}

impl TargetLayout {
    /// Creates a layout rooted at `output_dir`.
    #[must_use]
    pub fn new(output_dir: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            extension: extension.into(),
        }
    }

    /// Root directory of the layout.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Directory holding a course's videos, always below the output root.
    #[must_use]
    pub fn course_dir(&self, manifest_name: &str) -> PathBuf {
        self.output_dir.join(relative_course_path(manifest_name))
    }

    /// File an item's video is written to.
    #[must_use]
    pub fn target_for(&self, manifest_name: &str, item_name: &str) -> PathBuf {
        self.course_dir(manifest_name)
            .join(format!("{}.{}", sanitize_name(item_name), self.extension))
    }

    /// File for the `position`-th id in direct mode, e.g. `lesson3.mp4`.
    #[must_use]
    pub fn numbered(&self, prefix: &str, position: usize) -> PathBuf {
        self.output_dir.join(format!(
            "{}{position}.{}",
            sanitize_name(prefix),
            self.extension
        ))
    }
}

/// Lists `*.json` files directly under `dir`, sorted by path.
///
/// A missing directory yields an empty list.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be read.
pub async fn discover(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::warn!("Manifest directory {} does not exist", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut paths = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "json") && entry.file_type().await?.is_file()
        {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::TokioFileSystem;
    use tempfile::TempDir;

    const COURSE: &str = r#"{
        "name": "CourseX",
        "item-count": 3,
        "items": [
            {"index": 0, "dynamic-part": "abc123", "downloaded": false, "name": "Intro", "type": "video"},
            {"index": 1, "dynamic-part": "", "downloaded": false, "name": "Quiz 1", "type": "quiz", "score": 10},
            {"index": 2, "dynamic-part": "def456", "downloaded": true, "name": "Part 1/2", "type": "video"}
        ],
        "source": "export-v2"
    }"#;

    #[test]
    fn decodes_manifest() {
        let manifest = Manifest::from_json(Path::new("c.json"), COURSE).unwrap();
        assert_eq!(manifest.name, "CourseX");
        assert_eq!(manifest.items.len(), 3);
        assert_eq!(manifest.items[0].dynamic_part, "abc123");
        assert_eq!(manifest.video_count(), 2);
        assert_eq!(manifest.pending_count(), 1);
        assert!(!manifest.items[1].is_video());
    }

    #[test]
    fn unknown_fields_survive_rewrite() {
        let manifest = Manifest::from_json(Path::new("c.json"), COURSE).unwrap();
        let json = manifest.to_pretty_json(Path::new("c.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["source"], "export-v2");
        assert_eq!(value["items"][1]["score"], 10);
        assert_eq!(value["items"][0]["dynamic-part"], "abc123");
        assert_eq!(value["item-count"], 3);
    }

    #[test]
    fn rewrite_is_indented() {
        let manifest = Manifest::from_json(Path::new("c.json"), COURSE).unwrap();
        let json = manifest.to_pretty_json(Path::new("c.json")).unwrap();
        assert!(json.contains("\n  \"name\": \"CourseX\""));
        assert!(json.contains("\"downloaded\": true"));
    }

    #[test]
    fn count_mismatch_is_tolerated() {
        let text = r#"{"name":"C","item-count":99,"items":[
            {"index":0,"dynamic-part":"a","downloaded":false,"name":"A","type":"video"}]}"#;
        let manifest = Manifest::from_json(Path::new("c.json"), text).unwrap();
        assert_eq!(manifest.items.len(), 1);
    }

    #[test]
    fn missing_field_is_typed_error() {
        let text = r#"{"name":"C","item-count":1,"items":[{"index":0,"downloaded":false,"name":"A","type":"video"}]}"#;
        assert!(matches!(
            Manifest::from_json(Path::new("bad.json"), text),
            Err(Error::Manifest { path, .. }) if path == "bad.json"
        ));
    }

    #[test]
    fn target_path_is_derived_from_names() {
        let layout = TargetLayout::new("/data", "mp4");
        assert_eq!(
            layout.target_for("CourseX", "Intro"),
            PathBuf::from("/data/CourseX/Intro.mp4")
        );
        assert_eq!(
            layout.target_for("CourseX", "Part 1/2"),
            PathBuf::from("/data/CourseX/Part 1_2.mp4")
        );
    }

    #[test]
    fn course_dir_stays_under_output_root() {
        let layout = TargetLayout::new("/data", "mp4");
        assert_eq!(
            layout.course_dir("/tmp/x/Escaped"),
            PathBuf::from("/data/tmp/x/Escaped")
        );
        assert_eq!(
            layout.course_dir("../../etc/Course"),
            PathBuf::from("/data/etc/Course")
        );
        assert_eq!(layout.course_dir("./Intro/./Part"), PathBuf::from("/data/Intro/Part"));
        assert_eq!(layout.course_dir(".."), PathBuf::from("/data/_"));
        assert_eq!(layout.course_dir(""), PathBuf::from("/data/_"));
        assert_eq!(
            layout.target_for("/abs/Course", "Intro"),
            PathBuf::from("/data/abs/Course/Intro.mp4")
        );
    }

    #[test]
    fn optional_fields_default() {
        let text = r#"{"name":"C","items":[
            {"index":0,"dynamic-part":"a","name":"A","type":"video"}]}"#;
        let manifest = Manifest::from_json(Path::new("c.json"), text).unwrap();
        assert_eq!(manifest.item_count, None);
        assert!(!manifest.items[0].downloaded);
        assert_eq!(manifest.pending_count(), 1);

        let json = manifest.to_pretty_json(Path::new("c.json")).unwrap();
        assert!(!json.contains("item-count"));
    }

    #[test]
    fn numbered_targets() {
        let layout = TargetLayout::new(".", "mp4");
        assert_eq!(layout.numbered("lesson", 3), PathBuf::from("./lesson3.mp4"));
        assert_eq!(layout.numbered("", 1), PathBuf::from("./1.mp4"));
    }

    #[tokio::test]
    async fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("course.json");
        let fs = TokioFileSystem::new();

        let mut manifest = Manifest::from_json(&path, COURSE).unwrap();
        manifest.items[0].downloaded = true;
        manifest.save(&fs, &path).await.unwrap();

        let loaded = Manifest::load(&fs, &path).await.unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.pending_count(), 0);
    }

    #[tokio::test]
    async fn discover_lists_json_files_sorted() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.json"), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();
        std::fs::create_dir(dir.path().join("dir.json")).unwrap();

        let found = discover(dir.path()).await.unwrap();
        assert_eq!(
            found,
            vec![dir.path().join("a.json"), dir.path().join("b.json")]
        );
    }

    #[tokio::test]
    async fn discover_missing_dir_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(discover(&dir.path().join("jsons")).await.unwrap().is_empty());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn target_is_one_component_below_course_dir(
                course in "[A-Za-z0-9 ]{1,16}",
                item in "\\PC{1,24}",
            ) {
                let layout = TargetLayout::new("/out", "mp4");
                let target = layout.target_for(&course, &item);
                let course_dir = layout.course_dir(&course);
                prop_assert_eq!(target.parent(), Some(course_dir.as_path()));
                prop_assert_eq!(target.clone(), layout.target_for(&course, &item));
            }
        }
    }
}
