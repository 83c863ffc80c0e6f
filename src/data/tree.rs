//! File-tree snapshots of a directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::ReportError;

/// Directories never descended into (hidden directories are skipped too).
pub const SKIP_DIRS: [&str; 7] = [
    "venv",
    ".git",
    "__pycache__",
    "node_modules",
    "dist",
    "build",
    "target",
];

/// File extensions included in a snapshot.
pub const INCLUDED_EXTENSIONS: [&str; 35] = [
    "py", "md", "txt", "json", "js", "jsx", "ts", "tsx", "cs", "rs", "go", "java", "php", "rb",
    "swift", "kt", "cpp", "c", "h", "hpp", "sh", "bat", "yml", "yaml", "xml", "html", "css",
    "scss", "less", "sass", "sql", "csv", "tsv", "jsonl", "toml",
];

/// Maximum number of included files.
pub const MAX_FILES: usize = 500;

/// Maximum total size of included files, in bytes.
pub const MAX_TOTAL_BYTES: u64 = 50 * 1024 * 1024;

/// Files larger than this are recorded without content, in bytes.
pub const MAX_SINGLE_FILE_BYTES: u64 = 500 * 1024;

/// Decides which files and directories belong in a snapshot.
#[derive(Debug, Clone)]
pub struct FileFilter {
    included: GlobSet,
}

impl FileFilter {
    /// Builds a filter from bare extensions (without the dot).
    pub fn with_extensions(extensions: &[&str]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();
        for ext in extensions {
            builder.add(
                Glob::new(&format!("*.{ext}"))
                    .with_context(|| format!("Invalid extension pattern: {ext}"))?,
            );
        }
        let included = builder.build().context("Failed to build file filter")?;
        Ok(Self { included })
    }

    /// The default code-and-docs filter.
    pub fn code_files() -> Result<Self> {
        Self::with_extensions(&INCLUDED_EXTENSIONS)
    }

    /// Every non-hidden file.
    pub fn any_visible_file() -> Result<Self> {
        let included = GlobSetBuilder::new()
            .add(Glob::new("[!.]*").context("Invalid visible-file pattern")?)
            .build()
            .context("Failed to build file filter")?;
        Ok(Self { included })
    }

    /// Whether a file name is included.
    pub fn includes_file(&self, file_name: &str) -> bool {
        self.included.is_match(file_name)
    }

    /// Whether a directory should be descended into.
    pub fn includes_dir(&self, dir_name: &str) -> bool {
        !dir_name.starts_with('.') && !SKIP_DIRS.contains(&dir_name)
    }
}

/// One entry of a snapshot. Serializes to the `{"type": ...}` JSON form sent
/// to the model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    /// A directory with its entries sorted by name.
    Folder {
        /// Entries keyed by name.
        contents: BTreeMap<String, TreeNode>,
    },
    /// A file with its text content (or a note when it was not read).
    File {
        /// File text or a note.
        content: String,
    },
}

/// Snapshot of a directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeSnapshot {
    /// Directory the snapshot was taken from.
    pub root: PathBuf,
    /// Top-level entries.
    pub entries: BTreeMap<String, TreeNode>,
}

/// File and size totals for a directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SizeStats {
    /// Included files under the single-file limit.
    pub files: usize,
    /// Their total size in bytes.
    pub bytes: u64,
}

impl SizeStats {
    /// Total size in megabytes.
    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / (1024.0 * 1024.0)
    }
}

/// Counts included files and bytes, skipping files over the single-file limit.
pub fn measure(root: &Path, filter: &FileFilter) -> Result<SizeStats> {
    let mut stats = SizeStats::default();
    visit_files(root, filter, &mut |_, size| {
        if size <= MAX_SINGLE_FILE_BYTES {
            stats.files += 1;
            stats.bytes += size;
        }
    })?;
    Ok(stats)
}

/// Fails with [`ReportError::SizeLimitExceeded`] if the directory is too large.
pub fn validate_size(root: &Path, filter: &FileFilter) -> Result<SizeStats> {
    let stats = measure(root, filter)?;
    debug!(files = stats.files, bytes = stats.bytes, "Measured directory");

    if stats.files > MAX_FILES {
        return Err(ReportError::SizeLimitExceeded(format!(
            "Repository has {} files (limit: {MAX_FILES})",
            stats.files
        ))
        .into());
    }
    if stats.bytes > MAX_TOTAL_BYTES {
        return Err(ReportError::SizeLimitExceeded(format!(
            "Repository size is {:.1}MB (limit: {}MB)",
            stats.megabytes(),
            MAX_TOTAL_BYTES / (1024 * 1024)
        ))
        .into());
    }
    Ok(stats)
}

/// Lists included files as paths relative to `root`, sorted.
pub fn list_files(root: &Path, filter: &FileFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    visit_files(root, filter, &mut |path, _| {
        files.push(path.strip_prefix(root).unwrap_or(path).to_path_buf());
    })?;
    files.sort();
    Ok(files)
}

/// Included files grouped by directory relative to `root` (`.` for the root
/// itself). Directories and file names are sorted.
pub fn files_by_directory(
    root: &Path,
    filter: &FileFilter,
) -> Result<BTreeMap<PathBuf, Vec<String>>> {
    let mut groups: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();
    for path in list_files(root, filter)? {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        if let Some(name) = path.file_name() {
            groups
                .entry(dir)
                .or_default()
                .push(name.to_string_lossy().into_owned());
        }
    }
    Ok(groups)
}

fn visit_files(
    dir: &Path,
    filter: &FileFilter,
    visitor: &mut dyn FnMut(&Path, u64),
) -> Result<()> {
    for entry in sorted_entries(dir)? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", path.display()))?;

        if file_type.is_dir() {
            if filter.includes_dir(&name) {
                visit_files(&path, filter, visitor)?;
            }
        } else if file_type.is_file() && filter.includes_file(&name) {
            match entry.metadata() {
                Ok(meta) => visitor(&path, meta.len()),
                Err(e) => warn!(path = %path.display(), "Skipping unreadable file: {e}"),
            }
        }
    }
    Ok(())
}

fn sorted_entries(dir: &Path) -> Result<Vec<fs::DirEntry>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory {}", dir.display()))?;
    entries.sort_by_key(fs::DirEntry::file_name);
    Ok(entries)
}

impl TreeSnapshot {
    /// Walks `root` into a snapshot including file contents.
    pub fn capture(root: &Path, filter: &FileFilter) -> Result<Self> {
        if !root.is_dir() {
            return Err(ReportError::InputNotFound(root.to_path_buf()).into());
        }
        Ok(Self {
            root: root.to_path_buf(),
            entries: capture_dir(root, filter)?,
        })
    }

    /// Pretty-printed JSON of the entries.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(&self.entries).context("Failed to serialize file tree")
    }

    /// Counts (files, folders) in the snapshot.
    pub fn counts(&self) -> (usize, usize) {
        count_nodes(&self.entries)
    }

    /// Files per extension, most common first (ties by extension).
    pub fn file_types(&self) -> Vec<(String, usize)> {
        let mut types = BTreeMap::new();
        collect_types(&self.entries, &mut types);
        let mut types: Vec<(String, usize)> = types.into_iter().collect();
        types.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        types
    }

    /// Renders the tree with box-drawing connectors, one entry per line.
    ///
    /// Folder names carry a trailing `/`.
    pub fn text_tree(&self) -> Vec<TreeLine> {
        let mut lines = Vec::new();
        push_tree_lines(&self.entries, "", &mut lines);
        lines
    }
}

/// One rendered line of [`TreeSnapshot::text_tree`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeLine {
    /// Connector prefix such as `"│   ├── "`.
    pub prefix: String,
    /// Entry name.
    pub name: String,
    /// Whether the entry is a folder.
    pub is_folder: bool,
}

fn capture_dir(dir: &Path, filter: &FileFilter) -> Result<BTreeMap<String, TreeNode>> {
    let mut contents = BTreeMap::new();

    for entry in sorted_entries(dir)? {
        let path = entry.path();
        let name = entry.file_name().to_string_lossy().into_owned();
        let file_type = entry
            .file_type()
            .with_context(|| format!("Failed to stat {}", path.display()))?;

        if file_type.is_dir() {
            if filter.includes_dir(&name) {
                let sub = capture_dir(&path, filter)?;
                contents.insert(name, TreeNode::Folder { contents: sub });
            }
        } else if file_type.is_file() && filter.includes_file(&name) {
            contents.insert(name, TreeNode::File {
                content: read_file_note(&path),
            });
        }
    }

    Ok(contents)
}

/// Reads a file as text, or returns a `# ...` note when it is too large or
/// unreadable.
pub fn read_file_note(path: &Path) -> String {
    let size = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(e) => return format!("# Error reading file: {e}"),
    };
    if size > MAX_SINGLE_FILE_BYTES {
        return format!(
            "# File too large ({:.1}KB) - skipped for analysis",
            size as f64 / 1024.0
        );
    }
    match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), "Failed to read file: {e}");
            format!("# Error reading file: {e}")
        }
    }
}

fn count_nodes(entries: &BTreeMap<String, TreeNode>) -> (usize, usize) {
    entries.values().fold((0, 0), |(files, folders), node| match node {
        TreeNode::File { .. } => (files + 1, folders),
        TreeNode::Folder { contents } => {
            let (sub_files, sub_folders) = count_nodes(contents);
            (files + sub_files, folders + 1 + sub_folders)
        }
    })
}

fn collect_types(entries: &BTreeMap<String, TreeNode>, types: &mut BTreeMap<String, usize>) {
    for (name, node) in entries {
        match node {
            TreeNode::File { .. } => {
                let ext = Path::new(name)
                    .extension()
                    .and_then(|e| e.to_str())
                    .map_or_else(|| "no extension".to_string(), |e| format!(".{e}"));
                *types.entry(ext).or_insert(0) += 1;
            }
            TreeNode::Folder { contents } => collect_types(contents, types),
        }
    }
}

fn push_tree_lines(entries: &BTreeMap<String, TreeNode>, indent: &str, lines: &mut Vec<TreeLine>) {
    let last = entries.len().saturating_sub(1);
    for (i, (name, node)) in entries.iter().enumerate() {
        let is_last = i == last;
        let connector = if is_last { "└── " } else { "├── " };
        let is_folder = matches!(node, TreeNode::Folder { .. });
        lines.push(TreeLine {
            prefix: format!("{indent}{connector}"),
            name: if is_folder {
                format!("{name}/")
            } else {
                name.clone()
            },
            is_folder,
        });
        if let TreeNode::Folder { contents } = node {
            let child_indent = format!("{indent}{}", if is_last { "    " } else { "│   " });
            push_tree_lines(contents, &child_indent, lines);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_dir() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src/util")).unwrap();
        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".hidden")).unwrap();
        fs::write(root.join("README.md"), "# Demo\n").unwrap();
        fs::write(root.join("src/main.rs"), "fn main() {}\n").unwrap();
        fs::write(root.join("src/util/mod.rs"), "pub fn f() {}\n").unwrap();
        fs::write(root.join("src/logo.png"), [0u8, 1, 2]).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(root.join(".hidden/secret.txt"), "x").unwrap();
        dir
    }

    #[test]
    fn filter_matches_extensions_and_skips_dirs() {
        let filter = FileFilter::code_files().unwrap();
        assert!(filter.includes_file("main.rs"));
        assert!(filter.includes_file("notes.txt"));
        assert!(!filter.includes_file("logo.png"));
        assert!(filter.includes_dir("src"));
        assert!(!filter.includes_dir("node_modules"));
        assert!(!filter.includes_dir(".github"));
    }

    #[test]
    fn capture_keeps_included_files_only() {
        let dir = sample_dir();
        let snapshot = TreeSnapshot::capture(dir.path(), &FileFilter::code_files().unwrap()).unwrap();

        assert_eq!(snapshot.counts(), (3, 2));
        let names: Vec<&str> = snapshot.entries.keys().map(String::as_str).collect();
        assert_eq!(names, ["README.md", "src"]);
        assert_eq!(
            snapshot.file_types(),
            vec![(".rs".to_string(), 2), (".md".to_string(), 1)]
        );
    }

    #[test]
    fn json_uses_type_tags() {
        let dir = sample_dir();
        let snapshot = TreeSnapshot::capture(dir.path(), &FileFilter::code_files().unwrap()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(json["README.md"]["type"], "file");
        assert_eq!(json["README.md"]["content"], "# Demo\n");
        assert_eq!(json["src"]["type"], "folder");
        assert_eq!(json["src"]["contents"]["main.rs"]["type"], "file");
    }

    #[test]
    fn text_tree_uses_connectors() {
        let dir = sample_dir();
        let snapshot = TreeSnapshot::capture(dir.path(), &FileFilter::code_files().unwrap()).unwrap();
        let rendered: Vec<String> = snapshot
            .text_tree()
            .into_iter()
            .map(|l| format!("{}{}", l.prefix, l.name))
            .collect();
        assert_eq!(
            rendered,
            [
                "├── README.md",
                "└── src/",
                "    ├── main.rs",
                "    └── util/",
                "        └── mod.rs",
            ]
        );
    }

    #[test]
    fn large_files_are_noted_not_read() {
        let dir = tempfile::tempdir().unwrap();
        let big = "a".repeat((MAX_SINGLE_FILE_BYTES + 1) as usize);
        fs::write(dir.path().join("big.txt"), big).unwrap();
        let snapshot = TreeSnapshot::capture(dir.path(), &FileFilter::code_files().unwrap()).unwrap();
        match &snapshot.entries["big.txt"] {
            TreeNode::File { content } => assert!(content.starts_with("# File too large")),
            TreeNode::Folder { .. } => panic!("expected file"),
        }
        // Oversized files do not count toward the size limits.
        assert_eq!(measure(dir.path(), &FileFilter::code_files().unwrap()).unwrap().files, 0);
    }

    #[test]
    fn too_many_files_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        for i in 0..=MAX_FILES {
            fs::write(dir.path().join(format!("f{i}.txt")), "x").unwrap();
        }
        let err = validate_size(dir.path(), &FileFilter::code_files().unwrap()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ReportError>(),
            Some(ReportError::SizeLimitExceeded(_))
        ));
    }

    #[test]
    fn files_are_grouped_by_directory() {
        let dir = sample_dir();
        let groups = files_by_directory(dir.path(), &FileFilter::code_files().unwrap()).unwrap();
        let keys: Vec<&Path> = groups.keys().map(PathBuf::as_path).collect();
        assert_eq!(keys, [Path::new("."), Path::new("src"), Path::new("src/util")]);
        assert_eq!(groups[Path::new("src")], vec!["main.rs".to_string()]);
    }

    #[test]
    fn list_files_is_relative_and_sorted() {
        let dir = sample_dir();
        let files = list_files(dir.path(), &FileFilter::code_files().unwrap()).unwrap();
        assert_eq!(
            files,
            vec![
                PathBuf::from("README.md"),
                PathBuf::from("src/main.rs"),
                PathBuf::from("src/util/mod.rs"),
            ]
        );
    }
}
