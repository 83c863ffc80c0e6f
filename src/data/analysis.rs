//! Project profile used to prompt for a README.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path};

use anyhow::Result;

use super::tree::{self, FileFilter};
use crate::error::ReportError;

/// Number of extensions listed in the profile context.
pub const PROFILE_TOP_EXTENSIONS: usize = 10;

/// Number of file paths listed in the profile context.
pub const PROFILE_FILE_SAMPLE: usize = 50;

/// Project type derived from the dominant file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectType {
    /// Python sources.
    Python,
    /// JavaScript or TypeScript sources.
    JavaScript,
    /// Java sources.
    Java,
    /// Go sources.
    Go,
    /// Rust sources.
    Rust,
    /// C or C++ sources.
    Cpp,
    /// C# sources.
    CSharp,
    /// PHP sources.
    Php,
    /// Ruby sources.
    Ruby,
    /// Swift sources.
    Swift,
    /// Kotlin sources.
    Kotlin,
    /// No recognised extension.
    Unknown,
}

impl ProjectType {
    /// Maps an extension (with the leading dot) to a project type.
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".py" | ".pyx" => Self::Python,
            ".js" | ".jsx" | ".ts" | ".tsx" => Self::JavaScript,
            ".java" => Self::Java,
            ".go" => Self::Go,
            ".rs" => Self::Rust,
            ".cpp" | ".c" | ".h" | ".hpp" => Self::Cpp,
            ".cs" => Self::CSharp,
            ".php" => Self::Php,
            ".rb" => Self::Ruby,
            ".swift" => Self::Swift,
            ".kt" => Self::Kotlin,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Python => "python",
            Self::JavaScript => "javascript",
            Self::Java => "java",
            Self::Go => "go",
            Self::Rust => "rust",
            Self::Cpp => "cpp",
            Self::CSharp => "csharp",
            Self::Php => "php",
            Self::Ruby => "ruby",
            Self::Swift => "swift",
            Self::Kotlin => "kotlin",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Which well-known files and directories exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyFiles {
    /// A dependency manifest such as `requirements.txt` or `Cargo.toml`.
    pub dependencies: bool,
    /// `package.json`.
    pub package_json: bool,
    /// `Dockerfile`.
    pub dockerfile: bool,
    /// `Makefile`.
    pub makefile: bool,
    /// A README.
    pub readme: bool,
    /// A LICENSE file.
    pub license: bool,
    /// A directory whose name mentions tests or specs.
    pub tests: bool,
    /// A directory whose name mentions docs.
    pub docs: bool,
}

/// Summary of a repository's layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectProfile {
    /// Directory name.
    pub repo_name: String,
    /// Relative file paths, sorted.
    pub files: Vec<String>,
    /// Files per lower-cased extension.
    pub extensions: BTreeMap<String, usize>,
    /// Most common extension, if any file has one.
    pub main_extension: Option<String>,
    /// Type derived from `main_extension`.
    pub project_type: ProjectType,
    /// Presence flags.
    pub key_files: KeyFiles,
}

const DEPENDENCY_MANIFESTS: [&str; 6] = [
    "requirements.txt",
    "pyproject.toml",
    "setup.py",
    "cargo.toml",
    "go.mod",
    "pom.xml",
];

impl ProjectProfile {
    /// Walks `root` and builds its profile.
    pub fn analyze(root: &Path) -> Result<Self> {
        if !root.is_dir() {
            return Err(ReportError::InputNotFound(root.to_path_buf()).into());
        }

        let paths = tree::list_files(root, &FileFilter::any_visible_file()?)?;
        let mut extensions = BTreeMap::new();
        let mut key_files = KeyFiles::default();

        for path in &paths {
            if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
                *extensions
                    .entry(format!(".{}", ext.to_lowercase()))
                    .or_insert(0) += 1;
            }

            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            mark_key_file(&name, &mut key_files);

            for dir in parent_dirs(path) {
                let dir = dir.to_lowercase();
                if dir.contains("test") || dir.contains("spec") {
                    key_files.tests = true;
                }
                if dir.contains("doc") {
                    key_files.docs = true;
                }
            }
        }

        // Ties go to the alphabetically first extension.
        let main_extension = extensions
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(ext, _)| ext.clone());
        let project_type = main_extension
            .as_deref()
            .map_or(ProjectType::Unknown, ProjectType::from_extension);

        Ok(Self {
            repo_name: root
                .canonicalize()
                .ok()
                .as_deref()
                .and_then(Path::file_name)
                .map_or_else(|| "Unknown".to_string(), |n| n.to_string_lossy().into_owned()),
            files: paths
                .iter()
                .map(|p| p.to_string_lossy().into_owned())
                .collect(),
            extensions,
            main_extension,
            project_type,
            key_files,
        })
    }

    /// Extensions ordered by count (descending), limited to `limit`.
    pub fn top_extensions(&self, limit: usize) -> Vec<(&str, usize)> {
        let mut exts: Vec<(&str, usize)> = self
            .extensions
            .iter()
            .map(|(ext, count)| (ext.as_str(), *count))
            .collect();
        exts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        exts.truncate(limit);
        exts
    }
}

fn mark_key_file(name: &str, key_files: &mut KeyFiles) {
    if DEPENDENCY_MANIFESTS.contains(&name) {
        key_files.dependencies = true;
    } else if name == "package.json" {
        key_files.package_json = true;
    } else if name == "dockerfile" {
        key_files.dockerfile = true;
    } else if name == "makefile" {
        key_files.makefile = true;
    } else if name.starts_with("readme") {
        key_files.readme = true;
    } else if name.starts_with("license") {
        key_files.license = true;
    }
}

fn parent_dirs(path: &Path) -> impl Iterator<Item = String> + '_ {
    path.parent()
        .into_iter()
        .flat_map(Path::components)
        .filter_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn dominant_extension_sets_project_type() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("tests")).unwrap();
        fs::write(root.join("Cargo.toml"), "[package]").unwrap();
        fs::write(root.join("README.md"), "# x").unwrap();
        fs::write(root.join("Dockerfile"), "FROM scratch").unwrap();
        fs::write(root.join("src/lib.rs"), "").unwrap();
        fs::write(root.join("src/main.rs"), "").unwrap();
        fs::write(root.join("tests/it.rs"), "").unwrap();
        fs::write(root.join(".env"), "SECRET=1").unwrap();

        let profile = ProjectProfile::analyze(root).unwrap();
        assert_eq!(profile.project_type, ProjectType::Rust);
        assert_eq!(profile.main_extension.as_deref(), Some(".rs"));
        assert_eq!(profile.files.len(), 6);
        assert!(!profile.files.iter().any(|f| f.contains(".env")));

        let keys = profile.key_files;
        assert!(keys.dependencies && keys.readme && keys.dockerfile && keys.tests);
        assert!(!keys.license && !keys.docs && !keys.package_json && !keys.makefile);

        assert_eq!(
            profile.top_extensions(2),
            vec![(".rs", 3), (".md", 1)]
        );
    }

    #[test]
    fn empty_directory_is_unknown() {
        let dir = tempfile::tempdir().unwrap();
        let profile = ProjectProfile::analyze(dir.path()).unwrap();
        assert_eq!(profile.project_type, ProjectType::Unknown);
        assert!(profile.main_extension.is_none());
        assert_eq!(profile.project_type.to_string(), "unknown");
    }

    #[test]
    fn extension_mapping() {
        assert_eq!(ProjectType::from_extension(".tsx"), ProjectType::JavaScript);
        assert_eq!(ProjectType::from_extension(".hpp"), ProjectType::Cpp);
        assert_eq!(ProjectType::from_extension(".md"), ProjectType::Unknown);
    }
}
