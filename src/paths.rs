//! Input classification: filesystem-openable paths vs archive-resident paths
//!
//! Specifiers may carry a `file://`, `slk://` or `hsm://` scheme prefix.
//! Archive residency is decided by the scheme or by a configurable set of
//! archive mount prefixes found at the second path part (the `/arch/...`
//! convention on HSM-mounted trees). Everything else is resolved against
//! the local filesystem.

use std::env;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Recognized dataset file extensions (without the dot).
pub const DATA_EXTENSIONS: [&str; 8] = [
    "nc", "nc4", "grb", "grib", "grib2", "grb2", "h5", "hdf5",
];

/// Classifier output: both lists sorted and deduplicated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClassifiedPaths {
    pub filesystem: Vec<String>,
    pub archive: Vec<String>,
}

impl ClassifiedPaths {
    pub fn is_empty(&self) -> bool {
        self.filesystem.is_empty() && self.archive.is_empty()
    }
}

/// Path classifier with explicit knobs for the deployment-specific parts.
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Path parts at index 1 that mark an archive-mounted tree
    pub archive_prefixes: Vec<String>,
    /// Extension matching when expanding an existing directory
    pub dir_scan_ignore_case: bool,
    /// Extension matching when globbing a parent directory for a pattern
    pub pattern_scan_ignore_case: bool,
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            archive_prefixes: vec!["arch".to_string()],
            dir_scan_ignore_case: true,
            pattern_scan_ignore_case: false,
        }
    }
}

impl Classifier {
    /// Partition input specifiers into filesystem and archive paths.
    pub fn classify(&self, inputs: &[String]) -> ClassifiedPaths {
        let mut filesystem: Vec<String> = Vec::new();
        let mut archive: Vec<String> = Vec::new();

        for specifier in inputs {
            let (scheme, raw_path) = split_scheme(specifier);
            let path = if matches!(scheme, "file" | "slk" | "hsm") {
                absolutize(&shellexpand::tilde(raw_path))
            } else {
                raw_path.to_string()
            };
            let inp = Path::new(&path);

            if matches!(scheme, "hsm" | "slk") || self.is_archive_mounted(inp) {
                archive.push(path);
            } else if inp.exists() && extension_of(inp).as_deref() == Some("zarr") {
                // A Zarr store is a directory treated as a single entry
                filesystem.push(path);
            } else if inp.is_dir() {
                filesystem.extend(self.expand_directory(inp));
            } else if inp.is_file() {
                filesystem.push(path);
            } else if inp.parent().map_or(false, |p| p.is_dir()) {
                let parent = inp.parent().unwrap_or_else(|| Path::new("/"));
                let pattern = inp
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                filesystem.extend(self.expand_pattern(parent, &pattern));
            } else {
                // Defer the existence failure to the opener
                filesystem.push(specifier.clone());
            }
        }

        filesystem.sort();
        filesystem.dedup();
        archive.sort();
        archive.dedup();
        ClassifiedPaths {
            filesystem,
            archive,
        }
    }

    /// True when the path part at index 1 names an archive mount.
    fn is_archive_mounted(&self, path: &Path) -> bool {
        // parts.get(1) guards bare filenames and other short paths
        let parts = path_parts(path);
        match parts.get(1) {
            Some(part) => self.archive_prefixes.iter().any(|p| p == part),
            None => false,
        }
    }

    /// All dataset files below an existing directory.
    fn expand_directory(&self, dir: &Path) -> Vec<String> {
        WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| has_data_extension(entry.path(), self.dir_scan_ignore_case))
            .map(|entry| entry.path().to_string_lossy().to_string())
            .collect()
    }

    /// Dataset files below `parent` whose name matches the glob pattern.
    fn expand_pattern(&self, parent: &Path, pattern: &str) -> Vec<String> {
        WalkDir::new(parent)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map_or(false, |name| glob_match(pattern, name))
            })
            .filter(|entry| has_data_extension(entry.path(), self.pattern_scan_ignore_case))
            .map(|entry| entry.path().to_string_lossy().to_string())
            .collect()
    }
}

/// Split a specifier into scheme and path; no `://` means scheme `file`.
fn split_scheme(specifier: &str) -> (&str, &str) {
    match specifier.rsplit_once("://") {
        Some((scheme, path)) => (scheme, path),
        None => ("file", specifier),
    }
}

/// Make a path absolute against the working directory, without touching
/// the filesystem (no symlink resolution, no existence requirement).
fn absolutize(path: &str) -> String {
    let p = Path::new(path);
    if p.is_absolute() {
        path.to_string()
    } else {
        env::current_dir()
            .map(|cwd| cwd.join(p))
            .unwrap_or_else(|_| PathBuf::from(path))
            .to_string_lossy()
            .to_string()
    }
}

/// Path parts the way `pathlib` counts them: the root is part 0 of an
/// absolute path, so `/arch/x` has `arch` at index 1.
fn path_parts(path: &Path) -> Vec<String> {
    path.components()
        .map(|c| match c {
            Component::RootDir => "/".to_string(),
            other => other.as_os_str().to_string_lossy().to_string(),
        })
        .collect()
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_string())
}

fn has_data_extension(path: &Path, ignore_case: bool) -> bool {
    match extension_of(path) {
        Some(ext) => {
            if ignore_case {
                let lower = ext.to_lowercase();
                DATA_EXTENSIONS.contains(&lower.as_str())
            } else {
                DATA_EXTENSIONS.contains(&ext.as_str())
            }
        }
        None => false,
    }
}

/// Minimal glob matching supporting `*` and `?`, enough for basename
/// patterns like `tas_*.nc`. Iterative backtracking keeps it linear-ish
/// even for patterns with several `*`s.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = name.chars().collect();
    let (mut p, mut t) = (0, 0);
    let mut star: Option<usize> = None;
    let mut mark = 0;
    while t < txt.len() {
        if p < pat.len() && (pat[p] == '?' || pat[p] == txt[t]) {
            p += 1;
            t += 1;
        } else if p < pat.len() && pat[p] == '*' {
            star = Some(p);
            mark = t;
            p += 1;
        } else if let Some(star_pos) = star {
            // Backtrack: let the last `*` swallow one more character
            p = star_pos + 1;
            mark += 1;
            t = mark;
        } else {
            return false;
        }
    }
    while p < pat.len() && pat[p] == '*' {
        p += 1;
    }
    p == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_scheme() {
        assert_eq!(split_scheme("slk://arch/data.nc"), ("slk", "arch/data.nc"));
        assert_eq!(split_scheme("/tmp/data.nc"), ("file", "/tmp/data.nc"));
    }

    #[test]
    fn test_glob_match() {
        assert!(glob_match("tas_*.nc", "tas_2000.nc"));
        assert!(glob_match("*.nc", "a.nc"));
        assert!(glob_match("a?.nc", "ab.nc"));
        assert!(!glob_match("*.nc", "a.grb"));
        assert!(glob_match("data.nc", "data.nc"));
    }

    #[test]
    fn test_glob_match_many_stars_terminates() {
        let name = "a".repeat(40) + "c";
        assert!(!glob_match("*a*a*a*a*b", &name));
        assert!(glob_match("*a*a*a*a*", &name[..40]));
    }

    #[test]
    fn test_path_parts_counts_root() {
        let parts = path_parts(Path::new("/arch/project/file.nc"));
        assert_eq!(parts, vec!["/", "arch", "project", "file.nc"]);
    }

    #[test]
    fn test_bare_filename_is_not_archive() {
        let classifier = Classifier::default();
        assert!(!classifier.is_archive_mounted(Path::new("file.nc")));
    }
}
