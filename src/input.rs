//! Input resolution: turn a file or directory path into a processing list.

use crate::config::{file_size_mb, LARGE_FILE_WARNING_MB, MAX_FILE_SIZE_MB};
use crate::detect::InputFormat;
use crate::error::{Error, Result};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for resolving an input path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResolveOptions {
    /// Descend into subdirectories
    pub recursive: bool,
}

impl ResolveOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable recursion.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }
}

/// The outcome of resolving an input path.
#[derive(Debug, Clone, Default)]
pub struct ResolvedInputs {
    /// Files to send to the service, sorted by path
    pub files: Vec<PathBuf>,
    /// Files skipped because their extension is not supported
    pub unsupported: Vec<PathBuf>,
    /// Files skipped because they exceed the service size limit
    pub oversized: Vec<PathBuf>,
}

impl ResolvedInputs {
    /// Whether there is nothing to process.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn push(&mut self, path: PathBuf) -> Result<()> {
        if InputFormat::from_path(&path).is_none() {
            log::warn!("Skipping unsupported file: {}", path.display());
            self.unsupported.push(path);
            return Ok(());
        }

        let size = file_size_mb(&path)?;
        if size > MAX_FILE_SIZE_MB {
            log::warn!(
                "Skipping {}: {:.1} MB exceeds the {} MB limit",
                path.display(),
                size,
                MAX_FILE_SIZE_MB
            );
            self.oversized.push(path);
        } else {
            self.files.push(path);
        }
        Ok(())
    }
}

/// Resolve a file or directory into the list of files to process.
///
/// A single file with an unsupported extension is reported in
/// [`ResolvedInputs::unsupported`] rather than as an error.
pub fn resolve<P: AsRef<Path>>(path: P, options: ResolveOptions) -> Result<ResolvedInputs> {
    let path = path.as_ref();
    let mut resolved = ResolvedInputs::default();

    if path.is_file() {
        resolved.push(path.to_path_buf())?;
    } else if path.is_dir() {
        let mut entries = Vec::new();
        let mut visited = HashSet::new();
        visited.insert(fs::canonicalize(path)?);
        collect_files(path, options.recursive, &mut visited, &mut entries)?;
        entries.sort();
        for entry in entries {
            resolved.push(entry)?;
        }
    } else {
        return Err(Error::InputNotFound(path.to_path_buf()));
    }

    log::debug!(
        "Resolved {}: {} file(s), {} unsupported, {} oversized",
        path.display(),
        resolved.files.len(),
        resolved.unsupported.len(),
        resolved.oversized.len()
    );

    Ok(resolved)
}

/// Walk `dir`, entering each distinct directory once. `visited` holds
/// canonical paths, so symlinks back into the tree are not followed twice.
fn collect_files(
    dir: &Path,
    recursive: bool,
    visited: &mut HashSet<PathBuf>,
    out: &mut Vec<PathBuf>,
) -> Result<()> {
    let mut entries = fs::read_dir(dir)?.collect::<std::io::Result<Vec<_>>>()?;
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        let file_type = entry.file_type()?;

        if file_type.is_dir() || (file_type.is_symlink() && path.is_dir()) {
            if !recursive {
                continue;
            }
            let canonical = fs::canonicalize(&path)?;
            if visited.insert(canonical) {
                collect_files(&path, recursive, visited, out)?;
            } else {
                log::debug!("Skipping already visited directory: {}", path.display());
            }
        } else if path.is_file() {
            out.push(path);
        }
    }
    Ok(())
}

/// Validation report for a single file.
#[derive(Debug, Clone, Default)]
pub struct FileValidation {
    /// Whether the file can be submitted
    pub valid: bool,
    /// Problems that prevent submission
    pub errors: Vec<String>,
    /// Non-fatal observations
    pub warnings: Vec<String>,
    /// File size in MiB
    pub size_mb: f64,
    /// Detected format, by extension
    pub format: Option<InputFormat>,
    /// Pixel dimensions, for raster formats the decoder understands
    pub dimensions: Option<(u32, u32)>,
}

/// Check whether a file is fit to send to the service.
pub fn validate_file<P: AsRef<Path>>(path: P) -> FileValidation {
    let path = path.as_ref();
    let mut report = FileValidation::default();

    if !path.exists() {
        report
            .errors
            .push(format!("File does not exist: {}", path.display()));
        return report;
    }

    match file_size_mb(path) {
        Ok(size) => {
            report.size_mb = size;
            if size > MAX_FILE_SIZE_MB {
                report.errors.push(format!(
                    "File size ({:.1}MB) exceeds {}MB limit",
                    size, MAX_FILE_SIZE_MB
                ));
            } else if size > LARGE_FILE_WARNING_MB {
                report.warnings.push(format!(
                    "Large file size ({:.1}MB) may take longer to process",
                    size
                ));
            }
        }
        Err(e) => report.errors.push(format!("Validation error: {}", e)),
    }

    report.format = InputFormat::from_path(path);
    match report.format {
        None => {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default();
            report
                .errors
                .push(format!("Unsupported file format: .{}", ext));
        }
        Some(format) if format.is_raster() => match image::image_dimensions(path) {
            Ok(dims) => report.dimensions = Some(dims),
            Err(e) => report
                .warnings
                .push(format!("Could not read image dimensions: {}", e)),
        },
        Some(_) => {}
    }

    report.valid = report.errors.is_empty();
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, b"x").unwrap();
        path
    }

    #[test]
    fn test_resolve_single_file() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "page.png");

        let resolved = resolve(&file, ResolveOptions::new()).unwrap();
        assert_eq!(resolved.files, vec![file]);
        assert!(resolved.unsupported.is_empty());
    }

    #[test]
    fn test_resolve_single_unsupported_file() {
        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "notes.txt");

        let resolved = resolve(&file, ResolveOptions::new()).unwrap();
        assert!(resolved.is_empty());
        assert_eq!(resolved.unsupported, vec![file]);
    }

    #[test]
    fn test_resolve_directory_flat_and_recursive() {
        let dir = TempDir::new().unwrap();
        let b = touch(dir.path(), "b.JPG");
        let a = touch(dir.path(), "a.pdf");
        touch(dir.path(), "readme.md");
        let nested = touch(dir.path(), "sub/c.tiff");

        let flat = resolve(dir.path(), ResolveOptions::new()).unwrap();
        assert_eq!(flat.files, vec![a.clone(), b.clone()]);
        assert_eq!(flat.unsupported.len(), 1);

        let deep = resolve(dir.path(), ResolveOptions::new().with_recursive(true)).unwrap();
        assert_eq!(deep.files, vec![a, b, nested]);
    }

    #[cfg(unix)]
    #[test]
    fn test_recursive_resolve_stops_at_symlink_loop() {
        let dir = TempDir::new().unwrap();
        let image = touch(dir.path(), "a.png");
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let resolved = resolve(dir.path(), ResolveOptions::new().with_recursive(true)).unwrap();
        assert_eq!(resolved.files, vec![image]);
    }

    #[cfg(unix)]
    #[test]
    fn test_recursive_resolve_visits_linked_directory_once() {
        let dir = TempDir::new().unwrap();
        let scan = touch(dir.path(), "scans/page.png");
        std::os::unix::fs::symlink(dir.path().join("scans"), dir.path().join("alias")).unwrap();

        let resolved = resolve(dir.path(), ResolveOptions::new().with_recursive(true)).unwrap();
        assert_eq!(resolved.files.len(), 1);
        assert_eq!(resolved.files[0].file_name(), scan.file_name());
    }

    #[test]
    fn test_resolve_missing_path() {
        let result = resolve("/no/such/input/dir", ResolveOptions::new());
        assert!(matches!(result, Err(Error::InputNotFound(_))));
    }

    #[test]
    fn test_validate_missing_and_unsupported() {
        let report = validate_file("/no/such/file.png");
        assert!(!report.valid);

        let dir = TempDir::new().unwrap();
        let file = touch(dir.path(), "data.csv");
        let report = validate_file(&file);
        assert!(!report.valid);
        assert!(report.errors[0].contains("Unsupported"));
    }

    #[test]
    fn test_validate_png_dimensions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.png");
        image::RgbImage::new(7, 3).save(&path).unwrap();

        let report = validate_file(&path);
        assert!(report.valid);
        assert_eq!(report.format, Some(InputFormat::Png));
        assert_eq!(report.dimensions, Some((7, 3)));
    }
}
