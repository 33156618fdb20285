use crate::errors::{DescriptorError, Result};
use indexmap::IndexMap;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use regex::Regex;
use rayon::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Longest token still considered a class name
const MAX_CANDIDATE_LEN: usize = 100;

/// Limits applied to every file matched by a content glob
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Maximum file size in bytes (default: 10MB)
    pub max_file_size: u64,
    /// Allow symbolic links
    pub allow_symlinks: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_file_size: 10 * 1024 * 1024, // 10MB
            allow_symlinks: false,
        }
    }
}

/// A class-name candidate found in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub value: String,
    pub line: usize,
}

/// Files scanned and the candidates found in them
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    /// Candidate -> `file:line` locations, in first-seen order
    pub candidates: IndexMap<String, Vec<String>>,
    pub bytes_scanned: u64,
}

impl ScanResult {
    pub fn contains(&self, class: &str) -> bool {
        self.candidates.contains_key(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.candidates.keys().map(String::as_str)
    }
}

/// Walks the descriptor's content globs and collects class-name candidates
#[derive(Debug, Clone)]
pub struct Scanner {
    root: PathBuf,
    globs: Vec<String>,
    security: SecurityConfig,
    progress: bool,
}

impl Scanner {
    /// Globs are resolved relative to `root`, the directory holding the descriptor
    pub fn new(root: impl Into<PathBuf>, globs: &[String]) -> Self {
        Self {
            root: root.into(),
            globs: globs.to_vec(),
            security: SecurityConfig::default(),
            progress: false,
        }
    }

    pub fn with_security(mut self, security: SecurityConfig) -> Self {
        self.security = security;
        self
    }

    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn absolute_pattern(&self, glob: &str) -> String {
        if Path::new(glob).is_absolute() {
            return glob.to_string();
        }
        let relative = glob.trim_start_matches("./");
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        format!("{}/{}", root.trim_end_matches('/'), relative)
    }

    /// Files matching any content glob, deduplicated in first-seen order
    pub fn collect_files(&self) -> Result<Vec<(PathBuf, u64)>> {
        let mut files = Vec::new();
        let mut seen = HashSet::new();
        let mut skipped_count = 0;

        for content_glob in &self.globs {
            let pattern = self.absolute_pattern(content_glob);
            tracing::debug!(glob = %content_glob, %pattern, "expanding content glob");

            for entry in glob::glob(&pattern)? {
                let path = entry?;

                if path.is_dir() {
                    continue;
                }

                if let Err(e) = validate_input_file(&path, &self.root, &self.security) {
                    tracing::warn!("Skipping file - {}", e);
                    skipped_count += 1;
                    continue;
                }

                let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

                if seen.insert(path.clone()) {
                    files.push((path, size));
                }
            }
        }

        if skipped_count > 0 {
            tracing::warn!("Skipped {} files due to security constraints", skipped_count);
        }

        Ok(files)
    }

    /// Scan every matched file in parallel
    pub fn scan(&self) -> Result<ScanResult> {
        let files = self.collect_files()?;
        if files.is_empty() {
            tracing::warn!(globs = ?self.globs, "content globs matched no files");
        }

        let progress_bar = self.progress_bar(files.len() as u64);

        let per_file: Vec<Result<(PathBuf, Vec<Candidate>)>> = files
            .par_iter()
            .map(|(path, size)| -> Result<(PathBuf, Vec<Candidate>)> {
                let candidates = if *size == 0 {
                    Vec::new()
                } else {
                    let bytes = fs::read(path).map_err(|e| DescriptorError::ScanError {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })?;
                    extract_candidates(&String::from_utf8_lossy(&bytes))
                };

                if let Some(pb) = &progress_bar {
                    pb.inc(1);
                    pb.set_message(format!(
                        "Scanning: {}",
                        path.file_name().unwrap_or_default().to_string_lossy()
                    ));
                }

                Ok((path.clone(), candidates))
            })
            .collect();

        let mut result = ScanResult {
            bytes_scanned: files.iter().map(|(_, size)| size).sum(),
            ..Default::default()
        };

        for entry in per_file {
            let (path, candidates) = entry?;
            let display = path.display().to_string();
            for candidate in candidates {
                result
                    .candidates
                    .entry(candidate.value)
                    .or_default()
                    .push(format!("{}:{}", display, candidate.line));
            }
            result.files.push(path);
        }

        if let Some(pb) = progress_bar {
            pb.finish_with_message(format!("✓ {} files", result.files.len()));
        }

        tracing::info!(
            files = result.files.len(),
            candidates = result.candidates.len(),
            bytes = result.bytes_scanned,
            "scan complete"
        );

        Ok(result)
    }

    fn progress_bar(&self, len: u64) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let pb = ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::stderr());
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({msg})")
            .map(|s| s.progress_chars("█▉▊▋▌▍▎▏  "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        pb.set_style(style);
        Some(pb)
    }
}

/// Check that a matched file is safe to read
fn validate_input_file(path: &Path, root: &Path, security: &SecurityConfig) -> Result<()> {
    if path.is_symlink() {
        if !security.allow_symlinks {
            return Err(DescriptorError::SecurityError(format!(
                "Symbolic link not allowed: {}",
                path.display()
            )));
        }

        let target = fs::canonicalize(path).map_err(|e| {
            DescriptorError::SecurityError(format!(
                "Cannot resolve symlink '{}': {}",
                path.display(),
                e
            ))
        })?;
        let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());

        if !target.starts_with(&root) {
            return Err(DescriptorError::SecurityError(format!(
                "Symlink target '{}' is outside the project root",
                target.display()
            )));
        }
    }

    let metadata = fs::metadata(path).map_err(|e| {
        DescriptorError::SecurityError(format!(
            "Cannot read file metadata for '{}': {}",
            path.display(),
            e
        ))
    })?;

    if metadata.len() > security.max_file_size {
        return Err(DescriptorError::SecurityError(format!(
            "File '{}' exceeds maximum size limit ({} MB > {} MB)",
            path.display(),
            metadata.len() / (1024 * 1024),
            security.max_file_size / (1024 * 1024)
        )));
    }

    Ok(())
}

/// Split source text into class-name candidates.
///
/// Works on any text (HTML, templates, Python): tokens are runs of characters
/// that may appear in a utility class, trailing `.`/`:`/`,` are dropped, and
/// tokens without a letter are ignored.
pub fn extract_candidates(content: &str) -> Vec<Candidate> {
    let regex = candidate_regex();
    let mut candidates = Vec::new();

    for (index, line) in content.lines().enumerate() {
        for token in regex.find_iter(line) {
            let value = token.as_str().trim_end_matches(&['.', ':', ','][..]);
            if is_candidate(value) {
                candidates.push(Candidate {
                    value: value.to_string(),
                    line: index + 1,
                });
            }
        }
    }

    candidates
}

fn is_candidate(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_CANDIDATE_LEN
        && token.chars().any(|c| c.is_ascii_alphabetic())
        && !token.starts_with("//")
}

fn candidate_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9_\-:/.\[\]!#%@&*+]+").expect("candidate regex is valid")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn values(content: &str) -> Vec<String> {
        extract_candidates(content).into_iter().map(|c| c.value).collect()
    }

    #[test]
    fn test_extract_from_html() {
        let html = r#"<div class="flex md:hover:bg-[#1a73e8] p-4">Hi.</div>"#;
        let found = values(html);
        assert!(found.contains(&"flex".to_string()));
        assert!(found.contains(&"md:hover:bg-[#1a73e8]".to_string()));
        assert!(found.contains(&"p-4".to_string()));
        assert!(found.contains(&"Hi".to_string()));
    }

    #[test]
    fn test_extract_from_python_tracks_lines() {
        let py = "def badge(ok):\n    return \"text-green-600\" if ok else f\"text-{color}-600\"\n";
        let candidates = extract_candidates(py);
        let green = candidates.iter().find(|c| c.value == "text-green-600").unwrap();
        assert_eq!(green.line, 2);
        assert!(!candidates.iter().any(|c| c.value == "-600"));
        assert!(candidates.iter().any(|c| c.value == "text-"));
    }

    #[test]
    fn test_scan_resolves_globs_against_root() {
        let dir = tempdir().unwrap();
        let templates = dir.path().join("app/templates/items");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("list.html"), "<ul class=\"grid gap-4\"></ul>\n").unwrap();
        fs::write(dir.path().join("app/routes.py"), "CARD = \"rounded shadow\"\n").unwrap();
        fs::write(dir.path().join("app/empty.py"), "").unwrap();
        fs::write(dir.path().join("app/notes.txt"), "ignored-class\n").unwrap();

        let globs = vec!["./app/templates/**/*.html".to_string(), "./app/**/*.py".to_string()];
        let result = Scanner::new(dir.path(), &globs).scan().unwrap();

        assert_eq!(result.files.len(), 3);
        assert!(result.contains("grid"));
        assert!(result.contains("rounded"));
        assert!(!result.contains("ignored-class"));
        let locations = &result.candidates["gap-4"];
        assert!(locations[0].ends_with("list.html:1"), "{:?}", locations);
    }

    #[test]
    fn test_scan_with_no_matches_is_empty() {
        let dir = tempdir().unwrap();
        let result = Scanner::new(dir.path(), &["./app/**/*.py".to_string()]).scan().unwrap();
        assert!(result.files.is_empty());
        assert!(result.candidates.is_empty());
    }

    #[test]
    fn test_oversized_files_are_skipped() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("big.html"), "x".repeat(2048)).unwrap();
        fs::write(dir.path().join("small.html"), "flex").unwrap();

        let security = SecurityConfig {
            max_file_size: 1024,
            allow_symlinks: false,
        };
        let scanner = Scanner::new(dir.path(), &["*.html".to_string()]).with_security(security);
        let files = scanner.collect_files().unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].0.ends_with("small.html"));
    }

    #[cfg(unix)]
    fn project_with_link(target: &Path) -> tempfile::TempDir {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real.html"), "<p class=\"flex\"></p>").unwrap();
        std::os::unix::fs::symlink(target, dir.path().join("link.html")).unwrap();
        dir
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_skipped_by_default() {
        let outside = tempdir().unwrap();
        let dir = project_with_link(&outside.path().join("missing.html"));
        std::os::unix::fs::symlink(dir.path().join("real.html"), dir.path().join("alias.html"))
            .unwrap();

        let files = Scanner::new(dir.path(), &["*.html".to_string()])
            .collect_files()
            .unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].0.ends_with("real.html"));

        let err = validate_input_file(
            &dir.path().join("alias.html"),
            dir.path(),
            &SecurityConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, DescriptorError::SecurityError(_)));
    }

    #[cfg(unix)]
    #[test]
    fn test_allowed_symlink_inside_root_is_scanned() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("real.html"), "<p class=\"flex\"></p>").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real.html"), dir.path().join("link.html"))
            .unwrap();

        let security = SecurityConfig {
            allow_symlinks: true,
            ..SecurityConfig::default()
        };
        let files = Scanner::new(dir.path(), &["*.html".to_string()])
            .with_security(security.clone())
            .collect_files()
            .unwrap();
        assert_eq!(files.len(), 2);
        assert!(validate_input_file(&dir.path().join("link.html"), dir.path(), &security).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_allowed_symlink_outside_root_is_rejected() {
        let outside = tempdir().unwrap();
        fs::write(outside.path().join("secret.html"), "<p class=\"grid\"></p>").unwrap();
        let dir = project_with_link(&outside.path().join("secret.html"));

        let security = SecurityConfig {
            allow_symlinks: true,
            ..SecurityConfig::default()
        };
        let result = Scanner::new(dir.path(), &["*.html".to_string()])
            .with_security(security.clone())
            .scan()
            .unwrap();
        assert_eq!(result.files.len(), 1);
        assert!(result.contains("flex"));
        assert!(!result.contains("grid"));

        let err = validate_input_file(&dir.path().join("link.html"), dir.path(), &security)
            .unwrap_err();
        assert!(err.to_string().contains("outside the project root"), "{}", err);
    }

    #[test]
    fn test_invalid_glob_is_an_error() {
        let dir = tempdir().unwrap();
        let err = Scanner::new(dir.path(), &["./app/[*.html".to_string()])
            .collect_files()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::Pattern(_)));
    }
}
