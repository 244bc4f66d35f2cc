//! Pathname expansion.
//!
//! A pattern expands one path component at a time: literal components join
//! directly (pruned when they name nothing), magic components scan their
//! parent directory and keep the matching entries. Unreadable directories
//! contribute nothing, as `glob(3)` behaves.

use std::fs;
use std::path::{Path, PathBuf};

use crate::matcher::{has_magic, Pattern};
use crate::PatternError;

/// Expand `pattern` against the filesystem.
///
/// A pattern without metacharacters passes through untouched as a literal
/// path, whether or not it exists; the caller decides what a missing file
/// means. Anything else expands to the (sorted) set of existing matches,
/// possibly empty.
pub fn expand(pattern: &str) -> Result<Vec<PathBuf>, PatternError> {
    if !has_magic(pattern) {
        return Ok(vec![PathBuf::from(pattern)]);
    }

    let (mut paths, components) = match pattern.strip_prefix('/') {
        Some(rest) => (vec![PathBuf::from("/")], rest),
        None => (vec![PathBuf::new()], pattern),
    };

    for component in components.split('/') {
        if component.is_empty() {
            continue;
        }
        let mut next = Vec::new();
        if !has_magic(component) {
            for base in &paths {
                let candidate = join(base, component);
                if candidate.exists() {
                    next.push(candidate);
                }
            }
        } else {
            let pattern = Pattern::new(component)?;
            for base in &paths {
                let dir = if base.as_os_str().is_empty() {
                    Path::new(".")
                } else {
                    base.as_path()
                };
                let Ok(entries) = fs::read_dir(dir) else {
                    continue;
                };
                for entry in entries.flatten() {
                    let name = entry.file_name();
                    let Some(name) = name.to_str() else {
                        continue;
                    };
                    if name.starts_with('.') && !pattern.matches_hidden() {
                        continue;
                    }
                    if pattern.matches(name) {
                        next.push(join(base, name));
                    }
                }
            }
        }
        paths = next;
        if paths.is_empty() {
            break;
        }
    }

    paths.sort();
    Ok(paths)
}

fn join(base: &Path, component: &str) -> PathBuf {
    if base.as_os_str().is_empty() {
        PathBuf::from(component)
    } else {
        base.join(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;

    fn touch(path: &Path) {
        File::create(path).expect("create test file");
    }

    #[test]
    fn literal_pattern_passes_through() {
        let paths = expand("no/such/file.sh").expect("no pattern error");
        assert_eq!(paths, vec![PathBuf::from("no/such/file.sh")]);
    }

    #[test]
    fn expands_star_in_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join("t0001-one.sh"));
        touch(&dir.path().join("t0002-two.sh"));
        touch(&dir.path().join("README"));

        let pattern = format!("{}/t*.sh", dir.path().display());
        let paths = expand(&pattern).expect("no pattern error");
        assert_eq!(
            paths,
            vec![
                dir.path().join("t0001-one.sh"),
                dir.path().join("t0002-two.sh"),
            ]
        );
    }

    #[test]
    fn hidden_files_need_explicit_dot() {
        let dir = tempfile::tempdir().expect("tempdir");
        touch(&dir.path().join(".hidden.sh"));
        touch(&dir.path().join("visible.sh"));

        let all = expand(&format!("{}/*.sh", dir.path().display())).expect("expand");
        assert_eq!(all, vec![dir.path().join("visible.sh")]);

        let hidden = expand(&format!("{}/.*.sh", dir.path().display())).expect("expand");
        assert_eq!(hidden, vec![dir.path().join(".hidden.sh")]);
    }

    #[test]
    fn magic_intermediate_component() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir(dir.path().join("a")).expect("mkdir");
        fs::create_dir(dir.path().join("b")).expect("mkdir");
        touch(&dir.path().join("a/x.sh"));
        touch(&dir.path().join("b/x.sh"));

        let paths = expand(&format!("{}/?/x.sh", dir.path().display())).expect("expand");
        assert_eq!(
            paths,
            vec![dir.path().join("a/x.sh"), dir.path().join("b/x.sh")]
        );
    }

    #[test]
    fn no_matches_is_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let paths = expand(&format!("{}/*.nope", dir.path().display())).expect("expand");
        assert!(paths.is_empty());
    }

    #[test]
    fn bad_pattern_is_reported() {
        let err = expand("[oops").unwrap_err();
        assert_eq!(err, PatternError::UnclosedClass("[oops".to_string()));
    }
}
