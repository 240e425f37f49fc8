//! Mapping source documents to destination locations

use std::path::{Path, PathBuf};

/// Roots stripped from source paths when the directory structure is kept:
/// the user's home directory, `/`, and on Windows every mounted drive.
///
/// Order matters, the first root that prefixes a path wins.
pub fn known_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();

    if Path::new("/").exists() {
        if let Some(home) = dirs::home_dir() {
            roots.push(home);
        }
        roots.push(PathBuf::from("/"));
    }

    #[cfg(windows)]
    for letter in 'C'..='Z' {
        let drive = format!("{}:\\", letter);
        if Path::new(&drive).exists() {
            roots.push(PathBuf::from(drive));
        }
    }

    roots
}

/// Strip the first root that is a string prefix of `path` and any leading
/// separators. Paths under no root keep their full text, minus leading
/// separators.
pub fn relative_to_roots(path: &Path, roots: &[PathBuf]) -> String {
    let full = path.to_string_lossy();

    let rel = roots
        .iter()
        .map(|root| root.to_string_lossy())
        .find(|root| full.starts_with(&root[..]))
        .map(|root| &full[root.len()..])
        .unwrap_or(&full[..]);

    rel.trim_start_matches(['/', '\\']).to_string()
}

/// Pairs `(earlier, later)` where an earlier root is a prefix of a later,
/// more specific one. Paths under `later` are stripped by `earlier` only.
pub fn shadowed_roots(roots: &[PathBuf]) -> Vec<(PathBuf, PathBuf)> {
    let mut shadowed = Vec::new();
    for (i, earlier) in roots.iter().enumerate() {
        let prefix = earlier.to_string_lossy();
        for later in &roots[i + 1..] {
            if later != earlier && later.to_string_lossy().starts_with(&prefix[..]) {
                shadowed.push((earlier.clone(), later.clone()));
            }
        }
    }
    shadowed
}

/// Zip entry names always use forward slashes.
pub fn to_entry_name(rel: &str) -> String {
    rel.replace('\\', "/")
}
