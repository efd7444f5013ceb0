//! Input discovery: explicit files plus images found under directories.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;

/// Expand `inputs` into image paths, in the order given.
///
/// Files are taken as-is. Directories are walked one level deep (or fully
/// with `recursive`) and filtered by extension, case-insensitively, in file
/// name order. Duplicates keep their first position. Inputs that do not
/// exist are logged and skipped.
pub fn discover(inputs: &[PathBuf], extensions: &[String], recursive: bool) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = Vec::new();
    for input in inputs {
        if input.is_file() {
            push_unique(&mut found, input.clone());
        } else if input.is_dir() {
            for path in walk_dir(input, extensions, recursive) {
                push_unique(&mut found, path);
            }
        } else {
            tracing::warn!(input = %input.display(), "input does not exist, skipped");
        }
    }
    found
}

fn walk_dir(root: &Path, extensions: &[String], recursive: bool) -> Vec<PathBuf> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .max_depth(if recursive { None } else { Some(1) })
        .sort_by_file_name(std::cmp::Ord::cmp);

    builder
        .build()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(error) => {
                tracing::warn!(%error, "skipping unreadable path");
                None
            }
        })
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(ignore::DirEntry::into_path)
        .filter(|path| has_extension(path, extensions))
        .collect()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            extensions
                .iter()
                .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
        })
}

fn push_unique(found: &mut Vec<PathBuf>, path: PathBuf) {
    if !found.contains(&path) {
        found.push(path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn exts() -> Vec<String> {
        vec!["fits".into(), "fit".into(), "fts".into()]
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"").unwrap();
    }

    #[test]
    fn directory_walk_is_shallow_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("b.FIT"));
        touch(&dir.path().join("a.fits"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("nested/c.fit"));

        let found = discover(&[dir.path().to_path_buf()], &exts(), false);
        assert_eq!(
            found,
            vec![dir.path().join("a.fits"), dir.path().join("b.FIT")]
        );
    }

    #[test]
    fn recursive_walk_descends() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("a.fits"));
        touch(&dir.path().join("nested/c.fit"));

        let found = discover(&[dir.path().to_path_buf()], &exts(), true);
        assert_eq!(found.len(), 2);
        assert!(found.contains(&dir.path().join("nested/c.fit")));
    }

    #[test]
    fn explicit_files_bypass_the_filter_and_dedupe() {
        let dir = tempfile::tempdir().unwrap();
        let odd = dir.path().join("frame.img");
        let fits = dir.path().join("frame.fits");
        touch(&odd);
        touch(&fits);

        let found = discover(
            &[odd.clone(), fits.clone(), dir.path().to_path_buf()],
            &exts(),
            false,
        );
        assert_eq!(found, vec![odd, fits]);
    }

    #[test]
    fn missing_input_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let frame = dir.path().join("frame.fits");
        touch(&frame);

        let found = discover(
            &[PathBuf::from("/no/such/night"), frame.clone()],
            &exts(),
            false,
        );
        assert_eq!(found, vec![frame]);
    }
}
