use std::fs;
use std::io;
use std::path::Path;

use log::{info, warn};

///
/// What [`prepare_output_dir`] did with the output directory.
///
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputDir {
    /// The directory did not exist and was created.
    Created,
    /// The directory existed and was empty.
    Reused,
    /// The directory existed with content, which was removed.
    Cleared,
    /// The directory existed with content and the caller refused to clear it.
    Declined,
}

///
/// Make sure `path` is an empty directory ready for results.
///
/// When the directory already holds files, `confirm` is asked whether to delete
/// them; on refusal nothing is touched and [`OutputDir::Declined`] is returned.
/// Entries that fail to delete are logged and skipped.
///
/// # Arguments
/// - path: output directory
/// - confirm: decides whether existing content may be removed
pub fn prepare_output_dir<P, F>(path: P, confirm: F) -> io::Result<OutputDir>
where
    P: AsRef<Path>,
    F: FnOnce(&Path) -> bool,
{
    let path = path.as_ref();

    if !path.exists() {
        fs::create_dir_all(path)?;
        info!("Created output directory {}", path.display());
        return Ok(OutputDir::Created);
    }

    if !path.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("{} exists and is not a directory", path.display()),
        ));
    }

    let entries: Vec<_> = fs::read_dir(path)?.collect::<io::Result<Vec<_>>>()?;
    if entries.is_empty() {
        return Ok(OutputDir::Reused);
    }

    if !confirm(path) {
        return Ok(OutputDir::Declined);
    }

    for entry in entries {
        let entry_path = entry.path();
        let removed = if entry_path.is_dir() {
            fs::remove_dir_all(&entry_path)
        } else {
            fs::remove_file(&entry_path)
        };
        if let Err(e) = removed {
            warn!("Failed to delete {}. Reason: {}", entry_path.display(), e);
        }
    }

    Ok(OutputDir::Cleared)
}

#[cfg(test)]
mod tests {
    use super::*;

    use pretty_assertions::assert_eq;
    use rstest::*;

    #[rstest]
    fn test_creates_missing_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let out = tempdir.path().join("out");

        let result = prepare_output_dir(&out, |_| panic!("nothing to confirm")).unwrap();
        assert_eq!(result, OutputDir::Created);
        assert!(out.is_dir());
    }

    #[rstest]
    fn test_reuses_empty_dir() {
        let tempdir = tempfile::tempdir().unwrap();
        let result = prepare_output_dir(tempdir.path(), |_| panic!("nothing to confirm")).unwrap();
        assert_eq!(result, OutputDir::Reused);
    }

    #[rstest]
    #[case(true, OutputDir::Cleared, false)]
    #[case(false, OutputDir::Declined, true)]
    fn test_existing_content(
        #[case] answer: bool,
        #[case] expected: OutputDir,
        #[case] still_there: bool,
    ) {
        let tempdir = tempfile::tempdir().unwrap();
        let old = tempdir.path().join("result_filtered.txt");
        fs::write(&old, "old").unwrap();
        fs::create_dir(tempdir.path().join("nested")).unwrap();

        let result = prepare_output_dir(tempdir.path(), |_| answer).unwrap();
        assert_eq!(result, expected);
        assert_eq!(old.exists(), still_there);
        assert_eq!(tempdir.path().join("nested").exists(), still_there);
    }

    #[rstest]
    fn test_rejects_file_path() {
        let tempdir = tempfile::tempdir().unwrap();
        let file = tempdir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        assert!(prepare_output_dir(&file, |_| true).is_err());
    }
}
