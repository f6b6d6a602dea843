//! Utility functions

use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;

/// Write a file through a temporary sibling and rename it into place, so
/// readers only ever observe the previous or the complete new contents.
pub fn write_atomically<F>(path: impl AsRef<Path>, render: F) -> io::Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file_mut());
        render(&mut writer)?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|err| err.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_existing_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("marker.txt");

        write_atomically(&path, |w| w.write_all(b"1000\n")).unwrap();
        write_atomically(&path, |w| w.write_all(b"2000\n")).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "2000\n");
        assert_eq!(fs::read_dir(path.parent().unwrap()).unwrap().count(), 1);
    }

    #[test]
    fn failed_render_leaves_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("marker.txt");
        write_atomically(&path, |w| w.write_all(b"old")).unwrap();

        let err = write_atomically(&path, |_| Err(io::Error::new(io::ErrorKind::Other, "boom")));
        assert!(err.is_err());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
    }
}
