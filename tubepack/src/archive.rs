//! ZIP packaging of a workspace tree.

use crate::error::ArchiveError;
use std::fs::File;
use std::io::{self, BufReader, Seek, Write};
use std::path::{Component, Path};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

const ARCHIVE_PREFIX: &str = "tubepack-";
const ARCHIVE_SUFFIX: &str = ".zip";

/// A finished archive in a temp file, deleted on drop.
#[derive(Debug)]
pub struct PackagedArchive {
    file: NamedTempFile,
    entries: usize,
}

impl PackagedArchive {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Number of files stored.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Delete the archive file now. An archive already moved away is not an error.
    pub fn discard(self) -> io::Result<()> {
        match self.file.close() {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Package every regular file under `root` into a new archive in `dest_dir`.
///
/// Entry names are root-relative with `/` separators, visited in sorted order.
/// Directories and symlinks are not stored.
pub fn archive(root: &Path, dest_dir: &Path) -> Result<PackagedArchive, ArchiveError> {
    let mut file = tempfile::Builder::new()
        .prefix(ARCHIVE_PREFIX)
        .suffix(ARCHIVE_SUFFIX)
        .tempfile_in(dest_dir)?;

    let entries = write_tree(root, file.as_file_mut())?;

    tracing::info!(
        root = %root.display(),
        archive = %file.path().display(),
        entries,
        "workspace archived"
    );

    Ok(PackagedArchive { file, entries })
}

/// Write the tree under `root` as a deflated ZIP into `writer`. Returns the entry count.
pub fn write_tree<W: Write + Seek>(root: &Path, writer: W) -> Result<usize, ArchiveError> {
    let mut zip = ZipWriter::new(writer);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut entries = 0;

    for entry in WalkDir::new(root).follow_links(false).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let Some(name) = entry_name(root, entry.path()) else {
            tracing::warn!(path = %entry.path().display(), "skipping entry not under archive root");
            continue;
        };

        zip.start_file(name, options)?;
        let mut reader = BufReader::new(File::open(entry.path())?);
        io::copy(&mut reader, &mut zip)?;
        entries += 1;
    }

    zip.finish()?;

    Ok(entries)
}

/// Root-relative, `/`-joined entry name. `None` for paths outside `root`.
///
/// Names that are not valid UTF-8 are stored lossily.
fn entry_name(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;

    let parts: Vec<_> = relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();

    if parts.is_empty() {
        return None;
    }

    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Read;
    use zip::ZipArchive;

    fn tree(files: &[(&str, &[u8])]) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for (name, contents) in files {
            let path = dir.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        dir
    }

    fn read_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut entry = archive.by_index(i).unwrap();
                let mut data = Vec::new();
                entry.read_to_end(&mut data).unwrap();
                (entry.name().to_string(), data)
            })
            .collect()
    }

    #[test]
    fn stores_relative_paths_and_exact_bytes() {
        let root = tree(&[("sub/x.txt", b"nested contents"), ("y.txt", b"top level")]);
        let dest = tempfile::tempdir().unwrap();

        let packaged = archive(root.path(), dest.path()).unwrap();
        let entries = read_entries(packaged.path());

        let names: BTreeSet<_> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, BTreeSet::from(["sub/x.txt", "y.txt"]));
        assert_eq!(entries.len(), 2, "duplicate entries: {entries:?}");
        assert_eq!(packaged.entries(), 2);

        for (name, data) in &entries {
            assert_eq!(data, &std::fs::read(root.path().join(name)).unwrap());
        }
    }

    #[test]
    fn entries_are_deflated() {
        let big = vec![b'a'; 64 * 1024];
        let root = tree(&[("clip.mp4", &big)]);
        let dest = tempfile::tempdir().unwrap();

        let packaged = archive(root.path(), dest.path()).unwrap();

        let mut zip = ZipArchive::new(File::open(packaged.path()).unwrap()).unwrap();
        let entry = zip.by_index(0).unwrap();
        assert_eq!(entry.compression(), CompressionMethod::Deflated);
        assert!(entry.compressed_size() < entry.size());
    }

    #[test]
    fn output_is_deterministic() {
        let root = tree(&[("b.mp4", b"b"), ("a/c.vtt", b"c"), ("a.mkv", b"a")]);
        let dest = tempfile::tempdir().unwrap();

        let first = archive(root.path(), dest.path()).unwrap();
        let second = archive(root.path(), dest.path()).unwrap();

        let names = |p: &Path| read_entries(p).into_iter().map(|(n, _)| n).collect::<Vec<_>>();
        assert_eq!(names(first.path()), names(second.path()));
        assert_eq!(names(first.path()), vec!["a/c.vtt", "a.mkv", "b.mp4"]);
    }

    #[test]
    fn archive_lives_outside_root_and_is_removed_on_drop() {
        let root = tree(&[("only.mp4", b"x")]);
        let dest = tempfile::tempdir().unwrap();

        let packaged = archive(root.path(), dest.path()).unwrap();
        let path = packaged.path().to_path_buf();

        assert!(!path.starts_with(root.path()));
        assert!(path.exists());

        drop(packaged);
        assert!(!path.exists());
    }

    #[test]
    fn empty_directories_are_not_stored() {
        let root = tree(&[("kept.txt", b"k")]);
        std::fs::create_dir(root.path().join("empty")).unwrap();
        let dest = tempfile::tempdir().unwrap();

        let packaged = archive(root.path(), dest.path()).unwrap();

        let names: Vec<_> = read_entries(packaged.path()).into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["kept.txt"]);
    }

    #[test]
    fn missing_destination_is_an_error() {
        let root = tree(&[("a.txt", b"a")]);

        let result = archive(root.path(), &root.path().join("nope"));

        assert!(matches!(result, Err(ArchiveError::Io(_))));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn non_utf8_names_are_stored() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let root = tree(&[("Clip.en.vtt", b"WEBVTT\n")]);
        let odd = root.path().join(OsStr::from_bytes(b"Clip\xff.mp4"));
        std::fs::write(&odd, b"video").unwrap();
        let dest = tempfile::tempdir().unwrap();

        let packaged = archive(root.path(), dest.path()).unwrap();
        let entries = read_entries(packaged.path());

        assert_eq!(packaged.entries(), 2);
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().any(|(name, data)| name == "Clip\u{FFFD}.mp4" && data == b"video"));
    }

    #[test]
    fn discard_tolerates_moved_archive() {
        let root = tree(&[("a.mp4", b"a")]);
        let dest = tempfile::tempdir().unwrap();

        let packaged = archive(root.path(), dest.path()).unwrap();
        std::fs::rename(packaged.path(), dest.path().join("moved.zip")).unwrap();

        assert!(packaged.discard().is_ok());
    }

    #[test]
    fn entry_name_rejects_outside_paths() {
        let root = Path::new("/w/job");

        assert_eq!(entry_name(root, Path::new("/w/job/a/b.mp4")).as_deref(), Some("a/b.mp4"));
        assert_eq!(entry_name(root, Path::new("/w/other/b.mp4")), None);
        assert_eq!(entry_name(root, root), None);
    }
}
