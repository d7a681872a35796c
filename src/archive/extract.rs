//! Gzip-tar extraction into a fixed directory next to the archive.
//!
//! Extraction is best effort: members already written stay on disk when a
//! later member fails. Expected members that are absent afterwards are
//! reported on [`ExtractedDir::missing`] and logged as warnings, never as
//! errors.

use crate::config::ArchiveSettings;
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("archive not found or not readable: {0}")]
    NotFound(PathBuf),

    #[error("{path} is not a valid tar.gz archive: {reason}")]
    CorruptArchive { path: PathBuf, reason: String },

    #[error("extraction failed at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ExtractError {
    fn corrupt(path: &Path, reason: impl ToString) -> Self {
        Self::CorruptArchive {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result of a successful extraction.
#[derive(Debug, Clone)]
pub struct ExtractedDir {
    pub path: PathBuf,
    /// Member paths as recorded in the archive, in archive order.
    pub members: Vec<PathBuf>,
    pub total_bytes: u64,
    /// Expected members not present in `path` after extraction.
    pub missing: Vec<String>,
}

impl ExtractedDir {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }

    /// Location of a member inside the extraction directory.
    pub fn member_path(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }
}

/// Extract `archive_path` into a sibling `sample` directory and check for the
/// logs, traces and metrics payloads.
pub fn extract(archive_path: &Path) -> Result<ExtractedDir, ExtractError> {
    extract_with(archive_path, &ArchiveSettings::default())
}

pub fn extract_with(
    archive_path: &Path,
    settings: &ArchiveSettings,
) -> Result<ExtractedDir, ExtractError> {
    if !archive_path.exists() {
        return Err(ExtractError::NotFound(archive_path.to_path_buf()));
    }

    let file = File::open(archive_path).map_err(|e| open_error(archive_path, e))?;

    let extract_dir = extraction_dir(archive_path, &settings.extract_dir);
    fs::create_dir_all(&extract_dir).map_err(|e| ExtractError::io(&extract_dir, e))?;

    info!(
        archive = %archive_path.display(),
        destination = %extract_dir.display(),
        "Extracting archive"
    );

    let mut reader = BufReader::new(file);
    check_gzip_magic(&mut reader, archive_path)?;

    let (members, total_bytes) = unpack(reader, archive_path, &extract_dir)?;

    let missing = missing_members(&extract_dir, &settings.expected_members);
    if missing.is_empty() {
        info!(
            destination = %extract_dir.display(),
            members = members.len(),
            total_bytes,
            "Extracted all expected files"
        );
    } else {
        warn!(
            missing = %missing.join(", "),
            "The following expected files were not found"
        );
    }

    Ok(ExtractedDir {
        path: extract_dir,
        members,
        total_bytes,
        missing,
    })
}

/// A missing or unreadable archive is `NotFound`; anything else is `Io`.
fn open_error(path: &Path, e: io::Error) -> ExtractError {
    match e.kind() {
        io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied => {
            ExtractError::NotFound(path.to_path_buf())
        }
        _ => ExtractError::io(path, e),
    }
}

/// Directory named `dir_name` next to the archive.
pub fn extraction_dir(archive_path: &Path, dir_name: &str) -> PathBuf {
    match archive_path.parent() {
        Some(parent) => parent.join(dir_name),
        None => PathBuf::from(dir_name),
    }
}

fn check_gzip_magic<R: Read + Seek>(reader: &mut R, archive_path: &Path) -> Result<(), ExtractError> {
    let mut magic = [0u8; 2];
    match reader.read_exact(&mut magic) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            return Err(ExtractError::corrupt(archive_path, "file is too short"));
        }
        Err(e) => return Err(ExtractError::io(archive_path, e)),
    }

    if magic != GZIP_MAGIC {
        return Err(ExtractError::corrupt(archive_path, "missing gzip header"));
    }

    reader.rewind().map_err(|e| ExtractError::io(archive_path, e))
}

fn unpack<R: Read>(
    reader: R,
    archive_path: &Path,
    extract_dir: &Path,
) -> Result<(Vec<PathBuf>, u64), ExtractError> {
    let mut archive = tar::Archive::new(GzDecoder::new(reader));
    let mut members = Vec::new();
    let mut total_bytes = 0u64;

    let entries = archive
        .entries()
        .map_err(|e| ExtractError::corrupt(archive_path, e))?;

    for entry in entries {
        let mut entry = entry.map_err(|e| ExtractError::corrupt(archive_path, e))?;

        let member = entry
            .path()
            .map_err(|e| ExtractError::corrupt(archive_path, e))?
            .into_owned();
        let size = entry.header().size().unwrap_or(0);

        debug!(member = %member.display(), size, "Unpacking member");

        let unpacked = entry
            .unpack_in(extract_dir)
            .map_err(|e| classify_unpack_error(archive_path, extract_dir, &member, e))?;

        if unpacked {
            total_bytes += size;
            members.push(member);
        } else {
            warn!(member = %member.display(), "Skipped member outside the extraction directory");
        }
    }

    Ok((members, total_bytes))
}

/// Decoding problems surface from the entry reader as data errors; anything
/// else comes from the filesystem side.
fn classify_unpack_error(
    archive_path: &Path,
    extract_dir: &Path,
    member: &Path,
    e: io::Error,
) -> ExtractError {
    match e.kind() {
        io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::UnexpectedEof => {
            ExtractError::corrupt(archive_path, format!("{}: {}", member.display(), e))
        }
        _ => ExtractError::io(&extract_dir.join(member), e),
    }
}

fn missing_members(extract_dir: &Path, expected: &[String]) -> Vec<String> {
    expected
        .iter()
        .filter(|name| !extract_dir.join(name.as_str()).exists())
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_unreadable_archive_is_not_found() {
        let path = Path::new("/data/sample.tar.gz");
        let err = open_error(path, io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ExtractError::NotFound(p) if p == path));

        let err = open_error(path, io::Error::from(io::ErrorKind::Interrupted));
        assert!(matches!(err, ExtractError::Io { .. }));
    }

    #[test]
    fn test_extraction_dir_is_sibling() {
        assert_eq!(
            extraction_dir(Path::new("/data/fixtures/sample.tar.gz"), "sample"),
            PathBuf::from("/data/fixtures/sample")
        );
    }

    #[test]
    fn test_extraction_dir_bare_file_name() {
        assert_eq!(
            extraction_dir(Path::new("sample.tar.gz"), "sample"),
            PathBuf::from("sample")
        );
    }

    #[test]
    fn test_gzip_magic_accepted_and_rewound() {
        let mut cursor = Cursor::new(vec![0x1F, 0x8B, 0x08, 0x00]);
        check_gzip_magic(&mut cursor, Path::new("a.tar.gz")).unwrap();
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_gzip_magic_rejects_other_data() {
        let mut cursor = Cursor::new(b"PK\x03\x04".to_vec());
        let err = check_gzip_magic(&mut cursor, Path::new("a.tar.gz")).unwrap_err();
        assert!(matches!(err, ExtractError::CorruptArchive { .. }));
    }

    #[test]
    fn test_gzip_magic_rejects_empty_file() {
        let mut cursor = Cursor::new(Vec::new());
        let err = check_gzip_magic(&mut cursor, Path::new("a.tar.gz")).unwrap_err();
        assert!(matches!(err, ExtractError::CorruptArchive { .. }));
    }

    #[test]
    fn test_missing_members_reports_absent_names() {
        let dir = tempfile::TempDir::new().unwrap();
        fs::write(dir.path().join("logs.json"), "").unwrap();

        let expected = vec![
            "logs.json".to_string(),
            "traces.json".to_string(),
            "metrics.json".to_string(),
        ];
        assert_eq!(
            missing_members(dir.path(), &expected),
            vec!["traces.json".to_string(), "metrics.json".to_string()]
        );
    }
}
