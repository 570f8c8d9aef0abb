
use flate2::read::GzDecoder;
use std::io::{Cursor, Read};
use tracing::{debug, warn};

use super::{ParseError, SourceKind, parse_leaf};
use crate::documents::Document;

/// Ceiling on the bytes an upload may expand to once unpacked
pub const MAX_EXTRACTED_BYTES: u64 = 512 * 1024 * 1024;

/// Supported archive containers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    Zip,
    Tar,
    /// A gzip stream: either a compressed tarball or one compressed leaf file
    Gzip,
}

/// Open an archive and parse every member.
///
/// Members must all be text, markdown or PDF; any other member fails the
/// whole archive before any document is returned.
#[inline]
pub fn extract(kind: ArchiveKind, name: &str, bytes: &[u8]) -> Result<Vec<Document>, ParseError> {
    extract_with_limit(kind, name, bytes, MAX_EXTRACTED_BYTES)
}

/// [`extract`] with an explicit ceiling on the total unpacked size
#[inline]
pub fn extract_with_limit(
    kind: ArchiveKind,
    name: &str,
    bytes: &[u8],
    limit: u64,
) -> Result<Vec<Document>, ParseError> {
    let mut budget = limit;
    let members = match kind {
        ArchiveKind::Zip => zip_members(bytes, &mut budget)?,
        ArchiveKind::Tar => tar_members(bytes, &mut budget)?,
        ArchiveKind::Gzip => gzip_members(name, bytes, &mut budget)?,
    };

    let mut typed = Vec::with_capacity(members.len());
    for (path, data) in members {
        match SourceKind::from_name(&path) {
            Some(kind) if !kind.is_archive() => typed.push((kind, path, data)),
            Some(_) => {
                return Err(ParseError::InvalidFile(format!(
                    "Nested archives are not supported: {}",
                    path
                )));
            }
            None => {
                warn!("Rejecting archive '{}': unsupported member '{}'", name, path);
                return Err(ParseError::InvalidFile(format!(
                    "The archive contains an unsupported file: {}",
                    path
                )));
            }
        }
    }

    let mut documents = Vec::new();
    for (kind, path, data) in typed {
        documents.extend(parse_leaf(kind, &path, &data)?);
    }

    debug!(
        "Archive '{}' produced {} documents",
        name,
        documents.len()
    );
    Ok(documents)
}

/// Read all of `reader`, failing once more than `budget` bytes come out.
/// The bytes read are deducted from `budget`.
fn read_capped<R: Read>(reader: R, budget: &mut u64, label: &str) -> Result<Vec<u8>, ParseError> {
    let mut data = Vec::new();
    reader
        .take(budget.saturating_add(1))
        .read_to_end(&mut data)
        .map_err(|e| ParseError::ArchiveFormat(format!("{}: {}", label, e)))?;

    let read = data.len() as u64;
    if read > *budget {
        warn!("Archive member '{}' exceeds the extraction limit", label);
        return Err(ParseError::ArchiveFormat(
            "The archive expands beyond the extraction size limit".to_string(),
        ));
    }
    *budget -= read;
    Ok(data)
}

/// Metadata entries written by archivers that carry no content
fn is_metadata_entry(path: &str) -> bool {
    path.starts_with("__MACOSX/")
        || path
            .rsplit('/')
            .next()
            .is_some_and(|file| file.starts_with("._") || file == ".DS_Store")
}

fn zip_members(bytes: &[u8], budget: &mut u64) -> Result<Vec<(String, Vec<u8>)>, ParseError> {
    let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError::ArchiveFormat(e.to_string()))?;

    let mut members = Vec::with_capacity(zip.len());
    for index in 0..zip.len() {
        let mut entry = zip
            .by_index(index)
            .map_err(|e| ParseError::ArchiveFormat(e.to_string()))?;

        if entry.is_dir() {
            continue;
        }
        let path = entry.name().to_string();
        if is_metadata_entry(&path) {
            continue;
        }

        let data = read_capped(&mut entry, budget, &path)?;
        members.push((path, data));
    }

    Ok(members)
}

fn tar_members_from<R: Read>(
    reader: R,
    budget: &mut u64,
) -> Result<Vec<(String, Vec<u8>)>, ParseError> {
    let mut archive = tar::Archive::new(reader);
    let entries = archive
        .entries()
        .map_err(|e| ParseError::ArchiveFormat(e.to_string()))?;

    let mut members = Vec::new();
    for item in entries {
        let mut entry = item.map_err(|e| ParseError::ArchiveFormat(e.to_string()))?;
        let entry_type = entry.header().entry_type();
        if entry_type.is_dir() || entry_type.is_pax_global_extensions() {
            continue;
        }
        let path = entry
            .path()
            .map_err(|e| ParseError::ArchiveFormat(e.to_string()))?
            .to_string_lossy()
            .into_owned();
        if !entry_type.is_file() {
            return Err(ParseError::InvalidFile(format!(
                "The archive contains an unsupported entry: {}",
                path
            )));
        }
        if is_metadata_entry(&path) {
            continue;
        }

        let data = read_capped(&mut entry, budget, &path)?;
        members.push((path, data));
    }

    Ok(members)
}

fn tar_members(bytes: &[u8], budget: &mut u64) -> Result<Vec<(String, Vec<u8>)>, ParseError> {
    let members = tar_members_from(Cursor::new(bytes), budget)?;
    if members.is_empty() && !bytes.iter().all(|b| *b == 0) {
        return Err(ParseError::ArchiveFormat("no entries found".to_string()));
    }
    Ok(members)
}

fn gzip_members(
    name: &str,
    bytes: &[u8],
    budget: &mut u64,
) -> Result<Vec<(String, Vec<u8>)>, ParseError> {
    let decompressed = read_capped(GzDecoder::new(bytes), budget, name)?;

    let lower = name.to_ascii_lowercase();
    #[expect(
        clippy::string_slice,
        reason = "ASCII lowercasing keeps byte offsets, so the stem ends on a char boundary"
    )]
    let inner_name = lower
        .strip_suffix(".gz")
        .map(|stem| name[..stem.len()].to_string());

    // `notes.md.gz` is a single compressed file; anything else is a tarball
    if let Some(inner) = inner_name.filter(|inner| {
        SourceKind::from_name(inner).is_some_and(|kind| !kind.is_archive())
    }) {
        return Ok(vec![(inner, decompressed)]);
    }

    // Tar members are slices of the already counted stream
    let mut tar_budget = decompressed.len() as u64;
    tar_members(&decompressed, &mut tar_budget)
}
