//! Materializes an uploaded model artifact on disk.
//!
//! The upload is sniffed by content, unpacked into a private `TempDir`, and
//! the archive listing is kept in its original order so loaders can apply
//! "first entry" rules. The directory is removed when the
//! `ExtractedArtifact` is dropped.

use std::fs::File;
use std::io::{self, Cursor};
use std::path::{Component, Path, PathBuf};

use flate2::read::GzDecoder;
use log::debug;
use tempfile::TempDir;

use crate::model::error::{ModelError, Result};

/// File name given to a bare JSON upload inside the scratch directory.
pub const RAW_MODEL_NAME: &str = "model.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Zip,
    TarGz,
    /// A single JSON model file, not an archive.
    Json,
}

/// Identifies an upload from its leading bytes.
pub fn sniff(bytes: &[u8]) -> Result<ArtifactKind> {
    if bytes.starts_with(b"PK\x03\x04") || bytes.starts_with(b"PK\x05\x06") {
        return Ok(ArtifactKind::Zip);
    }
    if bytes.starts_with(&[0x1f, 0x8b]) {
        return Ok(ArtifactKind::TarGz);
    }
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        Some(b'{') => Ok(ArtifactKind::Json),
        _ => Err(ModelError::UnsupportedArtifact),
    }
}

/// One line of the archive listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    /// Path relative to the archive root, `/`-separated, no trailing slash.
    pub name: String,
    pub is_dir: bool,
}

impl ArchiveEntry {
    /// Normalizes a raw archive name. `None` for the archive root itself
    /// (`./`, `.`), which `tar -C dir .` emits as its first entry.
    fn new(raw: &str, is_dir: bool) -> Option<ArchiveEntry> {
        let name = raw
            .split('/')
            .filter(|part| !part.is_empty() && *part != ".")
            .collect::<Vec<_>>()
            .join("/");
        if name.is_empty() {
            return None;
        }
        Some(ArchiveEntry { name, is_dir: is_dir || raw.ends_with('/') })
    }

    /// Last path component.
    pub fn file_name(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// First path component: the folder a "directory" model lives in.
    pub fn top_level(&self) -> &str {
        self.name.split('/').next().unwrap_or(&self.name)
    }
}

/// An unpacked upload. Dropping it deletes the scratch directory.
pub struct ExtractedArtifact {
    dir: TempDir,
    kind: ArtifactKind,
    entries: Vec<ArchiveEntry>,
}

impl ExtractedArtifact {
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// Entries in archive listing order.
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// On-disk path of an archive-relative name. Absolute names and names
    /// climbing out with `..` are refused.
    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || !is_enclosed(Path::new(name)) {
            return Err(ModelError::UnsafePath(name.to_owned()));
        }
        Ok(self.root().join(name))
    }
}

/// Prefix of every scratch directory.
pub const SCRATCH_PREFIX: &str = "jean-model-";

/// Sniffs and unpacks `bytes` into a fresh temporary directory, created
/// under `scratch` or the system temp directory.
pub fn extract(bytes: &[u8], scratch: Option<&Path>) -> Result<ExtractedArtifact> {
    let kind = sniff(bytes)?;
    let mut builder = tempfile::Builder::new();
    builder.prefix(SCRATCH_PREFIX);
    let dir = match scratch {
        Some(parent) => builder.tempdir_in(parent)?,
        None => builder.tempdir()?,
    };
    debug!("extracting {:?} artifact ({} bytes) into {}", kind, bytes.len(), dir.path().display());

    let entries = match kind {
        ArtifactKind::Zip   => extract_zip(bytes, dir.path())?,
        ArtifactKind::TarGz => extract_tar_gz(bytes, dir.path())?,
        ArtifactKind::Json  => {
            std::fs::write(dir.path().join(RAW_MODEL_NAME), bytes)?;
            ArchiveEntry::new(RAW_MODEL_NAME, false).into_iter().collect()
        }
    };

    if entries.is_empty() {
        return Err(ModelError::EmptyArchive);
    }
    Ok(ExtractedArtifact { dir, kind, entries })
}

fn extract_zip(bytes: &[u8], dest: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let rel = match file.enclosed_name() {
            Some(p) => p.to_path_buf(),
            None => return Err(ModelError::UnsafePath(file.name().to_owned())),
        };
        let out = dest.join(&rel);

        if file.is_dir() {
            std::fs::create_dir_all(&out)?;
        } else {
            if let Some(parent) = out.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let mut target = File::create(&out)?;
            io::copy(&mut file, &mut target)?;
        }
        entries.extend(ArchiveEntry::new(file.name(), file.is_dir()));
    }
    Ok(entries)
}

fn extract_tar_gz(bytes: &[u8], dest: &Path) -> Result<Vec<ArchiveEntry>> {
    let mut archive = tar::Archive::new(GzDecoder::new(bytes));
    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();
        let name = path.to_string_lossy().replace('\\', "/");
        if !is_enclosed(&path) {
            return Err(ModelError::UnsafePath(name));
        }
        let is_dir = entry.header().entry_type().is_dir();
        entry.unpack_in(dest)?;
        entries.extend(ArchiveEntry::new(&name, is_dir));
    }
    Ok(entries)
}

/// `true` for relative paths that never climb above their root.
pub(crate) fn is_enclosed(path: &Path) -> bool {
    path.components().all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zw = zip::ZipWriter::new(&mut buf);
            let opts = zip::write::FileOptions::default();
            for (name, data) in files {
                if name.ends_with('/') {
                    zw.add_directory(*name, opts).unwrap();
                } else {
                    zw.start_file(*name, opts).unwrap();
                    zw.write_all(data).unwrap();
                }
            }
            zw.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn sniff_recognizes_each_kind() {
        assert_eq!(sniff(&zip_bytes(&[("a.txt", b"x")])).unwrap(), ArtifactKind::Zip);
        assert_eq!(sniff(&[0x1f, 0x8b, 8, 0]).unwrap(), ArtifactKind::TarGz);
        assert_eq!(sniff(b"  \n{\"layers\": []}").unwrap(), ArtifactKind::Json);
        assert!(matches!(sniff(b"GIF89a"), Err(ModelError::UnsupportedArtifact)));
        assert!(matches!(sniff(b""), Err(ModelError::UnsupportedArtifact)));
    }

    #[test]
    fn zip_listing_keeps_archive_order() {
        let bytes = zip_bytes(&[
            ("saved/", b""),
            ("saved/model.json", b"{}"),
            ("readme.txt", b"hi"),
        ]);
        let art = extract(&bytes, None).unwrap();
        let names: Vec<&str> = art.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["saved", "saved/model.json", "readme.txt"]);
        assert!(art.entries()[0].is_dir);
        assert!(art.path_of("saved/model.json").unwrap().is_file());
        assert_eq!(art.entries()[1].file_name(), "model.json");
        assert_eq!(art.entries()[1].top_level(), "saved");
    }

    #[test]
    fn scratch_directory_is_removed_on_drop() {
        let art = extract(b"{\"layers\": []}", None).unwrap();
        let root = art.root().to_path_buf();
        assert!(root.join(RAW_MODEL_NAME).is_file());
        drop(art);
        assert!(!root.exists());
    }

    #[test]
    fn tar_gz_is_unpacked() {
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        {
            let mut builder = tar::Builder::new(&mut gz);
            let data = b"{\"layers\": []}";
            let mut header = tar::Header::new_gnu();
            header.set_path("bundle/model.json").unwrap();
            header.set_size(data.len() as u64);
            header.set_mode(0o644);
            header.set_cksum();
            builder.append(&header, &data[..]).unwrap();
            builder.finish().unwrap();
        }
        let bytes = gz.finish().unwrap();
        let art = extract(&bytes, None).unwrap();
        assert_eq!(art.kind(), ArtifactKind::TarGz);
        assert_eq!(art.entries()[0].name, "bundle/model.json");
        assert!(art.path_of("bundle/model.json").unwrap().is_file());
    }

    #[test]
    fn empty_zip_is_rejected() {
        let bytes = zip_bytes(&[]);
        assert!(matches!(extract(&bytes, None), Err(ModelError::EmptyArchive)));
    }

    fn tar_gz_raw(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut gz = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        {
            let mut builder = tar::Builder::new(&mut gz);
            for (name, data) in entries {
                let mut header = tar::Header::new_gnu();
                header.as_old_mut().name[..name.len()].copy_from_slice(name.as_bytes());
                header.set_size(data.len() as u64);
                if name.ends_with('/') {
                    header.set_entry_type(tar::EntryType::Directory);
                    header.set_mode(0o755);
                } else {
                    header.set_mode(0o644);
                }
                header.set_cksum();
                builder.append(&header, *data).unwrap();
            }
            builder.finish().unwrap();
        }
        gz.finish().unwrap()
    }

    #[test]
    fn dot_slash_root_entry_is_not_listed() {
        let bytes = tar_gz_raw(&[("./", b""), ("./model.json", b"{}"), ("./sub/", b"")]);
        let art = extract(&bytes, None).unwrap();
        let names: Vec<&str> = art.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["model.json", "sub"]);
        assert!(art.path_of("model.json").unwrap().is_file());
    }

    #[test]
    fn names_normalize_away_dot_segments() {
        assert_eq!(ArchiveEntry::new("./a/./b.json", false).unwrap().name, "a/b.json");
        assert!(ArchiveEntry::new(".", true).is_none());
        assert!(ArchiveEntry::new("./", true).is_none());
    }

    #[test]
    fn path_of_refuses_names_outside_the_root() {
        let art = extract(b"{\"layers\": []}", None).unwrap();
        assert!(matches!(art.path_of("/model.json"), Err(ModelError::UnsafePath(_))));
        assert!(matches!(art.path_of("../model.json"), Err(ModelError::UnsafePath(_))));
        assert!(matches!(art.path_of(""), Err(ModelError::UnsafePath(_))));
    }

    #[test]
    fn scratch_directory_can_be_placed() {
        let parent = tempfile::tempdir().unwrap();
        let art = extract(b"{\"layers\": []}", Some(parent.path())).unwrap();
        assert!(art.root().starts_with(parent.path()));
        let name = art.root().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(SCRATCH_PREFIX));
    }

    #[test]
    fn parent_components_are_not_enclosed() {
        assert!(is_enclosed(Path::new("a/b.json")));
        assert!(is_enclosed(Path::new("./a")));
        assert!(!is_enclosed(Path::new("../evil.json")));
        assert!(!is_enclosed(Path::new("/etc/passwd")));
    }
}
