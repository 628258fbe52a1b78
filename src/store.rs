use crate::error::ResultExt;
use crate::Part;
use std::fs;
use std::path::{Path, PathBuf};

const FILES_FIELD: &str = "files";
const TEXT_FIELD: &str = "text";

const BASE32_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz234567";
const TEXT_NAME_LEN: usize = 8;

/// An upload saved in an [`UploadStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// A directory of uploads, filled from decoded form parts.
///
/// Parts of the `files` field are stored under their client-supplied file
/// name and non-empty `text` parts under a generated `text_*.txt` name; all
/// other parts are discarded. Existing files with the same name are replaced.
#[derive(Debug, Clone)]
pub struct UploadStore {
    dir: PathBuf,
}

impl UploadStore {
    /// Opens the store at `dir`, creating the directory if needed.
    pub fn open<P: Into<PathBuf>>(dir: P) -> crate::Result<UploadStore> {
        let dir = dir.into();
        fs::create_dir_all(&dir).store_context()?;
        Ok(UploadStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stores the parts this store accepts and returns what was written, in
    /// part order.
    pub fn accept<I>(&self, parts: I) -> crate::Result<Vec<StoredUpload>>
    where
        I: IntoIterator<Item = Part>,
    {
        let mut stored = Vec::new();

        for mut part in parts {
            let name = match part.name() {
                Some(FILES_FIELD) => match part.file_name().and_then(sanitize_file_name) {
                    Some(name) => name,
                    None => continue,
                },
                Some(TEXT_FIELD) => {
                    if part.is_empty() {
                        continue;
                    }
                    random_text_name()
                }
                other => {
                    log::trace!("discarding part {} with field name {:?}", part.index(), other);
                    continue;
                }
            };

            let path = self.dir.join(&name);
            let size = part.persist_to(&path)?;

            log::info!("stored upload {:?} ({})", name, human_bytes(size));

            stored.push(StoredUpload { name, path, size });
        }

        Ok(stored)
    }

    /// Lists the stored uploads, skipping hidden files, sorted by name.
    pub fn list(&self) -> crate::Result<Vec<StoredUpload>> {
        let mut uploads = Vec::new();

        for entry in fs::read_dir(&self.dir).store_context()? {
            let entry = entry.store_context()?;
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(_) => continue,
            };

            if name.starts_with('.') {
                continue;
            }

            let meta = entry.metadata().store_context()?;
            if !meta.is_file() {
                continue;
            }

            uploads.push(StoredUpload {
                name,
                path: entry.path(),
                size: meta.len(),
            });
        }

        uploads.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(uploads)
    }

    /// Finds a listed upload by its exact name.
    pub fn find(&self, name: &str) -> crate::Result<Option<StoredUpload>> {
        Ok(self.list()?.into_iter().find(|upload| upload.name == name))
    }
}

/// Renders a byte count with one decimal in B, K, M or G, e.g. `1.5K`.
pub fn human_bytes(size: u64) -> String {
    let mut num = size as f64;

    for unit in ["B", "K", "M", "G"].iter() {
        if num < 1024.0 {
            return format!("{:.1}{}", num, unit);
        }
        num /= 1024.0;
    }

    "?".to_owned()
}

// Keeps only the last path component so a client cannot write outside the
// store directory.
fn sanitize_file_name(file_name: &str) -> Option<String> {
    let name = file_name.rsplit(|ch| ch == '/' || ch == '\\').next()?.trim();

    match name {
        "" | "." | ".." => None,
        name => Some(name.to_owned()),
    }
}

fn random_text_name() -> String {
    let suffix: String = (0..TEXT_NAME_LEN)
        .map(|_| BASE32_ALPHABET[fastrand::usize(..BASE32_ALPHABET.len())] as char)
        .collect();

    format!("{}_{}.txt", TEXT_FIELD, suffix)
}
