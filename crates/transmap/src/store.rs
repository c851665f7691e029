// Transition stores: how the encoded map reaches the file system.
//
// A store is a strategy for one file variant under a model directory. The
// plain store is always available; the gzip store only with the `gzip`
// feature, in which case it is tried first and used for saving.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::{TransMapError, TransitionMap, format};

/// File name of the uncompressed store.
pub const PLAIN_FILE_NAME: &str = "parser.trans";

/// File name of the gzip-compressed store.
pub const GZIP_FILE_NAME: &str = "parser.trans.gz";

/// One on-disk representation of a transition map.
pub trait Store {
    /// File name of this variant inside a model directory.
    fn file_name(&self) -> &'static str;

    /// Read a map from the file at `path`.
    fn load(&self, path: &Path) -> Result<TransitionMap, TransMapError>;

    /// Write `map` to the file at `path`, replacing any existing file.
    fn save(&self, path: &Path, map: &TransitionMap) -> Result<(), TransMapError>;

    /// Location of this variant under `prefix`.
    fn path(&self, prefix: &Path) -> PathBuf {
        prefix.join(self.file_name())
    }
}

/// Uncompressed `parser.trans`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainStore;

impl Store for PlainStore {
    fn file_name(&self) -> &'static str {
        PLAIN_FILE_NAME
    }

    fn load(&self, path: &Path) -> Result<TransitionMap, TransMapError> {
        let mut reader = BufReader::new(open(path)?);
        TransitionMap::read_from(&mut reader)
    }

    fn save(&self, path: &Path, map: &TransitionMap) -> Result<(), TransMapError> {
        let mut writer = BufWriter::new(File::create(path)?);
        map.write_to(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}

/// Gzip-compressed `parser.trans.gz`.
#[cfg(feature = "gzip")]
#[derive(Debug, Clone, Copy, Default)]
pub struct GzipStore;

#[cfg(feature = "gzip")]
impl Store for GzipStore {
    fn file_name(&self) -> &'static str {
        GZIP_FILE_NAME
    }

    fn load(&self, path: &Path) -> Result<TransitionMap, TransMapError> {
        let decoder = flate2::read::GzDecoder::new(open(path)?);
        let mut reader = BufReader::new(decoder);
        let map = TransitionMap::read_from(&mut reader)?;
        format::drain(&mut reader)?;
        Ok(map)
    }

    fn save(&self, path: &Path, map: &TransitionMap) -> Result<(), TransMapError> {
        let file = BufWriter::new(File::create(path)?);
        let mut encoder = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        map.write_to(&mut encoder)?;
        encoder.finish()?.flush()?;
        Ok(())
    }
}

/// Open a store file for reading. Anything that is not a readable regular
/// file (absent, no permission, a directory) is a missing store.
fn open(path: &Path) -> Result<File, TransMapError> {
    let missing = || TransMapError::MissingStore {
        path: path.to_path_buf(),
    };
    let file = File::open(path).map_err(|e| {
        tracing::debug!(path = %path.display(), error = %e, "cannot open transitions store");
        missing()
    })?;
    // Directories open successfully on unix and only fail on the first read.
    if !file.metadata().is_ok_and(|meta| meta.is_file()) {
        tracing::debug!(path = %path.display(), "transitions store is not a regular file");
        return Err(missing());
    }
    Ok(file)
}

/// Stores tried by [`load_prefix`], in the order they are tried.
pub fn candidates() -> Vec<&'static dyn Store> {
    let mut stores: Vec<&'static dyn Store> = Vec::with_capacity(2);
    #[cfg(feature = "gzip")]
    stores.push(&GzipStore);
    stores.push(&PlainStore);
    stores
}

#[cfg(feature = "gzip")]
const DEFAULT_STORE: &dyn Store = &GzipStore;
#[cfg(not(feature = "gzip"))]
const DEFAULT_STORE: &dyn Store = &PlainStore;

/// The store [`save_prefix`] writes with in this build.
pub fn default_store() -> &'static dyn Store {
    DEFAULT_STORE
}

/// Load the map stored under `prefix`.
///
/// The first candidate whose file exists is used, without falling back to
/// later candidates if it turns out to be malformed. If none exists, the
/// plain store is opened so its absence is what gets reported.
pub fn load_prefix(prefix: &Path) -> Result<TransitionMap, TransMapError> {
    let chosen: &dyn Store = candidates()
        .into_iter()
        .find(|store| {
            let path = store.path(prefix);
            let exists = path.is_file();
            tracing::trace!(path = %path.display(), exists, "checking transitions store");
            exists
        })
        .unwrap_or(&PlainStore);

    let path = chosen.path(prefix);
    let map = chosen.load(&path)?;
    tracing::debug!(path = %path.display(), transitions = map.len(), "loaded transition map");
    Ok(map)
}

/// Save `map` under `prefix` with the [`default_store`]. The directory must
/// already exist.
pub fn save_prefix(prefix: &Path, map: &TransitionMap) -> Result<(), TransMapError> {
    let store = default_store();
    let path = store.path(prefix);
    store.save(&path, map)?;
    tracing::debug!(path = %path.display(), transitions = map.len(), "saved transition map");
    Ok(())
}
