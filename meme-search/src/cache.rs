//! Content-addressed on-disk cache for downloaded media.
//!
//! Files are named `<blake3(url)>.<ext>` in one flat directory. An existing
//! file is always served without touching the network; nothing is ever
//! invalidated or pruned. Downloads stream into a `.part` file that is
//! renamed into place only after the body was fully written.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::error::MemeError;
use crate::http;
use crate::media_url::{DEFAULT_EXTENSION, extension_of, is_valid_media_url};

/// Flat media cache directory.
pub struct MediaCache {
    dir: PathBuf,
    agent: ureq::Agent,
}

impl MediaCache {
    /// Create a cache rooted at `dir`. The directory is created lazily.
    pub fn new(dir: impl Into<PathBuf>, timeout_seconds: u64) -> Self {
        Self {
            dir: dir.into(),
            agent: http::build_agent_with_timeout(None, timeout_seconds),
        }
    }

    /// The cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Local path a URL is (or would be) cached at.
    pub fn path_for(&self, url: &str) -> PathBuf {
        let key = blake3::hash(url.as_bytes()).to_hex().to_string();
        let ext = extension_of(url).unwrap_or_else(|| DEFAULT_EXTENSION.to_owned());
        self.dir.join(format!("{key}.{ext}"))
    }

    /// Returns the local copy of `url`, downloading it on first use.
    ///
    /// `None` means the caller should fall back to the remote URL.
    pub fn fetch(&self, url: &str) -> Option<PathBuf> {
        match self.try_fetch(url) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!(url, error = %e, "media cache fetch failed");
                None
            }
        }
    }

    /// Like [`fetch`](Self::fetch) but reports why nothing was cached.
    ///
    /// # Errors
    ///
    /// Returns [`MemeError::CacheWriteFailure`] for blocked hosts, HTTP
    /// failures, empty bodies and any disk error.
    pub fn try_fetch(&self, url: &str) -> Result<PathBuf, MemeError> {
        if !is_valid_media_url(url) {
            return Err(MemeError::CacheWriteFailure(format!("blocked media host: {url}")));
        }

        let dest = self.path_for(url);
        if dest.exists() {
            tracing::trace!(path = %dest.display(), "media cache hit");
            return Ok(dest);
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| {
            MemeError::CacheWriteFailure(format!("cannot create {}: {e}", self.dir.display()))
        })?;

        let tmp = dest.with_extension("part");
        match self.download(url, &tmp) {
            Ok(bytes) => {
                std::fs::rename(&tmp, &dest).map_err(|e| {
                    let _ = std::fs::remove_file(&tmp);
                    MemeError::CacheWriteFailure(format!("rename failed: {e}"))
                })?;
                tracing::debug!(url, bytes, path = %dest.display(), "media cached");
                Ok(dest)
            }
            Err(e) => {
                let _ = std::fs::remove_file(&tmp);
                Err(e)
            }
        }
    }

    fn download(&self, url: &str, tmp: &Path) -> Result<u64, MemeError> {
        let response = self.agent.get(url).call().map_err(|e| match e {
            ureq::Error::Status(code, _) => MemeError::CacheWriteFailure(format!("HTTP {code}")),
            ureq::Error::Transport(t) => {
                MemeError::CacheWriteFailure(format!("download failed: {t}"))
            }
        })?;
        if response.status() != 200 {
            return Err(MemeError::CacheWriteFailure(format!("HTTP {}", response.status())));
        }

        let write_err = |e: io::Error| MemeError::CacheWriteFailure(format!("write failed: {e}"));
        let mut file = File::create(tmp).map_err(write_err)?;
        let mut reader = response.into_reader();
        let bytes = io::copy(&mut reader, &mut file).map_err(write_err)?;
        file.flush().map_err(write_err)?;

        if bytes == 0 {
            return Err(MemeError::CacheWriteFailure("empty response body".into()));
        }
        Ok(bytes)
    }
}
