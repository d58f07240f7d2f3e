//! Named, file-backed cookie stores shared between proxy clients.

use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cookie_store::CookieStore;
use log::debug;
use reqwest_cookie_store::CookieStoreMutex;

use crate::error::{Result, RotatorError};

/// A named, file-backed collection of cookies.
///
/// Every client whose endpoint carries the same group identifier shares one
/// `CookieGroup`, so cookies set through any of them are visible to all of
/// them. The identifier doubles as the backing file path. Cookies live in
/// memory during requests and reach the file only through [`save`].
///
/// [`save`]: CookieGroup::save
pub struct CookieGroup {
    name: String,
    path: PathBuf,
    store: Arc<CookieStoreMutex>,
}

impl CookieGroup {
    /// Open the group backed by the file at `name`, loading any cookies
    /// already persisted there. A missing file yields an empty store; an
    /// unreadable or unparsable one is an error.
    pub(crate) fn open(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let path = PathBuf::from(&name);

        let store = if path.exists() {
            let load_err = |reason: String| RotatorError::CookieLoad {
                name: name.clone(),
                reason,
            };
            let file = File::open(&path).map_err(|e| load_err(e.to_string()))?;
            cookie_store::serde::json::load_all(BufReader::new(file))
                .map_err(|e| load_err(e.to_string()))?
        } else {
            CookieStore::default()
        };

        Ok(Self {
            name,
            path,
            store: Arc::new(CookieStoreMutex::new(store)),
        })
    }

    /// Identifier of this group.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File the group persists to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Shared store handle, suitable for
    /// `reqwest::ClientBuilder::cookie_provider`.
    pub fn store(&self) -> Arc<CookieStoreMutex> {
        Arc::clone(&self.store)
    }

    /// Flush the store to its backing file.
    ///
    /// The store mutex is held for the whole write, so concurrent saves of
    /// the same group serialize and requests routed through sharing clients
    /// cannot mutate the store mid-flush. Parent directories are created if
    /// they do not exist.
    pub fn save(&self) -> Result<()> {
        let save_err = |reason: String| RotatorError::CookieSave {
            name: self.name.clone(),
            reason,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| save_err(e.to_string()))?;
            }
        }

        let store = self
            .store
            .lock()
            .map_err(|_| save_err("store lock poisoned".to_string()))?;
        let file = File::create(&self.path).map_err(|e| save_err(e.to_string()))?;
        let mut writer = BufWriter::new(file);
        // Session cookies are written out too: these stores back scraping
        // sessions whose login state commonly lives in session cookies.
        cookie_store::serde::json::save_incl_expired_and_nonpersistent(&store, &mut writer)
            .map_err(|e| save_err(e.to_string()))?;
        writer.flush().map_err(|e| save_err(e.to_string()))?;

        debug!("saved cookie store {} to {}", self.name, self.path.display());
        Ok(())
    }
}

impl fmt::Debug for CookieGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieGroup")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}
