//! Parameter catalog service
//!
//! Resolves free-form column mnemonics to canonical parameters through an
//! injected `ParameterLookup`. Lookups (hits and definitive misses) are
//! memoized for the lifetime of the catalog. Every resolution hands out an
//! owned copy, so converting or canonicalizing one file never affects
//! another.

use crate::app::models::{Parameter, is_contrived_mnemonic};
use crate::config::CatalogConfig;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

pub mod builtin;
pub mod canonicalize;
pub mod lookup;

#[cfg(test)]
pub mod tests;

pub use canonicalize::{
    AppliedConversion, CanonicalizationReport, FailedConversion, UnitMismatch,
};
pub use lookup::{CatalogLoadStats, ParameterLookup, ParameterTable};

/// Memoizing parameter catalog with an explicit open/close lifecycle
pub struct ParameterCatalog {
    lookup: Arc<dyn ParameterLookup>,
    config: CatalogConfig,
    cache: RwLock<HashMap<String, Option<Parameter>>>,
    open: AtomicBool,
    lookups: AtomicUsize,
}

impl std::fmt::Debug for ParameterCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterCatalog")
            .field("config", &self.config)
            .field("open", &self.is_open())
            .field("lookups", &self.lookup_count())
            .finish()
    }
}

impl ParameterCatalog {
    /// Open a catalog over a lookup collaborator
    pub fn open(lookup: Arc<dyn ParameterLookup>, config: CatalogConfig) -> Self {
        debug!(
            "Opening parameter catalog (allow_contrived = {})",
            config.allow_contrived
        );
        Self {
            lookup,
            config,
            cache: RwLock::new(HashMap::new()),
            open: AtomicBool::new(true),
            lookups: AtomicUsize::new(0),
        }
    }

    /// Open a catalog over the built-in parameter table
    pub fn builtin(config: CatalogConfig) -> Self {
        Self::open(Arc::new(ParameterTable::builtin()), config)
    }

    /// Open the catalog described by the configuration: the CSV table at
    /// `table_path` if set, the built-in table otherwise
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        match &config.table_path {
            Some(path) => {
                let (table, stats) = ParameterTable::load_csv(path)?;
                if table.is_empty() {
                    return Err(Error::catalog_unavailable(format!(
                        "parameter table {} holds no parameters",
                        path.display()
                    )));
                }
                if stats.has_errors() {
                    warn!(
                        "{} rows of {} were skipped",
                        stats.rows_skipped,
                        path.display()
                    );
                }
                Ok(Self::open(Arc::new(table), config.clone()))
            }
            None => Ok(Self::builtin(config.clone())),
        }
    }

    /// Close the catalog and drop its cache; later resolutions fail
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
        info!("Parameter catalog closed");
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    /// Number of calls made to the lookup collaborator
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of memoized mnemonics
    pub fn cached_count(&self) -> usize {
        self.cache.read().map(|cache| cache.len()).unwrap_or(0)
    }

    /// Look a mnemonic up by name, then by alias, memoizing the answer
    ///
    /// Contrived mnemonics are never looked up and yield `Ok(None)`.
    pub fn find(&self, mnemonic: &str) -> Result<Option<Parameter>> {
        if !self.is_open() {
            return Err(Error::CatalogClosed);
        }
        if is_contrived_mnemonic(mnemonic) {
            return Ok(None);
        }

        {
            let cache = self
                .cache
                .read()
                .map_err(|_| Error::catalog_unavailable("catalog cache lock poisoned"))?;
            if let Some(cached) = cache.get(mnemonic) {
                return Ok(cached.clone());
            }
        }

        self.lookups.fetch_add(1, Ordering::SeqCst);
        let found = match self.lookup.find_by_name(mnemonic)? {
            Some(parameter) => Some(parameter),
            None => {
                debug!("Looking through aliases for {}", mnemonic);
                self.lookups.fetch_add(1, Ordering::SeqCst);
                self.lookup.find_by_alias(mnemonic)?
            }
        };

        self.cache
            .write()
            .map_err(|_| Error::catalog_unavailable("catalog cache lock poisoned"))?
            .insert(mnemonic.to_string(), found.clone());
        Ok(found)
    }

    /// Resolve a mnemonic to an owned parameter
    ///
    /// Contrived mnemonics resolve to a synthesized parameter without any
    /// lookup. Unknown mnemonics, and failed lookups, fall back to a
    /// contrived parameter when `allow_contrived` is set and are
    /// `UnknownParameter` otherwise.
    pub fn resolve(&self, mnemonic: &str) -> Result<Parameter> {
        if !self.is_open() {
            return Err(Error::CatalogClosed);
        }
        if is_contrived_mnemonic(mnemonic) {
            return Ok(Parameter::contrived(mnemonic));
        }

        match self.find(mnemonic) {
            Ok(Some(parameter)) => Ok(parameter),
            Ok(None) => self.fallback(mnemonic, None),
            Err(Error::CatalogClosed) => Err(Error::CatalogClosed),
            Err(e) => self.fallback(mnemonic, Some(e)),
        }
    }

    fn fallback(&self, mnemonic: &str, failure: Option<Error>) -> Result<Parameter> {
        if let Some(failure) = &failure {
            warn!("Parameter lookup for '{}' failed: {}", mnemonic, failure);
        }
        if self.config.allow_contrived {
            warn!("Unknown parameter '{}', using a contrived parameter", mnemonic);
            Ok(Parameter::contrived(mnemonic))
        } else {
            Err(Error::unknown_parameter(mnemonic))
        }
    }
}
