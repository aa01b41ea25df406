use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::clause::ClauseSet;
use crate::config::load_config;
use crate::dataset::Dataset;
use crate::negotiate::Negotiator;
use crate::protocol::{Preference, ProtocolGeneration};
use crate::query::OutputFormat;
use crate::reference::ServiceRoot;
use crate::table::Table;
use crate::transport::{ReqwestTransport, Transport};

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base LaTiS URL without the protocol segment,
    /// e.g. `https://lasp.colorado.edu/lisird/latis`.
    pub url: String,
    /// Protocol generation; `None` means LaTiS 3.
    pub generation: Option<ProtocolGeneration>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify: bool,
    /// Show a progress bar while downloading response bodies.
    pub progress: bool,
}

impl ClientConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            generation: None,
            timeout: Duration::from_secs(60),
            verify: true,
            progress: false,
        }
    }

    /// The HTTP transport these settings describe.
    pub fn transport(&self) -> Result<ReqwestTransport> {
        Ok(ReqwestTransport::new(self.timeout, self.verify)?.with_progress(self.progress))
    }
}

/// One LaTiS service under one protocol generation.
#[derive(Debug, Clone)]
pub struct Client {
    root: ServiceRoot,
    transport: Arc<dyn Transport>,
    catalog: OnceLock<Catalog>,
}

impl Client {
    /// Creates a client using `LATIS_URL`/`LATIS_VERSION`/`LATIS_TIMEOUT` and/or `.latisrc`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(None, None)
    }

    /// Like [`Client::from_env`], with `url` and `generation` taking precedence over the
    /// environment and the rc file when given.
    pub fn from_env_with(
        url: Option<String>,
        generation: Option<ProtocolGeneration>,
    ) -> Result<Self> {
        Self::from_config(load_config(url, generation)?)
    }

    pub fn from_config(cfg: ClientConfig) -> Result<Self> {
        let transport = cfg.transport()?;
        Ok(Self::with_transport(
            &cfg.url,
            cfg.generation.unwrap_or_default(),
            Arc::new(transport),
        ))
    }

    /// Client for `base_url` with the default HTTP transport.
    pub fn new(base_url: &str, generation: ProtocolGeneration) -> Result<Self> {
        let mut cfg = ClientConfig::new(base_url);
        cfg.generation = Some(generation);
        Self::from_config(cfg)
    }

    pub fn with_transport(
        base_url: &str,
        generation: ProtocolGeneration,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            root: ServiceRoot::new(base_url, generation),
            transport,
            catalog: OnceLock::new(),
        }
    }

    /// Client for whichever generation serves `dataset`, trying `preference` first.
    ///
    /// Uses the default [`ClientConfig`] settings for `base_url`.
    pub fn negotiated(base_url: &str, dataset: &str, preference: Preference) -> Result<Self> {
        let mut cfg = ClientConfig::new(base_url);
        cfg.generation = Some(preference.preferred());
        Self::negotiated_from_config(cfg, dataset)
    }

    /// Negotiates over a transport built from `cfg`; its generation, if any, is tried first.
    pub fn negotiated_from_config(cfg: ClientConfig, dataset: &str) -> Result<Self> {
        let preference = match cfg.generation {
            Some(ProtocolGeneration::Legacy) => Preference::PreferLegacy,
            _ => Preference::PreferCurrent,
        };
        let transport = Arc::new(cfg.transport()?);
        Self::negotiated_with_transport(&cfg.url, dataset, preference, transport)
    }

    pub fn negotiated_with_transport(
        base_url: &str,
        dataset: &str,
        preference: Preference,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let negotiation =
            Negotiator::new(transport.as_ref()).resolve(base_url, dataset, preference)?;
        Ok(Self::with_transport(base_url, negotiation.generation, transport))
    }

    pub fn base_url(&self) -> &str {
        self.root.base_url()
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.root.generation()
    }

    pub fn root(&self) -> &ServiceRoot {
        &self.root
    }

    /// The service catalog, fetched on first use.
    pub fn catalog(&self) -> Result<&Catalog> {
        if let Some(catalog) = self.catalog.get() {
            return Ok(catalog);
        }
        let catalog = Catalog::fetch(self.transport.as_ref(), &self.root)
            .context("cannot populate catalog")?;
        Ok(self.catalog.get_or_init(|| catalog))
    }

    pub fn dataset(&self, name: impl Into<String>) -> Dataset {
        Dataset::new(self.root.dataset(name), self.transport.clone())
    }

    pub fn dataset_with_clauses(&self, name: impl Into<String>, clauses: ClauseSet) -> Dataset {
        Dataset::with_clauses(self.root.dataset(name), clauses, self.transport.clone())
    }
}

/// Fetches `dataset` from the LaTiS service at `base_url` as a table.
///
/// The protocol generation is negotiated, starting from `preference`.
pub fn data(
    base_url: &str,
    dataset: &str,
    clauses: ClauseSet,
    preference: Preference,
) -> Result<Table> {
    Client::negotiated(base_url, dataset, preference)?
        .dataset_with_clauses(dataset, clauses)
        .as_table()
}

/// Downloads `dataset` to `filename` in `format`; see [`Dataset::write_file`].
pub fn download(
    base_url: &str,
    dataset: &str,
    filename: &Path,
    format: OutputFormat,
    clauses: ClauseSet,
    preference: Preference,
) -> Result<PathBuf> {
    Client::negotiated(base_url, dataset, preference)?
        .dataset_with_clauses(dataset, clauses)
        .write_file(filename, format)
}
