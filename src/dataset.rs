use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use tracing::{debug, error};

use crate::clause::{ClauseSet, RangeSelection};
use crate::error::{ErrorDetail, LatisError, format_query_error};
use crate::metadata::Metadata;
use crate::query::{OutputFormat, build};
use crate::reference::DatasetRef;
use crate::table::Table;
use crate::transport::Transport;
use crate::validate::Validator;

/// A dataset on a LaTiS service together with the clauses of its pending query.
///
/// Every clause mutation discards the last validated query; it is rebuilt and revalidated on
/// the next [`Dataset::build_query`] or fetch.
#[derive(Debug, Clone)]
pub struct Dataset {
    reference: DatasetRef,
    clauses: ClauseSet,
    query: Option<String>,
    metadata: OnceLock<Metadata>,
    transport: Arc<dyn Transport>,
}

impl Dataset {
    pub fn new(reference: DatasetRef, transport: Arc<dyn Transport>) -> Self {
        Self::with_clauses(reference, ClauseSet::new(), transport)
    }

    pub fn with_clauses(
        reference: DatasetRef,
        clauses: ClauseSet,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            reference,
            clauses,
            query: None,
            metadata: OnceLock::new(),
            transport,
        }
    }

    pub fn name(&self) -> &str {
        self.reference.name()
    }

    pub fn reference(&self) -> &DatasetRef {
        &self.reference
    }

    pub fn clauses(&self) -> &ClauseSet {
        &self.clauses
    }

    /// Variable metadata, fetched on first use.
    pub fn metadata(&self) -> Result<&Metadata> {
        if let Some(metadata) = self.metadata.get() {
            return Ok(metadata);
        }
        let metadata = Metadata::fetch(self.transport.as_ref(), &self.reference)
            .with_context(|| format!("cannot populate metadata for {}", self.name()))?;
        Ok(self.metadata.get_or_init(|| metadata))
    }

    fn edit(&mut self, f: impl FnOnce(&mut ClauseSet)) -> &mut Self {
        f(&mut self.clauses);
        self.query = None;
        self
    }

    pub fn project<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.edit(|c| {
            c.add_projections(names);
        })
    }

    pub fn add_projection(&mut self, name: impl Into<String>) -> &mut Self {
        self.edit(|c| {
            c.add_projection(name);
        })
    }

    pub fn add_selection(&mut self, clause: impl Into<String>) -> &mut Self {
        self.edit(|c| {
            c.add_selection(clause);
        })
    }

    pub fn select(&mut self, range: &RangeSelection) -> &mut Self {
        self.edit(|c| {
            c.select(range);
        })
    }

    pub fn select_range(
        &mut self,
        target: &str,
        start: &str,
        end: &str,
        start_inclusive: bool,
        end_inclusive: bool,
    ) -> &mut Self {
        self.edit(|c| {
            c.select_range(target, start, end, start_inclusive, end_inclusive);
        })
    }

    pub fn operate(&mut self, operation: impl Into<String>) -> &mut Self {
        self.edit(|c| {
            c.add_operation(operation);
        })
    }

    pub fn clear_projections(&mut self) -> &mut Self {
        self.edit(|c| {
            c.clear_projections();
        })
    }

    pub fn clear_selections(&mut self) -> &mut Self {
        self.edit(|c| {
            c.clear_selections();
        })
    }

    pub fn clear_operations(&mut self) -> &mut Self {
        self.edit(|c| {
            c.clear_operations();
        })
    }

    /// The query URL for `format`, without validating it.
    pub fn url(&self, format: OutputFormat) -> String {
        build(&self.reference, &self.clauses, format)
    }

    /// Rebuilds the CSV query and checks the service accepts it.
    ///
    /// Returns `None` when validation fails; the failure is logged and the query is
    /// unusable until the clauses change.
    pub fn build_query(&mut self) -> Option<&str> {
        let query = self.url(OutputFormat::Csv);
        self.query = Validator::new(self.transport.as_ref())
            .is_servable(&query)
            .then_some(query);
        self.query.as_deref()
    }

    /// The last query that passed validation, if it is still current.
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Validates the query, then fetches the result in `format`.
    ///
    /// A rejected query yields [`LatisError::InvalidQuery`] with the server's explanation and
    /// no data request; an unreachable service yields [`LatisError::Unreachable`].
    pub fn fetch(&mut self, format: OutputFormat) -> Result<Vec<u8>> {
        let query = self.url(OutputFormat::Csv);
        match Validator::new(self.transport.as_ref()).probe(&query, ErrorDetail::Body) {
            Ok(_) => self.query = Some(query),
            Err(e) => {
                self.query = None;
                error!(url = %query, "Cannot build query\n{e:#}");
                return Err(e);
            }
        }

        let url = self.url(format);
        let resp = self.transport.get(&url)?;
        if resp.is_error() {
            return Err(LatisError::InvalidQuery {
                detail: format_query_error(&url, resp.status, &resp.text(), ErrorDetail::Body),
                url,
            }
            .into());
        }
        debug!(%url, bytes = resp.body.len(), "fetched dataset");
        Ok(resp.body)
    }

    /// Fetches the CSV result and parses it.
    ///
    /// A body that is not valid CSV yields [`LatisError::MalformedResponse`].
    pub fn as_table(&mut self) -> Result<Table> {
        let body = self.fetch(OutputFormat::Csv)?;
        Table::from_csv(&body).map_err(|e| {
            LatisError::MalformedResponse {
                url: self.url(OutputFormat::Csv),
                reason: format!("{e:#}"),
            }
            .into()
        })
    }

    /// Writes the result in `format` to `filename` verbatim.
    ///
    /// `.<format>` is appended when `filename` has no extension. Returns the written path.
    pub fn write_file(
        &mut self,
        filename: impl AsRef<Path>,
        format: OutputFormat,
    ) -> Result<PathBuf> {
        let target = with_extension(filename.as_ref(), format);

        let body = match self.fetch(format) {
            Ok(body) => body,
            Err(e) => {
                error!(dataset = self.name(), "Cannot create file. {e:#}");
                return Err(e);
            }
        };

        if let Some(parent) = target.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create directory {}", parent.display()))?;
            }
        }
        std::fs::write(&target, body)
            .with_context(|| format!("failed to write {}", target.display()))?;
        Ok(target)
    }
}

fn with_extension(filename: &Path, format: OutputFormat) -> PathBuf {
    if filename.extension().is_some() {
        filename.to_path_buf()
    } else {
        filename.with_extension(format.extension())
    }
}
