//! A blocking Rust client for LaTiS tabular data services.
//!
//! LaTiS serves datasets over HTTP in two incompatible protocol generations: LaTiS 2
//! (paths under `dap/`) and LaTiS 3 (paths under `dap2/`). This crate builds query URLs
//! for either, negotiates which one a dataset is served under, validates queries before
//! use, and fetches results as a [`Table`] or writes them to a file.
//!
//! ## Quick start
//! - Pick the generation explicitly with [`Client::new`], or let [`Client::negotiated`]
//!   probe for it.
//! - Configuration can also come from `LATIS_URL` / `LATIS_VERSION` or a `.latisrc` file
//!   via [`Client::from_env`].
//!
//! ```no_run
//! use anyhow::Result;
//! use latis::{Client, OutputFormat, Preference, RangeSelection};
//!
//! fn main() -> Result<()> {
//!     let client = Client::negotiated(
//!         "https://lasp.colorado.edu/lisird/latis",
//!         "sorce_tsi_24hr_l3",
//!         Preference::PreferCurrent,
//!     )?;
//!     let mut tsi = client.dataset("sorce_tsi_24hr_l3");
//!     tsi.project(["time", "tsi_1au"])
//!         .select(&RangeSelection::on("time").start("2020-01-01").end("2021-01-01"));
//!
//!     let table = tsi.as_table()?;
//!     println!("{} rows", table.len());
//!     tsi.write_file("tsi_2020", OutputFormat::Csv)?;
//!     Ok(())
//! }
//! ```
//!
//! Diagnostics go through `tracing`: protocol fallback is a warning, rejected queries are
//! errors. Install a subscriber to see them.

#![forbid(unsafe_code)]

mod catalog;
mod clause;
mod client;
mod config;
mod dataset;
mod encode;
mod error;
mod metadata;
mod negotiate;
mod protocol;
mod query;
mod reference;
mod table;
mod transport;
mod validate;

pub use catalog::{Catalog, CatalogEntry};
pub use clause::{ClauseSet, RangeSelection};
pub use client::{Client, ClientConfig, data, download};
pub use dataset::Dataset;
pub use encode::{decode, encode};
pub use error::{ErrorDetail, LatisError};
pub use metadata::Metadata;
pub use negotiate::{Negotiation, Negotiator};
pub use protocol::{Preference, ProtocolGeneration};
pub use query::{OutputFormat, build as build_query};
pub use reference::{DatasetRef, ServiceRoot};
pub use table::Table;
pub use transport::{HttpResponse, ReqwestTransport, Transport};
pub use validate::Validator;
