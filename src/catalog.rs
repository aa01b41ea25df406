use anyhow::Result;
use std::collections::BTreeMap;
use tracing::debug;

use crate::error::LatisError;
use crate::reference::ServiceRoot;
use crate::transport::Transport;
use crate::validate::Validator;

/// One dataset listed by a LaTiS catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Display name (LaTiS 3 `title`, LaTiS 2 `name`).
    pub name: String,
    /// Canonical dataset id (LaTiS 3 `identifier`, LaTiS 2 `accessURL`).
    pub identifier: String,
}

/// Datasets offered by a LaTiS service, fixed once fetched.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
    datasets: BTreeMap<String, String>,
}

impl Catalog {
    /// Fetches and parses the catalog for the root's generation.
    pub fn fetch(transport: &dyn Transport, root: &ServiceRoot) -> Result<Self> {
        let url = root.catalog_url();
        let protocol = root.protocol();
        let resp = Validator::new(transport).probe(&url, protocol.catalog_error_detail())?;
        let entries = protocol
            .parse_catalog(&resp.body)
            .map_err(|reason| LatisError::MalformedResponse {
                url: url.clone(),
                reason,
            })?;
        debug!(%url, datasets = entries.len(), "catalog fetched");
        Ok(Self::from_entries(entries))
    }

    pub fn from_entries(entries: Vec<CatalogEntry>) -> Self {
        let datasets = entries
            .iter()
            .map(|e| (e.name.clone(), e.identifier.clone()))
            .collect();
        Self { entries, datasets }
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Display name to dataset id.
    pub fn datasets(&self) -> &BTreeMap<String, String> {
        &self.datasets
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.datasets.get(name).map(String::as_str)
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.identifier.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Identifiers containing `term`, in catalog order. No term (or an empty one) lists all.
    pub fn search(&self, term: Option<&str>) -> Vec<&str> {
        match term {
            Some(term) if !term.is_empty() => {
                self.identifiers().filter(|id| id.contains(term)).collect()
            }
            _ => self.identifiers().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ProtocolGeneration;
    use crate::transport::testing::FakeTransport;

    const V3_LISTING: &str = r#"{"dataset":[
        {"title":"SORCE TSI 24 hour","identifier":"sorce_tsi_24hr_l3"},
        {"title":"SORCE TSI 6 hour","identifier":"sorce_tsi_6hr_l3"},
        {"title":"Composite Lyman alpha","identifier":"composite_lyman_alpha"}
    ]}"#;

    fn current_catalog() -> Catalog {
        let root = ServiceRoot::new("http://h/latis", ProtocolGeneration::Current);
        let transport = FakeTransport::new().route("http://h/latis/dap2/", 200, V3_LISTING);
        Catalog::fetch(&transport, &root).unwrap()
    }

    #[test]
    fn current_catalog_maps_title_to_identifier() {
        let catalog = current_catalog();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.get("Composite Lyman alpha"), Some("composite_lyman_alpha"));
    }

    #[test]
    fn legacy_catalog_maps_name_to_access_url() {
        let root = ServiceRoot::new("http://h/latis", ProtocolGeneration::Legacy);
        let transport = FakeTransport::new().route(
            "http://h/latis/dap/catalog.csv",
            200,
            "name,accessURL\nSORCE TSI,sorce_tsi_24hr_l3\n",
        );
        let catalog = Catalog::fetch(&transport, &root).unwrap();
        assert_eq!(catalog.get("SORCE TSI"), Some("sorce_tsi_24hr_l3"));
        assert_eq!(transport.requests(), ["http://h/latis/dap/catalog.csv"]);
    }

    #[test]
    fn search_filters_by_substring() {
        let catalog = current_catalog();
        assert_eq!(catalog.search(Some("tsi")), ["sorce_tsi_24hr_l3", "sorce_tsi_6hr_l3"]);
        assert_eq!(catalog.search(None).len(), 3);
        assert_eq!(catalog.search(Some("")), catalog.identifiers().collect::<Vec<_>>());
        assert!(catalog.search(Some("mars")).is_empty());
        assert_eq!(catalog.len(), 3);
    }

    #[test]
    fn error_status_and_bad_payload_are_distinct_failures() {
        let root = ServiceRoot::new("http://h/latis", ProtocolGeneration::Current);

        let transport = FakeTransport::new().route("http://h/latis/dap2/", 500, "boom");
        let err = Catalog::fetch(&transport, &root).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LatisError>(),
            Some(LatisError::InvalidQuery { .. })
        ));

        let transport =
            FakeTransport::new().route("http://h/latis/dap2/", 200, r#"{"datasets":[]}"#);
        let err = Catalog::fetch(&transport, &root).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<LatisError>(),
            Some(LatisError::MalformedResponse { .. })
        ));
    }
}
