use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::catalog::CatalogEntry;
use crate::error::{ErrorDetail, LatisError};

/// The two incompatible LaTiS protocol generations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ProtocolGeneration {
    /// LaTiS 2, served under `dap/`.
    Legacy,
    /// LaTiS 3, served under `dap2/`.
    #[default]
    Current,
}

impl ProtocolGeneration {
    pub fn version(self) -> u8 {
        match self {
            Self::Legacy => 2,
            Self::Current => 3,
        }
    }

    pub fn other(self) -> Self {
        match self {
            Self::Legacy => Self::Current,
            Self::Current => Self::Legacy,
        }
    }

    pub(crate) fn protocol(self) -> &'static dyn Protocol {
        match self {
            Self::Legacy => &LegacyProtocol,
            Self::Current => &CurrentProtocol,
        }
    }
}

impl fmt::Display for ProtocolGeneration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.version())
    }
}

impl FromStr for ProtocolGeneration {
    type Err = LatisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "2" | "v2" | "legacy" | "latis2" => Ok(Self::Legacy),
            "3" | "v3" | "current" | "latis3" => Ok(Self::Current),
            _ => Err(LatisError::InvalidVersion(s.to_string())),
        }
    }
}

/// Which generation to try first when negotiating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Preference {
    PreferLegacy,
    #[default]
    PreferCurrent,
}

impl Preference {
    pub fn preferred(self) -> ProtocolGeneration {
        match self {
            Self::PreferLegacy => ProtocolGeneration::Legacy,
            Self::PreferCurrent => ProtocolGeneration::Current,
        }
    }
}

/// Generation-specific endpoint layout and payload shapes.
///
/// Parse failures are returned as a human-readable reason; callers attach the URL.
pub(crate) trait Protocol: fmt::Debug + Sync {
    fn path_segment(&self) -> &'static str;
    fn catalog_url(&self, base_url: &str) -> String;
    fn catalog_error_detail(&self) -> ErrorDetail;
    fn parse_catalog(&self, body: &[u8]) -> Result<Vec<CatalogEntry>, String>;
    fn metadata_url(&self, base_url: &str, dataset: &str) -> String;
    fn parse_metadata(&self, body: &[u8]) -> Result<Map<String, Value>, String>;
}

#[derive(Debug)]
struct LegacyProtocol;

#[derive(Debug)]
struct CurrentProtocol;

impl Protocol for LegacyProtocol {
    fn path_segment(&self) -> &'static str {
        "dap/"
    }

    fn catalog_url(&self, base_url: &str) -> String {
        format!("{base_url}catalog.csv")
    }

    fn catalog_error_detail(&self) -> ErrorDetail {
        ErrorDetail::Body
    }

    fn parse_catalog(&self, body: &[u8]) -> Result<Vec<CatalogEntry>, String> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(body);
        let headers = reader.headers().map_err(|e| e.to_string())?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| format!("catalog has no `{name}` column"))
        };
        let name_col = column("name")?;
        let url_col = column("accessURL")?;

        let mut entries = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| e.to_string())?;
            let field = |i: usize| record.get(i).unwrap_or_default().to_string();
            entries.push(CatalogEntry {
                name: field(name_col),
                identifier: field(url_col),
            });
        }
        Ok(entries)
    }

    fn metadata_url(&self, base_url: &str, dataset: &str) -> String {
        format!("{base_url}{dataset}.jsond?first()")
    }

    // {"<dataset>": {"metadata": {<variable>: {...}}, "data": [...]}}
    fn parse_metadata(&self, body: &[u8]) -> Result<Map<String, Value>, String> {
        let root: Map<String, Value> = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        let dataset = root
            .into_iter()
            .next()
            .map(|(_, v)| v)
            .ok_or_else(|| "empty jsond document".to_string())?;
        match dataset {
            Value::Object(mut fields) => match fields.remove("metadata") {
                Some(Value::Object(metadata)) => Ok(metadata),
                _ => Err("jsond document has no `metadata` object".to_string()),
            },
            _ => Err("jsond dataset entry is not an object".to_string()),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
struct CatalogListing {
    dataset: Vec<DatasetDescriptor>,
}

#[derive(Debug, serde::Deserialize)]
struct DatasetDescriptor {
    title: String,
    identifier: String,
}

#[derive(Debug, serde::Deserialize)]
struct MetadataListing {
    variable: Vec<Value>,
}

impl Protocol for CurrentProtocol {
    fn path_segment(&self) -> &'static str {
        "dap2/"
    }

    fn catalog_url(&self, base_url: &str) -> String {
        base_url.to_string()
    }

    fn catalog_error_detail(&self) -> ErrorDetail {
        ErrorDetail::Status
    }

    fn parse_catalog(&self, body: &[u8]) -> Result<Vec<CatalogEntry>, String> {
        let listing: CatalogListing = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        Ok(listing
            .dataset
            .into_iter()
            .map(|d| CatalogEntry {
                name: d.title,
                identifier: d.identifier,
            })
            .collect())
    }

    fn metadata_url(&self, base_url: &str, dataset: &str) -> String {
        format!("{base_url}{dataset}.meta")
    }

    fn parse_metadata(&self, body: &[u8]) -> Result<Map<String, Value>, String> {
        let listing: MetadataListing = serde_json::from_slice(body).map_err(|e| e.to_string())?;
        let mut properties = Map::new();
        for variable in listing.variable {
            let id = variable
                .get("id")
                .and_then(Value::as_str)
                .ok_or_else(|| "variable without an `id`".to_string())?
                .to_string();
            properties.insert(id, variable);
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_parses_common_spellings() {
        assert_eq!("2".parse::<ProtocolGeneration>().unwrap(), ProtocolGeneration::Legacy);
        assert_eq!("V3".parse::<ProtocolGeneration>().unwrap(), ProtocolGeneration::Current);
        assert_eq!(" legacy ".parse::<ProtocolGeneration>().unwrap(), ProtocolGeneration::Legacy);
        assert!(matches!(
            "4".parse::<ProtocolGeneration>(),
            Err(LatisError::InvalidVersion(_))
        ));
    }

    #[test]
    fn other_flips_generation() {
        assert_eq!(ProtocolGeneration::Legacy.other(), ProtocolGeneration::Current);
        assert_eq!(ProtocolGeneration::Current.other().other(), ProtocolGeneration::Current);
        assert_eq!(Preference::default().preferred(), ProtocolGeneration::Current);
    }

    #[test]
    fn legacy_catalog_reads_name_and_access_url() {
        let body = concat!(
            "name,description,accessURL\n",
            "SORCE TSI,daily,sorce_tsi_24hr_l3\n",
            "NRL2 SSI, ,nrl2_ssi_P1D\n",
        )
        .as_bytes();
        let entries = ProtocolGeneration::Legacy.protocol().parse_catalog(body).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "SORCE TSI");
        assert_eq!(entries[0].identifier, "sorce_tsi_24hr_l3");
        assert_eq!(entries[1].identifier, "nrl2_ssi_P1D");
    }

    #[test]
    fn legacy_catalog_without_access_url_is_malformed() {
        let err = ProtocolGeneration::Legacy
            .protocol()
            .parse_catalog(b"name,url\na,b\n")
            .unwrap_err();
        assert!(err.contains("accessURL"));
    }

    #[test]
    fn current_catalog_requires_title_and_identifier() {
        let protocol = ProtocolGeneration::Current.protocol();
        let entries = protocol
            .parse_catalog(br#"{"dataset":[{"title":"Lyman alpha","identifier":"lyman_alpha"}]}"#)
            .unwrap();
        assert_eq!(entries[0].name, "Lyman alpha");
        assert_eq!(entries[0].identifier, "lyman_alpha");

        assert!(protocol.parse_catalog(br#"{"dataset":[{"title":"x"}]}"#).is_err());
        assert!(protocol.parse_catalog(b"not json").is_err());
    }

    #[test]
    fn current_metadata_is_keyed_by_variable_id() {
        let body = concat!(
            r#"{"variable":[{"id":"time","units":"ms"},"#,
            r#"{"id":"irradiance","units":"W/m^2"}]}"#,
        )
        .as_bytes();
        let props = ProtocolGeneration::Current.protocol().parse_metadata(body).unwrap();
        let keys: Vec<_> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["time", "irradiance"]);
        assert_eq!(props["irradiance"]["units"], "W/m^2");
    }

    #[test]
    fn legacy_metadata_comes_from_jsond_metadata_block() {
        let body = concat!(
            r#"{"sorce_tsi":{"metadata":{"time":{"units":"days"},"tsi":{"units":"W/m^2"}},"#,
            r#""data":[[1,2]]}}"#,
        )
        .as_bytes();
        let props = ProtocolGeneration::Legacy.protocol().parse_metadata(body).unwrap();
        let keys: Vec<_> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["time", "tsi"]);

        assert!(ProtocolGeneration::Legacy.protocol().parse_metadata(b"{}").is_err());
    }
}
