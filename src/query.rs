use std::fmt;
use std::str::FromStr;

use crate::clause::ClauseSet;
use crate::encode::encode;
use crate::error::LatisError;
use crate::reference::DatasetRef;

/// Output formats a LaTiS data endpoint can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OutputFormat {
    Asc,
    Bin,
    #[default]
    Csv,
    Das,
    Dds,
    Dods,
    Html,
    Json,
    Jsona,
    Jsond,
    Nc,
    Tab,
    Txt,
    Zip,
    Zip3,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 15] = [
        Self::Asc,
        Self::Bin,
        Self::Csv,
        Self::Das,
        Self::Dds,
        Self::Dods,
        Self::Html,
        Self::Json,
        Self::Jsona,
        Self::Jsond,
        Self::Nc,
        Self::Tab,
        Self::Txt,
        Self::Zip,
        Self::Zip3,
    ];

    /// Suffix used both in the request path and as the file extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Bin => "bin",
            Self::Csv => "csv",
            Self::Das => "das",
            Self::Dds => "dds",
            Self::Dods => "dods",
            Self::Html => "html",
            Self::Json => "json",
            Self::Jsona => "jsona",
            Self::Jsond => "jsond",
            Self::Nc => "nc",
            Self::Tab => "tab",
            Self::Txt => "txt",
            Self::Zip => "zip",
            Self::Zip3 => "zip3",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for OutputFormat {
    type Err = LatisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().trim_start_matches('.').to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.extension() == wanted)
            .ok_or_else(|| LatisError::InvalidFormat {
                format: s.to_string(),
                valid: Self::ALL
                    .iter()
                    .map(|f| f.extension())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }
}

/// Serializes a dataset request.
///
/// Layout: `<base><name>.<format>?<projections>&<selection>...&<operation>...`, projections
/// comma-joined. Every token is percent-encoded. Category order is fixed regardless of the
/// order clauses were added in.
pub fn build(reference: &DatasetRef, clauses: &ClauseSet, format: OutputFormat) -> String {
    let mut query = format!("{}{}.{}?", reference.base_url(), reference.name(), format);

    let projections = clauses
        .projections()
        .iter()
        .map(|p| encode(p))
        .collect::<Vec<_>>();
    query.push_str(&projections.join(","));

    for clause in clauses.selections().iter().chain(clauses.operations()) {
        query.push('&');
        query.push_str(&encode(clause));
    }

    query
}
