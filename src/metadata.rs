use anyhow::Result;
use serde_json::{Map, Value};

use crate::error::{ErrorDetail, LatisError};
use crate::reference::DatasetRef;
use crate::transport::Transport;
use crate::validate::Validator;

/// Variable metadata of one dataset, keyed by variable id in service order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    properties: Map<String, Value>,
}

impl Metadata {
    pub fn fetch(transport: &dyn Transport, reference: &DatasetRef) -> Result<Self> {
        let url = reference.metadata_url();
        let resp = Validator::new(transport).probe(&url, ErrorDetail::Body)?;
        let properties = reference
            .root()
            .protocol()
            .parse_metadata(&resp.body)
            .map_err(|reason| LatisError::MalformedResponse { url, reason })?;
        Ok(Self { properties })
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn get(&self, variable: &str) -> Option<&Value> {
        self.properties.get(variable)
    }

    pub fn variables(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}
