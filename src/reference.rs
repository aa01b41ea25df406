use crate::protocol::{Protocol, ProtocolGeneration};

/// The root of one LaTiS service under one protocol generation.
///
/// The generation path segment is appended exactly once, here. The formatted URL can only be
/// read back; switching generation re-derives it from the raw URL the caller gave.
#[derive(Debug, Clone)]
pub struct ServiceRoot {
    raw_url: String,
    base_url: String,
    generation: ProtocolGeneration,
    protocol: &'static dyn Protocol,
}

impl ServiceRoot {
    pub fn new(raw_url: impl Into<String>, generation: ProtocolGeneration) -> Self {
        let raw_url = raw_url.into();
        let protocol = generation.protocol();
        let base_url = format_base_url(&raw_url, protocol);
        Self {
            raw_url,
            base_url,
            generation,
            protocol,
        }
    }

    /// Base URL including the trailing `dap/` or `dap2/` segment.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL as originally supplied, before formatting.
    pub fn raw_url(&self) -> &str {
        &self.raw_url
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.generation
    }

    /// The same service under another generation.
    pub fn with_generation(&self, generation: ProtocolGeneration) -> Self {
        Self::new(self.raw_url.clone(), generation)
    }

    pub fn dataset(&self, name: impl Into<String>) -> DatasetRef {
        DatasetRef {
            root: self.clone(),
            name: name.into(),
        }
    }

    pub fn catalog_url(&self) -> String {
        self.protocol.catalog_url(&self.base_url)
    }

    pub(crate) fn protocol(&self) -> &'static dyn Protocol {
        self.protocol
    }
}

/// Identifies one queryable dataset: formatted base URL, generation and name.
#[derive(Debug, Clone)]
pub struct DatasetRef {
    root: ServiceRoot,
    name: String,
}

impl DatasetRef {
    pub fn new(
        raw_url: impl Into<String>,
        generation: ProtocolGeneration,
        name: impl Into<String>,
    ) -> Self {
        ServiceRoot::new(raw_url, generation).dataset(name)
    }

    pub fn root(&self) -> &ServiceRoot {
        &self.root
    }

    pub fn base_url(&self) -> &str {
        self.root.base_url()
    }

    pub fn generation(&self) -> ProtocolGeneration {
        self.root.generation()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Another dataset on the same service root.
    pub fn rebind(&self, name: impl Into<String>) -> Self {
        self.root.dataset(name)
    }

    pub fn metadata_url(&self) -> String {
        self.root.protocol().metadata_url(self.root.base_url(), &self.name)
    }
}

fn format_base_url(raw_url: &str, protocol: &dyn Protocol) -> String {
    let mut url = raw_url.to_string();
    if !url.ends_with('/') {
        url.push('/');
    }
    url.push_str(protocol.path_segment());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gains_generation_segment() {
        let current = ServiceRoot::new("https://example.org/latis", ProtocolGeneration::Current);
        assert_eq!(current.base_url(), "https://example.org/latis/dap2/");

        let legacy = ServiceRoot::new("https://example.org/latis/", ProtocolGeneration::Legacy);
        assert_eq!(legacy.base_url(), "https://example.org/latis/dap/");
    }

    #[test]
    fn rebinding_never_reformats() {
        let reference =
            DatasetRef::new("https://example.org/latis", ProtocolGeneration::Current, "a");
        let other = reference.rebind("b").rebind("c");
        assert_eq!(other.base_url(), "https://example.org/latis/dap2/");
        assert_eq!(other.name(), "c");

        let flipped = reference
            .root()
            .with_generation(ProtocolGeneration::Legacy)
            .with_generation(ProtocolGeneration::Current);
        assert_eq!(flipped.base_url(), reference.base_url());
        assert_eq!(flipped.raw_url(), "https://example.org/latis");
    }

    #[test]
    fn endpoint_urls_follow_generation() {
        let legacy = DatasetRef::new("http://h/latis", ProtocolGeneration::Legacy, "tsi");
        assert_eq!(legacy.root().catalog_url(), "http://h/latis/dap/catalog.csv");
        assert_eq!(legacy.metadata_url(), "http://h/latis/dap/tsi.jsond?first()");

        let current = DatasetRef::new("http://h/latis", ProtocolGeneration::Current, "tsi");
        assert_eq!(current.root().catalog_url(), "http://h/latis/dap2/");
        assert_eq!(current.metadata_url(), "http://h/latis/dap2/tsi.meta");
    }
}
