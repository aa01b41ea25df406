use anyhow::Result;
use tracing::{debug, warn};

use crate::catalog::Catalog;
use crate::error::LatisError;
use crate::metadata::Metadata;
use crate::protocol::{Preference, ProtocolGeneration};
use crate::reference::ServiceRoot;
use crate::transport::Transport;

/// Outcome of a successful negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Negotiation {
    pub generation: ProtocolGeneration,
    /// Warnings emitted while resolving; holds one entry when the fallback was taken.
    pub warnings: Vec<String>,
}

impl Negotiation {
    pub fn fell_back(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    ProbingPreferred(ProtocolGeneration),
    ProbingFallback(ProtocolGeneration),
    Resolved(ProtocolGeneration),
    Failed,
}

/// Picks the protocol generation a dataset is served under.
///
/// The preferred generation is probed first and the other one at most once afterwards.
#[derive(Debug, Clone, Copy)]
pub struct Negotiator<'t> {
    transport: &'t dyn Transport,
}

impl<'t> Negotiator<'t> {
    pub fn new(transport: &'t dyn Transport) -> Self {
        Self { transport }
    }

    pub fn resolve(
        &self,
        base_url: &str,
        dataset: &str,
        preference: Preference,
    ) -> Result<Negotiation> {
        let mut warnings = Vec::new();
        let mut state = State::ProbingPreferred(preference.preferred());

        loop {
            state = match state {
                State::ProbingPreferred(generation) => {
                    if self.probe(base_url, dataset, generation) {
                        State::Resolved(generation)
                    } else {
                        let fallback = generation.other();
                        let message = format!(
                            "{dataset} cannot be accessed through LaTiS version {}. \
                             Auto switching to version {}.",
                            generation.version(),
                            fallback.version()
                        );
                        warn!("{message}");
                        warnings.push(message);
                        State::ProbingFallback(fallback)
                    }
                }
                State::ProbingFallback(generation) => {
                    if self.probe(base_url, dataset, generation) {
                        State::Resolved(generation)
                    } else {
                        State::Failed
                    }
                }
                State::Resolved(generation) => {
                    return Ok(Negotiation {
                        generation,
                        warnings,
                    });
                }
                State::Failed => {
                    return Err(LatisError::NoUsableProtocol {
                        dataset: dataset.to_string(),
                    }
                    .into());
                }
            };
        }
    }

    fn probe(&self, base_url: &str, dataset: &str, generation: ProtocolGeneration) -> bool {
        let root = ServiceRoot::new(base_url, generation);
        let result = Catalog::fetch(self.transport, &root)
            .and_then(|_| Metadata::fetch(self.transport, &root.dataset(dataset)));
        match result {
            Ok(_) => true,
            Err(e) => {
                debug!(dataset, %generation, "probe failed: {e:#}");
                false
            }
        }
    }
}
