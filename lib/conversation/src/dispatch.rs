//! Capability dispatch.
//!
//! The dispatcher consults the model once per turn with the full manifest and
//! turns its decision into either a direct answer, a validated capability
//! invocation, or a rejection. Execution never leaks a fault: every path ends
//! in reply text.

use crate::capability::{Capability, CapabilityArguments, CapabilityRegistry, CapabilityResult};
use crate::error::CapabilityError;
use crate::fallback::Fallback;
use tracing::{debug, info, warn};
use travel_assistant_ai::{ChatMessage, Completion, LlmError, LlmGateway};
use travel_assistant_travel::TravelDataSource;

/// What the model decided, after validation.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// The model answered directly.
    DirectAnswer(String),
    /// The model asked for a known capability with valid arguments.
    Invoke {
        /// The capability to run.
        capability: Capability,
        /// Its validated arguments.
        arguments: CapabilityArguments,
    },
    /// The model's intent was rejected before execution.
    Rejected(CapabilityError),
}

/// Reply produced by executing a capability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Execution {
    /// Raw records that still need phrasing.
    Found(String),
    /// A final reply that must not be rephrased.
    Final(String),
}

/// Consults the model and runs the capability it picks.
#[derive(Debug)]
pub struct CapabilityDispatcher<'a, G: ?Sized, D> {
    gateway: &'a G,
    registry: &'a CapabilityRegistry<D>,
}

impl<'a, G, D> CapabilityDispatcher<'a, G, D>
where
    G: LlmGateway + ?Sized,
    D: TravelDataSource,
{
    /// Creates a dispatcher.
    pub fn new(gateway: &'a G, registry: &'a CapabilityRegistry<D>) -> Self {
        Self { gateway, registry }
    }

    /// Asks the model what to do with the context.
    ///
    /// # Errors
    ///
    /// Returns an error if the model cannot be reached. An empty direct answer
    /// is treated the same way.
    pub async fn decide(&self, context: &[ChatMessage]) -> Result<Decision, LlmError> {
        let completion = self
            .gateway
            .complete(context, Some(self.registry.manifest()))
            .await?;

        match completion {
            Completion::TextAnswer(text) if text.trim().is_empty() => {
                Err(LlmError::ResponseParseFailed {
                    reason: "empty answer".to_string(),
                })
            }
            Completion::TextAnswer(text) => {
                debug!("model answered directly");
                Ok(Decision::DirectAnswer(text))
            }
            Completion::CapabilityIntent {
                name,
                arguments_json,
            } => Ok(self.validate(&name, &arguments_json)),
        }
    }

    fn validate(&self, name: &str, arguments_json: &str) -> Decision {
        let validated = self.registry.lookup(name).and_then(|capability| {
            capability
                .parse_arguments(arguments_json)
                .map(|arguments| (capability, arguments))
        });

        match validated {
            Ok((capability, arguments)) => {
                info!(%capability, "model requested capability");
                Decision::Invoke {
                    capability,
                    arguments,
                }
            }
            Err(e) => {
                warn!(capability = name, error = %e, "rejected capability intent");
                Decision::Rejected(e)
            }
        }
    }

    /// Runs a validated capability.
    ///
    /// Only found records go on to be phrased by the model; no-results and
    /// execution faults are final replies.
    pub async fn execute(&self, capability: Capability, arguments: &CapabilityArguments) -> Execution {
        match self.registry.invoke(arguments).await {
            CapabilityResult::Found(text) => Execution::Found(text),
            CapabilityResult::NoResults => {
                Execution::Final(capability.no_results_message().to_string())
            }
            CapabilityResult::ExecutionFailed => {
                Execution::Final(Fallback::ServiceUnavailable.text().to_string())
            }
        }
    }
}
