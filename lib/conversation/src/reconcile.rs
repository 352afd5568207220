//! Turning raw capability output into a reply.

use tracing::{debug, warn};
use travel_assistant_ai::{ChatMessage, Completion, LlmGateway};

/// Prefix of the reply used when the model cannot rephrase a result.
pub const RESULTS_TEMPLATE_PREFIX: &str = "Here are the results found:\n";

/// Asks the model to phrase a capability result for the user.
#[derive(Debug)]
pub struct ResponseReconciler<'a, G: ?Sized> {
    gateway: &'a G,
}

impl<'a, G: LlmGateway + ?Sized> ResponseReconciler<'a, G> {
    /// Creates a reconciler over a gateway.
    pub fn new(gateway: &'a G) -> Self {
        Self { gateway }
    }

    /// Returns the reply for a capability's raw result.
    ///
    /// The model is called once, without a manifest, so it cannot request
    /// another capability. An empty reply, a failed call or a capability
    /// intent all fall back to [`templated`].
    pub async fn reconcile(
        &self,
        context: &[ChatMessage],
        capability_name: &str,
        raw_result: &str,
    ) -> String {
        let mut messages = context.to_vec();
        messages.push(ChatMessage::capability_result(capability_name, raw_result));

        match self.gateway.complete(&messages, None).await {
            Ok(Completion::TextAnswer(text)) if !text.trim().is_empty() => text,
            Ok(Completion::TextAnswer(_)) => {
                debug!(capability = capability_name, "empty reconciliation, using template");
                templated(raw_result)
            }
            Ok(Completion::CapabilityIntent { name, .. }) => {
                warn!(
                    capability = capability_name,
                    requested = %name,
                    "capability requested during reconciliation, using template"
                );
                templated(raw_result)
            }
            Err(e) => {
                warn!(capability = capability_name, error = %e, "reconciliation failed, using template");
                templated(raw_result)
            }
        }
    }
}

/// Renders a raw result with the fixed template.
#[must_use]
pub fn templated(raw_result: &str) -> String {
    format!("{RESULTS_TEMPLATE_PREFIX}{raw_result}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedGateway;
    use travel_assistant_ai::{ChatRole, LlmError};

    const RAW: &str = "Lisboa Tejo Hotel (4 stars) - Rua do Alecrim 12";

    #[tokio::test]
    async fn uses_model_phrasing() {
        let gateway = ScriptedGateway::new([Ok(Completion::TextAnswer(
            "I found one 4-star hotel.".to_string(),
        ))]);
        let reply = ResponseReconciler::new(&gateway)
            .reconcile(&[ChatMessage::user("hotels")], "get_hotels_info", RAW)
            .await;

        assert_eq!(reply, "I found one 4-star hotel.");

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert!(!calls[0].with_manifest);
        let last = calls[0].messages.last().expect("result message");
        assert_eq!(last.role, ChatRole::Capability);
        assert_eq!(last.name.as_deref(), Some("get_hotels_info"));
        assert_eq!(last.content, RAW);
    }

    #[tokio::test]
    async fn whitespace_reply_falls_back_to_template() {
        let gateway = ScriptedGateway::new([Ok(Completion::TextAnswer(" \n\t".to_string()))]);
        let reply = ResponseReconciler::new(&gateway)
            .reconcile(&[], "get_hotels_info", RAW)
            .await;

        assert_eq!(reply, format!("{RESULTS_TEMPLATE_PREFIX}{RAW}"));
    }

    #[tokio::test]
    async fn gateway_failure_falls_back_to_template() {
        let gateway = ScriptedGateway::new([Err(LlmError::Timeout)]);
        let reply = ResponseReconciler::new(&gateway)
            .reconcile(&[], "get_hotels_info", RAW)
            .await;

        assert_eq!(reply, templated(RAW));
    }

    #[tokio::test]
    async fn capability_intent_falls_back_to_template() {
        let gateway = ScriptedGateway::new([Ok(Completion::CapabilityIntent {
            name: "get_weather_info".to_string(),
            arguments_json: r#"{"city":"Lisbon"}"#.to_string(),
        })]);
        let reply = ResponseReconciler::new(&gateway)
            .reconcile(&[], "get_hotels_info", RAW)
            .await;

        assert_eq!(reply, templated(RAW));
        assert_eq!(gateway.call_count(), 1);
    }
}
