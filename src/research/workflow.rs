//! Routing followed by fan-out, as one entry point.

use crate::llm::LLMClient;
use crate::research::capability::UnitRoster;
use crate::research::context::RunContext;
use crate::research::runner::{EventStream, ParallelRunner};
use crate::routing::classifier::LlmIntentClassifier;
use crate::routing::selector::{RoutingDecision, Selector, Toggles};
use crate::utils::toml_config::ResearchConfig;
use chrono::Utc;

/// Shared State key holding the routing record of the latest run.
pub const ROUTING_STATE_KEY: &str = "app:research_routing";

const ROUTING_SOURCE: &str = "advisor_research";

/// Routes a query and runs the selected units.
pub struct ResearchWorkflow {
    selector: Selector,
    runner: ParallelRunner,
}

impl ResearchWorkflow {
    pub fn new(selector: Selector, runner: ParallelRunner) -> Self {
        Self { selector, runner }
    }

    /// Build from loaded configuration and resolved toggles.
    ///
    /// `llm` is only used when the routing section enables the model
    /// fallback.
    pub fn from_config(
        config: &ResearchConfig,
        toggles: Toggles,
        roster: UnitRoster,
        llm: Option<Box<dyn LLMClient>>,
    ) -> Self {
        let mut selector = Selector::from_config(toggles, &config.routing);
        if config.routing.llm_fallback {
            if let Some(llm) = llm {
                selector = selector.with_llm_fallback(LlmIntentClassifier::new(llm));
            }
        }
        Self::new(selector, ParallelRunner::from_config(roster, &config.runner))
    }

    pub fn selector(&self) -> &Selector {
        &self.selector
    }

    pub fn runner(&self) -> &ParallelRunner {
        &self.runner
    }

    /// Route `text`, record the decision and start the selected units.
    ///
    /// The returned stream yields unit events as they arrive. The routing
    /// record is written before any unit starts.
    pub async fn start(&self, text: &str, ctx: RunContext) -> (RoutingDecision, EventStream) {
        let ctx = ctx.with_user_content(text);
        let decision = self.selector.route(text).await;

        tracing::info!(
            invocation_id = %ctx.invocation_id(),
            units = ?decision.unit_names(),
            classifier = ?decision.classifier,
            policy = %decision.policy,
            workflow_mode = %decision.workflow_mode,
            "Research routing"
        );

        self.record_decision(&decision, &ctx).await;

        let events = self.runner.run(&decision.selected, ctx);
        (decision, events)
    }

    async fn record_decision(&self, decision: &RoutingDecision, ctx: &RunContext) {
        let mut record = match serde_json::to_value(decision) {
            Ok(serde_json::Value::Object(map)) => map,
            Ok(_) => serde_json::Map::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize routing decision");
                return;
            }
        };
        record.insert("source".to_string(), ROUTING_SOURCE.into());
        record.insert("createdAt".to_string(), Utc::now().to_rfc3339().into());
        record.insert(
            "invocationId".to_string(),
            ctx.invocation_id().to_string().into(),
        );
        ctx.state()
            .set(ROUTING_STATE_KEY, serde_json::Value::Object(record));

        if let Some(session) = ctx.session() {
            if let Err(e) = session.persist(ctx.state()).await {
                tracing::warn!(
                    session_id = %session.scope().session_id,
                    error = %e,
                    "Failed to persist research routing"
                );
            }
        }
    }
}
