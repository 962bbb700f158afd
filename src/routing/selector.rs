//! Capability selection.
//!
//! Two policies are available:
//!
//! - **Broad** ([`select`]): the baseline units always run, optional units
//!   are added when their toggle is on. Intent does not narrow the set.
//! - **Targeted** ([`targeted`]): units are chosen from the intent, each
//!   with a recorded reason, optionally narrowed further by
//!   [`WorkflowMode::Fast`].
//!
//! Both are pure. [`Selector`] wraps them with the process toggles, the
//! configured policy and the optional model-assisted classifier.

use crate::research::capability::CapabilityKind;
use crate::routing::classifier::{ClassificationSource, LlmIntentClassifier};
use crate::routing::intent::{classify, Intent};
use crate::utils::toml_config::{RoutingConfig, ToggleConfig};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which optional units are enabled for this process.
///
/// Resolved once at startup and passed by value; never read from the
/// environment during routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toggles {
    pub web_search: bool,
    pub private_search: bool,
    pub private_retrieval: bool,
}

impl Toggles {
    /// Every optional unit off.
    pub fn none() -> Self {
        Self::default()
    }

    /// Every optional unit on.
    pub fn all() -> Self {
        Self {
            web_search: true,
            private_search: true,
            private_retrieval: true,
        }
    }

    /// Read toggles from configuration and the process environment.
    ///
    /// Private units are enabled when the environment variable named in the
    /// config holds a non-empty value. Web search follows the config flag
    /// unless `ENABLE_WEB_SEARCH=false` is set.
    pub fn resolve(config: &ToggleConfig) -> Self {
        let env_set = |name: &str| {
            std::env::var(name)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false)
        };
        let web_search_disabled = std::env::var("ENABLE_WEB_SEARCH")
            .map(|v| v.trim().eq_ignore_ascii_case("false"))
            .unwrap_or(false);

        let toggles = Self {
            web_search: config.web_search && !web_search_disabled,
            private_search: env_set(&config.private_search_env),
            private_retrieval: env_set(&config.private_rag_env),
        };
        tracing::debug!(?toggles, "Resolved capability toggles");
        toggles
    }

    /// Whether `kind` may be selected. Baseline kinds are always allowed.
    pub fn allows(&self, kind: CapabilityKind) -> bool {
        match kind {
            CapabilityKind::WebSearch => self.web_search,
            CapabilityKind::PrivateSearch => self.private_search,
            CapabilityKind::PrivateRetrieval => self.private_retrieval,
            _ => true,
        }
    }
}

/// How the unit set is derived from a query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoutingPolicy {
    /// Always gather broad context.
    #[default]
    Broad,
    /// Pick units from the classified intent.
    Targeted,
}

/// Cost profile applied after targeted routing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    #[default]
    Full,
    Fast,
}

impl fmt::Display for RoutingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoutingPolicy::Broad => f.write_str("broad"),
            RoutingPolicy::Targeted => f.write_str("targeted"),
        }
    }
}

impl FromStr for RoutingPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "broad" => Ok(RoutingPolicy::Broad),
            "targeted" => Ok(RoutingPolicy::Targeted),
            other => Err(format!("unknown routing policy '{}'", other)),
        }
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowMode::Full => f.write_str("full"),
            WorkflowMode::Fast => f.write_str("fast"),
        }
    }
}

impl FromStr for WorkflowMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(WorkflowMode::Full),
            "fast" => Ok(WorkflowMode::Fast),
            other => Err(format!("unknown workflow mode '{}'", other)),
        }
    }
}

// ============= Reasons =============

const REASON_BASELINE: &str = "baseline";
const REASON_TOGGLE: &str = "enabled by toggle";
const REASON_CONCEPT: &str = "concept question";
const REASON_USER_CONTEXT: &str = "user context";
const REASON_SYMBOL_ANALYSIS: &str = "symbol analysis";
const REASON_SIGNAL: &str = "signal request";
const REASON_TECHNICAL: &str = "technical request";
const REASON_NEWS: &str = "news request";
const REASON_KNOWLEDGE: &str = "knowledge context";
const REASON_CONSTRAINTS: &str = "user constraints";
const REASON_PORTFOLIO: &str = "portfolio context";
const REASON_FRESH_SOURCES: &str = "fresh sources";
const REASON_PRIVATE_SEARCH: &str = "private search";
const REASON_PRIVATE_RAG: &str = "private retrieval";
const REASON_FALLBACK: &str = "fallback";

/// The outcome of routing one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingDecision {
    /// Units to run, in dispatch order
    pub selected: Vec<CapabilityKind>,
    /// Why each unit was picked, keyed by unit name
    pub reasons: BTreeMap<String, Vec<String>>,
    pub intent: Intent,
    pub classifier: ClassificationSource,
    pub workflow_mode: WorkflowMode,
    pub policy: RoutingPolicy,
}

impl RoutingDecision {
    fn empty(intent: Intent, classifier: ClassificationSource, policy: RoutingPolicy) -> Self {
        Self {
            selected: Vec::new(),
            reasons: BTreeMap::new(),
            intent,
            classifier,
            workflow_mode: WorkflowMode::Full,
            policy,
        }
    }

    fn add(&mut self, kind: CapabilityKind, reason: &str) {
        if !self.selected.contains(&kind) {
            self.selected.push(kind);
        }
        let reasons = self.reasons.entry(kind.name().to_string()).or_default();
        if !reasons.iter().any(|r| r == reason) {
            reasons.push(reason.to_string());
        }
    }

    /// Unit names in dispatch order.
    pub fn unit_names(&self) -> Vec<&'static str> {
        self.selected.iter().map(|kind| kind.name()).collect()
    }

    /// True when the only unit is Knowledge picked as the last resort.
    pub fn is_fallback_only(&self) -> bool {
        self.selected == [CapabilityKind::Knowledge]
            && self
                .reasons
                .get(CapabilityKind::Knowledge.name())
                .is_some_and(|r| r.iter().any(|reason| reason == REASON_FALLBACK))
    }
}

/// Broad selection: the baseline, then each enabled optional unit.
///
/// The intent is accepted for signature symmetry with [`targeted`] but does
/// not influence the result.
pub fn select(_intent: &Intent, toggles: &Toggles) -> Vec<CapabilityKind> {
    CapabilityKind::ALL
        .into_iter()
        .filter(|kind| !kind.is_optional() || toggles.allows(*kind))
        .collect()
}

fn broad(intent: Intent, toggles: &Toggles) -> RoutingDecision {
    let mut decision =
        RoutingDecision::empty(intent, ClassificationSource::Heuristic, RoutingPolicy::Broad);
    for kind in select(&decision.intent, toggles) {
        let reason = if kind.is_optional() {
            REASON_TOGGLE
        } else {
            REASON_BASELINE
        };
        decision.add(kind, reason);
    }
    decision
}

/// Targeted selection from the intent, before any workflow-mode filtering.
pub fn targeted(
    intent: Intent,
    toggles: &Toggles,
    classifier: ClassificationSource,
) -> RoutingDecision {
    let mut d = RoutingDecision::empty(intent, classifier, RoutingPolicy::Targeted);
    let i = d.intent.clone();

    if i.is_quick_question && !i.has_symbol && !i.is_trade_request {
        d.add(CapabilityKind::Knowledge, REASON_CONCEPT);
        if i.wants_memory {
            d.add(CapabilityKind::Memory, REASON_USER_CONTEXT);
        }
    } else {
        let full_analysis = i.has_symbol
            && (i.is_analysis_request || i.is_trade_request || !i.wants_specific_research());

        if full_analysis {
            d.add(CapabilityKind::Signals, REASON_SYMBOL_ANALYSIS);
            d.add(CapabilityKind::Technical, REASON_SYMBOL_ANALYSIS);
            d.add(CapabilityKind::News, REASON_SYMBOL_ANALYSIS);
        } else {
            if i.has_symbol && (i.wants_signals || i.is_trade_request) {
                d.add(CapabilityKind::Signals, REASON_SIGNAL);
            }
            if i.has_symbol && (i.wants_technical || i.is_trade_request) {
                d.add(CapabilityKind::Technical, REASON_TECHNICAL);
            }
            let symbol_news = i.has_symbol && (i.wants_news || i.wants_fresh);
            if symbol_news || (!i.has_symbol && i.wants_news) {
                d.add(CapabilityKind::News, REASON_NEWS);
            }
        }

        if i.wants_knowledge || (!i.has_symbol && i.is_analysis_request) {
            d.add(CapabilityKind::Knowledge, REASON_KNOWLEDGE);
        }
        if i.wants_memory || i.is_trade_request {
            d.add(CapabilityKind::Memory, REASON_CONSTRAINTS);
        }
        if i.wants_portfolio || i.is_trade_request {
            d.add(CapabilityKind::Portfolio, REASON_PORTFOLIO);
        }
    }

    if toggles.web_search && (i.wants_fresh || i.wants_news || i.wants_sources) {
        d.add(CapabilityKind::WebSearch, REASON_FRESH_SOURCES);
    }
    if toggles.private_search && (i.wants_fresh || i.wants_sources) {
        d.add(CapabilityKind::PrivateSearch, REASON_PRIVATE_SEARCH);
    }
    if toggles.private_retrieval && (i.wants_knowledge || i.wants_sources) {
        d.add(CapabilityKind::PrivateRetrieval, REASON_PRIVATE_RAG);
    }

    if d.selected.is_empty() {
        d.add(CapabilityKind::Knowledge, REASON_FALLBACK);
    }
    d
}

/// Narrow a targeted decision for the given workflow mode.
///
/// Fast mode drops optional units and keeps Knowledge and News only when the
/// intent asks for them. A filter that would leave nothing is not applied.
pub fn apply_mode(mut decision: RoutingDecision, mode: WorkflowMode) -> RoutingDecision {
    decision.workflow_mode = mode;
    if mode == WorkflowMode::Full {
        return decision;
    }

    let i = &decision.intent;
    let keep_knowledge =
        i.wants_knowledge || i.is_quick_question || (!i.has_symbol && i.is_analysis_request);
    let keep_news = i.wants_news || i.wants_fresh || i.wants_sources;

    let filtered: Vec<CapabilityKind> = decision
        .selected
        .iter()
        .copied()
        .filter(|kind| match kind {
            k if k.is_optional() => false,
            CapabilityKind::Knowledge => keep_knowledge,
            CapabilityKind::News => keep_news,
            _ => true,
        })
        .collect();

    if filtered.is_empty() {
        return decision;
    }

    decision
        .reasons
        .retain(|name, _| filtered.iter().any(|kind| kind.name() == name));
    decision.selected = filtered;
    decision
}

/// Routes queries with the process-wide toggles and routing settings.
pub struct Selector {
    toggles: Toggles,
    policy: RoutingPolicy,
    mode: WorkflowMode,
    llm_fallback: Option<LlmIntentClassifier>,
}

impl Selector {
    pub fn new(toggles: Toggles) -> Self {
        Self {
            toggles,
            policy: RoutingPolicy::default(),
            mode: WorkflowMode::default(),
            llm_fallback: None,
        }
    }

    pub fn from_config(toggles: Toggles, config: &RoutingConfig) -> Self {
        Self::new(toggles)
            .with_policy(config.policy)
            .with_mode(config.workflow_mode)
    }

    pub fn with_policy(mut self, policy: RoutingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_mode(mut self, mode: WorkflowMode) -> Self {
        self.mode = mode;
        self
    }

    /// Consult `classifier` when the heuristics find nothing to route on.
    /// Only the targeted policy uses it.
    pub fn with_llm_fallback(mut self, classifier: LlmIntentClassifier) -> Self {
        self.llm_fallback = Some(classifier);
        self
    }

    pub fn toggles(&self) -> &Toggles {
        &self.toggles
    }

    pub fn policy(&self) -> RoutingPolicy {
        self.policy
    }

    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    /// Route `text` without consulting the model.
    pub fn route_heuristic(&self, text: &str) -> RoutingDecision {
        let intent = classify(text);
        match self.policy {
            RoutingPolicy::Broad => broad(intent, &self.toggles),
            RoutingPolicy::Targeted => apply_mode(
                targeted(intent, &self.toggles, ClassificationSource::Heuristic),
                self.mode,
            ),
        }
    }

    /// Route `text` under the configured policy.
    pub async fn route(&self, text: &str) -> RoutingDecision {
        let intent = classify(text);
        if self.policy == RoutingPolicy::Broad {
            return broad(intent, &self.toggles);
        }

        let mut decision = targeted(intent, &self.toggles, ClassificationSource::Heuristic);
        if let Some(classifier) = &self.llm_fallback {
            if Self::needs_llm_fallback(text, &decision) {
                if let Some(llm_intent) = classifier.classify(text).await {
                    tracing::debug!("Routing with model-classified intent");
                    decision = targeted(llm_intent, &self.toggles, ClassificationSource::Llm);
                }
            }
        }
        apply_mode(decision, self.mode)
    }

    fn needs_llm_fallback(text: &str, decision: &RoutingDecision) -> bool {
        let intent = &decision.intent;
        if text.trim().is_empty() || intent.is_trade_request || intent.is_quick_question {
            return false;
        }
        intent.is_empty() || decision.is_fallback_only()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::LLMClient;
    use crate::research::capability::CapabilityKind::*;
    use crate::types::Result;
    use async_trait::async_trait;
    use rstest::rstest;

    struct FixedLLM(&'static str);

    #[async_trait]
    impl LLMClient for FixedLLM {
        async fn generate_with_system(&self, _system: &str, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "fixed"
        }
    }

    #[test]
    fn test_select_baseline_when_toggles_off() {
        let intent = classify("Analyze BTC");
        assert_eq!(select(&intent, &Toggles::none()), CapabilityKind::BASELINE.to_vec());
        assert_eq!(select(&Intent::default(), &Toggles::none()), CapabilityKind::BASELINE.to_vec());
    }

    #[test]
    fn test_select_appends_optional_units_in_order() {
        let toggles = Toggles {
            web_search: false,
            private_search: true,
            private_retrieval: true,
        };
        let selected = select(&Intent::default(), &toggles);
        assert_eq!(&selected[..6], &CapabilityKind::BASELINE);
        assert_eq!(&selected[6..], &[PrivateSearch, PrivateRetrieval]);
        assert_eq!(select(&Intent::default(), &Toggles::all()).len(), 9);
    }

    #[test]
    fn test_select_is_deterministic() {
        let intent = classify("latest news on $ETH");
        let first = select(&intent, &Toggles::all());
        for _ in 0..10 {
            assert_eq!(select(&intent, &Toggles::all()), first);
        }
    }

    #[rstest]
    #[case("explain mean reversion", &[Knowledge])]
    #[case("What is RSI?", &[Technical, Knowledge])]
    #[case("Analyze BTC", &[Signals, Technical, News])]
    #[case("Should I buy AAPL?", &[Signals, Technical, News, Memory, Portfolio])]
    #[case("show my holdings", &[Memory, Portfolio])]
    #[case("", &[Knowledge])]
    fn test_targeted_selection(#[case] text: &str, #[case] expected: &[CapabilityKind]) {
        let decision = targeted(classify(text), &Toggles::none(), ClassificationSource::Heuristic);
        assert_eq!(decision.selected, expected);
        for kind in &decision.selected {
            assert!(decision.reasons.contains_key(kind.name()));
        }
    }

    #[test]
    fn test_targeted_fallback_reason() {
        let decision = targeted(
            Intent::default(),
            &Toggles::all(),
            ClassificationSource::Heuristic,
        );
        assert!(decision.is_fallback_only());
        assert_eq!(decision.reasons["knowledge_research"], vec!["fallback".to_string()]);
    }

    #[test]
    fn test_targeted_optional_units_follow_intent() {
        let intent = Intent {
            wants_sources: true,
            ..Intent::default()
        };
        let decision = targeted(intent, &Toggles::all(), ClassificationSource::Heuristic);
        assert_eq!(decision.selected, vec![WebSearch, PrivateSearch, PrivateRetrieval]);

        let decision = targeted(
            Intent {
                wants_sources: true,
                ..Intent::default()
            },
            &Toggles::none(),
            ClassificationSource::Heuristic,
        );
        assert!(decision.is_fallback_only());
    }

    #[test]
    fn test_fast_mode_drops_optional_and_unwanted_news() {
        let intent = Intent {
            has_symbol: true,
            wants_sources: true,
            is_analysis_request: true,
            ..Intent::default()
        };
        let decision = targeted(intent, &Toggles::all(), ClassificationSource::Heuristic);
        assert!(decision.selected.contains(&WebSearch));

        let fast = apply_mode(decision, WorkflowMode::Fast);
        assert_eq!(fast.selected, vec![Signals, Technical, News]);
        assert_eq!(fast.workflow_mode, WorkflowMode::Fast);
        assert!(!fast.reasons.contains_key("web_search_research"));

        let decision = targeted(
            classify("Analyze BTC"),
            &Toggles::none(),
            ClassificationSource::Heuristic,
        );
        let fast = apply_mode(decision, WorkflowMode::Fast);
        assert_eq!(fast.selected, vec![Signals, Technical]);
        assert!(!fast.reasons.contains_key("news_research"));
    }

    #[test]
    fn test_fast_mode_never_empties_selection() {
        let intent = Intent {
            wants_sources: true,
            ..Intent::default()
        };
        let decision = targeted(intent, &Toggles::all(), ClassificationSource::Heuristic);
        let fast = apply_mode(decision.clone(), WorkflowMode::Fast);
        assert_eq!(fast.selected, decision.selected);
    }

    #[test]
    fn test_policy_and_mode_parse() {
        assert_eq!("Targeted".parse::<RoutingPolicy>(), Ok(RoutingPolicy::Targeted));
        assert_eq!("fast".parse::<WorkflowMode>(), Ok(WorkflowMode::Fast));
        assert!("narrow".parse::<RoutingPolicy>().is_err());
        assert_eq!(WorkflowMode::Full.to_string(), "full");
    }

    #[tokio::test]
    async fn test_broad_policy_ignores_intent() {
        let selector = Selector::new(Toggles::none());
        let decision = selector.route("What is RSI?").await;
        assert_eq!(decision.policy, RoutingPolicy::Broad);
        assert_eq!(decision.selected, CapabilityKind::BASELINE.to_vec());
        assert_eq!(decision.reasons["signals_research"], vec!["baseline".to_string()]);
    }

    #[tokio::test]
    async fn test_llm_fallback_replaces_empty_intent() {
        let classifier = LlmIntentClassifier::new(Box::new(FixedLLM(
            r#"{"symbols": ["AAPL"], "isAnalysisRequest": true}"#,
        )));
        let selector = Selector::new(Toggles::none())
            .with_policy(RoutingPolicy::Targeted)
            .with_llm_fallback(classifier);

        let decision = selector.route("how is the fruit company doing").await;
        assert_eq!(decision.classifier, ClassificationSource::Llm);
        assert_eq!(decision.selected, vec![Signals, Technical, News]);
    }

    #[tokio::test]
    async fn test_llm_fallback_skipped_for_quick_questions() {
        let classifier = LlmIntentClassifier::new(Box::new(FixedLLM(
            r#"{"symbols": ["AAPL"], "isTradeRequest": true}"#,
        )));
        let selector = Selector::new(Toggles::none())
            .with_policy(RoutingPolicy::Targeted)
            .with_llm_fallback(classifier);

        let decision = selector.route("explain mean reversion").await;
        assert_eq!(decision.classifier, ClassificationSource::Heuristic);
        assert_eq!(decision.selected, vec![Knowledge]);
    }
}
