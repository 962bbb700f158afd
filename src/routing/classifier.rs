//! Model-assisted intent classification.
//!
//! Used as a second opinion when the keyword heuristics produce an empty
//! intent. The model is asked for a JSON object with the same fields as
//! [`Intent`]; anything it gets wrong degrades to `None` rather than an
//! error, so routing always has the heuristic result to fall back on.

use crate::llm::LLMClient;
use crate::routing::intent::Intent;
use serde::Deserialize;
use std::collections::BTreeSet;

/// Longest symbol kept from a model reply.
const MAX_SYMBOL_LEN: usize = 12;

/// Most symbols kept from a model reply.
const MAX_SYMBOLS: usize = 10;

const CLASSIFIER_SYSTEM_PROMPT: &str = r#"You are a routing classifier for a trading assistant.
Respond with ONLY a JSON object with these fields:
{"symbols": [string], "hasSymbol": bool, "wantsNews": bool, "wantsTechnical": bool,
 "wantsSignals": bool, "wantsKnowledge": bool, "wantsMemory": bool, "wantsPortfolio": bool,
 "wantsFresh": bool, "wantsSources": bool, "isTradeRequest": bool,
 "isAnalysisRequest": bool, "isQuickQuestion": bool}

Guidelines:
- symbols: tickers or asset symbols; map common names to tickers (bitcoin -> BTC, apple -> AAPL).
- hasSymbol: true if a specific asset/ticker is referenced.
- wantsNews: news, headlines, sentiment, macro updates, earnings, latest.
- wantsTechnical: charts, indicators, support/resistance, levels, technical analysis.
- wantsSignals: signals, scans, alerts, setups.
- wantsKnowledge: definitions, explanations, strategies, risk management.
- wantsMemory: the user's own preferences, risk, constraints.
- wantsPortfolio: holdings, positions, exposure, allocation, P&L.
- wantsFresh: latest, recent, today, this week.
- wantsSources: sources, citations, reports, studies.
- isTradeRequest: buy, sell, enter, exit, allocate, rebalance.
- isAnalysisRequest: analyze, outlook, thesis, forecast, compare.
- isQuickQuestion: short "what is/why/how" question.
If unsure, set fields to false."#;

/// Where an intent came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassificationSource {
    Heuristic,
    Llm,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct IntentPayload {
    symbols: Vec<String>,
    has_symbol: bool,
    wants_news: bool,
    wants_technical: bool,
    wants_signals: bool,
    wants_knowledge: bool,
    wants_memory: bool,
    wants_portfolio: bool,
    wants_fresh: bool,
    wants_sources: bool,
    is_trade_request: bool,
    is_analysis_request: bool,
    is_quick_question: bool,
}

impl From<IntentPayload> for Intent {
    fn from(payload: IntentPayload) -> Self {
        let symbols = normalize_symbols(&payload.symbols);
        Intent {
            has_symbol: payload.has_symbol || !symbols.is_empty(),
            symbols,
            wants_news: payload.wants_news,
            wants_technical: payload.wants_technical,
            wants_signals: payload.wants_signals,
            wants_knowledge: payload.wants_knowledge,
            wants_memory: payload.wants_memory,
            wants_portfolio: payload.wants_portfolio,
            wants_fresh: payload.wants_fresh,
            wants_sources: payload.wants_sources,
            is_trade_request: payload.is_trade_request,
            is_analysis_request: payload.is_analysis_request,
            is_quick_question: payload.is_quick_question,
        }
    }
}

/// Asks a language model to classify a query.
pub struct LlmIntentClassifier {
    llm: Box<dyn LLMClient>,
}

impl LlmIntentClassifier {
    pub fn new(llm: Box<dyn LLMClient>) -> Self {
        Self { llm }
    }

    /// Classify `text`, or `None` when the model is unavailable or its reply
    /// cannot be understood.
    pub async fn classify(&self, text: &str) -> Option<Intent> {
        if text.trim().is_empty() {
            return None;
        }

        let prompt = format!("User message:\n\"\"\"{}\"\"\"", text);
        let response = match self
            .llm
            .generate_with_system(CLASSIFIER_SYSTEM_PROMPT, &prompt)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(
                    model = self.llm.model_name(),
                    error = %e,
                    "LLM intent classification failed"
                );
                return None;
            }
        };

        let intent = Self::parse_intent(&response);
        if intent.is_none() {
            tracing::warn!(
                model = self.llm.model_name(),
                "Could not parse LLM intent reply: {}",
                response
            );
        }
        intent
    }

    /// Parse an intent object from model output.
    ///
    /// Accepts a bare object, an object wrapped in a Markdown code fence, or
    /// an object embedded in surrounding prose.
    fn parse_intent(output: &str) -> Option<Intent> {
        let trimmed = output.trim();
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end < start {
            return None;
        }
        serde_json::from_str::<IntentPayload>(&trimmed[start..=end])
            .ok()
            .map(Intent::from)
    }
}

fn normalize_symbols(raw: &[String]) -> BTreeSet<String> {
    let mut seen = Vec::new();
    for symbol in raw {
        let cleaned: String = symbol
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-'))
            .collect::<String>()
            .to_uppercase();
        if cleaned.is_empty() || cleaned.len() > MAX_SYMBOL_LEN || seen.contains(&cleaned) {
            continue;
        }
        seen.push(cleaned);
    }
    seen.into_iter().take(MAX_SYMBOLS).collect()
}
