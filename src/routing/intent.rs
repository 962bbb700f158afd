//! Heuristic intent classification.
//!
//! [`classify`] turns free text into an [`Intent`]: a set of ticker-like
//! symbol candidates plus boolean flags describing what kind of research
//! the query asks for. Classification is total; empty or malformed input
//! yields [`Intent::default`].
//!
//! Symbols are extracted from the raw text (case matters for bare
//! upper-case tickers) while keyword flags are matched against a folded
//! copy: decomposed, stripped of combining marks, whitespace-collapsed and
//! lower-cased. Symbol extraction over-approximates; callers should treat
//! [`Intent::symbols`] as candidates.

use crate::routing::keywords::{
    self, ANALYSIS_KEYWORDS, ASSET_KEYWORDS, COMMODITY_KEYWORDS, COMPARE_KEYWORDS,
    EXCHANGE_PREFIXES, FRESH_KEYWORDS, INDEX_KEYWORDS, KNOWLEDGE_KEYWORDS, MEMORY_KEYWORDS,
    NEWS_KEYWORDS, PORTFOLIO_KEYWORDS, QUICK_QUESTION_PHRASES, SIGNAL_KEYWORDS, SOURCE_KEYWORDS,
    TECH_KEYWORDS, TRADE_KEYWORDS,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::LazyLock;
use unicode_normalization::UnicodeNormalization;

static DOLLAR_TICKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$([A-Za-z]{1,10})\b").expect("dollar ticker pattern must compile")
});

static EXCHANGE_TICKER: LazyLock<Regex> = LazyLock::new(|| {
    let pattern = format!(
        r"(?i)\b(?:{}):([A-Za-z0-9./-]{{1,15}})\b",
        EXCHANGE_PREFIXES.join("|")
    );
    Regex::new(&pattern).expect("exchange ticker pattern must compile")
});

static JOINED_TICKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z]{1,10}(?:[-./][A-Za-z0-9]{1,10})+)\b")
        .expect("joined ticker pattern must compile")
});

static USDT_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Za-z]{2,6}USDT)\b").expect("usdt pair pattern must compile")
});

static UPPER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,6}\b").expect("upper token pattern must compile"));

static LOWER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[a-z]{2,6}\b").expect("lower token pattern must compile"));

/// Structured routing intent for a single query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Intent {
    /// Normalized, upper-cased symbol candidates
    pub symbols: BTreeSet<String>,
    /// A symbol survived extraction or an asset/index/commodity keyword matched
    pub has_symbol: bool,
    pub wants_news: bool,
    pub wants_technical: bool,
    pub wants_signals: bool,
    pub wants_knowledge: bool,
    pub wants_memory: bool,
    pub wants_portfolio: bool,
    pub wants_fresh: bool,
    pub wants_sources: bool,
    pub is_trade_request: bool,
    pub is_analysis_request: bool,
    pub is_quick_question: bool,
}

impl Intent {
    /// True when no symbol and no flag is set.
    pub fn is_empty(&self) -> bool {
        !(self.has_symbol
            || self.wants_news
            || self.wants_technical
            || self.wants_signals
            || self.wants_knowledge
            || self.wants_memory
            || self.wants_portfolio
            || self.wants_fresh
            || self.wants_sources
            || self.is_trade_request
            || self.is_analysis_request
            || self.is_quick_question)
    }

    /// True when the query names a specific capability beyond a bare symbol.
    pub fn wants_specific_research(&self) -> bool {
        self.wants_news || self.wants_technical || self.wants_signals || self.wants_knowledge
    }
}

/// Classify free text into an [`Intent`].
pub fn classify(text: &str) -> Intent {
    let folded = normalize_for_matching(text).to_lowercase();
    let symbols = find_symbol_candidates(text);
    let mentions_asset = text_has_any(&folded, ASSET_KEYWORDS)
        || text_has_any(&folded, INDEX_KEYWORDS)
        || text_has_any(&folded, COMMODITY_KEYWORDS);

    Intent {
        has_symbol: !symbols.is_empty() || mentions_asset,
        symbols,
        wants_news: text_has_any(&folded, NEWS_KEYWORDS),
        wants_technical: text_has_any(&folded, TECH_KEYWORDS),
        wants_signals: text_has_any(&folded, SIGNAL_KEYWORDS),
        wants_knowledge: text_has_any(&folded, KNOWLEDGE_KEYWORDS),
        wants_memory: text_has_any(&folded, MEMORY_KEYWORDS),
        wants_portfolio: text_has_any(&folded, PORTFOLIO_KEYWORDS),
        wants_fresh: text_has_any(&folded, FRESH_KEYWORDS),
        wants_sources: text_has_any(&folded, SOURCE_KEYWORDS),
        is_trade_request: text_has_any(&folded, TRADE_KEYWORDS),
        is_analysis_request: text_has_any(&folded, ANALYSIS_KEYWORDS)
            || text_has_any(&folded, COMPARE_KEYWORDS),
        is_quick_question: text_has_any(&folded, QUICK_QUESTION_PHRASES),
    }
}

/// Decompose, strip combining marks and collapse whitespace.
///
/// Case is preserved; callers fold it when they need to.
pub fn normalize_for_matching(text: &str) -> String {
    let stripped: String = text
        .nfd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Run every symbol pass over the raw text and keep accepted candidates.
pub fn find_symbol_candidates(raw: &str) -> BTreeSet<String> {
    let mut candidates = BTreeSet::new();
    if raw.trim().is_empty() {
        return candidates;
    }

    let mut add = |value: &str| {
        let normalized = normalize_symbol_candidate(value);
        if is_symbol_candidate(&normalized) {
            candidates.insert(normalized);
        }
    };

    for pass in [&*DOLLAR_TICKER, &*EXCHANGE_TICKER, &*JOINED_TICKER, &*USDT_PAIR] {
        for captures in pass.captures_iter(raw) {
            if let Some(m) = captures.get(1) {
                add(m.as_str());
            }
        }
    }

    for token in UPPER_TOKEN.find_iter(raw) {
        add(token.as_str());
    }

    let lowered = raw.to_lowercase();
    for token in LOWER_TOKEN.find_iter(&lowered) {
        let upper = token.as_str().to_uppercase();
        if keywords::is_known_ticker(&upper) {
            add(&upper);
        }
    }

    candidates
}

fn normalize_symbol_candidate(value: &str) -> String {
    value
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_alphanumeric())
        .trim_end_matches(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '/' | '-')))
        .to_uppercase()
}

fn is_symbol_candidate(value: &str) -> bool {
    if value.is_empty() || keywords::is_stop_symbol(value) {
        return false;
    }
    if !value.chars().any(|c| c.is_ascii_uppercase()) {
        return false;
    }
    // Bare two-letter tokens are mostly noise ("US", "AI", "IT")
    if value.len() == 2 && !keywords::is_known_ticker(value) {
        return false;
    }
    true
}

/// Phrases and punctuation-bearing keywords match as substrings; bare words
/// must sit on word boundaries so "ai" does not fire inside "said".
fn text_has_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| {
        if keyword.contains([' ', '&', '/']) {
            text.contains(keyword)
        } else {
            contains_word(text, keyword)
        }
    })
}

fn contains_word(text: &str, word: &str) -> bool {
    text.match_indices(word).any(|(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + word.len()..].chars().next();
        !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn symbols(intent: &Intent) -> Vec<&str> {
        intent.symbols.iter().map(String::as_str).collect()
    }

    #[test]
    fn test_dollar_ticker() {
        let intent = classify("$BTC to the moon");
        assert!(intent.symbols.contains("BTC"));
        assert!(intent.has_symbol);
    }

    #[test]
    fn test_compare_two_tickers() {
        let intent = classify("AAPL vs MSFT");
        assert!(intent.symbols.contains("AAPL"));
        assert!(intent.symbols.contains("MSFT"));
        assert!(intent.is_analysis_request);
    }

    #[test]
    fn test_deny_listed_acronyms() {
        let intent = classify("the EU GDP report");
        assert!(intent.symbols.is_empty(), "got {:?}", symbols(&intent));
        assert!(!intent.has_symbol);
        assert!(intent.wants_news);
    }

    #[test]
    fn test_swedish_quick_question() {
        let intent = classify("Vad är RSI?");
        assert!(intent.wants_technical);
        assert!(intent.is_quick_question);
    }

    #[rstest]
    #[case("", true)]
    #[case("   \t\n ", true)]
    #[case("???!!!", true)]
    #[case("show my holdings", false)]
    fn test_degenerate_input_is_empty(#[case] text: &str, #[case] expect_empty: bool) {
        let intent = classify(text);
        assert_eq!(intent.is_empty(), expect_empty, "{text:?} -> {intent:?}");
        if expect_empty {
            assert_eq!(intent, Intent::default());
        }
    }

    #[rstest]
    #[case("check CRYPTO:SOLUSDT please", "SOLUSDT")]
    #[case("nasdaq:nvda earnings", "NVDA")]
    #[case("how is VOLV-B.ST doing", "VOLV-B.ST")]
    #[case("ethusdt breakout", "ETHUSDT")]
    #[case("is tsla overbought", "TSLA")]
    #[case("GE earnings", "GE")]
    fn test_symbol_passes(#[case] text: &str, #[case] expected: &str) {
        let intent = classify(text);
        assert!(
            intent.symbols.contains(expected),
            "{text:?} should yield {expected}, got {:?}",
            symbols(&intent)
        );
    }

    #[rstest]
    #[case("US stocks look weak")]
    #[case("AI hype")]
    #[case("USD strength")]
    fn test_noise_tokens_rejected(#[case] text: &str) {
        let intent = classify(text);
        assert!(intent.symbols.is_empty(), "{text:?} -> {:?}", symbols(&intent));
    }

    #[test]
    fn test_asset_keyword_sets_has_symbol_without_ticker() {
        let intent = classify("is gold a good hedge");
        assert!(intent.symbols.is_empty());
        assert!(intent.has_symbol);

        let intent = classify("thoughts on bitcoin");
        assert!(intent.has_symbol);
        assert!(intent.is_analysis_request);
    }

    #[test]
    fn test_word_boundary_prevents_partial_matches() {
        // "rsi" must not fire inside "versions", "now" not inside "known"
        let intent = classify("he said versions are known");
        assert!(!intent.wants_technical);
        assert!(!intent.wants_fresh);
    }

    #[test]
    fn test_phrase_keywords_use_substring() {
        let intent = classify("what is the moving average on s&p 500");
        assert!(intent.is_quick_question);
        assert!(intent.wants_knowledge);
        assert!(intent.wants_technical);
        assert!(intent.has_symbol);
    }

    #[test]
    fn test_multiple_request_shapes() {
        let intent = classify("Should I buy NVDA? Give me your outlook");
        assert!(intent.is_trade_request);
        assert!(intent.is_analysis_request);
        assert!(intent.symbols.contains("NVDA"));
    }

    #[test]
    fn test_diacritics_are_stripped() {
        assert_eq!(normalize_for_matching("Förklara  räntan\tidag"), "Forklara rantan idag");

        let intent = classify("Förklara ränta idag");
        assert!(intent.is_quick_question);
        assert!(intent.wants_fresh);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let text = "Analyze BTC and ETH, latest news and RSI levels";
        assert_eq!(classify(text), classify(text));
    }

    #[test]
    fn test_intent_serializes_camel_case() {
        let json = serde_json::to_value(classify("$ETH news")).unwrap();
        assert_eq!(json["hasSymbol"], true);
        assert_eq!(json["wantsNews"], true);
        assert_eq!(json["symbols"][0], "ETH");
    }
}
