//! Terminal rendering for the routing inspector.
//!
//! Layouts are rendered to a `String` first, so they can be checked without
//! a terminal.

use crate::routing::intent::Intent;
use crate::routing::selector::{RoutingDecision, Toggles};
use crate::utils::toml_config::ResearchConfig;
use owo_colors::OwoColorize;
use std::fmt::Write as _;
use std::path::Path;

/// Result of checking a config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    Defaulted,
    Invalid,
}

/// Inspector output, colored or plain.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    pub colored: bool,
}

impl Output {
    pub fn new(colored: bool) -> Self {
        Self { colored }
    }

    /// Print a one-line config verdict. Invalid goes to stderr.
    pub fn verdict(&self, verdict: Verdict, message: &str) {
        let line = self.render_verdict(verdict, message);
        match verdict {
            Verdict::Invalid => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    /// Print how `prompt` was routed.
    pub fn decision(&self, prompt: &str, decision: &RoutingDecision) {
        print!("{}", self.render_decision(prompt, decision));
    }

    /// Print the effective configuration and resolved toggles.
    pub fn configuration(&self, path: &Path, config: &ResearchConfig, toggles: &Toggles) {
        print!("{}", self.render_configuration(path, config, toggles));
    }

    fn render_verdict(&self, verdict: Verdict, message: &str) -> String {
        let (mark, plain) = match verdict {
            Verdict::Valid => ("✓", "[OK]"),
            Verdict::Defaulted => ("⚠", "[DEFAULTS]"),
            Verdict::Invalid => ("✗", "[INVALID]"),
        };
        if !self.colored {
            return format!("  {} {}", plain, message);
        }
        match verdict {
            Verdict::Valid => format!("  {} {}", mark.green().bold(), message.green()),
            Verdict::Defaulted => format!("  {} {}", mark.yellow().bold(), message.yellow()),
            Verdict::Invalid => format!("  {} {}", mark.red().bold(), message.red()),
        }
    }

    pub fn render_decision(&self, prompt: &str, decision: &RoutingDecision) -> String {
        let mut out = self.section(&format!("\"{}\"", prompt));
        self.field(&mut out, "policy", &decision.policy.to_string());
        self.field(&mut out, "mode", &decision.workflow_mode.to_string());
        let classifier = format!("{:?}", decision.classifier).to_lowercase();
        self.field(&mut out, "classifier", &classifier);
        self.field(&mut out, "intent", &intent_summary(&decision.intent));

        if decision.selected.is_empty() {
            self.field(&mut out, "units", "none");
        }
        for kind in &decision.selected {
            let reasons = decision
                .reasons
                .get(kind.name())
                .map(|r| r.join(", "))
                .unwrap_or_default();
            self.unit(&mut out, kind.name(), &reasons);
        }
        out
    }

    pub fn render_configuration(
        &self,
        path: &Path,
        config: &ResearchConfig,
        toggles: &Toggles,
    ) -> String {
        let mut out = self.section("Configuration");
        self.field(&mut out, "file", &path.display().to_string());
        self.field(&mut out, "log level", &config.logging.level);
        self.field(&mut out, "policy", &config.routing.policy.to_string());
        self.field(&mut out, "workflow mode", &config.routing.workflow_mode.to_string());
        self.field(&mut out, "llm fallback", on_off(config.routing.llm_fallback));
        self.field(&mut out, "lane capacity", &config.runner.lane_capacity.to_string());
        self.field(&mut out, "fallback sentinel", &config.runner.fallback_sentinel);

        out.push_str(&self.section("Toggles"));
        self.field(&mut out, "web search", on_off(toggles.web_search));
        self.field(
            &mut out,
            &format!("private search (${})", config.toggles.private_search_env),
            on_off(toggles.private_search),
        );
        self.field(
            &mut out,
            &format!("private retrieval (${})", config.toggles.private_rag_env),
            on_off(toggles.private_retrieval),
        );
        out
    }

    fn section(&self, title: &str) -> String {
        if self.colored {
            format!("\n  {}\n", title.bright_white().bold().underline())
        } else {
            format!("\n  == {} ==\n", title)
        }
    }

    fn field(&self, out: &mut String, key: &str, value: &str) {
        let _ = if self.colored {
            writeln!(out, "    {:<14} {}", key.dimmed(), value.bright_white())
        } else {
            writeln!(out, "    {:<14} {}", key, value)
        };
    }

    fn unit(&self, out: &mut String, name: &str, reasons: &str) {
        let _ = if self.colored {
            writeln!(out, "    {} {} {}", "→".blue(), name, format!("({})", reasons).dimmed())
        } else {
            writeln!(out, "    -> {} ({})", name, reasons)
        };
    }
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// One-line rendering of the set flags and symbols of an intent.
pub fn intent_summary(intent: &Intent) -> String {
    let flags = [
        ("news", intent.wants_news),
        ("technical", intent.wants_technical),
        ("signals", intent.wants_signals),
        ("knowledge", intent.wants_knowledge),
        ("memory", intent.wants_memory),
        ("portfolio", intent.wants_portfolio),
        ("fresh", intent.wants_fresh),
        ("sources", intent.wants_sources),
        ("trade", intent.is_trade_request),
        ("analysis", intent.is_analysis_request),
        ("quick", intent.is_quick_question),
    ];
    let mut parts: Vec<String> = flags
        .iter()
        .filter(|(_, set)| *set)
        .map(|(name, _)| name.to_string())
        .collect();

    if !intent.symbols.is_empty() {
        let symbols: Vec<&str> = intent.symbols.iter().map(String::as_str).collect();
        parts.insert(0, format!("symbols=[{}]", symbols.join(",")));
    } else if intent.has_symbol {
        parts.insert(0, "asset".to_string());
    }

    if parts.is_empty() {
        "(empty)".to_string()
    } else {
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::intent::classify;
    use crate::routing::selector::{RoutingPolicy, Selector};

    #[test]
    fn test_intent_summary() {
        assert_eq!(intent_summary(&Intent::default()), "(empty)");

        let summary = intent_summary(&classify("Should I buy AAPL?"));
        assert!(summary.starts_with("symbols=[AAPL]"));
        assert!(summary.contains("trade"));
        assert!(summary.contains("analysis"));

        let summary = intent_summary(&classify("gold outlook"));
        assert!(summary.starts_with("asset"));
    }

    #[test]
    fn test_plain_decision_lists_units_with_reasons() {
        let selector = Selector::new(Toggles::none()).with_policy(RoutingPolicy::Targeted);
        let decision = selector.route_heuristic("explain mean reversion");
        let text = Output::new(false).render_decision("explain mean reversion", &decision);

        assert!(text.contains("== \"explain mean reversion\" =="));
        assert!(text.contains("policy"));
        assert!(text.contains("targeted"));
        assert!(text.contains("-> knowledge_research (concept question)"));
    }

    #[test]
    fn test_plain_configuration_shows_toggle_env_vars() {
        let config = ResearchConfig::default();
        let text = Output::new(false).render_configuration(
            Path::new("research.toml"),
            &config,
            &Toggles::none(),
        );

        assert!(text.contains("== Configuration =="));
        assert!(text.contains("== Toggles =="));
        assert!(text.contains("private search ($PRIVATE_SEARCH_DATASTORE_ID)"));
        assert!(text.contains("research.toml"));
    }

    #[test]
    fn test_verdict_plain_tags() {
        let output = Output::new(false);
        assert_eq!(output.render_verdict(Verdict::Valid, "ok.toml"), "  [OK] ok.toml");
        assert_eq!(output.render_verdict(Verdict::Invalid, "bad"), "  [INVALID] bad");
    }
}
