//! # Token Usage Tracking
//!
//! Observability only: records the estimated size and variant of every prompt
//! sent during a run and summarizes them afterwards.

use crate::budget::{BudgetedPrompt, PromptVariant};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct TokenUsageTracker {
    max_prompt_tokens: usize,
    usage: Vec<(usize, PromptVariant)>,
    truncations: usize,
    over_budget: usize,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct TokenUsageSummary {
    pub prompts_tracked: usize,
    /// Prompt count per variant, keyed by `full`, `compact`, `truncated` and `degraded`.
    pub variants: BTreeMap<String, usize>,
    pub avg_tokens: f64,
    pub min_tokens: usize,
    pub max_tokens: usize,
    pub max_prompt_tokens: usize,
    /// Average share of `max_prompt_tokens` used, in percent.
    pub avg_utilization: f64,
    pub truncations: usize,
    pub over_budget: usize,
    pub health: String,
}

impl TokenUsageTracker {
    pub fn new(max_prompt_tokens: usize) -> Self {
        Self {
            max_prompt_tokens,
            usage: Vec::new(),
            truncations: 0,
            over_budget: 0,
        }
    }

    pub fn record(&mut self, prompt: &BudgetedPrompt) {
        self.usage.push((prompt.estimated_tokens, prompt.variant));
        if prompt.truncated {
            self.truncations += 1;
        }
        if prompt.over_budget {
            self.over_budget += 1;
        }
        debug!(
            "Prompt token usage: {}/{} tokens ({:.1}%), {} template",
            prompt.estimated_tokens,
            self.max_prompt_tokens,
            percent(prompt.estimated_tokens as f64, self.max_prompt_tokens),
            prompt.variant.as_str()
        );
    }

    pub fn is_empty(&self) -> bool {
        self.usage.is_empty()
    }

    pub fn reset(&mut self) {
        self.usage.clear();
        self.truncations = 0;
        self.over_budget = 0;
    }

    /// Summarizes everything recorded since creation or the last reset.
    pub fn summary(&self) -> TokenUsageSummary {
        let mut variants: BTreeMap<String, usize> = [
            PromptVariant::Full,
            PromptVariant::Compact,
            PromptVariant::Truncated,
            PromptVariant::Degraded,
        ]
        .iter()
        .map(|v| (v.as_str().to_string(), 0))
        .collect();
        for (_, variant) in &self.usage {
            *variants.entry(variant.as_str().to_string()).or_default() += 1;
        }

        let tokens = self.usage.iter().map(|(t, _)| *t);
        let total: usize = tokens.clone().sum();
        let avg_tokens = if self.usage.is_empty() {
            0.0
        } else {
            total as f64 / self.usage.len() as f64
        };
        let avg_utilization = percent(avg_tokens, self.max_prompt_tokens);

        TokenUsageSummary {
            prompts_tracked: self.usage.len(),
            variants,
            avg_tokens,
            min_tokens: tokens.clone().min().unwrap_or(0),
            max_tokens: tokens.max().unwrap_or(0),
            max_prompt_tokens: self.max_prompt_tokens,
            avg_utilization,
            truncations: self.truncations,
            over_budget: self.over_budget,
            health: health_label(avg_utilization).to_string(),
        }
    }

    /// Logs the summary; elevated usage and truncations are reported as warnings.
    pub fn log_summary(&self) {
        if self.usage.is_empty() {
            return;
        }
        let summary = self.summary();
        info!(
            "Token usage: {} prompts, avg {:.0} tokens (min {}, max {}), {:.1}% of {} ({})",
            summary.prompts_tracked,
            summary.avg_tokens,
            summary.min_tokens,
            summary.max_tokens,
            summary.avg_utilization,
            summary.max_prompt_tokens,
            summary.health
        );
        info!("Prompt variants: {:?}", summary.variants);
        if summary.health == "saturated" {
            warn!("Token utilization is above 90%, consider a smaller max_block_size");
        }
        if summary.truncations > 0 {
            warn!("{} prompts had their content truncated", summary.truncations);
        }
        if summary.over_budget > 0 {
            warn!("{} prompts remained over the token budget", summary.over_budget);
        }
    }
}

fn percent(value: f64, of: usize) -> f64 {
    if of == 0 {
        0.0
    } else {
        value / of as f64 * 100.0
    }
}

fn health_label(utilization: f64) -> &'static str {
    if utilization <= 75.0 {
        "healthy"
    } else if utilization <= 90.0 {
        "elevated"
    } else {
        "saturated"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prompt(tokens: usize, variant: PromptVariant, truncated: bool) -> BudgetedPrompt {
        BudgetedPrompt {
            text: String::new(),
            variant,
            estimated_tokens: tokens,
            truncated,
            over_budget: tokens > 1000,
        }
    }

    #[test]
    fn summary_aggregates_recorded_prompts() {
        let mut tracker = TokenUsageTracker::new(1000);
        tracker.record(&prompt(600, PromptVariant::Full, false));
        tracker.record(&prompt(800, PromptVariant::Compact, false));
        tracker.record(&prompt(1000, PromptVariant::Truncated, true));

        let summary = tracker.summary();
        assert_eq!(summary.prompts_tracked, 3);
        assert_eq!(summary.variants["full"], 1);
        assert_eq!(summary.variants["compact"], 1);
        assert_eq!(summary.variants["truncated"], 1);
        assert_eq!(summary.variants["degraded"], 0);
        assert_eq!(summary.min_tokens, 600);
        assert_eq!(summary.max_tokens, 1000);
        assert!((summary.avg_tokens - 800.0).abs() < f64::EPSILON);
        assert!((summary.avg_utilization - 80.0).abs() < 1e-9);
        assert_eq!(summary.health, "elevated");
        assert_eq!(summary.truncations, 1);
        assert_eq!(summary.over_budget, 0);
    }

    #[test]
    fn reset_clears_everything() {
        let mut tracker = TokenUsageTracker::new(1000);
        tracker.record(&prompt(1200, PromptVariant::Degraded, true));
        tracker.reset();
        assert!(tracker.is_empty());
        let summary = tracker.summary();
        assert_eq!(summary.prompts_tracked, 0);
        assert_eq!(summary.min_tokens, 0);
        assert_eq!(summary.truncations, 0);
        assert_eq!(summary.over_budget, 0);
        assert_eq!(summary.health, "healthy");
    }

    #[test]
    fn health_thresholds() {
        assert_eq!(health_label(75.0), "healthy");
        assert_eq!(health_label(90.0), "elevated");
        assert_eq!(health_label(90.1), "saturated");
    }
}
