use crate::pipeline::Verdict;

use super::config::PolicyConfig;
use super::decision::{BudgetUsage, PolicyDecision, RiskLevel};

/// Everything the gate looks at for one task. Assembled by the run
/// coordinator; `ci_conclusion` is the caller-supplied value defaulting to
/// `success`, `changed_files` counts distinct touched paths including
/// generated tests.
#[derive(Debug, Clone)]
pub struct PolicyInput<'a> {
    pub verdict: &'a Verdict,
    pub ci_conclusion: &'a str,
    pub changed_files: usize,
    pub budget: BudgetUsage,
}

pub struct PolicyGate;

impl PolicyGate {
    /// Evaluate the merge-gate rules in order, short-circuiting on the
    /// first failure. Pure: no I/O, deterministic for identical inputs.
    ///
    /// Hard rules (verifier, CI) and exceeded soft ceilings yield `high`
    /// risk; otherwise risk grades by how many soft signals sit at or
    /// above `near_ratio` of their ceiling.
    pub fn evaluate(cfg: &PolicyConfig, input: &PolicyInput<'_>) -> PolicyDecision {
        let mut reasons: Vec<String> = Vec::new();
        let mut failed = false;

        // 1. Verifier must report pass.
        if input.verdict.is_pass() {
            reasons.push("verifier=pass".to_string());
        } else {
            reasons.push("verifier reported fail".to_string());
            failed = true;
        }

        // 2. CI conclusion must be success.
        if !failed {
            if input.ci_conclusion == "success" {
                reasons.push("ci=success".to_string());
            } else {
                reasons.push(format!("ci conclusion is '{}'", input.ci_conclusion));
                failed = true;
            }
        }

        // 3. Diff footprint within ceiling.
        if !failed {
            if input.changed_files <= cfg.max_changed_files {
                reasons.push(format!(
                    "diff footprint ok ({}/{})",
                    input.changed_files, cfg.max_changed_files
                ));
            } else {
                reasons.push(format!(
                    "diff footprint {} exceeds ceiling {}",
                    input.changed_files, cfg.max_changed_files
                ));
                failed = true;
            }
        }

        // 4. Budget telemetry under thresholds.
        if !failed {
            if input.budget.tokens_used >= cfg.max_tokens {
                reasons.push(format!(
                    "token budget exhausted ({}/{})",
                    input.budget.tokens_used, cfg.max_tokens
                ));
                failed = true;
            } else if input.budget.api_calls >= cfg.max_api_calls {
                reasons.push(format!(
                    "api call budget exhausted ({}/{})",
                    input.budget.api_calls, cfg.max_api_calls
                ));
                failed = true;
            } else {
                reasons.push(format!(
                    "budget ok (tokens {}/{}, api calls {}/{})",
                    input.budget.tokens_used,
                    cfg.max_tokens,
                    input.budget.api_calls,
                    cfg.max_api_calls
                ));
            }
        }

        let risk_level = if failed {
            RiskLevel::High
        } else {
            let mut near = 0usize;
            if is_near(input.changed_files as f64, cfg.max_changed_files as f64, cfg) {
                near += 1;
                reasons.push("diff footprint near ceiling".to_string());
            }
            if is_near(input.budget.tokens_used as f64, cfg.max_tokens as f64, cfg) {
                near += 1;
                reasons.push("token budget near ceiling".to_string());
            }
            if is_near(input.budget.api_calls as f64, cfg.max_api_calls as f64, cfg) {
                near += 1;
                reasons.push("api call budget near ceiling".to_string());
            }
            match near {
                0 => RiskLevel::Low,
                1 => RiskLevel::Medium,
                _ => RiskLevel::High,
            }
        };

        PolicyDecision {
            allow_merge: !failed,
            risk_level,
            reasons,
            budget: input.budget,
        }
    }
}

fn is_near(value: f64, ceiling: f64, cfg: &PolicyConfig) -> bool {
    ceiling > 0.0 && value >= ceiling * cfg.near_ratio
}
