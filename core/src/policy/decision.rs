use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Caller-supplied consumption counters; read-only input to the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetUsage {
    #[serde(default)]
    pub tokens_used: u64,
    #[serde(default)]
    pub api_calls: u64,
}

/// The gate's verdict on whether a verified patch may be merged.
///
/// Derived, never persisted beyond the response that carries it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allow_merge: bool,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub budget: BudgetUsage,
}
