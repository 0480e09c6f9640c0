use std::path::Path;

use safe_engagement_screening::error::IntegrityViolation;
use safe_engagement_screening::flow::{FlowDefinition, FlowGraph, integrity_violations};
use safe_engagement_screening::flows::hiv;
use safe_engagement_screening::node::NodeKey;
use safe_engagement_screening::tiers::{Tier, TierTable};

use crate::loader;

/// Everything wrong with a flow and tier configuration.
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub violations: Vec<IntegrityViolation>,
    pub unreachable: Vec<String>,
    pub tiers_error: Option<String>,
}

impl ValidationReport {
    pub fn is_ok(&self) -> bool {
        self.violations.is_empty() && self.tiers_error.is_none()
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for violation in &self.violations {
            out.push_str(&format!("error: {violation}\n"));
        }
        if let Some(err) = &self.tiers_error {
            out.push_str(&format!("error: {err}\n"));
        }
        for id in &self.unreachable {
            out.push_str(&format!("warning: node '{id}' is unreachable\n"));
        }
        if self.is_ok() {
            out.push_str("ok\n");
        }
        out
    }
}

/// Check a flow (built-in when `flow` is `None`) and a tier file, collecting
/// every problem instead of stopping at the first.
///
/// Files that cannot be read or are not well-formed JSON of the right shape
/// are returned as `Err`, for flows and tiers alike. Everything in the report
/// concerns definitions that parsed.
pub fn validate(flow: Option<&Path>, tiers: Option<&Path>) -> eyre::Result<ValidationReport> {
    let mut report = match flow {
        None => check_flow(hiv::definition().clone()),
        Some(path) => check_flow(loader::read_flow(path)?),
    };
    if let Some(path) = tiers {
        if let Err(err) = TierTable::new(read_tier_list(path)?) {
            report.tiers_error = Some(format!("tiers at {}: {err}", path.display()));
        }
    }
    Ok(report)
}

fn read_tier_list(path: &Path) -> eyre::Result<Vec<Tier>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read tiers at {}: {e}", path.display()))?;
    serde_json::from_str(&json)
        .map_err(|e| eyre::eyre!("failed to parse tiers at {}: {e}", path.display()))
}

fn check_flow<K: NodeKey>(definition: FlowDefinition<K>) -> ValidationReport {
    let violations = integrity_violations(&definition);
    let unreachable = if violations.is_empty() {
        FlowGraph::new(definition)
            .map(|graph| {
                graph
                    .unreachable_nodes()
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            })
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    ValidationReport {
        violations,
        unreachable,
        tiers_error: None,
    }
}
