use std::path::Path;

use safe_engagement_screening::Screening;
use safe_engagement_screening::flow::{FlowDefinition, FlowGraph};
use safe_engagement_screening::flows::hiv::{self, Step};
use safe_engagement_screening::tiers::TierTable;

/// The screening a run will use: the built-in flow with its closed step
/// ids, or a flow read from a file with free-form string ids.
#[derive(Debug)]
pub enum LoadedScreening {
    Builtin(Screening<Step>),
    Custom(Screening<String>),
}

pub fn read_flow(path: &Path) -> eyre::Result<FlowDefinition<String>> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read flow at {}: {e}", path.display()))?;
    FlowDefinition::from_json(&json)
        .map_err(|e| eyre::eyre!("failed to parse flow at {}: {e}", path.display()))
}

pub fn load_tiers(path: Option<&Path>) -> eyre::Result<TierTable> {
    let Some(path) = path else {
        return Ok(TierTable::default());
    };
    let json = std::fs::read_to_string(path)
        .map_err(|e| eyre::eyre!("failed to read tiers at {}: {e}", path.display()))?;
    let tiers = TierTable::from_json(&json)
        .map_err(|e| eyre::eyre!("invalid tiers at {}: {e}", path.display()))?;
    tracing::debug!(path = %path.display(), tiers = tiers.tiers().len(), "tiers loaded");
    Ok(tiers)
}

/// Load and validate the flow and tiers. Refuses to return anything built
/// from an invalid flow.
pub fn load_screening(flow: Option<&Path>, tiers: Option<&Path>) -> eyre::Result<LoadedScreening> {
    let tiers = load_tiers(tiers)?;
    match flow {
        None => {
            let graph = FlowGraph::new(hiv::definition().clone())
                .map_err(|e| eyre::eyre!("built-in flow failed validation: {e}"))?;
            Ok(LoadedScreening::Builtin(Screening::new(graph, tiers)))
        }
        Some(path) => {
            let graph = FlowGraph::new(read_flow(path)?)
                .map_err(|e| eyre::eyre!("flow at {} failed validation: {e}", path.display()))?;
            tracing::debug!(path = %path.display(), "custom flow loaded");
            Ok(LoadedScreening::Custom(Screening::new(graph, tiers)))
        }
    }
}
