//! safe-engagement-screening
//!
//! Guided self-assessment engine. Pure logic with no I/O or persistence.
//! A validated flow graph of prompts, a session that walks it one
//! selection at a time, weight scoring, and the tiers a score maps onto.
//!
//! The result is an educational risk tier, never a diagnosis.

pub mod error;
pub mod flow;
pub mod flows;
pub mod node;
pub mod scoring;
pub mod session;
pub mod tiers;

use flow::FlowGraph;
use node::NodeKey;
use session::Session;
use tiers::{Tier, TierTable};

/// A validated flow paired with the tiers its scores map onto.
///
/// Immutable once built; any number of sessions may borrow it.
#[derive(Debug, Clone)]
pub struct Screening<K: NodeKey> {
    graph: FlowGraph<K>,
    tiers: TierTable,
}

impl<K: NodeKey> Screening<K> {
    pub fn new(graph: FlowGraph<K>, tiers: TierTable) -> Self {
        Self { graph, tiers }
    }

    pub fn graph(&self) -> &FlowGraph<K> {
        &self.graph
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn classify(&self, score: u32) -> &Tier {
        self.tiers.classify(score)
    }

    /// Begin a fresh session at the entry node.
    pub fn session(&self) -> Session<'_, K> {
        Session::new(self)
    }
}
