use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Anything usable as a node identifier.
///
/// The built-in flow uses the closed [`Step`](crate::flows::hiv::Step) enum;
/// flows loaded from files use `String`.
pub trait NodeKey: Clone + Eq + Ord + Hash + Debug + Display {}

impl<T> NodeKey for T where T: Clone + Eq + Ord + Hash + Debug + Display {}

/// Where an option leads: another node, or the end of the flow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
pub enum Transition<K> {
    To(K),
    End,
}

impl<K> Transition<K> {
    pub fn node(&self) -> Option<&K> {
        match self {
            Transition::To(id) => Some(id),
            Transition::End => None,
        }
    }

    pub fn is_end(&self) -> bool {
        matches!(self, Transition::End)
    }
}

impl<K> From<K> for Transition<K> {
    fn from(id: K) -> Self {
        Transition::To(id)
    }
}

impl<K: Display> Display for Transition<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::To(id) => write!(f, "{id}"),
            Transition::End => f.write_str("end"),
        }
    }
}

/// Advisory topic tag. Never used in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Category {
    Informational,
    Behavioral,
    Medical,
}

/// Whether a node contributes to the score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export)]
pub enum NodeKind {
    /// Side dialogue (privacy notes, affirmations). Never weighted.
    Informational,
    /// A screening question. Options missing from `weights` count as 0.
    Scored {
        category: Category,
        #[serde(default)]
        weights: BTreeMap<String, i32>,
    },
}

/// A single prompt with its options, transitions, and optional weights.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct Node<K> {
    pub id: K,
    pub prompt: String,
    pub options: Vec<String>,
    pub next: BTreeMap<String, Transition<K>>,
    #[serde(flatten)]
    pub kind: NodeKind,
}

impl<K> Node<K> {
    /// Start an informational node. Add options with [`Node::option`].
    pub fn informational(id: K, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options: Vec::new(),
            next: BTreeMap::new(),
            kind: NodeKind::Informational,
        }
    }

    /// Start a scored node. Add options with [`Node::option`] or
    /// [`Node::weighted`].
    pub fn scored(id: K, category: Category, prompt: impl Into<String>) -> Self {
        Self {
            id,
            prompt: prompt.into(),
            options: Vec::new(),
            next: BTreeMap::new(),
            kind: NodeKind::Scored {
                category,
                weights: BTreeMap::new(),
            },
        }
    }

    /// Append an unweighted option.
    pub fn option(mut self, label: impl Into<String>, to: impl Into<Transition<K>>) -> Self {
        let label = label.into();
        self.next.insert(label.clone(), to.into());
        self.options.push(label);
        self
    }

    /// Append an option carrying an explicit weight. Only meaningful on
    /// scored nodes; on an informational node the weight is discarded.
    pub fn weighted(
        mut self,
        label: impl Into<String>,
        to: impl Into<Transition<K>>,
        weight: i32,
    ) -> Self {
        let label = label.into();
        debug_assert!(self.is_scored(), "weighted option on informational node");
        if let NodeKind::Scored { weights, .. } = &mut self.kind {
            weights.insert(label.clone(), weight);
        }
        self.option(label, to)
    }

    pub fn is_scored(&self) -> bool {
        matches!(self.kind, NodeKind::Scored { .. })
    }

    pub fn category(&self) -> Category {
        match &self.kind {
            NodeKind::Informational => Category::Informational,
            NodeKind::Scored { category, .. } => *category,
        }
    }

    pub fn offers(&self, option: &str) -> bool {
        self.options.iter().any(|o| o == option)
    }

    /// The explicit weight for `option`, if this node declares one.
    pub fn weight_for(&self, option: &str) -> Option<i32> {
        match &self.kind {
            NodeKind::Informational => None,
            NodeKind::Scored { weights, .. } => weights.get(option).copied(),
        }
    }

    pub fn weights(&self) -> Option<&BTreeMap<String, i32>> {
        match &self.kind {
            NodeKind::Informational => None,
            NodeKind::Scored { weights, .. } => Some(weights),
        }
    }
}
