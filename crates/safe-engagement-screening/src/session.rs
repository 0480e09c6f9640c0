use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::Screening;
use crate::error::ScreeningError;
use crate::node::{Node, NodeKey, Transition};
use crate::scoring::{self, WeightedAnswers};
use crate::tiers::Tier;

/// One recorded selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer<K> {
    pub node: K,
    pub option: String,
    /// The explicit weight the option carried, if any.
    pub weight: Option<i32>,
}

/// How far along the session is, for progress bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Progress {
    /// Scored questions answered so far.
    pub answered: usize,
    /// Most scored questions any remaining path can still ask.
    pub remaining_at_most: usize,
    /// 0–100; 100 once the session is complete.
    pub percent: u8,
}

/// What the results screen shows once the session is complete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Outcome {
    pub score: u32,
    pub max_score: u32,
    pub tier: Tier,
}

/// One user's walk through a [`Screening`].
///
/// Sessions live only in memory: they are neither serializable nor
/// cloneable, and their answers are never logged.
#[derive(Debug)]
pub struct Session<'a, K: NodeKey> {
    screening: &'a Screening<K>,
    current: Transition<K>,
    history: Vec<Answer<K>>,
    weights: WeightedAnswers<K>,
}

impl<'a, K: NodeKey> Session<'a, K> {
    /// A session positioned at the entry node.
    pub fn new(screening: &'a Screening<K>) -> Self {
        let mut session = Self {
            screening,
            current: Transition::To(screening.graph().entry().clone()),
            history: Vec::new(),
            weights: WeightedAnswers::new(),
        };
        session.start();
        session
    }

    /// Return to the entry node and forget every answer. Idempotent.
    pub fn start(&mut self) {
        self.current = Transition::To(self.screening.graph().entry().clone());
        self.history.clear();
        self.weights.clear();
        debug!("screening session started");
    }

    /// Same as [`Session::start`].
    pub fn reset(&mut self) {
        self.start();
    }

    pub fn current(&self) -> &Transition<K> {
        &self.current
    }

    /// The node being asked, or `None` once the session is complete.
    pub fn current_node(&self) -> Option<&'a Node<K>> {
        let id = self.current.node()?;
        self.screening.graph().get_node(id).ok()
    }

    pub fn current_prompt(&self) -> Option<&'a str> {
        self.current_node().map(|node| node.prompt.as_str())
    }

    /// Options on offer; empty once the session is complete.
    pub fn current_options(&self) -> &'a [String] {
        match self.current_node() {
            Some(node) => &node.options,
            None => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.current.is_end()
    }

    /// Record `option` at the current node and advance.
    ///
    /// Options that are not currently offered are rejected with
    /// [`ScreeningError::InvalidSelection`] and leave the session untouched.
    pub fn select_option(&mut self, option: &str) -> Result<(), ScreeningError> {
        let graph = self.screening.graph();
        let invalid = || ScreeningError::InvalidSelection {
            node: self.current.to_string(),
            option: option.to_string(),
        };

        let Transition::To(node_id) = &self.current else {
            return Err(invalid());
        };
        let node = graph.get_node(node_id)?;
        if !node.offers(option) {
            return Err(invalid());
        }
        let next = graph.resolve_next(node_id, option)?.clone();

        let weight = node.weight_for(option);
        if let Some(weight) = weight {
            self.weights.insert(node.id.clone(), weight);
        }
        self.history.push(Answer {
            node: node.id.clone(),
            option: option.to_string(),
            weight,
        });
        self.current = next;

        if self.is_terminal() {
            debug!(steps = self.history.len(), "screening session completed");
        }
        Ok(())
    }

    /// Undo the most recent selection. Returns `false` at the start.
    pub fn go_back(&mut self) -> bool {
        let Some(last) = self.history.pop() else {
            return false;
        };
        self.current = Transition::To(last.node);
        self.weights = self
            .history
            .iter()
            .filter_map(|a| a.weight.map(|w| (a.node.clone(), w)))
            .collect();
        true
    }

    /// Walk past informational nodes until a scored node or the end.
    ///
    /// At each informational node the first option that moves closer to a
    /// question is taken (see [`FlowGraph::skip_option`]), so informational
    /// loops are left rather than circled. Returns how many nodes were
    /// passed.
    ///
    /// [`FlowGraph::skip_option`]: crate::flow::FlowGraph::skip_option
    pub fn advance_informational(&mut self) -> Result<usize, ScreeningError> {
        let screening = self.screening;
        let mut passed = 0;
        while let Some(node) = self.current_node() {
            if node.is_scored() {
                break;
            }
            let option = screening
                .graph()
                .skip_option(&node.id)
                .ok_or_else(|| ScreeningError::NoWayForward {
                    node: node.id.to_string(),
                })?;
            self.select_option(option)?;
            passed += 1;
        }
        Ok(passed)
    }

    pub fn history(&self) -> &[Answer<K>] {
        &self.history
    }

    pub fn weighted_answers(&self) -> &WeightedAnswers<K> {
        &self.weights
    }

    /// Running score of the answers so far.
    pub fn score(&self) -> u32 {
        scoring::score(&self.weights)
    }

    /// Tier of the running score.
    pub fn tier(&self) -> &'a Tier {
        self.screening.tiers().classify(self.score())
    }

    pub fn progress(&self) -> Progress {
        let graph = self.screening.graph();
        let answered = self
            .history
            .iter()
            .filter(|a| graph.get_node(&a.node).is_ok_and(Node::is_scored))
            .count();
        let remaining_at_most = graph.questions_ahead(&self.current).unwrap_or(0);

        let percent = if self.is_terminal() {
            100
        } else if answered + remaining_at_most == 0 {
            0
        } else {
            (answered * 100 / (answered + remaining_at_most)) as u8
        };

        Progress {
            answered,
            remaining_at_most,
            percent,
        }
    }

    /// Final score and tier, once the session is complete.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.is_terminal() {
            return None;
        }
        Some(Outcome {
            score: self.score(),
            max_score: self.screening.graph().max_score(),
            tier: self.tier().clone(),
        })
    }
}
