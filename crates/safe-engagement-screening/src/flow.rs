use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use ts_rs::TS;

use crate::error::{IntegrityViolation, ScreeningError};
use crate::node::{Category, Node, NodeKey, NodeKind, Transition};
use crate::scoring;

/// Unvalidated flow as written by hand or loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct FlowDefinition<K> {
    pub entry: K,
    /// Shown once the session reaches the end.
    #[serde(default)]
    pub completion_message: String,
    pub nodes: Vec<Node<K>>,
}

impl<K: DeserializeOwned> FlowDefinition<K> {
    pub fn from_json(json: &str) -> Result<Self, ScreeningError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// A validated flow. Construction is the only place graph-shape errors are
/// raised; once built, every transition target exists and no scored node
/// can be visited twice.
#[derive(Debug, Clone)]
pub struct FlowGraph<K: NodeKey> {
    entry: K,
    nodes: Vec<Node<K>>,
    index: HashMap<K, usize>,
    completion_message: String,
    questions_ahead: Vec<usize>,
    skip_option: Vec<Option<usize>>,
    max_score: u32,
    unreachable: Vec<K>,
}

impl<K: NodeKey> FlowGraph<K> {
    /// Validate `definition` and precompute path metadata.
    ///
    /// Fails with the first [`IntegrityViolation`] found. Use
    /// [`integrity_violations`] to list all of them.
    pub fn new(definition: FlowDefinition<K>) -> Result<Self, ScreeningError> {
        if let Some(violation) = integrity_violations(&definition).into_iter().next() {
            return Err(violation.into());
        }

        let FlowDefinition {
            entry,
            completion_message,
            nodes,
        } = definition;
        let index: HashMap<K, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (node.id.clone(), i))
            .collect();
        let entry_pos = index
            .get(&entry)
            .copied()
            .ok_or_else(|| IntegrityViolation::MissingEntry {
                node: entry.to_string(),
            })?;

        let topology = Topology::build(&nodes, &index);
        let reachable = topology.reachable_from(NodeIndex::new(entry_pos));
        let unreachable: Vec<K> = nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !reachable[*i])
            .map(|(_, node)| node.id.clone())
            .collect();
        for id in &unreachable {
            warn!(node = %id, "flow node is unreachable from the entry");
        }

        let paths = topology.longest_paths(&nodes);
        let max_score = scoring::clamp(paths.score_ahead(entry_pos).unwrap_or(0));
        let questions_ahead = (0..nodes.len()).map(|i| paths.questions_ahead(i)).collect();
        let skip_option = topology.skip_options(&nodes, &index);

        let graph = Self {
            entry,
            nodes,
            index,
            completion_message,
            questions_ahead,
            skip_option,
            max_score,
            unreachable,
        };
        debug!(
            nodes = graph.len(),
            scored = graph.scored_node_count(),
            max_score = graph.max_score,
            "flow graph validated"
        );
        Ok(graph)
    }

    pub fn from_json(json: &str) -> Result<Self, ScreeningError>
    where
        K: DeserializeOwned,
    {
        Self::new(FlowDefinition::from_json(json)?)
    }

    pub fn entry(&self) -> &K {
        &self.entry
    }

    pub fn completion_message(&self) -> &str {
        &self.completion_message
    }

    pub fn get_node(&self, node_id: &K) -> Result<&Node<K>, ScreeningError> {
        self.index
            .get(node_id)
            .map(|&i| &self.nodes[i])
            .ok_or_else(|| ScreeningError::UnknownNode {
                node: node_id.to_string(),
            })
    }

    /// Where `option` leads from `node_id`.
    pub fn resolve_next(
        &self,
        node_id: &K,
        option: &str,
    ) -> Result<&Transition<K>, ScreeningError> {
        let node = self.get_node(node_id)?;
        node.next
            .get(option)
            .filter(|_| node.offers(option))
            .ok_or_else(|| ScreeningError::UnknownOption {
                node: node_id.to_string(),
                option: option.to_string(),
            })
    }

    /// Nodes in definition order.
    pub fn nodes(&self) -> &[Node<K>] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Always false: an empty flow fails validation.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn scored_node_count(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_scored()).count()
    }

    /// Highest score any path through the flow can produce.
    pub fn max_score(&self) -> u32 {
        self.max_score
    }

    /// Most scored nodes still to answer on any path from `at` to the end,
    /// counting `at` itself when it is scored.
    pub fn questions_ahead(&self, at: &Transition<K>) -> Result<usize, ScreeningError> {
        match at {
            Transition::End => Ok(0),
            Transition::To(id) => {
                let &i = self.index.get(id).ok_or_else(|| ScreeningError::UnknownNode {
                    node: id.to_string(),
                })?;
                Ok(self.questions_ahead[i])
            }
        }
    }

    /// The option a linear walk takes to get past informational node
    /// `node_id`: the first one that brings it strictly closer to a scored
    /// node or the end. Following it repeatedly never revisits a node.
    ///
    /// `None` for scored nodes and for nodes with no way out.
    pub fn skip_option(&self, node_id: &K) -> Option<&str> {
        let &i = self.index.get(node_id)?;
        let option = self.skip_option[i]?;
        self.nodes[i].options.get(option).map(String::as_str)
    }

    /// Nodes that no path from the entry visits.
    pub fn unreachable_nodes(&self) -> &[K] {
        &self.unreachable
    }
}

/// Every integrity problem in `definition`, in discovery order.
///
/// Node-local problems are always reported. Path checks (cycles through
/// scored nodes, nodes that cannot reach the end) are skipped when node ids
/// are duplicated or the entry is missing, since paths are then undefined.
pub fn integrity_violations<K: NodeKey>(definition: &FlowDefinition<K>) -> Vec<IntegrityViolation> {
    let mut violations = Vec::new();
    if definition.nodes.is_empty() {
        violations.push(IntegrityViolation::Empty);
        return violations;
    }

    let mut index = HashMap::with_capacity(definition.nodes.len());
    for (i, node) in definition.nodes.iter().enumerate() {
        if index.insert(node.id.clone(), i).is_some() {
            violations.push(IntegrityViolation::DuplicateNode {
                node: node.id.to_string(),
            });
        }
    }
    let entry = index.get(&definition.entry).copied();
    if entry.is_none() {
        violations.push(IntegrityViolation::MissingEntry {
            node: definition.entry.to_string(),
        });
    }

    for node in &definition.nodes {
        check_node(node, &index, &mut violations);
    }

    let Some(entry) = entry else {
        return violations;
    };
    if index.len() != definition.nodes.len() {
        return violations;
    }

    let topology = Topology::build(&definition.nodes, &index);
    check_cycles(&definition.nodes, &topology, &mut violations);

    let reachable = topology.reachable_from(NodeIndex::new(entry));
    let finishing = topology.reaching_end();
    for (i, node) in definition.nodes.iter().enumerate() {
        if reachable[i] && !finishing[i] {
            violations.push(IntegrityViolation::Unterminated {
                node: node.id.to_string(),
            });
        }
    }

    violations
}

fn check_node<K: NodeKey>(
    node: &Node<K>,
    index: &HashMap<K, usize>,
    violations: &mut Vec<IntegrityViolation>,
) {
    let id = node.id.to_string();
    if node.options.is_empty() {
        violations.push(IntegrityViolation::NoOptions { node: id.clone() });
    }

    let mut seen = HashSet::new();
    for option in &node.options {
        if !seen.insert(option.as_str()) {
            violations.push(IntegrityViolation::DuplicateOption {
                node: id.clone(),
                option: option.clone(),
            });
            continue;
        }
        match node.next.get(option) {
            None => violations.push(IntegrityViolation::MissingTransition {
                node: id.clone(),
                option: option.clone(),
            }),
            Some(Transition::To(target)) if !index.contains_key(target) => {
                violations.push(IntegrityViolation::DanglingTarget {
                    node: id.clone(),
                    option: option.clone(),
                    target: target.to_string(),
                });
            }
            Some(_) => {}
        }
    }

    for label in node.next.keys() {
        if !node.offers(label) {
            violations.push(IntegrityViolation::StrayTransition {
                node: id.clone(),
                option: label.clone(),
            });
        }
    }

    if let NodeKind::Scored { category, weights } = &node.kind {
        if *category == Category::Informational {
            violations.push(IntegrityViolation::MislabelledCategory { node: id.clone() });
        }
        for label in weights.keys() {
            if !node.offers(label) {
                violations.push(IntegrityViolation::StrayWeight {
                    node: id.clone(),
                    option: label.clone(),
                });
            }
        }
    }
}

/// A strongly connected component is a cycle when it has more than one
/// member or a self-loop. Informational-only cycles are allowed.
fn check_cycles<K: NodeKey>(
    nodes: &[Node<K>],
    topology: &Topology,
    violations: &mut Vec<IntegrityViolation>,
) {
    for scc in tarjan_scc(&topology.graph) {
        let cyclic =
            scc.len() > 1 || scc.first().is_some_and(|&n| topology.graph.contains_edge(n, n));
        if !cyclic {
            continue;
        }
        let first_scored = scc
            .iter()
            .map(|n| n.index())
            .filter(|&i| nodes.get(i).is_some_and(Node::is_scored))
            .min();
        if let Some(i) = first_scored {
            violations.push(IntegrityViolation::Cycle {
                node: nodes[i].id.to_string(),
            });
        }
    }
}

/// Option edges between node positions, plus one extra vertex for the end
/// of the flow. Edge weights are option weights (0 when unweighted).
struct Topology {
    graph: DiGraph<(), i64>,
    end: NodeIndex,
}

impl Topology {
    fn build<K: NodeKey>(nodes: &[Node<K>], index: &HashMap<K, usize>) -> Self {
        let mut graph = DiGraph::with_capacity(nodes.len() + 1, 0);
        for _ in nodes {
            graph.add_node(());
        }
        let end = graph.add_node(());

        for (i, node) in nodes.iter().enumerate() {
            for option in &node.options {
                let target = match node.next.get(option) {
                    Some(Transition::To(id)) => match index.get(id) {
                        Some(&j) => NodeIndex::new(j),
                        None => continue,
                    },
                    Some(Transition::End) => end,
                    None => continue,
                };
                let weight = node.weight_for(option).map_or(0, i64::from);
                graph.add_edge(NodeIndex::new(i), target, weight);
            }
        }

        Self { graph, end }
    }

    fn reachable_from(&self, start: NodeIndex) -> Vec<bool> {
        let mut seen = vec![false; self.graph.node_count()];
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(nx) = dfs.next(&self.graph) {
            seen[nx.index()] = true;
        }
        seen
    }

    fn reaching_end(&self) -> Vec<bool> {
        let reversed = Reversed(&self.graph);
        let mut seen = vec![false; self.graph.node_count()];
        let mut dfs = Dfs::new(reversed, self.end);
        while let Some(nx) = dfs.next(reversed) {
            seen[nx.index()] = true;
        }
        seen
    }

    /// Fewest informational steps from each node to a scored node or the
    /// end, found breadth-first over incoming edges. Scored nodes and the
    /// end are at distance 0 and only informational nodes are expanded.
    fn exit_distances<K: NodeKey>(&self, nodes: &[Node<K>]) -> Vec<Option<usize>> {
        let mut distance = vec![None; self.graph.node_count()];
        let mut queue = VecDeque::new();
        for nx in self.graph.node_indices() {
            if nx == self.end || nodes[nx.index()].is_scored() {
                distance[nx.index()] = Some(0);
                queue.push_back(nx);
            }
        }
        while let Some(nx) = queue.pop_front() {
            let next = distance[nx.index()].map_or(0, |d| d + 1);
            for pred in self.graph.neighbors_directed(nx, Direction::Incoming) {
                if distance[pred.index()].is_none() && !nodes[pred.index()].is_scored() {
                    distance[pred.index()] = Some(next);
                    queue.push_back(pred);
                }
            }
        }
        distance
    }

    /// Per node, the index of the first option whose target is strictly
    /// closer to a scored node or the end.
    fn skip_options<K: NodeKey>(
        &self,
        nodes: &[Node<K>],
        index: &HashMap<K, usize>,
    ) -> Vec<Option<usize>> {
        let distance = self.exit_distances(nodes);
        nodes
            .iter()
            .enumerate()
            .map(|(i, node)| {
                if node.is_scored() {
                    return None;
                }
                let here = distance[i]?;
                node.options.iter().position(|option| {
                    let target = match node.next.get(option) {
                        Some(Transition::To(id)) => index.get(id).map(|&j| distance[j]),
                        Some(Transition::End) => Some(Some(0)),
                        None => None,
                    };
                    matches!(target, Some(Some(d)) if d < here)
                })
            })
            .collect()
    }

    /// Longest weighted path and most scored nodes from every node to the
    /// end. Only valid on graphs whose cycles are informational, where every
    /// in-cycle edge weighs 0 and the component can be collapsed.
    fn longest_paths<K: NodeKey>(&self, nodes: &[Node<K>]) -> LongestPaths {
        // tarjan_scc yields components in reverse topological order, so
        // every successor component is finished before its predecessors.
        let sccs = tarjan_scc(&self.graph);
        let mut component = vec![0; self.graph.node_count()];
        for (c, scc) in sccs.iter().enumerate() {
            for nx in scc {
                component[nx.index()] = c;
            }
        }

        let mut score = vec![None; sccs.len()];
        let mut questions = vec![0; sccs.len()];
        for (c, scc) in sccs.iter().enumerate() {
            if scc.contains(&self.end) {
                score[c] = Some(0);
                continue;
            }
            let scored = scc.len() == 1 && nodes[scc[0].index()].is_scored();

            let mut best: Option<i64> = None;
            let mut most = 0;
            for &nx in scc {
                for edge in self.graph.edges(nx) {
                    let target = component[edge.target().index()];
                    if target == c {
                        continue;
                    }
                    if let Some(ahead) = score[target] {
                        let candidate = ahead + edge.weight();
                        best = Some(best.map_or(candidate, |b| b.max(candidate)));
                        most = most.max(questions[target]);
                    }
                }
            }
            score[c] = best;
            questions[c] = most + usize::from(scored);
        }

        LongestPaths {
            component,
            score,
            questions,
        }
    }
}

struct LongestPaths {
    component: Vec<usize>,
    score: Vec<Option<i64>>,
    questions: Vec<usize>,
}

impl LongestPaths {
    fn score_ahead(&self, node: usize) -> Option<i64> {
        self.score[self.component[node]]
    }

    fn questions_ahead(&self, node: usize) -> usize {
        self.questions[self.component[node]]
    }
}
