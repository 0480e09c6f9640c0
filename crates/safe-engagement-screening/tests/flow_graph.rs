use std::collections::BTreeMap;

use pretty_assertions::assert_eq;
use safe_engagement_screening::error::{IntegrityViolation, ScreeningError};
use safe_engagement_screening::flow::{FlowDefinition, FlowGraph, integrity_violations};
use safe_engagement_screening::flows::hiv::Step;
use safe_engagement_screening::node::{Category, Node, NodeKind, Transition};

fn id(s: &str) -> String {
    s.to_string()
}

fn definition(nodes: Vec<Node<String>>) -> FlowDefinition<String> {
    FlowDefinition {
        entry: id("start"),
        completion_message: String::new(),
        nodes,
    }
}

/// start ⇄ privacy is an informational loop; q1 → q2 → end is scored.
fn small_flow() -> FlowDefinition<String> {
    definition(vec![
        Node::informational(id("start"), "Welcome")
            .option("Begin", id("q1"))
            .option("Privacy?", id("privacy")),
        Node::informational(id("privacy"), "Nothing is stored.")
            .option("Back", id("start"))
            .option("Begin", id("q1")),
        Node::scored(id("q1"), Category::Behavioral, "Q1?")
            .weighted("Yes", id("q2"), 2)
            .option("No", id("q2")),
        Node::scored(id("q2"), Category::Medical, "Q2?")
            .weighted("Yes", Transition::End, 3)
            .weighted("Protected", Transition::End, -1)
            .option("No", Transition::End),
    ])
}

#[test]
fn valid_flow_resolves_transitions() {
    let graph = FlowGraph::new(small_flow()).expect("small flow should validate");

    assert_eq!(graph.entry(), "start");
    assert_eq!(graph.len(), 4);
    assert_eq!(graph.scored_node_count(), 2);
    assert_eq!(
        graph.resolve_next(&id("q1"), "Yes").unwrap(),
        &Transition::To(id("q2"))
    );
    assert_eq!(
        graph.resolve_next(&id("q2"), "No").unwrap(),
        &Transition::End
    );
    assert_eq!(graph.get_node(&id("q2")).unwrap().prompt, "Q2?");
}

#[test]
fn unknown_node_and_option_are_reported() {
    let graph = FlowGraph::new(small_flow()).unwrap();

    let err = graph.get_node(&id("nowhere")).unwrap_err();
    assert!(
        matches!(&err, ScreeningError::UnknownNode { node } if node == "nowhere"),
        "unexpected error: {err}"
    );

    let err = graph.resolve_next(&id("q1"), "Maybe").unwrap_err();
    assert!(
        matches!(
            &err,
            ScreeningError::UnknownOption { node, option } if node == "q1" && option == "Maybe"
        ),
        "unexpected error: {err}"
    );

    let err = graph.resolve_next(&id("nowhere"), "Yes").unwrap_err();
    assert!(matches!(err, ScreeningError::UnknownNode { .. }));
}

#[test]
fn informational_loops_are_allowed() {
    let violations = integrity_violations(&small_flow());
    assert!(violations.is_empty(), "unexpected violations: {violations:?}");
}

#[test]
fn option_without_transition_is_rejected() {
    let mut q1 = Node::scored(id("q1"), Category::Behavioral, "Q1?").option("Yes", Transition::End);
    q1.options.push(id("Maybe"));
    let flow = definition(vec![
        Node::informational(id("start"), "Welcome").option("Begin", id("q1")),
        q1,
    ]);

    let err = FlowGraph::new(flow).unwrap_err();
    assert!(
        matches!(
            &err,
            ScreeningError::GraphIntegrity(IntegrityViolation::MissingTransition { node, option })
                if node == "q1" && option == "Maybe"
        ),
        "unexpected error: {err}"
    );
}

#[test]
fn missing_transition_target_is_rejected() {
    let flow = definition(vec![
        Node::informational(id("start"), "Welcome")
            .option("Begin", id("q1"))
            .option("Lost", id("nowhere")),
        Node::scored(id("q1"), Category::Behavioral, "Q1?").option("Yes", Transition::End),
    ]);

    assert_eq!(
        integrity_violations(&flow),
        vec![IntegrityViolation::DanglingTarget {
            node: id("start"),
            option: id("Lost"),
            target: id("nowhere"),
        }]
    );
    assert!(FlowGraph::new(flow).is_err());
}

#[test]
fn cycle_through_scored_nodes_is_rejected() {
    let flow = definition(vec![
        Node::informational(id("start"), "Welcome").option("Begin", id("q1")),
        Node::scored(id("q1"), Category::Behavioral, "Q1?")
            .weighted("Yes", id("q2"), 1)
            .option("No", id("q2")),
        Node::scored(id("q2"), Category::Behavioral, "Q2?")
            .option("Again", id("q1"))
            .option("Done", Transition::End),
    ]);

    assert_eq!(
        integrity_violations(&flow),
        vec![IntegrityViolation::Cycle { node: id("q1") }]
    );
}

#[test]
fn scored_self_loop_is_a_cycle() {
    let flow = definition(vec![
        Node::informational(id("start"), "Welcome").option("Begin", id("q1")),
        Node::scored(id("q1"), Category::Medical, "Q1?")
            .option("Repeat", id("q1"))
            .option("Done", Transition::End),
    ]);

    assert_eq!(
        integrity_violations(&flow),
        vec![IntegrityViolation::Cycle { node: id("q1") }]
    );
}

#[test]
fn loop_without_exit_is_unterminated() {
    let flow = definition(vec![
        Node::informational(id("start"), "A").option("Next", id("other")),
        Node::informational(id("other"), "B").option("Back", id("start")),
    ]);

    assert_eq!(
        integrity_violations(&flow),
        vec![
            IntegrityViolation::Unterminated { node: id("start") },
            IntegrityViolation::Unterminated { node: id("other") },
        ]
    );
}

#[test]
fn node_local_defects_are_all_listed() {
    let mut stray_weight =
        Node::scored(id("q2"), Category::Medical, "Q2?").option("No", Transition::End);
    if let NodeKind::Scored { weights, .. } = &mut stray_weight.kind {
        weights.insert(id("Yes"), 4);
    }
    let mut stray_transition =
        Node::scored(id("q3"), Category::Medical, "Q3?").option("No", Transition::End);
    stray_transition.next.insert(id("Ghost"), Transition::End);
    let mislabelled =
        Node::scored(id("q4"), Category::Informational, "Q4?").option("Ok", Transition::End);
    let duplicate_option = Node::scored(id("q1"), Category::Behavioral, "Q1?")
        .option("Yes", id("q2"))
        .option("Yes", id("q2"))
        .option("No", id("q3"));
    let no_options = Node::informational(id("q5"), "Dead end");

    let flow = definition(vec![
        Node::informational(id("start"), "Welcome")
            .option("Begin", id("q1"))
            .option("Other", id("q4")),
        duplicate_option,
        stray_weight,
        stray_transition,
        mislabelled,
        no_options,
    ]);

    let violations = integrity_violations(&flow);
    assert_eq!(
        violations,
        vec![
            IntegrityViolation::DuplicateOption {
                node: id("q1"),
                option: id("Yes"),
            },
            IntegrityViolation::StrayWeight {
                node: id("q2"),
                option: id("Yes"),
            },
            IntegrityViolation::StrayTransition {
                node: id("q3"),
                option: id("Ghost"),
            },
            IntegrityViolation::MislabelledCategory { node: id("q4") },
            IntegrityViolation::NoOptions { node: id("q5") },
        ]
    );
}

#[test]
fn duplicate_ids_and_missing_entry_are_rejected() {
    let duplicated = definition(vec![
        Node::informational(id("start"), "A").option("Go", Transition::End),
        Node::informational(id("start"), "B").option("Go", Transition::End),
    ]);
    assert_eq!(
        integrity_violations(&duplicated),
        vec![IntegrityViolation::DuplicateNode { node: id("start") }]
    );

    let headless = FlowDefinition {
        entry: id("missing"),
        completion_message: String::new(),
        nodes: vec![Node::informational(id("start"), "A").option("Go", Transition::End)],
    };
    assert_eq!(
        integrity_violations(&headless),
        vec![IntegrityViolation::MissingEntry { node: id("missing") }]
    );

    assert_eq!(
        integrity_violations(&definition(vec![])),
        vec![IntegrityViolation::Empty]
    );
}

#[test]
fn unreachable_nodes_are_tolerated_and_listed() {
    let mut flow = small_flow();
    flow.nodes.push(
        Node::scored(id("orphan"), Category::Medical, "Never asked").weighted(
            "Yes",
            Transition::End,
            10,
        ),
    );

    let graph = FlowGraph::new(flow).expect("unreachable nodes are not an integrity error");
    assert_eq!(graph.unreachable_nodes(), &[id("orphan")]);
    assert_eq!(graph.max_score(), 5, "unreachable weights must not count");
}

#[test]
fn path_metadata_is_precomputed() {
    let graph = FlowGraph::new(small_flow()).unwrap();

    assert_eq!(graph.max_score(), 5);
    assert_eq!(graph.questions_ahead(&Transition::To(id("start"))).unwrap(), 2);
    assert_eq!(graph.questions_ahead(&Transition::To(id("privacy"))).unwrap(), 2);
    assert_eq!(graph.questions_ahead(&Transition::To(id("q2"))).unwrap(), 1);
    assert_eq!(graph.questions_ahead(&Transition::End).unwrap(), 0);
}

#[test]
fn max_score_never_goes_negative() {
    let flow = definition(vec![
        Node::scored(id("start"), Category::Medical, "On PrEP?")
            .weighted("Yes", Transition::End, -1)
            .weighted("Also yes", Transition::End, -2),
    ]);

    assert_eq!(FlowGraph::new(flow).unwrap().max_score(), 0);
}

#[test]
fn flow_loads_from_json() {
    let json = r#"{
        "entry": "q1",
        "completion_message": "Done",
        "nodes": [
            {
                "id": "q1",
                "prompt": "Q1?",
                "options": ["Yes", "No"],
                "next": { "Yes": { "to": "info" }, "No": "end" },
                "kind": "scored",
                "category": "behavioral",
                "weights": { "Yes": 2 }
            },
            {
                "id": "info",
                "prompt": "Some facts.",
                "options": ["OK"],
                "next": { "OK": "end" },
                "kind": "informational"
            }
        ]
    }"#;

    let graph = FlowGraph::<String>::from_json(json).expect("json flow should load");
    assert_eq!(graph.completion_message(), "Done");
    assert_eq!(graph.max_score(), 2);

    let q1 = graph.get_node(&id("q1")).unwrap();
    assert_eq!(q1.category(), Category::Behavioral);
    assert_eq!(q1.weight_for("Yes"), Some(2));
    assert_eq!(q1.weight_for("No"), None);
    assert_eq!(
        q1.weights(),
        Some(&BTreeMap::from([(id("Yes"), 2)]))
    );
    assert_eq!(graph.get_node(&id("info")).unwrap().category(), Category::Informational);
}

#[test]
fn json_with_dangling_target_fails_validation() {
    let json = r#"{
        "entry": "q1",
        "nodes": [
            {
                "id": "q1",
                "prompt": "Q1?",
                "options": ["Yes"],
                "next": { "Yes": { "to": "q9" } },
                "kind": "informational"
            }
        ]
    }"#;

    let err = FlowGraph::<String>::from_json(json).unwrap_err();
    assert!(
        matches!(err, ScreeningError::GraphIntegrity(IntegrityViolation::DanglingTarget { .. })),
        "unexpected error: {err}"
    );
}

#[test]
fn closed_step_ids_reject_unknown_names() {
    let json = r#"{
        "entry": "not_a_step",
        "nodes": []
    }"#;

    let err = FlowDefinition::<Step>::from_json(json).unwrap_err();
    assert!(matches!(err, ScreeningError::Definition(_)), "unexpected error: {err}");
}
