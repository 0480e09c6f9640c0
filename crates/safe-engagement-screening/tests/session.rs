use pretty_assertions::assert_eq;
use safe_engagement_screening::Screening;
use safe_engagement_screening::error::ScreeningError;
use safe_engagement_screening::flow::{FlowDefinition, FlowGraph};
use safe_engagement_screening::node::{Category, Node, Transition};
use safe_engagement_screening::session::Progress;
use safe_engagement_screening::tiers::TierTable;

fn id(s: &str) -> String {
    s.to_string()
}

fn screening() -> Screening<String> {
    let flow = FlowDefinition {
        entry: id("start"),
        completion_message: id("All done."),
        nodes: vec![
            Node::informational(id("start"), "Welcome")
                .option("Begin", id("q1"))
                .option("Privacy?", id("privacy")),
            Node::informational(id("privacy"), "Nothing is stored.")
                .option("Back", id("start"))
                .option("Begin", id("q1")),
            Node::scored(id("q1"), Category::Behavioral, "Q1?")
                .weighted("Yes", id("q2"), 2)
                .option("No", id("q2"))
                .weighted("Prefer not to say", id("q2"), 1),
            Node::scored(id("q2"), Category::Medical, "Q2?")
                .weighted("Yes", Transition::End, 3)
                .weighted("Protected", Transition::End, -1)
                .weighted("Explicit zero", Transition::End, 0)
                .option("No", Transition::End),
        ],
    };
    Screening::new(FlowGraph::new(flow).unwrap(), TierTable::default())
}

fn play(session: &mut safe_engagement_screening::session::Session<'_, String>, options: &[&str]) {
    for option in options {
        session
            .select_option(option)
            .unwrap_or_else(|e| panic!("selecting {option:?} failed: {e}"));
    }
}

#[test]
fn new_session_sits_at_the_entry() {
    let screening = screening();
    let session = screening.session();

    assert_eq!(session.current(), &Transition::To(id("start")));
    assert_eq!(session.current_prompt(), Some("Welcome"));
    assert_eq!(session.current_options(), &[id("Begin"), id("Privacy?")]);
    assert!(!session.is_terminal());
    assert!(session.history().is_empty());
    assert_eq!(session.score(), 0);
}

#[test]
fn selections_record_history_and_explicit_weights_only() {
    let screening = screening();
    let mut session = screening.session();

    play(&mut session, &["Privacy?", "Begin", "No"]);

    assert_eq!(session.current(), &Transition::To(id("q2")));
    let visited: Vec<(&str, &str)> = session
        .history()
        .iter()
        .map(|a| (a.node.as_str(), a.option.as_str()))
        .collect();
    assert_eq!(
        visited,
        vec![("start", "Privacy?"), ("privacy", "Begin"), ("q1", "No")]
    );
    assert!(
        session.weighted_answers().is_empty(),
        "an option without a weight entry must not be recorded"
    );

    play(&mut session, &["Explicit zero"]);
    assert_eq!(session.weighted_answers().get("q2"), Some(&0));
}

#[test]
fn invalid_selection_leaves_state_untouched() {
    let screening = screening();
    let mut session = screening.session();
    play(&mut session, &["Begin", "Yes"]);

    let current = session.current().clone();
    let history = session.history().to_vec();
    let weights = session.weighted_answers().clone();

    let err = session.select_option("Begin").unwrap_err();
    assert!(
        matches!(
            &err,
            ScreeningError::InvalidSelection { node, option } if node == "q2" && option == "Begin"
        ),
        "unexpected error: {err}"
    );
    assert_eq!(session.current(), &current);
    assert_eq!(session.history(), history.as_slice());
    assert_eq!(session.weighted_answers(), &weights);
}

#[test]
fn score_is_the_clamped_sum_of_chosen_weights() {
    let screening = screening();

    let mut session = screening.session();
    play(&mut session, &["Begin", "Yes", "Yes"]);
    assert_eq!(session.score(), 5);
    assert_eq!(session.tier().label, "Moderate");

    let mut session = screening.session();
    play(&mut session, &["Begin", "No", "Protected"]);
    assert_eq!(session.score(), 0, "protective answers never push below zero");
    assert_eq!(session.tier().label, "Low");

    let mut session = screening.session();
    play(&mut session, &["Begin", "Yes", "Protected"]);
    assert_eq!(session.score(), 1);
    assert_eq!(session.tier().label, "Low-Moderate");
}

#[test]
fn terminal_session_offers_nothing() {
    let screening = screening();
    let mut session = screening.session();
    play(&mut session, &["Begin", "Yes", "No"]);

    assert!(session.is_terminal());
    assert_eq!(session.current_prompt(), None);
    assert!(session.current_options().is_empty());
    assert!(session.current_node().is_none());

    let err = session.select_option("Yes").unwrap_err();
    assert!(matches!(err, ScreeningError::InvalidSelection { .. }));
    assert_eq!(session.history().len(), 3);
}

#[test]
fn outcome_appears_only_at_the_end() {
    let screening = screening();
    let mut session = screening.session();
    play(&mut session, &["Begin", "Yes"]);
    assert!(session.outcome().is_none());

    play(&mut session, &["Yes"]);
    let outcome = session.outcome().expect("terminal session has an outcome");
    assert_eq!(outcome.score, 5);
    assert_eq!(outcome.max_score, 5);
    assert_eq!(outcome.tier.label, "Moderate");
}

#[test]
fn reset_and_replay_is_deterministic() {
    let screening = screening();
    let mut session = screening.session();
    let answers = ["Privacy?", "Back", "Begin", "Prefer not to say", "Yes"];

    play(&mut session, &answers);
    let first_score = session.score();
    let first_history = session.history().to_vec();

    session.reset();
    assert_eq!(session.current(), &Transition::To(id("start")));
    assert!(session.history().is_empty());
    assert!(session.weighted_answers().is_empty());

    play(&mut session, &answers);
    assert_eq!(session.score(), first_score);
    assert_eq!(session.history(), first_history.as_slice());
}

#[test]
fn start_is_idempotent() {
    let screening = screening();
    let mut session = screening.session();
    play(&mut session, &["Begin", "Yes"]);

    session.start();
    session.start();
    assert_eq!(session.current(), &Transition::To(id("start")));
    assert_eq!(session.score(), 0);
}

#[test]
fn go_back_undoes_one_selection() {
    let screening = screening();
    let mut session = screening.session();
    assert!(!session.go_back(), "nothing to undo at the start");

    play(&mut session, &["Begin", "Yes"]);
    assert_eq!(session.score(), 2);

    assert!(session.go_back());
    assert_eq!(session.current(), &Transition::To(id("q1")));
    assert_eq!(session.score(), 0);
    assert!(session.weighted_answers().is_empty());

    play(&mut session, &["Prefer not to say", "Yes"]);
    assert_eq!(session.score(), 4);
}

#[test]
fn advance_informational_stops_at_the_first_question() {
    let screening = screening();
    let mut session = screening.session();

    assert_eq!(session.advance_informational().unwrap(), 1);
    assert_eq!(session.current(), &Transition::To(id("q1")));
    assert_eq!(session.advance_informational().unwrap(), 0);
}

#[test]
fn progress_counts_scored_questions() {
    let screening = screening();
    let mut session = screening.session();
    assert_eq!(
        session.progress(),
        Progress {
            answered: 0,
            remaining_at_most: 2,
            percent: 0,
        }
    );

    play(&mut session, &["Begin", "Yes"]);
    assert_eq!(
        session.progress(),
        Progress {
            answered: 1,
            remaining_at_most: 1,
            percent: 50,
        }
    );

    play(&mut session, &["No"]);
    assert_eq!(session.progress().percent, 100);
}

#[test]
fn sessions_over_one_screening_are_independent() {
    let screening = screening();
    let mut first = screening.session();
    let mut second = screening.session();

    play(&mut first, &["Begin", "Yes", "Yes"]);
    play(&mut second, &["Begin", "No"]);

    assert_eq!(first.score(), 5);
    assert!(first.is_terminal());
    assert_eq!(second.score(), 0);
    assert_eq!(second.current(), &Transition::To(id("q2")));
}

fn looping_side_dialogue() -> Screening<String> {
    let flow = FlowDefinition {
        entry: id("a"),
        completion_message: String::new(),
        nodes: vec![
            Node::informational(id("a"), "Info A")
                .option("More", id("b"))
                .option("Go", id("q1")),
            Node::informational(id("b"), "Info B")
                .option("Back", id("a"))
                .option("Go", id("q1")),
            Node::scored(id("q1"), Category::Behavioral, "Q1?")
                .weighted("Yes", Transition::End, 1)
                .option("No", Transition::End),
        ],
    };
    Screening::new(FlowGraph::new(flow).unwrap(), TierTable::default())
}

#[test]
fn advance_informational_leaves_a_side_dialogue_loop() {
    let screening = looping_side_dialogue();
    let graph = screening.graph();
    assert_eq!(graph.skip_option(&id("a")), Some("Go"));
    assert_eq!(graph.skip_option(&id("b")), Some("Go"));
    assert_eq!(graph.skip_option(&id("q1")), None);

    let mut session = screening.session();
    assert_eq!(session.advance_informational().unwrap(), 1);
    assert_eq!(session.current_prompt(), Some("Q1?"));
    assert_eq!(session.history().len(), 1);
    assert_eq!(session.history()[0].option, "Go");

    // Entering the loop by hand and skipping from its far side also exits.
    let mut session = screening.session();
    play(&mut session, &["More"]);
    assert_eq!(session.advance_informational().unwrap(), 1);
    assert_eq!(session.current(), &Transition::To(id("q1")));
    assert_eq!(session.progress().answered, 0);
}
