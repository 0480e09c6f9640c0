use safe_engagement_screening::Screening;
use safe_engagement_screening::node::{Node, NodeKey};
use safe_engagement_screening::session::{Outcome, Session};

use super::{Prompter, picked, report};

pub const PREVIOUS: &str = "← Previous";
pub const START: &str = "Start Risk Assessment";
pub const RETAKE: &str = "Take Assessment Again";
pub const FINISH: &str = "Finish";

/// Linear questionnaire: a start screen, then numbered questions with side
/// dialogue skipped and a "Previous" entry that steps back one question.
/// After each result the user may retake the assessment.
///
/// Returns the outcome of every completed attempt, in order.
pub fn run<K: NodeKey, P: Prompter>(
    screening: &Screening<K>,
    prompter: &mut P,
) -> eyre::Result<Vec<Outcome>> {
    prompter.say(&report::start_screen(screening.graph().scored_node_count()))?;
    let begin = [START.to_string()];
    picked(&begin, prompter.choose("Ready?", &begin)?)?;

    let mut session = screening.session();
    let mut outcomes = Vec::new();
    loop {
        if let Some(outcome) = ask_all(&mut session, prompter)? {
            prompter.say(&report::format_outcome(&outcome))?;
            outcomes.push(outcome);
        }

        let actions = [RETAKE.to_string(), FINISH.to_string()];
        let choice = prompter.choose("What would you like to do next?", &actions)?;
        if picked(&actions, choice)? != RETAKE {
            return Ok(outcomes);
        }
        session.reset();
    }
}

fn ask_all<K: NodeKey, P: Prompter>(
    session: &mut Session<'_, K>,
    prompter: &mut P,
) -> eyre::Result<Option<Outcome>> {
    loop {
        session.advance_informational()?;
        let Some(node) = session.current_node() else {
            return Ok(session.outcome());
        };

        let progress = session.progress();
        let header = format!(
            "{}\n\n{}",
            report::question_header(&progress),
            node.prompt
        );
        let mut options = node.options.clone();
        if progress.answered > 0 {
            options.push(PREVIOUS.to_string());
        }

        let choice = prompter.choose(&header, &options)?;
        if choice == node.options.len() && progress.answered > 0 {
            back_to_previous_question(session);
            continue;
        }
        session.select_option(picked(&node.options, choice)?)?;
    }
}

/// Undo selections until a scored question is current again, so the
/// informational nodes skipped on the way are not re-asked.
fn back_to_previous_question<K: NodeKey>(session: &mut Session<'_, K>) {
    while session.go_back() {
        if session.current_node().is_some_and(Node::is_scored) {
            break;
        }
    }
}
