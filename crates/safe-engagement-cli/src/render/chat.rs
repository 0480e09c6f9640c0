use safe_engagement_screening::Screening;
use safe_engagement_screening::node::NodeKey;

use super::{Prompter, picked, report};

pub const LEARN_PREVENTION: &str = "Learn about prevention";
pub const START_OVER: &str = "Start over";
pub const FINISH: &str = "Finish";

/// Conversational walk: every prompt is a message, every option a reply,
/// side dialogue included. Loops until the user picks [`FINISH`].
pub fn run<K: NodeKey, P: Prompter>(
    screening: &Screening<K>,
    prompter: &mut P,
) -> eyre::Result<()> {
    let mut session = screening.session();
    loop {
        while let Some(node) = session.current_node() {
            prompter.say(&node.prompt)?;
            let choice = prompter.choose("Your reply", &node.options)?;
            session.select_option(picked(&node.options, choice)?)?;
        }

        let completion = screening.graph().completion_message();
        if !completion.is_empty() {
            prompter.say(completion)?;
        }
        if let Some(outcome) = session.outcome() {
            prompter.say(&report::format_outcome(&outcome))?;
        }

        if !wants_another_round(prompter)? {
            return Ok(());
        }
        session.reset();
    }
}

fn wants_another_round<P: Prompter>(prompter: &mut P) -> eyre::Result<bool> {
    let mut actions = vec![
        LEARN_PREVENTION.to_string(),
        START_OVER.to_string(),
        FINISH.to_string(),
    ];
    loop {
        let choice = prompter.choose("What would you like to do next?", &actions)?;
        let action = picked(&actions, choice)?.to_string();
        match action.as_str() {
            LEARN_PREVENTION => {
                prompter.say(report::PREVENTION_TIPS)?;
                actions.retain(|a| a != LEARN_PREVENTION);
            }
            START_OVER => return Ok(true),
            _ => return Ok(false),
        }
    }
}
