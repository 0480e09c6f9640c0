//! Terminal renderers. Both walk the same [`Session`]; they differ only in
//! what they show and whether side dialogue is offered.
//!
//! [`Session`]: safe_engagement_screening::session::Session

pub mod chat;
pub mod form;
pub mod report;

use std::time::Duration;

use dialoguer::Select;

/// Where a renderer sends text and gets selections from.
pub trait Prompter {
    /// Show a message from the assistant.
    fn say(&mut self, text: &str) -> eyre::Result<()>;

    /// Offer `options` and return the index picked.
    fn choose(&mut self, prompt: &str, options: &[String]) -> eyre::Result<usize>;
}

/// Interactive terminal: messages on stdout, selections via arrow-key menus.
#[derive(Debug, Clone, Default)]
pub struct TerminalPrompter {
    typing_delay: Duration,
}

impl TerminalPrompter {
    pub fn new(typing_delay: Duration) -> Self {
        Self { typing_delay }
    }
}

impl Prompter for TerminalPrompter {
    fn say(&mut self, text: &str) -> eyre::Result<()> {
        if !self.typing_delay.is_zero() {
            std::thread::sleep(self.typing_delay);
        }
        println!("\n{text}\n");
        Ok(())
    }

    fn choose(&mut self, prompt: &str, options: &[String]) -> eyre::Result<usize> {
        let choice = Select::new()
            .with_prompt(prompt)
            .items(options)
            .default(0)
            .interact()?;
        Ok(choice)
    }
}

/// Look up the label for a picked index.
fn picked<'o>(options: &'o [String], choice: usize) -> eyre::Result<&'o str> {
    options
        .get(choice)
        .map(String::as_str)
        .ok_or_else(|| {
            eyre::eyre!(
                "selection {choice} is out of range ({} options)",
                options.len()
            )
        })
}
