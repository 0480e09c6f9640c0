use safe_engagement_screening::Screening;
use safe_engagement_screening::node::{NodeKey, Transition};
use safe_engagement_screening::session::{Outcome, Progress};
use safe_engagement_screening::tiers::Recommendation;

pub const DISCLAIMER: &str = "This assessment is for educational purposes only. Always consult \
                              with a healthcare provider for personalized advice.";

pub const PREVENTION_TIPS: &str = "Knowledge is power! Here are some key prevention strategies:\n\n\
                                   • Use condoms consistently\n\
                                   • Consider PrEP if you're at higher risk\n\
                                   • Get tested regularly\n\
                                   • Communicate with partners about status\n\
                                   • Avoid sharing needles";

pub const PRIVACY_NOTICE: &str = "Your Privacy is Protected\n\n\
                                  • All responses are completely confidential\n\
                                  • No personal information is collected or stored\n\
                                  • Results are for educational purposes only\n\
                                  • This does not replace professional medical advice";

/// What the linear form shows before the first question.
pub fn start_screen(questions: usize) -> String {
    format!(
        "Take this confidential screening to help determine if HIV testing is \
         recommended for you.\n\n{PRIVACY_NOTICE}\n\nQuestions: {questions} | Time: ~3 minutes"
    )
}

pub fn badge(recommendation: Recommendation) -> &'static str {
    match recommendation {
        Recommendation::Routine => "🟢",
        Recommendation::Consider => "🟠",
        Recommendation::Soon => "🟡",
        Recommendation::Immediate => "🔴",
    }
}

/// The results screen.
pub fn format_outcome(outcome: &Outcome) -> String {
    let tier = &outcome.tier;
    let mut out = format!(
        "{} Risk Level: {}\n\nRisk Score: {}/{}\n\n{}\n",
        badge(tier.recommendation),
        tier.label,
        outcome.score,
        outcome.max_score,
        tier.message,
    );
    if !tier.guidance.is_empty() {
        out.push('\n');
        for line in &tier.guidance {
            out.push_str(&format!("• {line}\n"));
        }
    }
    out.push('\n');
    out.push_str(DISCLAIMER);
    out
}

/// "Question 3 of 10 · 20% complete". The total is an upper bound, since
/// some answers skip later questions.
pub fn question_header(progress: &Progress) -> String {
    format!(
        "Question {} of {} · {}% complete",
        progress.answered + 1,
        progress.answered + progress.remaining_at_most,
        progress.percent,
    )
}

/// Summary of a screening for the `describe` command.
pub fn describe<K: NodeKey>(screening: &Screening<K>) -> String {
    let graph = screening.graph();
    let mut out = format!(
        "entry: {}\nnodes: {} ({} scored)\nlongest path: {} questions\nmax score: {}\n\ntiers:\n",
        graph.entry(),
        graph.len(),
        graph.scored_node_count(),
        graph
            .questions_ahead(&Transition::To(graph.entry().clone()))
            .unwrap_or(0),
        graph.max_score(),
    );
    let tiers = screening.tiers();
    for (rank, tier) in tiers.tiers().iter().enumerate() {
        let range = match tiers.band(rank).and_then(|band| band.max) {
            Some(max) if max == tier.min_score => format!("{max}"),
            Some(max) => format!("{}-{max}", tier.min_score),
            None => format!("{}+", tier.min_score),
        };
        out.push_str(&format!(
            "  {:<14} {:<7} {:?}\n",
            tier.label, range, tier.recommendation
        ));
    }
    if !graph.unreachable_nodes().is_empty() {
        out.push_str("\nunreachable:\n");
        for id in graph.unreachable_nodes() {
            out.push_str(&format!("  {id}\n"));
        }
    }
    out
}
