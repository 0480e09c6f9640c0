use std::fmt;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::Screening;
use crate::error::ScreeningError;
use crate::flow::{FlowDefinition, FlowGraph};
use crate::node::{Category, Node, Transition};
use crate::tiers::TierTable;

/// Every node in the HIV testing screening. Informational side dialogue
/// first, then the scored questions in the order they are asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Step {
    Welcome,
    Privacy,
    Faq,
    Accuracy,
    DataPrivacy,
    Intro,
    CulturalAffirmation,
    CulturalCareInfo,
    TraumaInformed,
    SexualActivity,
    MultiplePartners,
    UnprotectedSex,
    PartnerStatus,
    DrugUse,
    StdHistory,
    PreviousTest,
    PrepUse,
    PrepInfo,
    PartnerHivPositive,
    Symptoms,
}

impl Step {
    pub fn as_str(&self) -> &'static str {
        match self {
            Step::Welcome => "welcome",
            Step::Privacy => "privacy",
            Step::Faq => "faq",
            Step::Accuracy => "accuracy",
            Step::DataPrivacy => "data_privacy",
            Step::Intro => "intro",
            Step::CulturalAffirmation => "cultural_affirmation",
            Step::CulturalCareInfo => "cultural_care_info",
            Step::TraumaInformed => "trauma_informed",
            Step::SexualActivity => "sexual_activity",
            Step::MultiplePartners => "multiple_partners",
            Step::UnprotectedSex => "unprotected_sex",
            Step::PartnerStatus => "partner_status",
            Step::DrugUse => "drug_use",
            Step::StdHistory => "std_history",
            Step::PreviousTest => "previous_test",
            Step::PrepUse => "prep_use",
            Step::PrepInfo => "prep_info",
            Step::PartnerHivPositive => "partner_hiv_positive",
            Step::Symptoms => "symptoms",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The HIV testing screening flow.
///
/// "Prefer not to say" and "Not sure" carry small positive weights on
/// purpose: undisclosed risk is scored conservatively. PrEP use is the only
/// protective (negative) answer; it is offered both directly and after the
/// "What's PrEP?" explainer.
pub fn definition() -> &'static FlowDefinition<Step> {
    static FLOW: LazyLock<FlowDefinition<Step>> = LazyLock::new(|| {
        use Category::{Behavioral, Medical};
        use Step::*;

        let nodes = vec![
            Node::informational(
                Welcome,
                "Hi there! 👋 I'm here to help you understand if HIV testing might be right \
                 for you. This is a completely confidential conversation - no personal \
                 information is stored.",
            )
            .option("Let's start", Intro)
            .option("Tell me more about privacy", Privacy),
            Node::informational(
                Privacy,
                "Great question! 🔒 Here's what you should know:\n\n\
                 • All your responses are completely confidential\n\
                 • No personal information is collected or stored\n\
                 • This assessment is for educational purposes only\n\
                 • Results don't replace professional medical advice\n\n\
                 Ready to begin?",
            )
            .option("Yes, let's start", Intro)
            .option("I have more questions", Faq),
            Node::informational(
                Faq,
                "I'm here to help! This assessment is based on CDC guidelines and takes about \
                 3-4 minutes. You can stop anytime, and I'll provide personalized \
                 recommendations at the end. What would you like to know?",
            )
            .option("How accurate is this?", Accuracy)
            .option("What happens with my answers?", DataPrivacy)
            .option("Let's start the assessment", Intro),
            Node::informational(
                Accuracy,
                "This assessment is based on CDC guidelines and medical research, but it's not \
                 a medical diagnosis. It helps identify if you might benefit from HIV testing. \
                 Only a healthcare provider can give you personalized medical advice.",
            )
            .option("Got it, let's start", Intro)
            .option("Tell me about data privacy", DataPrivacy),
            Node::informational(
                DataPrivacy,
                "Your answers stay right here on your device - they're never sent to any \
                 server or stored anywhere. When you close the assessment, everything \
                 disappears. It's completely private!",
            )
            .option("Perfect, let's begin", Intro)
            .option("I'm ready to start", Intro),
            Node::informational(
                Intro,
                "Perfect! I'll ask you some questions about your health and lifestyle. Just \
                 answer honestly - there's no judgment here, and everything is confidential. \
                 😊\n\nBefore we begin, I want to make sure this feels like a safe space for \
                 you:",
            )
            .option("I'm ready", CulturalAffirmation)
            .option("Tell me about safe spaces", TraumaInformed),
            Node::informational(
                CulturalAffirmation,
                "Before we continue, I want to acknowledge your strength in taking care of your \
                 health. As a Black or Latino MSM, you're part of a resilient community that \
                 deserves affirming, culturally-competent care. 💪🏾🏳️‍🌈",
            )
            .option("Thank you for saying that", SexualActivity)
            .option("Tell me more about culturally-competent care", CulturalCareInfo),
            Node::informational(
                CulturalCareInfo,
                "Culturally-competent care means:\n\n\
                 🏳️‍🌈 Providers who understand LGBTQ+ experiences\n\
                 🌍 Respect for your cultural background and identity\n\
                 🛡️ Safe spaces free from discrimination\n\
                 💬 Healthcare that honors your whole self\n\n\
                 Our partner clinics are trained in providing affirming care for our community.",
            )
            .option("That's important to me", SexualActivity)
            .option("Let's continue with the assessment", SexualActivity),
            Node::informational(
                TraumaInformed,
                "I understand that healthcare experiences haven't always been positive for our \
                 community. If any question feels uncomfortable, you can always choose 'Prefer \
                 not to say' or take a break. Your comfort and safety come first. 🤗",
            )
            .option("I appreciate that", SexualActivity)
            .option("I'm ready to continue", SexualActivity),
            Node::scored(
                SexualActivity,
                Behavioral,
                "Have you been sexually active in the past 12 months?",
            )
            .weighted("Yes", MultiplePartners, 1)
            .option("No", DrugUse)
            .weighted("Prefer not to say", MultiplePartners, 1),
            Node::scored(
                MultiplePartners,
                Behavioral,
                "Have you had more than one sexual partner in the past 12 months?",
            )
            .weighted("Yes", UnprotectedSex, 2)
            .option("No", UnprotectedSex)
            .weighted("Prefer not to say", UnprotectedSex, 1),
            Node::scored(
                UnprotectedSex,
                Behavioral,
                "Have you had unprotected sex (without condoms) in the past 12 months?",
            )
            .weighted("Yes", PartnerStatus, 3)
            .option("No", PartnerStatus)
            .weighted("Sometimes", PartnerStatus, 2)
            .weighted("Prefer not to say", PartnerStatus, 1),
            Node::scored(
                PartnerStatus,
                Behavioral,
                "Do you know the HIV status of all your sexual partners?",
            )
            .option("Yes, all negative", DrugUse)
            .weighted("No, I don't know", DrugUse, 2)
            .weighted("Some I know, some I don't", DrugUse, 1)
            .option("Not applicable", DrugUse),
            Node::scored(
                DrugUse,
                Behavioral,
                "Have you used injection drugs or shared needles in the past 12 months?",
            )
            .weighted("Yes", StdHistory, 4)
            .option("No", StdHistory)
            .weighted("Prefer not to say", StdHistory, 2),
            Node::scored(
                StdHistory,
                Medical,
                "Have you been diagnosed with any sexually transmitted infections (STIs) in the \
                 past 12 months?",
            )
            .weighted("Yes", PreviousTest, 3)
            .option("No", PreviousTest)
            .weighted("Not sure", PreviousTest, 1)
            .weighted("Prefer not to say", PreviousTest, 1),
            Node::scored(PreviousTest, Medical, "When was your last HIV test?")
                .weighted("Never tested", PrepUse, 3)
                .option("Within 3 months", PrepUse)
                .option("3-6 months ago", PrepUse)
                .weighted("6-12 months ago", PrepUse, 1)
                .weighted("More than 1 year ago", PrepUse, 2),
            Node::scored(
                PrepUse,
                Medical,
                "Are you currently taking PrEP (pre-exposure prophylaxis)?",
            )
            .weighted("Yes", PartnerHivPositive, -1)
            .option("No", PartnerHivPositive)
            .option("What's PrEP?", PrepInfo),
            Node::scored(
                PrepInfo,
                Medical,
                "PrEP is a daily medication that can prevent HIV infection when taken \
                 consistently. It's very effective for people at higher risk. You can ask your \
                 doctor about it!\n\nAre you currently taking PrEP?",
            )
            .weighted("Yes", PartnerHivPositive, -1)
            .option("No", PartnerHivPositive)
            .option("I want to learn more", PartnerHivPositive),
            Node::scored(
                PartnerHivPositive,
                Behavioral,
                "Do you have a sexual partner who is HIV positive?",
            )
            .weighted("Yes", Symptoms, 3)
            .option("No", Symptoms),
            Node::scored(
                Symptoms,
                Medical,
                "Have you experienced any flu-like symptoms, unexplained weight loss, or \
                 persistent infections recently?",
            )
            .weighted("Yes", Transition::End, 2)
            .option("No", Transition::End)
            .weighted("Not sure", Transition::End, 1),
        ];

        FlowDefinition {
            entry: Welcome,
            completion_message: "Thanks for answering all my questions! 🎉 Let me analyze your \
                                 responses and provide personalized recommendations..."
                .to_string(),
            nodes,
        }
    });
    &FLOW
}

/// The HIV flow paired with the default tier table.
pub fn screening() -> Result<Screening<Step>, ScreeningError> {
    Ok(Screening::new(
        FlowGraph::new(definition().clone())?,
        TierTable::default(),
    ))
}
