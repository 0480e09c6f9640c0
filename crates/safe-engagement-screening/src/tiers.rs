use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ScreeningError;

/// How strongly testing is recommended. Ordered weakest to strongest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Recommendation {
    /// Routine testing as part of regular care.
    Routine,
    /// Consider testing within the next few months.
    Consider,
    /// Test within the next few weeks.
    Soon,
    /// Test as soon as possible.
    Immediate,
}

/// A named risk bucket. The bucket covers `min_score` up to (but not
/// including) the next tier's `min_score`; the last tier is unbounded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Tier {
    pub label: String,
    pub min_score: u32,
    pub recommendation: Recommendation,
    pub message: String,
    #[serde(default)]
    pub guidance: Vec<String>,
}

/// Inclusive score range covered by one tier. `max` is `None` for the last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScoreBand {
    pub min: u32,
    pub max: Option<u32>,
}

impl ScoreBand {
    pub fn contains(&self, score: u32) -> bool {
        score >= self.min && self.max.is_none_or(|max| score <= max)
    }
}

/// Ordered, contiguous tiers covering every non-negative score exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TierTable {
    /// Validate and wrap a tier list.
    ///
    /// The first tier must start at 0, `min_score`s must strictly increase,
    /// and recommendation strength must never decrease with score.
    pub fn new(tiers: Vec<Tier>) -> Result<Self, ScreeningError> {
        let Some(first) = tiers.first() else {
            return Err(ScreeningError::InvalidTiers("no tiers defined".to_string()));
        };
        if first.min_score != 0 {
            return Err(ScreeningError::InvalidTiers(format!(
                "first tier '{}' starts at {} instead of 0",
                first.label, first.min_score
            )));
        }
        for pair in tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.min_score <= lower.min_score {
                return Err(ScreeningError::InvalidTiers(format!(
                    "tier '{}' starts at {} but must start above '{}' ({})",
                    upper.label, upper.min_score, lower.label, lower.min_score
                )));
            }
            if upper.recommendation < lower.recommendation {
                return Err(ScreeningError::InvalidTiers(format!(
                    "tier '{}' recommends less than the lower tier '{}'",
                    upper.label, lower.label
                )));
            }
        }
        Ok(Self { tiers })
    }

    pub fn from_json(json: &str) -> Result<Self, ScreeningError> {
        let tiers: Vec<Tier> = serde_json::from_str(json)?;
        Self::new(tiers)
    }

    /// Index of the tier containing `score`. Higher rank means higher risk.
    pub fn rank(&self, score: u32) -> usize {
        // tiers[0].min_score == 0, so at least one tier always matches.
        self.tiers.partition_point(|t| t.min_score <= score) - 1
    }

    /// The unique tier whose band contains `score`.
    pub fn classify(&self, score: u32) -> &Tier {
        &self.tiers[self.rank(score)]
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn band(&self, rank: usize) -> Option<ScoreBand> {
        let tier = self.tiers.get(rank)?;
        let max = self.tiers.get(rank + 1).map(|next| next.min_score - 1);
        Some(ScoreBand {
            min: tier.min_score,
            max,
        })
    }
}

impl TryFrom<Vec<Tier>> for TierTable {
    type Error = ScreeningError;

    fn try_from(tiers: Vec<Tier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<TierTable> for Vec<Tier> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier {
                    label: "Low".to_string(),
                    min_score: 0,
                    recommendation: Recommendation::Routine,
                    message: "Your risk appears to be low, but routine HIV testing is still \
                              recommended for all sexually active adults as part of regular \
                              healthcare."
                        .to_string(),
                    guidance: strings(&[
                        "Annual testing is recommended for all sexually active adults",
                        "Continue practicing safer sex",
                        "Stay informed about HIV prevention",
                        "Consider testing if your risk factors change",
                    ]),
                },
                Tier {
                    label: "Low-Moderate".to_string(),
                    min_score: 1,
                    recommendation: Recommendation::Consider,
                    message: "Based on your responses, HIV testing would be a good idea. \
                              Consider getting tested within the next few months as part of \
                              your regular healthcare."
                        .to_string(),
                    guidance: strings(&[
                        "Consider getting tested within the next few months",
                        "Annual testing may be appropriate",
                        "Discuss your risk factors with a healthcare provider",
                        "Continue practicing safer sex",
                    ]),
                },
                Tier {
                    label: "Moderate".to_string(),
                    min_score: 4,
                    recommendation: Recommendation::Soon,
                    message: "Your responses suggest that HIV testing would be beneficial for \
                              you within the next few weeks. It's a good way to stay on top of \
                              your health!"
                        .to_string(),
                    guidance: strings(&[
                        "Schedule a test within the next 2-4 weeks",
                        "Consider more frequent testing (every 6 months)",
                        "Discuss prevention strategies with a healthcare provider",
                        "Learn about PrEP if appropriate for your situation",
                    ]),
                },
                Tier {
                    label: "High".to_string(),
                    min_score: 8,
                    recommendation: Recommendation::Immediate,
                    message: "Based on your responses, I recommend getting tested for HIV as \
                              soon as possible. This doesn't mean you have HIV - it just means \
                              testing would be a good idea given your risk factors."
                        .to_string(),
                    guidance: strings(&[
                        "Schedule an appointment at a testing center today",
                        "Consider asking about PrEP if you test negative",
                        "Discuss your risk factors with a healthcare provider",
                        "Consider testing every 3 months if you remain at high risk",
                    ]),
                },
            ],
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
