use std::collections::BTreeMap;

/// Node id → weight of the option chosen there. Only nodes whose chosen
/// option carries an explicit weight appear.
pub type WeightedAnswers<K> = BTreeMap<K, i32>;

/// Sum every recorded weight, floored at zero.
///
/// Protective answers (negative weights) can pull the total down but never
/// below zero.
pub fn score<K>(answers: &WeightedAnswers<K>) -> u32 {
    let total: i64 = answers.values().map(|&w| i64::from(w)).sum();
    clamp(total)
}

/// Floor a raw weight sum at zero and saturate at `u32::MAX`.
pub fn clamp(total: i64) -> u32 {
    u32::try_from(total.max(0)).unwrap_or(u32::MAX)
}
