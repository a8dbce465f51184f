use std::collections::BTreeSet;

/// Similarity of two strings on a 0-100 scale.
pub type Scorer = fn(&str, &str) -> u8;

const UNBASE_SCALE: f64 = 0.95;

/// Lowercases, turns anything that is not alphanumeric into a space and trims.
pub fn default_process(s: &str) -> String {
    s.chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect::<String>()
        .trim()
        .to_string()
}

fn lcs_len(a: &[char], b: &[char]) -> usize {
    let mut row = vec![0usize; b.len() + 1];
    for &ca in a {
        let mut diagonal = 0;
        for (j, &cb) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if ca == cb { diagonal + 1 } else { above.max(row[j]) };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Indel similarity: `1 - (insertions + deletions) / (len_a + len_b)`, scaled
/// to 0-100. A single missing letter costs one edit, a substitution two.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = (a.len() + b.len()) as f64;
    let indel = total - 2.0 * lcs_len(&a, &b) as f64;
    (1.0 - indel / total) * 100.0
}

/// Best `ratio` of the shorter string against every same-length window of
/// the longer one.
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let (short, long) = if a.chars().count() <= b.chars().count() { (a, b) } else { (b, a) };
    let short_len = short.chars().count();
    if short_len == 0 {
        return 0.0;
    }

    let long_chars: Vec<char> = long.chars().collect();
    let mut best = 0.0_f64;
    for window in long_chars.windows(short_len) {
        let window: String = window.iter().collect();
        best = best.max(ratio(short, &window));
        if best >= 100.0 {
            break;
        }
    }
    best
}

fn sorted_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    ratio(&sorted_tokens(a), &sorted_tokens(b))
}

fn join_with(base: &str, rest: &str) -> String {
    match (base.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{} {}", base, rest),
    }
}

/// Compares the shared tokens against each side's shared-plus-remaining
/// tokens. A string whose tokens are a subset of the other's scores 100.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let set_a: BTreeSet<&str> = a.split_whitespace().collect();
    let set_b: BTreeSet<&str> = b.split_whitespace().collect();
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }

    let shared = set_a.intersection(&set_b).copied().collect::<Vec<_>>().join(" ");
    let only_a = set_a.difference(&set_b).copied().collect::<Vec<_>>().join(" ");
    let only_b = set_b.difference(&set_a).copied().collect::<Vec<_>>().join(" ");

    if !shared.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let with_a = join_with(&shared, &only_a);
    let with_b = join_with(&shared, &only_b);
    let mut best = ratio(&with_a, &with_b);
    if !shared.is_empty() {
        best = best.max(ratio(&shared, &with_a)).max(ratio(&shared, &with_b));
    }
    best
}

/// Weighted ratio: plain ratio for similar-length strings, partial matching
/// once one string is at least 1.5x the other, and token sort/set
/// comparisons for word reordering. The best score wins.
pub fn weighted_ratio(a: &str, b: &str) -> u8 {
    let a = default_process(a);
    let b = default_process(b);
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (len_a, len_b) = (a.chars().count() as f64, b.chars().count() as f64);
    let len_ratio = len_a.max(len_b) / len_a.min(len_b);

    let mut best = ratio(&a, &b);
    if len_ratio < 1.5 {
        let token = token_sort_ratio(&a, &b).max(token_set_ratio(&a, &b));
        best = best.max(token * UNBASE_SCALE);
    } else {
        let partial_scale = if len_ratio < 8.0 { 0.9 } else { 0.6 };
        best = best.max(partial_ratio(&a, &b) * partial_scale);
        best = best.max(partial_ratio(&sorted_tokens(&a), &sorted_tokens(&b)) * UNBASE_SCALE * partial_scale);
    }

    best.round().clamp(0.0, 100.0) as u8
}

pub struct FuzzyRanker;

impl FuzzyRanker {
    /// Scores every candidate and keeps the best `limit`, highest first.
    /// Equal scores keep their input order. No threshold is applied here.
    pub fn rank<'a>(query: &str, candidates: &'a [String], limit: usize, scorer: Scorer) -> Vec<(&'a str, u8)> {
        let mut scored: Vec<(&'a str, u8)> = candidates.iter()
            .map(|c| {
                let score = scorer(query, c);
                tracing::debug!("Candidate: {} (Score: {})", c, score);
                (c.as_str(), score)
            })
            .collect();

        // `sort_by` is stable, which keeps equal scores in input order.
        scored.sort_by(|(_, x), (_, y)| y.cmp(x));
        scored.truncate(limit);
        scored
    }
}
