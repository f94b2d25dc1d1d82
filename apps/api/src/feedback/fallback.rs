//! Local fallback feedback: a coarse, deterministic stand-in for real grading.
//!
//! overall = 0.4 × length_similarity + 0.6 × keyword_score, then bucketed into one of
//! three fixed templates. No network, no randomness.

use std::collections::HashSet;

use tracing::debug;

const LENGTH_WEIGHT: f64 = 0.4;
const KEYWORD_WEIGHT: f64 = 0.6;
/// Reference words need more than this many characters to count as keywords.
const KEYWORD_MIN_EXCLUSIVE: usize = 4;
const HINT_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackTier {
    Excellent,
    GoodFoundation,
    NeedsMorePreparation,
}

impl FallbackTier {
    /// (0.8, 1] excellent, (0.5, 0.8] good foundation, everything else needs preparation.
    pub fn from_score(overall: f64) -> Self {
        if overall > 0.8 {
            FallbackTier::Excellent
        } else if overall > 0.5 {
            FallbackTier::GoodFoundation
        } else {
            FallbackTier::NeedsMorePreparation
        }
    }
}

#[derive(Debug, Clone)]
pub struct FallbackScore {
    pub length_similarity: f64,
    pub keyword_score: f64,
    pub overall: f64,
    /// Reference keywords absent from the candidate, first occurrence order, no repeats.
    pub missing_keywords: Vec<String>,
    reference_keywords: Vec<String>,
}

impl FallbackScore {
    pub fn tier(&self) -> FallbackTier {
        FallbackTier::from_score(self.overall)
    }

    /// Up to two concepts to name in the "good foundation" template. Prefers missing
    /// keywords, then any reference keyword.
    pub fn hints(&self) -> Vec<&str> {
        let source = if self.missing_keywords.is_empty() {
            &self.reference_keywords
        } else {
            &self.missing_keywords
        };
        source.iter().take(HINT_COUNT).map(String::as_str).collect()
    }
}

pub fn score_answer(candidate: &str, reference: &str) -> FallbackScore {
    let length_similarity = length_similarity(candidate, reference);

    let reference_lower = reference.to_lowercase();
    let keywords: Vec<&str> = reference_lower
        .split_whitespace()
        .filter(|w| w.chars().count() > KEYWORD_MIN_EXCLUSIVE)
        .collect();

    let candidate_lower = candidate.to_lowercase();
    let candidate_words: HashSet<&str> = candidate_lower.split_whitespace().collect();

    let matched = keywords
        .iter()
        .filter(|w| candidate_words.contains(*w))
        .count();
    let keyword_score = if keywords.is_empty() {
        0.0
    } else {
        matched as f64 / keywords.len() as f64
    };

    let mut seen = HashSet::new();
    let mut reference_keywords = Vec::new();
    let mut missing_keywords = Vec::new();
    for word in keywords {
        if !seen.insert(word) {
            continue;
        }
        reference_keywords.push(word.to_string());
        if !candidate_words.contains(word) {
            missing_keywords.push(word.to_string());
        }
    }

    FallbackScore {
        length_similarity,
        keyword_score,
        overall: LENGTH_WEIGHT * length_similarity + KEYWORD_WEIGHT * keyword_score,
        missing_keywords,
        reference_keywords,
    }
}

/// min(a/b, b/a) over character counts; 0 when either side is empty.
fn length_similarity(candidate: &str, reference: &str) -> f64 {
    let a = candidate.chars().count() as f64;
    let b = reference.chars().count() as f64;
    if a == 0.0 || b == 0.0 {
        return 0.0;
    }
    (a / b).min(b / a)
}

pub fn render_feedback(score: &FallbackScore) -> String {
    match score.tier() {
        FallbackTier::Excellent => EXCELLENT_TEMPLATE.to_string(),
        FallbackTier::GoodFoundation => {
            let hints = score.hints();
            let topics = if hints.is_empty() {
                "the key concepts".to_string()
            } else {
                hints.join(", ")
            };
            GOOD_FOUNDATION_TEMPLATE.replace("{topics}", &topics)
        }
        FallbackTier::NeedsMorePreparation => NEEDS_PREPARATION_TEMPLATE.to_string(),
    }
}

/// Scores and renders in one go. Always non-empty.
pub fn fallback_feedback(candidate: &str, reference: &str) -> String {
    let score = score_answer(candidate, reference);
    debug!(
        "Fallback score {:.3} (length {:.3}, keywords {:.3}, missing {})",
        score.overall,
        score.length_similarity,
        score.keyword_score,
        score.missing_keywords.len()
    );
    render_feedback(&score)
}

const EXCELLENT_TEMPLATE: &str = "🎯 **Excellent Answer!**

**Strengths:**
- Complete coverage of key concepts
- Clear technical explanation
- Good interview-ready structure

**For the Interview:**
- This level of detail fits a timed technical round well
- You've covered both the technical and the business angle interviewers look for

Keep practicing at this level!";

const GOOD_FOUNDATION_TEMPLATE: &str = "✅ **Good Foundation, Room for Improvement**

**Strengths:**
- You understand the core concept
- Decent technical approach

**Missing for the Interview:**
- Add more detail about {topics}
- Include scalability and production considerations
- Tie the answer back to systems you have actually built

**Next Steps:** Review the complete answer and practice explaining it concisely.";

const NEEDS_PREPARATION_TEMPLATE: &str = "📚 **Needs More Preparation**

**Key Gaps:**
- Missing fundamental concepts interviewers expect
- Limited technical depth for a senior role
- Needs a stronger connection to real-world applications

**Study Plan:**
1. Review the core principles in the reference answer
2. Practice explaining them with examples from your own work
3. Focus on the system design thinking behind the answer

Don't get discouraged - targeted practice will get you there!";
