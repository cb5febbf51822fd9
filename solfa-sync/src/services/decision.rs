//! Match classification
//!
//! Pure decision rule mapping a search result to one of three verdicts.
//! Auto-apply silently overwrites catalog data, so its bar is a fixed
//! constant rather than a caller-tunable knob; the review floor below which
//! a candidate is not worth a human's time is likewise fixed.

use crate::models::TrackCandidate;

/// Confidence at or above which a match is applied without review.
pub const AUTO_APPLY_THRESHOLD: f32 = 85.0;

/// Confidence at or above which a match is queued for human review.
pub const REVIEW_FLOOR: f32 = 20.0;

/// Outcome of classifying one search result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Write the candidate's fields onto the song immediately.
    AutoApply,
    /// Persist the candidate as a pending match for a reviewer.
    QueueForReview,
    /// Discard the candidate (or there was none).
    Skip,
}

impl Verdict {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::AutoApply => "auto_apply",
            Verdict::QueueForReview => "queue_for_review",
            Verdict::Skip => "skip",
        }
    }
}

/// Classify the best candidate for a song.
///
/// `min_confidence` is accepted for parity with the sync API but does not
/// move either band; it only tunes how hard the search capability probes
/// (see `SearchOptions`). Keeping the bands fixed means an operator cannot
/// accidentally configure silent catalog overwrites.
pub fn classify(candidate: Option<&TrackCandidate>, min_confidence: u8) -> Verdict {
    let _ = min_confidence;

    match candidate {
        None => Verdict::Skip,
        Some(c) if c.confidence >= AUTO_APPLY_THRESHOLD => Verdict::AutoApply,
        Some(c) if c.confidence >= REVIEW_FLOOR => Verdict::QueueForReview,
        Some(_) => Verdict::Skip,
    }
}
