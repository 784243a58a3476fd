/// External token-count estimation, consumed as a black box. A failing
/// estimator never fails the caller: estimation silently falls back to the
/// chars/4 heuristic.
pub trait TokenEstimator: Send + Sync {
    /// Estimated token count for `text`, or None when the estimator cannot
    /// produce one (model mismatch, tokenizer unavailable, and so on).
    fn estimate(&self, text: &str) -> Option<u32>;
}

/// chars/4, rounded up. Also the fallback when a real estimator fails.
pub fn heuristic_tokens(text: &str) -> u32 {
    (text.len() as u32).div_ceil(4)
}

/// Estimate with fallback.
pub fn estimate_or_heuristic(estimator: &dyn TokenEstimator, text: &str) -> u32 {
    estimator.estimate(text).unwrap_or_else(|| heuristic_tokens(text))
}

/// Batch estimate with per-item fallback.
pub fn estimate_batch(estimator: &dyn TokenEstimator, texts: &[String]) -> u64 {
    texts
        .iter()
        .map(|t| estimate_or_heuristic(estimator, t) as u64)
        .sum()
}

/// Estimator that always defers to the heuristic.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeuristicEstimator;

impl TokenEstimator for HeuristicEstimator {
    fn estimate(&self, text: &str) -> Option<u32> {
        Some(heuristic_tokens(text))
    }
}
