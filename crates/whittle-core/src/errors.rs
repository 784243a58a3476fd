/// Errors a squash caller can correct by resubmitting with better anchors.
/// These surface to the invoking tool caller; everything else in the engine
/// degrades silently (see [`HostError`]).
#[derive(Clone, Debug, thiserror::Error)]
pub enum SquashError {
    #[error("{which} not found in conversation: \"{anchor}\"")]
    AnchorNotFound { which: &'static str, anchor: String },

    #[error(
        "Found multiple matches for {which}: \"{anchor}\". \
         Provide a larger string with more surrounding context to uniquely identify the intended match."
    )]
    AnchorAmbiguous { which: &'static str, anchor: String },

    #[error("startString appears after endString in the conversation. Start must come before end.")]
    StartAfterEnd,
}

impl SquashError {
    /// Shorten long anchors for error display.
    pub fn truncate_anchor(anchor: &str) -> String {
        const MAX: usize = 80;
        if anchor.chars().count() <= MAX {
            anchor.to_string()
        } else {
            let cut: String = anchor.chars().take(MAX).collect();
            format!("{cut}...")
        }
    }
}

/// Failures of external collaborators. Always logged and swallowed: losing
/// one turn's notification or persistence is recoverable and must not abort
/// the user's request.
#[derive(Clone, Debug, thiserror::Error)]
pub enum HostError {
    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("state persistence failed: {0}")]
    Persistence(String),
}
