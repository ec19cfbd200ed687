use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a summary fetch failed.
///
/// Anything unexpected from the fetch collaborator maps to `Transport`;
/// the engine never sees a third category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Credentials rejected. Retrying faster will not help until the
    /// credentials change.
    Auth,
    /// Timeout, DNS, IO, bad status, undecodable body.
    Transport,
}

/// One point-in-time fetch result from the review-count service.
///
/// Either the counts are meaningful or `error` is set, never both. Created
/// fresh on every fetch; immutable; the engine keeps the previous snapshot
/// around only for activity detection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub reviews_available: u32,
    /// Informational only; never drives a decision.
    #[serde(default)]
    pub lessons_available: u32,
    /// When `reviews_available == 0`, the earliest time more reviews become
    /// due. `None` means unknown.
    #[serde(default)]
    pub next_review_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error: Option<ErrorKind>,
}

impl Snapshot {
    /// A successful fetch carrying valid counts.
    pub fn counts(reviews: u32, lessons: u32, next_review_at: Option<DateTime<Utc>>) -> Self {
        Self {
            reviews_available: reviews,
            lessons_available: lessons,
            next_review_at,
            error: None,
        }
    }

    /// A failed fetch. The counts are zeroed and must not be read.
    pub fn failure(kind: ErrorKind) -> Self {
        Self {
            reviews_available: 0,
            lessons_available: 0,
            next_review_at: None,
            error: Some(kind),
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}
