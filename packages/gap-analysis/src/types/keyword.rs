use serde::{Deserialize, Serialize};

/// A keyword chosen for deep analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrioritizedKeyword {
    pub keyword: String,
    pub priority_score: f64,
    pub impressions: f64,
    pub clicks: f64,
    pub position: f64,
    /// Came from the drop-candidate list
    #[serde(default)]
    pub dropped: bool,
}

impl PrioritizedKeyword {
    pub fn new(keyword: impl Into<String>, priority_score: f64) -> Self {
        Self {
            keyword: keyword.into(),
            priority_score,
            impressions: 0.0,
            clicks: 0.0,
            position: 0.0,
            dropped: false,
        }
    }
}
