//! Tagged stage results.

use serde::{Deserialize, Serialize};

/// Why a stage produced nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// The document had no text.
    NoInput,
    /// Segmentation produced no main-stream passages.
    NoPassages,
    /// No two passages were similar enough to connect.
    Ungraphed,
    /// The partitioner returned no clusters.
    NoClusters,
    /// No cluster reached the aspect relevance threshold.
    NoRelevantClusters,
    /// No passage reached any aspect threshold (direct aspect strategy).
    NoRelevantPassages,
}

impl EmptyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoInput => "no_input",
            Self::NoPassages => "no_passages",
            Self::Ungraphed => "ungraphed",
            Self::NoClusters => "no_clusters",
            Self::NoRelevantClusters => "no_relevant_clusters",
            Self::NoRelevantPassages => "no_relevant_passages",
        }
    }
}

impl std::fmt::Display for EmptyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Self::NoInput => "no text input",
            Self::NoPassages => "no passages found",
            Self::Ungraphed => "no similar passages (graph has no edges)",
            Self::NoClusters => "no clusters found",
            Self::NoRelevantClusters => "no relevant clusters found",
            Self::NoRelevantPassages => "no relevant passages found",
        };
        f.write_str(text)
    }
}

/// Either selected items or the reason there are none.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection<T> {
    Selected(Vec<T>),
    Empty(EmptyReason),
}

impl<T> Selection<T> {
    /// `Selected` unless `items` is empty, in which case `Empty(reason)`.
    pub fn from_vec(items: Vec<T>, reason: EmptyReason) -> Self {
        if items.is_empty() {
            Self::Empty(reason)
        } else {
            Self::Selected(items)
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty(_))
    }

    pub fn into_result(self) -> Result<Vec<T>, EmptyReason> {
        match self {
            Self::Selected(items) => Ok(items),
            Self::Empty(reason) => Err(reason),
        }
    }
}
