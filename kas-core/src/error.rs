use thiserror::Error;

/// Errors from parsing or converting core types
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A groupVersion string did not have the `group/version` or `version` shape
    #[error("failed to parse group version: {0}")]
    GroupVersion(String),

    /// A label selector string could not be parsed
    #[error("unable to parse label selector {selector:?}: {reason}")]
    LabelSelector {
        /// The raw selector
        selector: String,
        /// What was wrong with it
        reason: String,
    },

    /// A structured `LabelSelector` contained an unusable requirement
    #[error("invalid label selector requirement for key {key:?}: {reason}")]
    InvalidRequirement {
        /// Requirement key
        key: String,
        /// What was wrong with it
        reason: String,
    },
}
