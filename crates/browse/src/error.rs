//! Navigation errors.

/// Error type for navigation calls.
pub type Result<T> = std::result::Result<T, BrowseError>;

/// Invalid navigation requests.
///
/// The UI only offers actions taken from the rendered trail and listing, so
/// each of these is a caller bug. They are reported before any state changes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BrowseError {
    /// `jump_to` with an index outside the trail
    #[error("Breadcrumb index {index} out of range (trail has {len} nodes)")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Trail length
        len: usize,
    },

    /// `descend` on a file where only directories are browsable
    #[error("Cannot descend into '{0}': not a directory")]
    NotADirectory(String),

    /// `descend` while the tip is already a file
    #[error("Cannot descend below file '{0}'")]
    BelowLeaf(String),
}
