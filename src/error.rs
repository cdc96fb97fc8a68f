//! Error types for placement state construction.
//!
//! Only initialisation calls can fail. Resource conflicts met inside the
//! annealing loop are ordinary rejections and never surface as a
//! [`PlaceError`].

use crate::state::{NetId, VertexId};

/// Errors raised while building or configuring an [`AnnealState`](crate::state::AnnealState).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlaceError {
    /// A coordinate or index lies outside the configured dimensions.
    #[error("{what} index {index} out of bounds (limit {limit})")]
    OutOfBounds {
        /// Which dimension was violated (`"x"`, `"y"`, `"resource"`, ...).
        what: &'static str,
        /// The offending index.
        index: usize,
        /// The exclusive upper bound.
        limit: usize,
    },

    /// A placement or capacity change would push usage above capacity.
    #[error("resource {resource} exceeded at cell ({x}, {y})")]
    ResourceExceeded {
        /// Cell column.
        x: usize,
        /// Cell row.
        y: usize,
        /// Resource type that overflowed.
        resource: usize,
    },

    /// More entries were added than were declared up front.
    #[error("{what} capacity of {limit} exceeded")]
    CapacityExceeded {
        /// What ran out of room (`"vertices"`, `"net members"`, ...).
        what: &'static str,
        /// The pre-declared maximum.
        limit: usize,
    },

    /// Storage for the state could not be reserved.
    #[error("allocation failed: {0}")]
    AllocationFailure(String),

    /// The vertex handle does not belong to this state.
    #[error("unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// The net handle does not belong to this state.
    #[error("unknown net {0}")]
    UnknownNet(NetId),

    /// A vertex demand entry is negative.
    #[error("vertex {vertex} demands {amount} of resource {resource}")]
    InvalidDemand {
        /// The vertex whose demand was being set.
        vertex: VertexId,
        /// Resource type of the entry.
        resource: usize,
        /// The rejected amount.
        amount: i32,
    },

    /// The vertex already has a position on the grid.
    #[error("vertex {0} is already placed")]
    AlreadyPlaced(VertexId),

    /// A configuration value is out of its valid range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias used across the crate.
pub type Result<T> = std::result::Result<T, PlaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_out_of_bounds() {
        let err = PlaceError::OutOfBounds {
            what: "x",
            index: 7,
            limit: 4,
        };
        assert_eq!(err.to_string(), "x index 7 out of bounds (limit 4)");
    }

    #[test]
    fn test_display_resource_exceeded() {
        let err = PlaceError::ResourceExceeded {
            x: 1,
            y: 2,
            resource: 0,
        };
        assert_eq!(err.to_string(), "resource 0 exceeded at cell (1, 2)");
    }

    #[test]
    fn test_display_handles() {
        assert_eq!(
            PlaceError::AlreadyPlaced(VertexId::from_raw(3)).to_string(),
            "vertex v3 is already placed"
        );
        assert_eq!(
            PlaceError::UnknownNet(NetId::from_raw(5)).to_string(),
            "unknown net n5"
        );
    }
}
