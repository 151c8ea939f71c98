//! Organizer request types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Lifecycle state of an organizer request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizerRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl OrganizerRequestStatus {
    /// Database/wire representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Pending and approved requests block a new submission.
    #[must_use]
    pub const fn blocks_resubmission(&self) -> bool {
        matches!(self, Self::Pending | Self::Approved)
    }
}

impl fmt::Display for OrganizerRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizerRequestStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::UnknownVariant {
                kind: "organizer request status",
                value: other.to_string(),
            }),
        }
    }
}

/// Reviewer decision on a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approve,
    Reject,
}

impl ReviewDecision {
    /// Status a pending request moves to.
    #[must_use]
    pub const fn target_status(&self) -> OrganizerRequestStatus {
        match self {
            Self::Approve => OrganizerRequestStatus::Approved,
            Self::Reject => OrganizerRequestStatus::Rejected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_requests_do_not_block() {
        assert!(OrganizerRequestStatus::Pending.blocks_resubmission());
        assert!(OrganizerRequestStatus::Approved.blocks_resubmission());
        assert!(!OrganizerRequestStatus::Rejected.blocks_resubmission());
    }

    #[test]
    fn decision_maps_to_status() {
        assert_eq!(
            ReviewDecision::Approve.target_status(),
            OrganizerRequestStatus::Approved
        );
        assert_eq!(
            ReviewDecision::Reject.target_status(),
            OrganizerRequestStatus::Rejected
        );
    }
}
