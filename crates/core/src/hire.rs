//! Hire-record status constants and request-transition rules.
//!
//! A hire is the student-initiated, tutor-approved relationship gate that
//! must be `accepted` before any entitlement or session can exist between a
//! (student, tutor) pair. At most one non-rejected record may exist per pair;
//! a rejected record is resubmitted in place rather than duplicated.

/// Awaiting the tutor's decision.
pub const STATUS_PENDING: &str = "pending";

/// The tutor accepted; entitlements and sessions may now exist.
pub const STATUS_ACCEPTED: &str = "accepted";

/// The tutor declined; the student may resubmit.
pub const STATUS_REJECTED: &str = "rejected";

/// All valid hire status values.
pub const VALID_STATUSES: &[&str] = &[STATUS_PENDING, STATUS_ACCEPTED, STATUS_REJECTED];

/// Tutor decision verbs accepted by the respond endpoint.
pub const ACTION_ACCEPT: &str = "accept";
pub const ACTION_REJECT: &str = "reject";

/// What a new hire request should do, given the status of any existing
/// record for the same (student, tutor) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestDecision {
    /// No prior record: create a fresh pending one.
    Create,
    /// Prior record was rejected: flip it back to pending in place,
    /// refreshing its timestamp and subject/level.
    Resubmit,
}

/// Decide how to handle a hire request against an optional existing record.
///
/// Accepted and pending records block a new request; only a rejected record
/// may be resubmitted.
pub fn decide_request(existing_status: Option<&str>) -> Result<RequestDecision, String> {
    match existing_status {
        None => Ok(RequestDecision::Create),
        Some(STATUS_ACCEPTED) => Err("Tutor already hired. Select another tutor".to_string()),
        Some(STATUS_PENDING) => {
            Err("Hiring request already pending for this tutor".to_string())
        }
        Some(STATUS_REJECTED) => Ok(RequestDecision::Resubmit),
        Some(other) => Err(format!("Unknown hire status '{other}'")),
    }
}

/// Map a tutor decision verb to the resulting hire status.
pub fn decision_status(action: &str) -> Result<&'static str, String> {
    match action {
        ACTION_ACCEPT => Ok(STATUS_ACCEPTED),
        ACTION_REJECT => Ok(STATUS_REJECTED),
        other => Err(format!(
            "Invalid action '{other}'. Must be one of: {ACTION_ACCEPT}, {ACTION_REJECT}"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_request_creates() {
        assert_eq!(decide_request(None).unwrap(), RequestDecision::Create);
    }

    #[test]
    fn accepted_blocks_new_request() {
        let err = decide_request(Some(STATUS_ACCEPTED)).unwrap_err();
        assert!(err.contains("already hired"));
    }

    #[test]
    fn pending_blocks_new_request() {
        let err = decide_request(Some(STATUS_PENDING)).unwrap_err();
        assert!(err.contains("already pending"));
    }

    #[test]
    fn rejected_resubmits_in_place() {
        assert_eq!(
            decide_request(Some(STATUS_REJECTED)).unwrap(),
            RequestDecision::Resubmit
        );
    }

    #[test]
    fn decision_status_maps_verbs() {
        assert_eq!(decision_status(ACTION_ACCEPT).unwrap(), STATUS_ACCEPTED);
        assert_eq!(decision_status(ACTION_REJECT).unwrap(), STATUS_REJECTED);
        assert!(decision_status("maybe").is_err());
    }
}
