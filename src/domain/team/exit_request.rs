//! Exit requests: a member asking to leave a team

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::MemberId;

/// Status of an exit request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl ExitRequestStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for ExitRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// A member's request to leave a team, keyed by the member's id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExitRequest {
    member_id: MemberId,
    display_name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
    status: ExitRequestStatus,
    requested_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    resolved_by: Option<MemberId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rejection_reason: Option<String>,
}

impl ExitRequest {
    /// Open a new pending request
    pub fn new(
        member_id: MemberId,
        display_name: impl Into<String>,
        email: impl Into<String>,
        reason: Option<String>,
    ) -> Self {
        Self {
            member_id,
            display_name: display_name.into(),
            email: email.into(),
            reason: reason.filter(|r| !r.trim().is_empty()),
            status: ExitRequestStatus::Pending,
            requested_at: Utc::now(),
            resolved_at: None,
            resolved_by: None,
            rejection_reason: None,
        }
    }

    pub fn member_id(&self) -> &MemberId {
        &self.member_id
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    pub fn status(&self) -> ExitRequestStatus {
        self.status
    }

    pub fn is_pending(&self) -> bool {
        self.status.is_pending()
    }

    pub fn requested_at(&self) -> DateTime<Utc> {
        self.requested_at
    }

    pub fn resolved_at(&self) -> Option<DateTime<Utc>> {
        self.resolved_at
    }

    pub fn resolved_by(&self) -> Option<&MemberId> {
        self.resolved_by.as_ref()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.rejection_reason.as_deref()
    }

    pub(super) fn resolve(
        &mut self,
        status: ExitRequestStatus,
        by: MemberId,
        rejection_reason: Option<String>,
    ) {
        self.status = status;
        self.resolved_at = Some(Utc::now());
        self.resolved_by = Some(by);
        self.rejection_reason = rejection_reason.filter(|r| !r.trim().is_empty());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_request_is_pending() {
        let request = ExitRequest::new(
            MemberId::new("bo").unwrap(),
            "Bo",
            "bo@example.org",
            Some("moving teams".to_string()),
        );

        assert!(request.is_pending());
        assert_eq!(request.reason(), Some("moving teams"));
        assert!(request.resolved_at().is_none());
    }

    #[test]
    fn test_blank_reason_dropped() {
        let request = ExitRequest::new(
            MemberId::new("bo").unwrap(),
            "Bo",
            "bo@example.org",
            Some("  ".to_string()),
        );
        assert_eq!(request.reason(), None);
    }

    #[test]
    fn test_resolve_rejected() {
        let mut request =
            ExitRequest::new(MemberId::new("bo").unwrap(), "Bo", "bo@example.org", None);

        request.resolve(
            ExitRequestStatus::Rejected,
            MemberId::new("ana").unwrap(),
            Some("release week".to_string()),
        );

        assert_eq!(request.status(), ExitRequestStatus::Rejected);
        assert!(!request.is_pending());
        assert_eq!(request.resolved_by().map(|m| m.as_str()), Some("ana"));
        assert_eq!(request.rejection_reason(), Some("release week"));
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&ExitRequestStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
    }
}
