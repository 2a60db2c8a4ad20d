//! Authenticated caller identity passed into every lifecycle operation

use serde::{Deserialize, Serialize};

use crate::domain::team::MemberId;

/// The user on whose behalf an operation runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub member_id: MemberId,
    pub display_name: String,
    pub email: String,
}

impl Caller {
    pub fn new(
        member_id: MemberId,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            member_id,
            display_name: display_name.into(),
            email: email.into(),
        }
    }

    pub fn id(&self) -> &MemberId {
        &self.member_id
    }
}
