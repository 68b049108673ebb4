//! LINE Identity Model

use serde::{Deserialize, Serialize};

/// Messaging identity bound to a phone number
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct LineIdentity {
    pub line_user_id: String,
    pub line_name: String,
    pub phone: String,
    pub created_at: i64,
}

/// Identity binding payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BindIdentityRequest {
    /// Handoff token from the success page
    pub token: String,
    pub line_user_id: String,
    pub line_name: String,
}
