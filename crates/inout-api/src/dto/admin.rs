//! Access control DTOs

use chrono::{DateTime, Utc};
use inout_core::models::{ApprovalStatus, UserControl, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One row of the admin user list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserControlResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub approved: bool,
    pub status: ApprovalStatus,
    pub status_label: String,
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&UserControl> for UserControlResponse {
    fn from(control: &UserControl) -> Self {
        let status = control.status();
        Self {
            user_id: control.user_id,
            email: control.email.clone(),
            role: control.role,
            approved: control.approved,
            status,
            status_label: status.label().to_string(),
            approved_by: control.approved_by.clone(),
            created_at: control.created_at,
            updated_at: control.updated_at,
        }
    }
}

/// Admin user list
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserListResponse {
    pub users: Vec<UserControlResponse>,
    pub total: usize,
    pub pending: usize,
}
