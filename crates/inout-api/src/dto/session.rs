//! Session DTOs

use inout_core::models::{ApprovalStatus, Integration, UserControl, UserRole};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Screen the client should show next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Dashboard,
    Onboarding,
    PendingApproval,
}

impl NextStep {
    /// Approval gates everything; then a finished integration
    pub fn resolve(control: &UserControl, integration: Option<&Integration>) -> Self {
        if !control.can_access_app() {
            NextStep::PendingApproval
        } else if integration.is_some_and(Integration::is_complete) {
            NextStep::Dashboard
        } else {
            NextStep::Onboarding
        }
    }
}

/// Who the caller is and where they go next
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub status: ApprovalStatus,
    pub can_access_app: bool,
    pub has_integration: bool,
    pub next: NextStep,
}

impl SessionResponse {
    pub fn new(control: &UserControl, integration: Option<&Integration>) -> Self {
        Self {
            user_id: control.user_id,
            email: control.email.clone(),
            role: control.role,
            status: control.status(),
            can_access_app: control.can_access_app(),
            has_integration: integration.is_some_and(Integration::is_complete),
            next: NextStep::resolve(control, integration),
        }
    }
}
