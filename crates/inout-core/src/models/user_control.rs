//! Access control model
//!
//! Every authenticated user gets a control row on first access. Only admins
//! and approved users may reach the dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User role enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::User => write!(f, "user"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl UserRole {
    /// Parse from string (case-insensitive); unknown roles are plain users
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "admin" => UserRole::Admin,
            _ => UserRole::User,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, UserRole::Admin)
    }
}

/// Approval state shown in the admin list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Approved,
    Pending,
    Blocked,
}

impl ApprovalStatus {
    /// Portuguese label used in the admin screen
    pub fn label(&self) -> &'static str {
        match self {
            ApprovalStatus::Approved => "Aprovado",
            ApprovalStatus::Pending => "Pendente",
            ApprovalStatus::Blocked => "Bloqueado",
        }
    }
}

/// Stored control row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserControl {
    pub id: Uuid,
    pub user_id: Uuid,
    pub email: String,
    pub role: UserRole,
    pub approved: bool,
    /// Who last approved or blocked the user
    pub approved_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserControl {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    pub fn can_access_app(&self) -> bool {
        self.is_admin() || self.approved
    }

    /// A row that was reviewed and not approved is blocked
    pub fn status(&self) -> ApprovalStatus {
        if self.approved {
            ApprovalStatus::Approved
        } else if self.approved_by.is_some() {
            ApprovalStatus::Blocked
        } else {
            ApprovalStatus::Pending
        }
    }
}
