//! Core type definitions for the BoostTrade dashboard
//!
//! Users, roles and sessions as the login fixtures describe them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// USER AND AUTHENTICATION TYPES
// ============================================================================

/// Dashboard role, selected at login
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    CampaignManager,
    ReportsOnly,
    PosAdmin,
}

impl Role {
    /// Every role, in sidebar order
    pub const ALL: [Role; 4] = [
        Role::Admin,
        Role::CampaignManager,
        Role::ReportsOnly,
        Role::PosAdmin,
    ];

    /// Wire name of the role, also the key used by role-keyed fixtures
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::CampaignManager => "campaign_manager",
            Role::ReportsOnly => "reports_only",
            Role::PosAdmin => "pos_admin",
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "campaign_manager" => Ok(Role::CampaignManager),
            "reports_only" => Ok(Role::ReportsOnly),
            "pos_admin" => Ok(Role::PosAdmin),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Authenticated dashboard user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl User {
    /// Check a single permission key
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Login result: a bearer token and the user it belongs to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Credentials submitted by the login form
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}
