//! Role-based navigation
//!
//! Sidebar tree filtering and the route permission guard used by the
//! dashboard shell.

use boosttrade_shared::{Role, User};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Sidebar leaf, shown when the user holds `permission`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub name: String,
    pub permission: String,
}

/// Top-level sidebar section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSection {
    pub title: String,
    /// Roles that may see the section; empty means every role
    #[serde(default)]
    pub required_roles: Vec<Role>,
    pub children: Vec<NavItem>,
}

impl NavSection {
    fn new(title: &str, required_roles: &[Role], children: &[(&str, &str)]) -> Self {
        Self {
            title: title.to_string(),
            required_roles: required_roles.to_vec(),
            children: children
                .iter()
                .map(|(name, permission)| NavItem {
                    name: name.to_string(),
                    permission: permission.to_string(),
                })
                .collect(),
        }
    }

    pub fn allows_role(&self, role: Role) -> bool {
        self.required_roles.is_empty() || self.required_roles.contains(&role)
    }
}

/// Full dashboard sidebar before any filtering
pub fn default_navigation() -> Vec<NavSection> {
    vec![
        NavSection::new(
            "Admin",
            &[Role::Admin],
            &[
                ("Add Users", "admin.users.manage"),
                ("Manage Users", "admin.users.manage"),
                ("Feature Permissions", "admin.roles.manage"),
                ("Campaign Conditions", "admin.conditions.manage"),
            ],
        ),
        NavSection::new(
            "Campaign Management",
            &[Role::Admin, Role::CampaignManager],
            &[
                ("Create Campaign", "campaigns.create"),
                ("Publish Campaign", "campaigns.publish"),
                ("Preview Campaign", "campaigns.preview"),
            ],
        ),
        NavSection::new(
            "Store Management",
            &[Role::Admin, Role::PosAdmin],
            &[
                ("POS Stores/Device", "posstoresdevice"),
                ("Add Placements", "addplacements"),
            ],
        ),
        NavSection::new(
            "Reports",
            &Role::ALL,
            &[
                ("Campaign Report", "reports.view_all"),
                ("Store Performance Report", "reports.view_all"),
                ("Device Health", "devicehealth"),
                ("Inventory Report", "reports.view_all"),
            ],
        ),
    ]
}

/// Sections visible to `role`, keeping only leaves whose permission is held.
/// Sections left without leaves are dropped.
pub fn filter_navigation(role: Role, permissions: &[String], tree: &[NavSection]) -> Vec<NavSection> {
    tree.iter()
        .filter(|section| section.allows_role(role))
        .filter_map(|section| {
            let children: Vec<NavItem> = section
                .children
                .iter()
                .filter(|item| permissions.iter().any(|p| *p == item.permission))
                .cloned()
                .collect();

            if children.is_empty() {
                None
            } else {
                Some(NavSection {
                    children,
                    ..section.clone()
                })
            }
        })
        .collect()
}

/// Permission a route requires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutePermission {
    Any(&'static str),
    /// Permission depends on the user's role; roles not listed are denied
    PerRole(&'static [(Role, &'static str)]),
}

impl RoutePermission {
    fn allows(&self, user: &User) -> bool {
        match self {
            RoutePermission::Any(permission) => user.has_permission(permission),
            RoutePermission::PerRole(table) => table
                .iter()
                .find(|(role, _)| *role == user.role)
                .map(|(_, permission)| user.has_permission(permission))
                .unwrap_or(false),
        }
    }
}

static ROUTE_PERMISSIONS: Lazy<HashMap<&'static str, RoutePermission>> = Lazy::new(|| {
    use RoutePermission::{Any, PerRole};

    HashMap::from([
        (
            "/",
            PerRole(&[
                (Role::Admin, "dashboard.view"),
                (Role::CampaignManager, "campaigns.create"),
                (Role::ReportsOnly, "reports.view_all"),
            ]),
        ),
        ("/addusers", Any("admin.users.manage")),
        ("/rolepermissions", Any("admin.users.manage")),
        ("/addplacements", Any("admin.placements.manage")),
        ("/createcampaign", Any("campaigns.create")),
        ("/publishcampaign", Any("campaigns.publish")),
        ("/previewcampaign", Any("campaigns.preview")),
        ("/campaignconditions", Any("admin.conditions.manage")),
        ("/posstoresdevice", Any("stores.manage")),
        ("/devicehealth", Any("stores.health")),
        ("/report1", Any("reports.view_all")),
        ("/report2", Any("reports.view_all")),
        ("/report3", Any("reports.view_all")),
    ])
});

/// Permission guarding `path`, if any. The query string is ignored and
/// matching is case-insensitive.
pub fn route_permission(path: &str) -> Option<&'static RoutePermission> {
    let clean = path.split('?').next().unwrap_or_default().to_lowercase();
    ROUTE_PERMISSIONS.get(clean.as_str())
}

/// Whether `user` may open `path`. Anonymous users are always denied;
/// routes without a registered permission are open.
pub fn can_access_route(user: Option<&User>, path: &str) -> bool {
    let Some(user) = user else {
        return false;
    };

    match route_permission(path) {
        Some(permission) => permission.allows(user),
        None => true,
    }
}
