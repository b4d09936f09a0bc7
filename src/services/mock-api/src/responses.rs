//! Mock Response Module
//!
//! Turns loaded fixture data into the payload a caller sees: picks the
//! role- or identifier-keyed variant, then unwraps the `success`/`error`
//! envelope. Also holds the inline responses used when no fixture loads.

use crate::{MockApiError, Result};

use boosttrade_shared::Role;
use serde_json::{json, Value};

/// Endpoints with an inline fallback response
pub const INLINE_ENDPOINTS: [&str; 3] = ["auth/login", "auth/forgot-password", "reports/campaigns"];

/// Which keyed sub-response to pick out of a fixture's `success` object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantCriteria {
    pub key: String,
    pub fallback: Option<String>,
}

impl VariantCriteria {
    /// Role-keyed variant, falling back to the admin variant
    pub fn role(role: Role) -> Self {
        Self {
            key: role.as_str().to_string(),
            fallback: Some(Role::Admin.as_str().to_string()),
        }
    }

    /// Identifier-keyed variant with no fallback
    pub fn identifier(identifier: impl Into<String>) -> Self {
        Self {
            key: identifier.into(),
            fallback: None,
        }
    }
}

pub fn is_login_endpoint(endpoint: &str) -> bool {
    endpoint == "auth/login" || endpoint.ends_with("/login")
}

/// Role implied by login credentials.
///
/// An explicit `role` field is the starting point (admin when absent or
/// unrecognised); an email mentioning `campaign` selects the campaign
/// manager, one mentioning `analyst` or `reports` the reports-only role.
pub fn infer_role(credentials: Option<&Value>) -> Role {
    let explicit = credentials
        .and_then(|c| c.get("role"))
        .and_then(Value::as_str)
        .and_then(|r| r.parse::<Role>().ok())
        .unwrap_or(Role::Admin);

    let email = credentials
        .and_then(|c| c.get("email"))
        .and_then(Value::as_str)
        .map(str::to_lowercase)
        .unwrap_or_default();

    if email.contains("campaign") {
        Role::CampaignManager
    } else if email.contains("analyst") || email.contains("reports") {
        Role::ReportsOnly
    } else {
        explicit
    }
}

/// Variant selection criteria for a request, if the endpoint has keyed fixtures
pub fn criteria_for(endpoint: &str, payload: Option<&Value>) -> Option<VariantCriteria> {
    if is_login_endpoint(endpoint) {
        return Some(VariantCriteria::role(infer_role(payload)));
    }

    payload
        .and_then(|p| p.get("identifier"))
        .and_then(Value::as_str)
        .map(VariantCriteria::identifier)
}

/// Replace `success` with the keyed variant when one matches; otherwise the
/// data is returned unchanged
pub fn select_variant(data: &Value, criteria: &VariantCriteria) -> Value {
    let Some(success) = data.get("success").and_then(Value::as_object) else {
        return data.clone();
    };

    let variant = success.get(&criteria.key).or_else(|| {
        criteria
            .fallback
            .as_ref()
            .and_then(|fallback| success.get(fallback))
    });

    match variant {
        Some(variant) if variant.is_object() => {
            let mut selected = data.clone();
            selected["success"] = variant.clone();
            selected
        }
        _ => data.clone(),
    }
}

/// Unwrap a resolved fixture into the caller-visible payload.
///
/// With `should_fail` and an `error` entry the request is rejected with that
/// entry's message. Otherwise the `success` entry is returned when present,
/// else the whole object.
pub fn finalize_response(data: Value, should_fail: bool) -> Result<Value> {
    if should_fail {
        if let Some(error) = data.get("error").filter(|e| !e.is_null()) {
            return Err(MockApiError::Rejected(error_message(error)));
        }
    }

    match data {
        Value::Object(mut map) => match map.remove("success") {
            Some(success) if !success.is_null() => Ok(success),
            Some(success) => {
                map.insert("success".to_string(), success);
                Ok(Value::Object(map))
            }
            None => Ok(Value::Object(map)),
        },
        other => Ok(other),
    }
}

fn error_message(error: &Value) -> String {
    match error {
        Value::String(message) => message.clone(),
        _ => error
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string()),
    }
}

/// Inline response keyed by endpoint id
pub fn inline_response(endpoint: &str) -> Option<Value> {
    let value = match endpoint {
        "auth/login" => json!({
            "success": {
                "admin": {
                    "token": "admin-jwt-token-123",
                    "user": {
                        "id": 1,
                        "name": "John Doe",
                        "email": "admin@boosttrade.com",
                        "role": "admin",
                        "permissions": [
                            "admin.users.manage", "admin.roles.manage", "admin.placements.manage",
                            "admin.conditions.manage", "campaigns.create", "campaigns.edit",
                            "campaigns.delete", "campaigns.publish", "campaigns.preview",
                            "stores.manage", "stores.health", "reports.view_all", "reports.export"
                        ]
                    }
                },
                "campaign_manager": {
                    "token": "campaign-jwt-token-456",
                    "user": {
                        "id": 2,
                        "name": "Alice Johnson",
                        "email": "campaign@boosttrade.com",
                        "role": "campaign_manager",
                        "permissions": [
                            "campaigns.create", "campaigns.edit", "campaigns.publish",
                            "campaigns.preview", "stores.view", "reports.view_campaigns"
                        ]
                    }
                },
                "reports_only": {
                    "token": "reports-jwt-token-789",
                    "user": {
                        "id": 3,
                        "name": "Bob Smith",
                        "email": "analyst@boosttrade.com",
                        "role": "reports_only",
                        "permissions": ["reports.view_all", "reports.export", "dashboard.view"]
                    }
                }
            },
            "error": { "message": "Invalid credentials" }
        }),
        "auth/forgot-password" => json!({
            "success": { "message": "Password reset email sent successfully" },
            "error": { "message": "Email not found" }
        }),
        "reports/campaigns" => json!({
            "success": {
                "overview": {
                    "totalRevenue": "$2,847,392",
                    "totalCampaigns": 24,
                    "activeUsers": 1247,
                    "conversionRate": 3.2
                },
                "chartData": {
                    "performance": [
                        { "month": "Jan", "impressions": 120000, "conversions": 1250, "revenue": 145000 },
                        { "month": "Feb", "impressions": 145000, "conversions": 1680, "revenue": 189000 },
                        { "month": "Mar", "impressions": 189000, "conversions": 2150, "revenue": 234000 },
                        { "month": "Apr", "impressions": 203000, "conversions": 2890, "revenue": 287000 },
                        { "month": "May", "impressions": 245000, "conversions": 3250, "revenue": 312000 },
                        { "month": "Jun", "impressions": 287000, "conversions": 3780, "revenue": 356000 }
                    ],
                    "categories": [
                        { "name": "Beauty", "value": 35, "color": "#3b82f6" },
                        { "name": "Personnel Care", "value": 28, "color": "#10b981" },
                        { "name": "Grocery", "value": 18, "color": "#f59e0b" },
                        { "name": "Baby&Kids", "value": 12, "color": "#ef4444" },
                        { "name": "Photo", "value": 7, "color": "#8b5cf6" }
                    ]
                }
            },
            "error": { "message": "Failed to load campaign reports" }
        }),
        _ => return None,
    };

    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_infer_role_from_email() {
        let role = |payload: Value| infer_role(Some(&payload));

        assert_eq!(role(json!({ "email": "campaign@x.com" })), Role::CampaignManager);
        assert_eq!(role(json!({ "email": "Analyst@x.com" })), Role::ReportsOnly);
        assert_eq!(role(json!({ "email": "reports@x.com" })), Role::ReportsOnly);
        assert_eq!(role(json!({ "email": "someone@x.com" })), Role::Admin);
        assert_eq!(
            role(json!({ "email": "someone@x.com", "role": "pos_admin" })),
            Role::PosAdmin
        );
        // email inference wins over an explicit role
        assert_eq!(
            role(json!({ "email": "campaign@x.com", "role": "reports_only" })),
            Role::CampaignManager
        );
        assert_eq!(infer_role(None), Role::Admin);
    }

    #[test]
    fn test_criteria_for() {
        assert_eq!(
            criteria_for("auth/login", Some(&json!({ "email": "campaign@x.com" }))),
            Some(VariantCriteria::role(Role::CampaignManager))
        );
        assert_eq!(
            criteria_for("stores/list", Some(&json!({ "identifier": "staging" }))),
            Some(VariantCriteria::identifier("staging"))
        );
        assert_eq!(criteria_for("stores/list", Some(&json!({ "page": 1 }))), None);
        assert_eq!(criteria_for("stores/list", None), None);
    }

    #[test]
    fn test_select_role_variant() {
        let data = inline_response("auth/login").unwrap();
        let selected = select_variant(&data, &VariantCriteria::role(Role::ReportsOnly));

        assert_eq!(selected["success"]["user"]["role"], "reports_only");
        assert_eq!(selected["error"]["message"], "Invalid credentials");
    }

    #[test]
    fn test_select_variant_falls_back_to_admin() {
        let data = inline_response("auth/login").unwrap();
        let selected = select_variant(&data, &VariantCriteria::role(Role::PosAdmin));
        assert_eq!(selected["success"]["user"]["role"], "admin");
    }

    #[test]
    fn test_select_variant_leaves_flat_data_alone() {
        let data = json!({ "success": { "token": "t", "user": { "id": 9 } } });
        assert_eq!(select_variant(&data, &VariantCriteria::role(Role::Admin)), data);

        let no_envelope = json!([1, 2, 3]);
        assert_eq!(
            select_variant(&no_envelope, &VariantCriteria::identifier("x")),
            no_envelope
        );
    }

    #[test]
    fn test_finalize_unwraps_success() {
        let data = json!({ "success": { "ok": true }, "error": { "message": "nope" } });
        assert_eq!(finalize_response(data, false).unwrap(), json!({ "ok": true }));

        let flat = json!({ "campaigns": [] });
        assert_eq!(finalize_response(flat.clone(), false).unwrap(), flat);
    }

    #[test]
    fn test_finalize_rejects_with_fixture_message() {
        let data = json!({ "success": {}, "error": { "message": "Invalid credentials" } });
        let error = finalize_response(data, true).unwrap_err();
        assert_eq!(error.to_string(), "Invalid credentials");

        let bare = json!({ "error": "Quota exceeded" });
        assert_eq!(
            finalize_response(bare, true).unwrap_err().to_string(),
            "Quota exceeded"
        );
    }

    #[test]
    fn test_finalize_should_fail_without_error_succeeds() {
        let data = json!({ "success": { "ok": true } });
        assert_eq!(finalize_response(data, true).unwrap(), json!({ "ok": true }));
    }

    #[test]
    fn test_inline_table() {
        for endpoint in INLINE_ENDPOINTS {
            assert!(inline_response(endpoint).is_some(), "{}", endpoint);
        }
        assert!(inline_response("campaigns/list").is_none());
    }
}
