use axum::{body::Bytes, extract::State, http::HeaderMap};
use serde::Serialize;
use serde_json::json;

use crate::api::RequestFields;
use crate::database::models::preferences::{
    DisplayPreferences, NotificationPreferences, PrivacyPreferences, PREFERENCES_VERSION,
};
use crate::database::models::{AuditAction, AuditEntry, Preferences};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, RequestContext};
use crate::state::AppState;

use super::utils::{guarded_fields, record_audit};

#[derive(Debug, Serialize)]
pub struct PreferencesPayload {
    pub preferences: Preferences,
}

/// GET /api/profile/preferences - stored preferences, or defaults if none saved
pub async fn show(State(state): State<AppState>, ctx: RequestContext) -> ApiResult<PreferencesPayload> {
    let preferences = state
        .preferences
        .find(ctx.user_id())
        .await
        .map_err(|e| ApiError::storage(e, "Failed to load preferences"))?
        .unwrap_or_default();

    Ok(ApiResponse::success(PreferencesPayload { preferences }))
}

/// POST /api/profile/preferences - replace the whole preferences document
pub async fn update(
    State(state): State<AppState>,
    ctx: RequestContext,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<()> {
    let fields = guarded_fields(&ctx, &headers, &body)?;
    let preferences = preferences_from_fields(&fields);

    state
        .preferences
        .upsert(ctx.user_id(), &preferences)
        .await
        .map_err(|e| ApiError::storage(e, "Failed to save preferences"))?;

    record_audit(
        &state,
        &ctx,
        AuditEntry::new(ctx.user_id(), AuditAction::PreferencesUpdate, "user_preferences")
            .record(ctx.user_id())
            .metadata(json!({ "version": preferences.version })),
    )
    .await;

    tracing::info!(user_id = %ctx.user_id(), "Preferences saved");

    Ok(ApiResponse::message("Preferences saved successfully"))
}

/// Absent flags are off; unknown display values fall back to defaults
pub fn preferences_from_fields(fields: &RequestFields) -> Preferences {
    Preferences {
        version: PREFERENCES_VERSION,
        notifications: NotificationPreferences {
            email_notifications: fields.flag("email_notifications"),
            sms_notifications: fields.flag("sms_notifications"),
            push_notifications: fields.flag("push_notifications"),
            listing_alerts: fields.flag("listing_alerts"),
            price_alerts: fields.flag("price_alerts"),
            inquiry_alerts: fields.flag("inquiry_alerts"),
            marketing_emails: fields.flag("marketing_emails"),
        },
        display: DisplayPreferences::new(
            fields.text("area_unit").as_deref(),
            fields.text("currency").as_deref(),
        ),
        privacy: PrivacyPreferences {
            show_profile_public: fields.flag("show_profile_public"),
            show_contact_info: fields.flag("show_contact_info"),
            show_listings: fields.flag("show_listings"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_full_document_from_sparse_fields() {
        let fields = RequestFields::from_json(
            br#"{"email_notifications": "on", "price_alerts": 1, "show_listings": true, "currency": "usd", "area_unit": "furlong"}"#,
        );
        let prefs = preferences_from_fields(&fields);

        assert!(prefs.notifications.email_notifications);
        assert!(prefs.notifications.price_alerts);
        assert!(!prefs.notifications.sms_notifications);
        assert!(prefs.privacy.show_listings);
        assert!(!prefs.privacy.show_profile_public);
        assert_eq!(prefs.display.currency, "USD");
        assert_eq!(prefs.display.area_unit, "sqm");
        assert_eq!(prefs.version, PREFERENCES_VERSION);
    }

    #[test]
    fn empty_submission_turns_everything_off() {
        let prefs = preferences_from_fields(&RequestFields::default());
        assert_eq!(prefs, Preferences::default());
    }
}
