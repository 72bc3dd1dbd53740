use serde::{Deserialize, Serialize};

/// Current layout of the stored preferences document
pub const PREFERENCES_VERSION: u32 = 1;

pub const AREA_UNITS: &[&str] = &["sqm", "hectare", "acre", "sqft"];
pub const CURRENCIES: &[&str] = &["PHP", "USD", "EUR", "JPY", "SGD", "AUD"];

const DEFAULT_AREA_UNIT: &str = "sqm";
const DEFAULT_CURRENCY: &str = "PHP";

/// Per-user preferences, stored as one JSONB document keyed by user id.
///
/// Every field has a default so older or partial documents still decode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub version: u32,
    pub notifications: NotificationPreferences,
    pub display: DisplayPreferences,
    pub privacy: PrivacyPreferences,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationPreferences {
    pub email_notifications: bool,
    pub sms_notifications: bool,
    pub push_notifications: bool,
    pub listing_alerts: bool,
    pub price_alerts: bool,
    pub inquiry_alerts: bool,
    pub marketing_emails: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayPreferences {
    pub area_unit: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivacyPreferences {
    pub show_profile_public: bool,
    pub show_contact_info: bool,
    pub show_listings: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: PREFERENCES_VERSION,
            notifications: NotificationPreferences::default(),
            display: DisplayPreferences::default(),
            privacy: PrivacyPreferences::default(),
        }
    }
}

impl Default for DisplayPreferences {
    fn default() -> Self {
        Self {
            area_unit: DEFAULT_AREA_UNIT.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl DisplayPreferences {
    /// Unknown units and currencies fall back to the defaults
    pub fn new(area_unit: Option<&str>, currency: Option<&str>) -> Self {
        let area_unit = area_unit
            .map(|u| u.trim().to_ascii_lowercase())
            .filter(|u| AREA_UNITS.contains(&u.as_str()))
            .unwrap_or_else(|| DEFAULT_AREA_UNIT.to_string());
        let currency = currency
            .map(|c| c.trim().to_ascii_uppercase())
            .filter(|c| CURRENCIES.contains(&c.as_str()))
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string());
        Self { area_unit, currency }
    }
}
