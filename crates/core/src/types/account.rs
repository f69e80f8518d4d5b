//! Admin accounts and the sessions the store keeps for them.
//!
//! # Security
//!
//! Sessions follow a trust-the-store model: any record marked active is
//! accepted as a signed-in admin, with no signature and no expiry. Admin
//! accounts are matched by plaintext email/password query. Both are kept as-is
//! for compatibility with existing stores and should not be exposed beyond a
//! trusted network.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::{AdminId, SessionId};

/// An admin account as returned by the admin-accounts resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminAccount {
    pub id: AdminId,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

impl AdminAccount {
    /// Name shown in the workspace header: the account name, or the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.email)
    }
}

/// A persisted admin session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminSession {
    pub id: SessionId,
    #[serde(default)]
    pub admin_id: Option<AdminId>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub admin_name: Option<String>,
    /// Missing means active. `"false"` and `0` read as `Some(false)`; values
    /// that are not a flag at all read as missing.
    #[serde(default, deserialize_with = "lenient_active")]
    pub is_active: Option<bool>,
    /// `None` when missing or unparseable; such sessions sort as oldest.
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl AdminSession {
    /// Whether the session counts as signed in. Only an explicit `false` is inactive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.is_active != Some(false)
    }

    /// Display name for the session: `adminName`, falling back to `email`.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.admin_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.email.as_deref().filter(|e| !e.is_empty()))
    }

    /// Pick the most recently created active session.
    ///
    /// On equal timestamps the session listed first wins.
    #[must_use]
    pub fn latest_active(sessions: &[Self]) -> Option<&Self> {
        sessions
            .iter()
            .filter(|s| s.is_active())
            .reduce(|best, s| if s.created_at > best.created_at { s } else { best })
    }
}

/// Body sent to the sessions resource on login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub admin_id: AdminId,
    pub email: String,
    pub admin_name: String,
    pub is_active: bool,
    /// ISO-8601 with millisecond precision.
    pub created_at: String,
}

impl NewSession {
    /// Build an active session record for `account`, stamped with `now`.
    #[must_use]
    pub fn for_account(account: &AdminAccount, now: DateTime<Utc>) -> Self {
        Self {
            admin_id: account.id.clone(),
            email: account.email.clone(),
            admin_name: account.display_name().to_owned(),
            is_active: true,
            created_at: now.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

fn lenient_active<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Some(serde_json::Value::Number(n)) => n.as_f64().map(|n| n != 0.0),
        _ => None,
    })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sessions(value: serde_json::Value) -> Vec<AdminSession> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_latest_active_picks_newest() {
        let list = sessions(json!([
            {"id": 1, "adminName": "Ada", "isActive": true, "createdAt": "2024-03-01T10:00:00.000Z"},
            {"id": 2, "adminName": "Bo", "isActive": true, "createdAt": "2024-03-02T10:00:00.000Z"},
            {"id": 3, "adminName": "Cy", "isActive": true, "createdAt": "2024-02-01T10:00:00.000Z"}
        ]));
        let latest = AdminSession::latest_active(&list).unwrap();
        assert_eq!(latest.id, SessionId::new(2));
    }

    #[test]
    fn test_latest_active_skips_inactive() {
        let list = sessions(json!([
            {"id": 1, "isActive": true, "createdAt": "2024-03-01T10:00:00Z"},
            {"id": 2, "isActive": false, "createdAt": "2024-03-05T10:00:00Z"}
        ]));
        assert_eq!(
            AdminSession::latest_active(&list).unwrap().id,
            SessionId::new(1)
        );
    }

    #[test]
    fn test_missing_active_flag_counts_as_active() {
        let list = sessions(json!([{"id": "s1", "email": "ops@example.com"}]));
        let latest = AdminSession::latest_active(&list).unwrap();
        assert_eq!(latest.display_name(), Some("ops@example.com"));
    }

    #[test]
    fn test_unparseable_timestamp_sorts_oldest() {
        let list = sessions(json!([
            {"id": 1, "createdAt": "yesterday-ish"},
            {"id": 2, "createdAt": "2020-01-01"}
        ]));
        assert!(list[0].created_at.is_none());
        assert_eq!(
            AdminSession::latest_active(&list).unwrap().id,
            SessionId::new(2)
        );
    }

    #[test]
    fn test_active_flag_as_text_or_number() {
        let list = sessions(json!([
            {"id": 1, "isActive": "false", "createdAt": "2024-03-09T10:00:00Z"},
            {"id": 2, "isActive": 0, "createdAt": "2024-03-08T10:00:00Z"},
            {"id": 3, "isActive": "TRUE", "createdAt": "2024-03-01T10:00:00Z"},
            {"id": 4, "isActive": "maybe", "createdAt": "2024-02-01T10:00:00Z"}
        ]));
        assert_eq!(list[0].is_active, Some(false));
        assert_eq!(list[1].is_active, Some(false));
        assert_eq!(list[3].is_active, None);
        assert_eq!(
            AdminSession::latest_active(&list).unwrap().id,
            SessionId::new(3)
        );
    }

    #[test]
    fn test_latest_active_none_when_all_inactive() {
        let list = sessions(json!([{"id": 1, "isActive": false}]));
        assert!(AdminSession::latest_active(&list).is_none());
        assert!(AdminSession::latest_active(&[]).is_none());
    }

    #[test]
    fn test_new_session_for_account() {
        let account = AdminAccount {
            id: AdminId::new(4),
            email: "ops@example.com".to_string(),
            name: None,
        };
        let now = DateTime::parse_from_rfc3339("2024-05-06T07:08:09.123Z")
            .unwrap()
            .with_timezone(&Utc);

        let session = NewSession::for_account(&account, now);
        let value = serde_json::to_value(&session).unwrap();
        assert_eq!(
            value,
            json!({
                "adminId": 4,
                "email": "ops@example.com",
                "adminName": "ops@example.com",
                "isActive": true,
                "createdAt": "2024-05-06T07:08:09.123Z"
            })
        );
    }
}
