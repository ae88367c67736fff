//! Ordered field-resolution helpers
//!
//! Upstream feeds and controller payloads spell the same logical field in
//! several ways. Each resolver walks an explicit, ordered key list and
//! returns the first usable value; blank strings never count as present.

use chrono::NaiveDate;
use serde_json::Value;

use crate::traits::RawReservation;
use crate::types::EMAIL_NOT_PROVIDED;

/// Resolve the guest email from a raw reservation.
///
/// Resolution order: `guestEmail`, `email`, `contactEmail`,
/// `guestContactEmail`, then the "not provided" sentinel. Whitespace-only
/// values are treated as absent so an empty string can never pass as a
/// valid address.
pub fn resolve_guest_email(raw: &RawReservation) -> String {
    [
        raw.guest_email.as_deref(),
        raw.email.as_deref(),
        raw.contact_email.as_deref(),
        raw.guest_contact_email.as_deref(),
    ]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|value| !value.is_empty())
    .map(ToOwned::to_owned)
    .unwrap_or_else(|| EMAIL_NOT_PROVIDED.to_string())
}

/// Resolve a string field from a payload, trying each key in order.
pub fn resolve_str(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| payload.get(key))
        .filter_map(Value::as_str)
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

/// Resolve a `YYYY-MM-DD` date field from a payload.
pub fn resolve_date(payload: &Value, keys: &[&str]) -> Option<NaiveDate> {
    resolve_str(payload, keys)
        .and_then(|value| NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok())
}

/// Resolve a non-negative count field from a payload.
///
/// Accepts JSON numbers and numeric strings, which some controller clients
/// send interchangeably.
pub fn resolve_count(payload: &Value, keys: &[&str]) -> Option<u32> {
    keys.iter().filter_map(|key| payload.get(key)).find_map(|value| match value {
        Value::Number(number) => number.as_u64().map(|n| n as u32),
        Value::String(text) => text.trim().parse::<u32>().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_chain_order() {
        let raw = RawReservation {
            email: Some("legacy@example.com".to_string()),
            guest_email: Some("primary@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_guest_email(&raw), "primary@example.com");

        let raw = RawReservation {
            contact_email: Some("channel@example.com".to_string()),
            ..Default::default()
        };
        assert_eq!(resolve_guest_email(&raw), "channel@example.com");
    }

    #[test]
    fn test_email_blank_values_fall_through_to_sentinel() {
        let raw = RawReservation {
            guest_email: Some("   ".to_string()),
            email: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(resolve_guest_email(&raw), EMAIL_NOT_PROVIDED);
    }

    #[test]
    fn test_resolve_str_ordered() {
        let payload = json!({"guest_name": "Maria", "name": "ignored"});
        assert_eq!(
            resolve_str(&payload, &["guestName", "guest_name", "name"]),
            Some("Maria".to_string())
        );
        assert_eq!(resolve_str(&payload, &["missing"]), None);
    }

    #[test]
    fn test_resolve_date() {
        let payload = json!({"checkIn": "2025-07-10", "checkOut": "not-a-date"});
        assert_eq!(
            resolve_date(&payload, &["checkIn"]),
            NaiveDate::from_ymd_opt(2025, 7, 10)
        );
        assert_eq!(resolve_date(&payload, &["checkOut"]), None);
    }

    #[test]
    fn test_resolve_count_accepts_numbers_and_strings() {
        let payload = json!({"adults": 2, "children": "1"});
        assert_eq!(resolve_count(&payload, &["adults"]), Some(2));
        assert_eq!(resolve_count(&payload, &["children"]), Some(1));
        assert_eq!(resolve_count(&payload, &["pets"]), None);
    }
}
