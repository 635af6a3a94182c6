//! Shared business state threaded through a conversation.

use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const CONFIRMATION_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Context visible to every airline agent, tool and hook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirlineAgentContext {
    pub passenger_name: Option<String>,
    pub confirmation_number: Option<String>,
    pub seat_number: Option<String>,
    pub flight_number: Option<String>,
    /// Account number associated with the customer
    pub account_number: Option<String>,
}

impl AirlineAgentContext {
    /// Fresh context with a generated 8-digit account number.
    pub fn new() -> Self {
        let account = rand::rng().random_range(10_000_000..=99_999_999u32);
        Self {
            account_number: Some(account.to_string()),
            ..Self::default()
        }
    }

    /// JSON object form used in responses and diffs.
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }

    /// Fields whose value differs from `before`, mapped to their new value.
    pub fn changed_fields(&self, before: &AirlineAgentContext) -> Map<String, Value> {
        let fields = [
            ("passenger_name", &before.passenger_name, &self.passenger_name),
            (
                "confirmation_number",
                &before.confirmation_number,
                &self.confirmation_number,
            ),
            ("seat_number", &before.seat_number, &self.seat_number),
            ("flight_number", &before.flight_number, &self.flight_number),
            ("account_number", &before.account_number, &self.account_number),
        ];

        fields
            .into_iter()
            .filter(|(_, old, new)| old != new)
            .map(|(key, _, new)| {
                let value = new.clone().map(Value::String).unwrap_or(Value::Null);
                (key.to_string(), value)
            })
            .collect()
    }
}

/// Random `FLT-100`..`FLT-999` flight number.
pub fn random_flight_number() -> String {
    format!("FLT-{}", rand::rng().random_range(100..=999))
}

/// Random 6-character `[A-Z0-9]` confirmation number.
pub fn random_confirmation_number() -> String {
    let mut rng = rand::rng();
    (0..6)
        .map(|_| CONFIRMATION_ALPHABET[rng.random_range(0..CONFIRMATION_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_has_eight_digit_account() {
        let ctx = AirlineAgentContext::new();
        let account = ctx.account_number.unwrap();
        assert_eq!(account.len(), 8);
        assert!(account.chars().all(|c| c.is_ascii_digit()));
        assert!(ctx.flight_number.is_none());
    }

    #[test]
    fn test_changed_fields_reports_only_differences() {
        let before = AirlineAgentContext::new();
        let mut after = before.clone();
        after.seat_number = Some("14C".to_string());

        let changes = after.changed_fields(&before);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["seat_number"], "14C");
    }

    #[test]
    fn test_changed_fields_reports_cleared_as_null() {
        let mut before = AirlineAgentContext::default();
        before.flight_number = Some("FLT-123".to_string());
        let after = AirlineAgentContext::default();

        let changes = after.changed_fields(&before);
        assert_eq!(changes["flight_number"], Value::Null);
    }

    #[test]
    fn test_identical_contexts_have_no_changes() {
        let ctx = AirlineAgentContext::new();
        assert!(ctx.changed_fields(&ctx.clone()).is_empty());
    }

    #[test]
    fn test_random_identifiers_have_expected_shape() {
        let flight = random_flight_number();
        assert!(flight.starts_with("FLT-"));
        let digits: u32 = flight[4..].parse().unwrap();
        assert!((100..=999).contains(&digits));

        let confirmation = random_confirmation_number();
        assert_eq!(confirmation.len(), 6);
        assert!(confirmation
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
