//! Property tests for value extraction and cache timing.

use dd_secrets::secrets::{extract_combined, extract_value, ManualClock, SecretCache};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

proptest! {
    #[test]
    fn plain_values_survive_whitespace(value in "[A-Za-z0-9_\\-]{1,64}", pad in "[ \\t\\n]{0,4}") {
        let raw = format!("{}{}{}", pad, value, pad);
        prop_assert_eq!(extract_value(&raw).unwrap(), value);
    }

    #[test]
    fn json_wrapped_values_are_unwrapped(
        field in prop::sample::select(vec!["value", "secret", "key", "DD_API_KEY", "DD_APP_KEY"]),
        value in "[A-Za-z0-9]{1,48}",
    ) {
        let raw = serde_json::json!({ field: value.clone() }).to_string();
        prop_assert_eq!(extract_value(&raw).unwrap(), value);
    }

    #[test]
    fn value_field_wins_over_other_keys(other in "[a-z]{3,12}", value in "[A-Za-z0-9]{1,32}") {
        prop_assume!(!["value", "secret", "key"].contains(&other.as_str()));
        let raw = format!(r#"{{"{}": "ignored", "value": "{}"}}"#, other, value);
        prop_assert_eq!(extract_value(&raw).unwrap(), value);
    }

    #[test]
    fn non_string_fields_are_rejected(number in any::<i64>()) {
        let raw = format!(r#"{{"value": {}}}"#, number);
        prop_assert!(extract_value(&raw).is_err());
    }

    #[test]
    fn combined_secret_round_trips(api in "[A-Za-z0-9]{1,40}", app in "[A-Za-z0-9]{1,40}") {
        let raw = serde_json::json!({ "DD_API_KEY": api.clone(), "app_key": app.clone() })
            .to_string();
        let (got_api, got_app) = extract_combined("/combined", &raw).unwrap();
        prop_assert_eq!(got_api, api);
        prop_assert_eq!(got_app, app);
    }

    #[test]
    fn cache_refresh_window_matches_ttl_and_buffer(
        ttl in 1u64..100_000,
        buffer in 0u64..10_000,
        elapsed in 0u64..200_000,
    ) {
        let clock = ManualClock::new();
        let cache = SecretCache::new(
            Duration::from_secs(ttl),
            Duration::from_secs(buffer),
            Arc::new(clock.clone()),
        );
        cache.set("api", "app");
        clock.advance(Duration::from_secs(elapsed));

        prop_assert_eq!(cache.is_valid(), elapsed < ttl);
        prop_assert_eq!(cache.needs_refresh(), elapsed + buffer >= ttl);
        prop_assert!(cache.is_valid() || cache.needs_refresh());
    }
}
