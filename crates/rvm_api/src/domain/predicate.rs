//! Query parameters to device predicates.
//!
//! Recognized parameters:
//!
//! | name       | predicate                                          |
//! |------------|----------------------------------------------------|
//! | `loc`      | location contains the value, case-insensitively    |
//! | `location` | location equals the value exactly                  |
//! | `recent`   | when truthy, last used within the last 24 hours    |
//!
//! Anything else is ignored, and a value that cannot be understood switches
//! its predicate off. Building a query never fails.

use chrono::{DateTime, Duration, Utc};
use common::domain::Device;

pub const LOCATION_CONTAINS_PARAM: &str = "loc";
pub const LOCATION_EQUALS_PARAM: &str = "location";
pub const RECENT_PARAM: &str = "recent";

/// How far back `recent=true` reaches from the reference time
pub fn recent_window() -> Duration {
    Duration::hours(24)
}

/// A single filter over a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DevicePredicate {
    /// Case-insensitive substring match on location; holds the case-folded needle
    LocationContains(String),
    /// Case-sensitive equality on location
    LocationEquals(String),
    /// Used at or after `reference_time - window`; never-used devices fail
    UsedWithin(Duration),
}

impl DevicePredicate {
    pub fn matches(&self, device: &Device, reference_time: DateTime<Utc>) -> bool {
        match self {
            DevicePredicate::LocationContains(needle) => {
                device.location.to_lowercase().contains(needle.as_str())
            }
            DevicePredicate::LocationEquals(location) => device.location == *location,
            DevicePredicate::UsedWithin(window) => {
                // A window reaching past the earliest representable instant has no lower bound
                match reference_time.checked_sub_signed(*window) {
                    Some(cutoff) => device.last_usage.is_some_and(|used| used >= cutoff),
                    None => device.last_usage.is_some(),
                }
            }
        }
    }
}

/// Permissive boolean: `1` and `true` in any casing are truthy, everything
/// else is falsy
pub fn parse_flag(value: &str) -> bool {
    let value = value.to_ascii_lowercase();
    value == "1" || value == "true"
}

/// Conjunction of predicates built from untrusted query parameters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceQuery {
    predicates: Vec<DevicePredicate>,
}

impl DeviceQuery {
    /// Query with no predicates; every active device passes
    pub fn all() -> Self {
        Self::default()
    }

    /// Build a query from name/value pairs
    ///
    /// When a name repeats, the last value wins. Values for `loc` and
    /// `location` are trimmed, and a blank value counts as "not supplied".
    pub fn from_params<I, K, V>(params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut location_contains = None;
        let mut location_equals = None;
        let mut recent = false;

        for (name, value) in params {
            let value = value.as_ref();
            match name.as_ref() {
                LOCATION_CONTAINS_PARAM => location_contains = non_empty(value),
                LOCATION_EQUALS_PARAM => location_equals = non_empty(value),
                RECENT_PARAM => recent = parse_flag(value),
                _ => {}
            }
        }

        let mut predicates = Vec::new();
        if let Some(needle) = location_contains {
            predicates.push(DevicePredicate::LocationContains(needle.to_lowercase()));
        }
        if let Some(location) = location_equals {
            predicates.push(DevicePredicate::LocationEquals(location));
        }
        if recent {
            predicates.push(DevicePredicate::UsedWithin(recent_window()));
        }

        Self { predicates }
    }

    pub fn predicates(&self) -> &[DevicePredicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// True when every predicate holds
    pub fn matches(&self, device: &Device, reference_time: DateTime<Utc>) -> bool {
        self.predicates
            .iter()
            .all(|predicate| predicate.matches(device, reference_time))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use common::domain::NewDevice;

    fn reference_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn device_at(location: &str, last_usage: Option<DateTime<Utc>>) -> Device {
        NewDevice::new("rvm")
            .with_location(location)
            .with_last_usage(last_usage)
            .into_device(1)
    }

    #[test]
    fn test_parse_flag() {
        for truthy in ["1", "true", "True", "TRUE", "tRuE"] {
            assert!(parse_flag(truthy), "{truthy} should be truthy");
        }
        for falsy in ["", "0", "false", "yes", "on", "t", " true", "2"] {
            assert!(!parse_flag(falsy), "{falsy:?} should be falsy");
        }
    }

    #[test]
    fn test_unknown_params_are_ignored() {
        let query = DeviceQuery::from_params([("foo", "bar"), ("ordering", "name")]);
        assert!(query.is_empty());
        assert_eq!(query, DeviceQuery::all());
    }

    #[test]
    fn test_builds_predicates_in_fixed_order() {
        let query =
            DeviceQuery::from_params([("recent", "1"), ("location", "Cairo"), ("loc", "CAI")]);

        assert_eq!(
            query.predicates(),
            &[
                DevicePredicate::LocationContains("cai".to_string()),
                DevicePredicate::LocationEquals("Cairo".to_string()),
                DevicePredicate::UsedWithin(Duration::hours(24)),
            ]
        );
    }

    #[test]
    fn test_last_value_wins_for_repeated_params() {
        let query = DeviceQuery::from_params([("loc", "giza"), ("loc", "alex")]);
        assert_eq!(
            query.predicates(),
            &[DevicePredicate::LocationContains("alex".to_string())]
        );

        let query = DeviceQuery::from_params([("recent", "true"), ("recent", "nope")]);
        assert!(query.is_empty());
    }

    #[test]
    fn test_empty_location_values_are_not_applied() {
        let query = DeviceQuery::from_params([("loc", ""), ("location", "")]);
        assert!(query.is_empty());
    }

    #[test]
    fn test_location_values_are_trimmed() {
        let query = DeviceQuery::from_params([("loc", " Cai "), ("location", "\tCairo ")]);
        assert_eq!(
            query.predicates(),
            &[
                DevicePredicate::LocationContains("cai".to_string()),
                DevicePredicate::LocationEquals("Cairo".to_string()),
            ]
        );

        let query = DeviceQuery::from_params([("loc", "  "), ("location", " ")]);
        assert!(query.is_empty());
    }

    #[test]
    fn test_malformed_recent_switches_filter_off() {
        let query = DeviceQuery::from_params([("recent", "maybe")]);
        assert!(query.is_empty());
    }

    #[test]
    fn test_location_contains_is_case_insensitive() {
        let device = device_at("Alexandria", None);

        for needle in ["alex", "ALEX", "xAnDr", "Alexandria", "a"] {
            let query = DeviceQuery::from_params([("loc", needle)]);
            assert!(query.matches(&device, reference_time()), "{needle}");
        }

        let query = DeviceQuery::from_params([("loc", "cairo")]);
        assert!(!query.matches(&device, reference_time()));
    }

    #[test]
    fn test_location_equals_is_case_sensitive() {
        let device = device_at("Cairo", None);

        assert!(DeviceQuery::from_params([("location", "Cairo")]).matches(&device, reference_time()));
        assert!(!DeviceQuery::from_params([("location", "cairo")]).matches(&device, reference_time()));
        assert!(!DeviceQuery::from_params([("location", "Cai")]).matches(&device, reference_time()));
    }

    #[test]
    fn test_recent_boundary() {
        let now = reference_time();
        let query = DeviceQuery::from_params([("recent", "true")]);
        let window = Duration::hours(24);

        let just_outside = device_at("Cairo", Some(now - window - Duration::seconds(1)));
        let exactly_at_cutoff = device_at("Cairo", Some(now - window));
        let just_inside = device_at("Cairo", Some(now - window + Duration::seconds(1)));
        let never_used = device_at("Cairo", None);

        assert!(!query.matches(&just_outside, now));
        assert!(query.matches(&exactly_at_cutoff, now));
        assert!(query.matches(&just_inside, now));
        assert!(!query.matches(&never_used, now));
    }

    #[test]
    fn test_recent_near_earliest_instant_does_not_overflow() {
        let earliest = DateTime::<Utc>::MIN_UTC;
        let query = DeviceQuery::from_params([("recent", "true")]);

        assert!(query.matches(&device_at("Cairo", Some(earliest)), earliest));
        assert!(!query.matches(&device_at("Cairo", None), earliest));
    }

    #[test]
    fn test_recent_off_lets_never_used_devices_through() {
        let device = device_at("Cairo", None);

        for value in ["false", "0", ""] {
            let query = DeviceQuery::from_params([("recent", value)]);
            assert!(query.matches(&device, reference_time()));
        }
    }

    #[test]
    fn test_predicates_combine_conjunctively() {
        let now = reference_time();
        let query = DeviceQuery::from_params([("loc", "cai"), ("recent", "1")]);

        assert!(query.matches(&device_at("Cairo", Some(now - Duration::hours(1))), now));
        assert!(!query.matches(&device_at("Cairo", Some(now - Duration::hours(30))), now));
        assert!(!query.matches(&device_at("Giza", Some(now - Duration::hours(1))), now));
    }
}
