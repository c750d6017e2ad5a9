//! Category filter for victim records: target region OR target industry.

use threatwire_common::RawVictim;

/// A victim matches when its country code (case-insensitive) is in the
/// target set, or its raw activity label contains the target activity
/// substring (case-sensitive). OR, not AND.
pub fn matches_target(victim: &RawVictim, countries: &[String], activity: &str) -> bool {
    let country = victim.country.to_uppercase();
    countries.iter().any(|c| *c == country) || victim.activity.contains(activity)
}

pub fn filter_victims(
    victims: Vec<RawVictim>,
    countries: &[String],
    activity: &str,
) -> Vec<RawVictim> {
    victims
        .into_iter()
        .filter(|v| matches_target(v, countries, activity))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn victim(country: &str, activity: &str) -> RawVictim {
        RawVictim {
            url: "https://example.com/v".to_string(),
            country: country.to_string(),
            activity: activity.to_string(),
            ..Default::default()
        }
    }

    fn targets() -> Vec<String> {
        vec!["CN".to_string(), "HK".to_string(), "MO".to_string()]
    }

    #[test]
    fn or_semantics() {
        // Matching activity alone is enough
        assert!(matches_target(
            &victim("US", "Financial Services"),
            &targets(),
            "Financial Services"
        ));
        // Matching country alone is enough
        assert!(matches_target(
            &victim("CN", "Retail"),
            &targets(),
            "Financial Services"
        ));
        // Neither matches
        assert!(!matches_target(
            &victim("US", "Retail"),
            &targets(),
            "Financial Services"
        ));
    }

    #[test]
    fn country_comparison_is_case_insensitive() {
        assert!(matches_target(
            &victim("cn", "Retail"),
            &targets(),
            "Financial Services"
        ));
    }

    #[test]
    fn activity_comparison_is_case_sensitive_containment() {
        // Substring of a longer label still matches
        assert!(matches_target(
            &victim("US", "Banking and Financial Services Group"),
            &targets(),
            "Financial Services"
        ));
        // Different casing does not
        assert!(!matches_target(
            &victim("US", "financial services"),
            &targets(),
            "Financial Services"
        ));
    }

    #[test]
    fn filter_keeps_only_matches() {
        let input = vec![
            victim("CN", "Retail"),
            victim("US", "Retail"),
            victim("DE", "Financial Services"),
        ];
        let kept = filter_victims(input, &targets(), "Financial Services");
        assert_eq!(kept.len(), 2);
    }
}
