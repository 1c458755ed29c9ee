//! Keyword intent classification for chat messages.

const GREETING_KEYWORDS: [&str; 3] = ["hi", "hello", "hey"];
const ELIGIBILITY_KEYWORDS: [&str; 10] = [
    "eligible",
    "eligibility",
    "criteria",
    "requirements",
    "verify",
    "check",
    "checking",
    "assess",
    "qualify",
    "suitability",
];
const APPLY_KEYWORDS: [&str; 4] = ["apply", "application", "how to", "steps"];
const INTEREST_KEYWORDS: [&str; 3] = ["interest", "rate", "cost"];
const HELP_KEYWORDS: [&str; 2] = ["help", "guide"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    NameQuery,
    Eligibility,
    Apply,
    Interest,
    Help,
    General,
}

impl Intent {
    /// Greeting and name questions are answered without the guidance context.
    pub fn uses_guidance(self) -> bool {
        !matches!(self, Intent::Greeting | Intent::NameQuery)
    }
}

fn contains_any(haystack: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| haystack.contains(k))
}

/// Classify an English message. Keywords match as substrings of the
/// lower-cased text, checked in priority order.
pub fn classify(message: &str) -> Intent {
    let lower = message.to_lowercase();
    if contains_any(&lower, &GREETING_KEYWORDS) {
        Intent::Greeting
    } else if lower.contains("name") && message.contains('?') {
        Intent::NameQuery
    } else if contains_any(&lower, &ELIGIBILITY_KEYWORDS) {
        Intent::Eligibility
    } else if contains_any(&lower, &APPLY_KEYWORDS) {
        Intent::Apply
    } else if contains_any(&lower, &INTEREST_KEYWORDS) {
        Intent::Interest
    } else if contains_any(&lower, &HELP_KEYWORDS) {
        Intent::Help
    } else {
        Intent::General
    }
}

/// Loan questions that name no eligibility keyword are steered toward an eligibility check.
pub fn rephrase_for_eligibility(message: &str) -> String {
    let lower = message.to_lowercase();
    if !contains_any(&lower, &ELIGIBILITY_KEYWORDS) && lower.contains("loan") {
        let rephrased = format!("{message} Please check eligibility.");
        tracing::debug!("Rephrased query for eligibility: {rephrased}");
        rephrased
    } else {
        message.to_string()
    }
}

/// The name recorded in profile text (`name: X, ...`), if any.
pub fn extract_profile_name(profile: &str) -> Option<String> {
    let (_, rest) = profile.split_once("name:")?;
    let name = rest.split(',').next().unwrap_or_default().trim();
    (!name.is_empty()).then(|| name.to_string())
}

/// Name used to address the user, `there` when unknown.
pub fn profile_name(profile: &str) -> String {
    extract_profile_name(profile).unwrap_or_else(|| "there".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greeting_wins_over_everything() {
        assert_eq!(classify("Hello, am I eligible?"), Intent::Greeting);
        assert_eq!(classify("hey"), Intent::Greeting);
        // substring match: "this" contains "hi"
        assert_eq!(classify("Is this the rate?"), Intent::Greeting);
    }

    #[test]
    fn test_name_query() {
        assert_eq!(classify("What is my name?"), Intent::NameQuery);
        assert_eq!(classify("Tell me my name"), Intent::General);
    }

    #[test]
    fn test_keyword_priority() {
        assert_eq!(classify("Am I eligible for a car loan"), Intent::Eligibility);
        assert_eq!(classify("steps to apply and the rate"), Intent::Apply);
        assert_eq!(classify("What does a car loan cost"), Intent::Interest);
        assert_eq!(classify("Can you guide me"), Intent::Help);
        assert_eq!(classify("Tell me about EMI"), Intent::General);
    }

    #[test]
    fn test_rephrase_adds_eligibility_check() {
        assert_eq!(
            rephrase_for_eligibility("I want a car loan"),
            "I want a car loan Please check eligibility."
        );
        assert_eq!(
            classify(&rephrase_for_eligibility("I want a car loan")),
            Intent::Eligibility
        );
        assert_eq!(
            rephrase_for_eligibility("Am I eligible for a loan"),
            "Am I eligible for a loan"
        );
        assert_eq!(rephrase_for_eligibility("What are the rates"), "What are the rates");
    }

    #[test]
    fn test_profile_name_extraction() {
        assert_eq!(profile_name("name: Asha, email: a@b.c"), "Asha");
        assert_eq!(profile_name("name:  Ravi Kumar "), "Ravi Kumar");
        assert_eq!(profile_name("No profile data available."), "there");
        assert_eq!(extract_profile_name("name: , email: x"), None);
    }

    #[test]
    fn test_guidance_use() {
        assert!(!Intent::Greeting.uses_guidance());
        assert!(!Intent::NameQuery.uses_guidance());
        assert!(Intent::General.uses_guidance());
    }
}
