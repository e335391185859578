//! Known option labels of the email-filter form
//!
//! Each table lists the labels the host page uses for one control role.
//! Matching is by whole label, trimmed and case-insensitive.

/// Header (field) choices.
pub const HEADER: &[&str] = &[
    "From",
    "Subject",
    "To",
    "Reply Address",
    "Body",
    "Any Header",
    "Any Recipient",
    "Has Not Been Previously Delivered",
    "Is an Error Message",
    "Spam Status",
    "Spam Bar",
    "Spam Score",
];

/// Comparison operators.
pub const OPERATOR: &[&str] = &[
    "contains",
    "does not contain",
    "equals",
    "matches regex",
    "does not match",
    "begins with",
    "ends with",
    "is above (numbers only)",
    "is not above (numbers only)",
    "is below (numbers only)",
    "is not below (numbers only)",
];

/// AND/OR composition between consecutive rules.
pub const INTERACTION: &[&str] = &["and", "or"];

/// What happens to a matching message. Page-global, not per row.
pub const ACTION: &[&str] = &[
    "Discard Message",
    "Redirect to Email",
    "Fail with Message",
    "Stop Processing Rules",
    "Deliver to Folder",
    "Pipe to a Program",
];

/// Trim and lowercase, the form labels are compared in.
pub fn normalize(label: &str) -> String {
    label.trim().to_lowercase()
}

/// True if `label` is one of the vocabulary terms.
pub fn contains(vocabulary: &[&str], label: &str) -> bool {
    let label = normalize(label);
    vocabulary.iter().any(|term| normalize(term) == label)
}

/// True if any of `labels` belongs to the vocabulary.
pub fn matches_any<S: AsRef<str>>(vocabulary: &[&str], labels: &[S]) -> bool {
    labels.iter().any(|l| contains(vocabulary, l.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_ignores_case_and_padding() {
        assert!(contains(HEADER, "  from "));
        assert!(contains(OPERATOR, "Does Not Contain"));
        assert!(contains(INTERACTION, "OR"));
        assert!(!contains(HEADER, "Fro"));
    }

    #[test]
    fn test_matches_any() {
        assert!(matches_any(ACTION, &["--", "Discard Message"]));
        assert!(!matches_any(ACTION, &["and", "or"]));
    }
}
