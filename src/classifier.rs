//! Row classification
//!
//! Assigns header / operator / interaction roles to the unlabeled select
//! controls of one candidate row, using the vocabulary tables first and
//! control order as a last resort.

use crate::host::Selectable;
use crate::vocabulary::{matches_any, HEADER, INTERACTION, OPERATOR};

/// Role of one control in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Header,
    Operator,
    Interaction,
    Unknown,
}

/// Indices into the classified slice, one per role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub header: Option<usize>,
    pub operator: Option<usize>,
    pub interaction: Option<usize>,
}

impl Classification {
    /// A row is a rule only with both a header and an operator.
    pub fn is_rule(&self) -> bool {
        self.header.is_some() && self.operator.is_some()
    }

    /// Tagged role for every control of a row with `len` controls.
    pub fn roles(&self, len: usize) -> Vec<Role> {
        (0..len)
            .map(|i| {
                if self.interaction == Some(i) {
                    Role::Interaction
                } else if self.header == Some(i) {
                    Role::Header
                } else if self.operator == Some(i) {
                    Role::Operator
                } else {
                    Role::Unknown
                }
            })
            .collect()
    }
}

/// Classify a row's controls.
///
/// Interaction is claimed first: "and"/"or" is the vocabulary most likely
/// to collide with the others, so its control must leave the pool before
/// header and operator matching.
pub fn classify<S: Selectable>(controls: &[S]) -> Classification {
    let mut taken = vec![false; controls.len()];
    let mut claim = |vocabulary: &[&str]| {
        let index = controls
            .iter()
            .enumerate()
            .position(|(i, c)| !taken[i] && matches_any(vocabulary, c.option_labels()))?;
        taken[index] = true;
        Some(index)
    };

    let interaction = claim(INTERACTION);
    let mut operator = claim(OPERATOR);
    let mut header = claim(HEADER);

    // Position fallback for relabeled forms.
    let mut remaining = (0..controls.len()).filter(|i| !taken[*i]);
    if header.is_none() {
        header = remaining.next();
    }
    if operator.is_none() {
        operator = remaining.next();
    }

    Classification {
        header,
        operator,
        interaction,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Options(Vec<String>);

    impl Selectable for Options {
        fn option_labels(&self) -> &[String] {
            &self.0
        }
    }

    fn control(labels: &[&str]) -> Options {
        Options(labels.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn test_vocabulary_match_ignores_order() {
        let row = [
            control(&["and", "or"]),
            control(&["contains", "equals"]),
            control(&["From", "Subject"]),
        ];
        let result = classify(&row);
        assert_eq!(result.interaction, Some(0));
        assert_eq!(result.operator, Some(1));
        assert_eq!(result.header, Some(2));
        assert!(result.is_rule());
    }

    #[test]
    fn test_interaction_wins_over_header() {
        // One ambiguous control carrying both vocabularies.
        let row = [
            control(&["and", "From"]),
            control(&["Subject"]),
            control(&["contains"]),
        ];
        let result = classify(&row);
        assert_eq!(result.interaction, Some(0));
        assert_eq!(result.header, Some(1));
        assert_eq!(result.operator, Some(2));
        assert_eq!(
            result.roles(3),
            vec![Role::Interaction, Role::Header, Role::Operator]
        );
    }

    #[test]
    fn test_position_fallback() {
        let row = [control(&["Champ A"]), control(&["Vergleich"])];
        let result = classify(&row);
        assert_eq!(result.header, Some(0));
        assert_eq!(result.operator, Some(1));
        assert_eq!(result.interaction, None);
    }

    #[test]
    fn test_fallback_skips_interaction() {
        let row = [control(&["or", "and"]), control(&["x"]), control(&["y"])];
        let result = classify(&row);
        assert_eq!(result.interaction, Some(0));
        assert_eq!(result.header, Some(1));
        assert_eq!(result.operator, Some(2));
    }

    #[test]
    fn test_partial_fallback_fills_operator() {
        let row = [control(&["???"]), control(&["Subject"])];
        let result = classify(&row);
        assert_eq!(result.header, Some(1));
        assert_eq!(result.operator, Some(0));
    }

    #[test]
    fn test_too_few_controls_is_not_a_rule() {
        let row = [control(&["and", "or"]), control(&["From"])];
        let result = classify(&row);
        assert_eq!(result.header, Some(1));
        assert_eq!(result.operator, None);
        assert!(!result.is_rule());
        assert_eq!(result.roles(2), vec![Role::Interaction, Role::Header]);
    }
}
