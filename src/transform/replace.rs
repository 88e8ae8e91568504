use crate::settings::ReplaceRules;

/// Literal substitutions, applied in rule order.
pub fn apply(text: &str, rules: &ReplaceRules) -> String {
    let mut result = text.to_string();

    for (old, new) in &rules.rules {
        if result.contains(old.as_str()) {
            result = result.replace(old.as_str(), new);
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_rules_in_order() {
        let rules = ReplaceRules {
            rules: vec![
                ("a".to_string(), "b".to_string()),
                ("b".to_string(), "c".to_string()),
            ],
        };

        assert_eq!(apply("a", &rules), "c");
    }

    #[test]
    fn no_rules_is_identity() {
        assert_eq!(apply("unchanged", &ReplaceRules::default()), "unchanged");
    }
}
