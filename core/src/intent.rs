// Query intent detection
//
// An ordered list of (pattern, intent) rules evaluated top to bottom, first
// match wins. Precedence lives in the list order and nowhere else: a rule for
// "update temperature" sits above the plain "temperature" rule, or it would
// never fire.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    UpdateTemperature,
    Temperature,
    Lights,
    HomeStatus,
}

#[derive(Debug, Clone)]
pub struct IntentRule {
    /// Lowercase substring to look for
    pub pattern: String,
    pub intent: IntentKind,
}

impl IntentRule {
    pub fn new(pattern: impl Into<String>, intent: IntentKind) -> Self {
        Self {
            pattern: pattern.into().to_lowercase(),
            intent,
        }
    }
}

pub struct IntentRouter {
    rules: Vec<IntentRule>,
}

impl IntentRouter {
    pub fn new(rules: Vec<IntentRule>) -> Self {
        Self { rules }
    }

    /// Rules for the smart-home agent's query vocabulary
    pub fn smart_home_defaults() -> Self {
        Self::new(vec![
            IntentRule::new("update temperature", IntentKind::UpdateTemperature),
            IntentRule::new("change temperature", IntentKind::UpdateTemperature),
            IntentRule::new("temperature", IntentKind::Temperature),
            IntentRule::new("light", IntentKind::Lights),
            IntentRule::new("status", IntentKind::HomeStatus),
            IntentRule::new("home state", IntentKind::HomeStatus),
        ])
    }

    /// First matching rule wins; `None` when nothing matches
    pub fn detect(&self, query: &str) -> Option<IntentKind> {
        let query = query.to_lowercase();
        self.rules
            .iter()
            .find(|rule| query.contains(&rule.pattern))
            .map(|rule| rule.intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins_over_later_rules() {
        let router = IntentRouter::smart_home_defaults();
        // "update temperature" contains "temperature" too; order decides
        assert_eq!(
            router.detect("please update temperature now"),
            Some(IntentKind::UpdateTemperature)
        );
        assert_eq!(
            router.detect("what is the temperature?"),
            Some(IntentKind::Temperature)
        );
    }

    #[test]
    fn detection_is_case_insensitive() {
        let router = IntentRouter::smart_home_defaults();
        assert_eq!(router.detect("Are the LIGHTS on?"), Some(IntentKind::Lights));
    }

    #[test]
    fn no_match_yields_none() {
        let router = IntentRouter::smart_home_defaults();
        assert_eq!(router.detect("tell me a story"), None);
    }

    #[test]
    fn custom_rule_order_is_respected() {
        let router = IntentRouter::new(vec![
            IntentRule::new("temperature", IntentKind::Temperature),
            IntentRule::new("update temperature", IntentKind::UpdateTemperature),
        ]);
        // The broad rule shadows the specific one when listed first
        assert_eq!(
            router.detect("update temperature"),
            Some(IntentKind::Temperature)
        );
    }
}
