/// Structural element a keyword introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    Feature,
    Background,
    Scenario,
    ScenarioOutline,
    Given,
    When,
    Then,
    And,
    But,
    Examples,
}

/// Surface forms per category. English and PT-BR are accepted side by side;
/// another locale is one more entry in each list.
pub const KEYWORDS: &[(KeywordCategory, &[&str])] = &[
    (
        KeywordCategory::Feature,
        &["Feature", "Funcionalidade", "Característica"],
    ),
    (
        KeywordCategory::Background,
        &["Background", "Contexto", "Cenário de Fundo"],
    ),
    (
        KeywordCategory::Scenario,
        &["Scenario", "Cenário", "Exemplo"],
    ),
    (
        KeywordCategory::ScenarioOutline,
        &[
            "Scenario Outline",
            "Esquema do Cenário",
            "Esquema de Cenário",
        ],
    ),
    (
        KeywordCategory::Given,
        &["Given", "Dado", "Dada", "Dados", "Dadas"],
    ),
    (KeywordCategory::When, &["When", "Quando"]),
    (KeywordCategory::Then, &["Then", "Então", "Entao"]),
    (KeywordCategory::And, &["And", "E"]),
    (KeywordCategory::But, &["But", "Mas"]),
    (
        KeywordCategory::Examples,
        &["Examples", "Exemplos", "Cenários"],
    ),
];

pub(super) const STEP_CATEGORIES: [KeywordCategory; 5] = [
    KeywordCategory::Given,
    KeywordCategory::When,
    KeywordCategory::Then,
    KeywordCategory::And,
    KeywordCategory::But,
];

impl KeywordCategory {
    pub fn surface_forms(self) -> &'static [&'static str] {
        KEYWORDS
            .iter()
            .find(|(category, _)| *category == self)
            .map_or(&[], |(_, forms)| forms)
    }

    /// Case-sensitive prefix match against `keyword:` or `keyword `.
    pub fn matches(self, line: &str) -> bool {
        let trimmed = line.trim();
        self.surface_forms().iter().any(|kw| {
            trimmed
                .strip_prefix(kw)
                .is_some_and(|rest| rest.starts_with(':') || rest.starts_with(' '))
        })
    }

    pub(super) fn starts_step(self, line: &str) -> bool {
        let trimmed = line.trim();
        self.surface_forms().iter().any(|kw| {
            trimmed
                .strip_prefix(kw)
                .is_some_and(|rest| rest.starts_with(' '))
        })
    }
}

/// Classifies a line by its leading keyword. `KEYWORDS` order matters: block
/// keywords are checked before steps so a `Scenario Outline` line is a
/// scenario start.
pub(super) fn classify(line: &str) -> Option<KeywordCategory> {
    KEYWORDS
        .iter()
        .map(|(category, _)| *category)
        .find(|category| category.matches(line))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_keyword_followed_by_colon_or_space() {
        assert!(KeywordCategory::Feature.matches("Feature: Login"));
        assert!(KeywordCategory::Given.matches("  Dado que estou logado"));
        assert!(!KeywordCategory::Given.matches("Givenness is not a step"));
    }

    #[test]
    fn matching_is_case_sensitive() {
        assert!(!KeywordCategory::Feature.matches("feature: lower"));
        assert!(!KeywordCategory::When.matches("QUANDO algo"));
    }

    #[test]
    fn plural_examples_do_not_start_a_scenario() {
        assert_eq!(classify("Exemplos:"), Some(KeywordCategory::Examples));
        assert_eq!(classify("Cenários:"), Some(KeywordCategory::Examples));
        assert_eq!(
            classify("Exemplo: pagamento"),
            Some(KeywordCategory::Scenario)
        );
    }

    #[test]
    fn outline_lines_classify_as_scenario() {
        assert_eq!(
            classify("Scenario Outline: many users"),
            Some(KeywordCategory::Scenario)
        );
        assert_eq!(
            classify("Esquema do Cenário: vários"),
            Some(KeywordCategory::ScenarioOutline)
        );
    }

    #[test]
    fn background_wins_over_scenario_prefix() {
        assert_eq!(
            classify("Cenário de Fundo:"),
            Some(KeywordCategory::Background)
        );
    }

    #[test]
    fn step_start_requires_a_space() {
        assert!(KeywordCategory::Then.starts_step("Then it works"));
        assert!(!KeywordCategory::Then.starts_step("Then:"));
    }

    #[test]
    fn every_category_has_surface_forms() {
        for (category, forms) in KEYWORDS {
            assert!(!forms.is_empty());
            assert_eq!(category.surface_forms(), *forms);
        }
    }
}
