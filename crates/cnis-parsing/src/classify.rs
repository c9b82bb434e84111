use once_cell::sync::Lazy;
use regex::{Match, Regex};

use cnis_core::RelationshipType;

use crate::config::{
    DEFAULT_FOREIGN_PHRASES, DEFAULT_HEADER_LIKE_PHRASES, DEFAULT_HEADER_PHRASES,
    DEFAULT_INDICATOR_STOPWORDS, DEFAULT_NOISE_PHRASES, ListOverride, ParsingConfig,
};
use crate::identifiers::{find_date_tokens, is_sequential};
use crate::remuneration;
use crate::text_processing::{fold_for_match, folded_phrases_regex, tokens};

/// What a single statement line is, as far as the scanner is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Blank,
    /// Column header row ("Indicador" + "Descrição") or a record header line.
    Header,
    /// Report furniture: emission stamp, page counter.
    Noise,
    /// Starts a new employment record.
    Trigger,
    /// Starts a record of a non-employee relationship type.
    ForeignBoundary,
    /// Carries at least one competency + amount pair.
    Remuneration,
    /// Labeled holder data ("Nome:", "CPF:", "NIT:").
    Identification,
    Other,
}

/// Configuration resolved into the folded forms the classifier compares against.
#[derive(Debug, Clone)]
pub(crate) struct Rules {
    pub header_phrases: Vec<String>,
    /// `header_phrases` as a pattern over the literal line.
    pub header_phrase_re: Option<Regex>,
    pub noise_phrases: Vec<String>,
    pub foreign_phrases: Vec<String>,
    pub header_like_phrases: Vec<String>,
    pub indicator_stopwords: Vec<String>,
    pub foreign_boundaries: bool,
    pub type_keyword_re: Option<Regex>,
    pub remuneration_re: Option<Regex>,
    pub max_indicator_len: usize,
    pub min_registration_len: usize,
}

fn resolve_folded(list: &ListOverride<String>, defaults: &[&str]) -> Vec<String> {
    let defaults: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
    list.resolve(&defaults)
        .iter()
        .map(|p| fold_for_match(p))
        .filter(|p| !p.is_empty())
        .collect()
}

impl Rules {
    pub fn from_config(config: &ParsingConfig) -> Self {
        let header_phrases = resolve_folded(&config.header_phrases, DEFAULT_HEADER_PHRASES);
        Self {
            header_phrase_re: folded_phrases_regex(&header_phrases),
            header_phrases,
            noise_phrases: resolve_folded(&config.noise_phrases, DEFAULT_NOISE_PHRASES),
            foreign_phrases: resolve_folded(&config.foreign_phrases, DEFAULT_FOREIGN_PHRASES),
            header_like_phrases: resolve_folded(
                &config.header_like_phrases,
                DEFAULT_HEADER_LIKE_PHRASES,
            ),
            indicator_stopwords: {
                let defaults: Vec<String> = DEFAULT_INDICATOR_STOPWORDS
                    .iter()
                    .map(|s| s.to_string())
                    .collect();
                config.indicator_stopwords.resolve(&defaults)
            },
            foreign_boundaries: config.foreign_boundaries,
            type_keyword_re: config.type_keyword_re.clone(),
            remuneration_re: config.remuneration_re.clone(),
            max_indicator_len: config.max_indicator_len,
            min_registration_len: config.min_registration_len,
        }
    }

    /// Occurrences of the employee type keyword ("Empregado", whole word).
    pub fn type_keyword_matches<'t>(&self, line: &'t str) -> Vec<Match<'t>> {
        static EMPREGADO_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bEmpregado\b").unwrap());
        self.type_keyword_re
            .as_ref()
            .unwrap_or(&EMPREGADO_RE)
            .find_iter(line)
            .collect()
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::from_config(&ParsingConfig::default())
    }
}

/// "Indicador" and "Descrição" together: the indicator legend header row.
pub(crate) fn is_column_header_row(folded: &str) -> bool {
    folded.contains("indicador") && folded.contains("descricao")
}

fn contains_any(folded: &str, phrases: &[String]) -> bool {
    phrases.iter().any(|p| folded.contains(p.as_str()))
}

fn starts_with_sequential(line: &str) -> bool {
    tokens(line).next().is_some_and(|m| is_sequential(m.as_str()))
}

/// Whether text looks like a column header rather than a value.
pub(crate) fn is_header_like(text: &str, rules: &Rules) -> bool {
    let folded = fold_for_match(text);
    if is_column_header_row(&folded) || contains_any(&folded, &rules.header_like_phrases) {
        return true;
    }
    folded
        .split(' ')
        .any(|w| matches!(w, "seq" | "seq." | "nit" | "cnpj" | "cei"))
}

/// A `Nome`, `CPF` or `NIT` label followed by a colon, possibly with a few
/// qualifying words in between ("Nome do Filiado:", "Nome da mãe:").
pub(crate) fn is_identification(folded: &str) -> bool {
    static LABEL_RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b(?:nome|cpf|nit)\b[a-z .]{0,24}:").unwrap());
    LABEL_RE.is_match(folded)
}

pub(crate) fn is_noise(folded: &str, rules: &Rules) -> bool {
    contains_any(folded, &rules.noise_phrases)
}

/// Record-start rule: (leading sequential OR header phrase) AND type keyword
/// AND a full date, never on a column header row.
pub(crate) fn is_trigger(line: &str, folded: &str, rules: &Rules) -> bool {
    if is_column_header_row(folded) {
        return false;
    }
    let anchored = starts_with_sequential(line) || contains_any(folded, &rules.header_phrases);
    anchored && !rules.type_keyword_matches(line).is_empty() && !find_date_tokens(line).is_empty()
}

/// A row of another relationship type: leading sequential, a full date and a
/// foreign type phrase, without the employee keyword.
pub(crate) fn is_foreign_boundary(line: &str, folded: &str, rules: &Rules) -> bool {
    rules.foreign_boundaries
        && !is_column_header_row(folded)
        && starts_with_sequential(line)
        && rules.type_keyword_matches(line).is_empty()
        && contains_any(folded, &rules.foreign_phrases)
        && !find_date_tokens(line).is_empty()
}

/// Resolve the relationship type from the text following the type keyword.
pub(crate) fn resolve_relationship_type(after_keyword: &str) -> RelationshipType {
    let folded = fold_for_match(after_keyword);
    if folded.starts_with("domestico") {
        RelationshipType::DomesticEmployee
    } else {
        RelationshipType::Employee
    }
}

pub(crate) fn classify(line: &str, rules: &Rules) -> LineKind {
    if line.trim().is_empty() {
        return LineKind::Blank;
    }
    let folded = fold_for_match(line);
    if is_column_header_row(&folded) {
        return LineKind::Header;
    }
    if is_trigger(line, &folded, rules) {
        return LineKind::Trigger;
    }
    if is_foreign_boundary(line, &folded, rules) {
        return LineKind::ForeignBoundary;
    }
    if !remuneration::scan(line, rules).is_empty() {
        return LineKind::Remuneration;
    }
    if is_identification(&folded) {
        return LineKind::Identification;
    }
    if contains_any(&folded, &rules.header_phrases) {
        return LineKind::Header;
    }
    if is_noise(&folded, rules) {
        return LineKind::Noise;
    }
    LineKind::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kind(line: &str) -> LineKind {
        classify(line, &Rules::default())
    }

    #[test]
    fn test_trigger_with_sequential() {
        assert_eq!(
            kind("1  12.345.678/0001-99  ACME LTDA  01/01/2010  31/12/2012  Empregado"),
            LineKind::Trigger
        );
    }

    #[test]
    fn test_trigger_requires_keyword_and_date() {
        assert_eq!(kind("1  12.345.678/0001-99  ACME LTDA  Empregado"), LineKind::Other);
        assert_ne!(
            kind("1  12.345.678/0001-99  ACME LTDA  01/01/2010"),
            LineKind::Trigger
        );
        // "Empregados" is not the whole word
        assert_ne!(kind("1  ACME  01/01/2010  Empregados"), LineKind::Trigger);
    }

    #[test]
    fn test_trigger_keyword_case_insensitive() {
        assert_eq!(kind("2  ACME  01/01/2010  EMPREGADO"), LineKind::Trigger);
    }

    #[test]
    fn test_trigger_via_header_phrase() {
        assert_eq!(
            kind("Origem do Vínculo ACME 01/01/2010 Empregado"),
            LineKind::Trigger
        );
    }

    #[test]
    fn test_header_only_rule_is_not_a_trigger() {
        // Older statements' header line without the employee keyword and date
        assert_eq!(
            kind("Seq.  NIT  Código Emp.  Origem do Vínculo  Data Início  Data Fim"),
            LineKind::Header
        );
    }

    #[test]
    fn test_column_header_row_never_triggers() {
        assert_eq!(
            kind("1  Indicador  Descrição  Empregado  01/01/2010"),
            LineKind::Header
        );
    }

    #[test]
    fn test_noise_and_remuneration() {
        assert_eq!(kind("Emitido em 15/10/2023 às 10:00"), LineKind::Noise);
        assert_eq!(kind("Página 2 de 5"), LineKind::Noise);
        assert_eq!(kind("01/2020  1.500,00"), LineKind::Remuneration);
        assert_eq!(kind("   "), LineKind::Blank);
        assert_eq!(kind("ACME COMERCIO LTDA"), LineKind::Other);
    }

    #[test]
    fn test_identification_lines() {
        assert_eq!(kind("Nome: JOSE SILVA"), LineKind::Identification);
        assert_eq!(
            kind("NIT: 123.45678.90-1   CPF: 987.654.321-00"),
            LineKind::Identification
        );
        assert_eq!(
            kind("Data de nascimento: 05/06/1980   Nome da mãe: ANA PEREIRA"),
            LineKind::Identification
        );
        // Column header without a colon is not holder data
        assert_eq!(kind("Seq.  NIT  Código Emp."), LineKind::Header);
        assert_eq!(kind("NITRO QUIMICA S/A"), LineKind::Other);
    }

    #[test]
    fn test_foreign_boundary() {
        assert_eq!(
            kind("3  123.45678.90-1  01/03/2015  31/12/2015  Contribuinte Individual"),
            LineKind::ForeignBoundary
        );
        let rules = Rules::from_config(
            &crate::ParsingConfigBuilder::new()
                .foreign_boundaries(false)
                .build()
                .unwrap(),
        );
        assert_eq!(
            classify(
                "3  123.45678.90-1  01/03/2015  31/12/2015  Contribuinte Individual",
                &rules
            ),
            LineKind::Other
        );
    }

    #[test]
    fn test_resolve_relationship_type() {
        assert_eq!(
            resolve_relationship_type(" Doméstico  PEXT"),
            RelationshipType::DomesticEmployee
        );
        assert_eq!(
            resolve_relationship_type(" ou Agente Público"),
            RelationshipType::Employee
        );
        assert_eq!(resolve_relationship_type(""), RelationshipType::Employee);
    }

    #[test]
    fn test_header_like() {
        let rules = Rules::default();
        assert!(is_header_like("Origem do Vínculo", &rules));
        assert!(is_header_like("Seq. NIT", &rules));
        assert!(!is_header_like("UNITED FOODS LTDA", &rules));
    }
}
