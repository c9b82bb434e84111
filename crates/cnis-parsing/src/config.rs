use regex::Regex;

use cnis_core::config_file::ParsingSection;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }

    fn push(&mut self, value: T) {
        match self {
            ListOverride::Extend(v) | ListOverride::Replace(v) => v.push(value),
            ListOverride::Default => *self = ListOverride::Extend(vec![value]),
        }
    }
}

/// Phrases that mark a line as the statement's record header row.
pub const DEFAULT_HEADER_PHRASES: &[&str] = &["Origem do Vínculo", "Código Emp."];

/// Report furniture: still scanned for salaries, never used as employer names.
pub const DEFAULT_NOISE_PHRASES: &[&str] = &["emitido", "página", "pagina"];

/// Text that disqualifies a candidate employer name.
pub const DEFAULT_HEADER_LIKE_PHRASES: &[&str] = &[
    "Código Emp",
    "Origem do Vínculo",
    "Data Início",
    "Data Fim",
    "Tipo Filiado",
    "Últ. Remun",
    "Indicadores",
    "Competência",
    "Remuneração",
    "Remunerações",
    "Relações Previdenciárias",
    "Vínculos",
];

/// Uppercase words after the type keyword that are never indicators.
pub const DEFAULT_INDICATOR_STOPWORDS: &[&str] =
    &["CPF", "NIT", "OU", "AGENTE", "PUBLICO", "DOMESTICO"];

/// Relationship types whose rows close the current employee block.
pub const DEFAULT_FOREIGN_PHRASES: &[&str] = &[
    "Contribuinte Individual",
    "Facultativo",
    "Segurado Especial",
    "Trabalhador Avulso",
    "Benefício",
    "Recolhimento",
];

/// Configuration for the CNIS extraction pipeline.
///
/// Regex fields are `Option<Regex>`; `None` means "use the built-in default".
/// Use [`ParsingConfigBuilder`] to construct with string patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── classify.rs ──
    /// Phrases that may stand in for a leading sequential on a trigger line.
    pub(crate) header_phrases: ListOverride<String>,
    /// Report furniture phrases ("emitido", "página").
    pub(crate) noise_phrases: ListOverride<String>,
    /// Foreign relationship types that close an open block.
    pub(crate) foreign_phrases: ListOverride<String>,
    /// Whether foreign relationship rows close the open block at all.
    pub(crate) foreign_boundaries: bool,
    /// Keyword regex for the employee type column (default `(?i)\bEmpregado\b`).
    pub(crate) type_keyword_re: Option<Regex>,

    // ── fields.rs ──
    /// Phrases that make a candidate employer name look like a column header.
    pub(crate) header_like_phrases: ListOverride<String>,
    /// Tokens never reported as indicators.
    pub(crate) indicator_stopwords: ListOverride<String>,
    /// Longest token still considered an indicator (default: 16).
    pub(crate) max_indicator_len: usize,
    /// Shortest token accepted as a registration number (default: 4).
    pub(crate) min_registration_len: usize,

    // ── remuneration.rs ──
    /// Remuneration line regex; group 1 is the competency, group 2 the amount.
    pub(crate) remuneration_re: Option<Regex>,

    // ── input bounds ──
    /// Largest accepted document, in bytes (default: 16 MiB).
    pub(crate) max_input_bytes: usize,
    /// Largest accepted line count (default: 200 000).
    pub(crate) max_lines: usize,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            header_phrases: ListOverride::Default,
            noise_phrases: ListOverride::Default,
            foreign_phrases: ListOverride::Default,
            foreign_boundaries: true,
            type_keyword_re: None,
            header_like_phrases: ListOverride::Default,
            indicator_stopwords: ListOverride::Default,
            max_indicator_len: 16,
            min_registration_len: 4,
            remuneration_re: None,
            max_input_bytes: 16 * 1024 * 1024,
            max_lines: 200_000,
        }
    }
}

impl ParsingConfig {
    pub fn max_input_bytes(&self) -> usize {
        self.max_input_bytes
    }

    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    pub fn foreign_boundaries(&self) -> bool {
        self.foreign_boundaries
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    header_phrases: ListOverride<String>,
    noise_phrases: ListOverride<String>,
    foreign_phrases: ListOverride<String>,
    foreign_boundaries: Option<bool>,
    type_keyword_re: Option<String>,
    header_like_phrases: ListOverride<String>,
    indicator_stopwords: ListOverride<String>,
    max_indicator_len: Option<usize>,
    min_registration_len: Option<usize>,
    remuneration_re: Option<String>,
    max_input_bytes: Option<usize>,
    max_lines: Option<usize>,
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from the `[parsing]` section of a config file.
    pub fn from_section(section: &ParsingSection) -> Self {
        let mut builder = Self::new();
        if let Some(mb) = section.max_input_mb {
            builder = builder.max_input_bytes((mb as usize).saturating_mul(1024 * 1024));
        }
        if let Some(n) = section.max_lines {
            builder = builder.max_lines(n);
        }
        if let Some(n) = section.max_indicator_len {
            builder = builder.max_indicator_len(n);
        }
        if let Some(on) = section.foreign_boundaries {
            builder = builder.foreign_boundaries(on);
        }
        for phrase in section.extra_header_phrases.iter().flatten() {
            builder = builder.add_header_phrase(phrase.clone());
        }
        for phrase in section.extra_noise_phrases.iter().flatten() {
            builder = builder.add_noise_phrase(phrase.clone());
        }
        builder
    }

    // ── Trigger / classification ──

    pub fn set_header_phrases(mut self, phrases: Vec<String>) -> Self {
        self.header_phrases = ListOverride::Replace(phrases);
        self
    }

    pub fn add_header_phrase(mut self, phrase: String) -> Self {
        self.header_phrases.push(phrase);
        self
    }

    pub fn set_noise_phrases(mut self, phrases: Vec<String>) -> Self {
        self.noise_phrases = ListOverride::Replace(phrases);
        self
    }

    pub fn add_noise_phrase(mut self, phrase: String) -> Self {
        self.noise_phrases.push(phrase);
        self
    }

    pub fn set_foreign_phrases(mut self, phrases: Vec<String>) -> Self {
        self.foreign_phrases = ListOverride::Replace(phrases);
        self
    }

    pub fn add_foreign_phrase(mut self, phrase: String) -> Self {
        self.foreign_phrases.push(phrase);
        self
    }

    pub fn foreign_boundaries(mut self, enabled: bool) -> Self {
        self.foreign_boundaries = Some(enabled);
        self
    }

    pub fn type_keyword_regex(mut self, pattern: &str) -> Self {
        self.type_keyword_re = Some(pattern.to_string());
        self
    }

    // ── Field extraction ──

    pub fn add_header_like_phrase(mut self, phrase: String) -> Self {
        self.header_like_phrases.push(phrase);
        self
    }

    pub fn add_indicator_stopword(mut self, word: String) -> Self {
        self.indicator_stopwords.push(word);
        self
    }

    pub fn max_indicator_len(mut self, n: usize) -> Self {
        self.max_indicator_len = Some(n);
        self
    }

    pub fn min_registration_len(mut self, n: usize) -> Self {
        self.min_registration_len = Some(n);
        self
    }

    // ── Remuneration ──

    /// Custom remuneration pattern. Group 1 must capture `MM/YYYY`, group 2 the amount.
    pub fn remuneration_regex(mut self, pattern: &str) -> Self {
        self.remuneration_re = Some(pattern.to_string());
        self
    }

    // ── Input bounds ──

    pub fn max_input_bytes(mut self, n: usize) -> Self {
        self.max_input_bytes = Some(n);
        self
    }

    pub fn max_lines(mut self, n: usize) -> Self {
        self.max_lines = Some(n);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let defaults = ParsingConfig::default();

        Ok(ParsingConfig {
            header_phrases: self.header_phrases,
            noise_phrases: self.noise_phrases,
            foreign_phrases: self.foreign_phrases,
            foreign_boundaries: self
                .foreign_boundaries
                .unwrap_or(defaults.foreign_boundaries),
            type_keyword_re: compile(self.type_keyword_re)?,
            header_like_phrases: self.header_like_phrases,
            indicator_stopwords: self.indicator_stopwords,
            max_indicator_len: self.max_indicator_len.unwrap_or(defaults.max_indicator_len),
            min_registration_len: self
                .min_registration_len
                .unwrap_or(defaults.min_registration_len),
            remuneration_re: compile(self.remuneration_re)?,
            max_input_bytes: self.max_input_bytes.unwrap_or(defaults.max_input_bytes),
            max_lines: self.max_lines.unwrap_or(defaults.max_lines),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParsingConfig::default();
        assert_eq!(config.max_indicator_len, 16);
        assert_eq!(config.min_registration_len, 4);
        assert!(config.foreign_boundaries);
        assert_eq!(config.max_lines, 200_000);
    }

    #[test]
    fn test_builder_basic() {
        let config = ParsingConfigBuilder::new()
            .max_indicator_len(8)
            .min_registration_len(6)
            .foreign_boundaries(false)
            .max_lines(10)
            .build()
            .unwrap();
        assert_eq!(config.max_indicator_len, 8);
        assert_eq!(config.min_registration_len, 6);
        assert!(!config.foreign_boundaries);
        assert_eq!(config.max_lines, 10);
    }

    #[test]
    fn test_builder_custom_regex() {
        let config = ParsingConfigBuilder::new()
            .remuneration_regex(r"(\d{2}/\d{4})\s*;\s*(-?[\d.,]+)")
            .build()
            .unwrap();
        assert!(config.remuneration_re.is_some());
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ParsingConfigBuilder::new()
            .type_keyword_regex(r"[invalid")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let mut e: ListOverride<String> = ListOverride::Default;
        e.push("c".to_string());
        assert_eq!(
            e.resolve(&defaults),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn test_from_section() {
        let section = ParsingSection {
            max_input_mb: Some(2),
            foreign_boundaries: Some(false),
            extra_noise_phrases: Some(vec!["Extrato Previdenciário".to_string()]),
            ..Default::default()
        };
        let config = ParsingConfigBuilder::from_section(&section).build().unwrap();
        assert_eq!(config.max_input_bytes, 2 * 1024 * 1024);
        assert!(!config.foreign_boundaries);
        let noise = config.noise_phrases.resolve(&[]);
        assert_eq!(noise, vec!["Extrato Previdenciário".to_string()]);
    }
}
