use std::path::Path;

use cnis_core::{EmploymentRecord, Identification, ParseResult, PdfBackend, SkipStats};

use crate::ParsingError;
use crate::classify::{LineKind, Rules, classify};
use crate::config::ParsingConfig;
use crate::fields;
use crate::gaps::apply_gap_analysis;
use crate::identifiers;
use crate::remuneration::{self, RemunerationMatch};
use crate::scanner::Scanner;

/// Configurable extractor that holds a [`ParsingConfig`] and exposes each
/// pipeline step as a method.
///
/// Use `CnisExtractor::new()` for default behavior or
/// `CnisExtractor::with_config(config)` for custom phrase lists and limits.
#[derive(Debug, Clone)]
pub struct CnisExtractor {
    config: ParsingConfig,
    rules: Rules,
}

impl CnisExtractor {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        let rules = Rules::from_config(&config);
        Self { config, rules }
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Holder name, CPF and NIT from labeled fields anywhere in the text.
    pub fn extract_identification(&self, text: &str) -> Identification {
        identifiers::extract_identification(text)
    }

    pub fn classify_line(&self, line: &str) -> LineKind {
        classify(line, &self.rules)
    }

    /// Every competency + amount pair on one line.
    pub fn scan_remunerations(&self, line: &str) -> Vec<RemunerationMatch> {
        remuneration::scan(line, &self.rules)
    }

    /// Fields of a single record-start line, without block context.
    pub fn parse_trigger_line(&self, line: &str) -> EmploymentRecord {
        fields::parse_trigger_line(line, None, &self.rules)
    }

    /// Parse a whole statement.
    ///
    /// Never fails: anything unreadable is simply absent from the result.
    pub fn parse(&self, text: &str) -> ParseResult {
        self.parse_with_stats(text).0
    }

    /// Like [`parse`](Self::parse), also reporting what was skipped.
    pub fn parse_with_stats(&self, text: &str) -> (ParseResult, SkipStats) {
        let identification = self.extract_identification(text);

        let (mut vinculos, stats) = text
            .lines()
            .fold(Scanner::new(&self.rules), Scanner::step)
            .finish();
        for record in &mut vinculos {
            apply_gap_analysis(record);
        }

        let remunerations: usize = vinculos.iter().map(|r| r.remunerations.len()).sum();
        tracing::info!(
            records = vinculos.len(),
            remunerations,
            triggers = stats.triggers,
            phantom = stats.phantom_records,
            non_employee = stats.non_employee_records,
            orphan_remunerations = stats.orphan_remunerations,
            "parsed CNIS statement"
        );

        (
            ParseResult {
                identification,
                vinculos,
            },
            stats,
        )
    }

    /// Reject input that is empty or exceeds the configured bounds.
    pub fn validate_input(&self, text: &str) -> Result<(), ParsingError> {
        if text.trim().is_empty() {
            return Err(ParsingError::EmptyText);
        }
        if text.len() > self.config.max_input_bytes {
            return Err(ParsingError::InputTooLarge {
                size: text.len(),
                limit: self.config.max_input_bytes,
            });
        }
        let lines = text.lines().count();
        if lines > self.config.max_lines {
            return Err(ParsingError::TooManyLines {
                lines,
                limit: self.config.max_lines,
            });
        }
        Ok(())
    }

    /// Extract text through `backend`, validate it and parse it.
    pub fn extract_via_backend(
        &self,
        pdf_path: &Path,
        backend: &dyn PdfBackend,
    ) -> Result<(ParseResult, SkipStats), ParsingError> {
        let text = backend.extract_text(pdf_path)?;
        self.validate_input(&text)?;
        Ok(self.parse_with_stats(&text))
    }
}

impl Default for CnisExtractor {
    fn default() -> Self {
        Self::new()
    }
}
