use once_cell::sync::Lazy;
use regex::{Match, Regex};

use cnis_core::{CnisDate, Competency, Identification};

use crate::text_processing::{find_isolated, tokens};

/// Full `DD/MM/YYYY` date tokens, located syntactically.
pub(crate) static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}/\d{2}/\d{4}").unwrap());

/// `MM/YYYY` competency tokens, located syntactically.
pub(crate) static MONTH_YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{2}/\d{4}").unwrap());

static SEQUENTIAL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{1,3}$").unwrap());

static NIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{3}\.?\d{5}\.?\d{2}-?\d$").unwrap());

static CNPJ_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2}\.?\d{3}\.?\d{3}/?\d{4}-?\d{2}$").unwrap());

/// Formatted CNPJ root (first 8 digits), as printed in the "Código Emp." column.
static CNPJ_ROOT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}\.\d{3}\.\d{3}$").unwrap());

static CEI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{2}\.?\d{3}\.?\d{5}/?\d{2}$").unwrap());

/// Locate every date-shaped token in `line`, valid or not.
pub fn find_date_tokens(line: &str) -> Vec<Match<'_>> {
    find_isolated(&DATE_RE, line)
}

/// Locate every isolated `MM/YYYY` token that parses as a real competency.
pub fn find_competencies(line: &str) -> Vec<Competency> {
    find_isolated(&MONTH_YEAR_RE, line)
        .into_iter()
        .filter_map(|m| m.as_str().parse().ok())
        .collect()
}

/// Parse a date token. Impossible dates are absent, never repaired.
pub fn parse_date(token: &str) -> Option<CnisDate> {
    token.parse().ok()
}

pub fn is_sequential(token: &str) -> bool {
    SEQUENTIAL_RE.is_match(token)
}

pub fn is_nit(token: &str) -> bool {
    NIT_RE.is_match(token)
}

/// CNPJ (full or formatted root) or CEI.
pub fn is_employer_code(token: &str) -> bool {
    CNPJ_RE.is_match(token) || CEI_RE.is_match(token) || CNPJ_ROOT_RE.is_match(token)
}

/// Parse an amount in Brazilian notation (`1.234,56`, `-150,00`).
///
/// Returns `None` for anything that does not read as a finite number.
pub fn parse_brl_amount(token: &str) -> Option<f64> {
    let token = token.trim_end_matches(['.', ',']);
    let digits = token.strip_prefix('-').unwrap_or(token);
    if digits.is_empty() || !digits.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }
    if digits.matches(',').count() > 1 {
        return None;
    }
    let normalized = token.replace('.', "").replace(',', ".");
    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// First token of `zone` satisfying `pred`, with its offsets.
pub(crate) fn first_token<'t>(zone: &'t str, pred: impl Fn(&str) -> bool) -> Option<Match<'t>> {
    tokens(zone).find(|m| pred(m.as_str()))
}

/// Extract holder identification from the whole document.
///
/// Each field uses a labeled pattern; the first occurrence wins and an absent
/// label simply leaves the field empty.
pub fn extract_identification(text: &str) -> Identification {
    Identification {
        name: extract_name(text),
        cpf: extract_cpf(text),
        nit: extract_nit(text),
    }
}

pub fn extract_cpf(text: &str) -> Option<String> {
    static CPF_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bCPF\b[ \t]*[:\-]?[ \t]*(\d{3}\.?\d{3}\.?\d{3}-?\d{2})").unwrap()
    });
    first_labeled_value(&CPF_RE, text)
}

pub fn extract_nit(text: &str) -> Option<String> {
    static NIT_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bNIT\b[ \t]*[:\-]?[ \t]*(\d{3}\.?\d{5}\.?\d{2}-?\d)").unwrap()
    });
    first_labeled_value(&NIT_LABEL_RE, text)
}

fn first_labeled_value(re: &Regex, text: &str) -> Option<String> {
    re.captures_iter(text).find_map(|caps| {
        let value = caps.get(1)?;
        let glued = text[value.end()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit());
        (!glued).then(|| value.as_str().to_string())
    })
}

pub fn extract_name(text: &str) -> Option<String> {
    static NAME_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bNome(?:\s+do\s+(?:Filiado|Segurado))?[ \t]*[:\-][ \t]*([^\n]+)").unwrap()
    });
    // The value ends at the next column gap or the next label on the same line.
    static NAME_END_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\s{2,}|\t|\b(?:CPF|NIT|Data\s+de\s+nascimento|Nome\s+da\s+m[ãa]e)\b")
            .unwrap()
    });

    NAME_RE.captures_iter(text).find_map(|caps| {
        let raw = caps.get(1)?.as_str();
        let end = NAME_END_RE.find(raw).map_or(raw.len(), |m| m.start());
        let name = raw[..end].trim();
        (!name.is_empty()).then(|| name.to_string())
    })
}
