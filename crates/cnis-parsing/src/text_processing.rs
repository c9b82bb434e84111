use once_cell::sync::Lazy;
use regex::{Match, Regex};

/// Lowercase, strip Portuguese diacritics and collapse whitespace runs.
///
/// Used only for phrase comparisons; extracted values always keep the
/// literal text.
pub fn fold_for_match(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        for lower in c.to_lowercase() {
            out.push(strip_accent(lower));
        }
    }
    out
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        other => other,
    }
}

/// Whitespace-separated tokens with their byte offsets.
pub fn tokens(text: &str) -> impl Iterator<Item = Match<'_>> {
    static TOKEN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").unwrap());
    TOKEN_RE.find_iter(text)
}

/// Characters that glue numeric tokens together (`01/01/2010`, `1.234,56`).
fn is_numeric_glue(c: char) -> bool {
    c.is_ascii_digit() || c == '/'
}

/// Whether a match stands on its own: not preceded or followed by a digit or `/`.
///
/// The `regex` crate has no look-around, so boundaries for date-like tokens
/// are checked here instead.
pub fn is_isolated(text: &str, start: usize, end: usize) -> bool {
    let before_ok = text[..start]
        .chars()
        .next_back()
        .is_none_or(|c| !is_numeric_glue(c));
    let after_ok = text[end..].chars().next().is_none_or(|c| !is_numeric_glue(c));
    before_ok && after_ok
}

/// All isolated matches of `re` in `text`.
///
/// A rejected match does not consume its span: the search resumes one
/// character after its start, so `10/10/2023 01/2020` still finds `01/2020`.
pub fn find_isolated<'t>(re: &Regex, text: &'t str) -> Vec<Match<'t>> {
    let mut found = Vec::new();
    let mut at = 0;
    while at <= text.len() {
        let Some(m) = re.find_at(text, at) else {
            break;
        };
        if is_isolated(text, m.start(), m.end()) {
            found.push(m);
            at = m.end().max(next_char(text, m.start()));
        } else {
            at = next_char(text, m.start());
        }
    }
    found
}

/// Byte offset just past the character starting at `pos`.
pub(crate) fn next_char(text: &str, pos: usize) -> usize {
    text[pos..]
        .chars()
        .next()
        .map_or(text.len() + 1, |c| pos + c.len_utf8())
}

/// Compile folded phrases into one case-insensitive pattern that matches the
/// literal text they were folded from (accents and whitespace runs included).
///
/// Returns `None` for an empty phrase list.
pub fn folded_phrases_regex(phrases: &[String]) -> Option<Regex> {
    let alternatives: Vec<String> = phrases
        .iter()
        .filter(|p| !p.is_empty())
        .map(|phrase| {
            phrase
                .chars()
                .map(|c| match c {
                    ' ' => r"\s+".to_string(),
                    'a' => "[aáàâãä]".to_string(),
                    'e' => "[eéèêë]".to_string(),
                    'i' => "[iíìîï]".to_string(),
                    'o' => "[oóòôõö]".to_string(),
                    'u' => "[uúùûü]".to_string(),
                    'c' => "[cç]".to_string(),
                    other => regex::escape(other.encode_utf8(&mut [0; 4])),
                })
                .collect()
        })
        .collect();
    if alternatives.is_empty() {
        return None;
    }
    Regex::new(&format!("(?i)(?:{})", alternatives.join("|"))).ok()
}

/// Split free text into column groups on runs of 2+ spaces, tabs or pipes.
pub fn split_columns(text: &str) -> Vec<&str> {
    static SEP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}|\t|\|").unwrap());
    SEP_RE
        .split(text)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folded_phrases_regex() {
        let phrases = vec![fold_for_match("Código Emp."), fold_for_match("Origem do Vínculo")];
        let re = folded_phrases_regex(&phrases).unwrap();
        assert!(re.is_match("CÓDIGO EMP.  12.345.678"));
        assert!(re.is_match("origem do   vinculo ACME"));
        assert!(!re.is_match("Codigo Emp"));
        assert!(folded_phrases_regex(&[]).is_none());
    }

    #[test]
    fn test_fold_for_match() {
        assert_eq!(fold_for_match("Origem do  Vínculo"), "origem do vinculo");
        assert_eq!(fold_for_match("  CÓDIGO\tEmp. "), "codigo emp.");
        assert_eq!(fold_for_match("Página 2"), "pagina 2");
    }

    #[test]
    fn test_tokens_keep_offsets() {
        let line = "1  ACME   01/01/2010";
        let toks: Vec<_> = tokens(line).map(|m| (m.start(), m.as_str())).collect();
        assert_eq!(toks, vec![(0, "1"), (3, "ACME"), (10, "01/01/2010")]);
    }

    #[test]
    fn test_is_isolated() {
        let text = "01/01/2010 03/2020";
        // "01/2010" inside the full date is glued to the preceding '/'
        assert!(!is_isolated(text, 3, 10));
        assert!(is_isolated(text, 11, 18));
        assert!(is_isolated(text, 0, 10));
    }

    #[test]
    fn test_split_columns() {
        assert_eq!(
            split_columns("  ACME LTDA   FILIAL SUL | X\tY "),
            vec!["ACME LTDA", "FILIAL SUL", "X", "Y"]
        );
        assert!(split_columns("   ").is_empty());
    }
}
