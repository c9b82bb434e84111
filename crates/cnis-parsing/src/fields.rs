//! Field extractors for a record-start line.
//!
//! The line is cut into three zones around the dates and the type keyword:
//!
//! ```text
//! 1  123.45678.90-1  12.345.678/0001-99  ACME LTDA  01/01/2010  31/12/2012  12/2012  4471  Empregado  PEXT
//! [-------------------- pre-date ------------------]                      [--- inter ---]           [post]
//! ```
//!
//! Each extractor is a pure function over one zone.

use cnis_core::{Competency, EmploymentRecord};

use crate::classify::{Rules, is_header_like, resolve_relationship_type};
use crate::identifiers::{
    find_date_tokens, first_token, is_employer_code, is_nit, is_sequential, parse_date,
};
use crate::text_processing::{split_columns, tokens};

/// The three zones of a trigger line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zones<'a> {
    pub pre_date: &'a str,
    pub inter: &'a str,
    pub post_keyword: &'a str,
    /// Everything after the type keyword, used to resolve the relationship type.
    pub after_keyword: &'a str,
}

/// Cut a trigger line into its zones.
///
/// The type keyword used is the first one at or after the last date; when the
/// keyword precedes every date the inter zone is empty and the post zone
/// starts after the last date.
pub(crate) fn split_zones<'a>(line: &'a str, rules: &Rules) -> Zones<'a> {
    let dates = find_date_tokens(line);
    let (first_start, last_end) = match (dates.first(), dates.last()) {
        (Some(first), Some(last)) => (first.start(), last.end()),
        _ => (line.len(), line.len()),
    };

    let keywords = rules.type_keyword_matches(line);
    let keyword = keywords
        .iter()
        .find(|m| m.start() >= last_end)
        .or(keywords.first());

    let (inter, post_keyword, after_keyword) = match keyword {
        Some(k) if k.start() >= last_end => {
            (&line[last_end..k.start()], &line[k.end()..], &line[k.end()..])
        }
        Some(k) => ("", &line[last_end.max(k.end())..], &line[k.end()..]),
        None => (&line[last_end..], "", ""),
    };

    Zones {
        pre_date: &line[..first_start],
        inter,
        post_keyword,
        after_keyword,
    }
}

/// Identification fields found in the pre-date zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreDateFields {
    pub sequential: Option<u32>,
    pub worker_nit: Option<String>,
    pub employer_code: Option<String>,
    pub employer_name: Option<String>,
    pub origin: Option<String>,
}

/// Sequential, NIT and employer code by token shape; the name is whatever
/// literal text remains once those tokens, any header phrase and any type
/// keyword are removed.
pub(crate) fn extract_pre_date(zone: &str, rules: &Rules) -> PreDateFields {
    let mut removed: Vec<(usize, usize)> = Vec::new();
    let mut fields = PreDateFields::default();

    if let Some(first) = tokens(zone).next()
        && is_sequential(first.as_str())
    {
        fields.sequential = first.as_str().parse().ok();
        removed.push((first.start(), first.end()));
    }

    if let Some(code) = first_token(zone, is_employer_code) {
        fields.employer_code = Some(code.as_str().to_string());
        removed.push((code.start(), code.end()));
    }

    if let Some(nit) = first_token(zone, |t| is_nit(t) && !is_employer_code(t)) {
        fields.worker_nit = Some(nit.as_str().to_string());
        removed.push((nit.start(), nit.end()));
    }

    if let Some(re) = &rules.header_phrase_re {
        for phrase in re.find_iter(zone) {
            removed.push((phrase.start(), phrase.end()));
        }
    }

    for keyword in rules.type_keyword_matches(zone) {
        removed.push((keyword.start(), keyword.end()));
    }

    removed.sort_unstable();
    let mut remainder = String::with_capacity(zone.len());
    let mut cursor = 0;
    for (start, end) in removed {
        if start < cursor {
            continue;
        }
        remainder.push_str(&zone[cursor..start]);
        // Removed tokens act as column separators.
        remainder.push_str("  ");
        cursor = end;
    }
    remainder.push_str(&zone[cursor..]);

    let columns = split_columns(&remainder);
    if let Some((name, rest)) = columns.split_first() {
        if !is_header_like(name, rules) {
            fields.employer_name = Some(name.to_string());
        }
        let origin: Vec<&str> = rest
            .iter()
            .copied()
            .filter(|c| !is_header_like(c, rules))
            .collect();
        if !origin.is_empty() {
            fields.origin = Some(origin.join(" "));
        }
    }

    fields
}

/// Last-paid competency and registration number from the inter zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterFields {
    pub last_paid_competency: Option<Competency>,
    pub registration_number: Option<String>,
}

pub(crate) fn extract_inter(zone: &str, rules: &Rules) -> InterFields {
    let last_paid_competency = first_competency_token(zone);
    let registration_number = first_token(zone, |t| is_registration_number(t, rules))
        .map(|m| m.as_str().to_string());
    InterFields {
        last_paid_competency,
        registration_number,
    }
}

pub(crate) fn first_competency_token(zone: &str) -> Option<Competency> {
    tokens(zone).find_map(|m| m.as_str().parse::<Competency>().ok())
}

fn is_registration_number(token: &str, rules: &Rules) -> bool {
    let edge_ok = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    token.chars().count() >= rules.min_registration_len
        && edge_ok(token.chars().next())
        && edge_ok(token.chars().next_back())
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '/'))
        && token.parse::<Competency>().is_err()
        && parse_date(token).is_none()
        && find_date_tokens(token).is_empty()
}

/// Short uppercase tokens after the type keyword, de-duplicated in order.
pub(crate) fn extract_indicators(zone: &str, rules: &Rules) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for m in tokens(zone) {
        let token = m.as_str().trim_end_matches([',', ';']);
        if is_indicator(token, rules) && !out.iter().any(|seen| seen == token) {
            out.push(token.to_string());
        }
    }
    out
}

fn is_indicator(token: &str, rules: &Rules) -> bool {
    let len = token.chars().count();
    (2..=rules.max_indicator_len).contains(&len)
        && token.starts_with(|c: char| c.is_ascii_uppercase())
        && !token.ends_with('-')
        && token
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '-')
        && !rules.indicator_stopwords.iter().any(|w| w == token)
}

/// Build a fresh record from a trigger line.
///
/// `previous_line` is the non-blank line right before the trigger, used as the
/// employer name when the trigger line itself carries none.
pub(crate) fn parse_trigger_line(
    line: &str,
    previous_line: Option<&str>,
    rules: &Rules,
) -> EmploymentRecord {
    let zones = split_zones(line, rules);
    let mut record = EmploymentRecord::new(resolve_relationship_type(zones.after_keyword));

    let dates = find_date_tokens(line);
    record.start_date = dates.first().and_then(|m| parse_date(m.as_str()));
    record.end_date = dates.get(1).and_then(|m| parse_date(m.as_str()));

    let pre = extract_pre_date(zones.pre_date, rules);
    record.sequential = pre.sequential;
    record.worker_registration_id = pre.worker_nit;
    record.employer_code = pre.employer_code;
    record.origin = pre.origin;
    record.employer_name = pre.employer_name.or_else(|| {
        previous_line
            .map(str::trim)
            .filter(|l| !l.is_empty() && !is_header_like(l, rules))
            .map(str::to_string)
    });

    let inter = extract_inter(zones.inter, rules);
    record.registration_number = inter.registration_number;
    record.last_paid_competency = inter
        .last_paid_competency
        .or_else(|| first_competency_token(zones.post_keyword));

    record.indicators = extract_indicators(zones.post_keyword, rules);
    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnis_core::RelationshipType;

    fn rules() -> Rules {
        Rules::default()
    }

    #[test]
    fn test_example_line() {
        let line = "1  12.345.678/0001-99  ACME LTDA  01/01/2010  31/12/2012  Empregado";
        let record = parse_trigger_line(line, None, &rules());
        assert_eq!(record.sequential, Some(1));
        assert_eq!(record.employer_code.as_deref(), Some("12.345.678/0001-99"));
        assert_eq!(record.employer_name.as_deref(), Some("ACME LTDA"));
        assert_eq!(record.start_date.unwrap().to_string(), "01/01/2010");
        assert_eq!(record.end_date.unwrap().to_string(), "31/12/2012");
        assert_eq!(record.relationship_type, RelationshipType::Employee);
        assert!(record.indicators.is_empty());
        assert!(record.origin.is_none());
    }

    #[test]
    fn test_full_line_all_zones() {
        let line = "2  123.45678.90-1  98.765.432/0001-10  BETA INDUSTRIA S/A  01/02/2013  15/06/2014  06/2014  MAT9981  Empregado  PEXT  IREM-INDPEND  PEXT";
        let record = parse_trigger_line(line, None, &rules());
        assert_eq!(record.sequential, Some(2));
        assert_eq!(record.worker_registration_id.as_deref(), Some("123.45678.90-1"));
        assert_eq!(record.employer_code.as_deref(), Some("98.765.432/0001-10"));
        assert_eq!(record.employer_name.as_deref(), Some("BETA INDUSTRIA S/A"));
        assert_eq!(record.last_paid_competency.unwrap().to_string(), "06/2014");
        assert_eq!(record.registration_number.as_deref(), Some("MAT9981"));
        assert_eq!(record.indicators, vec!["PEXT", "IREM-INDPEND"]);
    }

    #[test]
    fn test_single_spaced_line() {
        let line = "3 12.345.678/0001-99 ACME COMERCIO LTDA 01/01/2010 Empregado";
        let record = parse_trigger_line(line, None, &rules());
        assert_eq!(record.employer_name.as_deref(), Some("ACME COMERCIO LTDA"));
        assert!(record.end_date.is_none());
    }

    #[test]
    fn test_name_and_origin_columns() {
        let pre = extract_pre_date("4  12.345.678/0001-99  ACME LTDA  FILIAL CAMPINAS  ", &rules());
        assert_eq!(pre.employer_name.as_deref(), Some("ACME LTDA"));
        assert_eq!(pre.origin.as_deref(), Some("FILIAL CAMPINAS"));
    }

    #[test]
    fn test_name_from_previous_line() {
        let line = "5  12.345.678/0001-99  01/01/2010  Empregado";
        let record = parse_trigger_line(line, Some("  GAMA SERVICOS LTDA "), &rules());
        assert_eq!(record.employer_name.as_deref(), Some("GAMA SERVICOS LTDA"));

        let record = parse_trigger_line(line, Some("Código Emp.  Origem do Vínculo"), &rules());
        assert!(record.employer_name.is_none());
    }

    #[test]
    fn test_name_on_header_phrase_trigger() {
        let line = "Código Emp.  12.345.678/0001-99  ACME LTDA  01/01/2020  Empregado";
        let record = parse_trigger_line(line, None, &rules());
        assert_eq!(record.employer_code.as_deref(), Some("12.345.678/0001-99"));
        assert_eq!(record.employer_name.as_deref(), Some("ACME LTDA"));
        assert!(record.origin.is_none());

        let record = parse_trigger_line("Origem do Vínculo ACME 01/01/2010 Empregado", None, &rules());
        assert_eq!(record.employer_name.as_deref(), Some("ACME"));
    }

    #[test]
    fn test_header_like_name_is_absent() {
        let pre = extract_pre_date("Origem do Vínculo  ", &rules());
        assert!(pre.employer_name.is_none());
    }

    #[test]
    fn test_registration_number_skips_month_year() {
        let inter = extract_inter("  03/2020  AB12  ", &rules());
        assert_eq!(inter.last_paid_competency.unwrap().to_string(), "03/2020");
        assert_eq!(inter.registration_number.as_deref(), Some("AB12"));

        let inter = extract_inter("  03/2020  12  ", &rules());
        assert!(inter.registration_number.is_none());
    }

    #[test]
    fn test_indicators_exclude_cpf_nit_and_lowercase() {
        let found = extract_indicators(" ou Agente Público  CPF  NIT  AEXT-VT  PREM-EXT  x", &rules());
        assert_eq!(found, vec!["AEXT-VT", "PREM-EXT"]);
    }

    #[test]
    fn test_domestic_type_resolved() {
        let line = "6  ANA PAULA  01/01/2018  Empregado Doméstico";
        let record = parse_trigger_line(line, None, &rules());
        assert_eq!(record.relationship_type, RelationshipType::DomesticEmployee);
    }

    #[test]
    fn test_invalid_date_is_absent() {
        let line = "7  ACME  31/02/2010  Empregado";
        let record = parse_trigger_line(line, None, &rules());
        assert!(record.start_date.is_none());
        assert_eq!(record.sequential, Some(7));
    }

    #[test]
    fn test_keyword_before_dates() {
        let zones = split_zones("8  ACME  Empregado  01/01/2010  PEXT", &rules());
        assert_eq!(zones.inter, "");
        assert_eq!(zones.post_keyword, "  PEXT");
        assert_eq!(zones.pre_date, "8  ACME  Empregado  ");
        let record = parse_trigger_line("8  ACME  Empregado  01/01/2010  PEXT", None, &rules());
        assert_eq!(record.employer_name.as_deref(), Some("ACME"));
        assert_eq!(record.indicators, vec!["PEXT"]);
    }
}
