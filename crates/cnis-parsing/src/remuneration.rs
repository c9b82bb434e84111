use once_cell::sync::Lazy;
use regex::Regex;

use cnis_core::Competency;

use crate::classify::Rules;
use crate::identifiers::parse_brl_amount;
use crate::text_processing::{is_isolated, next_char};

/// One competency + amount pair found on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct RemunerationMatch {
    pub competency: Competency,
    /// `None` when the numeric token is present but unreadable.
    pub amount: Option<f64>,
}

static REMUNERATION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{2}/\d{4})\s+(-?\d[\d.,]*)").unwrap());

/// `14:32` after a competency is a time stamp, not an amount.
fn is_clock_time(line: &str, amount_end: usize) -> bool {
    line[amount_end..].starts_with(':')
}

/// Find every `MM/YYYY <amount>` pair on a line, left to right.
///
/// The competency must not be the tail of a full date and the amount must not
/// be the head of another date-like token. A competency with an impossible
/// month is not a match.
pub(crate) fn scan(line: &str, rules: &Rules) -> Vec<RemunerationMatch> {
    let re = rules.remuneration_re.as_ref().unwrap_or(&REMUNERATION_RE);
    let mut found = Vec::new();
    let mut at = 0;

    while at <= line.len() {
        let Some(caps) = re.captures_at(line, at) else {
            break;
        };
        let (Some(whole), Some(comp), Some(amount)) = (caps.get(0), caps.get(1), caps.get(2))
        else {
            break;
        };
        if !is_isolated(line, comp.start(), comp.end())
            || !is_isolated(line, amount.start(), amount.end())
            || is_clock_time(line, amount.end())
        {
            // The rejected span may still hold the start of a real pair.
            at = next_char(line, comp.start());
            continue;
        }
        at = whole.end().max(next_char(line, whole.start()));
        let Ok(competency) = comp.as_str().parse::<Competency>() else {
            continue;
        };
        let amount = parse_brl_amount(amount.as_str());
        tracing::trace!(%competency, ?amount, "remuneration match");
        found.push(RemunerationMatch { competency, amount });
    }

    found
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan_default(line: &str) -> Vec<RemunerationMatch> {
        scan(line, &Rules::default())
    }

    #[test]
    fn test_single_pair() {
        let found = scan_default("01/2020   1.500,00");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].competency.to_string(), "01/2020");
        assert_eq!(found[0].amount, Some(1500.0));
    }

    #[test]
    fn test_negative_amount_kept() {
        let found = scan_default("02/2020 -150,00");
        assert_eq!(found[0].amount, Some(-150.0));
    }

    #[test]
    fn test_multiple_pairs_per_line() {
        let found = scan_default("01/2020 1.000,00   02/2020 1.100,00   03/2020 1.200,00 IREM-INDPEND");
        let comps: Vec<_> = found.iter().map(|m| m.competency.to_string()).collect();
        assert_eq!(comps, vec!["01/2020", "02/2020", "03/2020"]);
        assert_eq!(found[2].amount, Some(1200.0));
    }

    #[test]
    fn test_date_spans_are_not_remunerations() {
        assert!(scan_default("01/01/2010  31/12/2012").is_empty());
        assert!(scan_default("12/2012 01/2013").is_empty());
        assert!(scan_default("13/2012 1.000,00").is_empty());
    }

    #[test]
    fn test_pair_after_full_date() {
        let found = scan_default("Emitido em 10/10/2023  01/2020 1.234,56");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].competency.to_string(), "01/2020");
    }

    #[test]
    fn test_time_of_day_is_not_an_amount() {
        assert!(scan_default("12/2019 14:32").is_empty());
        let found = scan_default("12/2019 14:32   01/2020 900,00");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].competency.to_string(), "01/2020");
    }

    #[test]
    fn test_unreadable_amount_is_absent() {
        let found = scan_default("05/2021 1,2,3");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, None);
    }

    #[test]
    fn test_custom_pattern() {
        let config = crate::ParsingConfigBuilder::new()
            .remuneration_regex(r"(\d{2}/\d{4});(-?[\d.,]+)")
            .build()
            .unwrap();
        let rules = Rules::from_config(&config);
        let found = scan("07/2019;2.000,00", &rules);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].amount, Some(2000.0));
        assert!(scan("07/2019 2.000,00", &rules).is_empty());
    }
}
