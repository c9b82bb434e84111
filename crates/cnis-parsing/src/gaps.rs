use std::collections::HashSet;

use cnis_core::{Competency, EmploymentRecord};

/// The month that closes the expected range: the end date's month/year when
/// present, otherwise the last paid competency. Never inferred beyond that.
pub fn effective_end(record: &EmploymentRecord) -> Option<Competency> {
    record
        .end_date
        .map(|d| d.competency())
        .or(record.last_paid_competency)
}

/// Every competency from `start` to `end`, inclusive, one month at a time.
///
/// Empty when `start` is after `end`.
pub fn competency_range(start: Competency, end: Competency) -> Vec<Competency> {
    let mut out = Vec::new();
    let mut current = start;
    while current <= end {
        out.push(current);
        current = current.next();
    }
    out
}

/// Elements of `expected`, in order, that were never observed.
pub fn missing_competencies(
    expected: &[Competency],
    observed: impl IntoIterator<Item = Competency>,
) -> Vec<Competency> {
    let seen: HashSet<Competency> = observed.into_iter().collect();
    expected
        .iter()
        .filter(|c| !seen.contains(c))
        .copied()
        .collect()
}

/// Fill `expected_competencies` and `missing_competencies` on a closed record.
///
/// Both stay empty unless the start date and an effective end resolve.
pub fn apply_gap_analysis(record: &mut EmploymentRecord) {
    let (Some(start), Some(end)) = (record.start_date, effective_end(record)) else {
        record.expected_competencies.clear();
        record.missing_competencies.clear();
        return;
    };
    let expected = competency_range(start.competency(), end);
    let missing = missing_competencies(&expected, record.observed_competencies());
    record.expected_competencies = expected;
    record.missing_competencies = missing;
}

#[cfg(test)]
mod tests {
    use super::*;
    use cnis_core::{CnisDate, RelationshipType, Remuneration};

    fn comp(s: &str) -> Competency {
        s.parse().unwrap()
    }

    fn rendered(list: &[Competency]) -> Vec<String> {
        list.iter().map(|c| c.to_string()).collect()
    }

    fn paid(record: &mut EmploymentRecord, c: &str, amount: f64) {
        record.remunerations.push(Remuneration {
            competency: comp(c),
            amount: Some(amount),
        });
    }

    #[test]
    fn test_range_crosses_year() {
        let range = competency_range(comp("11/2019"), comp("02/2020"));
        assert_eq!(rendered(&range), vec!["11/2019", "12/2019", "01/2020", "02/2020"]);
    }

    #[test]
    fn test_range_single_month_and_degenerate() {
        assert_eq!(competency_range(comp("05/2020"), comp("05/2020")).len(), 1);
        assert!(competency_range(comp("06/2020"), comp("05/2020")).is_empty());
    }

    #[test]
    fn test_last_paid_used_when_no_end_date() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.start_date = CnisDate::new(1, 1, 2020);
        record.last_paid_competency = Some(comp("03/2020"));
        paid(&mut record, "01/2020", 1000.0);
        paid(&mut record, "03/2020", 1000.0);

        apply_gap_analysis(&mut record);
        assert_eq!(
            rendered(&record.expected_competencies),
            vec!["01/2020", "02/2020", "03/2020"]
        );
        assert_eq!(rendered(&record.missing_competencies), vec!["02/2020"]);
    }

    #[test]
    fn test_end_date_has_priority() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.start_date = CnisDate::new(15, 11, 2019);
        record.end_date = CnisDate::new(10, 1, 2020);
        record.last_paid_competency = Some(comp("06/2020"));
        apply_gap_analysis(&mut record);
        assert_eq!(
            rendered(&record.expected_competencies),
            vec!["11/2019", "12/2019", "01/2020"]
        );
        assert_eq!(record.missing_competencies, record.expected_competencies);
    }

    #[test]
    fn test_no_analysis_without_endpoints() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.start_date = CnisDate::new(1, 1, 2020);
        paid(&mut record, "01/2020", 1.0);
        apply_gap_analysis(&mut record);
        assert!(record.expected_competencies.is_empty());
        assert!(record.missing_competencies.is_empty());

        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.last_paid_competency = Some(comp("01/2020"));
        apply_gap_analysis(&mut record);
        assert!(record.expected_competencies.is_empty());
    }

    #[test]
    fn test_start_after_end_is_empty() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.start_date = CnisDate::new(1, 5, 2021);
        record.end_date = CnisDate::new(1, 1, 2021);
        apply_gap_analysis(&mut record);
        assert!(record.expected_competencies.is_empty());
        assert!(record.missing_competencies.is_empty());
    }

    #[test]
    fn test_observations_outside_range_are_kept() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.start_date = CnisDate::new(1, 1, 2020);
        record.end_date = CnisDate::new(31, 1, 2020);
        paid(&mut record, "01/2020", 1.0);
        paid(&mut record, "07/2021", 1.0);
        apply_gap_analysis(&mut record);
        assert_eq!(record.remunerations.len(), 2);
        assert!(record.missing_competencies.is_empty());
    }

    #[test]
    fn test_missing_union_observed_equals_expected() {
        let expected = competency_range(comp("01/2018"), comp("12/2019"));
        let observed = vec![comp("03/2018"), comp("03/2018"), comp("11/2019"), comp("01/2025")];
        let missing = missing_competencies(&expected, observed.clone());

        let mut union: Vec<Competency> = missing.clone();
        union.extend(observed.iter().filter(|c| expected.contains(c)));
        union.sort();
        union.dedup();
        assert_eq!(union, expected);
        assert_eq!(missing.len(), expected.len() - 2);
    }
}
