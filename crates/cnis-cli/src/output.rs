use std::io::Write;

use cnis_core::{Competency, EmploymentRecord, ParseResult, SkipStats};
use cnis_parsing::{CnisExtractor, LineKind};
use owo_colors::OwoColorize;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

/// Collapse consecutive competencies into `MM/YYYY-MM/YYYY` runs.
pub fn format_competency_runs(list: &[Competency]) -> String {
    let mut runs: Vec<(Competency, Competency)> = Vec::new();
    for &c in list {
        match runs.last_mut() {
            Some((_, end)) if end.next() == c => *end = c,
            _ => runs.push((c, c)),
        }
    }
    runs.iter()
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{}-{}", start, end)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Print the statement summary: holder, then one block per employment record.
pub fn print_summary(
    w: &mut dyn Write,
    file_name: &str,
    result: &ParseResult,
    stats: &SkipStats,
    color: ColorMode,
) -> std::io::Result<()> {
    let id = &result.identification;
    if color.enabled() {
        writeln!(w, "{} {}", "Statement:".bold(), file_name.bold())?;
    } else {
        writeln!(w, "Statement: {}", file_name)?;
    }
    writeln!(w, "  Holder: {}", or_dash(id.name.as_deref()))?;
    writeln!(w, "  CPF:    {}", or_dash(id.cpf.as_deref()))?;
    writeln!(w, "  NIT:    {}", or_dash(id.nit.as_deref()))?;
    writeln!(w)?;

    writeln!(w, "Found {} employment records", result.vinculos.len())?;
    let skipped = stats.non_employee_records + stats.phantom_records;
    if skipped > 0 || stats.orphan_remunerations > 0 {
        let line = format!(
            "(Skipped {} non-employee, {} empty rows; {} remunerations outside any record)",
            stats.non_employee_records, stats.phantom_records, stats.orphan_remunerations
        );
        if color.enabled() {
            writeln!(w, "{}", line.dimmed())?;
        } else {
            writeln!(w, "{}", line)?;
        }
    }
    writeln!(w)?;

    for (i, record) in result.vinculos.iter().enumerate() {
        print_record(w, i, record, color)?;
    }

    let total_missing: usize = result
        .vinculos
        .iter()
        .map(|r| r.missing_competencies.len())
        .sum();
    if color.enabled() {
        if total_missing == 0 {
            writeln!(w, "{}", "No missing competencies".green().bold())?;
        } else {
            writeln!(
                w,
                "{}",
                format!("{} missing competencies in total", total_missing)
                    .red()
                    .bold()
            )?;
        }
    } else if total_missing == 0 {
        writeln!(w, "No missing competencies")?;
    } else {
        writeln!(w, "{} missing competencies in total", total_missing)?;
    }
    Ok(())
}

fn print_record(
    w: &mut dyn Write,
    index: usize,
    record: &EmploymentRecord,
    color: ColorMode,
) -> std::io::Result<()> {
    let header = format!(
        "[{}] {}",
        record
            .sequential
            .map_or_else(|| format!("#{}", index + 1), |s| s.to_string()),
        record.employer_name.as_deref().unwrap_or("(employer not named)")
    );
    if color.enabled() {
        writeln!(w, "{}", header.bold().yellow())?;
    } else {
        writeln!(w, "{}", header)?;
    }

    writeln!(w, "  Employer code: {}", or_dash(record.employer_code.as_deref()))?;
    writeln!(
        w,
        "  Period:        {} to {}",
        or_dash(record.start_date),
        or_dash(record.end_date)
    )?;
    writeln!(w, "  Last paid:     {}", or_dash(record.last_paid_competency))?;
    if let Some(ref registration) = record.registration_number {
        writeln!(w, "  Registration:  {}", registration)?;
    }
    if !record.indicators.is_empty() {
        writeln!(w, "  Indicators:    {}", record.indicators.join(", "))?;
    }
    writeln!(
        w,
        "  Remunerations: {} ({} months expected)",
        record.remunerations.len(),
        record.expected_competencies.len()
    )?;

    if !record.missing_competencies.is_empty() {
        let runs = format_competency_runs(&record.missing_competencies);
        if color.enabled() {
            writeln!(w, "  Missing:       {}", runs.red())?;
        } else {
            writeln!(w, "  Missing:       {}", runs)?;
        }
    } else if !record.expected_competencies.is_empty() {
        if color.enabled() {
            writeln!(w, "  Missing:       {}", "none".green())?;
        } else {
            writeln!(w, "  Missing:       none")?;
        }
    }
    writeln!(w)?;
    Ok(())
}

fn kind_label(kind: LineKind) -> &'static str {
    match kind {
        LineKind::Blank => "blank",
        LineKind::Header => "header",
        LineKind::Noise => "noise",
        LineKind::Trigger => "record",
        LineKind::ForeignBoundary => "foreign",
        LineKind::Remuneration => "remun",
        LineKind::Identification => "holder",
        LineKind::Other => "",
    }
}

/// Print every line prefixed with its classification.
pub fn print_line_kinds(
    w: &mut dyn Write,
    text: &str,
    extractor: &CnisExtractor,
    color: ColorMode,
) -> std::io::Result<()> {
    for (i, line) in text.lines().enumerate() {
        let kind = extractor.classify_line(line);
        if kind == LineKind::Blank {
            continue;
        }
        let label = format!("{:>7}", kind_label(kind));
        if color.enabled() {
            let label = match kind {
                LineKind::Trigger => label.green().bold().to_string(),
                LineKind::ForeignBoundary => label.yellow().to_string(),
                LineKind::Remuneration => label.cyan().to_string(),
                _ => label.dimmed().to_string(),
            };
            writeln!(w, "{:>5} {} | {}", i + 1, label, line)?;
        } else {
            writeln!(w, "{:>5} {} | {}", i + 1, label, line)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn comps(list: &[&str]) -> Vec<Competency> {
        list.iter().map(|s| s.parse().unwrap()).collect()
    }

    #[test]
    fn test_format_competency_runs() {
        let list = comps(&["11/2019", "12/2019", "01/2020", "05/2020", "07/2020", "08/2020"]);
        assert_eq!(
            format_competency_runs(&list),
            "11/2019-01/2020, 05/2020, 07/2020-08/2020"
        );
        assert_eq!(format_competency_runs(&[]), "");
    }

    #[test]
    fn test_summary_plain_text() {
        let result = cnis_parsing::parse(
            "Nome: ANA LIMA\n1  ACME LTDA  01/01/2020  31/03/2020  Empregado  PEXT\n01/2020  1.000,00\n",
        );
        let mut buf = Vec::new();
        print_summary(&mut buf, "extrato.txt", &result, &SkipStats::default(), ColorMode(false))
            .unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert!(out.contains("Holder: ANA LIMA"));
        assert!(out.contains("[1] ACME LTDA"));
        assert!(out.contains("Indicators:    PEXT"));
        assert!(out.contains("Missing:       02/2020-03/2020"));
        assert!(out.contains("2 missing competencies in total"));
    }

    #[test]
    fn test_line_kinds_skip_blank() {
        let mut buf = Vec::new();
        let text = "\n1  ACME  01/01/2020  Empregado\n01/2020 5,00\n";
        print_line_kinds(&mut buf, text, &CnisExtractor::new(), ColorMode(false)).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out.lines().count(), 2);
        assert!(out.lines().next().unwrap().contains(" record | 1  ACME"));
    }
}
