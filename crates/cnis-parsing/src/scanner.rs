//! Single-pass record accumulator.
//!
//! The scan is a fold over the document lines. Its state is explicit: no
//! record yet, an open record with its block of lines, or a foreign
//! relationship block whose lines belong to nobody. Opening a record always
//! closes the previous one first.

use cnis_core::{EmploymentRecord, RelationshipType, Remuneration, SkipStats};

use crate::classify::{LineKind, Rules, classify};
use crate::fields::parse_trigger_line;
use crate::identifiers::find_competencies;
use crate::remuneration;

#[derive(Debug, Clone)]
struct BlockLine {
    kind: LineKind,
    text: String,
}

#[derive(Debug)]
enum ScanState {
    Idle,
    Open {
        record: EmploymentRecord,
        block: Vec<BlockLine>,
    },
    Foreign,
}

pub(crate) struct Scanner<'r> {
    rules: &'r Rules,
    state: ScanState,
    /// Last non-blank line and its kind.
    previous: Option<BlockLine>,
    records: Vec<EmploymentRecord>,
    stats: SkipStats,
}

impl<'r> Scanner<'r> {
    pub fn new(rules: &'r Rules) -> Self {
        Self {
            rules,
            state: ScanState::Idle,
            previous: None,
            records: Vec::new(),
            stats: SkipStats::default(),
        }
    }

    /// Feed one line.
    pub fn step(mut self, line: &str) -> Self {
        let kind = classify(line, self.rules);
        match kind {
            LineKind::Blank => return self,
            LineKind::Trigger => {
                self.stats.triggers += 1;
                let name_candidate = self
                    .previous
                    .as_ref()
                    .filter(|p| p.kind == LineKind::Other)
                    .map(|p| p.text.as_str());
                let record = parse_trigger_line(line, name_candidate, self.rules);
                self.close();
                self.state = ScanState::Open {
                    record,
                    block: Vec::new(),
                };
            }
            LineKind::ForeignBoundary => {
                self.stats.triggers += 1;
                self.stats.non_employee_records += 1;
                tracing::debug!(line, "foreign relationship row closes block");
                self.close();
                self.state = ScanState::Foreign;
            }
            _ => self.absorb(kind, line),
        }
        self.previous = Some(BlockLine {
            kind,
            text: line.to_string(),
        });
        self
    }

    /// Close any open record and hand back everything emitted.
    pub fn finish(mut self) -> (Vec<EmploymentRecord>, SkipStats) {
        self.close();
        (self.records, self.stats)
    }

    fn absorb(&mut self, kind: LineKind, line: &str) {
        let found = remuneration::scan(line, self.rules);
        match &mut self.state {
            ScanState::Open { record, block } => {
                for m in found {
                    if m.amount.is_none() {
                        self.stats.unparseable_amounts += 1;
                    }
                    record.remunerations.push(Remuneration {
                        competency: m.competency,
                        amount: m.amount,
                    });
                }
                block.push(BlockLine {
                    kind,
                    text: line.to_string(),
                });
            }
            ScanState::Idle | ScanState::Foreign => {
                self.stats.orphan_remunerations += found.len();
            }
        }
    }

    fn close(&mut self) {
        let ScanState::Open { mut record, block } =
            std::mem::replace(&mut self.state, ScanState::Idle)
        else {
            return;
        };

        if record.last_paid_competency.is_none() {
            record.last_paid_competency = block
                .iter()
                .filter(|l| {
                    !matches!(
                        l.kind,
                        LineKind::Noise | LineKind::Header | LineKind::Identification
                    )
                })
                .flat_map(|l| find_competencies(&l.text))
                .last();
        }

        if record.relationship_type != RelationshipType::Employee {
            self.stats.non_employee_records += 1;
            tracing::debug!(
                sequential = ?record.sequential,
                kind = ?record.relationship_type,
                "dropping non-employee record"
            );
            return;
        }
        if !record.has_substantive_content() {
            self.stats.phantom_records += 1;
            tracing::debug!("dropping phantom record");
            return;
        }

        tracing::debug!(
            sequential = ?record.sequential,
            employer = ?record.employer_name,
            remunerations = record.remunerations.len(),
            "closed employment record"
        );
        self.records.push(record);
    }
}
