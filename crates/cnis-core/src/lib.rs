use serde::{Deserialize, Serialize};

pub mod backend;
pub mod competency;
pub mod config_file;

pub use backend::{BackendError, PdfBackend};
pub use competency::{CnisDate, Competency, TokenError};

/// Holder identification found anywhere in the statement.
///
/// Every field is the literal matched text. Nothing is normalized or
/// checksum-validated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identification {
    #[serde(rename = "nome", default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpf: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nit: Option<String>,
}

impl Identification {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.cpf.is_none() && self.nit.is_none()
    }
}

/// The "Tipo Filiado no Vínculo" column resolved from a record-start line.
///
/// Only [`RelationshipType::Employee`] records are ever materialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelationshipType {
    #[serde(rename = "EMPREGADO")]
    Employee,
    #[serde(rename = "EMPREGADO_DOMESTICO")]
    DomesticEmployee,
}

/// One salary line: a competency and the amount printed next to it.
///
/// `amount` is `None` when the numeric token could not be read. Negative
/// amounts (corrections) are kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Remuneration {
    #[serde(rename = "competencia")]
    pub competency: Competency,
    #[serde(rename = "valor")]
    pub amount: Option<f64>,
}

/// One employment relationship ("vínculo") of type EMPLOYEE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmploymentRecord {
    #[serde(rename = "sequencial")]
    pub sequential: Option<u32>,
    #[serde(rename = "nit_vinculo")]
    pub worker_registration_id: Option<String>,
    #[serde(rename = "empregador_nome")]
    pub employer_name: Option<String>,
    #[serde(rename = "empregador_codigo")]
    pub employer_code: Option<String>,
    #[serde(rename = "origem")]
    pub origin: Option<String>,
    #[serde(rename = "tipo_vinculo")]
    pub relationship_type: RelationshipType,
    #[serde(rename = "data_inicio")]
    pub start_date: Option<CnisDate>,
    #[serde(rename = "data_fim")]
    pub end_date: Option<CnisDate>,
    #[serde(rename = "ultima_remuneracao")]
    pub last_paid_competency: Option<Competency>,
    #[serde(rename = "matricula")]
    pub registration_number: Option<String>,
    #[serde(rename = "indicadores")]
    pub indicators: Vec<String>,
    #[serde(rename = "remuneracoes")]
    pub remunerations: Vec<Remuneration>,
    #[serde(rename = "competencias_esperadas")]
    pub expected_competencies: Vec<Competency>,
    #[serde(rename = "competencias_faltantes")]
    pub missing_competencies: Vec<Competency>,
}

impl EmploymentRecord {
    pub fn new(relationship_type: RelationshipType) -> Self {
        Self {
            sequential: None,
            worker_registration_id: None,
            employer_name: None,
            employer_code: None,
            origin: None,
            relationship_type,
            start_date: None,
            end_date: None,
            last_paid_competency: None,
            registration_number: None,
            indicators: Vec::new(),
            remunerations: Vec::new(),
            expected_competencies: Vec::new(),
            missing_competencies: Vec::new(),
        }
    }

    /// Whether the record carries at least one identifying attribute.
    ///
    /// Records without any of these are phantoms and are never emitted.
    pub fn has_substantive_content(&self) -> bool {
        self.start_date.is_some()
            || self.sequential.is_some()
            || self.employer_code.is_some()
            || self.employer_name.is_some()
            || self.worker_registration_id.is_some()
    }

    /// Competencies actually observed in the remuneration lines, in document order.
    pub fn observed_competencies(&self) -> impl Iterator<Item = Competency> + '_ {
        self.remunerations.iter().map(|r| r.competency)
    }
}

/// Result of parsing one CNIS statement.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParseResult {
    #[serde(rename = "identificacao")]
    pub identification: Identification,
    pub vinculos: Vec<EmploymentRecord>,
}

/// Counters describing what the extractor saw but did not emit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipStats {
    /// Record-start lines recognized (employee and non-employee).
    pub triggers: usize,
    /// Records dropped for carrying no identifying attribute.
    pub phantom_records: usize,
    /// Records dropped because their type was not EMPLOYEE.
    pub non_employee_records: usize,
    /// Remuneration matches found while no employee record was open.
    pub orphan_remunerations: usize,
    /// Remuneration matches whose amount token could not be read.
    pub unparseable_amounts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phantom_detection() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        assert!(!record.has_substantive_content());

        record.indicators.push("PEXT".into());
        record.registration_number = Some("12345".into());
        assert!(!record.has_substantive_content());

        record.sequential = Some(2);
        assert!(record.has_substantive_content());
    }

    #[test]
    fn test_identification_omits_absent_fields() {
        let id = Identification {
            cpf: Some("123.456.789-00".into()),
            ..Default::default()
        };
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json, serde_json::json!({ "cpf": "123.456.789-00" }));
    }

    #[test]
    fn test_record_json_shape() {
        let mut record = EmploymentRecord::new(RelationshipType::Employee);
        record.start_date = CnisDate::new(1, 1, 2020);
        record.remunerations.push(Remuneration {
            competency: Competency::new(1, 2020).unwrap(),
            amount: Some(-150.0),
        });
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["tipo_vinculo"], "EMPREGADO");
        assert_eq!(json["data_inicio"], "01/01/2020");
        assert_eq!(json["data_fim"], serde_json::Value::Null);
        assert_eq!(json["remuneracoes"][0]["competencia"], "01/2020");
        assert_eq!(json["remuneracoes"][0]["valor"], -150.0);
    }

    #[test]
    fn test_relationship_type_values() {
        let domestic: RelationshipType = serde_json::from_str("\"EMPREGADO_DOMESTICO\"").unwrap();
        assert_eq!(domestic, RelationshipType::DomesticEmployee);
        assert!(serde_json::from_str::<RelationshipType>("\"OUTRO\"").is_err());
    }
}
