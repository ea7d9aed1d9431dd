use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use shared_utils::params::{empty_as_none, DateBound};

fn default_true() -> bool {
    true
}

// ==============================================================================
// TREATMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Treatment {
    pub id: i64,
    pub consultation_id: i64,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub instructions: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TreatmentInput {
    pub consultation_id: i64,
    pub description: String,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    pub instructions: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

/// Summary of the consultation a treatment was prescribed in.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsultationInfo {
    pub id: i64,
    pub patient: String,
    pub doctor: String,
    pub scheduled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TreatmentView {
    #[serde(flatten)]
    pub treatment: Treatment,
    pub consultation_info: Option<ConsultationInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct TreatmentFilters {
    /// Consultation id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub consultation: Option<i64>,
    /// Patient id, through the consultation.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub patient: Option<i64>,
    /// Doctor id, through the consultation.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub doctor: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<NaiveDate>,
    /// Matches description or instructions.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `start_date`, `end_date`; prefix with `-` for descending.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ordering: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<usize>,
}

// ==============================================================================
// PRESCRIPTION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Prescription {
    pub id: i64,
    pub treatment_id: i64,
    pub medication_id: i64,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub total_quantity: i32,
    pub special_instructions: String,
    pub issued_on: NaiveDate,
}

/// `issued_on` is not accepted: it is stamped when the prescription is created.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PrescriptionInput {
    pub treatment_id: i64,
    pub medication_id: i64,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub total_quantity: i32,
    #[serde(default)]
    pub special_instructions: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TreatmentInfo {
    pub id: i64,
    pub description: String,
    pub patient: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PrescriptionView {
    #[serde(flatten)]
    pub prescription: Prescription,
    pub medication_name: String,
    pub treatment_info: Option<TreatmentInfo>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PrescriptionFilters {
    /// Treatment id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub treatment: Option<i64>,
    /// Medication id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub medication: Option<i64>,
    /// Patient id, through the treatment's consultation.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub patient: Option<i64>,
    /// Earliest `issued_on`, inclusive.
    #[serde(default, deserialize_with = "empty_as_none")]
    #[param(value_type = Option<String>)]
    pub date_from: Option<DateBound>,
    /// Latest `issued_on`, inclusive.
    #[serde(default, deserialize_with = "empty_as_none")]
    #[param(value_type = Option<String>)]
    pub date_to: Option<DateBound>,
    /// Matches dosage or medication name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `issued_on`; prefix with `-` for descending.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ordering: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn treatment_end_date_is_optional() {
        let input: TreatmentInput = serde_json::from_value(serde_json::json!({
            "consultation_id": 3,
            "description": "Antibiotic course",
            "start_date": "2025-02-01",
            "instructions": "Take with food"
        }))
        .unwrap();

        assert_eq!(input.end_date, None);
        assert!(input.active);
    }

    #[test]
    fn prescription_input_ignores_issued_on() {
        let input: PrescriptionInput = serde_json::from_value(serde_json::json!({
            "treatment_id": 1,
            "medication_id": 2,
            "dosage": "1 tablet",
            "frequency": "Every 12 hours",
            "duration": "7 days",
            "total_quantity": 14,
            "issued_on": "1999-01-01"
        }))
        .unwrap();

        assert_eq!(input.special_instructions, "");
        assert_eq!(input.total_quantity, 14);
    }
}
