use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use shared_utils::params::empty_as_none;

fn default_true() -> bool {
    true
}

// ==============================================================================
// LABORATORY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Laboratory {
    pub id: i64,
    pub name: String,
    pub country: String,
    pub address: String,
    pub phone: String,
    pub email: String,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LaboratoryInput {
    pub name: String,
    pub country: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LaboratoryFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    /// Exact country name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub country: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
    /// Matches name or country.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `name`, `country`; prefix with `-` for descending.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ordering: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<usize>,
}

// ==============================================================================
// MEDICATION MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Medication {
    pub id: i64,
    pub name: String,
    pub active_ingredient: String,
    pub form: String,
    pub concentration: String,
    pub laboratory_id: i64,
    pub requires_prescription: bool,
    pub stock: i32,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

impl Medication {
    pub fn display_name(&self) -> String {
        format!("{} {} ({})", self.name, self.concentration, self.form)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MedicationInput {
    pub name: String,
    pub active_ingredient: String,
    pub form: String,
    pub concentration: String,
    pub laboratory_id: i64,
    #[serde(default = "default_true")]
    pub requires_prescription: bool,
    #[serde(default)]
    pub stock: i32,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MedicationView {
    #[serde(flatten)]
    pub medication: Medication,
    pub laboratory_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MedicationFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active_ingredient: Option<String>,
    /// Laboratory id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub laboratory: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub laboratory_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub requires_prescription: Option<bool>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
    /// Matches name, active ingredient or laboratory name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `name`, `stock`; prefix with `-` for descending.
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
    fn medication_input_defaults() {
        let input: MedicationInput = serde_json::from_value(serde_json::json!({
            "name": "Paracetamol",
            "active_ingredient": "Paracetamol",
            "form": "Tablet",
            "concentration": "500mg",
            "laboratory_id": 1
        }))
        .unwrap();

        assert!(input.requires_prescription);
        assert!(input.active);
        assert_eq!(input.stock, 0);
    }
}
