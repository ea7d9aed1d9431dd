use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use shared_utils::params::empty_as_none;

fn default_true() -> bool {
    true
}

// ==============================================================================
// SPECIALTY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Specialty {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of create and full-update requests.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SpecialtyInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SpecialtyView {
    #[serde(flatten)]
    pub specialty: Specialty,
    pub active_doctor_count: usize,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SpecialtyFilters {
    /// Case-insensitive substring of the name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
    /// Matches name or description.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `name`, `created_at`; prefix with `-` for descending.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ordering: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<usize>,
}

// ==============================================================================
// DOCTOR MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoctorShift {
    #[default]
    FullTime,
    PartTime,
    OnCall,
}

impl DoctorShift {
    pub const ALL: [DoctorShift; 3] = [DoctorShift::FullTime, DoctorShift::PartTime, DoctorShift::OnCall];

    pub fn as_str(&self) -> &'static str {
        match self {
            DoctorShift::FullTime => "FULL_TIME",
            DoctorShift::PartTime => "PART_TIME",
            DoctorShift::OnCall => "ON_CALL",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DoctorShift::FullTime => "Full time",
            DoctorShift::PartTime => "Part time",
            DoctorShift::OnCall => "On call",
        }
    }
}

impl FromStr for DoctorShift {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        DoctorShift::ALL
            .into_iter()
            .find(|shift| shift.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("'{}' is not a valid shift", value))
    }
}

impl fmt::Display for DoctorShift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Doctor {
    pub id: i64,
    pub national_id: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub specialty_id: i64,
    pub phone: String,
    pub email: String,
    pub registration_number: String,
    pub shift: DoctorShift,
    pub active: bool,
    pub hired_on: NaiveDate,
}

impl Doctor {
    pub fn full_name(&self) -> String {
        let name = format!("Dr(a). {} {} {}", self.first_name, self.paternal_surname, self.maternal_surname);
        name.trim_end().to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DoctorInput {
    pub national_id: String,
    pub first_name: String,
    pub paternal_surname: String,
    #[serde(default)]
    pub maternal_surname: String,
    pub specialty_id: i64,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    pub registration_number: String,
    #[serde(default)]
    pub shift: DoctorShift,
    #[serde(default = "default_true")]
    pub active: bool,
    pub hired_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DoctorView {
    #[serde(flatten)]
    pub doctor: Doctor,
    pub full_name: String,
    pub specialty_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DoctorFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub first_name: Option<String>,
    /// Case-insensitive substring of the paternal surname.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub last_name: Option<String>,
    /// Specialty id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub specialty: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub specialty_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub shift: Option<DoctorShift>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
    /// Matches names, surnames or specialty name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `last_name`, `first_name`, `hired_on`; prefix with `-` for descending.
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
    fn shift_round_trips_through_its_wire_name() {
        assert_eq!("part_time".parse::<DoctorShift>(), Ok(DoctorShift::PartTime));
        assert_eq!(serde_json::to_value(DoctorShift::OnCall).unwrap(), "ON_CALL");
        assert!("NIGHTS".parse::<DoctorShift>().is_err());
    }

    #[test]
    fn doctor_input_defaults() {
        let input: DoctorInput = serde_json::from_value(serde_json::json!({
            "national_id": "12345678-9",
            "first_name": "Carlos",
            "paternal_surname": "Muñoz",
            "specialty_id": 1,
            "email": "carlos.munoz@clinic.cl",
            "registration_number": "REG-001",
            "hired_on": "2020-03-01"
        }))
        .unwrap();

        assert_eq!(input.shift, DoctorShift::FullTime);
        assert!(input.active);
        assert_eq!(input.maternal_surname, "");
    }
}
