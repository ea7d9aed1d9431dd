use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use shared_utils::params::empty_as_none;

fn default_true() -> bool {
    true
}

/// Health coverage scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Coverage {
    #[default]
    Fonasa,
    Isapre,
    Private,
    Other,
}

impl Coverage {
    pub const ALL: [Coverage; 4] = [Coverage::Fonasa, Coverage::Isapre, Coverage::Private, Coverage::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Coverage::Fonasa => "FONASA",
            Coverage::Isapre => "ISAPRE",
            Coverage::Private => "PRIVATE",
            Coverage::Other => "OTHER",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Coverage::Fonasa => "FONASA",
            Coverage::Isapre => "ISAPRE",
            Coverage::Private => "Private",
            Coverage::Other => "Other",
        }
    }
}

impl FromStr for Coverage {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Coverage::ALL
            .into_iter()
            .find(|coverage| coverage.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("'{}' is not a valid coverage", value))
    }
}

impl fmt::Display for Coverage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Patient {
    pub id: i64,
    pub national_id: String,
    pub first_name: String,
    pub paternal_surname: String,
    pub maternal_surname: String,
    pub birth_date: NaiveDate,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub coverage: Coverage,
    pub active: bool,
    pub registered_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {} {}", self.first_name, self.paternal_surname, self.maternal_surname)
            .trim_end()
            .to_string()
    }

    /// Whole years completed on `today`.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let mut years = today.year() - self.birth_date.year();
        if (today.month(), today.day()) < (self.birth_date.month(), self.birth_date.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PatientInput {
    pub national_id: String,
    pub first_name: String,
    pub paternal_surname: String,
    #[serde(default)]
    pub maternal_surname: String,
    pub birth_date: NaiveDate,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub coverage: Coverage,
    #[serde(default = "default_true")]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PatientView {
    #[serde(flatten)]
    pub patient: Patient,
    pub full_name: String,
    pub age: u32,
}

impl PatientView {
    pub fn new(patient: Patient, today: NaiveDate) -> Self {
        Self {
            full_name: patient.full_name(),
            age: patient.age_on(today),
            patient,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientFilters {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub first_name: Option<String>,
    /// Case-insensitive substring of the paternal surname.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub national_id: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub coverage: Option<Coverage>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub active: Option<bool>,
    /// Matches names, surnames or national ID.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `last_name`, `first_name`, `registered_at`; prefix with `-` for descending.
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

    fn patient(birth_date: NaiveDate) -> Patient {
        Patient {
            id: 1,
            national_id: "11111111-1".to_string(),
            first_name: "Juan".to_string(),
            paternal_surname: "Pérez".to_string(),
            maternal_surname: String::new(),
            birth_date,
            phone: String::new(),
            email: String::new(),
            address: String::new(),
            coverage: Coverage::Fonasa,
            active: true,
            registered_at: Utc::now(),
        }
    }

    #[test]
    fn age_counts_completed_years() {
        let p = patient(NaiveDate::from_ymd_opt(1985, 3, 15).unwrap());
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2024, 3, 14).unwrap()), 38);
        assert_eq!(p.age_on(NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()), 39);
    }

    #[test]
    fn full_name_skips_blank_maternal_surname() {
        let p = patient(NaiveDate::from_ymd_opt(1990, 1, 1).unwrap());
        assert_eq!(p.full_name(), "Juan Pérez");
    }

    #[test]
    fn coverage_parses_case_insensitively() {
        assert_eq!("isapre".parse::<Coverage>(), Ok(Coverage::Isapre));
        assert_eq!(serde_json::to_value(Coverage::Private).unwrap(), "PRIVATE");
        assert!("MEDICARE".parse::<Coverage>().is_err());
    }
}
