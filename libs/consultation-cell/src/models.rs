use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use shared_utils::params::{empty_as_none, DateBound};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConsultationStatus {
    #[default]
    Scheduled,
    Completed,
    Canceled,
    NoShow,
}

impl ConsultationStatus {
    pub const ALL: [ConsultationStatus; 4] = [
        ConsultationStatus::Scheduled,
        ConsultationStatus::Completed,
        ConsultationStatus::Canceled,
        ConsultationStatus::NoShow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Scheduled => "SCHEDULED",
            ConsultationStatus::Completed => "COMPLETED",
            ConsultationStatus::Canceled => "CANCELED",
            ConsultationStatus::NoShow => "NO_SHOW",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConsultationStatus::Scheduled => "Scheduled",
            ConsultationStatus::Completed => "Completed",
            ConsultationStatus::Canceled => "Canceled",
            ConsultationStatus::NoShow => "No show",
        }
    }
}

impl FromStr for ConsultationStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ConsultationStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("'{}' is not a valid consultation status", value))
    }
}

impl fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Consultation {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    pub diagnosis: String,
    pub notes: String,
    pub status: ConsultationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ConsultationInput {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub reason: String,
    #[serde(default)]
    pub diagnosis: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub status: ConsultationStatus,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConsultationView {
    #[serde(flatten)]
    pub consultation: Consultation,
    pub patient_name: String,
    pub doctor_name: String,
    pub specialty_name: String,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ConsultationFilters {
    /// Doctor id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub doctor: Option<i64>,
    /// Patient id.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub patient: Option<i64>,
    /// Specialty id of the attending doctor.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub specialty: Option<i64>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub status: Option<ConsultationStatus>,
    /// Earliest `scheduled_at`, inclusive. A plain date starts at midnight UTC.
    #[serde(default, deserialize_with = "empty_as_none")]
    #[param(value_type = Option<String>)]
    pub date_from: Option<DateBound>,
    /// Latest `scheduled_at`, inclusive. A plain date covers the whole day.
    #[serde(default, deserialize_with = "empty_as_none")]
    #[param(value_type = Option<String>)]
    pub date_to: Option<DateBound>,
    /// Matches reason, diagnosis, patient first name or doctor first name.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub search: Option<String>,
    /// `scheduled_at`, `status`; prefix with `-` for descending.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub ordering: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub limit: Option<usize>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub offset: Option<usize>,
}
