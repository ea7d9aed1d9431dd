use serde_json::json;
use tracing::{debug, info};

use shared_database::store::{decode_row, fetch_by_ids, select_ids, value_taken};
use shared_database::{ensure_deletable, guarded_delete, AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{date_value, parse_ordering};

use crate::models::{Doctor, DoctorFilters, DoctorInput, DoctorView, Specialty};

const ORDERING_FIELDS: &[(&str, &'static str)] = &[
    ("last_name", "paternal_surname"),
    ("first_name", "first_name"),
    ("hired_on", "hired_on"),
];
const DEFAULT_ORDER: &[OrderBy] = &[
    OrderBy::asc("paternal_surname"),
    OrderBy::asc("maternal_surname"),
    OrderBy::asc("first_name"),
];

pub struct DoctorService {
    state: AppState,
}

impl DoctorService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_doctors(&self, filters: &DoctorFilters) -> Result<Page<Doctor>, AppError> {
        debug!("Listing doctors with filters: {:?}", filters);
        let store = self.state.store.as_ref();

        let mut query = RecordQuery::new()
            .filter_opt(filters.first_name.as_ref().map(|v| Filter::contains("first_name", v)))
            .filter_opt(filters.last_name.as_ref().map(|v| Filter::contains("paternal_surname", v)))
            .filter_opt(filters.specialty.map(|id| Filter::eq("specialty_id", id)))
            .filter_opt(filters.shift.map(|shift| Filter::eq("shift", shift.as_str())))
            .filter_opt(filters.active.map(|active| Filter::eq("active", active)));

        if let Some(name) = &filters.specialty_name {
            let ids = select_ids(store, Table::Specialties, RecordQuery::new().filter(Filter::contains("name", name))).await?;
            query = query.filter(Filter::is_in("specialty_id", ids));
        }

        if let Some(term) = &filters.search {
            let specialty_ids =
                select_ids(store, Table::Specialties, RecordQuery::new().filter(Filter::contains("name", term))).await?;
            query = query.any(vec![
                Filter::contains("first_name", term),
                Filter::contains("paternal_surname", term),
                Filter::contains("maternal_surname", term),
                Filter::is_in("specialty_id", specialty_ids),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, doctors) = store.select(Table::Doctors, &query).await?.decode()?;
        Ok(Page::new(count, doctors))
    }

    pub async fn get_doctor(&self, id: i64) -> Result<Doctor, AppError> {
        debug!("Fetching doctor: {}", id);

        match self.state.store.get(Table::Doctors, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("doctor", id)),
        }
    }

    pub async fn create_doctor(&self, input: DoctorInput) -> Result<Doctor, AppError> {
        let input = self.validate(input, None).await?;
        debug!("Creating doctor: {} {}", input.first_name, input.paternal_surname);

        let row = self.state.store.insert(Table::Doctors, Self::to_row(&input)).await?;
        let doctor: Doctor = decode_row(row)?;

        info!("Doctor created with ID: {}", doctor.id);
        Ok(doctor)
    }

    pub async fn update_doctor(&self, id: i64, input: DoctorInput) -> Result<Doctor, AppError> {
        self.get_doctor(id).await?;
        let input = self.validate(input, Some(id)).await?;
        debug!("Updating doctor: {}", id);

        let row = self.state.store.update(Table::Doctors, id, Self::to_row(&input)).await?;
        let doctor: Doctor = decode_row(row)?;

        info!("Doctor {} updated", id);
        Ok(doctor)
    }

    /// Fails with `DeleteBlocked` while the doctor has consultations.
    pub async fn check_deletable(&self, id: i64) -> Result<Doctor, AppError> {
        let doctor = self.get_doctor(id).await?;
        ensure_deletable(self.state.store.as_ref(), Table::Doctors, id).await?;
        Ok(doctor)
    }

    pub async fn delete_doctor(&self, id: i64) -> Result<(), AppError> {
        guarded_delete(self.state.store.as_ref(), Table::Doctors, id).await
    }

    pub async fn active_doctors(&self) -> Result<Vec<Doctor>, AppError> {
        let filters = DoctorFilters {
            active: Some(true),
            ..DoctorFilters::default()
        };
        Ok(self.list_doctors(&filters).await?.results)
    }

    pub async fn describe_one(&self, doctor: Doctor) -> Result<DoctorView, AppError> {
        let id = doctor.id;
        self.describe(vec![doctor])
            .await?
            .pop()
            .ok_or_else(|| AppError::Internal(format!("doctor {} vanished while describing it", id)))
    }

    /// Attaches the display name and specialty name to each doctor.
    pub async fn describe(&self, doctors: Vec<Doctor>) -> Result<Vec<DoctorView>, AppError> {
        let specialties = fetch_by_ids::<Specialty, _>(
            self.state.store.as_ref(),
            Table::Specialties,
            doctors.iter().map(|d| d.specialty_id),
        )
        .await?;

        Ok(doctors
            .into_iter()
            .map(|doctor| DoctorView {
                full_name: doctor.full_name(),
                specialty_name: specialties
                    .get(&doctor.specialty_id)
                    .map(|s| s.name.clone())
                    .unwrap_or_default(),
                doctor,
            })
            .collect())
    }

    fn to_row(input: &DoctorInput) -> serde_json::Value {
        json!({
            "national_id": input.national_id,
            "first_name": input.first_name,
            "paternal_surname": input.paternal_surname,
            "maternal_surname": input.maternal_surname,
            "specialty_id": input.specialty_id,
            "phone": input.phone,
            "email": input.email,
            "registration_number": input.registration_number,
            "shift": input.shift.as_str(),
            "active": input.active,
            "hired_on": date_value(input.hired_on),
        })
    }

    /// Validation messages for `input` without saving it.
    pub async fn field_errors(&self, input: DoctorInput, exclude_id: Option<i64>) -> Result<FieldErrors, AppError> {
        match self.validate(input, exclude_id).await {
            Ok(_) => Ok(FieldErrors::new()),
            Err(AppError::ValidationError(errors)) => Ok(errors),
            Err(err) => Err(err),
        }
    }

    async fn validate(&self, input: DoctorInput, exclude_id: Option<i64>) -> Result<DoctorInput, AppError> {
        let store = self.state.store.as_ref();
        let mut errors = FieldErrors::new();

        let national_id = errors.required("national_id", &input.national_id, 12);
        if !national_id.is_empty() && national_id.chars().count() < 7 {
            errors.add("national_id", "National ID must have at least 7 characters.");
        }
        let first_name = errors.required("first_name", &input.first_name, 100);
        let paternal_surname = errors.required("paternal_surname", &input.paternal_surname, 100);
        let maternal_surname = errors.optional("maternal_surname", &input.maternal_surname, 100);
        let phone = errors.optional("phone", &input.phone, 15);
        let email = errors.email("email", &input.email, true);
        let registration_number = errors.required("registration_number", &input.registration_number, 20);

        if !errors.contains("national_id")
            && value_taken(store, Table::Doctors, "national_id", &national_id, exclude_id).await?
        {
            errors.add("national_id", "Doctor with this national ID already exists.");
        }
        if !errors.contains("registration_number")
            && value_taken(store, Table::Doctors, "registration_number", &registration_number, exclude_id).await?
        {
            errors.add("registration_number", "Doctor with this registration number already exists.");
        }

        match store.get(Table::Specialties, input.specialty_id).await? {
            Some(row) => {
                let specialty: Specialty = decode_row(row)?;
                if !specialty.active {
                    errors.add("specialty_id", "Select an active specialty.");
                }
            }
            None => errors.add("specialty_id", "Select a valid specialty."),
        }

        errors.into_result()?;
        Ok(DoctorInput {
            national_id,
            first_name,
            paternal_surname,
            maternal_surname,
            phone,
            email,
            registration_number,
            ..input
        })
    }
}
