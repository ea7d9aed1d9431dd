use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::{json, Value};
use tracing::{debug, info};

use shared_database::store::{decode_row, value_taken};
use shared_database::{AppState, Filter, OrderBy, RecordQuery, Table};
use shared_models::{AppError, FieldErrors, Page};
use shared_utils::params::{parse_ordering, timestamp_value};

use crate::models::{User, UserFilters, UserInput};

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[\w.@+-]+$").unwrap());

const ORDERING_FIELDS: &[(&str, &'static str)] = &[("username", "username"), ("date_joined", "date_joined")];
const DEFAULT_ORDER: &[OrderBy] = &[OrderBy::asc("username")];

pub struct UserService {
    state: AppState,
}

impl UserService {
    pub fn new(state: &AppState) -> Self {
        Self {
            state: state.clone(),
        }
    }

    pub async fn list_users(&self, filters: &UserFilters) -> Result<Page<User>, AppError> {
        debug!("Listing users with filters: {:?}", filters);

        let mut query = RecordQuery::new()
            .filter_opt(filters.username.as_ref().map(|v| Filter::contains("username", v)))
            .filter_opt(filters.email.as_ref().map(|v| Filter::contains("email", v)))
            .filter_opt(filters.is_active.map(|active| Filter::eq("is_active", active)));

        if let Some(term) = &filters.search {
            query = query.any(vec![
                Filter::contains("username", term),
                Filter::contains("email", term),
                Filter::contains("first_name", term),
                Filter::contains("last_name", term),
            ]);
        }

        let query = query
            .order_by(parse_ordering(filters.ordering.as_deref(), ORDERING_FIELDS, DEFAULT_ORDER))
            .page(self.state.page_limit(filters.limit), filters.offset);

        let (count, users) = self.state.store.select(Table::Users, &query).await?.decode()?;
        Ok(Page::new(count, users))
    }

    pub async fn get_user(&self, id: i64) -> Result<User, AppError> {
        debug!("Fetching user: {}", id);

        match self.state.store.get(Table::Users, id).await? {
            Some(row) => Ok(decode_row(row)?),
            None => Err(AppError::not_found("user", id)),
        }
    }

    pub async fn create_user(&self, input: UserInput) -> Result<User, AppError> {
        let input = self.validate(input, None).await?;
        debug!("Creating user: {}", input.username);

        let row = Self::to_row(&input, Utc::now());
        let user: User = decode_row(self.state.store.insert(Table::Users, row).await?)?;

        info!("User created with ID: {}", user.id);
        Ok(user)
    }

    pub async fn update_user(&self, id: i64, input: UserInput) -> Result<User, AppError> {
        let existing = self.get_user(id).await?;
        let input = self.validate(input, Some(id)).await?;

        let row = Self::to_row(&input, existing.date_joined);
        let user: User = decode_row(self.state.store.update(Table::Users, id, row).await?)?;

        info!("User {} updated", id);
        Ok(user)
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), AppError> {
        self.state.store.delete(Table::Users, id).await?;
        info!("User {} deleted", id);
        Ok(())
    }

    fn to_row(input: &UserInput, date_joined: DateTime<Utc>) -> Value {
        json!({
            "username": input.username,
            "email": input.email,
            "first_name": input.first_name,
            "last_name": input.last_name,
            "is_active": input.is_active,
            "date_joined": timestamp_value(date_joined),
        })
    }

    async fn validate(&self, input: UserInput, exclude_id: Option<i64>) -> Result<UserInput, AppError> {
        let mut errors = FieldErrors::new();

        let username = errors.required("username", &input.username, 150);
        if !username.is_empty() && !USERNAME_RE.is_match(&username) {
            errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        }
        let email = errors.email("email", &input.email, false);
        let first_name = errors.optional("first_name", &input.first_name, 150);
        let last_name = errors.optional("last_name", &input.last_name, 150);

        if !errors.contains("username")
            && value_taken(self.state.store.as_ref(), Table::Users, "username", &username, exclude_id).await?
        {
            errors.add("username", "A user with that username already exists.");
        }

        errors.into_result()?;
        Ok(UserInput {
            username,
            email,
            first_name,
            last_name,
            is_active: input.is_active,
        })
    }
}
