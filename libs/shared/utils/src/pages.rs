use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use tracing::warn;

use shared_models::{AppError, FieldErrors};

use crate::flash::{set_flash, Flash};
use crate::html::{page, render_delete_confirmation, render_form, FormField, HtmlError};

pub const IN_USE: &str = "This record is still in use and cannot be deleted.";

/// Post/redirect/get: stores the notice and sends the browser to `to`.
pub fn redirect_with(jar: CookieJar, flash: Flash, to: &str) -> Response {
    (set_flash(jar, flash), Redirect::to(to)).into_response()
}

pub fn form_page(
    status: StatusCode,
    title: &str,
    action: &str,
    fields: &[FormField],
    errors: &FieldErrors,
    submit: &str,
) -> Response {
    let body = render_form(action, fields, errors, submit);
    (status, Html(page(title, None, &body))).into_response()
}

/// Outcome of a create/update submitted from a form.
pub enum Saved<T> {
    Done(T),
    Invalid(FieldErrors),
}

/// Validation failures go back to the form; anything else becomes an error page.
pub fn saved<T>(result: Result<T, AppError>) -> Result<Saved<T>, HtmlError> {
    match result {
        Ok(value) => Ok(Saved::Done(value)),
        Err(AppError::ValidationError(errors)) => Ok(Saved::Invalid(errors)),
        Err(err) => Err(HtmlError(err)),
    }
}

/// Turns a refused delete into an error notice on the list page.
pub fn delete_redirect(
    jar: CookieJar,
    result: Result<(), AppError>,
    list: &str,
    success: &str,
) -> Result<Response, HtmlError> {
    match result {
        Ok(()) => Ok(redirect_with(jar, Flash::success(success), list)),
        Err(AppError::DeleteBlocked(blocked)) => Ok(redirect_with(jar, Flash::error(blocked.to_string()), list)),
        Err(AppError::Database(detail)) => {
            warn!("Delete rejected by storage: {}", detail);
            Ok(redirect_with(jar, Flash::error(IN_USE), list))
        }
        Err(err) => Err(HtmlError(err)),
    }
}

/// Confirmation page for a delete, or straight back to the list when the
/// delete is already known to be refused.
pub fn confirm_delete(
    jar: CookieJar,
    description: Result<String, AppError>,
    list: &str,
    id: i64,
    title: &str,
) -> Result<Response, HtmlError> {
    match description {
        Ok(description) => {
            let body = render_delete_confirmation(list, id, &description);
            Ok(Html(page(title, None, &body)).into_response())
        }
        Err(AppError::DeleteBlocked(blocked)) => Ok(redirect_with(jar, Flash::error(blocked.to_string()), list)),
        Err(err) => Err(HtmlError(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header;
    use shared_models::DeleteBlocked;

    #[test]
    fn blocked_delete_redirects_with_notice() {
        let blocked = AppError::DeleteBlocked(DeleteBlocked {
            entity: "specialty",
            id: 1,
            dependent: "doctors",
            count: 2,
        });
        let response = delete_redirect(CookieJar::new(), Err(blocked), "/specialties", "Deleted.")
            .ok()
            .unwrap();

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/specialties");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("clinic_flash=error"));
    }

    #[test]
    fn not_found_is_not_swallowed() {
        let result = delete_redirect(CookieJar::new(), Err(AppError::not_found("doctor", 9)), "/doctors", "Deleted.");
        assert!(matches!(result, Err(HtmlError(AppError::NotFound(_)))));
    }
}
