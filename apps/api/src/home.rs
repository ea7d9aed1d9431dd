use std::sync::Arc;

use axum::{
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::CookieJar;

use consultation_cell::services::ConsultationService;
use doctor_cell::services::{DoctorService, SpecialtyService};
use patient_cell::services::PatientService;
use shared_database::AppState;
use shared_models::AppError;
use shared_utils::html::page;
use shared_utils::{take_flash, HtmlError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardCounts {
    pub active_patients: usize,
    pub active_doctors: usize,
    pub active_specialties: usize,
    pub consultations: usize,
}

pub async fn dashboard_counts(state: &AppState) -> Result<DashboardCounts, AppError> {
    Ok(DashboardCounts {
        active_patients: PatientService::new(state).active_patients().await?.len(),
        active_doctors: DoctorService::new(state).active_doctors().await?.len(),
        active_specialties: SpecialtyService::new(state).active_specialties().await?.len(),
        consultations: ConsultationService::new(state).count_all().await?,
    })
}

fn render_cards(counts: &DashboardCounts) -> String {
    let cards = [
        ("Active patients", counts.active_patients, "/patients?active=true"),
        ("Active doctors", counts.active_doctors, "/doctors?active=true"),
        ("Active specialties", counts.active_specialties, "/specialties?active=true"),
        ("Consultations", counts.consultations, "/consultations"),
    ];

    let mut html = String::from("<ul class=\"dashboard\">");
    for (label, count, href) in cards {
        html.push_str(&format!(
            "<li><a href=\"{}\"><strong>{}</strong> {}</a></li>",
            href, count, label
        ));
    }
    html.push_str("</ul>");
    html
}

pub async fn dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<Response, HtmlError> {
    let counts = dashboard_counts(&state).await?;
    let (jar, flash) = take_flash(jar);
    Ok((jar, Html(page("Clinic dashboard", flash.as_ref(), &render_cards(&counts)))).into_response())
}
