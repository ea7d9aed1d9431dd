use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use shared_models::{AppError, FieldErrors};

use crate::flash::Flash;

const NAV: &[(&str, &str)] = &[
    ("/", "Home"),
    ("/patients", "Patients"),
    ("/doctors", "Doctors"),
    ("/specialties", "Specialties"),
    ("/consultations", "Consultations"),
    ("/treatments", "Treatments"),
    ("/prescriptions", "Prescriptions"),
    ("/medications", "Medications"),
    ("/laboratories", "Laboratories"),
    ("/api/docs", "API docs"),
];

const STYLE: &str = "body{font-family:system-ui,sans-serif;margin:0;color:#1f2933}\
nav{background:#0b6e4f;padding:.6rem 1rem}nav a{color:#fff;margin-right:1rem;text-decoration:none}\
main{padding:1rem 2rem}table{border-collapse:collapse;width:100%}\
th,td{border-bottom:1px solid #d9e2ec;padding:.4rem;text-align:left}\
.flash{padding:.6rem 1rem;margin-bottom:1rem;border-radius:4px}\
.flash-success{background:#e3f9e5}.flash-error{background:#ffe3e3}\
.errors{color:#a61b1b;margin:.2rem 0}label{display:block;margin-top:.6rem}\
form.filters label{display:inline-block;margin-right:.8rem}";

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Full document with navigation and an optional notice.
pub fn page(title: &str, flash: Option<&Flash>, body: &str) -> String {
    let mut html = String::with_capacity(body.len() + 2048);
    html.push_str("<!DOCTYPE html><html lang=\"en\"><head><meta charset=\"utf-8\">");
    html.push_str(&format!("<title>{} · Clinic</title>", html_escape(title)));
    html.push_str(&format!("<style>{}</style></head><body><nav>", STYLE));
    for (href, label) in NAV {
        html.push_str(&format!("<a href=\"{}\">{}</a>", href, label));
    }
    html.push_str("</nav><main>");
    if let Some(flash) = flash {
        html.push_str(&format!(
            "<div class=\"flash flash-{}\">{}</div>",
            flash.level.as_str(),
            html_escape(&flash.message)
        ));
    }
    html.push_str(&format!("<h1>{}</h1>", html_escape(title)));
    html.push_str(body);
    html.push_str("</main></body></html>");
    html
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    Text,
    Email,
    TextArea,
    Date,
    DateTime,
    Number,
    Checkbox,
    Select(Vec<(String, String)>),
}

#[derive(Debug, Clone)]
pub struct FormField {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub value: String,
    pub required: bool,
}

impl FormField {
    pub fn new(name: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self { name, label, kind, value: String::new(), required: false }
    }

    pub fn text(name: &'static str, label: &'static str) -> Self {
        Self::new(name, label, FieldKind::Text)
    }

    pub fn select(name: &'static str, label: &'static str, options: Vec<(String, String)>) -> Self {
        Self::new(name, label, FieldKind::Select(options))
    }

    /// Yes/No/Any select for optional boolean filters.
    pub fn tri_state(name: &'static str, label: &'static str) -> Self {
        Self::select(
            name,
            label,
            vec![
                (String::new(), "Any".to_string()),
                ("true".to_string(), "Yes".to_string()),
                ("false".to_string(), "No".to_string()),
            ],
        )
    }

    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    fn render_input(&self) -> String {
        let name = self.name;
        let value = html_escape(&self.value);
        let required = if self.required { " required" } else { "" };
        match &self.kind {
            FieldKind::Text => format!("<input type=\"text\" name=\"{name}\" value=\"{value}\"{required}>"),
            FieldKind::Email => format!("<input type=\"email\" name=\"{name}\" value=\"{value}\"{required}>"),
            FieldKind::Date => format!("<input type=\"date\" name=\"{name}\" value=\"{value}\"{required}>"),
            FieldKind::DateTime => {
                format!("<input type=\"datetime-local\" name=\"{name}\" value=\"{value}\"{required}>")
            }
            FieldKind::Number => format!("<input type=\"number\" name=\"{name}\" value=\"{value}\"{required}>"),
            FieldKind::TextArea => format!("<textarea name=\"{name}\" rows=\"3\"{required}>{value}</textarea>"),
            FieldKind::Checkbox => {
                let checked = if self.value == "true" { " checked" } else { "" };
                format!("<input type=\"checkbox\" name=\"{name}\" value=\"true\"{checked}>")
            }
            FieldKind::Select(options) => {
                let mut html = format!("<select name=\"{name}\"{required}>");
                for (option_value, option_label) in options {
                    let selected = if *option_value == self.value { " selected" } else { "" };
                    html.push_str(&format!(
                        "<option value=\"{}\"{}>{}</option>",
                        html_escape(option_value),
                        selected,
                        html_escape(option_label)
                    ));
                }
                html.push_str("</select>");
                html
            }
        }
    }
}

fn render_errors(messages: &[String]) -> String {
    if messages.is_empty() {
        return String::new();
    }
    let items: Vec<String> = messages.iter().map(|m| format!("<li>{}</li>", html_escape(m))).collect();
    format!("<ul class=\"errors\">{}</ul>", items.join(""))
}

pub fn render_form(action: &str, fields: &[FormField], errors: &FieldErrors, submit: &str) -> String {
    let mut html = format!("<form method=\"post\" action=\"{}\">", html_escape(action));
    html.push_str(&render_errors(errors.get("non_field_errors")));
    for field in fields {
        html.push_str(&format!(
            "<label>{}{}</label>{}",
            html_escape(field.label),
            if field.required { " *" } else { "" },
            field.render_input()
        ));
        html.push_str(&render_errors(errors.get(field.name)));
    }
    html.push_str(&format!(
        "<p><button type=\"submit\">{}</button> <a href=\"{}\">Cancel</a></p></form>",
        html_escape(submit),
        html_escape(&list_path(action))
    ));
    html
}

/// `/doctors/3/edit` -> `/doctors`
fn list_path(action: &str) -> String {
    let first = action.trim_start_matches('/').split('/').next().unwrap_or_default();
    format!("/{}", first)
}

pub fn render_filter_form(action: &str, fields: &[FormField]) -> String {
    let mut html = format!("<form class=\"filters\" method=\"get\" action=\"{}\">", html_escape(action));
    for field in fields {
        html.push_str(&format!("<label>{} {}</label>", html_escape(field.label), field.render_input()));
    }
    html.push_str(&format!(
        "<button type=\"submit\">Filter</button> <a href=\"{}\">Clear</a></form>",
        html_escape(action)
    ));
    html
}

pub struct TableRow {
    pub id: i64,
    pub cells: Vec<String>,
}

/// Table with edit/delete links per row. Cell text is escaped here.
pub fn render_table(base: &str, headers: &[&str], rows: &[TableRow]) -> String {
    if rows.is_empty() {
        return "<p>No records found.</p>".to_string();
    }

    let mut html = String::from("<table><thead><tr>");
    for header in headers {
        html.push_str(&format!("<th>{}</th>", html_escape(header)));
    }
    html.push_str("<th></th></tr></thead><tbody>");
    for row in rows {
        html.push_str("<tr>");
        for cell in &row.cells {
            html.push_str(&format!("<td>{}</td>", html_escape(cell)));
        }
        html.push_str(&format!(
            "<td><a href=\"{base}/{id}/edit\">Edit</a> <a href=\"{base}/{id}/delete\">Delete</a></td></tr>",
            base = base,
            id = row.id
        ));
    }
    html.push_str("</tbody></table>");
    html
}

/// Body of a list page: "new" link, filters, count and table.
pub fn render_list(base: &str, new_label: &str, filters: &str, count: usize, table: &str) -> String {
    format!(
        "<p><a href=\"{base}/new\">{}</a></p>{filters}<p>{count} record(s)</p>{table}",
        html_escape(new_label),
        base = base,
        filters = filters,
        count = count,
        table = table
    )
}

pub fn render_delete_confirmation(base: &str, id: i64, description: &str) -> String {
    format!(
        "<p>Are you sure you want to delete <strong>{}</strong>?</p>\
         <form method=\"post\" action=\"{base}/{id}/delete\">\
         <button type=\"submit\">Delete</button> <a href=\"{base}\">Cancel</a></form>",
        html_escape(description),
        base = base,
        id = id
    )
}

pub fn bool_label(value: bool) -> String {
    if value { "Yes" } else { "No" }.to_string()
}

/// `AppError` rendered as an HTML page for the form interface.
#[derive(Debug)]
pub struct HtmlError(pub AppError);

impl From<AppError> for HtmlError {
    fn from(err: AppError) -> Self {
        HtmlError(err)
    }
}

impl IntoResponse for HtmlError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!("Error: {}: {}", status, self.0);
        } else {
            tracing::warn!("Error: {}: {}", status, self.0);
        }

        let title = match status {
            StatusCode::NOT_FOUND => "Not found",
            s if s.is_server_error() => "Something went wrong",
            _ => "Request error",
        };
        let body = format!("<p>{}</p><p><a href=\"/\">Back to home</a></p>", html_escape(&self.0.public_message()));
        (status, Html(page(title, None, &body))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn form_shows_values_and_field_errors() {
        let mut errors = FieldErrors::new();
        errors.add("name", "Specialty with this name already exists.");
        let fields = vec![
            FormField::text("name", "Name").value("Cardio<logy>").required(),
            FormField::new("active", "Active", FieldKind::Checkbox).value("true"),
        ];

        let html = render_form("/specialties/new", &fields, &errors, "Save");
        assert!(html.contains("value=\"Cardio&lt;logy&gt;\""));
        assert!(html.contains("Specialty with this name already exists."));
        assert!(html.contains("checked"));
        assert!(html.contains("href=\"/specialties\""));

        let edit = render_form("/specialties/4/edit", &fields, &FieldErrors::new(), "Save");
        assert!(edit.contains("<a href=\"/specialties\">Cancel</a>"));
    }

    #[test]
    fn select_marks_current_value() {
        let field = FormField::tri_state("active", "Active").value("false");
        let html = field.render_input();
        assert!(html.contains("<option value=\"false\" selected>No</option>"));
        assert!(html.contains("<option value=\"true\">Yes</option>"));
    }

    #[test]
    fn table_links_to_edit_and_delete() {
        let rows = vec![TableRow { id: 4, cells: vec!["Pediatrics".to_string()] }];
        let html = render_table("/specialties", &["Name"], &rows);
        assert!(html.contains("/specialties/4/edit"));
        assert!(html.contains("/specialties/4/delete"));
        assert_eq!(render_table("/specialties", &["Name"], &[]), "<p>No records found.</p>");
    }
}
