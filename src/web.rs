//! Web surface for the parts registry
//!
//! Server-rendered HTML over axum: login, exact-code search, part
//! registration with image upload, deletion and the spreadsheet view.
//! Every route except login checks the session gate first and redirects
//! anonymous callers to the login page.

use axum::{
    body::Body,
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use rusqlite::Connection;
use serde::Deserialize;
use std::sync::{Arc, Mutex};
use tower_http::services::ServeDir;

use crate::database::Part;
use crate::error::RegistryError;
use crate::export;
use crate::parts::{self, PartInput, StoragePaths, Upload};
use crate::session::{self, SessionGate};

/// Shared application state (thread-safe database connection + session gate)
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub gate: Arc<SessionGate>,
    pub paths: Arc<StoragePaths>,
}

const LOGIN_PAGE: &str = include_str!("../static/login.html");
const SEARCH_PAGE: &str = include_str!("../static/search.html");
const ADD_PAGE: &str = include_str!("../static/add.html");

/// Notice parameters carried across redirects
#[derive(Deserialize, Default)]
struct NoticeParams {
    ok: Option<String>,
    error: Option<String>,
}

#[derive(Deserialize)]
struct LoginForm {
    #[serde(default)]
    password: String,
}

#[derive(Deserialize)]
struct SearchForm {
    #[serde(default)]
    query: String,
}

// ── Rendering helpers ──────────────────────────────────────────────────────

/// Minimal HTML escaping for user-supplied text
fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Fill `{{slot}}` placeholders in an embedded page
fn render(template: &str, fills: &[(&str, &str)]) -> Html<String> {
    let mut page = template.to_string();
    for (slot, value) in fills {
        page = page.replace(&format!("{{{{{slot}}}}}"), value);
    }
    Html(page)
}

fn notice_block(ok: Option<&str>, error: Option<&str>) -> String {
    match (ok, error) {
        (Some(msg), _) => format!("<p class=\"notice ok\">{}</p>", escape_html(msg)),
        (_, Some(msg)) => format!("<p class=\"notice error\">{}</p>", escape_html(msg)),
        _ => String::new(),
    }
}

fn notices(params: &NoticeParams) -> String {
    notice_block(params.ok.as_deref(), params.error.as_deref())
}

fn render_search(notice: &str, query: &str, part: Option<&Part>) -> Html<String> {
    let result = match part {
        Some(part) => part_details(part),
        None => String::new(),
    };
    render(
        SEARCH_PAGE,
        &[
            ("notice", notice),
            ("query", &escape_html(query)),
            ("result", &result),
        ],
    )
}

fn render_add(notice: &str) -> Html<String> {
    render(ADD_PAGE, &[("notice", notice)])
}

/// Detail block for a found part: field table, image and delete button
fn part_details(part: &Part) -> String {
    let fields = [
        ("Vendor code", Some(part.vendor_code.as_str())),
        ("Original code", part.original_code.as_deref()),
        ("Name", Some(part.name.as_str())),
        ("Description", part.description.as_deref()),
        ("Equipment", part.equipment.as_deref()),
        ("Notes", part.notes.as_deref()),
        ("Status", Some(part.status.as_str())),
    ];

    let mut rows = String::new();
    for (label, value) in fields {
        rows.push_str(&format!(
            "<tr><th>{}</th><td>{}</td></tr>",
            label,
            escape_html(value.unwrap_or("-"))
        ));
    }

    let image = match &part.image_path {
        Some(path) => format!(
            "<img class=\"part-image\" src=\"/{}\" alt=\"{}\">",
            escape_html(path),
            escape_html(&part.vendor_code)
        ),
        None => String::new(),
    };

    format!(
        "<div class=\"part\"><table>{rows}</table>{image}\
         <form method=\"post\" action=\"/delete/{id}\">\
         <button type=\"submit\" class=\"danger\">Delete part</button>\
         </form></div>",
        id = part.id,
    )
}

fn redirect_ok(path: &str, msg: &str) -> Redirect {
    Redirect::to(&format!("{}?ok={}", path, urlencoding::encode(msg)))
}

fn redirect_error(path: &str, msg: &str) -> Redirect {
    Redirect::to(&format!("{}?error={}", path, urlencoding::encode(msg)))
}

fn internal_error(e: RegistryError) -> Response {
    log::error!("Request failed: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn authenticated(state: &AppState, headers: &HeaderMap) -> bool {
    state
        .gate
        .is_authenticated(session::session_cookie(headers).as_deref())
}

// ── Handlers ───────────────────────────────────────────────────────────────

/// GET / - redirect by session state
async fn home(State(state): State<AppState>, headers: HeaderMap) -> Redirect {
    if authenticated(&state, &headers) {
        Redirect::to("/search")
    } else {
        Redirect::to("/login")
    }
}

/// GET /login
async fn login_form(Query(params): Query<NoticeParams>) -> Html<String> {
    render(LOGIN_PAGE, &[("notice", &notices(&params))])
}

/// POST /login - shared password check, sets the session cookie on match
async fn login_submit(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    match state.gate.login(&form.password) {
        Some(cookie_value) => {
            let cookie = [(header::SET_COOKIE, session::set_cookie(&cookie_value))];
            (cookie, redirect_ok("/search", "Logged in.")).into_response()
        }
        None => {
            log::warn!("Rejected login attempt");
            redirect_error("/login", "Incorrect password.").into_response()
        }
    }
}

/// GET /logout - clears the session
async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }
    state
        .gate
        .logout(session::session_cookie(&headers).as_deref());
    let cookie = [(header::SET_COOKIE, session::clear_cookie())];
    (cookie, Redirect::to("/login")).into_response()
}

/// GET /search
async fn search_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<NoticeParams>,
) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }
    render_search(&notices(&params), "", None).into_response()
}

/// POST /search - exact-code lookup
async fn search_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<SearchForm>,
) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }

    let query = form.query.trim().to_string();
    let outcome = {
        let conn = state.db.lock().unwrap();
        parts::search(&conn, &query)
    };

    match outcome {
        Ok(Some(part)) => {
            render_search(&notice_block(Some("Part found."), None), &query, Some(&part))
                .into_response()
        }
        Ok(None) => render_search(
            &notice_block(None, Some("No part with that code.")),
            &query,
            None,
        )
        .into_response(),
        Err(RegistryError::Validation(msg)) => {
            render_search(&notice_block(None, Some(&msg)), "", None).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// GET /add
async fn add_form(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<NoticeParams>,
) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }
    render_add(&notices(&params)).into_response()
}

/// POST /add - multipart form with the part fields and an optional image
async fn add_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }

    let mut input = PartInput::default();
    let mut upload: Option<Upload> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::warn!("Malformed multipart request: {}", e);
                return StatusCode::BAD_REQUEST.into_response();
            }
        };

        let name = field.name().unwrap_or_default().to_string();
        if name == "image" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = match field.bytes().await {
                Ok(bytes) => bytes,
                Err(e) => {
                    log::warn!("Failed to read uploaded image: {}", e);
                    return StatusCode::BAD_REQUEST.into_response();
                }
            };
            // Browsers submit an empty image field when no file was chosen
            if !filename.is_empty() && !bytes.is_empty() {
                upload = Some(Upload {
                    filename,
                    bytes: bytes.to_vec(),
                });
            }
        } else {
            let value = match field.text().await {
                Ok(value) => value,
                Err(e) => {
                    log::warn!("Failed to read form field {}: {}", name, e);
                    return StatusCode::BAD_REQUEST.into_response();
                }
            };
            match name.as_str() {
                "codigo_wiener" => input.vendor_code = value,
                "codigo_original" => input.original_code = value,
                "nombre" => input.name = value,
                "descripcion" => input.description = value,
                "equipo" => input.equipment = value,
                "notas" => input.notes = value,
                "estado" => input.status = value,
                _ => {}
            }
        }
    }

    let outcome = {
        let conn = state.db.lock().unwrap();
        parts::create(&conn, &state.paths, &input, upload.as_ref())
    };

    match outcome {
        Ok(part) => {
            let msg = format!("Part {} saved. It can now be searched.", part.vendor_code);
            render_add(&notice_block(Some(&msg), None)).into_response()
        }
        Err(RegistryError::Validation(msg)) => {
            render_add(&notice_block(None, Some(&msg))).into_response()
        }
        Err(RegistryError::DuplicateCode(code)) => {
            let msg = format!("Code {} already exists.", code);
            render_add(&notice_block(None, Some(&msg))).into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// POST /delete/{id} - redirects to search whether or not the id existed
async fn delete_part(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }

    let outcome = {
        let conn = state.db.lock().unwrap();
        parts::delete(&conn, &state.paths, id)
    };

    match outcome {
        Ok(()) => redirect_ok("/search", "Part deleted.").into_response(),
        Err(e) => internal_error(e),
    }
}

/// GET /excel - regenerate the spreadsheet master and return it inline
async fn export_spreadsheet(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if !authenticated(&state, &headers) {
        return Redirect::to("/login").into_response();
    }

    let outcome = {
        let conn = state.db.lock().unwrap();
        export::regenerate(&conn, &state.paths.export_path)
    };
    let path = match outcome {
        Ok(path) => path,
        Err(e) => return internal_error(e),
    };

    match std::fs::read(&path) {
        Ok(bytes) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
            .header(
                header::CONTENT_DISPOSITION,
                "inline; filename=\"parts_master.csv\"",
            )
            .body(Body::from(bytes))
            .unwrap(),
        Err(e) => internal_error(RegistryError::Io(e)),
    }
}

// ── Router ─────────────────────────────────────────────────────────────────

/// Build the web server router
pub fn create_router(state: AppState) -> Router {
    let images = ServeDir::new(state.paths.images_dir.clone());

    Router::new()
        .route("/", get(home))
        .route("/login", get(login_form).post(login_submit))
        .route("/logout", get(logout))
        .route("/search", get(search_form).post(search_submit))
        .route("/add", get(add_form).post(add_submit))
        .route("/delete/{id}", post(delete_part))
        .route("/excel", get(export_spreadsheet))
        .nest_service("/images", images)
        .with_state(state)
}

/// Start the web server (async)
///
/// Binds to 0.0.0.0 (all interfaces) to work with Docker port mapping.
/// When running locally, use firewall rules to restrict access.
pub async fn serve(state: AppState, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(state);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Parts registry listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_html_covers_markup_characters() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
        assert_eq!(escape_html("W-100"), "W-100");
    }

    #[test]
    fn notice_block_escapes_and_prefers_ok() {
        assert_eq!(notice_block(None, None), "");
        assert_eq!(
            notice_block(Some("saved"), Some("ignored")),
            "<p class=\"notice ok\">saved</p>"
        );
        assert!(notice_block(None, Some("<script>")).contains("&lt;script&gt;"));
    }

    #[test]
    fn render_fills_all_slots() {
        let page = render_search("", "W-100", None).0;
        assert!(page.contains("value=\"W-100\""));
        assert!(!page.contains("{{"));

        let page = render_add("").0;
        assert!(!page.contains("{{"));

        let page = render(LOGIN_PAGE, &[("notice", "")]).0;
        assert!(!page.contains("{{"));
    }

    #[test]
    fn part_details_includes_image_and_delete_form() {
        let part = Part {
            id: 7,
            vendor_code: "W-100".to_string(),
            original_code: None,
            name: "Filtro <raro>".to_string(),
            description: None,
            equipment: None,
            notes: None,
            image_path: Some("images/W-100.png".to_string()),
            status: "Active".to_string(),
        };

        let html = part_details(&part);
        assert!(html.contains("action=\"/delete/7\""));
        assert!(html.contains("src=\"/images/W-100.png\""));
        assert!(html.contains("Filtro &lt;raro&gt;"));
    }
}

#[cfg(test)]
#[path = "web_tests.rs"]
mod web_tests;
