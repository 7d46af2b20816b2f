//! In-memory stand-in for the CMS content endpoints, for local runs and tests.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use axum::extract::{Multipart, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use crate::modules::api::CSRF_HEADER;
use crate::modules::serialize::save_elements;

pub const EDITABLE_FIELDS: [&str; 4] = ["title", "description", "json_content", "src"];

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct StoredElement {
    pub id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json_content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src: Option<String>,
    #[serde(default)]
    pub order: i32,
}

impl StoredElement {
    fn field_mut(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "title" => Some(&mut self.title),
            "description" => Some(&mut self.description),
            "json_content" => Some(&mut self.json_content),
            "src" => Some(&mut self.src),
            _ => None,
        }
    }
}

/// One accepted change, kept the way the CMS keeps its edit history.
#[derive(Debug, Clone, PartialEq)]
pub struct EditRecord {
    pub element_id: u32,
    pub field: String,
    pub previous_value: Option<String>,
    pub new_value: String,
}

#[derive(Debug, Default)]
pub struct StubState {
    elements: Mutex<Vec<StoredElement>>,
    history: Mutex<Vec<EditRecord>>,
    edit_mode: Mutex<bool>,
    csrf_token: Option<String>,
    page: Option<String>,
    persist_to: Option<String>,
}

pub type SharedStub = Arc<StubState>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl StubState {
    pub fn new(elements: Vec<StoredElement>) -> Self {
        Self {
            elements: Mutex::new(elements),
            ..Default::default()
        }
    }

    pub fn with_csrf_token(mut self, token: impl Into<String>) -> Self {
        self.csrf_token = Some(token.into());
        self
    }

    /// HTML served at `/`, so a page can be scanned straight from the stub.
    pub fn with_page(mut self, html: impl Into<String>) -> Self {
        self.page = Some(html.into());
        self
    }

    pub fn persisting_to(mut self, path: impl Into<String>) -> Self {
        self.persist_to = Some(path.into());
        self
    }

    pub fn element(&self, id: u32) -> Option<StoredElement> {
        lock(&self.elements).iter().find(|e| e.id == id).cloned()
    }

    pub fn history(&self) -> Vec<EditRecord> {
        lock(&self.history).clone()
    }

    pub fn edit_mode(&self) -> bool {
        *lock(&self.edit_mode)
    }

    fn set_field(&self, id: u32, field: &str, value: String) -> Result<(), StubError> {
        let mut elements = lock(&self.elements);
        let element = elements
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or_else(|| StubError::not_found("Element not found"))?;
        let slot = element
            .field_mut(field)
            .ok_or_else(|| StubError::bad_request("Invalid field"))?;
        let previous_value = slot.replace(value.clone());

        lock(&self.history).push(EditRecord {
            element_id: id,
            field: field.to_string(),
            previous_value,
            new_value: value,
        });
        info!("Element {id}: {field} updated");

        if let Some(path) = &self.persist_to {
            if let Err(err) = save_elements(path, &elements) {
                error!("Cannot write {path}: {err}");
            }
        }
        Ok(())
    }
}

pub fn router(state: SharedStub) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/dashboard/element/:id/get/", get(get_element))
        .route("/dashboard/element/:id/update/", post(update_element))
        .route("/dashboard/element/:id/upload-image/", post(upload_image))
        .route("/dashboard/toggle-edit-mode/", post(toggle_edit_mode))
        .with_state(state)
}

async fn page(State(state): State<SharedStub>) -> Result<Html<String>, StubError> {
    state
        .page
        .clone()
        .map(Html)
        .ok_or_else(|| StubError::not_found("No page loaded"))
}

async fn get_element(
    State(state): State<SharedStub>,
    Path(id): Path<u32>,
) -> Result<Json<Value>, StubError> {
    let element = state
        .element(id)
        .ok_or_else(|| StubError::not_found("Element not found"))?;
    Ok(Json(json!({
        "id": element.id,
        "title": element.title,
        "description": element.description,
        "json_content": element.json_content,
        "src": element.src,
        "order": element.order,
    })))
}

#[derive(Debug, Deserialize)]
struct UpdateForm {
    #[serde(default)]
    field: String,
    #[serde(default)]
    value: String,
}

async fn update_element(
    State(state): State<SharedStub>,
    Path(id): Path<u32>,
    Form(form): Form<UpdateForm>,
) -> Result<Json<Value>, StubError> {
    if !EDITABLE_FIELDS.contains(&form.field.as_str()) {
        return Err(StubError::bad_request("Invalid field"));
    }
    state.set_field(id, &form.field, form.value)?;
    Ok(Json(json!({"success": true})))
}

async fn upload_image(
    State(state): State<SharedStub>,
    Path(id): Path<u32>,
    mut multipart: Multipart,
) -> Result<Json<Value>, StubError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| StubError::bad_request(&err.to_string()))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let name = field.file_name().unwrap_or("upload").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| StubError::bad_request(&err.to_string()))?;
        let src = format!("/media/uploads/{name}");
        info!("Element {id}: received {} bytes as {src}", bytes.len());
        state.set_field(id, "src", src.clone())?;
        return Ok(Json(json!({"success": true, "src": src})));
    }
    Err(StubError::bad_request("Invalid request"))
}

async fn toggle_edit_mode(
    State(state): State<SharedStub>,
    headers: HeaderMap,
) -> Result<Json<Value>, StubError> {
    if let Some(expected) = &state.csrf_token {
        let sent = headers.get(CSRF_HEADER).and_then(|v| v.to_str().ok());
        if sent != Some(expected.as_str()) {
            return Err(StubError::forbidden("CSRF verification failed"));
        }
    }
    let mut edit_mode = lock(&state.edit_mode);
    *edit_mode = !*edit_mode;
    Ok(Json(json!({"edit_mode": *edit_mode})))
}

#[derive(Debug)]
struct StubError {
    code: StatusCode,
    message: String,
}

impl StubError {
    fn not_found(message: &str) -> Self {
        Self {
            code: StatusCode::NOT_FOUND,
            message: message.to_string(),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self {
            code: StatusCode::BAD_REQUEST,
            message: message.to_string(),
        }
    }

    fn forbidden(message: &str) -> Self {
        Self {
            code: StatusCode::FORBIDDEN,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for StubError {
    fn into_response(self) -> axum::response::Response {
        (self.code, Json(json!({"error": self.message}))).into_response()
    }
}
