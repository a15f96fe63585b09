use std::io::{Cursor, Read};
use tiny_http::{Header, Method, Request, Response, StatusCode};

use crate::state::SharedState;
use crate::handlers;

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn header(field: &str, value: &str) -> Option<Header> {
    Header::from_bytes(field.as_bytes(), value.as_bytes()).ok()
}

pub fn bytes_response(status: u16, content_type: &str, bytes: Vec<u8>) -> Response<Cursor<Vec<u8>>> {
    let len = bytes.len();
    Response::new(
        StatusCode(status),
        header("Content-Type", content_type).into_iter().collect(),
        Cursor::new(bytes),
        Some(len),
        None,
    )
}

pub fn html_response(body: String) -> Response<Cursor<Vec<u8>>> {
    bytes_response(200, "text/html; charset=utf-8", body.into_bytes())
}

pub fn json_response(status: u16, body: String) -> Response<Cursor<Vec<u8>>> {
    bytes_response(status, "application/json", body.into_bytes())
}

pub fn not_found() -> Response<Cursor<Vec<u8>>> {
    bytes_response(404, "text/plain", b"404 Not Found".to_vec())
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub fn content_type(request: &Request) -> String {
    request.headers().iter()
        .find(|h| h.field.equiv("Content-Type"))
        .map(|h| h.value.as_str().to_owned())
        .unwrap_or_default()
}

/// Reads the whole body, refusing anything over `limit` bytes.
pub fn read_body(request: &mut Request, limit: u64) -> Result<Vec<u8>, String> {
    if let Some(len) = request.body_length() {
        if len as u64 > limit {
            return Err(format!("Upload too large ({} MB max).", limit / (1024 * 1024)));
        }
    }
    let mut body = Vec::new();
    request.as_reader()
        .take(limit + 1)
        .read_to_end(&mut body)
        .map_err(|e| format!("Could not read request body: {}", e))?;
    if body.len() as u64 > limit {
        return Err(format!("Upload too large ({} MB max).", limit / (1024 * 1024)));
    }
    Ok(body)
}

// ---------------------------------------------------------------------------
// Request dispatcher
// ---------------------------------------------------------------------------

/// Dispatches one request to its handler and sends the response.
pub fn dispatch(mut request: Request, state: SharedState) {
    let method = request.method().clone();
    let url    = request.url().to_owned();

    let (path, query) = match url.find('?') {
        Some(pos) => (url[..pos].to_owned(), url[pos + 1..].to_owned()),
        None      => (url.clone(), String::new()),
    };
    log::debug!("{} {}", method, path);

    let response = match (&method, path.as_str()) {
        // ── Classifier ───────────────────────────────────────────────────
        (Method::Get,  "/")             => handlers::classify::handle_get(),
        (Method::Post, "/classify")     => handlers::classify::handle_post(&mut request, &state),
        (Method::Post, "/api/classify") => handlers::classify::handle_api(&mut request, &state),

        // ── Trends ───────────────────────────────────────────────────────
        (Method::Get, "/trends") => handlers::trends::handle_get(&query, &state),

        // ── Illustrations ────────────────────────────────────────────────
        (Method::Get, p) if p.starts_with("/dino_pics/") => {
            handlers::assets::handle_illustration(&p["/dino_pics/".len()..], &state)
        }

        // ── 404 ──────────────────────────────────────────────────────────
        _ => not_found(),
    };

    if let Err(e) = request.respond(response) {
        log::warn!("failed to send response for {}: {}", path, e);
    }
}
