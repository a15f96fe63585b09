use std::io::Cursor;
use tiny_http::Response;

use crate::routes::{bytes_response, not_found};
use crate::state::SharedState;

/// `GET /dino_pics/{name}.png`
///
/// Serves a style illustration from `<assets_dir>/dino_pics/`.
pub fn handle_illustration(name: &str, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    if !is_safe_png_name(name) {
        return not_found();
    }

    let path = state.config.assets_dir.join("dino_pics").join(name);
    match std::fs::read(&path) {
        Ok(bytes) => bytes_response(200, "image/png", bytes),
        Err(e) => {
            log::warn!("illustration {} unavailable: {}", path.display(), e);
            not_found()
        }
    }
}

/// A bare `*.png` file name: no separators, no parent references.
fn is_safe_png_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.ends_with(".png")
}
