use std::io::Cursor;
use std::path::Path;

use log::{info, warn};
use tiny_http::{Request, Response};

use jean_o_type::{Classifier, Guess, Prediction};

use crate::render::{error_html, html_escape, info_html, render_page, warning_html, Page};
use crate::routes::{content_type, html_response, json_response, read_body};
use crate::state::{SharedState, StudioState};
use crate::util::multipart::{extract_boundary, extract_file, FilePart};

/// Multipart field names used by the upload form.
const MODEL_FIELD: &str = "model_file";
const IMAGE_FIELD: &str = "image_file";

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

pub fn handle_get() -> Response<Cursor<Vec<u8>>> {
    html_response(build_page(""))
}

// ---------------------------------------------------------------------------
// POST /classify
// ---------------------------------------------------------------------------

/// Every submission starts from scratch: the model is loaded from this
/// upload, used once, and dropped with the response.
pub fn handle_post(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let result_html = match read_uploads(request, state) {
        Err(msg) => error_html(&html_escape(&msg)),
        Ok((model, image)) => run(state, model, image),
    };
    html_response(build_page(&result_html))
}

fn run(state: &StudioState, model_file: Option<FilePart>, image_file: Option<FilePart>) -> String {
    let model_file = match model_file {
        Some(m) => m,
        None => return warning_html("Upload a model first: a .zip, .tar.gz or .json model file."),
    };

    info!("loading model from upload '{}' ({} bytes)", model_file.filename, model_file.bytes.len());
    let model = match state.loader.load(&model_file.bytes) {
        Ok(m) => m,
        Err(e) => {
            warn!("model load failed: {}", e);
            return error_html(&format!(
                "Could not load model <strong>{}</strong>: {}",
                html_escape(&model_file.filename), html_escape(&e.to_string())
            ));
        }
    };

    let image_file = match image_file {
        Some(i) => i,
        None => return info_html(&format!(
            "Model <strong>{}</strong> loaded. Now upload your jean image.",
            html_escape(&model_file.filename)
        )),
    };

    match Classifier::new(model.as_ref()).classify_bytes(&image_file.bytes) {
        Ok(prediction) => {
            info!("{} → {} ({:.2}%)", image_file.filename, prediction.primary.label, prediction.primary.confidence);
            render_prediction(&prediction, &image_file.bytes, &state.config.assets_dir)
        }
        Err(e) => error_html(&html_escape(&e.to_string())),
    }
}

// ---------------------------------------------------------------------------
// POST /api/classify
// ---------------------------------------------------------------------------

/// Same inputs as `/classify`, answered with the `Prediction` as JSON.
pub fn handle_api(request: &mut Request, state: &SharedState) -> Response<Cursor<Vec<u8>>> {
    let outcome = read_uploads(request, state)
        .and_then(|(model, image)| classify_uploads(state, model, image));
    api_response(outcome)
}

fn classify_uploads(
    state: &StudioState,
    model_file: Option<FilePart>,
    image_file: Option<FilePart>,
) -> Result<Prediction, String> {
    let model = model_file.ok_or_else(|| format!("missing '{}' upload", MODEL_FIELD))?;
    let image = image_file.ok_or_else(|| format!("missing '{}' upload", IMAGE_FIELD))?;
    let handle = state.loader.load(&model.bytes).map_err(|e| e.to_string())?;
    Classifier::new(handle.as_ref())
        .classify_bytes(&image.bytes)
        .map_err(|e| e.to_string())
}

fn api_response(outcome: Result<Prediction, String>) -> Response<Cursor<Vec<u8>>> {
    match outcome {
        Ok(prediction) => match serde_json::to_string(&prediction) {
            Ok(json) => json_response(200, json),
            Err(e) => json_response(500, serde_json::json!({ "error": e.to_string() }).to_string()),
        },
        Err(msg) => json_response(400, serde_json::json!({ "error": msg }).to_string()),
    }
}

// ---------------------------------------------------------------------------
// Upload parsing
// ---------------------------------------------------------------------------

fn read_uploads(
    request: &mut Request,
    state: &StudioState,
) -> Result<(Option<FilePart>, Option<FilePart>), String> {
    let ct = content_type(request);
    let boundary = extract_boundary(&ct).ok_or("Expected a multipart/form-data upload.")?;
    let body = read_body(request, state.config.max_upload_bytes())?;
    Ok((
        extract_file(&body, &boundary, MODEL_FIELD),
        extract_file(&body, &boundary, IMAGE_FIELD),
    ))
}

// ---------------------------------------------------------------------------
// Page builder
// ---------------------------------------------------------------------------

fn build_page(result_html: &str) -> String {
    let form = format!(
        r#"<form class="card" method="POST" action="/classify" enctype="multipart/form-data">
  <label for="{model}">Model file (.zip, .tar.gz or .json)</label>
  <input type="file" id="{model}" name="{model}" accept=".zip,.gz,.tgz,.json">
  <p class="hint">A zipped model folder, a single model file, or a serving bundle with signatures.json.</p>
  <label for="{image}">Upload your jean image</label>
  <input type="file" id="{image}" name="{image}" accept="image/png,image/jpeg,.jpg,.jpeg,.png">
  <div class="mt"><button type="submit" class="btn btn-primary">Find my style</button></div>
</form>"#,
        model = MODEL_FIELD,
        image = IMAGE_FIELD,
    );

    render_page(Page::Classify, |tmpl| tmpl.replace("{{BODY}}", &format!("{}\n{}", form, result_html)))
}

// ---------------------------------------------------------------------------
// Result renderer
// ---------------------------------------------------------------------------

fn upload_preview(image_bytes: &[u8]) -> String {
    let mime = match image::guess_format(image_bytes) {
        Ok(image::ImageFormat::Png) => "image/png",
        Ok(image::ImageFormat::Gif) => "image/gif",
        Ok(image::ImageFormat::Bmp) => "image/bmp",
        _ => "image/jpeg",
    };
    format!(
        r#"<img class="upload-preview" src="data:{};base64,{}" alt="Your uploaded image"><div class="caption">Your uploaded image</div>"#,
        mime,
        base64::encode(image_bytes)
    )
}

/// The style's illustration, or a placeholder when the file is not on disk.
fn illustration_html(illustration: &str, assets_dir: &Path) -> String {
    if assets_dir.join(illustration).is_file() {
        format!(
            r#"<img class="dino" src="/{}" alt="Dino rocking the style!"><div class="caption">Dino rocking the style!</div>"#,
            html_escape(illustration)
        )
    } else {
        format!(
            r#"<div class="placeholder">Illustration not found<br>{}</div>"#,
            html_escape(illustration)
        )
    }
}

fn primary_html(guess: &Guess, assets_dir: &Path) -> String {
    let headline = format!(
        "<h2>🎉 You got: <strong>{}</strong> ({:.2}% confidence)</h2>",
        html_escape(&guess.label), guess.confidence
    );
    match guess.style() {
        Some(style) => {
            let d = style.descriptor();
            format!(
                "{}\n<p>👖 Description: <em>{}</em></p>\n<p>🕰️ Popular in: <strong>{}</strong></p>\n{}",
                headline,
                html_escape(d.description),
                html_escape(d.trending_years),
                illustration_html(d.illustration, assets_dir)
            )
        }
        None => format!("{}\n<p class=\"hint\">No description for this style.</p>", headline),
    }
}

fn secondary_html(guess: &Guess) -> String {
    let line = format!(
        "<p>💡 Second guess: <strong>{}</strong> ({:.2}%)</p>",
        html_escape(&guess.label), guess.confidence
    );
    match guess.style() {
        Some(style) => {
            let d = style.descriptor();
            format!(
                "{}\n<p><em>{}</em> · <strong>{}</strong></p>",
                line, html_escape(d.description), html_escape(d.trending_years)
            )
        }
        None => line,
    }
}

pub fn render_prediction(prediction: &Prediction, image_bytes: &[u8], assets_dir: &Path) -> String {
    let t = &prediction.timings;
    format!(
        r#"<div class="result-card">
{preview}
{primary}
<hr>
{secondary}
<div class="timings">decode {load} ms · resize {resize} ms · inference {infer} ms</div>
</div>"#,
        preview   = upload_preview(image_bytes),
        primary   = primary_html(&prediction.primary, assets_dir),
        secondary = secondary_html(&prediction.secondary),
        load      = t.image_load_ms,
        resize    = t.image_resize_ms,
        infer     = t.inference_ms,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    use clap::Parser;
    use jean_o_type::{ActivationFunction, Network, StyleLabel};

    use crate::state::StudioConfig;

    fn state() -> StudioState {
        StudioState::new(StudioConfig::parse_from(["jean-o-type"]))
    }

    fn part(filename: &str, bytes: Vec<u8>) -> Option<FilePart> {
        Some(FilePart { filename: filename.to_owned(), bytes })
    }

    fn json_model() -> Vec<u8> {
        serde_json::to_vec(&Network::new(vec![(5, 3, ActivationFunction::Softmax)])).unwrap()
    }

    fn body_of(response: Response<Cursor<Vec<u8>>>) -> String {
        let mut body = String::new();
        response.into_reader().read_to_string(&mut body).unwrap();
        body
    }

    #[test]
    fn no_model_asks_for_one() {
        let html = run(&state(), None, part("jeans.png", vec![1, 2, 3]));
        assert!(html.contains("warn-box"));
        assert!(html.contains("Upload a model first"));
    }

    #[test]
    fn unloadable_model_shows_error_and_skips_classification() {
        let html = run(&state(), part("broken.zip", b"not a model".to_vec()), part("jeans.png", vec![1]));
        assert!(html.contains("error-box"));
        assert!(html.contains("Could not load model <strong>broken.zip</strong>"));
        assert!(!html.contains("You got"));
    }

    #[test]
    fn loaded_model_without_image_asks_for_image() {
        let html = run(&state(), part("jeans.json", json_model()), None);
        assert!(html.contains("info-box"));
        assert!(html.contains("<strong>jeans.json</strong> loaded. Now upload your jean image."));
    }

    #[test]
    fn api_without_image_is_a_400_with_error_json() {
        let outcome = classify_uploads(&state(), part("jeans.json", json_model()), None);
        assert_eq!(outcome.clone().unwrap_err(), "missing 'image_file' upload");

        let response = api_response(outcome);
        assert_eq!(response.status_code().0, 400);
        let body: serde_json::Value = serde_json::from_str(&body_of(response)).unwrap();
        assert_eq!(body["error"], "missing 'image_file' upload");
    }

    #[test]
    fn api_reports_model_load_failures() {
        let outcome = classify_uploads(&state(), part("m.bin", b"GIF89a".to_vec()), part("j.png", vec![1]));
        assert!(outcome.unwrap_err().contains("unsupported model artifact"));
    }

    #[test]
    fn api_success_is_prediction_json() {
        let p = Prediction::from_scores(&[0.05, 0.7, 0.2, 0.03, 0.02], &StyleLabel::default_labels()).unwrap();
        let response = api_response(Ok(p));
        assert_eq!(response.status_code().0, 200);
        let body: serde_json::Value = serde_json::from_str(&body_of(response)).unwrap();
        assert_eq!(body["primary"]["label"], "Bootcut");
        assert_eq!(body["secondary"]["label"], "Skinny");
    }

    fn prediction() -> Prediction {
        Prediction::from_scores(&[0.05, 0.7, 0.2, 0.03, 0.02], &StyleLabel::default_labels()).unwrap()
    }

    #[test]
    fn result_shows_both_guesses_with_two_decimals() {
        let dir = tempfile::tempdir().unwrap();
        let html = render_prediction(&prediction(), b"", dir.path());
        assert!(html.contains("<strong>Bootcut</strong> (70.00% confidence)"));
        assert!(html.contains("Second guess: <strong>Skinny</strong> (20.00%)"));
        assert!(html.contains("A 90s classic"));
        assert!(html.contains("2005–2018"));
    }

    #[test]
    fn missing_illustration_renders_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let html = render_prediction(&prediction(), b"", dir.path());
        assert!(html.contains("Illustration not found"));
        assert!(!html.contains("<img class=\"dino\""));
    }

    #[test]
    fn present_illustration_is_linked() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("dino_pics")).unwrap();
        std::fs::write(dir.path().join("dino_pics/dino_bootcut.png"), b"png").unwrap();
        let html = render_prediction(&prediction(), b"", dir.path());
        assert!(html.contains(r#"src="/dino_pics/dino_bootcut.png""#));
    }

    #[test]
    fn unknown_label_renders_without_descriptor() {
        let labels: Vec<String> = ["Flare", "Cargo"].iter().map(|s| s.to_string()).collect();
        let p = Prediction::from_scores(&[0.4, 0.6], &labels).unwrap();
        let html = render_prediction(&p, b"", Path::new("."));
        assert!(html.contains("<strong>Cargo</strong> (60.00% confidence)"));
        assert!(html.contains("No description for this style."));
    }
}
