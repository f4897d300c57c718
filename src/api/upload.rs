use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::Multipart;
use axum::http::StatusCode;
use axum::{routing::post, Json, Router};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{error_response, AppState, MAX_BODY_BYTES};
use crate::services::document::{validate_upload, UploadError};

pub fn router() -> Router<AppState> {
    Router::new().route("/upload", post(upload_file))
}

async fn upload_file(multipart: Result<Multipart, MultipartRejection>) -> (StatusCode, Json<Value>) {
    // Not a multipart body at all: nothing that could be a file was sent.
    let Ok(multipart) = multipart else {
        return reject(UploadError::NoFile, None);
    };

    let (filename, bytes) = match read_file_field(multipart).await {
        Ok(Some(field)) => field,
        Ok(None) => return reject(UploadError::NoFile, None),
        Err(err) if err.status() == StatusCode::PAYLOAD_TOO_LARGE => {
            warn!("upload.rejected: body over {} bytes", MAX_BODY_BYTES);
            return (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "error": "File too large. Maximum size is 16 MB." })),
            );
        }
        Err(err) => return reject(UploadError::Malformed(err.body_text()), None),
    };

    let size = bytes.len();
    match validate_upload(filename.as_deref(), bytes) {
        Ok(doc) => {
            info!(filename = %doc.filename, bytes = size, "upload.accepted");
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "content": doc.content,
                    "filename": doc.filename
                })),
            )
        }
        Err(err) => reject(err, Some(size)),
    }
}

/// Returns the first part named `file` as (filename, bytes). Other parts are skipped.
async fn read_file_field(mut multipart: Multipart) -> Result<Option<(Option<String>, Vec<u8>)>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().map(str::to_string);
        let bytes = field.bytes().await?;
        return Ok(Some((filename, bytes.to_vec())));
    }
    Ok(None)
}

fn reject(err: UploadError, size: Option<usize>) -> (StatusCode, Json<Value>) {
    let category = err.category();
    warn!(reason = category.as_str(), bytes = ?size, "upload.rejected: {}", err);
    error_response(category, err.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::tests::{app_with, json_body};
    use crate::services::summary::engine::tests::ScriptedProvider;

    const BOUNDARY: &str = "X-TEST-BOUNDARY";

    fn multipart_request(parts: &[(&str, Option<&str>, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (name, filename, data) in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match filename {
                Some(f) => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"; filename=\"{f}\"\r\n").as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n").as_bytes(),
                ),
            }
            body.extend_from_slice(b"Content-Type: text/plain\r\n\r\n");
            body.extend_from_slice(data);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::post("/upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(provider: Arc<ScriptedProvider>, req: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app_with(provider).oneshot(req).await.unwrap();
        let status = response.status();
        (status, json_body(response).await)
    }

    #[tokio::test]
    async fn returns_decoded_content_and_safe_name() {
        let req = multipart_request(&[("file", Some("../My Notes.txt"), "hello there".as_bytes())]);
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["content"], "hello there");
        assert_eq!(body["filename"], "My_Notes.txt");
    }

    #[tokio::test]
    async fn same_upload_twice_yields_same_content() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let (_, first) = send(provider.clone(), multipart_request(&[("file", Some("a.txt"), b"stable".as_slice())])).await;
        let (_, second) = send(provider, multipart_request(&[("file", Some("a.txt"), b"stable".as_slice())])).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn non_multipart_body_has_no_file() {
        let req = Request::post("/upload")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{}"))
            .unwrap();
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn oversized_body_is_refused() {
        let big = vec![b'a'; super::MAX_BODY_BYTES + 1];
        let req = multipart_request(&[("file", Some("big.txt"), big.as_slice())]);
        let response = app_with(Arc::new(ScriptedProvider::new(vec![]))).oneshot(req).await.unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn missing_file_field() {
        let req = multipart_request(&[("other", Some("a.txt"), b"x".as_slice())]);
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn plain_form_field_is_not_a_file() {
        let req = multipart_request(&[("file", None, b"x".as_slice())]);
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file provided");
    }

    #[tokio::test]
    async fn empty_filename() {
        let req = multipart_request(&[("file", Some(""), b"x".as_slice())]);
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "No file selected");
    }

    #[tokio::test]
    async fn wrong_extension_never_reaches_provider() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let req = multipart_request(&[("file", Some("report.pdf"), b"%PDF-1.7".as_slice())]);
        let (status, body) = send(provider.clone(), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid file type. Only TXT files are allowed.");
        assert!(provider.models_called().is_empty());
    }

    #[tokio::test]
    async fn non_utf8_payload() {
        let req = multipart_request(&[("file", Some("latin1.txt"), [0x63u8, 0x61, 0x66, 0xe9].as_slice())]);
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File encoding error. Please ensure the file is UTF-8 encoded.");
    }

    #[tokio::test]
    async fn whitespace_only_file() {
        let req = multipart_request(&[("file", Some("blank.txt"), b"  \n\t ".as_slice())]);
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "File is empty");
    }

    #[tokio::test]
    async fn truncated_multipart_is_a_processing_error() {
        let body = format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\r\nno closing boundary"
        );
        let req = Request::post("/upload")
            .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"))
            .body(Body::from(body))
            .unwrap();
        let (status, body) = send(Arc::new(ScriptedProvider::new(vec![])), req).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().starts_with("Error processing file: "));
    }
}
