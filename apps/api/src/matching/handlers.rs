//! Axum route handler for the match API.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    Json,
};
use bytes::Bytes;
use tracing::{debug, info, info_span, Instrument};
use uuid::Uuid;

use crate::document::extract_pdf_text;
use crate::errors::AppError;
use crate::matching::analyzer::{analyze_resume_vs_jd, MatchResult};
use crate::state::AppState;

const MISSING_RESUME: &str = "Please upload a resume or paste text.";
const MISSING_JD: &str = "Please provide a job description.";

/// Raw multipart fields of a `/match_jd` request.
#[derive(Debug, Default)]
struct MatchForm {
    jd: Option<String>,
    resume_text: Option<String>,
    resume_file: Option<Bytes>,
}

enum ResumeSource {
    Text(String),
    Pdf(Bytes),
}

/// POST /match_jd
///
/// Multipart fields: `jd` (required), and `resume_text` or `resume` (PDF).
/// Pasted text wins over an uploaded file when both are present.
/// Inputs are validated before any embedding or generative call is made.
pub async fn handle_match_jd(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<MatchResult>, AppError> {
    let request_id = Uuid::new_v4();

    async move {
        let multipart = multipart
            .map_err(|e| AppError::Validation(format!("Expected multipart form data: {e}")))?;
        let form = read_form(multipart).await?;

        let source = resolve_resume(form.resume_text, form.resume_file)?;
        let jd_text = form.jd.unwrap_or_default();
        if jd_text.trim().is_empty() {
            return Err(AppError::Validation(MISSING_JD.to_string()));
        }

        let resume_text = match source {
            ResumeSource::Text(text) => text,
            ResumeSource::Pdf(bytes) => {
                info!("Extracting text from uploaded PDF ({} bytes)", bytes.len());
                extract_pdf_text(bytes).await?
            }
        };

        let result = analyze_resume_vs_jd(&state, &resume_text, &jd_text).await?;
        Ok(Json(result))
    }
    .instrument(info_span!("match_jd", %request_id))
    .await
}

async fn read_form(mut multipart: Multipart) -> Result<MatchForm, AppError> {
    let mut form = MatchForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read form field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "jd" => {
                form.jd = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read jd: {e}"))
                })?);
            }
            "resume_text" => {
                form.resume_text = Some(field.text().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read resume_text: {e}"))
                })?);
            }
            "resume" => {
                let data = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read resume file: {e}"))
                })?;
                // Browsers submit an empty part when no file was chosen
                if !data.is_empty() {
                    form.resume_file = Some(data);
                }
            }
            other => debug!("Ignoring unknown form field '{other}'"),
        }
    }

    Ok(form)
}

fn resolve_resume(
    resume_text: Option<String>,
    resume_file: Option<Bytes>,
) -> Result<ResumeSource, AppError> {
    match (resume_text, resume_file) {
        (Some(text), _) if !text.trim().is_empty() => Ok(ResumeSource::Text(text.trim().to_string())),
        (_, Some(bytes)) => Ok(ResumeSource::Pdf(bytes)),
        _ => Err(AppError::Validation(MISSING_RESUME.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::document::tests::build_pdf;
    use crate::matching::analyzer::tests::{test_state, ADVISOR_REPLY, SCENARIO_JD, SCENARIO_RESUME};
    use crate::rewrite::tests::{Script, ScriptedAdvisor};
    use crate::routes::build_router;

    const BOUNDARY: &str = "----jdmatch-test-boundary";

    enum Part<'a> {
        Text(&'a str, &'a str),
        File(&'a str, &'a str, &'a [u8]),
    }

    fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n").as_bytes(),
                    );
                    body.extend_from_slice(value.as_bytes());
                }
                Part::File(name, filename, data) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(data);
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    async fn post_match(state: AppState, parts: &[Part<'_>]) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/match_jd")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(multipart_body(parts)))
            .unwrap();

        let response = build_router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    fn replying_advisor() -> Arc<ScriptedAdvisor> {
        Arc::new(ScriptedAdvisor::new(Script::Reply(ADVISOR_REPLY.to_string())))
    }

    #[tokio::test]
    async fn test_match_with_pasted_resume() {
        let advisor = replying_advisor();
        let state = test_state(advisor.clone()).await;

        let (status, body) = post_match(
            state,
            &[Part::Text("jd", SCENARIO_JD), Part::Text("resume_text", SCENARIO_RESUME)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["similarity"].is_number());
        assert!(body["match_status"].is_string());
        let missing: Vec<&str> = body["missing_skills"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(missing.contains(&"docker"));
        assert!(missing.contains(&"aws"));
        assert!(!missing.contains(&"python"));
        assert_eq!(body["summary"], "Emphasised containerised delivery.");
        assert_eq!(body["sections"].as_array().unwrap().len(), 1);
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_match_with_uploaded_pdf() {
        let advisor = replying_advisor();
        let state = test_state(advisor.clone()).await;
        let pdf = build_pdf(&["Experienced Python developer", "", "Built REST APIs"]);

        let (status, body) = post_match(
            state,
            &[Part::Text("jd", SCENARIO_JD), Part::File("resume", "resume.pdf", &pdf)],
        )
        .await;

        assert_eq!(status, StatusCode::OK, "body: {body}");
        let missing: Vec<&str> = body["missing_skills"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(missing.contains(&"docker"));
        assert!(missing.contains(&"aws"));
        assert!(!missing.contains(&"python"));
        assert!(body["resume_skills"]
            .as_array()
            .unwrap()
            .iter()
            .any(|s| s == "python"));
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_pasted_text_takes_precedence_over_file() {
        let state = test_state(replying_advisor()).await;
        let (status, _) = post_match(
            state,
            &[
                Part::Text("jd", SCENARIO_JD),
                Part::Text("resume_text", SCENARIO_RESUME),
                Part::File("resume", "resume.pdf", b"definitely not a pdf"),
            ],
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_blank_inputs_rejected_without_advisor_call() {
        let advisor = replying_advisor();
        let state = test_state(advisor.clone()).await;

        let (status, body) = post_match(
            state,
            &[Part::Text("jd", "   "), Part::Text("resume_text", "  ")],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_missing_resume_is_bad_request() {
        let state = test_state(replying_advisor()).await;
        let (status, body) = post_match(state, &[Part::Text("jd", SCENARIO_JD)]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], MISSING_RESUME);
    }

    #[tokio::test]
    async fn test_blank_jd_is_bad_request() {
        let advisor = replying_advisor();
        let state = test_state(advisor.clone()).await;
        let (status, body) = post_match(
            state,
            &[Part::Text("jd", "\n"), Part::Text("resume_text", SCENARIO_RESUME)],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], MISSING_JD);
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_non_pdf_upload_is_error_not_partial_result() {
        let advisor = replying_advisor();
        let state = test_state(advisor.clone()).await;

        let (status, body) = post_match(
            state,
            &[
                Part::Text("jd", SCENARIO_JD),
                Part::File("resume", "resume.pdf", &[0x7f, b'E', b'L', b'F', 2, 1, 1, 0]),
            ],
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Uploaded file is not a PDF document");
        assert!(body.get("similarity").is_none());
        assert_eq!(advisor.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_file_part_counts_as_missing() {
        let state = test_state(replying_advisor()).await;
        let (status, body) = post_match(
            state,
            &[Part::Text("jd", SCENARIO_JD), Part::File("resume", "", b"")],
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], MISSING_RESUME);
    }

    #[tokio::test(start_paused = true)]
    async fn test_advisor_timeout_still_returns_match() {
        let state = test_state(Arc::new(ScriptedAdvisor::new(Script::Hang))).await;

        let (status, body) = post_match(
            state,
            &[Part::Text("jd", SCENARIO_JD), Part::Text("resume_text", SCENARIO_RESUME)],
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["similarity"].is_number());
        assert!(body["missing_skills"].is_array());
        assert!(body["summary"].as_str().unwrap().contains("timed out"));
        assert_eq!(body["sections"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_non_multipart_request_is_bad_request() {
        let state = test_state(replying_advisor()).await;
        let request = Request::builder()
            .method("POST")
            .uri("/match_jd")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"jd": "x"}"#))
            .unwrap();
        let response = build_router(state).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_resolve_resume_precedence() {
        assert!(matches!(
            resolve_resume(Some("  text ".into()), Some(Bytes::from_static(b"%PDF-"))),
            Ok(ResumeSource::Text(t)) if t == "text"
        ));
        assert!(matches!(
            resolve_resume(Some("   ".into()), Some(Bytes::from_static(b"%PDF-"))),
            Ok(ResumeSource::Pdf(_))
        ));
        assert!(matches!(resolve_resume(None, None), Err(AppError::Validation(_))));
    }
}
