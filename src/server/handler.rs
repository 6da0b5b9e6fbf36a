//! HTTP handler for the dashboard route
//!
//! The handler turns an incoming axum request into a [`DashboardRequest`]
//! (query pairs, form or multipart body, uploaded files, referer) and hands it
//! to the dispatcher. Errors are converted to responses by
//! [`DashboardError`]'s `IntoResponse` implementation.

use crate::core::context::DashboardContext;
use crate::core::error::{DashboardError, RequestError};
use crate::core::request::{DashboardRequest, DashboardResponse, UploadedFile, parse_pairs};
use crate::server::dispatcher::DashboardAction;
use axum::extract::{FromRequest, Multipart, Request, State};
use axum::http::Method;
use axum::http::header::{CONTENT_TYPE, REFERER};

/// Largest urlencoded body read, in bytes
pub const MAX_FORM_SIZE: usize = 2 * 1024 * 1024;

fn invalid_body(e: impl std::fmt::Display) -> RequestError {
    RequestError::InvalidBody {
        message: e.to_string(),
    }
}

/// Read everything the dispatcher needs out of an HTTP request
pub async fn read_request(request: Request) -> Result<DashboardRequest, RequestError> {
    let (parts, body) = request.into_parts();

    let mut dashboard_request = DashboardRequest {
        method: parts.method.clone(),
        query: parts.uri.query().map(parse_pairs).unwrap_or_default(),
        referer: parts
            .headers
            .get(REFERER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
        ..DashboardRequest::default()
    };

    if parts.method != Method::POST {
        return Ok(dashboard_request);
    }

    let is_multipart = parts
        .headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("multipart/form-data"));

    if is_multipart {
        let request = Request::from_parts(parts, body);
        let mut multipart = Multipart::from_request(request, &())
            .await
            .map_err(invalid_body)?;

        while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(invalid_body)?;
                    // browsers send an empty part for a file input left blank
                    if file_name.is_empty() && data.is_empty() {
                        continue;
                    }
                    dashboard_request.files.insert(
                        name,
                        UploadedFile {
                            file_name: Some(file_name),
                            content_type,
                            data: data.to_vec(),
                        },
                    );
                }
                None => {
                    let value = field.text().await.map_err(invalid_body)?;
                    dashboard_request.body.push((name, value));
                }
            }
        }
    } else {
        let bytes = axum::body::to_bytes(body, MAX_FORM_SIZE)
            .await
            .map_err(invalid_body)?;
        let raw = std::str::from_utf8(&bytes).map_err(invalid_body)?;
        dashboard_request.body = parse_pairs(raw);
    }

    Ok(dashboard_request)
}

/// `GET|POST {mount}`: dispatch one dashboard request
pub async fn dashboard_handler(
    State(action): State<DashboardAction>,
    request: Request,
) -> Result<DashboardResponse, DashboardError> {
    let request = read_request(request).await?;
    tracing::debug!(
        query = ?request.query,
        body_fields = request.body.len(),
        files = request.files.len(),
        "dashboard request received"
    );
    action.dispatch(&request, &DashboardContext::now()).await
}
