//! Submission, edit and file download endpoints.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use printdesk_core::{PrintRequest, PrintType, RequestFields, Upload};
use serde::Serialize;
use std::sync::Arc;

use super::error::ApiError;
use super::middleware::CurrentPrincipal;
use crate::metrics::{FILES_UPLOADED_TOTAL, REQUESTS_EDITED_TOTAL, REQUESTS_SUBMITTED_TOTAL};
use crate::state::AppState;

/// Notice plus the affected request.
#[derive(Debug, Serialize)]
pub struct RequestNotice {
    pub message: String,
    pub request: PrintRequest,
}

/// A submission or edit form as posted by a client.
#[derive(Debug)]
pub struct RequestForm {
    pub fields: RequestFields,
    pub uploads: Vec<Upload>,
}

/// Raw text values collected from the multipart body.
#[derive(Debug, Default)]
struct RawForm {
    document_count: Option<String>,
    page_count: Option<String>,
    duplex: Option<String>,
    staple: Option<String>,
    print_type: Option<String>,
    note: Option<String>,
    uploads: Vec<Upload>,
}

impl RawForm {
    fn into_form(self) -> Result<RequestForm, ApiError> {
        let print_type = required(self.print_type, "print_type")?
            .parse::<PrintType>()
            .map_err(ApiError::bad_request)?;

        Ok(RequestForm {
            fields: RequestFields {
                document_count: parse_count(self.document_count, "document_count")?,
                page_count: parse_count(self.page_count, "page_count")?,
                duplex: parse_flag(self.duplex, "duplex")?,
                staple: parse_flag(self.staple, "staple")?,
                print_type,
                note: self.note,
            },
            uploads: self.uploads,
        })
    }
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request(format!("{} is required", name)))
}

fn parse_count(value: Option<String>, name: &str) -> Result<u32, ApiError> {
    required(value, name)?
        .trim()
        .parse::<u32>()
        .map_err(|_| ApiError::bad_request(format!("{} must be a positive integer", name)))
}

/// Checkbox semantics: an absent field is unchecked.
fn parse_flag(value: Option<String>, name: &str) -> Result<bool, ApiError> {
    let Some(value) = value else {
        return Ok(false);
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "on" | "1" | "yes" | "sim" => Ok(true),
        "false" | "off" | "0" | "no" | "nao" | "" => Ok(false),
        other => Err(ApiError::bad_request(format!(
            "{} must be a boolean, got {:?}",
            name, other
        ))),
    }
}

fn malformed(e: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::new(e.status(), format!("Malformed form data: {}", e.body_text()))
}

/// Read a submission or edit form.
///
/// Field names from the legacy HTML form are accepted alongside the
/// English ones. A file part with no filename and no content is what
/// browsers send for an empty file input, and is skipped.
pub async fn read_request_form(mut multipart: Multipart) -> Result<RequestForm, ApiError> {
    let mut raw = RawForm::default();

    while let Some(field) = multipart.next_field().await.map_err(malformed)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "files" | "arquivos" => {
                let filename = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field.bytes().await.map_err(malformed)?;
                if filename.is_empty() && data.is_empty() {
                    continue;
                }
                raw.uploads.push(Upload::new(filename, content_type, data.to_vec()));
            }
            "document_count" | "quantidade_documentos" => {
                raw.document_count = Some(field.text().await.map_err(malformed)?)
            }
            "page_count" | "quantidade_folhas" => {
                raw.page_count = Some(field.text().await.map_err(malformed)?)
            }
            "duplex" | "frente_verso" => raw.duplex = Some(field.text().await.map_err(malformed)?),
            "staple" | "grampear" => raw.staple = Some(field.text().await.map_err(malformed)?),
            "print_type" | "tipo_impressao" => {
                raw.print_type = Some(field.text().await.map_err(malformed)?)
            }
            "note" | "observacao" => raw.note = Some(field.text().await.map_err(malformed)?),
            _ => tracing::debug!(field = %name, "Ignoring unknown form field"),
        }
    }

    raw.into_form()
}

/// Submit a new print request.
pub async fn create_request(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    multipart: Multipart,
) -> Result<(StatusCode, Json<RequestNotice>), ApiError> {
    let form = read_request_form(multipart).await?;
    let request = state
        .workflow()
        .submit(&principal, form.fields, form.uploads)
        .await?;

    REQUESTS_SUBMITTED_TOTAL.inc();
    FILES_UPLOADED_TOTAL.inc_by(request.files.len() as u64);

    Ok((
        StatusCode::CREATED,
        Json(RequestNotice {
            message: "Print request submitted.".to_string(),
            request,
        }),
    ))
}

/// Current values of a request its owner may edit.
pub async fn edit_form(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
) -> Result<Json<PrintRequest>, ApiError> {
    let request = state.workflow().get_for_edit(&principal, &id).await?;
    Ok(Json(request))
}

/// Replace the fields of a pending request; new files replace the old ones.
pub async fn edit_request(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<RequestNotice>, ApiError> {
    let form = read_request_form(multipart).await?;
    let uploads = (!form.uploads.is_empty()).then_some(form.uploads);
    let replaced = uploads.is_some();

    let request = state
        .workflow()
        .edit(&principal, &id, form.fields, uploads)
        .await?;

    REQUESTS_EDITED_TOTAL.inc();
    if replaced {
        FILES_UPLOADED_TOTAL.inc_by(request.files.len() as u64);
    }

    Ok(Json(RequestNotice {
        message: "Print request updated.".to_string(),
        request,
    }))
}

/// Download an attached file.
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    CurrentPrincipal(principal): CurrentPrincipal,
    Path((id, file_id)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let download = state
        .workflow()
        .open_file(&principal, &id, &file_id)
        .await?;

    let content_type = HeaderValue::from_str(&download.file.content_type)
        .unwrap_or(HeaderValue::from_static("application/octet-stream"));
    let disposition = HeaderValue::from_str(&content_disposition(&download.file.filename))
        .unwrap_or(HeaderValue::from_static("attachment"));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        download.data,
    )
        .into_response())
}

fn content_disposition(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}
