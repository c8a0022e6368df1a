//! `POST /upload`: store one binpkg for an indexed package.
//!
//! The request carries `Authorization: Bearer <token>`, a `Package: <name>`
//! header and a multipart body with a `file` part. Steps run in a fixed
//! order and the first failure ends the request:
//! credential (403), file part (400), index lookup (404), write (500).

use crate::ServiceState;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use metrics::counter;
use spkg_api_types::index::{IndexError, IndexProvider};
use spkg_api_types::storage::{StorageError, StorageProvider};
use spkg_auth::{AuthError, AuthProvider};
use std::sync::Arc;

/// Header naming the package the upload belongs to.
pub const PACKAGE_HEADER: &str = "package";

/// Multipart part holding the binpkg.
pub const FILE_FIELD: &str = "file";

pub fn upload_router<I, S, A>() -> Router<Arc<ServiceState<I, S, A>>>
where
    I: IndexProvider + Send + Sync + 'static,
    S: StorageProvider + Send + Sync + 'static,
    A: AuthProvider + Send + Sync + 'static,
{
    Router::new().route(
        "/upload",
        post(upload::<I, S, A>).layer(DefaultBodyLimit::disable()),
    )
}

async fn upload<I, S, A>(
    State(state): State<Arc<ServiceState<I, S, A>>>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> axum::response::Result<String>
where
    I: IndexProvider,
    S: StorageProvider,
    A: AuthProvider + Sync,
{
    // Index keys are UTF-8; any other name can't be in the index and ends up as a 404.
    let package = headers
        .get(PACKAGE_HEADER)
        .and_then(|v| std::str::from_utf8(v.as_bytes()).ok())
        .unwrap_or_default();

    let auth_result = match state.auth.token_from_headers(&headers) {
        Ok(token) => state.auth.auth_upload(token, package).await,
        Err(e) => Err(e),
    };
    if let Err(e) = auth_result {
        let error_label = match &e {
            AuthError::Forbidden => "missing_credentials",
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::ServiceError(_) => "auth_service_error",
        };
        if matches!(e, AuthError::InvalidCredentials) {
            tracing::warn!(package, "Client authenticated with an invalid token");
        }
        count_error(error_label);
        return Err(e.into());
    }

    let mut multipart = multipart.map_err(|rejection| {
        tracing::debug!(%rejection, "Upload body is not multipart");
        count_error("no_file_part");
        (StatusCode::BAD_REQUEST, "No file part")
    })?;

    let field = loop {
        match multipart.next_field().await {
            Ok(Some(field)) if field.name() == Some(FILE_FIELD) => break field,
            Ok(Some(_)) => {}
            Ok(None) => {
                count_error("no_file_part");
                return Err((StatusCode::BAD_REQUEST, "No file part").into());
            }
            Err(error) => {
                tracing::debug!(%error, "Failed to parse multipart body");
                count_error("no_file_part");
                return Err((StatusCode::BAD_REQUEST, "No file part").into());
            }
        }
    };

    // A part without a filename, or with an empty one, is a plain form value, not a file.
    let filename = match field.file_name() {
        Some(filename) if !filename.is_empty() => filename.to_owned(),
        _ => {
            count_error("no_file_part");
            return Err((StatusCode::BAD_REQUEST, "No file part").into());
        }
    };

    let binpkg_path = match state.index.binpkg_path(package).await {
        Ok(path) => path,
        Err(e) => {
            let error_label = match &e {
                IndexError::NotFound => "package_not_found",
                IndexError::ServiceError(_) => "index_service_error",
            };
            count_error(error_label);
            return Err(e.into());
        }
    };

    // A body that ends or breaks inside the file part is a malformed form.
    let data = field.bytes().await.map_err(|error| {
        tracing::debug!(%error, "Failed to read file part");
        count_error("no_file_part");
        (StatusCode::BAD_REQUEST, "No file part")
    })?;
    let len = data.len();

    if let Err(e) = state.storage.put_binpkg(&binpkg_path, &filename, data).await {
        let error_label = match &e {
            StorageError::InvalidFilename(_) => "invalid_filename",
            StorageError::ServiceError(_) => "storage_service_error",
        };
        count_error(error_label);
        return Err(e.into());
    }

    counter!("spkg_uploads_total", "package" => package.to_owned()).increment(1);
    tracing::info!(package, filename = filename.as_str(), len, "Stored uploaded binpkg");

    Ok(format!(
        "Binpkg for package '{package}' uploaded successfully ({filename})"
    ))
}

fn count_error(error_label: &'static str) {
    counter!("spkg_upload_errors_total", "error" => error_label).increment(1);
}
