use axum::body::{to_bytes, Body};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{Request, StatusCode};
use axum::Router;
use spkg_auth::token_backend::{self, TokenAuthProvider};
use spkg_auth::AuthProvider;
use spkg_index::JsonIndexProvider;
use spkg_server::ServiceConfig;
use spkg_storage::fs::{FsStorageProvider, StoreConfig};
use spkg_storage::path::FilenamePolicy;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tower::ServiceExt;

pub const TOKEN: &str = "secret123";
pub const BOUNDARY: &str = "spkg-test-boundary";
pub const UTF8_TOKEN: &str = "jeton-été";
pub const INDEX: &str =
    r#"{"foo": {"binpkg_path": "foo/"}, "café": {"binpkg_path": "cafe/"}, "lost": {"binpkg_path": "lost/"}}"#;

/// Storage root with `foo/` and `cafe/` package directories. `lost` is indexed but has no directory.
pub struct TestRepo {
    dir: TempDir,
    pub router: Router,
}

impl TestRepo {
    pub fn new() -> Self {
        Self::with_policy(FilenamePolicy::SingleComponent)
    }

    pub fn with_policy(filename_policy: FilenamePolicy) -> Self {
        let auth = TokenAuthProvider::new(token_backend::Config {
            allowed_tokens: vec![TOKEN.to_owned(), "other-token".to_owned(), UTF8_TOKEN.to_owned()],
        })
        .unwrap();
        Self::with_auth(auth, filename_policy)
    }

    pub fn with_auth<A>(auth: A, filename_policy: FilenamePolicy) -> Self
    where
        A: AuthProvider + Send + Sync + 'static,
    {
        let _ = tracing_subscriber::fmt::fmt().with_test_writer().try_init();

        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("local_repo");
        std::fs::create_dir_all(root.join("foo")).unwrap();
        std::fs::create_dir_all(root.join("cafe")).unwrap();

        let index = JsonIndexProvider::from_json_str(INDEX).unwrap();
        let storage = FsStorageProvider::new(StoreConfig {
            root,
            filename_policy,
        })
        .unwrap();

        let router = spkg_server::router(service_config(), index, storage, auth);
        Self { dir, router }
    }

    pub fn root(&self) -> PathBuf {
        self.dir.path().join("local_repo")
    }

    pub fn parent_of_root(&self) -> &Path {
        self.dir.path()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), 100_000).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }
}

pub fn service_config() -> ServiceConfig {
    ServiceConfig {
        address: "127.0.0.1".into(),
        port: 0,
        metrics_address: None,
    }
}

pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub data: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn file(filename: &'a str, data: &'a [u8]) -> Self {
        Self {
            name: "file",
            filename: Some(filename),
            data,
        }
    }
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        let disposition = match part.filename {
            Some(filename) => format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n",
                part.name
            ),
            None => format!("Content-Disposition: form-data; name=\"{}\"\r\n", part.name),
        };
        body.extend_from_slice(disposition.as_bytes());
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(part.data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

pub fn upload_request(authorization: Option<&str>, package: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/upload")
        .header(CONTENT_TYPE, format!("multipart/form-data; boundary={BOUNDARY}"));
    if let Some(authorization) = authorization {
        builder = builder.header(AUTHORIZATION, authorization);
    }
    if let Some(package) = package {
        builder = builder.header("Package", package);
    }
    builder.body(Body::from(body)).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
