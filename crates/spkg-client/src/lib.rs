use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::path::Path;
use thiserror::Error;

const UPLOAD_PATH: &str = "upload";

pub struct Client {
    http: reqwest::Client,
    endpoint: String,
    token: String,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("The server rejected the auth token")]
    Forbidden,
    #[error("Package '{0}' is not in the repository index")]
    PackageNotFound(String),
    #[error("The server rejected the upload: {0}")]
    BadRequest(String),
    #[error("Received error from spkg server: {0}")]
    ServerError(String),
    #[error("Failed to read the binpkg")]
    Io(#[from] std::io::Error),
    #[error("Received unknown error")]
    Other(#[from] anyhow::Error),
}

impl From<reqwest::Error> for Error {
    fn from(value: reqwest::Error) -> Self {
        Self::Other(anyhow::anyhow!(value))
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl Client {
    /// `endpoint` is the server's base URL, e.g. `http://repo.example.com:8080`.
    pub fn new(endpoint: &str, token: impl Into<String>) -> Self {
        Self::from_reqwest(endpoint, token, reqwest::Client::new())
    }

    pub fn from_reqwest(endpoint: &str, token: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            http: client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}/{UPLOAD_PATH}", self.endpoint)
    }

    /// Upload a binpkg stored on disk, named after its file name.
    pub async fn upload_file(&self, package: &str, binpkg: &Path) -> Result<String> {
        let filename = binpkg
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| anyhow::anyhow!("{} has no usable file name", binpkg.display()))?
            .to_owned();
        let data = std::fs::read(binpkg)?;
        self.upload(package, &filename, data).await
    }

    /// Upload `data` as `<filename>` for `package`, returning the server's confirmation.
    pub async fn upload(&self, package: &str, filename: &str, data: Vec<u8>) -> Result<String> {
        let form = Form::new().part("file", Part::bytes(data).file_name(filename.to_owned()));

        let resp = self
            .http
            .post(self.upload_url())
            .bearer_auth(&self.token)
            .header("Package", package)
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        check_status(status, text, package)
    }
}

fn check_status(status: StatusCode, text: String, package: &str) -> Result<String> {
    match status {
        s if s.is_success() => Ok(text),
        StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => Err(Error::Forbidden),
        StatusCode::NOT_FOUND => Err(Error::PackageNotFound(package.to_owned())),
        StatusCode::BAD_REQUEST => Err(Error::BadRequest(text)),
        s if s.is_server_error() => Err(Error::ServerError(text)),
        s => Err(Error::Other(anyhow::anyhow!("unexpected status {s}: {text}"))),
    }
}
