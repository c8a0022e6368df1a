// The allow-list backend is needed for the credential checks below.
#![cfg(not(feature = "yes-auth-backend"))]

use spkg::cli::SpkgArgs;
use spkg_client::{Client, Error};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const TOKEN: &str = "secret123";

struct Layout {
    dir: TempDir,
}

impl Layout {
    /// `data/index.json`, `local_repo/foo/` and a config pointing at both.
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir_all(dir.path().join("local_repo/foo")).unwrap();
        std::fs::write(
            data.join("index.json"),
            r#"{"foo": {"binpkg_path": "foo/"}}"#,
        )
        .unwrap();
        let layout = Self { dir };
        layout.write_config(&layout.path("data/index.json"), &layout.path("local_repo"));
        layout
    }

    fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    fn write_config(&self, index_path: &Path, root: &Path) {
        let config = format!(
            "service:\n  address: 127.0.0.1\n  port: 0\nindex_path: {index_path:?}\nallowed_tokens:\n  - {TOKEN}\nstore:\n  root: {root:?}\n"
        );
        std::fs::write(self.config_path(), config).unwrap();
    }

    fn config_path(&self) -> PathBuf {
        self.path("data/config.yml")
    }

    fn args(&self) -> SpkgArgs {
        SpkgArgs {
            config: self.config_path(),
        }
    }
}

#[tokio::test]
async fn client_uploads_to_running_server() {
    let _ = tracing_subscriber::fmt::fmt().with_test_writer().try_init();

    let layout = Layout::new();
    let listening = spkg::start_listening(layout.args()).await.unwrap();
    let endpoint = format!("http://{}", listening.local_addr().unwrap());
    let server = tokio::spawn(listening.serve());

    let client = Client::new(&endpoint, TOKEN);
    let msg = client.upload("foo", "foo-1.0.pkg", b"ABC".to_vec()).await.unwrap();
    assert_eq!(msg, "Binpkg for package 'foo' uploaded successfully (foo-1.0.pkg)");
    assert_eq!(std::fs::read(layout.path("local_repo/foo/foo-1.0.pkg")).unwrap(), b"ABC");

    let built = layout.path("foo-1.1.pkg");
    std::fs::write(&built, b"DEF").unwrap();
    client.upload_file("foo", &built).await.unwrap();
    assert_eq!(std::fs::read(layout.path("local_repo/foo/foo-1.1.pkg")).unwrap(), b"DEF");

    let res = client.upload("bar", "bar-1.0.pkg", b"ABC".to_vec()).await;
    assert!(matches!(res, Err(Error::PackageNotFound(p)) if p == "bar"));

    let res = Client::new(&endpoint, "wrong")
        .upload("foo", "foo-2.0.pkg", b"ABC".to_vec())
        .await;
    assert!(matches!(res, Err(Error::Forbidden)));
    assert!(!layout.path("local_repo/foo/foo-2.0.pkg").exists());

    server.abort();
}

#[tokio::test]
async fn missing_config_fails_startup() {
    let layout = Layout::new();
    std::fs::remove_file(layout.config_path()).unwrap();

    let Err(e) = spkg::start_listening(layout.args()).await else {
        panic!("started without a config");
    };
    assert!(format!("{e:#}").contains("Failed to read config file"), "{e:#}");
}

#[tokio::test]
async fn malformed_index_fails_startup() {
    let layout = Layout::new();
    std::fs::write(layout.path("data/index.json"), "{not json").unwrap();

    let Err(e) = spkg::start_listening(layout.args()).await else {
        panic!("started with a broken index");
    };
    assert!(format!("{e:#}").contains("Failed to load package index"), "{e:#}");
}

#[tokio::test]
async fn missing_storage_root_fails_startup() {
    let layout = Layout::new();
    layout.write_config(&layout.path("data/index.json"), &layout.path("nowhere"));

    let Err(e) = spkg::start_listening(layout.args()).await else {
        panic!("started without a storage root");
    };
    assert!(format!("{e:#}").contains("Failed to open storage root"), "{e:#}");
}
