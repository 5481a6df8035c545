//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a local image
//! store in a temporary directory, and a full [`AppContext`]. The
//! [`with_server`](TestHarness::with_server) constructor starts Axum on a
//! random port for HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use schooldir::config::Config;
use schooldir::images::{ImageStore, LocalImageStore};
use schooldir::server::{create_router, AppContext};
use schooldir::service::RecordService;
use schooldir::validation::{Candidate, ImageUpload};
use schooldir_db::executor::{QueryExecutor, RetryPolicy};
use schooldir_db::pool::{init_memory_pool, DbPool};
use tempfile::TempDir;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub upload_dir: TempDir,
}

impl TestHarness {
    /// Create a new harness storing images in a fresh temporary directory.
    pub fn new() -> Self {
        let upload_dir = TempDir::new().expect("failed to create upload dir");
        let store: Arc<dyn ImageStore> =
            Arc::new(LocalImageStore::new(upload_dir.path().to_path_buf()));
        Self::build(upload_dir, store)
    }

    /// Create a harness with a custom image store.
    pub fn with_store(store: Arc<dyn ImageStore>) -> Self {
        let upload_dir = TempDir::new().expect("failed to create upload dir");
        Self::build(upload_dir, store)
    }

    fn build(upload_dir: TempDir, store: Arc<dyn ImageStore>) -> Self {
        let db = init_memory_pool().expect("failed to create in-memory pool");
        let executor = QueryExecutor::with_policy(db.clone(), RetryPolicy::immediate(3));
        let service = RecordService::new(executor, store);

        let mut config = Config::default();
        config.storage.upload_dir = upload_dir.path().to_path_buf();

        let ctx = AppContext::new(service, config);
        Self {
            ctx,
            db,
            upload_dir,
        }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        let harness = Self::new();
        let addr = harness.serve().await;
        (harness, addr)
    }

    /// Serve this harness's router on a random port.
    pub async fn serve(&self) -> SocketAddr {
        let app = create_router(self.ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        addr
    }

    pub fn service(&self) -> &RecordService {
        &self.ctx.service
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> schooldir_db::pool::PooledConnection {
        schooldir_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Number of rows in `schools`.
    pub fn school_count(&self) -> i64 {
        self.conn()
            .query_row("SELECT COUNT(*) FROM schools", [], |row| row.get(0))
            .expect("failed to count schools")
    }

    /// Insert a row directly, bypassing validation and image storage.
    pub fn seed(&self, name: &str, address: &str, city: &str, state: &str) -> i64 {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO schools (name, address, city, state, contact, image, email)
             VALUES (?1, ?2, ?3, ?4, '5125551234', ?5, 'office@example.com')",
            rusqlite::params![name, address, city, state, format!("seed_{name}.jpg")],
        )
        .expect("failed to seed school");
        conn.last_insert_rowid()
    }

    /// Make every subsequent insert into `schools` fail.
    pub fn reject_inserts(&self) {
        self.conn()
            .execute_batch(
                "CREATE TRIGGER reject_inserts BEFORE INSERT ON schools
                 BEGIN SELECT RAISE(ABORT, 'inserts disabled'); END;",
            )
            .expect("failed to create trigger");
    }

    /// Files currently in the upload directory.
    pub fn uploaded_files(&self) -> Vec<PathBuf> {
        match std::fs::read_dir(self.upload_dir.path()) {
            Ok(entries) => entries.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

/// JPEG-looking payload of exactly `size` bytes.
pub fn jpeg_bytes(size: usize) -> Vec<u8> {
    let mut data = vec![0u8; size];
    let header = [0xFF, 0xD8, 0xFF, 0xE0];
    let n = header.len().min(size);
    data[..n].copy_from_slice(&header[..n]);
    data
}

pub fn jpeg_upload(size: usize) -> ImageUpload {
    ImageUpload::new("campus.jpg", "image/jpeg", jpeg_bytes(size))
}

/// A valid candidate with a 500 KB JPEG.
pub fn candidate(name: &str, city: &str) -> Candidate {
    Candidate {
        name: name.to_string(),
        address: "1 Main St".to_string(),
        city: city.to_string(),
        state: "Texas".to_string(),
        contact: "5125551234".to_string(),
        email: "a@b.com".to_string(),
        image: Some(jpeg_upload(500 * 1024)),
    }
}

/// Add-school form mirroring [`candidate`].
pub fn school_form(name: &str, city: &str) -> reqwest::multipart::Form {
    let image = reqwest::multipart::Part::bytes(jpeg_bytes(500 * 1024))
        .file_name("campus.jpg")
        .mime_str("image/jpeg")
        .expect("valid mime");

    reqwest::multipart::Form::new()
        .text("name", name.to_string())
        .text("address", "1 Main St")
        .text("city", city.to_string())
        .text("state", "Texas")
        .text("contact", "5125551234")
        .text("email", "a@b.com")
        .part("image", image)
}
