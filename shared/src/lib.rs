pub mod types;
pub mod error;
pub mod config;
pub mod row_store;
pub mod sheets;
pub mod google_auth;
pub mod blob_store;
pub mod image_processing;
pub mod repository;
pub mod submission;
pub mod review;
pub mod reporting;

use blob_store::BlobStore;
use config::Config;
use repository::RequestRepository;
use review::AccessGate;
use row_store::RowStore;
use std::sync::Arc;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub repository: RequestRepository,
    pub gate: AccessGate,
}

impl AppState {
    pub fn new(config: Config, rows: Arc<dyn RowStore>, blobs: Arc<dyn BlobStore>) -> Arc<Self> {
        let gate = AccessGate::new(config.admin_password.clone());
        Arc::new(Self {
            config,
            repository: RequestRepository::new(rows, blobs),
            gate,
        })
    }
}
