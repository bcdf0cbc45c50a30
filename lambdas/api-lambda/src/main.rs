use aws_sdk_s3::Client as S3Client;
use hybb_shared::blob_store::S3BlobStore;
use hybb_shared::config::{Config, CredentialSource};
use hybb_shared::google_auth::{ServiceAccountKey, ServiceAccountTokenSource};
use hybb_shared::sheets::SheetsRowStore;
use hybb_shared::AppState;
use lambda_http::{run, service_fn, Error, Request};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;

    let key_json = match &config.credentials {
        CredentialSource::Inline(json) => json.clone(),
        CredentialSource::File(path) => std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read service account key {}: {}", path, e))?,
    };
    let key = ServiceAccountKey::from_json(&key_json)?;

    // Initialize clients once at startup
    let http = reqwest::Client::new();
    let tokens = Arc::new(ServiceAccountTokenSource::new(http.clone(), key)?);
    let rows = Arc::new(SheetsRowStore::new(
        http,
        tokens,
        config.sheets_api_base.clone(),
        config.spreadsheet_id.clone(),
        config.worksheet_name.clone(),
    ));

    let aws_config = aws_config::load_from_env().await;
    let blobs = Arc::new(S3BlobStore::new(
        S3Client::new(&aws_config),
        config.photo_bucket.clone(),
        config.photo_prefix.clone(),
        config.photo_public_base_url.clone(),
    ));

    let state = AppState::new(config, rows, blobs);

    // Without the sheet nothing works; fail the cold start
    if let Err(e) = state.repository.ensure_header().await {
        tracing::error!("⚠️ Cannot access request sheet, check sharing and API permissions: {}", e);
        return Err(e.into());
    }
    tracing::info!("Request sheet reachable, serving");

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
