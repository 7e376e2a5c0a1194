pub mod cards;
pub mod completion;
pub mod config;
pub mod session;
pub mod transactions;

use std::sync::Arc;

use anyhow::{Context, Result};
use shared::{
    activity::{ActivityLog, WriterSurface},
    client::BankClient,
    config::ClientConfig,
    models::ErrorResponse,
    session::FileStore,
    transport::{ApiResponse, ReqwestTransport},
};

/// Builds a client persisting its session to disk and streaming the
/// activity log to standard output.
pub fn connect(config: &ClientConfig) -> Result<BankClient> {
    let transport =
        ReqwestTransport::new(&config.user_agent).context("failed to build HTTP client")?;
    let store = FileStore::new(config.resolved_session_path());
    let log = ActivityLog::new(Some(Arc::new(WriterSurface::stdout())));

    Ok(BankClient::from_config(
        config,
        Arc::new(transport),
        Arc::new(store),
        log,
    ))
}

/// One-line summary of a non-2xx answer. The full body is already in the
/// activity log.
pub fn report_failure(response: &ApiResponse) {
    match ErrorResponse::from_body(&response.body) {
        Some(error) => println!("Request failed ({}): {error}", response.status),
        None => println!("Request failed with status {}", response.status),
    }
}
