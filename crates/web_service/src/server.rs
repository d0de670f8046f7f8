use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use relay_core::RelayConfig;
use relay_llm::{provider_from_config, GenerationProvider};
use tokio::sync::oneshot;
use tracing::{error, info};

use crate::controllers::{chat_controller, system_controller};
use crate::middleware::TracingMiddleware;
use crate::session::{SessionStore, StaticSessionStore};

/// Per-process dependencies, constructed once and injected into handlers.
pub struct AppState {
    pub provider: Arc<dyn GenerationProvider>,
    pub sessions: Arc<dyn SessionStore>,
    pub default_streaming: bool,
}

const DEFAULT_WORKER_COUNT: usize = 10;

pub fn app_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/api").configure(chat_controller::config))
        .configure(system_controller::config);
}

fn build_app_state(config: &RelayConfig) -> Result<web::Data<AppState>, String> {
    let provider = provider_from_config(config)
        .map_err(|e| format!("Failed to build upstream provider: {e}"))?;
    let sessions: Arc<dyn SessionStore> = Arc::new(StaticSessionStore::new(
        config.session_tokens.iter().cloned(),
    ));

    Ok(web::Data::new(AppState {
        provider,
        sessions,
        default_streaming: config.default_streaming,
    }))
}

pub async fn run(config: RelayConfig, port: u16) -> Result<(), String> {
    info!("Starting web service...");

    let app_state = build_app_state(&config)?;

    let server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(Cors::permissive())
            .wrap(TracingMiddleware)
            .configure(app_config)
    })
    .workers(DEFAULT_WORKER_COUNT)
    .bind(format!("127.0.0.1:{port}"))
    .map_err(|e| format!("Failed to bind server: {e}"))?
    .run();

    info!("Web service listening on http://127.0.0.1:{port}");

    if let Err(e) = server.await {
        error!("Web server error: {}", e);
        return Err(format!("Web server error: {e}"));
    }

    Ok(())
}

/// Handle to a web service running in the background.
pub struct WebService {
    shutdown_tx: Option<oneshot::Sender<()>>,
    server_handle: Option<tokio::task::JoinHandle<()>>,
    config: RelayConfig,
}

impl WebService {
    pub fn new(config: RelayConfig) -> Self {
        Self {
            shutdown_tx: None,
            server_handle: None,
            config,
        }
    }

    pub async fn start(&mut self, port: u16) -> Result<(), String> {
        if self.server_handle.is_some() {
            return Err("Web service is already running".to_string());
        }

        let (shutdown_tx, mut shutdown_rx) = oneshot::channel::<()>();

        let app_state = build_app_state(&self.config)?;

        let server = HttpServer::new(move || {
            App::new()
                .app_data(app_state.clone())
                .wrap(Cors::permissive())
                .wrap(TracingMiddleware)
                .configure(app_config)
        })
        .workers(DEFAULT_WORKER_COUNT)
        .bind(format!("127.0.0.1:{port}"))
        .map_err(|e| format!("Failed to bind server: {e}"))?
        .run();

        let server_handle = tokio::spawn(async move {
            tokio::select! {
                result = server => {
                    if let Err(e) = result {
                        error!("Web server error: {}", e);
                    }
                }
                _ = &mut shutdown_rx => {
                    info!("Web service shutdown signal received");
                }
            }
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.server_handle = Some(server_handle);

        info!("Web service started on port {port}");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), String> {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            if shutdown_tx.send(()).is_err() {
                error!("Failed to send shutdown signal");
            }
        }

        if let Some(handle) = self.server_handle.take() {
            if let Err(e) = handle.await {
                error!("Error waiting for server shutdown: {}", e);
                return Err(format!("Error waiting for server shutdown: {e}"));
            }
        }

        info!("Web service stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.server_handle.is_some()
    }
}

impl Drop for WebService {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(());
        }
    }
}
