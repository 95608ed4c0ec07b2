//! authzd - container authorization daemon.

use anyhow::Context;
use authz_proto::UserId;
use authzd::config::{Config, validation};
use authzd::security::{SharedKeyAuthority, load_or_generate};
use authzd::store::open_store;
use authzd::{AuthorizationService, AuthorizationState, StateParams, http, metrics};
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "authzd.toml".to_string());

    let config = Config::load(&config_path).map_err(|e| {
        error!(path = %config_path, error = %e, "Failed to load config");
        e
    })?;

    if let Err(errors) = validation::validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        anyhow::bail!("{} configuration error(s) in {}", errors.len(), config_path);
    }

    info!(
        server = %config.server.name,
        backend = ?config.database.backend,
        verify_caps = config.capability.verify_caps,
        "Starting authzd"
    );

    let server_key = load_or_generate(config.capability.key_file.as_deref())
        .context("failed to load server key")?;

    let kv = open_store(&config.database).context("failed to open store")?;

    let authority = SharedKeyAuthority::new(config.authn.shared_secret.as_bytes());
    for user in &config.authn.revoked_users {
        // Already checked by validation.
        if let Ok(user) = user.parse::<UserId>() {
            authority.revoke(user);
        }
    }
    if !config.authn.revoked_users.is_empty() {
        info!(count = config.authn.revoked_users.len(), "Loaded revoked users");
    }

    if !config.capability.verify_caps {
        warn!("ACL membership checks are disabled; capabilities alone authorize access");
    }

    let state = Arc::new(AuthorizationState::new(StateParams {
        server_key,
        acl_enabled: config.capability.verify_caps,
        kv,
        verifier: Arc::new(authority),
    }));
    let service = AuthorizationService::new(state);

    // Convention: metrics_port = 0 disables the HTTP endpoint.
    let metrics_port = config.server.metrics_port.unwrap_or(9090);
    if metrics_port == 0 {
        info!("Metrics disabled");
    } else {
        metrics::init();
        tokio::spawn(async move {
            http::run_http_server(metrics_port).await;
        });
        info!(port = metrics_port, "Prometheus HTTP server started");
    }

    let mut revocations = service.subscribe_revocations();
    tokio::spawn(async move {
        loop {
            match revocations.recv().await {
                Ok(notice) => info!(
                    container = %notice.container_id,
                    users = notice.users.len(),
                    holders = notice.holders.len(),
                    "Revocation"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Revocation log fell behind");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    info!("authzd ready");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("Shutting down");
    Ok(())
}
