use std::sync::Arc;

use anyhow::Context;

use gatehouse_auth::{AuthConfig, Policy, Role};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    gatehouse_observability::init();

    let config = AuthConfig::from_env().context("invalid auth configuration")?;

    let policy = match std::env::var("GATEHOUSE_POLICY") {
        Ok(path) => Policy::from_path(&path).with_context(|| format!("failed to load policy from {path}"))?,
        Err(_) => gatehouse_api::app::notes::default_policy(),
    };

    let services = Arc::new(gatehouse_api::app::build_services(&config, policy));

    if let Ok(secret) = std::env::var("GATEHOUSE_ADMIN_PASSWORD") {
        let login = std::env::var("GATEHOUSE_ADMIN_LOGIN").unwrap_or_else(|_| "admin".to_string());
        services
            .register_user(&login, "Administrator", Role::new("admin"), &secret)
            .context("failed to seed admin user")?;
    }

    let app = gatehouse_api::app::build_app(services);

    let bind = std::env::var("GATEHOUSE_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
