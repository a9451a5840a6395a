use std::sync::Arc;

use resub_core::config::AppConfig;
use resub_core::{ActivationError, HostApi};
use resub_mattermost::{ClientError, MattermostClient, Plugin};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub host: Arc<dyn HostApi>,
    pub plugin: Arc<Plugin>,
    pub server_version: String,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("host client could not be built: {0}")]
    Client(#[from] ClientError),
    #[error("plugin activation failed: {0}")]
    Activation(#[from] ActivationError),
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        host_url = %config.host.url,
        "starting application bootstrap"
    );

    let client = MattermostClient::from_config(&config.host)?;
    bootstrap_with_host(config, Arc::new(client)).await
}

/// Activates the plugin against `host`. A host below the minimum version
/// stops startup here.
pub async fn bootstrap_with_host(
    config: AppConfig,
    host: Arc<dyn HostApi>,
) -> Result<Application, BootstrapError> {
    let plugin = Plugin::new(
        host.clone(),
        config.substitution.policy(),
        config.plugin.min_server_version.clone(),
    );
    let server_version = plugin.on_activate().await?;

    info!(
        event_name = "system.bootstrap.activated",
        correlation_id = "bootstrap",
        plugin_id = %config.plugin.id,
        server_version = %server_version,
        "plugin activated against host"
    );

    Ok(Application { config, host, plugin: Arc::new(plugin), server_version })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use resub_core::config::AppConfig;
    use resub_core::{ActivationError, InMemoryHost};
    use resub_mattermost::ClientError;

    use crate::bootstrap::{bootstrap_with_config, bootstrap_with_host, BootstrapError};

    #[tokio::test]
    async fn bootstrap_fails_fast_on_a_schemeless_host_url() {
        let mut config = AppConfig::default();
        config.host.url = "chat.example.com".to_string();

        let result = bootstrap_with_config(config).await;

        assert!(matches!(result, Err(BootstrapError::Client(ClientError::InvalidUrl(_)))));
    }

    #[tokio::test]
    async fn activation_succeeds_on_a_supported_host() {
        let app = bootstrap_with_host(AppConfig::default(), Arc::new(InMemoryHost::new("9.5.1")))
            .await
            .expect("supported host should activate");

        assert_eq!(app.server_version, "9.5.1");
        assert!(!app.plugin.policy().notify_on_host_failure);
    }

    #[tokio::test]
    async fn activation_refuses_an_old_host() {
        let result =
            bootstrap_with_host(AppConfig::default(), Arc::new(InMemoryHost::new("5.9.3"))).await;

        assert!(matches!(
            result,
            Err(BootstrapError::Activation(ActivationError::Unsupported { .. }))
        ));
    }
}
