//! Device discovery over the `/mac` identity endpoint

use crate::{
    client::DeviceClient,
    error::{AppError, Result},
    logging::NetworkLogger,
    models::DeviceRegistry,
};

/// Identify every address in order and build the registry.
///
/// The first unreachable device or malformed identity aborts discovery, as
/// does a MAC address reported twice.
pub async fn discover(client: &dyn DeviceClient, addresses: &[String], logger: &NetworkLogger) -> Result<DeviceRegistry> {
    if addresses.is_empty() {
        return Err(AppError::discovery("No device addresses to discover"));
    }

    let mut registry = DeviceRegistry::default();
    for address in addresses {
        let device = match client.identify(address).await {
            Ok(device) => device,
            Err(error) => {
                logger.log_discovery(address, Err(&error)).await;
                return Err(error);
            }
        };
        logger
            .log_discovery(address, Ok((device.name.as_str(), device.mac.as_str())))
            .await;

        registry.push(device).map_err(|e| {
            AppError::discovery(format!("Device at {} cannot join the registry: {}", address, e))
        })?;
    }

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::HttpDeviceClient;
    use crate::models::Config;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn quiet_logger() -> NetworkLogger {
        NetworkLogger::new(&Config {
            enable_color: false,
            ..Config::default()
        })
    }

    async fn device_server(identity: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/mac"))
            .respond_with(ResponseTemplate::new(200).set_body_string(identity))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn test_discover_single_device() {
        let server = device_server("n5\nbc:f5:ac:5c:50:87").await;
        let client = HttpDeviceClient::with_settings(server.address().port(), Duration::from_secs(5), quiet_logger()).unwrap();
        let addresses = vec![server.address().ip().to_string()];

        let registry = discover(&client, &addresses, &quiet_logger()).await.unwrap();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.devices()[0].name, "n5");
        assert_eq!(registry.devices()[0].mac, "BC:F5:AC:5C:50:87");
    }

    #[tokio::test]
    async fn test_duplicate_mac_is_discovery_error() {
        let server = device_server("n5\nBC:F5:AC:5C:50:87").await;
        let client = HttpDeviceClient::with_settings(server.address().port(), Duration::from_secs(5), quiet_logger()).unwrap();
        let ip = server.address().ip().to_string();

        let error = discover(&client, &[ip.clone(), ip], &quiet_logger()).await.unwrap_err();
        assert_eq!(error.category(), "DISCOVERY");
    }

    #[tokio::test]
    async fn test_malformed_identity_aborts() {
        let server = device_server("no mac here").await;
        let client = HttpDeviceClient::with_settings(server.address().port(), Duration::from_secs(5), quiet_logger()).unwrap();

        let error = discover(&client, &[server.address().ip().to_string()], &quiet_logger())
            .await
            .unwrap_err();
        assert_eq!(error.category(), "DISCOVERY");
    }

    #[tokio::test]
    async fn test_no_addresses() {
        let client = HttpDeviceClient::new(&Config::default()).unwrap();
        let error = discover(&client, &[], &quiet_logger()).await.unwrap_err();
        assert_eq!(error.category(), "DISCOVERY");
    }
}
