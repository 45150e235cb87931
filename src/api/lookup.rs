use crate::api::client::ApiClientError;
use crate::domain::{Device, DeviceDirectory};
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{info, instrument, warn};

/// Values offered when editing the filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterChoices {
    pub codes: Vec<String>,
    pub actions: Vec<String>,
}

#[instrument(skip(client))]
pub async fn fetch_devices(client: &Client, api_url: &str) -> Result<Vec<Device>, ApiClientError> {
    info!("Retrieving devices...");
    let devices: Vec<Device> = get_json(client, &format!("{}/api/devices", api_url)).await?;
    info!("Retrieving devices... OK, {} found", devices.len());
    Ok(devices)
}

#[instrument(skip(client))]
pub async fn fetch_event_codes(client: &Client, api_url: &str) -> Result<Vec<String>, ApiClientError> {
    get_json(client, &format!("{}/api/event-codes", api_url)).await
}

#[instrument(skip(client))]
pub async fn fetch_event_actions(client: &Client, api_url: &str) -> Result<Vec<String>, ApiClientError> {
    get_json(client, &format!("{}/api/event-actions", api_url)).await
}

async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, ApiClientError> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json::<T>().await?)
}

/// Fetches the device list into a fresh directory, for reloads while the feed runs.
#[derive(Debug, Clone)]
pub struct DeviceLookup {
    client: Client,
    api_url: String,
}

impl DeviceLookup {
    pub fn new(client: Client, api_url: &str) -> Self {
        DeviceLookup {
            client,
            api_url: api_url.to_string(),
        }
    }

    pub async fn fetch_directory(&self) -> Result<DeviceDirectory, ApiClientError> {
        fetch_devices(&self.client, &self.api_url).await.map(DeviceDirectory::new)
    }
}

/// Never fails, an unreachable device list leaves every event showing its raw device uuid.
pub async fn load_directory(client: &Client, api_url: &str) -> DeviceDirectory {
    match fetch_devices(client, api_url).await {
        Ok(devices) => DeviceDirectory::new(devices),
        Err(e) => {
            warn!("⚠️ Unable to retrieve devices, showing device uuids instead: {}", e);
            DeviceDirectory::default()
        }
    }
}

pub async fn load_choices(client: &Client, api_url: &str) -> FilterChoices {
    let (codes, actions) = tokio::join!(fetch_event_codes(client, api_url), fetch_event_actions(client, api_url));

    FilterChoices {
        codes: codes.unwrap_or_else(|e| {
            warn!("⚠️ Unable to retrieve event codes: {}", e);
            Vec::new()
        }),
        actions: actions.unwrap_or_else(|e| {
            warn!("⚠️ Unable to retrieve event actions: {}", e);
            Vec::new()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error;

    #[tokio::test]
    async fn fetch_devices_returns_mapped_devices() -> Result<(), Box<dyn Error>> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/api/devices")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(include_str!("../../tests/resources/devices_response.json"))
            .create_async()
            .await;

        let devices = fetch_devices(&Client::new(), &server.url()).await?;

        mock.assert_async().await;
        assert_eq!(devices.len(), 2);
        assert_eq!(
            devices[0],
            Device {
                uuid: "5b0e1c7e-1b5c-4f4e-9f51-2d9f0f3c1a10".to_string(),
                name: "Front door".to_string(),
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn load_directory_falls_back_to_an_empty_directory() {
        let mut server = mockito::Server::new_async().await;

        let _mock = server.mock("GET", "/api/devices").with_status(500).create_async().await;

        let directory = load_directory(&Client::new(), &server.url()).await;

        assert_eq!(directory.len(), 0);
        assert_eq!(directory.display_name("cam-1"), "cam-1");
    }

    #[tokio::test]
    async fn load_choices_degrades_per_list() {
        let mut server = mockito::Server::new_async().await;

        let _codes = server
            .mock("GET", "/api/event-codes")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"["VideoMotion", "AlarmLocal"]"#)
            .create_async()
            .await;
        let _actions = server.mock("GET", "/api/event-actions").with_status(200).with_body("not json").create_async().await;

        let choices = load_choices(&Client::new(), &server.url()).await;

        assert_eq!(
            choices,
            FilterChoices {
                codes: vec!["VideoMotion".to_string(), "AlarmLocal".to_string()],
                actions: vec![],
            }
        );
    }
}
