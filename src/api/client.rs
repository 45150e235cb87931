use crate::app_config::AppConfig;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::{Client, header};
use thiserror::Error;

pub fn new_client(config: &AppConfig) -> Result<Client, ApiClientError> {
    let mut headers = header::HeaderMap::new();
    if let Some(token) = config.api().session_token() {
        let mut authorization_value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        authorization_value.set_sensitive(true);
        headers.insert(AUTHORIZATION, authorization_value);
    }

    let client = Client::builder().default_headers(headers).build()?;
    Ok(client)
}

#[derive(Error, Debug)]
pub enum ApiClientError {
    #[error("request error: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("API client set an invalid header value: {0}")]
    InvalidHeaderValue(#[from] header::InvalidHeaderValue),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app_config::AppConfigBuilder;

    #[tokio::test]
    async fn new_client_sets_the_session_token_header() -> Result<(), ApiClientError> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .match_header("authorization", "Bearer s3cret")
            .create_async()
            .await;

        let config = AppConfigBuilder::new().api_url(server.url()).session_token("s3cret").build();
        let client = new_client(&config)?;

        client.get(format!("{}{}", server.url(), "/")).send().await?;

        // Verify that the call came in and that the header is set
        mock.assert();

        Ok(())
    }

    #[tokio::test]
    async fn new_client_without_a_session_sends_no_authorization() -> Result<(), ApiClientError> {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/")
            .with_status(200)
            .match_header("authorization", mockito::Matcher::Missing)
            .create_async()
            .await;

        let config = AppConfigBuilder::new().api_url(server.url()).build();
        let client = new_client(&config)?;

        client.get(format!("{}{}", server.url(), "/")).send().await?;

        mock.assert_async().await;

        Ok(())
    }

    #[test]
    fn new_client_rejects_a_token_with_newlines() {
        let config = AppConfigBuilder::new().session_token("bad\ntoken").build();

        assert!(matches!(new_client(&config), Err(ApiClientError::InvalidHeaderValue(_))));
    }
}
