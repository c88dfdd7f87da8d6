//! Request plumbing shared by the HTTP-backed tools

use crate::error::{ProviderError, Result};
use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;

/// Send a request to an external provider and decode its JSON body.
///
/// Transport failures, non-2xx statuses and undecodable bodies all become
/// [`ProviderError`]s naming the provider.
pub(crate) async fn fetch_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: &str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::request(provider, e))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        tracing::warn!("{} returned HTTP {}", provider, status.as_u16());
        return Err(ProviderError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body,
        }
        .into());
    }

    let body = response
        .text()
        .await
        .map_err(|e| ProviderError::request(provider, e))?;

    serde_json::from_str(&body)
        .map_err(|e| ProviderError::unexpected_shape(provider, e).into())
}
