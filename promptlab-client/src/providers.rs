//! Provider discovery endpoint

use crate::PromptLabClient;
use crate::error::Result;
use promptlab_core::domain::provider::ProviderInfo;
use promptlab_core::dto::provider::ProviderList;

impl PromptLabClient {
    /// Providers and models available to pipeline steps
    pub async fn list_providers(&self) -> Result<Vec<ProviderInfo>> {
        let response = self.client.get(self.url("/api/providers")).send().await?;
        let list: ProviderList = self.handle_response(response).await?;
        Ok(list.providers)
    }
}

#[cfg(test)]
mod tests {
    use crate::PromptLabClient;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_providers() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/providers"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "providers": [
                    {"name": "anthropic", "models": ["claude-sonnet-4-5-20250929"]},
                    {"name": "openai", "models": ["gpt-4o", "gpt-4o-mini"]}
                ]
            })))
            .mount(&server)
            .await;

        let client = PromptLabClient::new(server.uri());
        let providers = client.list_providers().await.unwrap();

        assert_eq!(providers.len(), 2);
        assert_eq!(providers[1].models, vec!["gpt-4o", "gpt-4o-mini"]);
    }

    #[tokio::test]
    async fn test_server_error_is_classified() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/providers"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let client = PromptLabClient::new(server.uri());
        let err = client.list_providers().await.unwrap_err();

        assert!(err.is_server_error());
        assert_eq!(err.to_string(), "API error (status 500): oops");
    }
}
