//! Tests for `ClientConfig` and client construction.

use std::sync::Arc;

use http::header::{ACCEPT, AUTHORIZATION, HeaderName, HeaderValue};
use serde_json::json;
use url::Url;

use super::{ApiVersion, Client, ClientConfig};
use crate::Error;
use crate::test_fixtures::{MockClient, mock_client, test_config};

mod validation {
    use super::*;

    #[test]
    fn empty_project_id_is_rejected() {
        let err = ClientConfig::new("", "ds").validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: project ID cannot be empty");
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let err = ClientConfig::new("p", "").validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid request: dataset must be set");
    }

    #[test]
    fn client_construction_validates() {
        let result = Client::with_http_client(ClientConfig::new("", "ds"), MockClient::default());
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn token_with_newline_is_rejected() {
        let config = test_config().with_token("bad\ntoken");
        assert!(matches!(config.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn project_id_that_breaks_host_is_rejected() {
        let config = ClientConfig::new("bad host", "ds");
        assert!(config.validate().is_err());
    }
}

mod urls {
    use super::*;

    #[test]
    fn api_url_uses_project_subdomain_and_version() {
        let config = test_config().with_api_version(ApiVersion::v1());

        assert_eq!(config.api_url().unwrap().as_str(), "https://p.api.sanity.io/v1");
    }

    #[test]
    fn query_url_uses_cdn_only_when_enabled() {
        let config = test_config();
        assert_eq!(
            config.query_url().unwrap().host_str(),
            Some("p.api.sanity.io")
        );

        let config = config.with_cdn(true);
        assert_eq!(
            config.query_url().unwrap().host_str(),
            Some("p.apicdn.sanity.io")
        );
        assert_eq!(config.api_url().unwrap().host_str(), Some("p.api.sanity.io"));
    }

    #[test]
    fn custom_host_replaces_both_hosts() {
        let config = test_config()
            .with_cdn(true)
            .with_api_host(Url::parse("http://localhost:3030/ignored?x=1").unwrap());

        assert_eq!(
            config.api_url().unwrap().as_str(),
            "http://localhost:3030/v2021-03-25"
        );
        assert_eq!(config.query_url().unwrap(), config.api_url().unwrap());
    }
}

mod headers {
    use super::*;

    #[test]
    fn authorization_is_bearer_and_sensitive() {
        let value = test_config().with_token("abc").authorization().unwrap().unwrap();

        assert_eq!(value, "Bearer abc");
        assert!(value.is_sensitive());
    }

    #[test]
    fn empty_token_sends_no_authorization() {
        assert!(test_config().with_token("").authorization().unwrap().is_none());
        assert!(test_config().authorization().unwrap().is_none());
    }

    #[tokio::test]
    async fn custom_headers_are_added_to_every_request() {
        let config = test_config()
            .with_header(
                HeaderName::from_static("x-custom"),
                HeaderValue::from_static("1"),
            )
            .with_header(ACCEPT, HeaderValue::from_static("text/plain"));
        let (client, http) = mock_client(config, MockClient::ok_json(&json!({"documents": []})));

        client.get_documents(["a"]).execute().await.unwrap();

        let request = http.last_request();
        assert_eq!(request.headers.get("x-custom").unwrap(), "1");
        assert_eq!(request.headers.get_all(ACCEPT).iter().count(), 2);
        assert!(!request.headers.contains_key(AUTHORIZATION));
    }
}

mod reconfigure {
    use super::*;

    #[test]
    fn derived_client_does_not_affect_original() {
        let (client, _) = mock_client(test_config(), MockClient::default());

        let derived = client
            .reconfigure(|config| {
                config.dataset = "staging".to_string();
                config.use_cdn = true;
            })
            .unwrap();

        assert_eq!(client.dataset(), "ds");
        assert!(!client.config().use_cdn);
        assert_eq!(derived.dataset(), "staging");
        assert_eq!(derived.query_url().host_str(), Some("p.apicdn.sanity.io"));
    }

    #[test]
    fn invalid_changes_are_rejected() {
        let (client, _) = mock_client(test_config(), MockClient::default());

        let result = client.reconfigure(|config| config.project_id.clear());

        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[test]
    fn clones_share_configuration() {
        let http = Arc::new(MockClient::default());
        let client = Client::with_http_client(test_config(), http).unwrap();
        let clone = client.clone();

        assert_eq!(clone.api_url(), client.api_url());
    }
}
