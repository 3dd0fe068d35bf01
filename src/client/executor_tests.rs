//! Tests for the retrying executor.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use http::{Method, StatusCode};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;

use super::Client;
use crate::Error;
use crate::test_fixtures::{MockClient, RecordingSleeper, mock_client, test_config};
use crate::transport::{BackoffPolicy, HttpError, HttpResponse};

async fn send(
    client: &Client<Arc<MockClient>, impl crate::time::Sleeper>,
    method: Method,
) -> Result<Value, Error> {
    let builder = client.new_api_request().method(method).append_path(["data"]);
    client.send(builder, &CancellationToken::new()).await
}

mod success {
    use super::*;

    #[tokio::test]
    async fn decodes_json_body() {
        let (client, http) = mock_client(test_config(), MockClient::ok_json(&json!({"a": 1})));

        let value = send(&client, Method::GET).await.unwrap();

        assert_eq!(value, json!({"a": 1}));
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn invalid_json_is_decode_error() {
        let http = MockClient::new(vec![Ok(HttpResponse::new(
            StatusCode::OK,
            http::HeaderMap::new(),
            b"not json".to_vec(),
        ))]);
        let (client, _) = mock_client(test_config(), http);

        let err = send(&client, Method::GET).await.unwrap_err();

        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn default_headers_are_sent() {
        let config = test_config().with_token("t0k");
        let (client, http) = mock_client(config, MockClient::ok_json(&json!({})));

        send(&client, Method::GET).await.unwrap();

        let request = http.last_request();
        assert_eq!(
            request.headers.get(http::header::AUTHORIZATION).unwrap(),
            "Bearer t0k"
        );
        assert!(
            request
                .headers
                .get(http::header::USER_AGENT)
                .unwrap()
                .to_str()
                .unwrap()
                .starts_with("sanity-client-rust/")
        );
        assert_eq!(request.url.as_str(), "https://p.api.sanity.io/v2021-03-25/data");
    }
}

mod retries {
    use super::*;

    fn retrying_client(
        statuses: &[StatusCode],
    ) -> (Client<Arc<MockClient>, RecordingSleeper>, Arc<MockClient>, RecordingSleeper) {
        let config = test_config().with_backoff(BackoffPolicy::new().with_jitter(false));
        let (client, http) = mock_client(config, MockClient::with_statuses(statuses, &json!({})));
        let sleeper = RecordingSleeper::default();
        (client.with_sleeper(sleeper.clone()), http, sleeper)
    }

    #[tokio::test]
    async fn get_is_retried_on_503() {
        let (client, http, sleeper) = retrying_client(&[
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::OK,
        ]);

        send(&client, Method::GET).await.unwrap();

        assert_eq!(http.calls(), 3);
        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(200)]
        );
    }

    #[tokio::test]
    async fn gateway_timeout_and_request_timeout_are_retried() {
        let (client, http, _) = retrying_client(&[
            StatusCode::GATEWAY_TIMEOUT,
            StatusCode::REQUEST_TIMEOUT,
            StatusCode::OK,
        ]);

        send(&client, Method::GET).await.unwrap();

        assert_eq!(http.calls(), 3);
    }

    #[tokio::test]
    async fn post_is_not_retried() {
        let (client, http, sleeper) = retrying_client(&[StatusCode::SERVICE_UNAVAILABLE]);

        let err = send(&client, Method::POST).await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(http.calls(), 1);
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn terminal_status_is_not_retried() {
        let (client, http, _) = retrying_client(&[StatusCode::NOT_FOUND]);

        let err = send(&client, Method::GET).await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn request_error_carries_body() {
        let (client, _) = mock_client(
            test_config(),
            MockClient::with_statuses(&[StatusCode::BAD_REQUEST], &json!({"error": "bad"})),
        );

        let err = send(&client, Method::GET).await.unwrap_err();
        let request_error = err.as_request_error().unwrap();

        assert_eq!(request_error.method(), &Method::GET);
        assert_eq!(request_error.body(), br#"{"error":"bad"}"#);
    }

    #[tokio::test]
    async fn transport_errors_fail_immediately() {
        let http = MockClient::new(vec![Err(HttpError::Timeout), Ok(HttpResponse::json(
            StatusCode::OK,
            &json!({}),
        ))]);
        let (client, http) = mock_client(test_config(), http);

        let err = send(&client, Method::GET).await.unwrap_err();

        assert!(matches!(
            err,
            Error::Transport {
                source: HttpError::Timeout,
                ..
            }
        ));
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test]
    async fn each_call_starts_a_fresh_backoff() {
        let (client, _, sleeper) = retrying_client(&[
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::OK,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::OK,
        ]);

        send(&client, Method::GET).await.unwrap();
        send(&client, Method::GET).await.unwrap();

        assert_eq!(
            sleeper.delays(),
            vec![Duration::from_millis(100), Duration::from_millis(100)]
        );
    }

    #[tokio::test]
    async fn attempt_cap_returns_last_error() {
        let config = test_config().with_backoff(BackoffPolicy::new().with_max_attempts(2));
        let (client, http) = mock_client(
            config,
            MockClient::with_statuses(
                &[StatusCode::SERVICE_UNAVAILABLE, StatusCode::GATEWAY_TIMEOUT],
                &json!({}),
            ),
        );

        let err = send(&client, Method::GET).await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::GATEWAY_TIMEOUT));
        assert_eq!(http.calls(), 2);
    }

    #[tokio::test]
    async fn retry_callback_sees_each_retried_error() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let config = test_config().on_error_will_retry(move |err| {
            assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let (client, _) = mock_client(
            config,
            MockClient::with_statuses(
                &[
                    StatusCode::SERVICE_UNAVAILABLE,
                    StatusCode::SERVICE_UNAVAILABLE,
                    StatusCode::OK,
                ],
                &json!({}),
            ),
        );

        send(&client, Method::GET).await.unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn cancelled_before_send_makes_no_request() {
        let (client, http) = mock_client(test_config(), MockClient::ok_json(&json!({})));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result: Result<Value, Error> = client.send(client.new_api_request(), &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(http.calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_during_backoff_stops_retrying() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let config = test_config().on_error_will_retry(move |_| trigger.cancel());
        let (client, http) = mock_client(
            config,
            MockClient::with_statuses(
                &[StatusCode::SERVICE_UNAVAILABLE, StatusCode::OK],
                &json!({}),
            ),
        );

        let result: Result<Value, Error> = client.send(client.new_api_request(), &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(http.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_interrupts_real_sleep() {
        let http = Arc::new(MockClient::with_statuses(
            &[StatusCode::SERVICE_UNAVAILABLE, StatusCode::OK],
            &json!({}),
        ));
        let config = test_config().with_backoff(
            BackoffPolicy::new()
                .with_min_delay(Duration::from_secs(60))
                .with_jitter(false),
        );
        let client = Client::with_http_client(config, Arc::clone(&http)).unwrap();
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let result: Result<Value, Error> = client.send(client.new_api_request(), &cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert_eq!(http.calls(), 1);
    }
}
