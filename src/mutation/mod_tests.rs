//! Tests for `MutationBuilder` and `PatchBuilder`.

use http::{Method, StatusCode};
use serde::ser::{Serialize, Serializer};
use serde_json::{Value, json};

use crate::Error;
use crate::api::Visibility;
use crate::test_fixtures::{MockClient, mock_client, test_config};

struct FailingValue;

impl Serialize for FailingValue {
    fn serialize<S: Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("cannot encode"))
    }
}

fn ok_response() -> MockClient {
    MockClient::ok_json(&json!({
        "transactionId": "tx1",
        "results": [{"id": "a", "operation": "create", "document": {"_id": "a"}}]
    }))
}

fn mutations(body: Option<Value>) -> Value {
    body.expect("request has a JSON body")["mutations"].clone()
}

mod request_shape {
    use super::*;

    #[tokio::test]
    async fn empty_builder_sends_empty_array() {
        let (client, http) = mock_client(test_config(), ok_response());

        client.mutate().execute().await.unwrap();

        let request = http.last_request();
        assert_eq!(request.method, Method::POST);
        assert_eq!(request.url.path(), "/v2021-03-25/data/mutate/ds");
        assert_eq!(request.body_json(), Some(json!({"mutations": []})));
    }

    #[tokio::test]
    async fn default_options_are_sent_as_params() {
        let (client, http) = mock_client(test_config(), ok_response());

        client.mutate().delete("a").execute().await.unwrap();

        let request = http.last_request();
        assert_eq!(
            request.url.query(),
            Some("returnIds=false&returnDocuments=true&visibility=sync")
        );
    }

    #[tokio::test]
    async fn options_transaction_id_and_tag() {
        let (client, http) = mock_client(test_config().with_tag("default"), ok_response());

        client
            .mutate()
            .return_ids(true)
            .return_documents(false)
            .visibility(Visibility::Deferred)
            .transaction_id("my-tx")
            .tag("import")
            .delete("a")
            .execute()
            .await
            .unwrap();

        assert_eq!(
            http.last_request().url.query(),
            Some(
                "returnIds=true&returnDocuments=false&visibility=deferred&transactionId=my-tx&tag=import"
            )
        );
    }

    #[tokio::test]
    async fn items_keep_call_order() {
        let (client, http) = mock_client(test_config(), ok_response());

        client
            .mutate()
            .create(&json!({"_id": "a", "_type": "t"}))
            .create_if_not_exists(&json!({"_id": "b"}))
            .create_or_replace(&json!({"_id": "c"}))
            .delete("d")
            .patch("e")
            .set("title", "x")
            .end()
            .execute()
            .await
            .unwrap();

        assert_eq!(
            mutations(http.last_request().body_json()),
            json!([
                {"create": {"_id": "a", "_type": "t"}},
                {"createIfNotExists": {"_id": "b"}},
                {"createOrReplace": {"_id": "c"}},
                {"delete": {"id": "d"}},
                {"patch": {"id": "e", "set": {"title": "x"}}},
            ])
        );
    }

    #[tokio::test]
    async fn mutations_are_never_retried() {
        let (client, http) = mock_client(
            test_config(),
            MockClient::with_statuses(&[StatusCode::SERVICE_UNAVAILABLE], &json!({})),
        );

        let err = client.mutate().delete("a").execute().await.unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::SERVICE_UNAVAILABLE));
        assert_eq!(http.calls(), 1);
    }
}

mod patches {
    use super::*;

    #[tokio::test]
    async fn every_patch_operation_is_encoded() {
        let (client, http) = mock_client(test_config(), ok_response());

        client
            .mutate()
            .patch("doc")
            .if_revision_id("rev1")
            .query("*[_type == 'movie']")
            .set("title", "Alien")
            .set_if_missing("year", &1979)
            .diff_match_patch("body", "@@ -1 +1 @@")
            .unset(["old", "older"])
            .inc("views", 1.0)
            .dec("stock", 2.5)
            .insert_after("tags[-1]", ["scifi", "horror"])
            .execute()
            .await
            .unwrap();

        assert_eq!(
            mutations(http.last_request().body_json()),
            json!([{"patch": {
                "id": "doc",
                "ifRevisionID": "rev1",
                "query": "*[_type == 'movie']",
                "set": {"title": "Alien"},
                "setIfMissing": {"year": 1979},
                "diffMatchPatch": {"body": "@@ -1 +1 @@"},
                "unset": ["old", "older"],
                "insert": {"after": "tags[-1]", "items": ["scifi", "horror"]},
                "inc": {"views": 1.0},
                "dec": {"stock": 2.5},
            }}])
        );
    }

    #[tokio::test]
    async fn insert_before_and_replace_use_their_anchor() {
        let (client, http) = mock_client(test_config(), ok_response());

        client
            .mutate()
            .patch("a")
            .insert_before("list[0]", [1])
            .end()
            .patch("b")
            .insert_replace("list[1:2]", [json!({"k": 1})])
            .execute()
            .await
            .unwrap();

        let items = mutations(http.last_request().body_json());
        assert_eq!(
            items[0]["patch"]["insert"],
            json!({"before": "list[0]", "items": [1]})
        );
        assert_eq!(
            items[1]["patch"]["insert"],
            json!({"replace": "list[1:2]", "items": [{"k": 1}]})
        );
    }

    #[test]
    fn end_returns_parent_with_patch_added() {
        let (client, _) = mock_client(test_config(), MockClient::default());

        let builder = client.mutate().delete("x").patch("y").inc("n", 1.0).end();

        assert_eq!(builder.len(), 2);
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn first_marshal_failure_is_reported_on_execute() {
        let (client, http) = mock_client(test_config(), ok_response());

        let err = client
            .mutate()
            .create(&FailingValue)
            .delete("still-chainable")
            .patch("p")
            .set("a", &FailingValue)
            .end()
            .execute()
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Marshal { .. }));
        assert_eq!(
            err.to_string(),
            "mutation builder: marshaling document: cannot encode"
        );
        assert_eq!(http.calls(), 0);
    }

    #[test]
    fn failed_documents_are_not_added() {
        let (client, _) = mock_client(test_config(), MockClient::default());

        let builder = client.mutate().create(&FailingValue).delete("a");

        assert_eq!(builder.len(), 1);
    }

    #[tokio::test]
    async fn failing_insert_item_drops_the_insert() {
        let (client, http) = mock_client(test_config(), ok_response());

        let result = client
            .mutate()
            .patch("a")
            .insert_after("list[-1]", [FailingValue])
            .execute()
            .await;

        assert!(matches!(result, Err(Error::Marshal { .. })));
        assert_eq!(http.calls(), 0);
    }
}

mod results {
    use super::*;

    #[tokio::test]
    async fn transaction_id_and_documents_are_returned() {
        let (client, _) = mock_client(test_config(), ok_response());

        let result = client
            .mutate()
            .create(&json!({"_id": "a"}))
            .execute()
            .await
            .unwrap();

        assert_eq!(result.transaction_id, "tx1");
        assert_eq!(result.results.len(), 1);
        assert_eq!(result.results[0].id.as_deref(), Some("a"));
        assert_eq!(
            result.results[0].document::<Value>().unwrap(),
            Some(json!({"_id": "a"}))
        );
    }
}
