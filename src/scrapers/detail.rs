use reqwest::Client;
use scraper::Html;
use serde_json::Value;
use tracing::warn;

use crate::error::ScoutError;
use crate::scrapers::feed::query_key_contains;
use crate::scrapers::page_data::extract_page_data;

/// Fetch an item's detail page and return its data fragment from the
/// dehydrated query cache.
///
/// Best-effort enrichment: any failure (transport, extraction, missing
/// query) is logged and collapsed to `None` so it can never fail the
/// enclosing topic run.
pub async fn fetch_item_details(client: &Client, base_url: &str, item_id: &str) -> Option<Value> {
    let url = format!("{base_url}/{item_id}");
    match fetch_fragment(client, &url, item_id).await {
        Ok(fragment) => fragment,
        Err(e) => {
            warn!(item_id, "failed to fetch item details: {e}");
            None
        }
    }
}

async fn fetch_fragment(
    client: &Client,
    url: &str,
    item_id: &str,
) -> Result<Option<Value>, ScoutError> {
    let response = client.get(url).send().await?.error_for_status()?;
    let html = response.text().await?;
    detail_fragment(&html, item_id)
}

/// Locate the `queries` entry tagged with both `"item"` and the item id,
/// and return its `state.data`.
fn detail_fragment(html: &str, item_id: &str) -> Result<Option<Value>, ScoutError> {
    let document = Html::parse_document(html);
    let data = extract_page_data(&document)?;
    let fragment = data
        .pointer("/props/pageProps/dehydratedState/queries")
        .and_then(Value::as_array)
        .and_then(|queries| {
            queries
                .iter()
                .find(|q| query_key_contains(q, "item") && query_key_contains(q, item_id))
        })
        .and_then(|q| q.pointer("/state/data"))
        .cloned();
    Ok(fragment)
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn detail_page(item_id: &str, data: Value) -> String {
        let island = json!({
            "props": { "pageProps": { "dehydratedState": { "queries": [
                { "queryKey": ["related", item_id], "state": { "data": { "wrong": true } } },
                { "queryKey": ["item", item_id], "state": { "data": data } }
            ] } } }
        });
        format!(
            r#"<html><head><title>פרטי רכב</title></head><body><script id="__NEXT_DATA__" type="application/json">{island}</script></body></html>"#
        )
    }

    #[test]
    fn fragment_requires_both_item_tag_and_id() {
        let html = detail_page("abc", json!({ "km": 98000 }));
        let fragment = detail_fragment(&html, "abc").unwrap().unwrap();
        assert_eq!(fragment["km"], 98000);
        assert!(detail_fragment(&html, "other").unwrap().is_none());
    }

    #[tokio::test]
    async fn fetches_fragment_from_detail_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(detail_page("abc", json!({ "km": 120500 }))),
            )
            .mount(&server)
            .await;

        let client = Client::new();
        let base = format!("{}/item", server.uri());
        let fragment = fetch_item_details(&client, &base, "abc").await.unwrap();
        assert_eq!(fragment["km"], 120500);
    }

    #[tokio::test]
    async fn server_error_collapses_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/abc"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = Client::new();
        let base = format!("{}/item", server.uri());
        assert!(fetch_item_details(&client, &base, "abc").await.is_none());
    }

    #[tokio::test]
    async fn missing_island_collapses_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/abc"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>no island</body></html>"))
            .mount(&server)
            .await;

        let client = Client::new();
        let base = format!("{}/item", server.uri());
        assert!(fetch_item_details(&client, &base, "abc").await.is_none());
    }
}
