use serde_json::Value;

use crate::error::ScoutError;

/// The two payload shapes the listing site has served over time, resolved
/// by which key is present under `props.pageProps`.
#[derive(Debug)]
pub enum FeedSchema<'a> {
    /// Current shape: react-query dehydrated state with a tagged query list.
    Dehydrated(&'a Value),
    /// Legacy shape: a plain `search.results.feed.data` list.
    Legacy(&'a Value),
    /// Neither key present; the feed is explicitly empty.
    None,
}

pub fn resolve_schema(root: &Value) -> FeedSchema<'_> {
    let Some(page_props) = root.pointer("/props/pageProps") else {
        return FeedSchema::None;
    };
    if let Some(state) = page_props.get("dehydratedState") {
        FeedSchema::Dehydrated(state)
    } else if let Some(search) = page_props.get("search") {
        FeedSchema::Legacy(search)
    } else {
        FeedSchema::None
    }
}

/// Flatten the parsed data island into raw feed records, dropping
/// promotional entries.
///
/// Absent nodes resolve to an empty feed; nodes that are present but have
/// the wrong shape are a [`ScoutError::Parse`], never a silent zero-item
/// result.
pub fn parse_listing(root: &Value) -> Result<Vec<Value>, ScoutError> {
    let records = match resolve_schema(root) {
        FeedSchema::Dehydrated(state) => dehydrated_feed(state)?,
        FeedSchema::Legacy(search) => legacy_feed(search)?,
        FeedSchema::None => Vec::new(),
    };
    Ok(records
        .into_iter()
        .filter(|r| r.get("type").and_then(Value::as_str) != Some("ad"))
        .collect())
}

/// First query tagged `"feed"`, its `state.data.commercial` list followed
/// by its `state.data.private` list, each in original order.
fn dehydrated_feed(state: &Value) -> Result<Vec<Value>, ScoutError> {
    let queries = match state.get("queries") {
        None => return Ok(Vec::new()),
        Some(q) => q
            .as_array()
            .ok_or_else(|| ScoutError::Parse("dehydratedState.queries is not an array".to_string()))?,
    };
    let Some(data) = queries
        .iter()
        .find(|q| query_key_contains(q, "feed"))
        .and_then(|q| q.pointer("/state/data"))
    else {
        return Ok(Vec::new());
    };
    let mut records = sub_list(data, "commercial")?;
    records.extend(sub_list(data, "private")?);
    Ok(records)
}

fn sub_list(data: &Value, key: &str) -> Result<Vec<Value>, ScoutError> {
    match data.get(key) {
        None => Ok(Vec::new()),
        Some(v) => v
            .as_array()
            .map(|a| a.to_vec())
            .ok_or_else(|| ScoutError::Parse(format!("feed {key} list is not an array"))),
    }
}

fn legacy_feed(search: &Value) -> Result<Vec<Value>, ScoutError> {
    match search.pointer("/results/feed/data") {
        None => Ok(Vec::new()),
        Some(v) => v
            .as_array()
            .map(|a| a.to_vec())
            .ok_or_else(|| ScoutError::Parse("search.results.feed.data is not an array".to_string())),
    }
}

/// True when the query's `queryKey` is an array containing the literal
/// string `tag`.
pub(crate) fn query_key_contains(query: &Value, tag: &str) -> bool {
    query
        .get("queryKey")
        .and_then(Value::as_array)
        .is_some_and(|key| key.iter().any(|v| v.as_str() == Some(tag)))
}
