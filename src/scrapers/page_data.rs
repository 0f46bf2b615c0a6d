use scraper::{Html, Selector};
use serde_json::Value;
use tracing::warn;

use crate::error::ScoutError;

/// CSS selector for the server-rendered JSON data island.
const DATA_ISLAND_SELECTOR: &str = "script#__NEXT_DATA__";

/// Exact `<title>` of the bot-detection challenge page.
pub const CHALLENGE_PAGE_TITLE: &str = "ShieldSquare Captcha";

/// Fail fast when the fetched document is the bot-detection challenge page
/// instead of a listing. Must run before any extraction attempt.
pub fn ensure_not_blocked(document: &Html) -> Result<(), ScoutError> {
    let selector = Selector::parse("title").expect("valid selector");
    let title = document
        .select(&selector)
        .next()
        .map(|t| t.text().collect::<String>());
    if title.as_deref() == Some(CHALLENGE_PAGE_TITLE) {
        return Err(ScoutError::BotBlocked);
    }
    Ok(())
}

/// Locate the `__NEXT_DATA__` data island and parse its contents as JSON.
pub fn extract_page_data(document: &Html) -> Result<Value, ScoutError> {
    let selector = Selector::parse(DATA_ISLAND_SELECTOR).expect("valid selector");
    let script = document
        .select(&selector)
        .next()
        .ok_or_else(|| ScoutError::Extraction("missing __NEXT_DATA__ data island".to_string()))?;
    let content = script.text().collect::<String>();
    serde_json::from_str(&content).map_err(|e| {
        warn!("failed to parse __NEXT_DATA__ JSON: {e}");
        ScoutError::Extraction(format!("malformed __NEXT_DATA__ JSON: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(title: &str, island: Option<&str>) -> Html {
        let script = island
            .map(|json| format!(r#"<script id="__NEXT_DATA__" type="application/json">{json}</script>"#))
            .unwrap_or_default();
        Html::parse_document(&format!(
            "<html><head><title>{title}</title></head><body>{script}</body></html>"
        ))
    }

    #[test]
    fn extracts_island_json() {
        let document = page("Listing", Some(r#"{"props":{"pageProps":{}}}"#));
        let data = extract_page_data(&document).unwrap();
        assert!(data.pointer("/props/pageProps").is_some());
    }

    #[test]
    fn missing_island_is_extraction_error() {
        let document = page("Listing", None);
        let err = extract_page_data(&document).unwrap_err();
        assert!(matches!(err, ScoutError::Extraction(msg) if msg.contains("missing")));
    }

    #[test]
    fn malformed_island_is_extraction_error() {
        let document = page("Listing", Some("{not json"));
        let err = extract_page_data(&document).unwrap_err();
        assert!(matches!(err, ScoutError::Extraction(msg) if msg.contains("malformed")));
    }

    #[test]
    fn challenge_title_is_bot_blocked() {
        let document = page(CHALLENGE_PAGE_TITLE, Some(r#"{"props":{}}"#));
        let err = ensure_not_blocked(&document).unwrap_err();
        assert!(matches!(err, ScoutError::BotBlocked));
    }

    #[test]
    fn regular_title_passes_bot_check() {
        let document = page("יד2 - רכב", None);
        assert!(ensure_not_blocked(&document).is_ok());
    }
}
