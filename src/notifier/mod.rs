use std::time::Duration;

use reqwest::Client;
use serde_json::{json, Value};
use tracing::warn;

use crate::error::ScoutError;
use crate::models::Item;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Placeholder for any display field the listing did not carry.
const UNSPECIFIED: &str = "לא צוין";

/// Telegram bot API client for item and lifecycle notifications.
///
/// Each call is a single network call; the only retry anywhere is the
/// photo→text fallback inside [`TelegramNotifier::notify_item`].
pub struct TelegramNotifier {
    client: Client,
    base_url: String,
    api_token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, ScoutError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self::with_base_url(client, api_token, chat_id, TELEGRAM_API_BASE))
    }

    /// Construct against a different API base URL. Used by tests to target
    /// a mock server.
    pub fn with_base_url(
        client: Client,
        api_token: impl Into<String>,
        chat_id: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_token: api_token.into(),
            chat_id: chat_id.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.api_token, method)
    }

    async fn call(&self, method: &str, body: Value) -> Result<(), ScoutError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            // Telegram error bodies carry a human-readable `description`.
            let description = response
                .json::<Value>()
                .await
                .ok()
                .and_then(|v| {
                    v.get("description")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            return Err(ScoutError::Delivery {
                status: status.as_u16(),
                description,
            });
        }
        Ok(())
    }

    pub async fn send_text(&self, text: &str, parse_mode: Option<&str>) -> Result<(), ScoutError> {
        let mut body = json!({ "chat_id": self.chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        self.call("sendMessage", body).await
    }

    pub async fn send_photo(&self, photo_url: &str, caption: &str) -> Result<(), ScoutError> {
        self.call(
            "sendPhoto",
            json!({
                "chat_id": self.chat_id,
                "photo": photo_url,
                "caption": caption,
                "parse_mode": "Markdown",
            }),
        )
        .await
    }

    /// Send one item notification: photo with caption when an image URL is
    /// present, falling back to text-only with the identical caption on any
    /// delivery failure. Without an image the caption goes out as text
    /// directly.
    pub async fn notify_item(&self, item: &Item) -> Result<(), ScoutError> {
        let caption = render_caption(item);
        match &item.img_url {
            Some(photo_url) => {
                if let Err(e) = self.send_photo(photo_url, &caption).await {
                    warn!("Failed to send photo, sending text instead: {e}");
                    self.send_text(&caption, Some("Markdown")).await
                } else {
                    Ok(())
                }
            }
            None => self.send_text(&caption, Some("Markdown")).await,
        }
    }

    /// Plain-text lifecycle message (run started, item count, run failure).
    pub async fn notify_status(&self, text: &str) -> Result<(), ScoutError> {
        self.send_text(text, None).await
    }
}

/// Render the Hebrew-labeled Markdown caption for one item.
pub fn render_caption(item: &Item) -> String {
    let merchant_text = if item.merchant {
        format!(
            "🏢 סוחר ({})",
            item.agency_name.as_deref().unwrap_or(UNSPECIFIED)
        )
    } else {
        "👤 פרטי".to_string()
    };
    let price_text = item
        .price
        .map(|p| format!("₪{}", group_thousands(p)))
        .unwrap_or_else(|| UNSPECIFIED.to_string());
    let year_text = item
        .year
        .map(|y| y.to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string());
    let km_text = item
        .km
        .map(group_thousands)
        .unwrap_or_else(|| UNSPECIFIED.to_string());

    format!(
        "\n🚗 **{model} {sub_model}**\n\n\
        📍 **מיקום:** {location}\n\
        💰 **מחיר:** {price_text}\n\
        📅 **שנה:** {year_text}\n\
        ✋ **יד:** {hand}\n\
        📟 **קילומטר:** {km_text}\n\
        {merchant_text}\n\n\
        [לצפייה במודעה]({link})\n",
        model = item.model.as_deref().unwrap_or(""),
        sub_model = item.sub_model.as_deref().unwrap_or(""),
        location = item
            .city
            .as_deref()
            .or(item.area.as_deref())
            .unwrap_or(UNSPECIFIED),
        hand = item.hand.as_deref().unwrap_or(UNSPECIFIED),
        link = item.link,
    )
}

/// Thousands-grouped decimal rendering, `150000` → `"150,000"`.
fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if n < 0 {
        format!("-{grouped}")
    } else {
        grouped
    }
}
