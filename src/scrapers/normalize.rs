use chrono::Utc;
use serde_json::Value;

use crate::models::Item;

/// Base URL for an individual listing page.
pub const ITEM_PAGE_BASE: &str = "https://www.yad2.co.il/item";

/// Map a raw feed record into a canonical [`Item`].
///
/// Total over any record shape: every optional field resolves to `None`
/// when its source paths are absent. Field precedence is
/// first-available-wins, matching what the site serves per category.
///
/// The link always interpolates `token`, even when `id` fell back to the
/// raw `id` field; a record with no token produces a bare item URL.
pub fn normalize(raw: &Value) -> Item {
    let token = raw.get("token").and_then(Value::as_str);
    let id = token
        .map(str::to_string)
        .or_else(|| raw.get("id").and_then(string_or_number))
        .unwrap_or_default();
    let agency_name = raw
        .pointer("/customer/agencyName")
        .and_then(Value::as_str)
        .map(str::to_string);

    Item {
        id,
        link: format!("{ITEM_PAGE_BASE}/{}", token.unwrap_or_default()),
        img_url: raw
            .pointer("/metaData/coverImage")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                raw.pointer("/images/0")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }),
        price: raw.get("price").and_then(Value::as_i64),
        year: raw
            .pointer("/vehicleDates/yearOfProduction")
            .and_then(Value::as_i64)
            .or_else(|| raw.get("year").and_then(Value::as_i64)),
        hand: raw
            .pointer("/hand/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                raw.get("hand")
                    .and_then(Value::as_str)
                    .map(str::to_string)
            }),
        km: raw.get("km").and_then(Value::as_i64),
        merchant: raw.get("merchant").map(is_truthy).unwrap_or(false) || agency_name.is_some(),
        agency_name,
        model: raw
            .pointer("/model/text")
            .and_then(Value::as_str)
            .map(str::to_string),
        sub_model: raw
            .pointer("/subModel/text")
            .and_then(Value::as_str)
            .map(str::to_string),
        city: raw
            .pointer("/address/city/text")
            .and_then(Value::as_str)
            .map(str::to_string),
        area: raw
            .pointer("/address/area/text")
            .and_then(Value::as_str)
            .map(str::to_string),
        scraped_at: Utc::now(),
    }
}

fn string_or_number(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64() != Some(0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
