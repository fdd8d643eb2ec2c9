//! REST-backed catalog source and raw record normalization.

use crate::traits::CatalogSource;
use rigcat_core::{
    Attributes, CatalogError, CatalogItem, CategoryId, ItemId, Result, SpecExtractor,
};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_IMAGE_URL: &str = "/static/img/placeholder-part.png";
pub const DEFAULT_PATH_TEMPLATE: &str = "/categories/{category}/items";

/// Record shape as served by the parts API. Everything but `id` is optional.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRecord {
    pub id: JsonValue,
    #[serde(default, alias = "name")]
    pub display_name: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default, alias = "image")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub prices: Vec<f64>,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default, alias = "specs")]
    pub specification: Option<String>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub in_stock: Option<bool>,
}

/// Coerces a JSON id (number or numeric string) into an item id.
pub fn coerce_id(v: &JsonValue) -> Option<ItemId> {
    match v {
        JsonValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Cheapest listed offer; no usable offers means "contact for price".
pub fn min_price(prices: &[f64]) -> f64 {
    prices
        .iter()
        .copied()
        .filter(|p| p.is_finite() && *p >= 0.0)
        .fold(None, |acc: Option<f64>, p| Some(acc.map_or(p, |a| a.min(p))))
        .unwrap_or(0.0)
}

#[derive(Debug, Clone)]
pub struct Normalizer {
    pub default_image: String,
    pub extractor: SpecExtractor,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self {
            default_image: DEFAULT_IMAGE_URL.to_string(),
            extractor: SpecExtractor::default(),
        }
    }
}

impl Normalizer {
    pub fn new(default_image: impl Into<String>, extractor: SpecExtractor) -> Self {
        Self {
            default_image: default_image.into(),
            extractor,
        }
    }

    /// Turns one raw record into a catalog item. Records without a usable id
    /// are dropped.
    pub fn normalize(&self, category: &str, raw: RawRecord) -> Option<CatalogItem> {
        let id = coerce_id(&raw.id)?;
        let image_url = raw
            .image_url
            .filter(|u| !u.trim().is_empty())
            .unwrap_or_else(|| self.default_image.clone());
        let mut attributes = match raw.specification.as_deref() {
            Some(spec) if !self.extractor.is_empty() => self.extractor.extract(spec),
            _ => Attributes::default(),
        };
        // explicit attributes win over extracted ones
        attributes.0.extend(raw.attributes.0);
        Some(CatalogItem {
            id,
            display_name: raw.display_name.unwrap_or_default(),
            brand: raw.brand.unwrap_or_default(),
            price: min_price(&raw.prices),
            list_price: raw.list_price.filter(|p| p.is_finite() && *p > 0.0),
            attributes,
            tags: raw.features,
            availability: raw.in_stock.unwrap_or(true),
            image_url: Some(image_url),
            category: category.to_string(),
        })
    }

    /// Normalizes a raw response body, skipping records that do not parse.
    pub fn normalize_all(&self, category: &str, records: Vec<JsonValue>) -> Vec<CatalogItem> {
        let total = records.len();
        let mut out = Vec::with_capacity(total);
        for rec in records {
            match serde_json::from_value::<RawRecord>(rec) {
                Ok(raw) => {
                    let raw_id = raw.id.clone();
                    match self.normalize(category, raw) {
                        Some(item) => out.push(item),
                        None => warn!(%category, id = %raw_id, "dropping record with unusable id"),
                    }
                }
                Err(e) => warn!(%category, error = %e, "dropping malformed record"),
            }
        }
        debug!(%category, total, kept = out.len(), "normalized records");
        out
    }
}

/// Pulls the record list out of either a bare array or an `{"items": [...]}`
/// / `{"data": [...]}` envelope.
pub fn records_from_body(body: JsonValue) -> Result<Vec<JsonValue>> {
    match body {
        JsonValue::Array(items) => Ok(items),
        JsonValue::Object(mut map) => {
            for key in ["items", "data"] {
                if let Some(JsonValue::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }
            Err(CatalogError::Source("response has no record list".into()))
        }
        _ => Err(CatalogError::Source("response is not a record list".into())),
    }
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub path_template: String,
    pub categories: Vec<CategoryId>,
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, categories: Vec<CategoryId>) -> Self {
        Self {
            base_url: base_url.into(),
            path_template: DEFAULT_PATH_TEMPLATE.to_string(),
            categories,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn url_for(&self, category: &str) -> String {
        format!(
            "{}{}",
            self.base_url.trim_end_matches('/'),
            self.path_template.replace("{category}", category)
        )
    }
}

pub struct RemoteCatalog {
    client: reqwest::Client,
    config: RemoteConfig,
    default_normalizer: Normalizer,
    normalizers: HashMap<CategoryId, Normalizer>,
}

impl RemoteCatalog {
    pub fn new(config: RemoteConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Internal(e.to_string()))?;
        Ok(Self {
            client,
            config,
            default_normalizer: Normalizer::default(),
            normalizers: HashMap::new(),
        })
    }

    pub fn with_default_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.default_normalizer = normalizer;
        self
    }

    pub fn with_normalizer(mut self, category: &str, normalizer: Normalizer) -> Self {
        self.normalizers.insert(category.to_string(), normalizer);
        self
    }

    fn normalizer(&self, category: &str) -> &Normalizer {
        self.normalizers
            .get(category)
            .unwrap_or(&self.default_normalizer)
    }
}

#[async_trait::async_trait]
impl CatalogSource for RemoteCatalog {
    fn name(&self) -> &'static str {
        "remote"
    }

    fn categories(&self) -> Vec<CategoryId> {
        self.config.categories.clone()
    }

    async fn items_by_category(&self, category: &str) -> Result<Vec<CatalogItem>> {
        let url = self.config.url_for(category);
        debug!(%url, "fetching category");
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::Source(e.to_string()))?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        let body: JsonValue = response
            .error_for_status()
            .map_err(|e| CatalogError::Source(e.to_string()))?
            .json()
            .await
            .map_err(|e| CatalogError::Source(e.to_string()))?;
        let records = records_from_body(body)?;
        Ok(self.normalizer(category).normalize_all(category, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rigcat_core::{AttrValue, ExtractRule};
    use serde_json::json;

    #[test]
    fn coerces_numeric_and_string_ids() {
        assert_eq!(coerce_id(&json!(42)), Some(42));
        assert_eq!(coerce_id(&json!("17")), Some(17));
        assert_eq!(coerce_id(&json!(" 8 ")), Some(8));
        assert_eq!(coerce_id(&json!(3.0)), Some(3));
        assert_eq!(coerce_id(&json!("abc")), None);
        assert_eq!(coerce_id(&json!(-1)), None);
        assert_eq!(coerce_id(&json!(null)), None);
    }

    #[test]
    fn min_price_ignores_negative_offers() {
        assert_eq!(min_price(&[129.0, 99.5, 110.0]), 99.5);
        assert_eq!(min_price(&[-1.0, 20.0]), 20.0);
        assert_eq!(min_price(&[]), 0.0);
    }

    #[test]
    fn normalize_fills_defaults_and_extracts() {
        let extractor = SpecExtractor::new(vec![
            ExtractRule::text("refreshRate", r"(\d{2,3})\s*Hz").with_default("60"),
            ExtractRule::text("panel", r"\b(IPS|VA|TN|OLED)\b").with_default("Unknown"),
        ])
        .unwrap();
        let n = Normalizer::new("/img/none.png", extractor);
        let raw: RawRecord = serde_json::from_value(json!({
            "id": "12",
            "name": "Odyssey G7",
            "brand": "Samsung",
            "image": "  ",
            "prices": [649.99, 599.0],
            "specs": "27 x 1440p VA 240Hz",
            "attributes": {"panel": "QD-VA", "hdr": true}
        }))
        .unwrap();
        let item = n.normalize("monitors", raw).unwrap();
        assert_eq!(item.id, 12);
        assert_eq!(item.price, 599.0);
        assert_eq!(item.image_url.as_deref(), Some("/img/none.png"));
        assert_eq!(item.category, "monitors");
        assert!(item.availability);
        assert_eq!(item.attributes.get("refreshRate"), Some(&AttrValue::from("240")));
        assert_eq!(item.attributes.get("panel"), Some(&AttrValue::from("QD-VA")));
        assert_eq!(item.attributes.get("hdr"), Some(&AttrValue::Flag(true)));
    }

    #[test]
    fn normalize_all_skips_bad_records() {
        let n = Normalizer::default();
        let items = n.normalize_all(
            "psu",
            vec![
                json!({"id": 1, "name": "RM850x", "prices": [139.0]}),
                json!({"id": "n/a", "name": "Broken"}),
                json!({"name": "no id at all"}),
                json!({"id": 2, "name": "Focus GX", "in_stock": false}),
            ],
        );
        assert_eq!(items.iter().map(|i| i.id).collect::<Vec<_>>(), vec![1, 2]);
        assert!(!items[1].availability);
        assert_eq!(items[1].price, 0.0);
        assert_eq!(items[0].image_url.as_deref(), Some(DEFAULT_IMAGE_URL));
    }

    #[test]
    fn body_envelopes() {
        assert_eq!(records_from_body(json!([{"id": 1}])).unwrap().len(), 1);
        assert_eq!(records_from_body(json!({"items": [{"id": 1}, {"id": 2}]})).unwrap().len(), 2);
        assert_eq!(records_from_body(json!({"data": []})).unwrap().len(), 0);
        assert!(records_from_body(json!({"error": "x"})).is_err());
        assert!(records_from_body(json!("nope")).is_err());
    }

    #[test]
    fn url_template() {
        let mut cfg = RemoteConfig::new("https://api.example.test/", vec![]);
        assert_eq!(
            cfg.url_for("keyboards"),
            "https://api.example.test/categories/keyboards/items"
        );
        cfg.path_template = "/api/products?category={category}".into();
        assert_eq!(
            cfg.url_for("ssd"),
            "https://api.example.test/api/products?category=ssd"
        );
    }
}
