use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub type ItemId = u64;
pub type CategoryId = String;

/// Value of a single facet on an item.
///
/// Serialized untagged so raw records can carry `"wireless": true` and
/// `"driverSize": "40mm"` side by side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Flag(bool),
    Text(String),
}

impl AttrValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AttrValue::Text(s) => Some(s),
            AttrValue::Flag(_) => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            AttrValue::Flag(b) => Some(*b),
            AttrValue::Text(_) => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Flag(b) => write!(f, "{}", b),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Flag(b)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Attributes(pub BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn get(&self, facet: &str) -> Option<&AttrValue> {
        self.0.get(facet)
    }

    pub fn insert(&mut self, facet: impl Into<String>, value: impl Into<AttrValue>) {
        self.0.insert(facet.into(), value.into());
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub display_name: String,
    #[serde(default)]
    pub brand: String,
    // 0 means "contact for price"
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub list_price: Option<f64>,
    #[serde(default)]
    pub attributes: Attributes,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_availability")]
    pub availability: bool,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: CategoryId,
}

fn default_availability() -> bool {
    true
}

impl CatalogItem {
    pub fn new(id: ItemId, display_name: impl Into<String>, brand: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            brand: brand.into(),
            price: 0.0,
            list_price: None,
            attributes: Attributes::default(),
            tags: Vec::new(),
            availability: true,
            image_url: None,
            category: String::new(),
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_list_price(mut self, list_price: f64) -> Self {
        self.list_price = Some(list_price);
        self
    }

    pub fn with_attr(mut self, facet: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.attributes.insert(facet, value);
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Text value of a discrete facet. `brand` and `displayName` resolve to
    /// the typed fields; every other facet reads `attributes`.
    pub fn facet_value(&self, facet: &str) -> Option<&str> {
        let typed = match facet {
            "brand" => Some(self.brand.as_str()),
            "displayName" | "display_name" => Some(self.display_name.as_str()),
            _ => None,
        };
        match typed {
            Some(v) if !v.is_empty() => Some(v),
            _ => self.attributes.get(facet).and_then(AttrValue::as_text),
        }
    }

    pub fn has_price(&self) -> bool {
        self.price > 0.0
    }

    /// Percentage off the list price, if the item is actually discounted.
    pub fn discount_pct(&self) -> Option<f64> {
        let list = self.list_price?;
        if !self.has_price() || list <= self.price {
            return None;
        }
        Some((list - self.price) / list * 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attr_value_untagged_roundtrip_shapes() {
        let attrs: Attributes =
            serde_json::from_str(r#"{"wireless": true, "driverSize": "40mm"}"#).unwrap();
        assert_eq!(attrs.get("wireless"), Some(&AttrValue::Flag(true)));
        assert_eq!(attrs.get("driverSize").and_then(|v| v.as_text()), Some("40mm"));
    }

    #[test]
    fn missing_fields_take_defaults() {
        let item: CatalogItem =
            serde_json::from_str(r#"{"id": 7, "display_name": "WH-1000XM5"}"#).unwrap();
        assert_eq!(item.price, 0.0);
        assert!(item.availability);
        assert!(item.attributes.0.is_empty());
        assert!(!item.has_price());
    }

    #[test]
    fn facet_value_prefers_typed_fields() {
        let item = CatalogItem::new(1, "WH-1000XM5", "Sony").with_attr("driverSize", "30mm");
        assert_eq!(item.facet_value("brand"), Some("Sony"));
        assert_eq!(item.facet_value("displayName"), Some("WH-1000XM5"));
        assert_eq!(item.facet_value("driverSize"), Some("30mm"));
        assert_eq!(item.facet_value("color"), None);
        let unbranded = CatalogItem::new(2, "Generic", "").with_attr("brand", "Acme");
        assert_eq!(unbranded.facet_value("brand"), Some("Acme"));
        assert_eq!(CatalogItem::new(3, "Generic", "").facet_value("brand"), None);
    }

    #[test]
    fn discount_only_when_below_list() {
        let on_sale = CatalogItem::new(1, "A", "B").with_price(80.0).with_list_price(100.0);
        assert_eq!(on_sale.discount_pct(), Some(20.0));
        let full = CatalogItem::new(2, "A", "B").with_price(100.0).with_list_price(100.0);
        assert_eq!(full.discount_pct(), None);
        let contact = CatalogItem::new(3, "A", "B").with_list_price(100.0);
        assert_eq!(contact.discount_pct(), None);
    }
}
