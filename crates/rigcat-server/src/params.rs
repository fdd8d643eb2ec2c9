//! Query-string form of a constraint set.
//!
//! `q=son&min=50&max=500&f.brand=Sony,Bose&b.wireless=true`
//!
//! `f.<facet>` may repeat and its values accumulate. A value holding a comma
//! is written in double quotes: `f.size="27, curved"`. For every other key the
//! last occurrence wins.

use rigcat_core::{CatalogError, ConstraintSet, PriceRange, Result, TriState};

const SELECTION_PREFIX: &str = "f.";
const FLAG_PREFIX: &str = "b.";

fn parse_price(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite())
        .ok_or_else(|| CatalogError::Invalid(format!("{} must be a number", key)))
}

fn parse_flag(facet: &str, raw: &str) -> Result<TriState> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(TriState::Yes),
        "false" | "no" | "0" => Ok(TriState::No),
        "" | "any" => Ok(TriState::Unset),
        other => Err(CatalogError::Invalid(format!(
            "flag {} has unrecognized value {}",
            facet, other
        ))),
    }
}

fn split_values(raw: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    for ch in raw.chars() {
        match ch {
            '"' => quoted = !quoted,
            ',' if !quoted => out.push(std::mem::take(&mut cur)),
            _ => cur.push(ch),
        }
    }
    out.push(cur);
    out.into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

fn last<'p>(params: &'p [(String, String)], key: &str) -> Option<&'p str> {
    params
        .iter()
        .rev()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn constraints_from_params(params: &[(String, String)]) -> Result<ConstraintSet> {
    let mut c = ConstraintSet::new();
    let min = last(params, "min").map(|v| parse_price("min", v)).transpose()?;
    let max = last(params, "max").map(|v| parse_price("max", v)).transpose()?;
    if min.is_some() || max.is_some() {
        c.price_range = Some(PriceRange::new(
            min.unwrap_or(0.0),
            max.unwrap_or(f64::MAX),
        ));
    }
    if let Some(q) = last(params, "q") {
        c.query = q.to_string();
    }
    for (key, value) in params {
        if let Some(facet) = key.strip_prefix(SELECTION_PREFIX) {
            let values = split_values(value);
            if !values.is_empty() {
                c.selections
                    .entry(facet.to_string())
                    .or_default()
                    .extend(values);
            }
        } else if let Some(facet) = key.strip_prefix(FLAG_PREFIX) {
            let t = parse_flag(facet, value)?;
            if t.is_unset() {
                c.booleans.remove(facet);
            } else {
                c.booleans.insert(facet.to_string(), t);
            }
        }
    }
    Ok(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn full_query_string() {
        let c = constraints_from_params(&params(&[
            ("q", "son"),
            ("min", "50"),
            ("max", "500"),
            ("f.brand", "Sony, Bose"),
            ("b.wireless", "true"),
            ("b.anc", "any"),
        ]))
        .unwrap();
        assert_eq!(c.query, "son");
        assert_eq!(c.price_range, Some(PriceRange::new(50.0, 500.0)));
        assert_eq!(c.selection("brand").unwrap().len(), 2);
        assert_eq!(c.flag("wireless"), TriState::Yes);
        assert!(!c.booleans.contains_key("anc"));
    }

    #[test]
    fn ceiling_only_defaults_floor() {
        let c = constraints_from_params(&params(&[("max", "120")])).unwrap();
        assert_eq!(c.price_range, Some(PriceRange::new(0.0, 120.0)));
    }

    #[test]
    fn bad_values_are_invalid() {
        assert!(constraints_from_params(&params(&[("min", "cheap")])).is_err());
        assert!(constraints_from_params(&params(&[("max", "NaN")])).is_err());
        assert!(constraints_from_params(&params(&[("b.wireless", "maybe")])).is_err());
    }

    #[test]
    fn repeated_selection_keys_accumulate() {
        let c = constraints_from_params(&params(&[
            ("f.brand", "Sony"),
            ("f.brand", "Bose"),
            ("max", "900"),
            ("max", "300"),
        ]))
        .unwrap();
        let brands: Vec<&str> = c.selection("brand").unwrap().iter().map(|s| s.as_str()).collect();
        assert_eq!(brands, vec!["Bose", "Sony"]);
        assert_eq!(c.price_range, Some(PriceRange::new(0.0, 300.0)));
    }

    #[test]
    fn quoted_values_keep_commas() {
        let c = constraints_from_params(&params(&[("f.size", r#""27, curved",32"#)])).unwrap();
        let sizes: Vec<&str> = c.selection("size").unwrap().iter().map(|s| s.as_str()).collect();
        assert_eq!(sizes, vec!["27, curved", "32"]);
    }

    #[test]
    fn empty_selection_list_is_ignored() {
        let c = constraints_from_params(&params(&[("f.brand", " , ")])).unwrap();
        assert!(c.is_unconstrained());
    }
}
