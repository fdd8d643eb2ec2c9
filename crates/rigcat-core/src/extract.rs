//! Best-effort attribute extraction from free-text spec strings.
//!
//! Remote records often carry a single description such as
//! `"27 x 1440p IPS 165Hz"` instead of typed attributes. Rules pull values out
//! of that text; a rule that does not match stores its default (or nothing).
//! Extraction never fails and its output is never trusted more than explicit
//! attributes.

use crate::errors::{CatalogError, Result};
use crate::model::{AttrValue, Attributes};
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    #[default]
    Text,
    Flag,
}

/// Serializable form of a rule; compiled by [`SpecExtractor::new`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractRule {
    pub attribute: String,
    pub pattern: String,
    #[serde(default)]
    pub kind: RuleKind,
    // capture group for text rules
    #[serde(default = "default_group")]
    pub group: usize,
    #[serde(default)]
    pub default: Option<AttrValue>,
    #[serde(default)]
    pub case_insensitive: bool,
}

fn default_group() -> usize {
    1
}

impl ExtractRule {
    pub fn text(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            pattern: pattern.into(),
            kind: RuleKind::Text,
            group: 1,
            default: None,
            case_insensitive: false,
        }
    }

    pub fn flag(attribute: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self {
            kind: RuleKind::Flag,
            ..Self::text(attribute, pattern)
        }
    }

    pub fn with_default(mut self, default: impl Into<AttrValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn ignore_case(mut self) -> Self {
        self.case_insensitive = true;
        self
    }
}

#[derive(Debug, Clone)]
struct Compiled {
    rule: ExtractRule,
    re: Regex,
}

#[derive(Debug, Clone, Default)]
pub struct SpecExtractor {
    rules: Vec<Compiled>,
}

impl SpecExtractor {
    pub fn new(rules: Vec<ExtractRule>) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let re = RegexBuilder::new(&rule.pattern)
                .case_insensitive(rule.case_insensitive)
                .build()
                .map_err(|e| {
                    CatalogError::Invalid(format!("rule for {}: {}", rule.attribute, e))
                })?;
            compiled.push(Compiled { rule, re });
        }
        Ok(Self { rules: compiled })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn extract(&self, text: &str) -> Attributes {
        let mut out = Attributes::default();
        for c in &self.rules {
            if let Some(v) = c.apply(text) {
                out.0.insert(c.rule.attribute.clone(), v);
            }
        }
        out
    }
}

impl Compiled {
    fn apply(&self, text: &str) -> Option<AttrValue> {
        match self.rule.kind {
            RuleKind::Flag => {
                if self.re.is_match(text) {
                    Some(AttrValue::Flag(true))
                } else {
                    Some(self.rule.default.clone().unwrap_or(AttrValue::Flag(false)))
                }
            }
            RuleKind::Text => {
                // whole match only when the pattern has no such group; a group
                // that exists but did not participate yields the default
                let group = if self.rule.group < self.re.captures_len() {
                    self.rule.group
                } else {
                    0
                };
                let found = self
                    .re
                    .captures(text)
                    .and_then(|caps| caps.get(group).map(|m| m.as_str().trim().to_string()));
                match found {
                    Some(s) if !s.is_empty() => Some(AttrValue::Text(s)),
                    _ => self.rule.default.clone(),
                }
            }
        }
    }
}
