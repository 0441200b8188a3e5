// src/core/scoring/headers.rs

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::str::FromStr;

use clap::ValueEnum;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};

use super::HEADER_GRADES;
use crate::core::error::CatalogError;
use crate::core::models::{FoundHeader, HeaderScanResult};

/// A header worth `weight` points when the response carries it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityHeaderRule {
    pub name: Cow<'static, str>,
    pub weight: u32,
}

impl SecurityHeaderRule {
    const fn fixed(name: &'static str, weight: u32) -> Self {
        Self { name: Cow::Borrowed(name), weight }
    }
}

/// Parses `Name=weight`, the form used on the command line.
impl FromStr for SecurityHeaderRule {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, weight) = s.split_once('=').ok_or_else(|| CatalogError::Malformed(s.to_string()))?;
        let weight = weight.trim().parse().map_err(|_| CatalogError::Malformed(s.to_string()))?;
        Ok(Self { name: Cow::Owned(name.trim().to_string()), weight })
    }
}

/// Missing headers at or above this weight get a recommendation.
pub const RECOMMENDATION_WEIGHT: u32 = 2;

const EXTENDED_RULES: &[SecurityHeaderRule] = &[
    SecurityHeaderRule::fixed("Content-Security-Policy", 3),
    SecurityHeaderRule::fixed("Strict-Transport-Security", 2),
    SecurityHeaderRule::fixed("X-Frame-Options", 2),
    SecurityHeaderRule::fixed("X-Content-Type-Options", 1),
    SecurityHeaderRule::fixed("X-XSS-Protection", 1),
    SecurityHeaderRule::fixed("Referrer-Policy", 1),
    SecurityHeaderRule::fixed("Permissions-Policy", 1),
];

// Same list without Permissions-Policy.
const CLASSIC_RULES: &[SecurityHeaderRule] = EXTENDED_RULES.split_at(6).0;

/// Built-in catalogs selectable from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString, ValueEnum, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CatalogVariant {
    /// Seven rules, total weight 11.
    #[default]
    Extended,
    /// Six rules without Permissions-Policy, total weight 10.
    Classic,
}

/// Ordered list of rules a header set is scored against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderCatalog {
    rules: Cow<'static, [SecurityHeaderRule]>,
}

impl HeaderCatalog {
    /// The seven-rule catalog, including Permissions-Policy (total weight 11).
    pub fn extended() -> Self {
        Self { rules: Cow::Borrowed(EXTENDED_RULES) }
    }

    /// The six-rule catalog without Permissions-Policy (total weight 10).
    pub fn classic() -> Self {
        Self { rules: Cow::Borrowed(CLASSIC_RULES) }
    }

    pub fn from_variant(variant: CatalogVariant) -> Self {
        match variant {
            CatalogVariant::Extended => Self::extended(),
            CatalogVariant::Classic => Self::classic(),
        }
    }

    /// Builds a catalog from user-supplied rules.
    ///
    /// # Arguments
    ///
    /// * `rules` - The rules in presentation order. Names are matched
    ///   case-insensitively against response headers.
    ///
    /// # Returns
    ///
    /// The catalog, or a `CatalogError` when the list is empty, a name is
    /// blank, or a weight is zero.
    pub fn custom(rules: Vec<SecurityHeaderRule>) -> Result<Self, CatalogError> {
        if rules.is_empty() {
            return Err(CatalogError::Empty);
        }
        for (position, rule) in rules.iter().enumerate() {
            if rule.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(position));
            }
            if rule.weight == 0 {
                return Err(CatalogError::ZeroWeight(rule.name.to_string()));
            }
        }
        Ok(Self { rules: Cow::Owned(rules) })
    }

    /// The rules in the order they are reported.
    pub fn rules(&self) -> &[SecurityHeaderRule] {
        &self.rules
    }

    pub fn weight_of(&self, name: &str) -> Option<u32> {
        self.rules
            .iter()
            .find(|rule| rule.name.eq_ignore_ascii_case(name))
            .map(|rule| rule.weight)
    }

    pub fn total_weight(&self) -> u32 {
        self.rules.iter().map(|rule| rule.weight).sum()
    }
}

impl Default for HeaderCatalog {
    fn default() -> Self {
        Self::extended()
    }
}

/// Case-insensitive view of response headers. The first value of a repeated
/// header wins.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderSet(BTreeMap<String, String>);

impl HeaderSet {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_map(self) -> BTreeMap<String, String> {
        self.0
    }

    fn insert_first(&mut self, name: &str, value: String) {
        self.0.entry(name.to_ascii_lowercase()).or_insert(value);
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for HeaderSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = HeaderSet::default();
        for (name, value) in iter {
            set.insert_first(name.as_ref(), value.into());
        }
        set
    }
}

impl From<&HeaderMap> for HeaderSet {
    fn from(headers: &HeaderMap) -> Self {
        let mut set = HeaderSet::default();
        for (name, value) in headers {
            let value = match value.to_str() {
                Ok(s) => s.to_string(),
                Err(_) => {
                    warn!(header_name = %name, "Header found but contained invalid UTF-8.");
                    "[Invalid UTF-8]".to_string()
                }
            };
            set.insert_first(name.as_str(), value);
        }
        set
    }
}

/// Scores a response's headers against a catalog of weighted rules.
///
/// Every rule whose header is present with a non-blank value adds its weight.
/// Missing or blank headers are listed in `missing`, and those weighing at
/// least [`RECOMMENDATION_WEIGHT`] also get an "Add ... header"
/// recommendation. The grade comes from the fixed header threshold table
/// applied to the raw score, so a catalog adding up to more than the
/// reported maximum can still only reach an A.
///
/// # Arguments
///
/// * `catalog` - The rules to score against, in presentation order.
/// * `headers` - The response headers, looked up case-insensitively.
///
/// # Returns
///
/// A `HeaderScanResult` with the score, grade, found and missing headers
/// and the recommendations. The same input always yields the same result.
pub fn score_headers(catalog: &HeaderCatalog, headers: &HeaderSet) -> HeaderScanResult {
    let mut score = 0;
    let mut found = Vec::new();
    let mut missing = Vec::new();
    let mut recommendations = Vec::new();

    for rule in catalog.rules() {
        // A header sent with an empty value protects nothing.
        match headers.get(&rule.name).filter(|value| !value.trim().is_empty()) {
            Some(value) => {
                debug!(header_name = %rule.name, value, "Header found.");
                score += rule.weight;
                found.push(FoundHeader { name: rule.name.to_string(), value: value.to_string() });
            }
            None => {
                debug!(header_name = %rule.name, "Header not found.");
                missing.push(rule.name.to_string());
                if rule.weight >= RECOMMENDATION_WEIGHT {
                    recommendations.push(format!("Add {} header", rule.name));
                }
            }
        }
    }

    HeaderScanResult {
        score,
        grade: HEADER_GRADES.grade(i32::try_from(score).unwrap_or(i32::MAX)),
        found,
        missing,
        recommendations,
    }
}
