// src/ingest/types.rs
use serde::Deserialize;

/// One stored alert row. `created` is the batch id of the run that first
/// inserted it and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Alert {
    pub alert_id: String,
    pub title: String,
    pub event: String,
    pub details: Option<String>,
    pub expires: Option<String>,
    pub expires_utc_ts: i64,
    pub url: String,
    pub api_url: String,
    pub fips_codes: Option<String>,
    pub ugc_codes: Option<String>,
    pub created: i64,
}

impl Alert {
    pub fn ugc_list(&self) -> Vec<String> {
        split_codes(self.ugc_codes.as_deref())
    }

    pub fn fips_list(&self) -> Vec<String> {
        split_codes(self.fips_codes.as_deref())
    }
}

/// A normalized feed entry, ready for an idempotent insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub alert_id: String,
    pub title: String,
    pub event: String,
    pub details: Option<String>,
    pub expires: Option<String>,
    pub expires_utc_ts: i64,
    pub url: String,
    pub api_url: String,
    pub fips_codes: Vec<String>,
    pub ugc_codes: Vec<String>,
}

/// Descriptive fields pulled from an alert's detail endpoint. Every field
/// defaults to empty when the upstream response omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AlertDetail {
    pub headline: String,
    pub event: String,
    pub issuer: String,
    pub description: String,
    pub instructions: String,
    pub area: String,
}

/// Counts reported by one pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub matched: usize,
    pub notified: usize,
}

// --- Feed document (GeoJSON) ---

#[derive(Debug, Default, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: FeatureProperties,
}

#[derive(Debug, Default, Deserialize)]
pub struct FeatureProperties {
    #[serde(default)]
    pub id: String,
    pub headline: Option<String>,
    pub event: Option<String>,
    pub description: Option<String>,
    pub expires: Option<String>,
    #[serde(default)]
    pub uri: String,
    #[serde(rename = "@id", default)]
    pub api_url: String,
    #[serde(default)]
    pub geocode: Geocode,
}

/// Geographic code groups for one feed entry. The upstream feed sends each
/// group as either a single string or an array of strings.
#[derive(Debug, Default, Deserialize)]
pub struct Geocode {
    #[serde(rename = "FIPS6", default, deserialize_with = "string_or_seq")]
    pub fips: Vec<String>,
    #[serde(rename = "UGC", default, deserialize_with = "string_or_seq")]
    pub ugc: Vec<String>,
}

fn string_or_seq<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(v) => v,
    })
}

// Codes persist comma-joined; empty lists persist as NULL.

pub(crate) fn join_codes(codes: &[String]) -> Option<String> {
    if codes.is_empty() {
        None
    } else {
        Some(codes.join(","))
    }
}

pub(crate) fn split_codes(joined: Option<&str>) -> Vec<String> {
    joined
        .map(|s| {
            s.split(',')
                .filter(|part| !part.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
