// src/ingest/normalize.rs
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha224};
use std::fmt::Write as _;

use crate::ingest::types::{Feature, FeatureProperties, NewAlert};

/// Title of last resort; the title column is NOT NULL.
pub const PLACEHOLDER_TITLE: &str = "NO TITLE";

/// Events whose descriptions get scanned for sub-event keywords. Generic
/// statements carry no useful event name on their own.
const SUB_EVENT_SOURCES: [&str; 2] = ["Severe Weather Statement", "Special Weather Statement"];

/// Fixed keyword vocabulary; hits are reported in this order.
const SUB_EVENT_VOCAB: [&str; 7] = [
    "Thunderstorm",
    "Strong Storm",
    "Wind",
    "Rain",
    "Hail",
    "Tornado",
    "Flood",
];

/// Stable identity for an upstream alert: hex SHA-224 of the upstream id
/// string. Re-fetching the same upstream record always yields the same
/// digest, which is what makes the store's insert idempotent.
pub fn alert_identity(upstream_id: &str) -> String {
    let mut hasher = Sha224::new();
    hasher.update(upstream_id.as_bytes());
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(&mut out, "{:02x}", b);
    }
    out
}

/// Convert one raw feed entry into a normalized alert.
pub fn normalize(feature: Feature) -> NewAlert {
    let props = feature.properties;

    let alert_id = alert_identity(&props.id);
    let title = title_for(&props);
    let event = props.event.clone().unwrap_or_default();
    let details = props
        .description
        .as_deref()
        .and_then(|d| sub_events(&event, d));
    let (expires, expires_utc_ts) = parse_expiry(props.expires.as_deref());

    NewAlert {
        alert_id,
        title,
        event,
        details,
        expires,
        expires_utc_ts,
        url: props.uri,
        api_url: props.api_url,
        fips_codes: props.geocode.fips,
        ugc_codes: props.geocode.ugc,
    }
}

/// Fallback chain: headline, event name, upstream id, fixed placeholder.
fn title_for(props: &FeatureProperties) -> String {
    for candidate in [props.headline.as_deref(), props.event.as_deref()] {
        if let Some(t) = candidate {
            if !t.is_empty() {
                return t.to_string();
            }
        }
    }
    if !props.id.is_empty() {
        return props.id.clone();
    }
    PLACEHOLDER_TITLE.to_string()
}

/// Scan a statement description for known weather phenomena. Cosmetic
/// context only, never used for matching.
fn sub_events(event: &str, description: &str) -> Option<String> {
    if !SUB_EVENT_SOURCES.contains(&event) || description.is_empty() {
        return None;
    }

    let summary = description.to_uppercase();
    let hits: Vec<&str> = SUB_EVENT_VOCAB
        .iter()
        .copied()
        .filter(|item| summary.contains(&item.to_uppercase()))
        .collect();

    if hits.is_empty() {
        None
    } else {
        Some(hits.join(", "))
    }
}

/// Parse an RFC 3339 expiry. A malformed date means expiry unknown (epoch
/// zero), never a rejected entry.
fn parse_expiry(raw: Option<&str>) -> (Option<String>, i64) {
    let Some(raw) = raw else {
        return (None, 0);
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(dt) => (Some(raw.to_string()), dt.with_timezone(&Utc).timestamp()),
        Err(_) => (None, 0),
    }
}
