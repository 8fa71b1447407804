pub mod pushover;

use anyhow::Result;
use async_trait::async_trait;

use crate::matcher::MatchedAlert;

/// One outgoing push: title, body, and the link the notification opens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushNote {
    pub title: String,
    pub message: String,
    pub url: String,
}

/// Delivery seam. Failure to deliver is the caller's to log; it never
/// touches stored state.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, note: &PushNote) -> Result<()>;
}

/// Push title: `{county} ({state}) Weather Alert`.
pub fn push_title(matched: &MatchedAlert) -> String {
    format!(
        "{} ({}) Weather Alert",
        matched.county_name, matched.county_state
    )
}

/// Push body: the alert title plus the tail of the identity hash so repeated
/// alerts for the same county stay distinguishable on a phone screen. When
/// sub-event details exist (generic weather statements) they are spliced
/// into the title for context.
pub fn push_message(matched: &MatchedAlert) -> String {
    let alert = &matched.alert;
    let title = match alert.details.as_deref() {
        Some(details) if !details.is_empty() => alert
            .title
            .replace("issued", &format!("({}) issued", details)),
        _ => alert.title.clone(),
    };

    let id = &alert.alert_id;
    let tail = &id[id.len().saturating_sub(5)..];
    format!("{} ({})", title, tail)
}
