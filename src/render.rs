// src/render.rs

//! Detail-page artifacts. One HTML file per matched alert, keyed by the
//! alert's identity, written to an output directory nothing else touches.

use anyhow::{Context, Result};
use chrono::{TimeZone, Utc};
use serde::Deserialize;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::ingest::types::AlertDetail;

/// Presentation toggles from the `[template]` config section. Everything is
/// off by default.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TemplateOptions {
    pub show_event_info: bool,
    pub show_expiration: bool,
    pub conditional_instructions: bool,
    pub color_coding: bool,
    pub show_map_link: bool,
    pub mobile_responsive: bool,
    pub show_social_sharing: bool,
}

/// Human-formatted expiry for display next to the raw epoch.
pub fn format_expiry(expires_utc_ts: i64) -> String {
    Utc.timestamp_opt(expires_utc_ts, 0)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_default()
}

pub fn render_detail_page(
    detail: &AlertDetail,
    expires_utc_ts: i64,
    alert_url: &str,
    options: &TemplateOptions,
) -> String {
    let expires = format_expiry(expires_utc_ts);
    let headline = if detail.headline.is_empty() {
        &detail.event
    } else {
        &detail.headline
    };

    let mut html = String::new();
    let _ = writeln!(html, "<!DOCTYPE html>");
    let _ = writeln!(html, "<html lang=\"en\">");
    let _ = writeln!(html, "<head>");
    let _ = writeln!(html, "<meta charset=\"utf-8\">");
    if options.mobile_responsive {
        let _ = writeln!(
            html,
            "<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">"
        );
    }
    let _ = writeln!(html, "<title>{}</title>", escape(headline));
    let _ = writeln!(html, "</head>");

    if options.color_coding {
        let _ = writeln!(
            html,
            "<body class=\"{}\">",
            event_class(&detail.event)
        );
    } else {
        let _ = writeln!(html, "<body>");
    }

    let _ = writeln!(html, "<h1>{}</h1>", escape(headline));

    if options.show_event_info && !detail.event.is_empty() {
        let _ = writeln!(
            html,
            "<p class=\"event\">{} &mdash; {}</p>",
            escape(&detail.event),
            escape(&detail.issuer)
        );
    }
    if !detail.area.is_empty() {
        let _ = writeln!(html, "<p class=\"area\">{}</p>", escape(&detail.area));
    }
    if options.show_expiration && expires_utc_ts > 0 {
        let _ = writeln!(
            html,
            "<p class=\"expires\" data-ts=\"{}\">Expires {} UTC</p>",
            expires_utc_ts, expires
        );
    }

    let _ = writeln!(
        html,
        "<pre class=\"description\">{}</pre>",
        escape(&detail.description)
    );

    // With conditional_instructions set, an empty instruction block is
    // omitted instead of rendering an empty section.
    if !options.conditional_instructions || !detail.instructions.is_empty() {
        let _ = writeln!(
            html,
            "<pre class=\"instructions\">{}</pre>",
            escape(&detail.instructions)
        );
    }

    if options.show_map_link && !detail.area.is_empty() {
        let _ = writeln!(
            html,
            "<p><a href=\"https://www.google.com/maps/search/{}\">Map</a></p>",
            escape(&detail.area.replace(' ', "+"))
        );
    }
    if !alert_url.is_empty() {
        let _ = writeln!(
            html,
            "<p><a href=\"{}\">Full alert</a></p>",
            escape(alert_url)
        );
    }
    if options.show_social_sharing && !alert_url.is_empty() {
        let _ = writeln!(
            html,
            "<p><a href=\"https://twitter.com/intent/tweet?url={}\">Share</a></p>",
            escape(alert_url)
        );
    }

    let _ = writeln!(html, "</body>");
    let _ = writeln!(html, "</html>");
    html
}

/// Write the artifact as `{alert_id}.html` under the output directory,
/// creating the directory on first use.
pub fn write_detail_page(output_dir: &Path, alert_id: &str, html: &str) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("creating output dir {}", output_dir.display()))?;
    let path = output_dir.join(format!("{alert_id}.html"));
    fs::write(&path, html).with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn event_class(event: &str) -> &'static str {
    let event = event.to_ascii_lowercase();
    if event.contains("warning") {
        "warning"
    } else if event.contains("watch") {
        "watch"
    } else {
        "advisory"
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
