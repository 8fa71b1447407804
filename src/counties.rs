// src/counties.rs
use anyhow::{anyhow, Context, Result};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::{info, warn};

/// One watched county. `fips` may be empty for counties the upstream feed
/// only addresses by UGC code.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct County {
    #[serde(default)]
    pub fips: String,
    pub ugc: String,
    pub name: String,
    pub state: String,
}

/// UGC code reserved for upstream test messages.
pub const TEST_MESSAGE_UGC: &str = "MDC031";

fn fips_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^\d{6}$").unwrap())
}

fn ugc_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"^[A-Z]{2}\d{3}$").unwrap())
}

impl County {
    /// FIPS is six digits when present; UGC is always two letters + three
    /// digits.
    pub fn validate(&self) -> Result<()> {
        if !self.fips.is_empty() && !fips_re().is_match(&self.fips) {
            return Err(anyhow!("invalid FIPS code: {}", self.fips));
        }
        if !ugc_re().is_match(&self.ugc) {
            return Err(anyhow!("invalid UGC code: {}", self.ugc));
        }
        Ok(())
    }
}

/// Load the watched counties from a JSON file. Entries with malformed codes
/// are kept (they just never match) but each one gets a warning.
pub fn load_counties(path: &Path) -> Result<Vec<County>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading counties from {}", path.display()))?;
    let counties: Vec<County> =
        serde_json::from_str(&content).context("parsing counties JSON")?;

    for county in &counties {
        if let Err(e) = county.validate() {
            warn!(county = %county.name, error = %e, "county validation warning");
        }
    }

    Ok(counties)
}

/// Append the TEST MESSAGES county unless some entry already watches its
/// UGC code.
pub fn ensure_test_county(counties: &mut Vec<County>) {
    if counties.iter().any(|c| c.ugc == TEST_MESSAGE_UGC) {
        return;
    }
    counties.push(County {
        fips: String::new(),
        ugc: TEST_MESSAGE_UGC.to_string(),
        name: "TEST MESSAGES".to_string(),
        state: "NA".to_string(),
    });
    info!(ugc = TEST_MESSAGE_UGC, "test messages enabled");
}

/// The watch-list for one run: the county entries plus the derived code
/// lookup sets the matcher intersects against.
#[derive(Debug, Clone, Default)]
pub struct WatchList {
    pub counties: Vec<County>,
    pub fips: HashSet<String>,
    pub ugc: HashSet<String>,
}

impl WatchList {
    pub fn new(counties: Vec<County>) -> Self {
        let fips = counties
            .iter()
            .filter(|c| !c.fips.is_empty())
            .map(|c| c.fips.clone())
            .collect();
        let ugc = counties.iter().map(|c| c.ugc.clone()).collect();
        Self {
            counties,
            fips,
            ugc,
        }
    }
}
