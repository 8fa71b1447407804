// src/matcher.rs
use crate::counties::WatchList;
use crate::ingest::types::Alert;

/// An alert enriched with the watched county it hit. The enrichment only
/// lives for the run that produced it; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchedAlert {
    pub alert: Alert,
    pub county_name: String,
    pub county_state: String,
}

/// Match this run's alerts against the watch-list.
///
/// Candidates found via UGC codes rank ahead of FIPS candidates, and the
/// first candidate wins. Watched counties are assumed geographically
/// disjoint, so a multi-candidate result does not occur in practice; if a
/// deployment ever watches overlapping codes, the first entry in file order
/// is the one reported.
pub fn match_batch(alerts: Vec<Alert>, watch: &WatchList) -> Vec<MatchedAlert> {
    let mut matched = Vec::new();

    for alert in alerts {
        let ugc_hits: Vec<String> = alert
            .ugc_list()
            .into_iter()
            .filter(|code| watch.ugc.contains(code))
            .collect();
        let fips_hits: Vec<String> = alert
            .fips_list()
            .into_iter()
            .filter(|code| watch.fips.contains(code))
            .collect();

        let mut candidates = Vec::new();
        for code in &ugc_hits {
            candidates.extend(watch.counties.iter().filter(|c| &c.ugc == code));
        }
        for code in &fips_hits {
            candidates.extend(watch.counties.iter().filter(|c| &c.fips == code));
        }

        if let Some(county) = candidates.first() {
            matched.push(MatchedAlert {
                county_name: county.name.clone(),
                county_state: county.state.clone(),
                alert,
            });
        }
    }

    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counties::County;

    fn alert(ugc: Option<&str>, fips: Option<&str>) -> Alert {
        Alert {
            alert_id: "abc123def".to_string(),
            title: "Tornado Warning issued".to_string(),
            event: "Tornado Warning".to_string(),
            details: None,
            expires: None,
            expires_utc_ts: 0,
            url: String::new(),
            api_url: String::new(),
            fips_codes: fips.map(str::to_string),
            ugc_codes: ugc.map(str::to_string),
            created: 0,
        }
    }

    fn watch() -> WatchList {
        WatchList::new(vec![
            County {
                fips: "012057".to_string(),
                ugc: "FLC057".to_string(),
                name: "Hillsborough".to_string(),
                state: "FL".to_string(),
            },
            County {
                fips: String::new(),
                ugc: "MDC031".to_string(),
                name: "TEST".to_string(),
                state: "NA".to_string(),
            },
        ])
    }

    #[test]
    fn ugc_overlap_matches_and_enriches() {
        let matched = match_batch(vec![alert(Some("FLC057"), None)], &watch());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].county_name, "Hillsborough");
        assert_eq!(matched[0].county_state, "FL");
    }

    #[test]
    fn fips_overlap_matches_too() {
        let matched = match_batch(vec![alert(None, Some("099999,012057"))], &watch());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].county_name, "Hillsborough");
    }

    #[test]
    fn no_overlap_produces_no_match() {
        let matched = match_batch(vec![alert(Some("COC005"), Some("008005"))], &watch());
        assert!(matched.is_empty());
    }

    #[test]
    fn alert_without_codes_is_skipped() {
        let matched = match_batch(vec![alert(None, None)], &watch());
        assert!(matched.is_empty());
    }

    #[test]
    fn ugc_candidate_wins_over_fips_candidate() {
        // One alert carrying codes for two different watched counties.
        let matched = match_batch(vec![alert(Some("MDC031"), Some("012057"))], &watch());
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].county_name, "TEST");
    }
}
