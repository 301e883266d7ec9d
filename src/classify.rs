use std::ops::RangeInclusive;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::probe::ProbeStatus;
use crate::types::Outcome;

/// Status label recorded when the probe could not read a status code.
pub const UNOBSERVABLE_LABEL: &str = "unobservable";

/// Maps observed probe statuses onto outcomes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomePolicy {
    /// Status codes reported as `Found`.
    pub found: Vec<RangeInclusive<u16>>,
    /// Status codes reported as `NotFound`.
    pub not_found: Vec<RangeInclusive<u16>>,
    /// Outcome for codes matching neither list.
    pub unmatched: Outcome,
}

impl Default for OutcomePolicy {
    fn default() -> Self {
        Self {
            found: vec![200..=399],
            not_found: vec![404..=404, 410..=410],
            unmatched: Outcome::NotFound,
        }
    }
}

impl OutcomePolicy {
    /// Classify one probe status into an outcome and its status descriptor.
    ///
    /// `not_found` is consulted before `found` so an explicit not-found code
    /// always wins over an overlapping found range.
    pub fn classify(&self, status: &ProbeStatus) -> (Outcome, String) {
        match status {
            ProbeStatus::Status(code) => {
                let outcome = if contains(&self.not_found, *code) {
                    Outcome::NotFound
                } else if contains(&self.found, *code) {
                    Outcome::Found
                } else {
                    self.unmatched
                };
                (outcome, code.to_string())
            }
            ProbeStatus::Error(detail) => (Outcome::Error, detail.clone()),
            ProbeStatus::Aborted => (Outcome::Error, "aborted".to_string()),
            ProbeStatus::Unobservable => (Outcome::Unobservable, UNOBSERVABLE_LABEL.to_string()),
        }
    }
}

fn contains(ranges: &[RangeInclusive<u16>], code: u16) -> bool {
    ranges.iter().any(|r| r.contains(&code))
}

/// Parse a comma separated list of status codes and inclusive ranges,
/// e.g. `200-299,301,302`.
pub fn parse_status_list(s: &str) -> Result<Vec<RangeInclusive<u16>>> {
    let mut out = Vec::new();
    for item in s.split(',').map(str::trim).filter(|i| !i.is_empty()) {
        if let Some((a, b)) = item.split_once('-') {
            let start = parse_code(a.trim())
                .with_context(|| format!("invalid start in status range: {item}"))?;
            let end = parse_code(b.trim())
                .with_context(|| format!("invalid end in status range: {item}"))?;
            if start > end {
                bail!("invalid status range {start}-{end} (start > end)");
            }
            out.push(start..=end);
        } else {
            let code =
                parse_code(item).with_context(|| format!("invalid status code: {item}"))?;
            out.push(code..=code);
        }
    }
    if out.is_empty() {
        bail!("status list is empty");
    }
    Ok(out)
}

/// Parse the outcome used for status codes outside both lists.
///
/// Only `found`, `not_found` and `error` are accepted; an observed status is
/// never reported as unobservable.
pub fn parse_unmatched(s: &str) -> Result<Outcome> {
    match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
        "found" => Ok(Outcome::Found),
        "not_found" | "notfound" => Ok(Outcome::NotFound),
        "error" => Ok(Outcome::Error),
        other => bail!("unknown outcome for unmatched status codes: {other}"),
    }
}

fn parse_code(s: &str) -> Result<u16> {
    let val: u16 = s.parse()?;
    if !(100..=599).contains(&val) {
        bail!("status code out of range: {val}");
    }
    Ok(val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_maps_common_codes() {
        let p = OutcomePolicy::default();
        assert_eq!(p.classify(&ProbeStatus::Status(200)).0, Outcome::Found);
        assert_eq!(p.classify(&ProbeStatus::Status(302)).0, Outcome::Found);
        assert_eq!(p.classify(&ProbeStatus::Status(404)).0, Outcome::NotFound);
        assert_eq!(p.classify(&ProbeStatus::Status(500)).0, Outcome::NotFound);
        assert_eq!(p.classify(&ProbeStatus::Status(404)).1, "404");
    }

    #[test]
    fn unobservable_is_never_found() {
        let p = OutcomePolicy {
            found: vec![0..=u16::MAX],
            ..OutcomePolicy::default()
        };
        let (outcome, label) = p.classify(&ProbeStatus::Unobservable);
        assert_eq!(outcome, Outcome::Unobservable);
        assert_eq!(label, UNOBSERVABLE_LABEL);
    }

    #[test]
    fn transport_errors_keep_detail() {
        let p = OutcomePolicy::default();
        let (outcome, label) = p.classify(&ProbeStatus::Error("connection refused".into()));
        assert_eq!(outcome, Outcome::Error);
        assert_eq!(label, "connection refused");
    }

    #[test]
    fn not_found_wins_over_found_range() {
        let p = OutcomePolicy {
            found: vec![200..=499],
            not_found: vec![404..=404],
            unmatched: Outcome::Error,
        };
        assert_eq!(p.classify(&ProbeStatus::Status(404)).0, Outcome::NotFound);
        assert_eq!(p.classify(&ProbeStatus::Status(403)).0, Outcome::Found);
        assert_eq!(p.classify(&ProbeStatus::Status(503)).0, Outcome::Error);
    }

    #[test]
    fn parse_codes_and_ranges() {
        let list = parse_status_list("200-299, 301,302").unwrap();
        assert_eq!(list, vec![200..=299, 301..=301, 302..=302]);
    }

    #[test]
    fn parse_unmatched_outcomes() {
        assert_eq!(parse_unmatched("found").unwrap(), Outcome::Found);
        assert_eq!(parse_unmatched("Not-Found").unwrap(), Outcome::NotFound);
        assert_eq!(parse_unmatched("error").unwrap(), Outcome::Error);
        assert!(parse_unmatched("unobservable").is_err());
    }

    #[test]
    fn protected_paths_reported_when_unmatched_is_found() {
        let p = OutcomePolicy {
            unmatched: parse_unmatched("found").unwrap(),
            ..OutcomePolicy::default()
        };
        assert_eq!(p.classify(&ProbeStatus::Status(401)).0, Outcome::Found);
        assert_eq!(p.classify(&ProbeStatus::Status(403)).0, Outcome::Found);
        assert_eq!(p.classify(&ProbeStatus::Status(404)).0, Outcome::NotFound);
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(parse_status_list("").is_err());
        assert!(parse_status_list("299-200").is_err());
        assert!(parse_status_list("99").is_err());
        assert!(parse_status_list("abc").is_err());
    }
}
