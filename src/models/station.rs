//! MTR station records and the cleaning step that turns loosely-typed source
//! rows into them.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use hashbrown::HashSet;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, info};

use super::{Coordinate, CoordinateFlag};
use crate::geodesy::CoordinateValidator;

static CITATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\d+\]").expect("static regex"));
static TRAILING_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\(([^)]+)\)\s*$").expect("static regex"));
static NOISE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)wikimedia|article|talk|read|français").expect("static regex")
});
static CODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{2,3}$").expect("static regex"));

/// A raw row from the station source table. Every field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub chinese_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub lines: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Accepts a number, a numeric string, an empty string or null.
/// Anything unparseable becomes `None` instead of failing the whole load.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    let value = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Number(n)) => Some(n),
        Some(Raw::Text(s)) => s.trim().parse::<f64>().ok(),
        Some(Raw::Other(_)) | None => None,
    };
    Ok(value.filter(|v| v.is_finite()))
}

/// A cleaned station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    /// English name, the identity key
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub chinese_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub coordinate: Option<Coordinate>,

    pub lines: BTreeSet<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    /// Set when the coordinate is missing or failed validation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<CoordinateFlag>,
}

impl Station {
    pub fn new(name: impl Into<String>, coordinate: Option<Coordinate>) -> Self {
        Self {
            name: name.into(),
            chinese_name: None,
            coordinate,
            lines: BTreeSet::new(),
            code: None,
            flag: None,
        }
    }

    /// Coordinate that passed validation, if any.
    pub fn valid_coordinate(&self) -> Option<Coordinate> {
        match self.flag {
            Some(_) => None,
            None => self.coordinate,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid_coordinate().is_some()
    }

    /// Re-run the validator against the current coordinate and update the flag.
    pub fn revalidate(&mut self, validator: &CoordinateValidator) {
        self.flag = match self.coordinate {
            None => Some(CoordinateFlag::Missing),
            Some(c) if !validator.validate(&c) => Some(CoordinateFlag::OutOfBounds),
            Some(_) => None,
        };
    }
}

/// A source row that could not become a station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedRow {
    /// Position in the source table
    pub row: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub reason: String,
}

/// All stations from one source table, in source order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StationTable {
    pub stations: Vec<Station>,
    pub rejected: Vec<RejectedRow>,
}

impl StationTable {
    /// Clean source rows. Malformed rows are rejected individually; duplicate
    /// names are kept so that reconciliation can see them.
    pub fn from_rows(rows: &[StationRow], validator: &CoordinateValidator) -> Self {
        let mut table = StationTable::default();

        for (idx, row) in rows.iter().enumerate() {
            match clean_row(row, validator) {
                Ok(station) => table.stations.push(station),
                Err(reason) => {
                    debug!("Rejecting station row {}: {}", idx, reason);
                    table.rejected.push(RejectedRow {
                        row: idx,
                        name: row.name.clone(),
                        reason,
                    });
                }
            }
        }

        let flagged = table.stations.iter().filter(|s| !s.is_valid()).count();
        info!(
            "Cleaned {} station rows: {} kept ({} without a valid coordinate), {} rejected",
            rows.len(),
            table.stations.len(),
            flagged,
            table.rejected.len()
        );

        table
    }

    /// First-seen station per name.
    pub fn unique(&self) -> Vec<&Station> {
        let mut seen = HashSet::new();
        self.stations
            .iter()
            .filter(|s| seen.insert(s.name.as_str()))
            .collect()
    }

    /// Names that appear more than once, in first-seen order.
    pub fn duplicate_names(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut dups = Vec::new();
        for s in &self.stations {
            if !seen.insert(s.name.as_str()) && reported.insert(s.name.as_str()) {
                dups.push(s.name.as_str());
            }
        }
        dups
    }
}

fn clean_row(row: &StationRow, validator: &CoordinateValidator) -> Result<Station, String> {
    let raw_name = row
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| "missing station name".to_string())?;

    let (name, split_chinese) = split_names(raw_name);

    if name.chars().count() <= 2 {
        return Err(format!("station name '{}' is too short", name));
    }
    if NOISE_RE.is_match(&name) {
        return Err(format!("'{}' looks like page chrome, not a station", name));
    }

    let chinese_name = row
        .chinese_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or(split_chinese);

    let coordinate = match (row.latitude, row.longitude) {
        (Some(lat), Some(lon)) => Some(Coordinate::new(lat, lon)),
        _ => None,
    };

    let code = row
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| CODE_RE.is_match(c))
        .map(str::to_string);

    let mut station = Station {
        name,
        chinese_name,
        coordinate,
        lines: parse_lines(row.lines.as_deref()),
        code,
        flag: None,
    };
    station.revalidate(validator);

    Ok(station)
}

/// Strip citation markers and split off a trailing Chinese name in parentheses.
fn split_names(raw: &str) -> (String, Option<String>) {
    let cleaned = CITATION_RE.replace_all(raw, "");
    let cleaned = cleaned.trim();

    if let Some(caps) = TRAILING_PAREN_RE.captures(cleaned) {
        let inner = caps[1].trim();
        if inner.chars().any(is_cjk) {
            let english = TRAILING_PAREN_RE.replace(cleaned, "").trim().to_string();
            return (english, Some(inner.to_string()));
        }
    }

    (cleaned.to_string(), None)
}

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fff}').contains(&c)
}

fn parse_lines(raw: Option<&str>) -> BTreeSet<String> {
    let Some(raw) = raw else {
        return BTreeSet::new();
    };
    raw.split(',')
        .map(|l| CITATION_RE.replace_all(l, ""))
        .map(|l| l.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> CoordinateValidator {
        CoordinateValidator::default()
    }

    fn row(name: &str, lat: Option<f64>, lon: Option<f64>) -> StationRow {
        StationRow {
            name: Some(name.to_string()),
            latitude: lat,
            longitude: lon,
            ..Default::default()
        }
    }

    #[test]
    fn test_lenient_coordinates() {
        let json = r#"[
            {"name": "Central", "latitude": "22.281944", "longitude": 114.158056},
            {"name": "Admiralty", "latitude": "", "longitude": "n/a"},
            {"name": "Tsim Sha Tsui"}
        ]"#;
        let rows: Vec<StationRow> = serde_json::from_str(json).unwrap();
        assert_eq!(rows[0].latitude, Some(22.281944));
        assert_eq!(rows[0].longitude, Some(114.158056));
        assert_eq!(rows[1].latitude, None);
        assert_eq!(rows[1].longitude, None);
        assert_eq!(rows[2].latitude, None);
    }

    #[test]
    fn test_name_cleaning() {
        let (name, chinese) = split_names("Central (中環)[3]");
        assert_eq!(name, "Central");
        assert_eq!(chinese.as_deref(), Some("中環"));

        let (name, chinese) = split_names("Disneyland Resort (Lantau)");
        assert_eq!(name, "Disneyland Resort (Lantau)");
        assert!(chinese.is_none());
    }

    #[test]
    fn test_rejects_noise_rows() {
        let rows = vec![
            row("Wikimedia Commons", None, None),
            row("HK", None, None),
            StationRow::default(),
            row("Sheung Wan", Some(22.286389), Some(114.151944)),
        ];
        let table = StationTable::from_rows(&rows, &validator());
        assert_eq!(table.stations.len(), 1);
        assert_eq!(table.rejected.len(), 3);
        assert_eq!(table.rejected[2].row, 2);
    }

    #[test]
    fn test_flags() {
        let rows = vec![
            row("Sheung Wan", Some(22.286389), Some(114.151944)),
            row("Nowhere", Some(51.5), Some(-0.12)),
            row("Half Row", Some(22.3), None),
        ];
        let table = StationTable::from_rows(&rows, &validator());
        assert_eq!(table.stations[0].flag, None);
        assert_eq!(table.stations[1].flag, Some(CoordinateFlag::OutOfBounds));
        // Flagged coordinates are kept but never handed out as valid
        assert!(table.stations[1].coordinate.is_some());
        assert!(table.stations[1].valid_coordinate().is_none());
        assert_eq!(table.stations[2].flag, Some(CoordinateFlag::Missing));
        assert!(table.stations[2].coordinate.is_none());
    }

    #[test]
    fn test_lines_and_code() {
        let mut r = row("Admiralty", Some(22.279444), Some(114.164722));
        r.lines = Some("Island  line, Tsuen Wan line[2],  South Island line ,".to_string());
        r.code = Some("ADM".to_string());
        let table = StationTable::from_rows(&[r], &validator());
        let s = &table.stations[0];
        assert_eq!(s.lines.len(), 3);
        assert!(s.lines.contains("Island line"));
        assert!(s.lines.contains("Tsuen Wan line"));
        assert_eq!(s.code.as_deref(), Some("ADM"));

        let mut r = row("Admiralty", None, None);
        r.code = Some("Admiralty".to_string());
        let table = StationTable::from_rows(&[r], &validator());
        assert!(table.stations[0].code.is_none());
    }

    #[test]
    fn test_duplicates_first_seen() {
        let rows = vec![
            row("Mong Kok", Some(22.319167), Some(114.169444)),
            row("Prince Edward", Some(22.324722), Some(114.168333)),
            row("Mong Kok", Some(22.32), Some(114.17)),
            row("Mong Kok", None, None),
        ];
        let table = StationTable::from_rows(&rows, &validator());
        assert_eq!(table.stations.len(), 4);

        let unique = table.unique();
        assert_eq!(unique.len(), 2);
        assert_eq!(
            unique[0].coordinate,
            Some(Coordinate::new(22.319167, 114.169444))
        );
        assert_eq!(table.duplicate_names(), vec!["Mong Kok"]);
    }
}
