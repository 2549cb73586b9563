//! End-to-end run: clean stations, reconcile them, then join every census
//! year's TPUs to their nearest station and tabulate the distance bands.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::error::{Error, Result};
use crate::geodesy::CoordinateValidator;
use crate::models::{
    BoundaryDataset, BucketCount, CensusYear, Coordinate, ProximityRecord, ReconciliationResult,
    ReconciliationSummary, StationRow, StationTable,
};
use crate::pip::TpuIndex;
use crate::proximity::{aggregate, to_rows, NearestStationJoin};
use crate::reconcile::{apply_reconciliation, Reconciler};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineInput {
    pub stations: Vec<StationRow>,
    /// Reference coordinates keyed by station name
    #[serde(default)]
    pub reference: BTreeMap<String, Coordinate>,
    #[serde(default)]
    pub boundaries: Vec<BoundaryDataset>,
}

/// Which TPU a station falls in for one census year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationPlacement {
    pub station_name: String,
    pub year: CensusYear,
    pub tpu_id: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    StationRow,
    Tpu,
}

/// A single entity that was skipped, reported next to the successful results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<CensusYear>,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub generated_at: DateTime<Utc>,
    pub summary: ReconciliationSummary,
    pub reconciliation: Vec<ReconciliationResult>,
    pub proximity: Vec<ProximityRecord>,
    pub bucket_counts: Vec<BucketCount>,
    pub placements: Vec<StationPlacement>,
    pub failures: Vec<Failure>,
}

pub fn run(input: &PipelineInput, config: &AnalysisConfig) -> Result<PipelineOutput> {
    config.validate()?;
    let validator = CoordinateValidator::new(config.bounds);
    let mut failures = Vec::new();

    let table = StationTable::from_rows(&input.stations, &validator);
    failures.extend(table.rejected.iter().map(|r| Failure {
        kind: FailureKind::StationRow,
        id: r.name.clone().unwrap_or_else(|| format!("row {}", r.row)),
        year: None,
        reason: r.reason.clone(),
    }));

    let reconciler = Reconciler::from_config(config);
    let reconciliation = reconciler.reconcile_all(&table.stations, &input.reference)?;
    let summary = ReconciliationSummary::from_results(&reconciliation);
    let stations = apply_reconciliation(&table.stations, &reconciliation, &validator);

    let join = NearestStationJoin::new(&stations, &validator, &config.proximity)?;
    info!("Joining against {} stations", join.len());

    let mut datasets: Vec<&BoundaryDataset> = input.boundaries.iter().collect();
    datasets.sort_by_key(|d| d.year);

    let mut years = HashSet::new();
    let mut proximity = Vec::new();
    let mut placements = Vec::new();

    for dataset in datasets {
        if !years.insert(dataset.year) {
            warn!("Ignoring repeated boundary dataset for {}", dataset.year);
            continue;
        }

        let tpus = dataset.load();
        let outcome = join.join_dataset(&tpus)?;
        proximity.extend(outcome.records);
        failures.extend(outcome.failures.into_iter().map(|e| tpu_failure(e, dataset.year)));

        let index = TpuIndex::build(&tpus);
        placements.extend(stations.iter().filter_map(|s| {
            let coordinate = s.valid_coordinate()?;
            Some(StationPlacement {
                station_name: s.name.clone(),
                year: dataset.year,
                tpu_id: index.locate(&coordinate).map(|t| t.id.clone()),
            })
        }));
    }

    let bucket_counts = to_rows(&aggregate(&proximity));

    info!(
        "Pipeline finished: {} proximity records, {} placements, {} failures",
        proximity.len(),
        placements.len(),
        failures.len()
    );

    Ok(PipelineOutput {
        generated_at: summary.generated_at,
        summary,
        reconciliation,
        proximity,
        bucket_counts,
        placements,
        failures,
    })
}

fn tpu_failure(error: Error, year: CensusYear) -> Failure {
    match error {
        Error::DegeneratePolygon { tpu_id, reason } => Failure {
            kind: FailureKind::Tpu,
            id: tpu_id,
            year: Some(year),
            reason,
        },
        Error::CentroidOutOfBounds { ref tpu_id, .. } => Failure {
            kind: FailureKind::Tpu,
            id: tpu_id.clone(),
            year: Some(year),
            reason: error.to_string(),
        },
        other => Failure {
            kind: FailureKind::Tpu,
            id: String::new(),
            year: Some(year),
            reason: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProximityBucket, ReconciliationStatus, TpuRow};

    fn station_row(name: &str, lat: &str, lon: &str) -> StationRow {
        serde_json::from_value(serde_json::json!({
            "name": name,
            "latitude": lat,
            "longitude": lon,
        }))
        .unwrap()
    }

    fn square(id: &str, lon: f64, lat: f64) -> TpuRow {
        TpuRow {
            id: id.to_string(),
            polygons: vec![vec![vec![
                [lon, lat],
                [lon + 0.004, lat],
                [lon + 0.004, lat + 0.004],
                [lon, lat + 0.004],
                [lon, lat],
            ]]],
        }
    }

    fn input() -> PipelineInput {
        PipelineInput {
            stations: vec![
                station_row("Central", "22.281944", "114.158056"),
                station_row("Mong Kok", "22.3192", "114.1694"),
                station_row("Hung Hom", "", ""),
                station_row("Read more", "22.3", "114.1"),
            ],
            reference: BTreeMap::from([
                ("Central".to_string(), Coordinate::new(22.2820, 114.1581)),
                ("Hung Hom".to_string(), Coordinate::new(22.303056, 114.181667)),
            ]),
            boundaries: vec![
                BoundaryDataset {
                    year: CensusYear::Y2016,
                    tpus: vec![
                        square("131", 114.156, 22.280),
                        square("215", 114.168, 22.318),
                        TpuRow {
                            id: "999".to_string(),
                            polygons: vec![],
                        },
                    ],
                },
                BoundaryDataset {
                    year: CensusYear::Y2001,
                    tpus: vec![square("131", 114.156, 22.280)],
                },
            ],
        }
    }

    #[test]
    fn test_run_end_to_end() {
        let output = run(&input(), &AnalysisConfig::default()).unwrap();

        assert_eq!(output.summary.verified, 1);
        assert_eq!(output.summary.added, 1);
        assert_eq!(output.summary.not_found, 1);
        let hung_hom = output
            .reconciliation
            .iter()
            .find(|r| r.station_name == "Hung Hom")
            .unwrap();
        assert_eq!(hung_hom.status, ReconciliationStatus::Added);

        let keys: Vec<(CensusYear, &str)> = output
            .proximity
            .iter()
            .map(|r| (r.year, r.tpu_id.as_str()))
            .collect();
        assert_eq!(
            keys,
            vec![
                (CensusYear::Y2001, "131"),
                (CensusYear::Y2016, "131"),
                (CensusYear::Y2016, "215"),
            ]
        );
        assert!(output
            .proximity
            .iter()
            .all(|r| r.bucket == ProximityBucket::VeryClose));
        assert_eq!(output.bucket_counts.len(), 2);

        // One rejected noise row, one degenerate TPU
        assert_eq!(output.failures.len(), 2);
        assert!(output
            .failures
            .iter()
            .any(|f| f.kind == FailureKind::Tpu && f.id == "999"));

        let central_2016 = output
            .placements
            .iter()
            .find(|p| p.station_name == "Central" && p.year == CensusYear::Y2016)
            .unwrap();
        assert_eq!(central_2016.tpu_id.as_deref(), Some("131"));
    }

    #[test]
    fn test_run_without_valid_stations() {
        let mut input = input();
        input.stations = vec![station_row("Hung Hom", "", "")];
        input.reference.clear();
        assert_eq!(
            run(&input, &AnalysisConfig::default()).unwrap_err(),
            Error::EmptyStationSet
        );
    }

    #[test]
    fn test_run_serializes() {
        let output = run(&input(), &AnalysisConfig::default()).unwrap();
        let json = serde_json::to_value(&output).unwrap();
        assert_eq!(json["bucket_counts"][0]["year"], 2001);
        assert_eq!(json["bucket_counts"][0]["bucket"], "very_close");
        assert_eq!(
            json["generated_at"],
            serde_json::to_value(output.summary.generated_at).unwrap()
        );
    }

    fn grid_square(id: &str) -> TpuRow {
        TpuRow {
            id: id.to_string(),
            polygons: vec![vec![vec![
                [833000.0, 815000.0],
                [834000.0, 815000.0],
                [834000.0, 816000.0],
                [833000.0, 816000.0],
                [833000.0, 815000.0],
            ]]],
        }
    }

    #[test]
    fn test_run_reports_out_of_bounds_centroids() {
        let mut input = input();
        input.boundaries = vec![BoundaryDataset {
            year: CensusYear::Y2016,
            tpus: vec![square("131", 114.156, 22.280), grid_square("400")],
        }];

        let output = run(&input, &AnalysisConfig::default()).unwrap();
        assert_eq!(output.proximity.len(), 1);
        assert_eq!(output.proximity[0].tpu_id, "131");
        let failure = output
            .failures
            .iter()
            .find(|f| f.kind == FailureKind::Tpu)
            .unwrap();
        assert_eq!(failure.id, "400");
        assert_eq!(failure.year, Some(CensusYear::Y2016));

        input.boundaries[0].tpus = vec![grid_square("400")];
        assert_eq!(
            run(&input, &AnalysisConfig::default()).unwrap_err(),
            Error::NoValidPolygons {
                year: CensusYear::Y2016
            }
        );
    }
}
