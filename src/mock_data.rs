use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::Rng;
use rand::SeedableRng;
use std::sync::OnceLock;
use std::time::Instant;

use crate::schema::{
    Boundary, Coordinate, Crop, CropSeason, DosedMap, MultiPolygon, Polygon,
    Recipe, Spraying, Task, TaskList, Variety,
};

// ─── Constants ───────────────────────────────────────────────────

pub const NUM_TASKS: usize = 100;
pub const SEASONS_PER_TASK: usize = 5;
pub const SPRAYINGS_PER_SEASON: usize = 2;

/// Fixed seed so every process serves byte-identical payloads.
const SEED: u64 = 42;

// ─── Value pools ─────────────────────────────────────────────────

static PRODUCTS: &[&str] = &[
    "Produkt 1",
    "Produkt 2",
];

static ACTION_TYPES: &[&str] = &["FUNGICIDE_APPLICATION"];

// ─── Public entry point ──────────────────────────────────────────

/// The process-wide dataset, built on first access.
pub fn dataset() -> &'static TaskList {
    static DATASET: OnceLock<TaskList> = OnceLock::new();
    DATASET.get_or_init(|| {
        let start = Instant::now();
        let list = generate(SEED);
        tracing::info!(
            tasks = list.tasks.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mock dataset generated"
        );
        list
    })
}

/// Deterministically builds a dataset of `NUM_TASKS` tasks.
pub fn generate(seed: u64) -> TaskList {
    let mut rng = StdRng::seed_from_u64(seed);
    let tasks = (1..=NUM_TASKS).map(|i| task(&mut rng, i)).collect();
    TaskList { tasks }
}

// ─── Tasks ───────────────────────────────────────────────────────

fn task(rng: &mut StdRng, i: usize) -> Task {
    let f = i as f64;

    let polygon = Polygon {
        coordinates: (0..3)
            .map(|v| Coordinate {
                lon: 6.85 + v as f64 * 0.01 + f * 0.01,
                lat: 51.10 + v as f64 * 0.01 + f * 0.001,
            })
            .collect(),
    };

    Task {
        uuid: new_uuid(rng),
        name: format!("Feld {i}"),
        area: 10_000.0 + f * 100.0,
        boundary: Some(Boundary {
            r#type: "MultiPolygon".into(),
            coordinates: vec![MultiPolygon {
                polygons: vec![polygon],
            }],
        }),
        crop_seasons_v2: (1..=SEASONS_PER_TASK)
            .map(|j| crop_season(rng, i, j))
            .collect(),
    }
}

// ─── Seasons ─────────────────────────────────────────────────────

fn crop_season(rng: &mut StdRng, i: usize, j: usize) -> CropSeason {
    let season_uuid = new_uuid(rng);
    let sprayings_v2 = (1..=SPRAYINGS_PER_SEASON)
        .map(|k| spraying(rng, i, j, k))
        .collect();

    CropSeason {
        uuid: season_uuid,
        is_healthy_field: j % 2 == 0,
        lifecycle_state: if j == 1 { "ACTIVE" } else { "PLANNED" }.into(),
        crop: Some(Crop { uuid: new_uuid(rng) }),
        start_date: timestamp(NaiveDate::from_ymd_opt(2025, 4, 10), i + j, 22),
        variety: Some(Variety {
            name: format!("Sorte {j}"),
        }),
        sprayings_v2,
    }
}

fn spraying(rng: &mut StdRng, i: usize, j: usize, k: usize) -> Spraying {
    let date = timestamp(NaiveDate::from_ymd_opt(2025, 1, 10), i + j + k, 23);

    Spraying {
        uuid: new_uuid(rng),
        planned_date: date.clone(),
        execution_date: date,
        state: "AUTO_EXECUTED".into(),
        assignment_state: "UNASSIGNED".into(),
        assignee: String::new(),
        dosed_map: Some(DosedMap {
            uuid: new_uuid(rng),
            creation_flow_hint: "CROP_PROTECTION".into(),
            application_type: "FLAT".into(),
            application_mode: "SPRAYING".into(),
            recipe_v2: vec![
                Recipe {
                    name: PRODUCTS[(k - 1) % PRODUCTS.len()].into(),
                    r#type: "PRODUCT".into(),
                },
                Recipe {
                    name: "Wasser".into(),
                    r#type: "WATER".into(),
                },
            ],
            action_types: ACTION_TYPES.iter().map(|s| s.to_string()).collect(),
        }),
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

fn new_uuid(rng: &mut StdRng) -> String {
    uuid::Builder::from_random_bytes(rng.gen())
        .into_uuid()
        .to_string()
}

/// RFC 3339 timestamp `offset_days` after `base`, at `hour`:00 UTC.
fn timestamp(base: Option<NaiveDate>, offset_days: usize, hour: u32) -> String {
    base.map(|d| d + Duration::days(offset_days as i64))
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .map(|dt| dt.and_utc().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
        .unwrap_or_default()
}
