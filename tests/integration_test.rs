//! End-to-end tests of the cold-cache refresh: canned API responses are
//! fetched, flattened, cached as .npy files and loaded back.
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use anyhow::{anyhow, Result};
use once_cell::sync::Lazy;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

use padherder_cache::download::{dataset_url, CacheManager, Fetch, DEFAULT_BASE_URL};
use padherder_cache::parser::Cell;
use padherder_cache::schema::{
    DatasetKind, FieldType, MAX_AWOKEN_SKILLS, MONSTERS, MONSTER_AWOKEN_SKILLS, MONSTER_PDX_ID,
    MONSTER_US_ID,
};
use padherder_cache::ui::SilentUi;
use padherder_cache::{DataDict, DataLoader};

// =============================================================================
// Fixtures
// =============================================================================

fn active_skills() -> Value {
    json!([
        {"min_cooldown": 5, "effect": "Recover 50% of max HP", "max_cooldown": 10, "name": "Heal Drop"},
        {"min_cooldown": 8, "effect": "Change all Orbs", "max_cooldown": 15, "name": "Kaleidoscope"}
    ])
}

fn awakenings() -> Value {
    json!([
        {"desc": "Increase HP by 200", "id": 1, "name": "Enhanced HP"},
        {"desc": "Reduce skill cooldown", "id": 21, "name": "Skill Boost"}
    ])
}

fn leader_skills() -> Value {
    json!([
        {"data": [1, 2, 1, ["elem", 0, 3]], "effect": "Fire and Dark ATK x2", "name": "Twin Flame"},
        {"effect": "Reduce damage by 25%", "name": "Guard"},
        {"data": [1.5, 1, 1], "effect": "All HP x1.5", "name": "Sturdy"}
    ])
}

/// Monster object with every field in source order
///
/// `ids` carries pdx_id/us_id; without it the object has the legacy shape.
fn monster(id: i64, awoken: Value, ids: Option<(i64, i64)>) -> Value {
    let mut object = Map::new();
    for (position, field) in MONSTERS.fields.iter().enumerate() {
        let value = if position == MONSTER_AWOKEN_SKILLS {
            awoken.clone()
        } else if position == MONSTER_PDX_ID || position == MONSTER_US_ID {
            match ids {
                Some((pdx, _)) if position == MONSTER_PDX_ID => json!(pdx),
                Some((_, us)) => json!(us),
                None => continue,
            }
        } else if field.name == "id" {
            json!(id)
        } else {
            match field.field_type {
                FieldType::Bytes(_) => json!(format!("{} {}", field.name, id)),
                FieldType::Float16 | FieldType::Float32 => json!(1.5),
                FieldType::Bool => json!(false),
                _ => json!(position),
            }
        };
        object.insert(field.name.to_string(), value);
    }
    Value::Object(object)
}

fn monsters() -> Value {
    json!([
        monster(1, json!([10, 11]), None),
        monster(2, json!([]), Some((1234, 4321))),
        monster(3, json!([1, 2, 3, 4, 5, 6, 7, 8, 9, 10]), None),
        monster(4, json!([null]), Some((5, 6)))
    ])
}

static BODIES: Lazy<HashMap<String, String>> = Lazy::new(|| {
    [
        (DatasetKind::ActiveSkills, active_skills()),
        (DatasetKind::Awakenings, awakenings()),
        (DatasetKind::LeaderSkills, leader_skills()),
        (DatasetKind::Monsters, monsters()),
    ]
    .into_iter()
    .map(|(kind, body)| (dataset_url(DEFAULT_BASE_URL, kind), body.to_string()))
    .collect()
});

// =============================================================================
// Fake API
// =============================================================================

/// Serves canned bodies and counts requests
#[derive(Default)]
struct CannedApi {
    calls: AtomicUsize,
    overrides: HashMap<String, Option<String>>,
}

impl CannedApi {
    /// Serve `body` for `kind`, or fail its request when None
    fn with_override(mut self, kind: DatasetKind, body: Option<&str>) -> Self {
        self.overrides
            .insert(dataset_url(DEFAULT_BASE_URL, kind), body.map(str::to_string));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Fetch for CannedApi {
    fn fetch(&self, url: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.overrides.get(url) {
            Some(Some(body)) => Ok(body.clone()),
            Some(None) => Err(anyhow!("503 Service Unavailable for {}", url)),
            None => BODIES
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow!("404 Not Found for {}", url)),
        }
    }
}

fn loader(api: CannedApi, dir: &TempDir) -> DataLoader<CannedApi> {
    let cache = CacheManager::new(Some(dir.path().to_path_buf())).unwrap();
    DataLoader::new(api, cache)
}

fn load_all(loader: &DataLoader<CannedApi>) -> Result<DataDict> {
    loader.load_game_data(&DatasetKind::ALL, &mut SilentUi::new())
}

fn fetch_calls(loader: &DataLoader<CannedApi>) -> usize {
    loader.fetcher().calls()
}

fn column(data: &DataDict, table: &str, field: &str) -> Vec<Cell> {
    let table = &data[table];
    (0..table.len()).map(|i| table.get(i, field).unwrap()).collect()
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_cold_cache_loads_every_table() {
    let dir = TempDir::new().unwrap();
    let loader = loader(CannedApi::default(), &dir);

    let data = load_all(&loader).unwrap();

    let names: Vec<&str> = data.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec![
            "active_skills",
            "awakenings",
            "leader_skills",
            "leader_skills_sublist",
            "monsters",
            "monsters_sublist",
        ]
    );
    assert_eq!(data["active_skills"].len(), 2);
    assert_eq!(data["awakenings"].len(), 2);
    assert_eq!(data["leader_skills"].len(), 3);
    assert_eq!(data["monsters"].len(), 4);
    assert_eq!(fetch_calls(&loader), 4);

    for name in data.keys() {
        assert!(dir.path().join(format!("{}.npy", name)).exists(), "{} not cached", name);
    }
}

#[test]
fn test_leader_skill_indices_are_dense() {
    let dir = TempDir::new().unwrap();
    let data = load_all(&loader(CannedApi::default(), &dir)).unwrap();

    assert_eq!(
        column(&data, "leader_skills", "data"),
        vec![Cell::Int(0), Cell::Int(-1), Cell::Int(1)]
    );

    let sublist = &data["leader_skills_sublist"];
    assert_eq!(sublist.len(), 2);
    assert_eq!(
        sublist.decode_row(0).unwrap(),
        vec![
            Cell::List(vec![Cell::Int(1), Cell::Int(2), Cell::Int(1)]),
            Cell::text("elem"),
            Cell::List(vec![Cell::Int(0), Cell::Int(3), Cell::Int(-1)]),
        ]
    );
    // 1.5 truncates to 1 in the int8 multipliers
    assert_eq!(
        sublist.decode_row(1).unwrap(),
        vec![
            Cell::List(vec![Cell::Int(1), Cell::Int(1), Cell::Int(1)]),
            Cell::text("-1"),
            Cell::List(vec![Cell::Int(-1), Cell::Int(-1), Cell::Int(-1)]),
        ]
    );
}

#[test]
fn test_monster_shapes_and_awoken_skills() {
    let dir = TempDir::new().unwrap();
    let data = load_all(&loader(CannedApi::default(), &dir)).unwrap();

    assert_eq!(
        column(&data, "monsters", "id"),
        vec![Cell::Int(1), Cell::Int(2), Cell::Int(3), Cell::Int(4)]
    );
    // Legacy records get -1, which wraps to 65535 in the uint16 id fields
    assert_eq!(
        column(&data, "monsters", "pdx_id"),
        vec![Cell::Int(65535), Cell::Int(1234), Cell::Int(65535), Cell::Int(5)]
    );
    assert_eq!(
        column(&data, "monsters", "us_id"),
        vec![Cell::Int(65535), Cell::Int(4321), Cell::Int(65535), Cell::Int(6)]
    );
    assert_eq!(
        column(&data, "monsters", "awoken_skills"),
        vec![Cell::Int(0), Cell::Int(-1), Cell::Int(1), Cell::Int(2)]
    );
    assert_eq!(data["monsters"].get(0, "name"), Some(Cell::text("name 1")));

    let sublist = &data["monsters_sublist"];
    assert_eq!(sublist.len(), 3);

    let mut padded = vec![Cell::Int(10), Cell::Int(11)];
    padded.resize(MAX_AWOKEN_SKILLS, Cell::Int(-1));
    assert_eq!(sublist.get(0, "awoken_skills"), Some(Cell::List(padded)));

    let full: Vec<Cell> = (1..=10).map(Cell::Int).collect();
    assert_eq!(sublist.get(1, "awoken_skills"), Some(Cell::List(full)));

    // A null skill id becomes the sentinel
    let nulls = vec![Cell::Int(-1); MAX_AWOKEN_SKILLS];
    assert_eq!(sublist.get(2, "awoken_skills"), Some(Cell::List(nulls)));
}

#[test]
fn test_warm_cache_skips_fetching() {
    let dir = TempDir::new().unwrap();

    let first = loader(CannedApi::default(), &dir);
    let cold = load_all(&first).unwrap();
    let files: Vec<Vec<u8>> = cold
        .keys()
        .map(|name| fs::read(dir.path().join(format!("{}.npy", name))).unwrap())
        .collect();

    let second = loader(CannedApi::default(), &dir);
    let warm = load_all(&second).unwrap();

    assert_eq!(fetch_calls(&second), 0);
    assert_eq!(cold, warm);
    for (name, before) in cold.keys().zip(files) {
        let after = fs::read(dir.path().join(format!("{}.npy", name))).unwrap();
        assert_eq!(before, after, "{} was rewritten", name);
    }
}

#[test]
fn test_only_missing_datasets_are_fetched() {
    let dir = TempDir::new().unwrap();
    load_all(&loader(CannedApi::default(), &dir)).unwrap();

    fs::remove_file(dir.path().join("awakenings.npy")).unwrap();

    let second = loader(CannedApi::default(), &dir);
    let fetched = second
        .refresh_missing(&DatasetKind::ALL, &mut SilentUi::new())
        .unwrap();

    assert_eq!(fetched, vec![DatasetKind::Awakenings]);
    assert_eq!(fetch_calls(&second), 1);
}

#[test]
fn test_failed_fetch_caches_nothing_for_that_dataset() {
    let dir = TempDir::new().unwrap();
    let api = CannedApi::default().with_override(DatasetKind::Monsters, None);
    let loader = loader(api, &dir);

    let err = load_all(&loader).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to fetch monsters"), "{}", message);

    assert!(!dir.path().join("monsters.npy").exists());
    assert!(!dir.path().join("monsters_sublist.npy").exists());
}

#[test]
fn test_malformed_record_caches_nothing_for_that_dataset() {
    let dir = TempDir::new().unwrap();
    let api = CannedApi::default().with_override(
        DatasetKind::LeaderSkills,
        Some(r#"[{"data": [1, 2], "effect": "x", "name": "y"}]"#),
    );
    let loader = loader(api, &dir);

    let err = load_all(&loader).unwrap_err();
    let message = format!("{:#}", err);
    assert!(message.contains("Failed to flatten leader_skills"), "{}", message);
    assert!(message.contains("record 0"), "{}", message);

    assert!(!dir.path().join("leader_skills.npy").exists());
    assert!(!dir.path().join("leader_skills_sublist.npy").exists());
}

#[test]
fn test_unknown_monster_shape_is_rejected() {
    let dir = TempDir::new().unwrap();
    let api = CannedApi::default()
        .with_override(DatasetKind::Monsters, Some(r#"[{"element2": 1, "awoken_skills": []}]"#));
    let loader = loader(api, &dir);

    let err = loader
        .load_game_data(&[DatasetKind::Monsters], &mut SilentUi::new())
        .unwrap_err();
    assert!(format!("{:#}", err).contains("no known monster shape has 2 fields"));
    assert!(!dir.path().join("monsters.npy").exists());
}

#[test]
fn test_indices_restart_for_each_dataset() {
    let dir = TempDir::new().unwrap();
    let loader = loader(CannedApi::default(), &dir);

    let data = loader
        .load_game_data(
            &[DatasetKind::LeaderSkills, DatasetKind::Monsters],
            &mut SilentUi::new(),
        )
        .unwrap();

    assert_eq!(data["leader_skills"].get(0, "data"), Some(Cell::Int(0)));
    assert_eq!(data["monsters"].get(0, "awoken_skills"), Some(Cell::Int(0)));
    assert!(!data.contains_key("awakenings"));
}
