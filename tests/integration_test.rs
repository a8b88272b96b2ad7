//! Integration tests that verify fixture feeds match SQLite after import.
//!
//! These tests:
//! 1. Import the fixture feeds (in shuffled order) into a temporary database
//! 2. Query each record back from SQLite
//! 3. Compare field values with the fixture JSON
//!
//! Run with:
//! ```sh
//! cargo test --test integration_test
//! ```

use once_cell::sync::Lazy;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rusqlite::{Connection, Row};
use serde_json::Value;
use std::io::{BufRead, BufReader, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread;
use tempfile::NamedTempFile;

use rocket_launches::api::{parse_launches, CachedSource, Feed, LaunchJson, ResponseCache, SpaceXClient};
use rocket_launches::config::ApiConfig;
use rocket_launches::schema::tables::ALL_TABLES;
use rocket_launches::store::{LaunchQuery, Store};
use rocket_launches::sync::sync;
use rocket_launches::ui::SilentUi;
use rocket_launches::writer::import_launches;

// =============================================================================
// Test Configuration
// =============================================================================

/// Random seed for reproducible shuffling
const RANDOM_SEED: u64 = 42;

fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn read_fixture(name: &str) -> String {
    std::fs::read_to_string(fixture_path(name)).expect("Failed to read fixture")
}

/// Fixture launches as raw JSON, for field comparison
static LAUNCHES_JSON: Lazy<Vec<Value>> = Lazy::new(|| {
    serde_json::from_str(&read_fixture("launches.json")).expect("launches.json is not an array")
});

static LATEST_JSON: Lazy<Value> =
    Lazy::new(|| serde_json::from_str(&read_fixture("latest.json")).expect("Invalid latest.json"));

// =============================================================================
// Shared Test Database
// =============================================================================

/// Shared test database - created once and reused for all tests
static TEST_DB: Lazy<Mutex<TestDatabase>> = Lazy::new(|| Mutex::new(TestDatabase::new()));

struct TestDatabase {
    _temp_file: NamedTempFile,
    db_path: PathBuf,
}

impl TestDatabase {
    fn new() -> Self {
        let temp_file = NamedTempFile::new().expect("Failed to create temp file");
        let db_path = temp_file.path().to_path_buf();

        let mut launches: Vec<LaunchJson> =
            parse_launches(&read_fixture("launches.json")).expect("Failed to parse launches.json");
        let latest = parse_launches(&read_fixture("latest.json")).expect("Failed to parse latest.json");

        // Linking must not depend on input order
        let mut rng = rand::rngs::StdRng::seed_from_u64(RANDOM_SEED);
        launches.shuffle(&mut rng);

        let mut store = Store::open(&db_path).expect("Failed to open test database");
        store
            .ensure_lists(&Feed::standard_lists())
            .expect("Failed to create lists");

        let mut ui = SilentUi::new();
        import_launches(&mut store, &launches, "All", &mut ui).expect("Failed to import launches");
        import_launches(&mut store, &latest, "Latest", &mut ui).expect("Failed to import latest");

        Self {
            _temp_file: temp_file,
            db_path,
        }
    }

    fn connection(&self) -> Connection {
        Connection::open(&self.db_path).expect("Failed to open test database")
    }
}

fn get_test_db() -> Connection {
    TEST_DB.lock().unwrap().connection()
}

// =============================================================================
// Value Comparison Utilities
// =============================================================================

/// Compare a JSON value to a SQLite column value
fn compare_values(json_val: Option<&Value>, sql_val: &rusqlite::types::Value, field_name: &str) {
    use rusqlite::types::Value as Sql;

    match (json_val, sql_val) {
        (None | Some(Value::Null), Sql::Null) => {}
        (Some(Value::Number(n)), Sql::Integer(i)) => {
            assert_eq!(n.as_i64(), Some(*i), "Integer mismatch for field '{}'", field_name);
        }
        (Some(Value::Bool(b)), Sql::Integer(i)) => {
            assert_eq!(*b as i64, *i, "Boolean mismatch for field '{}'", field_name);
        }
        (Some(Value::String(s)), Sql::Text(t)) => {
            assert_eq!(s, t, "Text mismatch for field '{}'", field_name);
        }
        (Some(json @ (Value::Array(_) | Value::Object(_))), Sql::Text(t)) => {
            let stored: Value = serde_json::from_str(t)
                .unwrap_or_else(|_| panic!("Field '{}' does not hold JSON", field_name));
            assert_eq!(json, &stored, "JSON mismatch for field '{}'", field_name);
        }
        (json, sql) => panic!(
            "Type mismatch for field '{}': JSON {:?} vs SQL {:?}",
            field_name, json, sql
        ),
    }
}

/// Check each named column of `row` against the same field in `json`
fn verify_row_fields(row: &Row, json: &Value, fields: &[&str]) {
    for (idx, field) in fields.iter().enumerate() {
        let sql_val: rusqlite::types::Value = row.get(idx).unwrap();
        compare_values(json.get(*field), &sql_val, field);
    }
}

/// Replace nulls inside an object with empty strings
fn blank_nulls(json: &Value) -> Value {
    match json {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if v.is_null() { Value::String(String::new()) } else { v.clone() };
                    (k.clone(), v)
                })
                .collect(),
        ),
        other => other.clone(),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[test]
fn test_launch_fields() {
    let conn = get_test_db();
    let fields = ["name", "flight_number", "upcoming", "success", "details", "launchpad", "date_utc"];

    for json in LAUNCHES_JSON.iter() {
        let remote_id = json["id"].as_str().unwrap();
        conn.query_row(
            "SELECT name, flight_number, upcoming, success, details, launchpad, launch_date
             FROM launches WHERE remote_id = ?1",
            [remote_id],
            |row| {
                verify_row_fields(row, json, &fields);
                Ok(())
            },
        )
        .unwrap_or_else(|e| panic!("Launch {} missing: {}", remote_id, e));
    }
}

#[test]
fn test_fairings_linked_to_their_launch() {
    let conn = get_test_db();
    let fields = ["reused", "recovery_attempt", "recovered", "ships"];

    for json in LAUNCHES_JSON.iter() {
        let remote_id = json["id"].as_str().unwrap();
        let fairings = &json["fairings"];

        let found = conn.query_row(
            "SELECT f.reused, f.recovery_attempt, f.recovered, f.ships
             FROM fairings f JOIN launches l ON l.id = f.launch_id
             WHERE l.remote_id = ?1",
            [remote_id],
            |row| {
                verify_row_fields(row, fairings, &fields);
                Ok(())
            },
        );

        match (fairings.is_null(), found) {
            (true, Err(rusqlite::Error::QueryReturnedNoRows)) | (false, Ok(())) => {}
            (_, other) => panic!("Fairings of {} not linked as expected: {:?}", remote_id, other),
        }
    }
}

#[test]
fn test_links_linked_to_their_launch() {
    let conn = get_test_db();
    let fields = [
        "patch",
        "reddit",
        "flickr",
        "presskit",
        "webcast",
        "youtube_id",
        "article",
        "wikipedia",
    ];

    for json in LAUNCHES_JSON.iter() {
        let remote_id = json["id"].as_str().unwrap();
        if json["links"].is_null() {
            continue;
        }

        let mut expected = json["links"].clone();
        expected["patch"] = blank_nulls(&expected["patch"]);
        expected["reddit"] = blank_nulls(&expected["reddit"]);

        conn.query_row(
            "SELECT k.patch, k.reddit, k.flickr, k.presskit, k.webcast, k.youtube_id, k.article, k.wikipedia
             FROM links k JOIN launches l ON l.id = k.launch_id
             WHERE l.remote_id = ?1",
            [remote_id],
            |row| {
                verify_row_fields(row, &expected, &fields);
                Ok(())
            },
        )
        .unwrap_or_else(|e| panic!("Links of {} not linked: {}", remote_id, e));
    }
}

#[test]
fn test_no_unlinked_satellites() {
    let conn = get_test_db();
    for table in ["fairings", "links"] {
        let unlinked: i64 = conn
            .query_row(
                &format!("SELECT COUNT(*) FROM {} WHERE launch_id IS NULL", table),
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(unlinked, 0, "Unlinked rows in {}", table);
    }
}

#[test]
fn test_latest_shares_the_launch_row() {
    let conn = get_test_db();
    let remote_id = LATEST_JSON["id"].as_str().unwrap();

    let (rows, lists): (i64, String) = conn
        .query_row(
            "SELECT COUNT(DISTINCT l.id), group_concat(ll.title, ',')
             FROM launches l
             JOIN launch_list_members m ON m.launch_id = l.id
             JOIN launch_lists ll ON ll.id = m.list_id
             WHERE l.remote_id = ?1",
            [remote_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(rows, 1);

    let mut lists: Vec<&str> = lists.split(',').collect();
    lists.sort_unstable();
    assert_eq!(lists, vec!["All", "Latest"]);

    // Re-import kept one fairings row for the launch
    let fairings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM fairings WHERE launch_remote_id = ?1",
            [remote_id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(fairings, 1);
}

#[test]
fn test_store_queries_on_reopen() {
    let db_path = TEST_DB.lock().unwrap().db_path.clone();
    let store = Store::open(&db_path).unwrap();

    let all = store
        .launches(&LaunchQuery {
            list: Some("All".into()),
            ..Default::default()
        })
        .unwrap();
    assert_eq!(all.len(), LAUNCHES_JSON.len());
    assert!(all.windows(2).all(|w| w[0].launch_date <= w[1].launch_date));

    let in_list = store.launches_in_list("Latest").unwrap();
    assert_eq!(in_list.len(), 1);
    assert_eq!(in_list[0].name, "Starlink 4-11 (v1.5)");

    let upcoming = store.find_list("Upcoming").unwrap().unwrap();
    assert_eq!(upcoming.launch_count, 0);
}

// =============================================================================
// Sync Against a Local Server
// =============================================================================

/// Answer `requests` HTTP requests, choosing the body by request path
fn serve_feeds(requests: usize) -> (String, thread::JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let launches = read_fixture("launches.json");
    let latest = read_fixture("latest.json");

    let handle = thread::spawn(move || {
        let mut paths = Vec::new();
        for _ in 0..requests {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
            }

            let path = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
            let (status, body) = match path.as_str() {
                "/v5/launches" | "/v5/launches/past" => ("200 OK", launches.as_str()),
                "/v5/launches/latest" => ("200 OK", latest.as_str()),
                _ => ("404 Not Found", "{}"),
            };
            write!(
                stream,
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            )
            .unwrap();
            paths.push(path);
        }
        paths
    });

    (format!("http://{addr}/v5"), handle)
}

#[test]
fn test_sync_then_offline_resync() {
    let (base_url, server) = serve_feeds(Feed::ALL.len());
    let cache_dir = tempfile::tempdir().unwrap();
    let cache = ResponseCache::new(Some(cache_dir.path().to_path_buf())).unwrap();

    let config = ApiConfig {
        base_url,
        ..ApiConfig::default()
    };
    let mut client = SpaceXClient::new(&config).unwrap().with_cache(cache.clone());

    let mut store = Store::open_in_memory().unwrap();
    let report = sync(&mut store, &mut client, &Feed::ALL, &mut SilentUi::new()).unwrap();

    let paths = server.join().unwrap();
    assert_eq!(
        paths,
        vec!["/v5/launches", "/v5/launches/upcoming", "/v5/launches/past", "/v5/launches/latest"]
    );

    let failed: Vec<Feed> = report.failed().map(|(feed, _)| feed).collect();
    assert_eq!(failed, vec![Feed::Upcoming]);
    assert!(!cache.is_cached(Feed::Upcoming));
    assert!(cache.is_cached(Feed::Latest));

    // Offline resync sees the same feeds, and the upcoming miss again
    let mut offline_store = Store::open_in_memory().unwrap();
    let offline = sync(
        &mut offline_store,
        &mut CachedSource::new(cache),
        &Feed::ALL,
        &mut SilentUi::new(),
    )
    .unwrap();
    assert_eq!(offline.total_launches(), report.total_launches());
    assert_eq!(offline.failed().count(), 1);
    assert_eq!(offline_store.table_counts().unwrap(), store.table_counts().unwrap());
}

#[test]
fn test_all_tables_summary() {
    let conn = get_test_db();
    println!("\n{:<24} {:>8}", "table", "rows");
    for table in ALL_TABLES {
        let count: i64 = conn
            .query_row(&format!("SELECT COUNT(*) FROM {}", table.name), [], |row| row.get(0))
            .unwrap();
        println!("{:<24} {:>8}", table.name, count);
    }
}
