// End to end: CSV on disk -> grouped container -> lookup session.
//
// Every test runs against both backends through `KeyedMap` trait objects;
// the observable behavior must not depend on which container is used.
use forecast_index::reader::{load_forecasts, LoadSummary};
use forecast_index::repl::{Repl, NOT_FOUND};
use forecast_index::table::TablePrinter;
use forecast_index::{ChainedHashMap, KeyedMap, LoadError, RedBlackTreeMap, WeatherRecord};
use rstest::rstest;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::NamedTempFile;

type Forecasts = Box<dyn KeyedMap<String, Vec<WeatherRecord>>>;

const HEADER: &str = "city,state_name,lat,lng,population,timezone,validTime,temp,chance_rain,snow_amt,wind_dir,wind_spd,vis,rel_humid";

fn row(city: &str, state: &str, time: &str, temp: u32) -> String {
    format!("{city},{state},1.0,2.0,1000,America/Chicago, {time}, {temp}, 10, 0, 180, 12, 10, 45")
}

fn forecast_file(rows: &[String]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{HEADER}").unwrap();
    for r in rows {
        writeln!(file, "{r}").unwrap();
    }
    file.flush().unwrap();
    file
}

fn hash_backend() -> Forecasts {
    Box::new(ChainedHashMap::new())
}

fn tree_backend() -> Forecasts {
    Box::new(RedBlackTreeMap::new())
}

// Test: grouping by location.
// Verifies: rows for the same location share one key and keep file order;
// the summary counts rows and distinct locations.
#[rstest]
#[case::hash(hash_backend())]
#[case::tree(tree_backend())]
fn rows_are_grouped_by_location(#[case] mut forecasts: Forecasts) {
    let file = forecast_file(&[
        row("Austin", "Texas", "2024-03-15 12:00", 71),
        row("Boston", "Massachusetts", "2024-03-15 12:00", 41),
        row("Austin", "Texas", "2024-03-15 18:00", 68),
    ]);
    let summary = load_forecasts(file.path(), &mut *forecasts).unwrap();
    assert_eq!(
        summary,
        LoadSummary {
            records: 3,
            locations: 2,
            skipped: 0
        }
    );

    let austin = forecasts.search(&"Austin,Texas".to_string()).unwrap();
    let temps: Vec<&str> = austin.iter().map(|r| r.temp.as_str()).collect();
    assert_eq!(temps, vec!["71", "68"]);
}

// Test: enough locations to push the hash backend through several growths.
#[rstest]
#[case::hash(hash_backend())]
#[case::tree(tree_backend())]
fn many_locations_all_resolve(#[case] mut forecasts: Forecasts) {
    let rows: Vec<String> = (0..200)
        .flat_map(|i| {
            let city = format!("City{i}");
            [
                row(&city, "Texas", "2024-03-15 12:00", i),
                row(&city, "Texas", "2024-03-16 12:00", i + 1),
            ]
        })
        .collect();
    let file = forecast_file(&rows);
    let summary = load_forecasts(file.path(), &mut *forecasts).unwrap();
    assert_eq!(summary.records, 400);
    assert_eq!(summary.locations, 200);
    for i in 0..200 {
        let records = forecasts.search(&format!("City{i},Texas")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].display_time(), "16 12:00");
    }
}

#[rstest]
#[case::hash(hash_backend())]
#[case::tree(tree_backend())]
fn malformed_rows_are_counted(#[case] mut forecasts: Forecasts) {
    let file = forecast_file(&[
        row("Austin", "Texas", "2024-03-15 12:00", 71),
        "Nowhere,XX,1.0".to_string(),
    ]);
    let summary = load_forecasts(file.path(), &mut *forecasts).unwrap();
    assert_eq!(summary.records, 1);
    assert_eq!(summary.skipped, 1);
    assert!(!forecasts.contains(&"Nowhere,XX".to_string()));
}

// Test: one undecodable row in the middle of a file.
// Verifies: it is skipped like a short row and the rows after it still load.
#[rstest]
#[case::hash(hash_backend())]
#[case::tree(tree_backend())]
fn non_utf8_row_is_skipped(#[case] mut forecasts: Forecasts) {
    let mut file = forecast_file(&[row("Austin", "Texas", "2024-03-15 12:00", 71)]);
    file.write_all(b"Caf\xe9,XX,1.0,2.0,1000,America/Chicago, 2024-03-15 12:00, 60, 0, 0, 0, 0, 10, 50\n")
        .unwrap();
    writeln!(file, "{}", row("Boston", "Massachusetts", "2024-03-15 12:00", 41)).unwrap();
    file.flush().unwrap();

    let summary = load_forecasts(file.path(), &mut *forecasts).unwrap();
    assert_eq!(summary.records, 2);
    assert_eq!(summary.skipped, 1);
    assert!(forecasts.contains(&"Boston,Massachusetts".to_string()));
}

#[test]
fn missing_file_reports_path() {
    let mut forecasts = hash_backend();
    let path = Path::new("/definitely/not/here.csv");
    match load_forecasts(path, &mut *forecasts) {
        Err(LoadError::Open { path: p, .. }) => assert_eq!(p, path),
        other => panic!("expected open error, got {other:?}"),
    }
    assert!(forecasts.is_empty());
}

// Test: a full lookup session over loaded data.
// Verifies: hits print a header and one row per record, misses print the
// not-available line, and EXIT ends the session.
#[rstest]
#[case::hash(hash_backend())]
#[case::tree(tree_backend())]
fn lookup_session(#[case] mut forecasts: Forecasts) {
    let file = forecast_file(&[
        row("Austin", "Texas", "2024-03-15 12:00", 71),
        row("Austin", "Texas", "2024-03-15 18:00", 68),
    ]);
    load_forecasts(file.path(), &mut *forecasts).unwrap();

    let repl = Repl::new(&*forecasts, TablePrinter::default());
    let mut out = Vec::new();
    repl.run(Cursor::new("Austin,Texas\nAustin,TX\nEXIT\n"), &mut out)
        .unwrap();
    let text = String::from_utf8(out).unwrap();

    assert!(text.contains("Time           Temp           Chance_rain"));
    assert!(text.contains("15 12:00       71             10"));
    assert!(text.contains("15 18:00       68             10"));
    assert_eq!(text.matches(NOT_FOUND).count(), 1);
    assert!(text.ends_with("> Goodbye!\n"));
}
