//! Reads forecast files and groups their rows by location.

use crate::error::{LoadError, RecordError};
use crate::keyed_map::KeyedMap;
use crate::record::WeatherRecord;
use log::{info, warn};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Rows parsed from one input, in file order.
#[derive(Debug, Default)]
pub struct ParsedRecords {
    pub records: Vec<WeatherRecord>,
    /// Data lines that could not be parsed and were left out.
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadSummary {
    pub records: usize,
    pub locations: usize,
    pub skipped: usize,
}

/// Parses every data line of `input`. The first line is a header; blank
/// lines are ignored and malformed ones, including lines that are not
/// UTF-8, are logged and counted. Only I/O failures abort the read.
pub fn read_records<R: BufRead>(input: R) -> Result<ParsedRecords, LoadError> {
    let mut parsed = ParsedRecords::default();
    for (index, line) in input.split(b'\n').enumerate() {
        let line_no = index + 1;
        let mut line = line.map_err(|source| LoadError::Read {
            line: line_no,
            source,
        })?;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line_no == 1 || line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        match parse_line(line, line_no) {
            Ok(record) => parsed.records.push(record),
            Err(e) => {
                warn!("skipping record: {}", e);
                parsed.skipped += 1;
            }
        }
    }
    Ok(parsed)
}

fn parse_line(bytes: Vec<u8>, line_no: usize) -> Result<WeatherRecord, RecordError> {
    let line = String::from_utf8(bytes).map_err(|_| RecordError::InvalidUtf8 { line: line_no })?;
    WeatherRecord::parse(&line, line_no)
}

/// Appends each record to the sequence stored under its location key,
/// creating the sequence on first sight. Returns how many new locations
/// were added.
pub fn group_by_location<M, I>(map: &mut M, records: I) -> usize
where
    M: KeyedMap<String, Vec<WeatherRecord>> + ?Sized,
    I: IntoIterator<Item = WeatherRecord>,
{
    let mut added = 0;
    for record in records {
        let key = record.location_key();
        match map.search_mut(&key) {
            Ok(sequence) => sequence.push(record),
            Err(_) => {
                map.insert(key, vec![record]);
                added += 1;
            }
        }
    }
    added
}

/// Reads `path` and groups its records into `map`.
pub fn load_forecasts<M>(path: &Path, map: &mut M) -> Result<LoadSummary, LoadError>
where
    M: KeyedMap<String, Vec<WeatherRecord>> + ?Sized,
{
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed = read_records(BufReader::new(file))?;
    let records = parsed.records.len();
    group_by_location(map, parsed.records);
    let summary = LoadSummary {
        records,
        locations: map.len(),
        skipped: parsed.skipped,
    };
    info!(
        "loaded {} records for {} locations from {} ({} skipped)",
        summary.records,
        summary.locations,
        path.display(),
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FIELD_NAMES;
    use crate::{ChainedHashMap, RedBlackTreeMap};
    use std::io::Cursor;

    const CSV: &str = "\
city,state_name,lat,lng,population,timezone,validTime,temp,chance_rain,snow_amt,wind_dir,wind_spd,vis,rel_humid
Austin,Texas,30.3,-97.7,1687311,America/Chicago, 2024-03-15 12:00, 71, 10, 0, 180, 12, 10, 45
Austin,Texas,30.3,-97.7,1687311,America/Chicago, 2024-03-15 18:00, 68, 20, 0, 190, 9, 10, 50

Boston,Massachusetts,42.3,-71.0,675647,America/New_York, 2024-03-15 12:00, 41, 60, 1, 90, 15, 5, 80
broken,line
";

    #[test]
    fn header_blank_and_malformed_lines_are_skipped() {
        let parsed = read_records(Cursor::new(CSV)).unwrap();
        assert_eq!(parsed.records.len(), 3);
        assert_eq!(parsed.skipped, 1);
        assert_eq!(parsed.records[2].city, "Boston");
    }

    #[test]
    fn non_utf8_row_is_skipped_and_later_rows_load() {
        let mut input = Vec::new();
        input.extend_from_slice(FIELD_NAMES.join(",").as_bytes());
        input.extend_from_slice(b"\r\n");
        input.extend_from_slice(
            b"Austin,Texas,30.3,-97.7,1,America/Chicago, 2024-03-15 12:00, 71, 10, 0, 180, 12, 10, 45\r\n",
        );
        input.extend_from_slice(
            b"Caf\xe9,XX,0,0,1,America/Chicago, 2024-03-15 12:00, 60, 0, 0, 0, 0, 10, 50\n",
        );
        input.extend_from_slice(
            b"Boston,Massachusetts,42.3,-71.0,1,America/New_York, 2024-03-15 12:00, 41, 60, 1, 90, 15, 5, 80\n",
        );

        let parsed = read_records(Cursor::new(input)).unwrap();
        assert_eq!(parsed.skipped, 1);
        let cities: Vec<&str> = parsed.records.iter().map(|r| r.city.as_str()).collect();
        assert_eq!(cities, vec!["Austin", "Boston"]);
        assert_eq!(parsed.records[0].rel_humid, "45");
    }

    #[test]
    fn grouping_keeps_file_order_per_location() {
        let parsed = read_records(Cursor::new(CSV)).unwrap();
        let mut map: ChainedHashMap<String, Vec<WeatherRecord>> = ChainedHashMap::new();
        assert_eq!(group_by_location(&mut map, parsed.records), 2);
        assert_eq!(map.len(), 2);
        let austin = map.search("Austin,Texas").unwrap();
        let times: Vec<&str> = austin.iter().map(|r| r.display_time()).collect();
        assert_eq!(times, vec!["15 12:00", "15 18:00"]);
    }

    /// Scenario: a second record for a known location extends its sequence
    /// without adding a key.
    #[test]
    fn repeated_location_grows_sequence_not_key_count() {
        let mut map: RedBlackTreeMap<String, Vec<WeatherRecord>> = RedBlackTreeMap::new();
        let record = WeatherRecord {
            city: "Austin".to_string(),
            state: "TX".to_string(),
            ..Default::default()
        };
        group_by_location(&mut map, [record.clone()]);
        assert_eq!(map.len(), 1);
        assert_eq!(group_by_location(&mut map, [record]), 0);
        assert_eq!(map.len(), 1);
        assert_eq!(map.search("Austin,TX").unwrap().len(), 2);
    }
}
