//! One forecast row and its parser.

use crate::error::RecordError;

/// Column names in file order.
pub const FIELD_NAMES: [&str; 14] = [
    "city",
    "state_name",
    "lat",
    "lng",
    "population",
    "timezone",
    "validTime",
    "temp",
    "chance_rain",
    "snow_amt",
    "wind_dir",
    "wind_spd",
    "vis",
    "rel_humid",
];

/// Characters of `valid_time` (`YYYY-MM-`) hidden by [`WeatherRecord::display_time`].
const DATE_PREFIX_LEN: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WeatherRecord {
    pub city: String,
    pub state: String,
    pub lat: String,
    pub lng: String,
    pub population: String,
    pub timezone: String,
    pub valid_time: String,
    pub temp: String,
    pub chance_rain: String,
    pub snow_amt: String,
    pub wind_dir: String,
    pub wind_speed: String,
    pub visibility: String,
    pub rel_humid: String,
}

impl WeatherRecord {
    /// Parses one comma-separated data line. `line_no` is only used for
    /// error reporting. The final field takes the remainder of the line.
    pub fn parse(line: &str, line_no: usize) -> Result<Self, RecordError> {
        let mut fields = line.splitn(FIELD_NAMES.len(), ',');
        let mut next = |index: usize| {
            fields.next().ok_or(RecordError::MissingField {
                line: line_no,
                field: FIELD_NAMES[index],
            })
        };
        let location = |s: &str| s.to_string();
        let measurement = |s: &str| s.trim_start().to_string();

        Ok(Self {
            city: location(next(0)?),
            state: location(next(1)?),
            lat: location(next(2)?),
            lng: location(next(3)?),
            population: location(next(4)?),
            timezone: location(next(5)?),
            valid_time: measurement(next(6)?),
            temp: measurement(next(7)?),
            chance_rain: measurement(next(8)?),
            snow_amt: measurement(next(9)?),
            wind_dir: measurement(next(10)?),
            wind_speed: measurement(next(11)?),
            visibility: measurement(next(12)?),
            rel_humid: measurement(next(13)?),
        })
    }

    /// Grouping key: `"{city},{state}"`, the same form users type at the prompt.
    pub fn location_key(&self) -> String {
        format!("{},{}", self.city, self.state)
    }

    /// `valid_time` without its year and month, e.g. `"15 12:00"`.
    pub fn display_time(&self) -> &str {
        self.valid_time
            .char_indices()
            .nth(DATE_PREFIX_LEN)
            .map_or(self.valid_time.as_str(), |(i, _)| &self.valid_time[i..])
    }
}
