//! Fixed-width console rendering of forecast rows.

use crate::record::WeatherRecord;
use std::io::{self, Write};

pub const DEFAULT_COLUMN_WIDTH: usize = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Time,
    Temp,
    ChanceRain,
    SnowAmt,
    WindDir,
    WindSpeed,
    Visibility,
    RelHumid,
}

pub const DEFAULT_COLUMNS: [Column; 8] = [
    Column::Time,
    Column::Temp,
    Column::ChanceRain,
    Column::SnowAmt,
    Column::WindDir,
    Column::WindSpeed,
    Column::Visibility,
    Column::RelHumid,
];

impl Column {
    pub fn header(self) -> &'static str {
        match self {
            Column::Time => "Time",
            Column::Temp => "Temp",
            Column::ChanceRain => "Chance_rain",
            Column::SnowAmt => "Snow_amt",
            Column::WindDir => "Wind_dir",
            Column::WindSpeed => "Wind_speed",
            Column::Visibility => "Visibility",
            Column::RelHumid => "Rel_Humid",
        }
    }

    pub fn value(self, record: &WeatherRecord) -> &str {
        match self {
            Column::Time => record.display_time(),
            Column::Temp => &record.temp,
            Column::ChanceRain => &record.chance_rain,
            Column::SnowAmt => &record.snow_amt,
            Column::WindDir => &record.wind_dir,
            Column::WindSpeed => &record.wind_speed,
            Column::Visibility => &record.visibility,
            Column::RelHumid => &record.rel_humid,
        }
    }
}

/// Left-justified cells padded to `width`, no separators; values longer
/// than `width` are printed whole.
#[derive(Debug, Clone)]
pub struct TablePrinter {
    width: usize,
    columns: Vec<Column>,
}

impl Default for TablePrinter {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN_WIDTH, DEFAULT_COLUMNS.to_vec())
    }
}

impl TablePrinter {
    pub fn new(width: usize, columns: Vec<Column>) -> Self {
        Self { width, columns }
    }

    pub fn write_header<W: Write>(&self, out: &mut W) -> io::Result<()> {
        for column in &self.columns {
            write!(out, "{:<width$}", column.header(), width = self.width)?;
        }
        writeln!(out)
    }

    pub fn write_rows<W: Write>(&self, out: &mut W, records: &[WeatherRecord]) -> io::Result<()> {
        for record in records {
            for column in &self.columns {
                write!(out, "{:<width$}", column.value(record), width = self.width)?;
            }
            writeln!(out)?;
        }
        Ok(())
    }

    pub fn write_table<W: Write>(&self, out: &mut W, records: &[WeatherRecord]) -> io::Result<()> {
        self.write_header(out)?;
        self.write_rows(out, records)
    }
}
