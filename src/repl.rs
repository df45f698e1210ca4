//! Interactive lookup loop: read a location, print its forecast table.

use crate::keyed_map::KeyedMap;
use crate::record::WeatherRecord;
use crate::table::TablePrinter;
use log::debug;
use std::io::{self, BufRead, Write};

/// Input line that ends the session.
pub const EXIT_SENTINEL: &str = "EXIT";

pub const PROMPT: &str = "> ";
pub const NOT_FOUND: &str = "City Not Available";

pub struct Repl<'a, M: ?Sized> {
    forecasts: &'a M,
    printer: TablePrinter,
}

impl<'a, M> Repl<'a, M>
where
    M: KeyedMap<String, Vec<WeatherRecord>> + ?Sized,
{
    pub fn new(forecasts: &'a M, printer: TablePrinter) -> Self {
        Self { forecasts, printer }
    }

    /// Runs until the sentinel line or end of input.
    pub fn run<R: BufRead, W: Write>(&self, mut input: R, mut out: W) -> io::Result<()> {
        writeln!(out, "\nWelcome!")?;
        writeln!(
            out,
            "Please enter city and state names in the following format: city_name,state_name\n"
        )?;

        let mut line = Vec::new();
        loop {
            write!(out, "{PROMPT}")?;
            out.flush()?;

            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                debug!("input closed, leaving lookup loop");
                writeln!(out)?;
                return Ok(());
            }
            // Bytes that are not UTF-8 become U+FFFD and simply miss.
            let text = String::from_utf8_lossy(&line);
            let query = text.trim_end_matches(&['\n', '\r'][..]);

            if query == EXIT_SENTINEL {
                writeln!(out, "Goodbye!")?;
                return Ok(());
            }
            self.answer(query, &mut out)?;
        }
    }

    fn answer<W: Write>(&self, query: &str, out: &mut W) -> io::Result<()> {
        let key = query.to_string();
        if !self.forecasts.contains(&key) {
            return writeln!(out, "{NOT_FOUND}");
        }
        match self.forecasts.search(&key) {
            Ok(records) => self.printer.write_table(out, records),
            Err(_) => writeln!(out, "{NOT_FOUND}"),
        }
    }
}
