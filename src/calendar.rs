use std::sync::Mutex;

use chrono::NaiveDate;
use tracing::debug;

use crate::error::AppError;

pub const DATE_PARAM: &str = "date";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// What the calendar widget reports on change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSelection {
    Single(NaiveDate),
    Range(Option<NaiveDate>, Option<NaiveDate>),
}

/// Client-side navigation. Pushes are fire-and-forget.
pub trait Navigator: Send + Sync {
    fn push(&self, url: String);
}

/// Records every pushed URL; the last one is the current location.
#[derive(Debug, Default)]
pub struct QueryNavigator {
    pushed: Mutex<Vec<String>>,
}

impl QueryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<String> {
        self.pushed
            .lock()
            .map(|pushed| pushed.clone())
            .unwrap_or_default()
    }

    pub fn current(&self) -> Option<String> {
        self.history().pop()
    }

    /// The `date` value of the current location, if any.
    ///
    /// Only understands URLs built by `date_query`; values are not
    /// percent-decoded.
    pub fn current_date(&self) -> Option<String> {
        let url = self.current()?;
        let query = url.split_once('?').map(|(_, q)| q)?;
        query
            .split('&')
            .filter_map(|pair| pair.split_once('='))
            .find(|(key, _)| *key == DATE_PARAM)
            .map(|(_, value)| value.to_string())
    }
}

impl Navigator for QueryNavigator {
    fn push(&self, url: String) {
        if let Ok(mut pushed) = self.pushed.lock() {
            pushed.push(url);
        }
    }
}

pub fn date_query(date: NaiveDate) -> String {
    format!("?{}={}", DATE_PARAM, date.format(DATE_FORMAT))
}

/// Mirrors the selected day into the page query string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventCalendar {
    value: DateSelection,
}

impl EventCalendar {
    /// The calendar opens on `today` and publishes it straight away.
    pub fn mount(today: NaiveDate, navigator: &dyn Navigator) -> Self {
        let calendar = Self {
            value: DateSelection::Single(today),
        };
        calendar.bridge(navigator);
        calendar
    }

    pub fn value(&self) -> DateSelection {
        self.value
    }

    pub fn on_change(&mut self, selection: DateSelection, navigator: &dyn Navigator) {
        self.value = selection;
        self.bridge(navigator);
    }

    // Ranges are not bridged: the event list is keyed by one day.
    fn bridge(&self, navigator: &dyn Navigator) {
        match self.value {
            DateSelection::Single(date) => navigator.push(date_query(date)),
            DateSelection::Range(from, to) => {
                debug!("range selection {:?}..{:?} not bridged", from, to);
            }
        }
    }
}

/// First `date` value of a query string that may repeat the key.
pub fn first_date_param(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(key, _)| key == DATE_PARAM)
        .map(|(_, value)| value.as_str())
}

pub fn parse_date_param(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, AppError> {
    match raw.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(today),
        Some(value) => NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|_| AppError::BadRequest(format!("invalid date: {}", value))),
    }
}
