//! Agenda conflict detection.
//!
//! Times are compared as plain numbers (`"19:30"` becomes `1930`), and two
//! events at the same place on the same day conflict when those numbers are
//! less than [`CONFLICT_THRESHOLD`] apart. Midnight is not modelled, so
//! `23:50` and `00:05` are never flagged.

use chrono::{NaiveDate, NaiveTime};

use crate::models::{Event, EventConflict};

/// Maximum numeric distance between two `HHMM` keys that still conflicts.
pub const CONFLICT_THRESHOLD: i64 = 200;

/// Numeric key of a time string: the first `:` is dropped and the leading
/// digits parsed. `"19:00:30"` yields `1900`.
pub fn time_key(time: &str) -> Option<i64> {
    let joined = time.trim_start().replacen(':', "", 1);
    let digits: String = joined
        .chars()
        .enumerate()
        .take_while(|(i, c)| c.is_ascii_digit() || (*i == 0 && (*c == '-' || *c == '+')))
        .map(|(_, c)| c)
        .collect();
    digits.parse().ok()
}

/// Whether `time` is a valid `HH:MM` value.
pub fn is_valid_time(time: &str) -> bool {
    NaiveTime::parse_from_str(time, "%H:%M").is_ok()
}

/// Location an event is held at, falling back to the lodge's default.
pub fn resolve_location(location: Option<&str>, default_location: &str) -> String {
    match location.map(str::trim) {
        Some(loc) if !loc.is_empty() => loc.to_string(),
        _ => default_location.to_string(),
    }
}

fn same_location(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Existing events that clash with a candidate slot.
///
/// `exclude_id` skips the event being edited.
pub fn find_conflicts(
    date: NaiveDate,
    time: &str,
    location: Option<&str>,
    exclude_id: Option<&str>,
    events: &[Event],
    default_location: &str,
) -> Vec<EventConflict> {
    let Some(key) = time_key(time) else {
        return Vec::new();
    };
    let place = resolve_location(location, default_location);

    events
        .iter()
        .filter(|e| exclude_id != Some(e.id.as_str()))
        .filter(|e| e.date == date)
        .filter_map(|e| {
            let other_place = resolve_location(e.location.as_deref(), default_location);
            if !same_location(&place, &other_place) {
                return None;
            }
            let other_key = time_key(&e.time)?;
            ((key - other_key).abs() < CONFLICT_THRESHOLD).then(|| EventConflict {
                event_id: e.id.clone(),
                title: e.title.clone(),
                date: e.date,
                time: e.time.clone(),
                location: other_place,
            })
        })
        .collect()
}
