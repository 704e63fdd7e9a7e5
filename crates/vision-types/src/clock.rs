//! Wall-clock labels and identifiers stamped onto events.

/// Local time label for event-log entries, e.g. `3:04:05 PM`.
pub fn time_label() -> String {
    chrono::Local::now().format("%-I:%M:%S %p").to_string()
}

/// RFC 3339 timestamp used for caption log entries.
pub fn rfc3339_now() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Fresh client-side event id.
pub fn new_event_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
