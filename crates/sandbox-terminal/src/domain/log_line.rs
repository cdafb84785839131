//! Broker console log synthesis
//!
//! Lines mimic what `mosquitto -v` writes for an incoming publish:
//!
//! ```text
//! 1700000000: Received PUBLISH from auto-1a2b3c4d (d0, q0, r0, m0, 'test/hello', ... (2 bytes))
//! ```

use chrono::{DateTime, Utc};
use sandbox_bus::PublishedEvent;

/// Printed when a log follow starts.
pub const LOG_HEADER: &str = "==> /var/log/mosquitto/mosquitto.log <==";

/// Broker version reported in start-up lines.
pub const BROKER_VERSION: &str = "2.0.18";

/// Log line for one publish.
pub fn format_publish(event: &PublishedEvent) -> String {
    format!(
        "{}: Received PUBLISH from {} (d0, q0, r{}, m0, '{}', ... ({} bytes))",
        event.timestamp.timestamp(),
        event.source,
        u8::from(event.retained),
        event.topic,
        event.payload_len()
    )
}

/// Lines the broker writes when it starts.
pub fn startup_lines(at: DateTime<Utc>) -> Vec<String> {
    let secs = at.timestamp();
    [
        format!("mosquitto version {BROKER_VERSION} starting"),
        "Config loaded from /etc/mosquitto/mosquitto.conf.".to_string(),
        "Opening ipv4 listen socket on port 1883.".to_string(),
        "Opening ipv6 listen socket on port 1883.".to_string(),
        format!("mosquitto version {BROKER_VERSION} running"),
    ]
    .into_iter()
    .map(|message| format!("{secs}: {message}"))
    .collect()
}
