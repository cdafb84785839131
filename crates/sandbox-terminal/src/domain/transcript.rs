//! Fixed console transcripts
//!
//! Text for the commands that only print: the service status block, the
//! help summary, and the Node-RED install and start-up consoles.

use super::ContextTheme;
use chrono::{DateTime, Duration, Utc};

/// Node-RED release reported by the simulated install and start-up.
pub const NODE_RED_VERSION: &str = "3.1.9";

/// Output of `systemctl status mosquitto`.
pub fn status_block() -> Vec<String> {
    [
        "● mosquitto.service - Mosquitto MQTT Broker",
        "     Loaded: loaded (/lib/systemd/system/mosquitto.service; enabled; vendor preset: enabled)",
        "     Active: active (running) since Mon 2024-01-15 09:00:00 UTC; 2h 14min ago",
        "       Docs: man:mosquitto.conf(5)",
        "             man:mosquitto(8)",
        "   Main PID: 812 (mosquitto)",
        "      Tasks: 1 (limit: 4915)",
        "        CPU: 1.204s",
        "     CGroup: /system.slice/mosquitto.service",
        "             └─812 /usr/sbin/mosquitto -c /etc/mosquitto/mosquitto.conf",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

struct HelpEntry {
    usage: &'static str,
    summary: &'static str,
    mutating: bool,
}

const BROKER_HELP: &[HelpEntry] = &[
    HelpEntry {
        usage: "mosquitto_pub -t <topic> -m <message> [-r]",
        summary: "publish a message (-n for an empty one)",
        mutating: true,
    },
    HelpEntry {
        usage: "mosquitto_sub -t <filter> [-v] [-C <count>]",
        summary: "subscribe; + and # are wildcards",
        mutating: true,
    },
    HelpEntry {
        usage: "mosquitto_rr -t <topic> -e <response> -m <message> [-W <ms>]",
        summary: "send a request and wait for one reply",
        mutating: true,
    },
    HelpEntry {
        usage: "systemctl status mosquitto",
        summary: "show the broker service status",
        mutating: false,
    },
    HelpEntry {
        usage: "tail -f /var/log/mosquitto/mosquitto.log",
        summary: "follow the broker log (Ctrl-C to stop)",
        mutating: false,
    },
];

const NODE_RED_HELP: &[HelpEntry] = &[
    HelpEntry {
        usage: "sudo npm install -g --unsafe-perm node-red",
        summary: "install Node-RED",
        mutating: false,
    },
    HelpEntry {
        usage: "node-red [-p <port>]",
        summary: "start Node-RED (Ctrl-C to stop)",
        mutating: false,
    },
];

/// Output of `help` for a terminal.
///
/// Commands rejected by the read-only policy are left out when `read_only`
/// is set.
pub fn help_lines(theme: ContextTheme, read_only: bool) -> Vec<String> {
    let sections: &[&[HelpEntry]] = match theme {
        ContextTheme::Primary => &[BROKER_HELP],
        ContextTheme::Secondary => &[NODE_RED_HELP, BROKER_HELP],
    };

    let mut lines = vec!["Available commands:".to_string()];
    lines.extend(
        sections
            .iter()
            .flat_map(|section| section.iter())
            .filter(|entry| !(read_only && entry.mutating))
            .map(|entry| format!("  {:<62} {}", entry.usage, entry.summary)),
    );
    lines.push("  clear".to_string());
    lines
}

/// Output of `npm install -g node-red`, one line per narration step.
pub fn npm_install_lines() -> Vec<String> {
    [
        "npm WARN deprecated inflight@1.0.6: This module is not supported, and leaks memory.",
        "npm WARN deprecated glob@7.2.3: Glob versions prior to v9 are no longer supported",
        "",
        "added 301 packages in 24s",
        "",
        "48 packages are looking for funding",
        "  run `npm fund` for details",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

/// Output of `node-red`, one line per narration step.
///
/// Line `i` is printed `i * step_ms` after `started`, and its log timestamp
/// says so.
pub fn node_red_startup_lines(port: u16, started: DateTime<Utc>, step_ms: u64) -> Vec<String> {
    let banner = [
        "Welcome to Node-RED".to_string(),
        "===================".to_string(),
        String::new(),
    ];
    let messages = [
        format!("Node-RED version: v{NODE_RED_VERSION}"),
        "Node.js  version: v18.19.0".to_string(),
        "Linux 6.1.0-rpi7-rpi-v8 arm64 LE".to_string(),
        "Loading palette nodes".to_string(),
        "Settings file  : /home/pi/.node-red/settings.js".to_string(),
        "Context store  : 'default' [module=memory]".to_string(),
        "User directory : /home/pi/.node-red".to_string(),
        "Flows file     : /home/pi/.node-red/flows.json".to_string(),
        format!("Server now running at http://127.0.0.1:{port}/"),
        "Starting flows".to_string(),
        "Started flows".to_string(),
    ];

    let offset = banner.len();
    let logged = messages.into_iter().enumerate().map(|(i, message)| {
        let step = i64::try_from(((offset + i) as u64).saturating_mul(step_ms)).unwrap_or(i64::MAX);
        let at = started + Duration::milliseconds(step);
        format!("{} - [info] {message}", at.format("%-d %b %H:%M:%S"))
    });

    banner.into_iter().chain(logged).collect()
}
