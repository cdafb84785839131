//! # Integration Test Flows
//!
//! Several terminals sharing one sandbox bus, the responder, the broker log
//! and the logical clock.
//!
//! ## Flows Tested:
//!
//! 1. **Terminal → Terminal**: a round trip answered by another terminal
//! 2. **Terminal → Log follower**: requests and replies appear in a follow
//! 3. **Isolation**: separate sandboxes never see each other's traffic
//! 4. **Concurrency**: count limits hold while several threads publish

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{DateTime, Utc};
    use proptest::prelude::*;
    use sandbox_bus::{EventPublisher, ManualClock};
    use sandbox_terminal::{
        ContextTheme, SandboxConfig, SandboxConfigBuilder, SandboxContainer, SessionPhase,
        TerminalApi, RESPONDER_CLIENT_ID,
    };

    // =========================================================================
    // TEST FIXTURES
    // =========================================================================

    fn sandbox_with(config: SandboxConfig) -> SandboxContainer {
        let clock = Arc::new(ManualClock::with_origin(DateTime::<Utc>::UNIX_EPOCH));
        SandboxContainer::with_clock(config, clock).expect("valid config")
    }

    fn sandbox() -> SandboxContainer {
        sandbox_with(SandboxConfig::default())
    }

    // =========================================================================
    // TERMINAL → TERMINAL
    // =========================================================================

    #[test]
    fn test_round_trip_answered_by_other_terminal() {
        let sandbox = sandbox();
        let controller = sandbox.open_terminal(ContextTheme::Primary);
        let device = sandbox.open_terminal(ContextTheme::Secondary);

        device.execute("mosquitto_sub -t devices/lamp -v");
        controller.execute("mosquitto_rr -t devices/lamp -e devices/lamp/state -m on");

        // The device sees the request, the controller is waiting
        assert_eq!(device.lines().last().map(String::as_str), Some("devices/lamp on"));
        assert_eq!(controller.phase(), SessionPhase::AwaitingResponse { pending: 1 });

        // The device answers by hand
        device.execute("mosquitto_pub -t devices/lamp/state -m ON");
        assert_eq!(controller.lines(), vec!["ON"]);

        sandbox.run_until_idle();
        assert_eq!(controller.lines(), vec!["ON"]);
        assert_eq!(controller.phase(), SessionPhase::Idle);
    }

    #[test]
    fn test_custom_responder_topics() {
        let config = SandboxConfigBuilder::new()
            .responder_topics(["devices/+/cmd"])
            .responder_delay_ms(50)
            .default_wait_ms(1_000)
            .build()
            .expect("valid");
        let sandbox = sandbox_with(config);
        let terminal = sandbox.open_terminal(ContextTheme::Primary);

        terminal.execute("mosquitto_rr -t devices/pump/cmd -e devices/pump/reply -m status");
        terminal.execute("mosquitto_rr -t requests/x -e replies/x -m get");
        sandbox.run_until_idle();

        assert_eq!(
            terminal.lines(),
            vec![
                "RUN",
                "Timed out after 1000ms waiting for a response on replies/x",
            ]
        );
    }

    #[test]
    fn test_subscriber_sees_request_and_reply() {
        let sandbox = sandbox();
        let requester = sandbox.open_terminal(ContextTheme::Primary);
        let observer = sandbox.open_terminal(ContextTheme::Primary);

        observer.execute("mosquitto_sub -t '#' -v");
        requester.execute("mosquitto_rr -t requests/valve -e replies/valve -m '  Open Now '");
        sandbox.advance(500);

        assert_eq!(
            observer.lines(),
            vec![
                "Subscribed to #",
                "requests/valve   Open Now ",
                "replies/valve ACK Open Now",
            ]
        );
        assert_eq!(requester.lines(), vec!["ACK Open Now"]);
    }

    // =========================================================================
    // TERMINAL → LOG FOLLOWER
    // =========================================================================

    #[test]
    fn test_follower_sees_request_then_responder_reply() {
        let sandbox = sandbox();
        let follower = sandbox.open_terminal(ContextTheme::Primary);
        let requester = sandbox.open_terminal(ContextTheme::Primary);

        follower.execute("journalctl -u mosquitto -f");
        let header_lines = follower.lines().len();

        requester.execute("mosquitto_rr -t requests/x -e replies/x -m get");
        sandbox.advance(500);

        let streamed = &follower.lines()[header_lines..];
        assert_eq!(streamed.len(), 2);
        assert_eq!(
            streamed[0],
            format!(
                "0: Received PUBLISH from {} (d0, q0, r0, m0, 'requests/x', ... (3 bytes))",
                requester.client_id()
            )
        );
        assert_eq!(
            streamed[1],
            format!(
                "0: Received PUBLISH from {RESPONDER_CLIENT_ID} (d0, q0, r0, m0, 'replies/x', ... (3 bytes))"
            )
        );
    }

    #[test]
    fn test_late_follower_replays_recent_history() {
        let config = SandboxConfigBuilder::new()
            .follow_backlog(2)
            .build()
            .expect("valid");
        let sandbox = sandbox_with(config);
        let publisher = sandbox.open_terminal(ContextTheme::Primary);
        for i in 0..5 {
            publisher.execute(&format!("mosquitto_pub -t history/{i} -m x"));
        }

        let follower = sandbox.open_terminal(ContextTheme::Primary);
        follower.execute("tail -f /var/log/mosquitto/mosquitto.log");

        let lines = follower.lines();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("'history/3'"));
        assert!(lines[2].contains("'history/4'"));
    }

    #[test]
    fn test_subscription_line_precedes_follow_line() {
        let sandbox = sandbox();
        let terminal = sandbox.open_terminal(ContextTheme::Primary);

        terminal.execute("mosquitto_sub -t a");
        terminal.execute("tail -f /var/log/mosquitto/mosquitto.log");
        let before = terminal.lines().len();

        terminal.execute("mosquitto_pub -t a -m payload");

        let lines = terminal.lines();
        assert_eq!(lines.len(), before + 2);
        assert_eq!(lines[before], "payload");
        assert!(lines[before + 1].contains("Received PUBLISH"));
    }

    // =========================================================================
    // ISOLATION
    // =========================================================================

    #[test]
    fn test_sandboxes_do_not_share_a_bus() {
        let first = sandbox();
        let second = sandbox();
        let listener = first.open_terminal(ContextTheme::Primary);
        let talker = second.open_terminal(ContextTheme::Primary);

        listener.execute("mosquitto_sub -t '#'");
        talker.execute("mosquitto_pub -t a -m hi");

        assert_eq!(listener.lines(), vec!["Subscribed to #"]);
        assert_eq!(first.bus().events_published(), 0);
        assert_eq!(second.bus().events_published(), 1);
    }

    // =========================================================================
    // CONCURRENCY
    // =========================================================================

    #[test]
    fn test_count_limit_holds_under_concurrent_publishers() {
        let sandbox = sandbox();
        let subscriber = sandbox.open_terminal(ContextTheme::Primary);
        subscriber.execute("mosquitto_sub -t load/# -C 50");

        let publishers: Vec<_> = (0..4)
            .map(|_| sandbox.open_terminal(ContextTheme::Primary))
            .collect();

        std::thread::scope(|scope| {
            for (n, publisher) in publishers.iter().enumerate() {
                scope.spawn(move || {
                    for i in 0..25 {
                        publisher.execute(&format!("mosquitto_pub -t load/{n} -m {i}"));
                    }
                });
            }
        });

        let lines = subscriber.lines();
        // Confirmation, 50 deliveries, one removal notice
        assert_eq!(lines.len(), 52);
        assert_eq!(
            lines.last().map(String::as_str),
            Some("Unsubscribed from load/# after 50 message(s)")
        );
        assert_eq!(sandbox.bus().events_published(), 100);
    }

    #[tokio::test]
    async fn test_clock_driven_from_async_task() {
        let sandbox = Arc::new(sandbox());
        let terminal = sandbox.open_terminal(ContextTheme::Primary);
        terminal.execute("mosquitto_rr -t requests/x -e replies/x -m start");

        let driver = {
            let sandbox = sandbox.clone();
            tokio::spawn(async move {
                for _ in 0..5 {
                    sandbox.advance(100);
                    tokio::task::yield_now().await;
                }
            })
        };
        driver.await.expect("clock driver");

        assert_eq!(terminal.lines(), vec!["STARTED"]);
    }

    // =========================================================================
    // PROPERTIES
    // =========================================================================

    proptest! {
        #[test]
        fn prop_count_limit_caps_deliveries(
            limit in 1u32..6,
            topics in proptest::collection::vec(prop_oneof![Just("s/a"), Just("s/b"), Just("t")], 0..15),
        ) {
            let sandbox = sandbox();
            let terminal = sandbox.open_terminal(ContextTheme::Primary);
            terminal.execute(&format!("mosquitto_sub -t s/+ -C {limit}"));

            for topic in &topics {
                terminal.execute(&format!("mosquitto_pub -t {topic} -m x"));
            }

            let matching = topics.iter().filter(|t| t.starts_with("s/")).count();
            let expected = matching.min(limit as usize);
            let lines = terminal.lines();
            prop_assert_eq!(lines.iter().filter(|l| l.as_str() == "x").count(), expected);

            let notices = lines.iter().filter(|l| l.starts_with("Unsubscribed")).count();
            prop_assert_eq!(notices, usize::from(matching >= limit as usize));
        }
    }
}
