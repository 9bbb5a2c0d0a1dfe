//! Player session: connection status, stream attachment and retries.

use crate::helpers::*;
use cabin_radio::events::PlayerErrorKind;
use cabin_radio::prelude::*;
use cabin_radio::spatial::GraphState;
use std::time::Duration;

#[test]
fn test_start_requests_vehicle_info() {
    let mut fx = fixture();
    fx.engine.start();

    let out = fx.drain();
    assert_eq!(host_messages(&out), vec![HostMessage::RequestVehicleInfo]);
    assert!(ui_updates(&out).contains(&UiUpdate::ConnectionStatus {
        status: ConnectionStatus::Disconnected
    }));
}

#[test]
fn test_vehicle_changed_requests_vehicle_info() {
    let mut fx = fixture();
    fx.send(InboundEvent::VehicleChanged, Instant::now()).unwrap();

    assert_eq!(
        host_messages(&fx.drain()),
        vec![HostMessage::RequestVehicleInfo]
    );
}

#[test]
fn test_player_ready_attaches_stream() {
    let mut fx = fixture();
    fx.connect(Instant::now());

    assert!(fx.engine.is_connected());
    assert_eq!(fx.engine.status(), ConnectionStatus::Connected);
    assert!(fx.engine.graph().attached_source().is_some());
    assert_eq!(fx.engine.graph().state(), GraphState::Passthrough);
    assert!(fx.monitor.is_running());
    assert!(fx.engine.attach_retry_due().is_none());
}

#[test]
fn test_attach_retry_backoff_then_give_up() {
    let mut fx = fixture();
    let t0 = Instant::now();

    fx.send(InboundEvent::PlayerReady { device_id: None }, t0)
        .unwrap();
    assert!(fx.engine.graph().attached_source().is_none());

    let mut now = t0;
    for attempt in 0..6u32 {
        let due = fx
            .engine
            .attach_retry_due()
            .expect("retry should be scheduled");
        assert_eq!(due - now, Duration::from_millis(250 << attempt));
        assert_eq!(fx.engine.next_deadline(), Some(due));
        now = due;
        fx.engine.poll(now);
    }

    assert!(fx.engine.attach_retry_due().is_none());
    assert_eq!(fx.player.requests(), 7);

    // Nothing left to do until the player announces a source.
    fx.engine.poll(now + Duration::from_secs(60));
    assert_eq!(fx.player.requests(), 7);
}

#[test]
fn test_retry_before_due_does_nothing() {
    let mut fx = fixture();
    let t0 = Instant::now();
    fx.send(InboundEvent::PlayerReady { device_id: None }, t0)
        .unwrap();

    fx.engine.poll(t0 + Duration::from_millis(100));
    assert_eq!(fx.player.requests(), 1);
}

#[test]
fn test_source_ready_attaches_immediately() {
    let mut fx = fixture();
    let t0 = Instant::now();
    fx.send(InboundEvent::PlayerReady { device_id: None }, t0)
        .unwrap();
    assert!(fx.engine.attach_retry_due().is_some());

    fx.player.set_available(true);
    fx.send(InboundEvent::SourceReady, t0 + Duration::from_millis(10))
        .unwrap();

    assert!(fx.engine.graph().attached_source().is_some());
    assert!(fx.engine.attach_retry_due().is_none());
}

#[test]
fn test_source_ready_after_give_up() {
    let mut fx = fixture();
    let mut now = Instant::now();
    fx.send(InboundEvent::PlayerReady { device_id: None }, now)
        .unwrap();
    while let Some(due) = fx.engine.attach_retry_due() {
        now = due;
        fx.engine.poll(now);
    }

    fx.player.set_available(true);
    fx.send(InboundEvent::SourceReady, now).unwrap();
    assert!(fx.engine.graph().attached_source().is_some());
}

#[test]
fn test_reattach_when_player_switches_stream() {
    let mut fx = fixture();
    let t0 = Instant::now();
    fx.connect(t0);
    let first = fx.engine.graph().attached_source();

    fx.player.switch_stream();
    fx.send(player_state(0, 200_000, false), t0).unwrap();

    let second = fx.engine.graph().attached_source();
    assert!(second.is_some());
    assert_ne!(first, second);
    assert_eq!(second, fx.player.current_source());
}

#[test]
fn test_same_stream_is_not_reattached() {
    let mut fx = fixture();
    let t0 = Instant::now();
    fx.connect(t0);
    let requests = fx.player.requests();

    fx.send(player_state(0, 200_000, false), t0).unwrap();
    fx.send(player_state(500, 200_000, false), t0).unwrap();

    assert_eq!(fx.player.requests(), requests);
}

#[test]
fn test_disconnect_releases_everything() {
    let mut fx = fixture();
    let t0 = Instant::now();
    fx.connect(t0);
    fx.send(player_state(0, 200_000, false), t0).unwrap();
    assert!(fx.engine.progress().is_ticking());
    fx.drain();

    fx.send(InboundEvent::Disconnect, t0).unwrap();

    assert!(!fx.engine.is_connected());
    assert!(!fx.engine.progress().is_ticking());
    assert_eq!(fx.engine.graph().state(), GraphState::Detached);
    assert!(!fx.monitor.is_running());
    assert_eq!(fx.engine.next_deadline(), None);

    let out = fx.drain();
    assert!(host_messages(&out).contains(&HostMessage::PlaybackStateChanged { is_playing: false }));
    assert!(ui_updates(&out).contains(&UiUpdate::ConnectionStatus {
        status: ConnectionStatus::Disconnected
    }));

    // No progress after disconnect.
    fx.engine.poll(t0 + Duration::from_secs(5));
    assert!(progress_positions(&fx.drain()).is_empty());
}

#[test]
fn test_player_error_statuses() {
    let cases = [
        (PlayerErrorKind::Initialization, ConnectionStatus::ConnectionError),
        (PlayerErrorKind::Account, ConnectionStatus::AccountError),
    ];
    for (kind, status) in cases {
        let mut fx = fixture();
        fx.connect(Instant::now());
        fx.send(
            InboundEvent::PlayerError {
                kind,
                message: "boom".into(),
            },
            Instant::now(),
        )
        .unwrap();
        assert_eq!(fx.engine.status(), status);
        assert!(fx.engine.is_connected());
    }
}

#[test]
fn test_authentication_error_disconnects() {
    let mut fx = fixture();
    fx.connect(Instant::now());

    fx.send(
        InboundEvent::PlayerError {
            kind: PlayerErrorKind::Authentication,
            message: "token expired".into(),
        },
        Instant::now(),
    )
    .unwrap();

    assert_eq!(fx.engine.status(), ConnectionStatus::AuthenticationError);
    assert!(!fx.engine.is_connected());
    assert_eq!(fx.engine.graph().state(), GraphState::Detached);
}

#[test]
fn test_playback_error_is_only_logged() {
    let mut fx = fixture();
    fx.connect(Instant::now());

    fx.send(
        InboundEvent::PlayerError {
            kind: PlayerErrorKind::Playback,
            message: "skipped".into(),
        },
        Instant::now(),
    )
    .unwrap();

    assert_eq!(fx.engine.status(), ConnectionStatus::Connected);
}

#[test]
fn test_commands_dropped_without_player() {
    let mut fx = fixture();
    let now = Instant::now();

    fx.send(InboundEvent::TogglePlayback, now).unwrap();
    fx.send(InboundEvent::NextTrack, now).unwrap();
    fx.send(InboundEvent::PreviousTrack, now).unwrap();

    assert!(player_commands(&fx.drain()).is_empty());
}

#[test]
fn test_track_navigation_forwarded() {
    let mut fx = fixture();
    let now = Instant::now();
    fx.connect(now);
    fx.drain();

    fx.send(InboundEvent::NextTrack, now).unwrap();
    fx.send(InboundEvent::PreviousTrack, now).unwrap();

    assert_eq!(
        player_commands(&fx.drain()),
        vec![PlayerCommand::NextTrack, PlayerCommand::PreviousTrack]
    );
}

#[test]
fn test_json_lines_round_trip() {
    let mut fx = fixture();
    let now = Instant::now();

    let line = r#"{"type":"audioPositions","positions":[{"name":"frontLeft","x":-1,"y":0,"z":1}]}"#;
    let event: InboundEvent = serde_json::from_str(line).unwrap();
    fx.send(event, now).unwrap();
    assert_eq!(fx.engine.speakers().len(), 1);

    fx.send(InboundEvent::VehicleChanged, now).unwrap();
    let lines: Vec<String> = fx
        .drain()
        .iter()
        .map(|m| serde_json::to_string(m).unwrap())
        .collect();
    assert_eq!(
        lines,
        vec![r#"{"target":"host","message":{"type":"requestVehicleInfo"}}"#]
    );
}
