//! Rendered output: layout, listener, volume and degraded paths.

use crate::helpers::tolerances::*;
use crate::helpers::*;
use approx::assert_abs_diff_eq;
use cabin_radio::prelude::*;
use cabin_radio::spatial::{GraphState, OUTSIDE_CABIN_DAMPENING};
use cabin_radio::{OfflineSink, RadioEngine};

/// Mean level after the committed graph has settled.
fn settled_levels(fx: &Fixture) -> (f32, f32) {
    fx.monitor.render(64);
    mean_levels(&fx.monitor.render(256))
}

#[test]
fn test_passthrough_applies_volume() {
    let mut fx = fixture();
    fx.connect(Instant::now());

    let (l, r) = settled_levels(&fx);
    let expected = STREAM_LEVEL * 0.8;
    assert_abs_diff_eq!(l, expected, epsilon = DSP_EPSILON);
    assert_abs_diff_eq!(r, expected, epsilon = DSP_EPSILON);
}

#[test]
fn test_outside_camera_dampens_volume() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.drain();

    fx.send(InboundEvent::CameraLocation { is_inside: false }, now)
        .unwrap();

    let expected = 0.8 * OUTSIDE_CABIN_DAMPENING;
    assert_abs_diff_eq!(fx.engine.graph().effective_gain(), expected, epsilon = FLOAT_EPSILON);
    assert!(ui_updates(&fx.drain()).contains(&UiUpdate::CameraStatus { inside: false }));

    let (l, _) = settled_levels(&fx);
    assert_abs_diff_eq!(l, STREAM_LEVEL * expected, epsilon = DSP_EPSILON);

    fx.send(InboundEvent::CameraLocation { is_inside: true }, now)
        .unwrap();
    assert_abs_diff_eq!(fx.engine.graph().effective_gain(), 0.8, epsilon = FLOAT_EPSILON);
}

#[test]
fn test_set_volume_notifies_player_and_host() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.drain();

    fx.send(InboundEvent::SetVolume { volume: 0.5 }, now).unwrap();

    let out = fx.drain();
    assert_eq!(
        player_commands(&out),
        vec![PlayerCommand::SetVolume { volume: 0.5 }]
    );
    assert_eq!(
        host_messages(&out),
        vec![HostMessage::VolumeChanged { volume: 0.5 }]
    );

    let (l, r) = settled_levels(&fx);
    assert_abs_diff_eq!(l, 0.5, epsilon = DSP_EPSILON);
    assert_abs_diff_eq!(r, 0.5, epsilon = DSP_EPSILON);
}

#[test]
fn test_volume_clamped() {
    let now = Instant::now();
    let mut fx = fixture();

    fx.send(InboundEvent::SetVolume { volume: 1.7 }, now).unwrap();
    assert_eq!(fx.engine.graph().volume(), 1.0);
    assert_eq!(
        host_messages(&fx.drain()),
        vec![HostMessage::VolumeChanged { volume: 1.0 }]
    );

    fx.send(InboundEvent::SetVolume { volume: -0.2 }, now).unwrap();
    assert_eq!(fx.engine.graph().volume(), 0.0);
}

#[test]
fn test_layout_before_stream_is_applied_on_attach() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.send(four_doors(), now).unwrap();
    assert_eq!(fx.engine.graph().state(), GraphState::Detached);

    fx.connect(now);

    assert_eq!(fx.engine.graph().state(), GraphState::Spatial);
    assert_eq!(fx.engine.graph().renderer_count(), 4);
}

#[test]
fn test_repeated_layout_is_idempotent() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);

    let layout = speaker_layout(&[("frontLeft", -0.5, 0.0, 0.8)]);
    fx.send(layout.clone(), now).unwrap();
    fx.send(layout, now).unwrap();

    let names: Vec<&str> = fx.engine.graph().renderer_names().collect();
    assert_eq!(names, vec!["frontLeft"]);
}

#[test]
fn test_layout_replacement_drops_missing_speakers() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.send(four_doors(), now).unwrap();

    fx.send(
        speaker_layout(&[("frontLeft", -1.0, 0.0, 1.0), ("frontRight", 1.0, 0.0, 1.0)]),
        now,
    )
    .unwrap();

    let names: Vec<&str> = fx.engine.graph().renderer_names().collect();
    assert_eq!(names, vec!["frontLeft", "frontRight"]);

    fx.send(speaker_layout(&[]), now).unwrap();
    assert_eq!(fx.engine.graph().state(), GraphState::Passthrough);
    let (l, _) = settled_levels(&fx);
    assert_abs_diff_eq!(l, 0.8, epsilon = DSP_EPSILON);
}

#[test]
fn test_invalid_layout_keeps_previous() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.send(four_doors(), now).unwrap();

    let result = fx.send(
        speaker_layout(&[("frontLeft", 0.0, 0.0, 1.0), ("frontLeft", 1.0, 0.0, 1.0)]),
        now,
    );

    assert!(result.is_err());
    assert_eq!(fx.engine.speakers().len(), 4);
    assert_eq!(fx.engine.graph().renderer_count(), 4);
}

#[test]
fn test_spatial_output_is_finite_and_audible() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.send(four_doors(), now).unwrap();

    fx.monitor.render(64);
    let frames = fx.monitor.render(256);
    assert!(frames.iter().all(|(l, r)| l.is_finite() && r.is_finite()));
    let (l, r) = mean_levels(&frames);
    assert!(l > SILENCE_THRESHOLD && r > SILENCE_THRESHOLD);
}

#[test]
fn test_camera_turn_swaps_ears() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.send(speaker_layout(&[("frontLeft", -1.0, 0.0, 1.0)]), now)
        .unwrap();

    let facing_front = fx.engine.graph().renderer_gains("frontLeft").unwrap();
    fx.send(
        InboundEvent::CameraPose {
            position: Vec3::ZERO,
            rotation: cabin_radio::events::Rotation {
                y: std::f32::consts::PI,
            },
        },
        now,
    )
    .unwrap();
    let facing_back = fx.engine.graph().renderer_gains("frontLeft").unwrap();

    assert_abs_diff_eq!(facing_front.left, facing_back.right, epsilon = DSP_EPSILON);
    assert_abs_diff_eq!(facing_front.right, facing_back.left, epsilon = DSP_EPSILON);
    assert!((facing_front.left - facing_front.right).abs() > DSP_EPSILON);
}

#[test]
fn test_non_finite_camera_pose_ignored() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);

    fx.send(
        InboundEvent::CameraPose {
            position: Vec3::new(f32::NAN, 0.0, 0.0),
            rotation: Default::default(),
        },
        now,
    )
    .unwrap();

    assert!(fx.engine.listener().pose().is_none());
    assert_eq!(fx.engine.graph().listener().position, Vec3::ZERO);
}

#[test]
fn test_spatial_toggle_flattens_distance() {
    let now = Instant::now();
    let mut fx = fixture();
    fx.connect(now);
    fx.send(speaker_layout(&[("rearLeft", -1.0, 0.0, -3.0)]), now)
        .unwrap();
    let spatial = fx.engine.graph().renderer_gains("rearLeft").unwrap();

    fx.send(InboundEvent::SetSpatialAudio { enabled: false }, now)
        .unwrap();

    assert!(!fx.engine.graph().is_spatial_enabled());
    let config = fx.engine.graph().renderer_config("rearLeft").unwrap();
    assert_eq!(config.rolloff_factor, 0.0);
    let flat = fx.engine.graph().renderer_gains("rearLeft").unwrap();
    assert!(flat.left + flat.right > spatial.left + spatial.right);
}

#[test]
fn test_failing_output_degrades_once() {
    let now = Instant::now();
    let player = FakePlayer::default();
    player.set_available(true);
    let (mut engine, outbound) = RadioEngine::builder()
        .sink(Box::new(FailingSink))
        .provider(Box::new(player.clone()))
        .build()
        .unwrap();

    engine
        .handle(InboundEvent::PlayerReady { device_id: None }, now)
        .unwrap();
    engine.handle(four_doors(), now).unwrap();
    engine.handle(InboundEvent::SourceReady, now).unwrap();

    assert_eq!(engine.graph().state(), GraphState::Detached);
    assert_eq!(engine.graph().attached_source(), None);
    let notices: Vec<_> = ui_updates(&outbound.try_iter().collect::<Vec<_>>())
        .into_iter()
        .filter(|u| {
            *u == UiUpdate::Notice {
                kind: NoticeKind::SpatialUnavailable,
            }
        })
        .collect();
    assert_eq!(notices.len(), 1);

    // Controls keep working without audio output.
    engine
        .handle(InboundEvent::SetVolume { volume: 0.3 }, now)
        .unwrap();
    assert_eq!(engine.graph().volume(), 0.3);
}

#[test]
fn test_source_ready_recovers_after_output_failure() {
    let now = Instant::now();
    let mut fx = flaky_fixture(1);
    fx.send(four_doors(), now).unwrap();

    fx.connect(now);
    assert_eq!(fx.engine.graph().state(), GraphState::Detached);
    assert!(!fx.monitor.is_running());
    assert!(ui_updates(&fx.drain()).contains(&UiUpdate::Notice {
        kind: NoticeKind::SpatialUnavailable
    }));

    fx.send(InboundEvent::SourceReady, now).unwrap();

    assert_eq!(fx.engine.graph().state(), GraphState::Spatial);
    assert_eq!(fx.engine.graph().renderer_count(), 4);
    assert!(fx.monitor.is_running());
    let (l, r) = settled_levels(&fx);
    assert!(l > SILENCE_THRESHOLD && r > SILENCE_THRESHOLD);
}

#[test]
fn test_repeated_output_failure_notifies_once() {
    let now = Instant::now();
    let mut fx = flaky_fixture(2);
    fx.connect(now);
    fx.send(InboundEvent::SourceReady, now).unwrap();
    assert_eq!(fx.engine.graph().state(), GraphState::Detached);

    fx.send(InboundEvent::SourceReady, now).unwrap();
    assert!(fx.monitor.is_running());

    let notices = ui_updates(&fx.drain())
        .into_iter()
        .filter(|u| matches!(u, UiUpdate::Notice { kind: NoticeKind::SpatialUnavailable }))
        .count();
    assert_eq!(notices, 1);
}

#[test]
fn test_offline_sink_silent_before_attach() {
    let sink = OfflineSink::new();
    let monitor = sink.monitor();
    let (_engine, _outbound) = RadioEngine::builder()
        .sink(Box::new(sink))
        .build()
        .unwrap();

    assert!(!monitor.is_running());
    assert!(monitor.render(32).is_empty());
}
