use std::time::Duration;

use cgmath::{Matrix4, SquareMatrix, Vector3};
use gridlight::{
    CameraSettings,
    camera::{CameraController, Key},
    frame::{FrameScheduler, PassKind, SceneObject},
};

use crate::common::test_utils::RecordingSink;

mod common;

const DT: Duration = Duration::from_millis(16);
const TEXTURE: u32 = 7;

fn camera() -> CameraController {
    CameraController::new(1280, 720, &CameraSettings::default())
}

fn expected_model() -> Matrix4<f32> {
    Matrix4::identity() * Matrix4::from_translation(Vector3::new(-20.0, -1.0, -20.0))
}

#[test]
fn should_draw_nothing_while_awaiting_assets() {
    let mut scheduler = FrameScheduler::<u32>::new();
    let mut camera = camera();
    let mut sink = RecordingSink::new();
    camera.process_key(Key::Forward, true);
    let view = camera.view();

    for i in 0..10 {
        let drawn = scheduler.tick(&mut camera, i as f32, DT, &mut sink).unwrap();
        assert!(!drawn);
    }

    assert!(!scheduler.is_running());
    assert!(sink.frames.is_empty());
    assert!(sink.draws.is_empty());
    assert_eq!(scheduler.frames(), 0);
    assert_eq!(camera.view(), view);
}

#[test]
fn should_start_only_once() {
    let mut scheduler = FrameScheduler::new();
    assert!(scheduler.start(TEXTURE));
    assert!(!scheduler.start(99));
    assert!(scheduler.is_running());
    assert_eq!(scheduler.object().map(SceneObject::texture), Some(&TEXTURE));
}

#[test]
fn should_invoke_passes_in_fixed_order() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start(TEXTURE);
    let mut camera = camera();
    let mut sink = RecordingSink::new();

    for i in 0..3 {
        assert!(scheduler.tick(&mut camera, i as f32, DT, &mut sink).unwrap());
    }

    assert_eq!(sink.frames.len(), 3);
    assert_eq!(scheduler.frames(), 3);
    let order = [PassKind::Background, PassKind::Object, PassKind::Grid];
    let expected: Vec<PassKind> = order.iter().copied().cycle().take(9).collect();
    assert_eq!(sink.passes(), expected);
    for (i, draw) in sink.draws.iter().enumerate() {
        assert_eq!(draw.frame_index, i / 3);
    }
}

#[test]
fn should_share_one_frame_state_within_a_tick() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start(TEXTURE);
    let mut camera = camera();
    camera.process_key(Key::TurnLeft, true);
    let mut sink = RecordingSink::new();

    scheduler.tick(&mut camera, 1.5, DT, &mut sink).unwrap();

    assert!(sink.draws.iter().all(|d| d.frame == sink.frames[0]));
    assert_eq!(sink.frames[0].time, 1.5);
}

#[test]
fn should_render_with_camera_from_previous_tick() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start(TEXTURE);
    let mut camera = camera();
    camera.process_key(Key::Forward, true);
    camera.process_key(Key::TurnRight, true);
    let mut sink = RecordingSink::new();

    let mut after_tick = vec![(camera.view(), camera.projection())];
    for i in 0..5 {
        scheduler
            .tick(&mut camera, i as f32 * 0.016, DT, &mut sink)
            .unwrap();
        after_tick.push((camera.view(), camera.projection()));
    }

    for (i, frame) in sink.frames.iter().enumerate() {
        assert_eq!((frame.view, frame.projection), after_tick[i], "frame {i}");
    }
    // the camera moved, so no frame saw the matrices of its own tick
    assert_ne!(sink.frames[1].view, after_tick[2].0);
}

#[test]
fn should_give_object_pass_fixed_translation_every_tick() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start(TEXTURE);
    let mut camera = camera();
    camera.process_key(Key::Backward, true);
    let mut sink = RecordingSink::new();

    for i in 0..4 {
        scheduler.tick(&mut camera, i as f32, DT, &mut sink).unwrap();
    }

    let objects = sink.draws_of(PassKind::Object);
    assert_eq!(objects.len(), 4);
    for draw in objects {
        assert_eq!(draw.model, Some(expected_model()));
        assert_eq!(draw.texture, Some(TEXTURE));
    }
    for pass in [PassKind::Background, PassKind::Grid] {
        assert!(sink.draws_of(pass).iter().all(|d| d.model.is_none() && d.texture.is_none()));
    }
}

#[test]
fn should_record_identical_draws_for_identical_frames() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start(TEXTURE);
    let mut camera = camera();
    let mut sink = RecordingSink::new();

    scheduler.tick(&mut camera, 2.0, DT, &mut sink).unwrap();
    scheduler.tick(&mut camera, 2.0, DT, &mut sink).unwrap();

    let (first, second) = sink.draws.split_at(3);
    for (a, b) in first.iter().zip(second) {
        assert_eq!(a.pass, b.pass);
        assert_eq!(a.frame, b.frame);
        assert_eq!(a.model, b.model);
        assert_eq!(a.texture, b.texture);
    }
}

#[test]
fn should_stop_the_tick_on_draw_failure() {
    let mut scheduler = FrameScheduler::new();
    scheduler.start(TEXTURE);
    let mut camera = camera();
    camera.process_key(Key::Forward, true);
    let view = camera.view();
    let mut sink = RecordingSink::failing_on(PassKind::Object);

    let result = scheduler.tick(&mut camera, 0.0, DT, &mut sink);

    assert_eq!(result, Err("Object failed".to_string()));
    assert_eq!(sink.passes(), vec![PassKind::Background]);
    assert_eq!(scheduler.frames(), 0);
    assert_eq!(camera.view(), view);
}

#[test]
fn should_build_scene_object_at_fixed_offset() {
    let mut object = SceneObject::new("castle");
    assert_eq!(object.model(), expected_model());
    object.update();
    assert_eq!(object.model(), expected_model());
    let props = object.props();
    assert_eq!(props.model, expected_model());
    assert_eq!(*props.texture, "castle");
}
