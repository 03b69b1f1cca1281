use std::{f32::consts::FRAC_PI_2, time::Duration};

use cgmath::{InnerSpace, Matrix4, Point3, Vector3};
use gridlight::{
    CameraSettings,
    camera::{Camera, CameraController, Key},
};
use winit::keyboard::KeyCode;

const DT: Duration = Duration::from_millis(16);

fn controller() -> CameraController {
    CameraController::new(800, 600, &CameraSettings::default())
}

/// Replays `(key, pressed)` transitions, updating once after each one.
fn replay(controller: &mut CameraController, history: &[(Key, bool)], dts: &[Duration]) {
    for (&(key, pressed), &dt) in history.iter().zip(dts.iter().cycle()) {
        controller.process_key(key, pressed);
        controller.update(dt);
    }
}

#[test]
fn should_be_deterministic_for_equal_histories() {
    let history = [
        (Key::Forward, true),
        (Key::TurnLeft, true),
        (Key::Up, true),
        (Key::Forward, false),
        (Key::LookDown, true),
        (Key::TurnLeft, false),
        (Key::Up, false),
        (Key::LookDown, false),
    ];
    let dts = [
        Duration::from_millis(16),
        Duration::from_millis(17),
        Duration::from_millis(33),
    ];

    let mut a = controller();
    let mut b = controller();
    replay(&mut a, &history, &dts);
    replay(&mut b, &history, &dts);

    assert_eq!(a.view(), b.view());
    assert_eq!(a.projection(), b.projection());
    assert_eq!(a.camera(), b.camera());
}

#[test]
fn should_start_from_configured_pose() {
    let settings = CameraSettings {
        position: [1.0, 2.0, 3.0],
        yaw: 90.0,
        pitch: -10.0,
        ..Default::default()
    };
    let controller = CameraController::new(640, 480, &settings);
    let expected = Camera::new((1.0, 2.0, 3.0), cgmath::Deg(90.0), cgmath::Deg(-10.0));

    assert_eq!(controller.camera(), &expected);
    assert_eq!(controller.view(), expected.calc_matrix());
}

#[test]
fn should_stay_put_without_input() {
    let mut controller = controller();
    let view = controller.view();
    for _ in 0..120 {
        controller.update(DT);
    }
    assert_eq!(controller.view(), view);
    assert_eq!(controller.camera().position, Point3::new(0.0, 0.0, 0.0));
}

#[test]
fn should_move_along_view_direction_when_pressing_forward() {
    let mut controller = controller();
    let forward = controller.camera().forward();

    controller.process_key(Key::Forward, true);
    for _ in 0..30 {
        controller.update(DT);
    }

    let moved = controller.camera().position - Point3::new(0.0, 0.0, 0.0);
    assert!(moved.magnitude() > 0.0);
    assert!((moved.normalize().dot(forward) - 1.0).abs() < 1e-4);
}

#[test]
fn should_not_change_matrices_before_update() {
    let mut controller = controller();
    let view = controller.view();
    controller.process_key(Key::Forward, true);
    controller.process_key(Key::TurnRight, true);
    assert_eq!(controller.view(), view);
}

#[test]
fn should_damp_to_rest_after_release() {
    let mut controller = controller();
    controller.process_key(Key::Right, true);
    for _ in 0..30 {
        controller.update(DT);
    }
    controller.process_key(Key::Right, false);

    let mut previous = controller.velocity().magnitude();
    assert!(previous > 0.0);
    for _ in 0..30 {
        controller.update(DT);
        let speed = controller.velocity().magnitude();
        assert!(speed < previous || speed == 0.0);
        previous = speed;
    }
    for _ in 0..600 {
        controller.update(DT);
    }
    assert_eq!(controller.velocity(), Vector3::new(0.0, 0.0, 0.0));

    let resting = controller.view();
    controller.update(DT);
    assert_eq!(controller.view(), resting);
}

#[test]
fn should_clamp_pitch_short_of_vertical() {
    let mut controller = controller();
    controller.process_key(Key::LookUp, true);
    for _ in 0..600 {
        controller.update(DT);
    }
    let pitch = controller.camera().pitch.0;
    assert!(pitch < FRAC_PI_2);
    assert!(pitch > FRAC_PI_2 - 0.01);
    assert!(controller.view().x.x.is_finite());
}

#[test]
fn should_update_projection_on_resize_only() {
    let mut controller = controller();
    let view = controller.view();
    let projection = controller.projection();

    controller.resize(600, 800);

    assert_eq!(controller.view(), view);
    assert_ne!(controller.projection(), projection);
    // a portrait aspect stretches the x scale
    assert!(controller.projection().x.x > projection.x.x);
}

#[test]
fn should_ignore_zero_sized_viewports() {
    let mut controller = controller();
    controller.resize(0, 0);
    let projection: Matrix4<f32> = controller.projection();
    assert!(projection.x.x.is_finite());
    assert!(projection.y.y.is_finite());
}

#[test]
fn should_report_key_state_changes() {
    let mut controller = controller();
    assert!(controller.process_key(Key::Left, true));
    assert!(!controller.process_key(Key::Left, true));
    assert!(controller.is_held(Key::Left));
    assert!(controller.process_key(Key::Left, false));
    assert!(!controller.is_held(Key::Left));

    controller.process_key(Key::Up, true);
    controller.process_key(Key::TurnLeft, true);
    controller.release_all();
    assert!(!controller.is_held(Key::Up));
    assert!(!controller.is_held(Key::TurnLeft));
}

#[test]
fn should_map_keyboard_layout() {
    assert_eq!(Key::from_code(KeyCode::KeyW), Some(Key::Forward));
    assert_eq!(Key::from_code(KeyCode::KeyS), Some(Key::Backward));
    assert_eq!(Key::from_code(KeyCode::KeyA), Some(Key::Left));
    assert_eq!(Key::from_code(KeyCode::KeyD), Some(Key::Right));
    assert_eq!(Key::from_code(KeyCode::Space), Some(Key::Up));
    assert_eq!(Key::from_code(KeyCode::ShiftLeft), Some(Key::Down));
    assert_eq!(Key::from_code(KeyCode::KeyQ), Some(Key::TurnLeft));
    assert_eq!(Key::from_code(KeyCode::ArrowRight), Some(Key::TurnRight));
    assert_eq!(Key::from_code(KeyCode::ArrowUp), Some(Key::LookUp));
    assert_eq!(Key::from_code(KeyCode::ArrowDown), Some(Key::LookDown));
    assert_eq!(Key::from_code(KeyCode::KeyZ), None);
}
