use folio_scene::{
    animation::AnimationLoop,
    config::SceneConfig,
    data_structures::instance::normalize_angle,
    scroll::{ScrollCamera, ScrollOutcome},
    Point3, Vector3,
};

use crate::common::test_utils::{approx_eq, build, Harness};
mod common;

fn scroll_camera() -> ScrollCamera {
    let config = SceneConfig::default();
    ScrollCamera::new(config.scroll_spin, config.scroll_factors)
}

fn ready() -> Harness {
    let mut harness = build(1);
    harness.portfolio.create_moon(&mut harness.loader);
    harness
}

fn rotation_of(harness: &Harness, id: folio_scene::data_structures::scene_graph::NodeId) -> Vector3<f32> {
    harness.portfolio.scene.transform(id).unwrap().rotation
}

#[test]
fn camera_follows_the_page_offset() {
    let mut harness = ready();
    let outcome = scroll_camera().on_scroll(&mut harness.portfolio, -1000.0);
    assert_eq!(outcome, ScrollOutcome::Applied);
    let position = harness.portfolio.camera.position;
    assert!((position.x - 0.2).abs() < 1e-5, "{position:?}");
    assert!((position.y - 0.2).abs() < 1e-5, "{position:?}");
    assert!((position.z - 10.0).abs() < 1e-4, "{position:?}");
}

#[test]
fn repeating_an_offset_leaves_the_camera_where_it_is() {
    let mut harness = ready();
    let scroll = scroll_camera();
    scroll.on_scroll(&mut harness.portfolio, -2500.0);
    let once = harness.portfolio.camera.position;
    scroll.on_scroll(&mut harness.portfolio, -2500.0);
    assert_eq!(harness.portfolio.camera.position, once);
}

#[test]
fn each_event_spins_moon_and_cube() {
    let mut harness = ready();
    let scroll = scroll_camera();
    let moon = harness.portfolio.moon().unwrap();
    let cube = harness.portfolio.cube();
    let events = 7;
    for step in 0..events {
        scroll.on_scroll(&mut harness.portfolio, -(step as f32) * 10.0);
    }
    let expected = Vector3::new(
        normalize_angle(0.05 * events as f32),
        normalize_angle(0.075 * events as f32),
        normalize_angle(0.05 * events as f32),
    );
    assert!(approx_eq(rotation_of(&harness, moon), expected, 1e-5));
    assert!(approx_eq(rotation_of(&harness, cube), expected, 1e-5));
}

#[test]
fn many_events_wrap_the_rotation() {
    let mut harness = ready();
    let scroll = scroll_camera();
    for _ in 0..200 {
        scroll.on_scroll(&mut harness.portfolio, 0.0);
    }
    let moon = harness.portfolio.moon().unwrap();
    let rotation = rotation_of(&harness, moon);
    // 200 × 0.075 = 15 rad on the y axis
    assert!((rotation.y - normalize_angle(15.0)).abs() < 1e-3, "{rotation:?}");
    for angle in [rotation.x, rotation.y, rotation.z] {
        assert!((0.0..std::f32::consts::TAU).contains(&angle));
    }
}

#[test]
fn camera_only_depends_on_the_last_offset() {
    let mut harness = ready();
    let scroll = scroll_camera();
    let mut animation = AnimationLoop::new(SceneConfig::default().frame_spin);

    for (i, t) in [-100.0, -3000.0, -50.0, -1234.0].into_iter().enumerate() {
        scroll.on_scroll(&mut harness.portfolio, t);
        for _ in 0..i {
            animation.frame(
                &mut harness.portfolio,
                &harness.scheduler,
                &mut harness.renderer,
            );
        }
    }
    let z = harness.portfolio.camera.position.z;
    assert!((z - 12.34).abs() < 1e-4, "{z}");
    let last = harness.renderer.snapshots.last().unwrap();
    assert!((last.camera.z - 12.34).abs() < 1e-4);
}

#[test]
fn scrolling_before_the_moon_exists_is_deferred() {
    let mut harness = build(2);
    let cube = harness.portfolio.cube();
    let outcome = scroll_camera().on_scroll(&mut harness.portfolio, -500.0);

    assert_eq!(outcome, ScrollOutcome::Deferred);
    assert_eq!(harness.portfolio.camera.position, Point3::new(0.0, 0.0, 30.0));
    assert_eq!(rotation_of(&harness, cube), Vector3::new(0.0, 0.0, 0.0));

    harness.portfolio.create_moon(&mut harness.loader);
    let outcome = scroll_camera().on_scroll(&mut harness.portfolio, -500.0);
    assert_eq!(outcome, ScrollOutcome::Applied);
    assert!((harness.portfolio.camera.position.z - 5.0).abs() < 1e-5);
}

#[test]
fn scrolling_back_to_the_top_parks_the_camera_on_the_origin() {
    let mut harness = ready();
    let scroll = scroll_camera();
    scroll.on_scroll(&mut harness.portfolio, -800.0);
    scroll.on_scroll(&mut harness.portfolio, 0.0);
    assert_eq!(harness.portfolio.camera.position, Point3::new(0.0, 0.0, 0.0));
}
