use folio_scene::{
    config::SceneConfig,
    data_structures::{
        geometry::Geometry,
        scene_graph::{Background, NodeKind},
    },
    resources::texture::TextureState,
    Vector3,
};

use crate::common::test_utils::{build, build_with, SURFACE};
mod common;

#[test]
fn first_render_sees_an_empty_scene() {
    let harness = build(1);
    assert_eq!(harness.renderer.snapshots.len(), 1);
    assert_eq!(harness.renderer.snapshots[0].entities, 0);
    assert_eq!(harness.renderer.snapshots[0].camera.z, 30.0);
}

#[test]
fn startup_adds_every_entity_and_the_moon_brings_it_to_207() {
    let mut harness = build(2);
    assert_eq!(harness.portfolio.scene.len(), 206);
    assert!(harness.portfolio.moon().is_none());

    harness.portfolio.create_moon(&mut harness.loader);
    assert_eq!(harness.portfolio.scene.len(), 207);
}

#[test]
fn the_moon_is_only_created_once() {
    let mut harness = build(3);
    let first = harness.portfolio.create_moon(&mut harness.loader);
    let second = harness.portfolio.create_moon(&mut harness.loader);
    assert_eq!(first, second);
    assert_eq!(harness.portfolio.scene.len(), 207);
    assert_eq!(harness.loader.requests.len(), 3);
}

#[test]
fn moon_sits_left_of_the_camera_start() {
    let mut harness = build(4);
    let moon = harness.portfolio.create_moon(&mut harness.loader);
    let transform = harness.portfolio.scene.transform(moon).unwrap();
    assert_eq!(transform.position, Vector3::new(-10.0, 0.0, 30.0));
}

#[test]
fn stars_stay_within_the_spread() {
    let harness = build(5);
    let stars: Vec<_> = harness
        .portfolio
        .scene
        .nodes()
        .filter(|(_, node)| node.name == "star")
        .collect();
    assert_eq!(stars.len(), 200);
    for (_, star) in &stars {
        let p = star.transform.position;
        for coordinate in [p.x, p.y, p.z] {
            assert!((-50.0..=50.0).contains(&coordinate), "{p:?}");
        }
    }
}

#[test]
fn stars_share_one_geometry_and_material() {
    let harness = build(6);
    let mut drawables = harness
        .portfolio
        .scene
        .nodes()
        .filter(|(_, node)| node.name == "star")
        .map(|(_, node)| node.drawable());
    let first = drawables.next().flatten().unwrap();
    assert!(drawables.all(|drawable| drawable == Some(first)));

    let (geometry, _) = first;
    assert_eq!(
        harness.portfolio.scene.geometry(geometry),
        Some(&Geometry::Sphere {
            radius: 0.25,
            width_segments: 24,
            height_segments: 24,
        })
    );
}

#[test]
fn seeds_make_star_fields_reproducible() {
    let positions = |seed| {
        build(seed)
            .portfolio
            .scene
            .nodes()
            .filter(|(_, node)| node.name == "star")
            .map(|(_, node)| node.transform.position)
            .collect::<Vec<_>>()
    };
    assert_eq!(positions(42), positions(42));
    assert_ne!(positions(42), positions(43));
}

#[test]
fn textures_are_requested_without_waiting() {
    let mut harness = build(7);
    let paths: Vec<_> = harness
        .loader
        .requests
        .iter()
        .map(|(_, path)| path.as_str())
        .collect();
    assert_eq!(paths, ["rockylaying.jpg", "aadilstanding.jpg"]);

    let textures = &harness.portfolio.scene.textures;
    assert!(
        textures
            .iter()
            .all(|(_, slot)| slot.state == TextureState::Pending)
    );
    let background = harness.loader.requests[0].0;
    assert_eq!(
        harness.portfolio.scene.background,
        Background::Texture(background)
    );

    harness.portfolio.create_moon(&mut harness.loader);
    assert_eq!(harness.loader.requests[2].1, "canvasparticle-min.png");
}

#[test]
fn cube_material_maps_the_portrait() {
    let harness = build(8);
    let scene = &harness.portfolio.scene;
    let cube = scene.get(harness.portfolio.cube()).unwrap();
    let (geometry, material) = cube.drawable().unwrap();
    assert_eq!(
        scene.geometry(geometry),
        Some(&Geometry::Box {
            width: 3.0,
            height: 3.0,
            depth: 3.0,
        })
    );
    let material = scene.material(material).unwrap();
    assert!(!material.lit);
    assert_eq!(material.map, Some(harness.loader.requests[1].0));
}

#[test]
fn torus_is_a_tomato_wireframe() {
    let harness = build(9);
    let scene = &harness.portfolio.scene;
    let (_, material) = scene
        .get(harness.portfolio.torus())
        .and_then(|node| node.drawable())
        .unwrap();
    let material = scene.material(material).unwrap();
    assert!(material.wireframe);
    assert!(material.lit);
    assert_eq!(material.colour, folio_scene::config::rgb(0xff6347));
}

#[test]
fn light_helper_starts_on_the_light() {
    let harness = build(10);
    let scene = &harness.portfolio.scene;
    let light = scene
        .nodes()
        .find(|(_, node)| matches!(node.kind, NodeKind::PointLight(_)))
        .map(|(id, _)| id)
        .unwrap();
    let helper = scene
        .nodes()
        .find(|(_, node)| matches!(node.kind, NodeKind::Helper { follows: Some(_), .. }))
        .map(|(_, node)| node)
        .unwrap();
    assert_eq!(helper.transform.position, Vector3::new(5.0, 5.0, 5.0));
    assert!(matches!(
        helper.kind,
        NodeKind::Helper { follows: Some(target), .. } if target == light
    ));
}

#[test]
fn controls_are_bound_to_the_surface() {
    let harness = build(11);
    assert_eq!(harness.portfolio.controls.bound_to, Some(SURFACE));
}

#[test]
fn failed_first_render_does_not_abort_startup() {
    let log = Default::default();
    let mut renderer = common::test_utils::RecordingRenderer::with_log(log);
    renderer.fail = true;
    let mut loader = common::test_utils::RecordingLoader::default();
    let portfolio = folio_scene::portfolio::SceneBuilder::new(SceneConfig::default()).build(
        SURFACE,
        &mut renderer,
        &mut loader,
        |_, _| common::test_utils::RecordingControls::default(),
    );
    assert_eq!(portfolio.scene.len(), 206);
}

#[test]
fn star_count_follows_the_config() {
    let harness = build_with(
        SceneConfig {
            star_count: 3,
            ..Default::default()
        },
        12,
    );
    assert_eq!(harness.portfolio.scene.len(), 9);
}
