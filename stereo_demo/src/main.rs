//! Stereo scene demo application
//!
//! Builds a small orbiting scene, renders a few stereo frames on the headless
//! GPU, and picks along the centre eye's view direction. Both culling stages
//! are enabled unless a `.toml` or `.ron` configuration file passed as the
//! first argument says otherwise.

use std::sync::Arc;

use stereo_scene::config::ConfigError;
use stereo_scene::foundation::logging;
use stereo_scene::foundation::math::utils::{deg_to_rad, rad_to_deg};
use stereo_scene::foundation::math::Point3;
use stereo_scene::prelude::*;
use thiserror::Error;

/// Half the distance between the eyes, in metres
const HALF_IPD: f32 = 0.032;
const FRAMES: usize = 30;

#[derive(Error, Debug)]
enum DemoError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("scene error: {0}")]
    Scene(#[from] StructuralError),
}

struct Orbit {
    sun: SceneObjectId,
    planet: SceneObjectId,
    moon: SceneObjectId,
}

fn textured_cube(scene: &mut Scene, parent: SceneObjectId, name: &str, texture: u32) -> Result<SceneObjectId, DemoError> {
    let id = scene.create_child(parent, name)?;
    let material = Material::new(ShaderType::Texture).with_texture("main_texture", TextureHandle(texture));
    let render_data = scene.create_render_data(RenderData::with_mesh_and_material(
        Arc::new(Mesh::cube()),
        Arc::new(material),
    ));
    scene.attach_render_data(id, render_data)?;
    scene
        .object_mut(id)?
        .set_eye_pointee_holder(Some(EyePointeeHolder::new(PointeeKind::Mesh)));
    Ok(id)
}

fn build_scene(scene: &mut Scene) -> Result<Orbit, DemoError> {
    let root = scene.root();
    let sun = textured_cube(scene, root, "sun", 1)?;
    scene.transform_mut(sun)?.set_position(Vec3::new(0.0, 0.0, -8.0)).set_scale(Vec3::new(2.0, 2.0, 2.0));

    let planet = textured_cube(scene, sun, "planet", 2)?;
    scene
        .transform_mut(planet)?
        .set_position(Vec3::new(1.5, 0.0, 0.0))
        .set_scale(Vec3::new(0.4, 0.4, 0.4));

    let moon = textured_cube(scene, planet, "moon", 3)?;
    scene
        .transform_mut(moon)?
        .set_position(Vec3::new(1.5, 0.0, 0.0))
        .set_scale(Vec3::new(0.5, 0.5, 0.5));

    // Drawn last, after the opaque geometry
    let halo = textured_cube(scene, sun, "halo", 4)?;
    scene.transform_mut(halo)?.set_scale(Vec3::new(1.2, 1.2, 1.2));
    let halo_render_data = scene.object(halo)?.render_data();
    if let Some(rd) = halo_render_data {
        scene.render_data_mut(rd)?.set_rendering_order(RenderingOrder::TRANSPARENT);
    }

    Ok(Orbit { sun, planet, moon })
}

/// Defaults with both culling stages on
fn default_config() -> ApplicationConfig {
    ApplicationConfig {
        scene: SceneConfig::new().with_frustum_culling(true).with_occlusion_culling(true),
        ..ApplicationConfig::default()
    }
}

fn run() -> Result<(), DemoError> {
    let config = match std::env::args().nth(1) {
        Some(path) => ApplicationConfig::load_from_file(&path)?,
        None => default_config(),
    };
    config.validate()?;
    logging::init_with_level(&config.logging.level);
    log::info!("Starting stereo demo...");

    let mut scene = Scene::new(config.scene.clone());
    let orbit = build_scene(&mut scene)?;
    let mut renderer = Renderer::new(config.renderer.clone());
    let mut gpu = HeadlessGpu::new().with_query_latency(1);

    let projection = Mat4::new_perspective(1.0, std::f32::consts::FRAC_PI_2, 0.1, 100.0);
    let left = Mat4::new_translation(&Vec3::new(HALF_IPD, 0.0, 0.0));
    let right = Mat4::new_translation(&Vec3::new(-HALF_IPD, 0.0, 0.0));

    for frame in 0..FRAMES {
        scene.transform_mut(orbit.sun)?.rotate_by_axis(deg_to_rad(3.0), Vec3::y());
        scene.transform_mut(orbit.planet)?.rotate_by_axis(deg_to_rad(12.0), Vec3::y());

        let [left_stats, right_stats] = renderer.render_stereo(&mut scene, &mut gpu, [&left, &right], &projection);
        gpu.take_commands();

        if frame % 10 == 0 {
            log::info!(
                "frame {}: left drew {}/{} ({} culled), right drew {}/{} ({} culled)",
                frame,
                left_stats.objects_drawn,
                left_stats.candidates,
                left_stats.frustum_culled,
                right_stats.objects_drawn,
                right_stats.candidates,
                right_stats.frustum_culled
            );
        }
    }

    let moon_position = scene.world_matrix(orbit.moon)?.transform_point(&Point3::origin());
    println!("moon world position: {moon_position:?}");
    println!(
        "sun yaw after {} frames: {:.1} degrees",
        FRAMES,
        rad_to_deg(scene.object(orbit.sun)?.transform().rotation_yaw())
    );

    let picked = Picker::pick_scene(&mut scene, &Ray::forward());
    for id in &picked {
        let object = scene.object(*id)?;
        println!(
            "picked '{}' at {:?}",
            object.name(),
            object.eye_pointee_holder().and_then(EyePointeeHolder::hit)
        );
    }

    let center_view = Mat4::identity();
    println!(
        "looking at sun: {}, distance to sun: {:.3}",
        Picker::is_looking_at(&scene, orbit.sun, &center_view)?,
        Picker::pick_scene_object(&scene, orbit.sun, &center_view)?
    );

    Ok(())
}

fn main() {
    if let Err(e) = run() {
        log::error!("Demo failed: {e}");
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_enables_culling() {
        let config = default_config();
        assert!(config.scene.frustum_culling);
        assert!(config.scene.occlusion_culling);
        assert!(config.validate().is_ok());
    }
}
