//! Scene graph integration tests
//!
//! Transform propagation through nested objects, cache behaviour and the
//! structural invariants of the tree.

use std::sync::Arc;

use approx::assert_relative_eq;

use crate::config::SceneConfig;
use crate::error::StructuralError;
use crate::foundation::math::{Point3, Vec3};
use crate::resources::{Material, Mesh, ShaderType};
use crate::scene::{RenderData, Scene, SceneObjectId};

fn world_position(scene: &Scene, id: SceneObjectId) -> Vec3 {
    scene
        .world_matrix(id)
        .unwrap()
        .transform_point(&Point3::origin())
        .coords
}

fn chain(scene: &mut Scene, offsets: &[Vec3]) -> Vec<SceneObjectId> {
    let mut parent = scene.root();
    let mut ids = Vec::new();
    for (i, offset) in offsets.iter().enumerate() {
        let id = scene.create_child(parent, format!("node{i}")).unwrap();
        scene.transform_mut(id).unwrap().set_position(*offset);
        ids.push(id);
        parent = id;
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_translations_accumulate() {
        let mut scene = Scene::default();
        let ids = chain(
            &mut scene,
            &[Vec3::new(1.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, 1.0)],
        );

        assert_relative_eq!(world_position(&scene, ids[2]), Vec3::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_parent_rotation_moves_child() {
        let mut scene = Scene::default();
        let ids = chain(&mut scene, &[Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0)]);
        scene
            .transform_mut(ids[0])
            .unwrap()
            .set_rotation_by_axis(std::f32::consts::FRAC_PI_2, Vec3::y());

        assert_relative_eq!(world_position(&scene, ids[1]), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-6);
    }

    #[test]
    fn test_world_matrix_cached_until_ancestor_changes() {
        let mut scene = Scene::default();
        let ids = chain(&mut scene, &[Vec3::x(), Vec3::y(), Vec3::z()]);
        let sibling = scene.create_child(ids[0], "sibling").unwrap();

        let first = scene.world_matrix(ids[2]).unwrap();
        scene.world_matrix(sibling).unwrap();
        let leaf_count = scene.object(ids[2]).unwrap().transform().recompute_count();
        let sibling_count = scene.object(sibling).unwrap().transform().recompute_count();

        // Repeated reads hit the cache
        assert_eq!(scene.world_matrix(ids[2]).unwrap(), first);
        assert_eq!(scene.object(ids[2]).unwrap().transform().recompute_count(), leaf_count);

        // Changing the middle node invalidates below it only
        scene.transform_mut(ids[1]).unwrap().translate(Vec3::new(0.0, 2.0, 0.0));
        assert!(scene.object(ids[0]).unwrap().transform().is_world_matrix_valid());
        assert!(!scene.object(ids[2]).unwrap().transform().is_world_matrix_valid());
        assert!(scene.object(sibling).unwrap().transform().is_world_matrix_valid());

        assert_relative_eq!(world_position(&scene, ids[2]), Vec3::new(1.0, 3.0, 1.0));
        assert_eq!(scene.object(ids[2]).unwrap().transform().recompute_count(), leaf_count + 1);
        scene.world_matrix(sibling).unwrap();
        assert_eq!(scene.object(sibling).unwrap().transform().recompute_count(), sibling_count);
    }

    #[test]
    fn test_repeated_edits_cost_one_recompute() {
        let mut scene = Scene::default();
        let ids = chain(&mut scene, &[Vec3::x(), Vec3::y(), Vec3::z()]);
        scene.world_matrix(ids[2]).unwrap();
        let leaf_count = scene.object(ids[2]).unwrap().transform().recompute_count();

        // Several edits while the subtree is already invalid
        scene.transform_mut(ids[0]).unwrap().translate(Vec3::x());
        scene.transform_mut(ids[1]).unwrap().set_scale(Vec3::new(2.0, 2.0, 2.0));
        scene.transform_mut(ids[0]).unwrap().rotate_by_axis(0.3, Vec3::z());
        scene.transform_mut(ids[2]).unwrap().set_position_z(4.0);
        assert!(!scene.object(ids[2]).unwrap().transform().is_world_matrix_valid());

        scene.world_matrix(ids[2]).unwrap();
        scene.world_matrix(ids[2]).unwrap();
        assert_eq!(scene.object(ids[2]).unwrap().transform().recompute_count(), leaf_count + 1);
    }

    #[test]
    fn test_world_is_parent_world_times_local() {
        let mut scene = Scene::default();
        let ids = chain(&mut scene, &[Vec3::new(1.0, -2.0, 3.0), Vec3::new(0.5, 0.0, -1.0)]);
        scene
            .transform_mut(ids[0])
            .unwrap()
            .set_rotation_by_axis(0.7, Vec3::new(1.0, 1.0, 0.0))
            .set_scale(Vec3::new(2.0, 1.0, 0.5));
        scene
            .transform_mut(ids[1])
            .unwrap()
            .set_rotation_by_axis(-1.2, Vec3::y())
            .set_scale(Vec3::new(3.0, 3.0, 3.0));

        let parent_world = scene.world_matrix(ids[0]).unwrap();
        let child_local = scene.object(ids[1]).unwrap().transform().local_matrix();
        let child_world = scene.world_matrix(ids[1]).unwrap();

        assert_relative_eq!(child_world, parent_world * child_local, epsilon = 1e-4);
    }

    #[test]
    fn test_reparenting_recomputes_world_position() {
        let mut scene = Scene::default();
        let a = chain(&mut scene, &[Vec3::new(5.0, 0.0, 0.0)]);
        let b = chain(&mut scene, &[Vec3::new(0.0, 5.0, 0.0)]);
        let child = scene.create_child(a[0], "child").unwrap();
        assert_relative_eq!(world_position(&scene, child), Vec3::new(5.0, 0.0, 0.0));

        scene.add_child(b[0], child).unwrap();

        assert_relative_eq!(world_position(&scene, child), Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(scene.object(a[0]).unwrap().child_count(), 0);
    }

    #[test]
    fn test_cycle_rejected_and_tree_unchanged() {
        let mut scene = Scene::default();
        let ids = chain(&mut scene, &[Vec3::x(), Vec3::y(), Vec3::z()]);

        let err = scene.add_child(ids[2], ids[0]).unwrap_err();
        assert!(matches!(err, StructuralError::Cycle { .. }));
        assert_eq!(scene.object(ids[0]).unwrap().parent(), Some(scene.root()));
        assert_eq!(scene.object(ids[2]).unwrap().child_count(), 0);

        assert!(scene.add_child(ids[1], ids[1]).is_err());
        assert_eq!(scene.flatten().len(), 3);
    }

    #[test]
    fn test_render_data_single_owner() {
        let mut scene = Scene::default();
        let a = scene.create_child(scene.root(), "a").unwrap();
        let b = scene.create_child(scene.root(), "b").unwrap();
        let rd = scene.create_render_data(RenderData::with_mesh_and_material(
            Arc::new(Mesh::cube()),
            Arc::new(Material::new(ShaderType::ExternalRenderer)),
        ));

        scene.attach_render_data(a, rd).unwrap();
        scene.attach_render_data(b, rd).unwrap();

        assert_eq!(scene.object(a).unwrap().render_data(), None);
        assert_eq!(scene.object(b).unwrap().render_data(), Some(rd));
        assert_eq!(scene.render_data(rd).unwrap().owner(), Some(b));
    }

    #[test]
    fn test_destroy_subtree_invalidates_handles() {
        let mut scene = Scene::default();
        let ids = chain(&mut scene, &[Vec3::x(), Vec3::y(), Vec3::z()]);

        assert_eq!(scene.destroy_object(ids[1]).unwrap(), 2);
        assert!(scene.contains(ids[0]));
        assert!(!scene.contains(ids[2]));
        assert!(matches!(scene.world_matrix(ids[2]), Err(StructuralError::UnknownObject(_))));
    }

    #[test]
    fn test_check_frames_come_from_config() {
        let mut scene = Scene::new(SceneConfig::new().with_check_frames(3));
        let id = scene.create_child(scene.root(), "node").unwrap();
        assert_eq!(scene.object(id).unwrap().visibility().check_frames(), 3);
    }
}
