mod bvh;

pub use bvh::{Aabb, Bvh, BvhNode, LEAF_MAX, LEAF_MAX_HARD};

use glam::Vec3;

/// Anything the BVH builder can place: a bounding box and a centroid.
pub trait Bounded {
    fn bounds(&self) -> Aabb;
    fn center(&self) -> Vec3;
}

impl Bvh {
    pub fn over<T: Bounded>(items: &[T]) -> Bvh {
        let prim_bounds = items
            .iter()
            .enumerate()
            .map(|(i, item)| (i as u32, item.bounds()))
            .collect();
        Bvh::build(prim_bounds)
    }
}
