//! Bounding volume hierarchy over the scene objects.
//!
//! Nodes live in an arena next to the objects they index, so the tree is
//! freed in one go whether or not a traversal was running.

use std::cmp::Reverse;

use fastrand::Rng;
use float_ord::FloatOrd;

use crate::aabb::Aabb;
use crate::object::Object;
use crate::ray::{Hit, Ray};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Two object indices, equal when the node covers a single object.
    Leaf(usize, usize),
    /// Two node indices.
    Internal(usize, usize),
}

#[derive(Clone, Debug)]
pub struct BvhNode {
    pub bbox: Aabb,
    pub kind: NodeKind,
}

pub struct Bvh {
    objects: Vec<Object>,
    nodes: Vec<BvhNode>,
    root: usize,
    time_from: f32,
    time_to: f32,
}

impl Bvh {
    /// Builds the tree, splitting on a random axis at every level. Boxes
    /// cover the objects over the whole shutter interval. `None` when there
    /// are no objects.
    pub fn new(objects: Vec<Object>, time_from: f32, time_to: f32, rng: &mut Rng) -> Option<Bvh> {
        if objects.is_empty() {
            return None;
        }
        let len = objects.len();
        let mut bvh = Bvh {
            objects,
            nodes: Vec::with_capacity(len),
            root: 0,
            time_from,
            time_to,
        };
        bvh.root = bvh.build(0, len, rng);
        Some(bvh)
    }

    fn object_box(&self, index: usize) -> Aabb {
        self.objects[index].bounding_box(self.time_from, self.time_to)
    }

    fn build(&mut self, from: usize, to: usize, rng: &mut Rng) -> usize {
        let axis = rng.usize(..3);
        let (time_from, time_to) = (self.time_from, self.time_to);
        self.objects[from..to]
            .sort_by_cached_key(|obj| Reverse(FloatOrd(obj.bounding_box(time_from, time_to).min[axis])));

        let (kind, bbox) = match to - from {
            1 => (NodeKind::Leaf(from, from), self.object_box(from)),
            2 => (NodeKind::Leaf(from, from + 1), self.object_box(from).union(&self.object_box(from + 1))),
            len => {
                let mid = from + len / 2;
                let left = self.build(from, mid, rng);
                let right = self.build(mid, to, rng);
                (NodeKind::Internal(left, right), self.nodes[left].bbox.union(&self.nodes[right].bbox))
            }
        };

        self.nodes.push(BvhNode { bbox, kind });
        self.nodes.len() - 1
    }

    pub fn hit(&self, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        self.hit_node(self.root, ray, t_min, t_max)
    }

    fn hit_node(&self, index: usize, ray: &Ray, t_min: f32, t_max: f32) -> Option<Hit> {
        let node = &self.nodes[index];
        if !node.bbox.hit(ray, t_min, t_max) {
            return None;
        }

        match node.kind {
            NodeKind::Leaf(left, right) if left == right => self.objects[left].hit(ray, t_min, t_max),
            NodeKind::Leaf(left, right) => {
                let left = self.objects[left].hit(ray, t_min, t_max);
                let closest = left.as_ref().map_or(t_max, |hit| hit.t);
                self.objects[right].hit(ray, t_min, closest).or(left)
            }
            NodeKind::Internal(left, right) => {
                let left = self.hit_node(left, ray, t_min, t_max);
                let closest = left.as_ref().map_or(t_max, |hit| hit.t);
                self.hit_node(right, ray, t_min, closest).or(left)
            }
        }
    }

    pub fn bounding_box(&self) -> Aabb {
        self.nodes[self.root].bbox
    }

    pub fn objects(&self) -> &[Object] {
        &self.objects
    }

    #[cfg(test)]
    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{point, vector, Point3};

    use super::*;
    use crate::material::Material;
    use crate::object::{nearest_hit, MovingSphere, Sphere};
    use crate::picture::Color;
    use crate::render::random_in_unit_sphere;

    fn random_objects(rng: &mut Rng, count: usize) -> Vec<Object> {
        (0..count)
            .map(|i| {
                let center = Point3::from(10.0 * random_in_unit_sphere(rng));
                let radius = 0.1 + rng.f32();
                let material = Material::lambertian(Color::new(i as f32, 0.0, 0.0));
                if i % 3 == 0 {
                    let to = center + vector![0.0, rng.f32(), 0.0];
                    Object::MovingSphere(MovingSphere::new((center, 0.0), (to, 1.0), radius, material))
                } else {
                    Object::Sphere(Sphere::new(center, radius, material))
                }
            })
            .collect()
    }

    #[test]
    fn empty_builds_nothing() {
        assert!(Bvh::new(vec![], 0.0, 1.0, &mut Rng::with_seed(0)).is_none());
    }

    #[test]
    fn single_object_leaf() {
        let sphere = Sphere::new(point![0.0, 0.0, -1.0], 0.5, Material::lambertian(Color::WHITE));
        let bvh = Bvh::new(vec![Object::Sphere(sphere)], 0.0, 1.0, &mut Rng::with_seed(0)).expect("bvh");
        assert_eq!(bvh.nodes().len(), 1);
        assert_eq!(bvh.nodes()[0].kind, NodeKind::Leaf(0, 0));

        let ray = Ray::new(Point3::origin(), vector![0.0, 0.0, -1.0], 0.0);
        let hit = bvh.hit(&ray, 0.001, f32::MAX).expect("hit");
        assert!((hit.t - 0.5).abs() < 1e-6);
    }

    #[test]
    fn node_boxes_are_unions_of_children() {
        let mut rng = Rng::with_seed(3);
        let bvh = Bvh::new(random_objects(&mut rng, 37), 0.0, 1.0, &mut rng).expect("bvh");
        assert_eq!(bvh.objects().len(), 37);
        for node in bvh.nodes() {
            let expected = match node.kind {
                NodeKind::Leaf(l, r) => bvh.object_box(l).union(&bvh.object_box(r)),
                NodeKind::Internal(l, r) => bvh.nodes()[l].bbox.union(&bvh.nodes()[r].bbox),
            };
            assert_eq!(node.bbox, expected);
        }

        let mut leaves: Vec<usize> = bvh.nodes().iter()
            .filter_map(|node| match node.kind {
                NodeKind::Leaf(l, r) if l == r => Some(vec![l]),
                NodeKind::Leaf(l, r) => Some(vec![l, r]),
                NodeKind::Internal(..) => None,
            })
            .flatten()
            .collect();
        leaves.sort_unstable();
        assert_eq!(leaves, (0..37).collect::<Vec<_>>());
    }

    #[test]
    fn matches_linear_scan() {
        for seed in 0..8 {
            let mut rng = Rng::with_seed(seed);
            let objects = random_objects(&mut rng, 1 + seed as usize * 13);
            let reference = objects.clone();
            let bvh = Bvh::new(objects, 0.0, 1.0, &mut rng).expect("bvh");

            for _ in 0..500 {
                let origin = Point3::from(15.0 * random_in_unit_sphere(&mut rng));
                let ray = Ray::new(origin, random_in_unit_sphere(&mut rng), rng.f32());
                let expected = nearest_hit(&reference, &ray, 0.001, f32::MAX);
                let actual = bvh.hit(&ray, 0.001, f32::MAX);
                match (expected, actual) {
                    (None, None) => {}
                    (Some(expected), Some(actual)) => {
                        assert_eq!(expected.t, actual.t);
                        assert_eq!(expected.material, actual.material);
                    }
                    (expected, actual) => panic!("seed {}: linear {:?}, bvh {:?}", seed, expected, actual),
                }
            }
        }
    }
}
