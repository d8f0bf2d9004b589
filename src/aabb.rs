use std::mem::swap;

use nalgebra::Point3;

use crate::ray::Ray;

/// Axis-aligned bounding box, `min[i] <= max[i]` on every axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    pub min: Point3<f32>,
    pub max: Point3<f32>,
}

impl Aabb {
    pub fn from_corners(a: Point3<f32>, b: Point3<f32>) -> Self {
        Aabb { min: a.inf(&b), max: a.sup(&b) }
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Slab test: does the ray enter the box within `(t_min, t_max)`.
    pub fn hit(&self, ray: &Ray, mut t_min: f32, mut t_max: f32) -> bool {
        for axis in 0..3 {
            let inv = ray.inv_direction[axis];
            let mut t0 = (self.min[axis] - ray.origin[axis]) * inv;
            let mut t1 = (self.max[axis] - ray.origin[axis]) * inv;
            if inv < 0.0 {
                swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_max <= t_min {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{point, vector};

    use super::*;

    fn unit_box() -> Aabb {
        Aabb::from_corners(point![-1.0, -1.0, -1.0], point![1.0, 1.0, 1.0])
    }

    #[test]
    fn corners_are_ordered() {
        let aabb = Aabb::from_corners(point![2.0, -1.0, 5.0], point![-2.0, 3.0, 4.0]);
        assert_eq!(aabb.min, point![-2.0, -1.0, 4.0]);
        assert_eq!(aabb.max, point![2.0, 3.0, 5.0]);
    }

    #[test]
    fn union_is_commutative_and_associative() {
        let a = Aabb::from_corners(point![0.0, 0.0, 0.0], point![1.0, 2.0, 3.0]);
        let b = Aabb::from_corners(point![-4.0, 1.0, 0.5], point![0.5, 5.0, 1.0]);
        let c = Aabb::from_corners(point![2.0, -3.0, -1.0], point![3.0, -2.0, 9.0]);

        assert_eq!(a.union(&b), b.union(&a));
        assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));

        let all = a.union(&b).union(&c);
        assert_eq!(all.min, point![-4.0, -3.0, -1.0]);
        assert_eq!(all.max, point![3.0, 5.0, 9.0]);
    }

    #[test]
    fn hit_from_either_side() {
        let aabb = unit_box();
        let towards = Ray::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, 1.0], 0.0);
        assert!(aabb.hit(&towards, 0.0, 100.0));

        let backwards = Ray::new(point![0.0, 0.0, 5.0], vector![0.0, 0.0, -1.0], 0.0);
        assert!(aabb.hit(&backwards, 0.0, 100.0));

        let diagonal = Ray::new(point![5.0, 5.0, 5.0], vector![-1.0, -1.0, -1.0], 0.0);
        assert!(aabb.hit(&diagonal, 0.0, 100.0));
    }

    #[test]
    fn miss_and_window() {
        let aabb = unit_box();
        let away = Ray::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, -1.0], 0.0);
        assert!(!aabb.hit(&away, 0.0, 100.0));

        let beside = Ray::new(point![10.0, 0.0, 0.0], vector![0.0, 0.0, 1.0], 0.0);
        assert!(!aabb.hit(&beside, 0.0, 100.0));

        // the box lies between t=4 and t=6
        let towards = Ray::new(point![0.0, 0.0, -5.0], vector![0.0, 0.0, 1.0], 0.0);
        assert!(!aabb.hit(&towards, 0.0, 3.5));
        assert!(!aabb.hit(&towards, 6.5, 100.0));
    }

    #[test]
    fn ray_starting_inside() {
        let ray = Ray::new(Point3::origin(), vector![0.3, -0.2, 0.9], 0.0);
        assert!(unit_box().hit(&ray, 0.001, f32::MAX));
    }
}
