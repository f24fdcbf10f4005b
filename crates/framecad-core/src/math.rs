//! 数学基础类型
//!
//! 基于 nalgebra 的类型别名，以及几何内核里最基础的几个算法：
//! - 点到线段的最近点
//! - 网格捕捉
//! - 2D/3D 包围盒

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Point3 = nalgebra::Point3<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;

/// 浮点比较容差
pub const EPSILON: f64 = 1e-9;

/// 点到线段的最近点
///
/// 将 `p` 投影到 `p0`-`p1` 所在的直线上，参数被截断到线段范围内。
/// 返回 (最近点, 距离)。`p0 == p1` 时退化为到 `p0` 的距离。
pub fn closest_point_on_segment(p0: Point2, p1: Point2, p: Point2) -> (Point2, f64) {
    let axis = p1 - p0;
    let length = axis.norm();
    if length < EPSILON {
        return (p0, (p - p0).norm());
    }

    let b0 = axis / length;
    let b1 = Vector2::new(-b0.y, b0.x);
    let w = p - p0;
    let along = w.dot(&b0);

    if along < 0.0 {
        (p0, (p - p0).norm())
    } else if along > length {
        (p1, (p - p1).norm())
    } else {
        (p0 + b0 * along, w.dot(&b1).abs())
    }
}

/// 网格捕捉：逐分量 `floor(v / step) * step`
///
/// 步长小于 1 时按 1 处理。
pub fn snap_to_grid(v: &Vector3, step: f64) -> Vector3 {
    let step = step.max(1.0);
    v.map(|c| (c / step).floor() * step)
}

/// 2D 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 空包围盒（min > max）
    pub fn empty() -> Self {
        Self {
            min: Point2::new(f64::MAX, f64::MAX),
            max: Point2::new(f64::MIN, f64::MIN),
        }
    }

    /// 由两个对角点构造（顺序任意）
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point2>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y
    }

    pub fn expand_to_include(&mut self, p: &Point2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn contains(&self, p: &Point2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// `other` 是否完整落在本包围盒内
    pub fn contains_box(&self, other: &BoundingBox2) -> bool {
        !other.is_empty() && self.contains(&other.min) && self.contains(&other.max)
    }

    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector2 {
        self.max - self.min
    }
}

/// 3D 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BoundingBox3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    pub fn from_points(points: impl IntoIterator<Item = Point3>) -> Self {
        let mut bbox = Self::empty();
        for p in points {
            bbox.expand_to_include(&p);
        }
        bbox
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_to_include(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn merge(&self, other: &BoundingBox3) -> BoundingBox3 {
        BoundingBox3 {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    pub fn center(&self) -> Point3 {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn size(&self) -> Vector3 {
        self.max - self.min
    }
}
