//! 线框
//!
//! 线框是一串 3D 点，`None` 行表示路径断点（抬笔）。
//! 内置单位线框位于 `[-0.5,0.5]×[-0.5,0.5]×[0,1]`，
//! 零件按 `(dim1, dim2, length)` 逐分量缩放得到自身线框。

use crate::error::{CoreError, CoreResult};
use crate::math::{BoundingBox3, Point3, Vector3};
use crate::rotation::Transform;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// 内置线框名称
pub const BUILTIN_WIREFRAMES: [&str; 4] = ["Cube", "Prism", "Cone", "Cylinder"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wireframe {
    rows: Vec<Option<Point3>>,
}

impl Wireframe {
    /// 由若干条路径拼接，路径之间插入断点
    pub fn from_paths<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: IntoIterator<Item = Point3>,
    {
        let mut rows = Vec::new();
        for path in paths {
            if !rows.is_empty() {
                rows.push(None);
            }
            rows.extend(path.into_iter().map(Some));
        }
        Self { rows }
    }

    pub fn from_rows(rows: Vec<Option<Point3>>) -> Self {
        Self { rows }
    }

    /// 按名称查找内置单位线框
    pub fn builtin(name: &str) -> CoreResult<Self> {
        match name {
            "Cube" => Ok(cube()),
            "Prism" => Ok(prism()),
            "Cone" => Ok(cone()),
            "Cylinder" => Ok(cylinder()),
            _ => Err(CoreError::UnknownWireframe(name.to_string())),
        }
    }

    pub fn rows(&self) -> &[Option<Point3>] {
        &self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(Option::is_none)
    }

    /// 按断点切分出的连续路径（空路径被跳过）
    pub fn paths(&self) -> Vec<Vec<Point3>> {
        self.rows
            .split(Option::is_none)
            .filter(|run| !run.is_empty())
            .map(|run| run.iter().flatten().copied().collect())
            .collect()
    }

    /// 所有非断点顶点
    pub fn vertices(&self) -> impl Iterator<Item = Point3> + '_ {
        self.rows.iter().flatten().copied()
    }

    /// 逐点映射，断点保持不变
    pub fn map_points(&self, f: impl Fn(&Point3) -> Point3) -> Self {
        Self {
            rows: self.rows.iter().map(|row| row.as_ref().map(&f)).collect(),
        }
    }

    /// 逐分量缩放
    pub fn scaled(&self, scale: &Vector3) -> Self {
        self.map_points(|p| Point3::from(p.coords.component_mul(scale)))
    }

    /// 局部坐标 → 世界坐标
    pub fn transformed(&self, transform: &Transform) -> Self {
        self.map_points(|p| transform.apply(p))
    }

    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(self.vertices())
    }
}

fn pts(coords: &[[f64; 3]]) -> Vec<Point3> {
    coords.iter().map(|c| Point3::new(c[0], c[1], c[2])).collect()
}

fn cube() -> Wireframe {
    Wireframe::from_paths([pts(&[
        [-0.5, -0.5, 0.0],
        [-0.5, 0.5, 0.0],
        [0.5, 0.5, 0.0],
        [0.5, -0.5, 0.0],
        [-0.5, -0.5, 0.0],
        [-0.5, -0.5, 1.0],
        [-0.5, 0.5, 1.0],
        [-0.5, 0.5, 0.0],
        [-0.5, 0.5, 1.0],
        [0.5, 0.5, 1.0],
        [0.5, 0.5, 0.0],
        [0.5, 0.5, 1.0],
        [0.5, -0.5, 1.0],
        [0.5, -0.5, 0.0],
        [0.5, -0.5, 1.0],
        [-0.5, -0.5, 1.0],
    ])])
}

/// 斜面在 -x 侧落到底面
fn prism() -> Wireframe {
    Wireframe::from_paths([pts(&[
        [0.5, 0.5, 0.0],
        [0.5, -0.5, 0.0],
        [-0.5, -0.5, 0.0],
        [-0.5, 0.5, 0.0],
        [0.5, 0.5, 0.0],
        [0.5, 0.5, 1.0],
        [-0.5, 0.5, 0.0],
        [0.5, 0.5, 1.0],
        [0.5, -0.5, 1.0],
        [-0.5, -0.5, 0.0],
        [0.5, -0.5, 1.0],
        [0.5, -0.5, 0.0],
    ])])
}

/// 底圆上的一段 45° 圆弧（3 个点）
fn base_arc(segment: usize, z: f64) -> Vec<Point3> {
    (0..3)
        .map(|k| {
            let t = (segment as f64 + k as f64 / 2.0) * PI / 4.0;
            Point3::new(t.cos() / 2.0, t.sin() / 2.0, z)
        })
        .collect()
}

fn cone() -> Wireframe {
    let peak = Point3::new(0.0, 0.0, 1.0);
    let mut path = Vec::new();
    for segment in 0..8 {
        path.extend(base_arc(segment, 0.0));
        path.push(peak);
    }
    Wireframe::from_paths([path])
}

fn cylinder() -> Wireframe {
    let up = Vector3::new(0.0, 0.0, 1.0);
    let mut path = Vec::new();
    for segment in 0..8 {
        let arc = base_arc(segment, 0.0);
        let end = arc[arc.len() - 1];
        path.extend(arc);
        if segment < 7 {
            path.push(end + up);
            path.push(end);
        }
    }
    path.extend((0..17).map(|k| {
        let t = k as f64 * 2.0 * PI / 16.0;
        Point3::new(t.cos() / 2.0, t.sin() / 2.0, 1.0)
    }));
    Wireframe::from_paths([path])
}
