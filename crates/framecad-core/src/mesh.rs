//! 外部网格导入
//!
//! 网格解析由外部实现 [`MeshImport`]；核心只负责把顶点归一化到单位盒
//! （x/y 居中，底面在 z=0），并据此创建自定义网格零件。
//!
//! 网格零件的线框由单位盒六个外侧面上的顶点轮廓组成：
//! 取落在某个面上的顶点，投影到该面做凸包，首尾相接成一条路径。

use crate::cost::CostModel;
use crate::entity::{Part, PartSource};
use crate::error::{CoreError, CoreResult};
use crate::hull::convex_hull;
use crate::math::{BoundingBox3, Point2, Point3, Vector3};
use crate::wireframe::Wireframe;
use std::path::Path;

/// 原始网格数据
#[derive(Debug, Clone, PartialEq)]
pub struct MeshData {
    pub name: String,
    pub file: String,
    pub vertices: Vec<Point3>,
}

/// 网格导入接口
pub trait MeshImport {
    fn import(&self, path: &Path) -> CoreResult<MeshData>;
}

/// 顶点落在面上的容差（单位盒坐标）
const FACE_EPSILON: f64 = 1e-3;

/// 归一化结果
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedMesh {
    /// 单位盒内的面轮廓线框
    pub wireframe: Wireframe,
    /// 原始尺寸 (dim1, dim2, length)
    pub dims: Vector3,
    /// 原始包围盒
    pub bounds: BoundingBox3,
    /// 顶点归一化到单位盒后的坐标
    pub unit_vertices: Vec<Point3>,
}

/// 把网格顶点映射到单位盒
pub fn normalize_points(points: &[Point3]) -> CoreResult<NormalizedMesh> {
    if points.is_empty() {
        return Err(CoreError::InvalidMesh("mesh has no vertices".to_string()));
    }
    if points.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
        return Err(CoreError::InvalidMesh("mesh has non-finite vertices".to_string()));
    }
    let bounds = BoundingBox3::from_points(points.iter().copied());
    let dims = bounds.size();
    if dims.iter().any(|d| *d <= 0.0) {
        return Err(CoreError::InvalidMesh(format!(
            "mesh is flat: extent {:.3} x {:.3} x {:.3}",
            dims.x, dims.y, dims.z
        )));
    }
    let mut base = bounds.center().coords;
    base.z = bounds.min.z;
    let unit_vertices: Vec<Point3> = points
        .iter()
        .map(|p| Point3::from((p.coords - base).component_div(&dims)))
        .collect();

    Ok(NormalizedMesh {
        wireframe: face_outlines(&unit_vertices),
        dims,
        bounds,
        unit_vertices,
    })
}

/// 六个外侧面（±x, ±y, ±z）上的顶点轮廓
fn face_outlines(unit: &[Point3]) -> Wireframe {
    let mut paths = Vec::new();
    for axis in 0..3 {
        let (u, v) = ((axis + 1) % 3, (axis + 2) % 3);
        let lo = unit.iter().map(|p| p[axis]).fold(f64::INFINITY, f64::min);
        let hi = unit.iter().map(|p| p[axis]).fold(f64::NEG_INFINITY, f64::max);
        for level in [hi, lo] {
            let projected: Vec<Option<Point2>> = unit
                .iter()
                .filter(|p| (p[axis] - level).abs() < FACE_EPSILON)
                .map(|p| Some(Point2::new(p[u], p[v])))
                .collect();
            let outline: Vec<Point3> = convex_hull(&projected)
                .closed_outline()
                .into_iter()
                .map(|q| {
                    let mut p = Point3::origin();
                    p[axis] = level;
                    p[u] = q.x;
                    p[v] = q.y;
                    p
                })
                .collect();
            if !outline.is_empty() {
                paths.push(outline);
            }
        }
    }
    Wireframe::from_paths(paths)
}

impl Part {
    /// 由归一化网格创建自定义零件（长度固定为网格高度）
    pub fn from_mesh(mesh: &MeshData, normalized: &NormalizedMesh, price: f64) -> Self {
        Part::new(&mesh.name, normalized.wireframe.clone(), normalized.dims)
            .with_fixed_length(true)
            .with_cost(CostModel::Fixed(price))
            .with_color("lightgrey")
            .with_model_file(&mesh.file)
            .with_source(PartSource::Mesh {
                offset: Vector3::new(0.0, 0.0, -normalized.bounds.min.z),
            })
    }
}
