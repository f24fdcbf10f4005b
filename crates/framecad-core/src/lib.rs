//! FrameCAD 核心
//!
//! 刚性参数化零件（型材、角件、自定义网格）装配的几何内核与实体模型。
//!
//! # 架构设计
//!
//! 自底向上：
//! - 几何内核：直角旋转、点到线段距离、凸包、网格捕捉
//! - 实体模型：`Part`（叶子）、`Group`（组合）、`Scene`（文档根 + 选择集）
//! - 撤销历史：基于快照，有界深度
//!
//! # 示例
//!
//! ```rust
//! use framecad_core::prelude::*;
//!
//! let catalog = BuiltinCatalog::new();
//! let part = catalog.resolve("2020 Alex", 500.0).unwrap();
//!
//! let mut scene = Scene::new();
//! let id = scene.append(Entity::from(part), true);
//! scene.rotate_selected(0.0, 0.0, 1.0, None);
//! assert!(scene.is_selected(id));
//! ```

pub mod catalog;
pub mod cost;
pub mod engagement;
pub mod entity;
pub mod error;
pub mod export;
pub mod history;
pub mod hull;
pub mod math;
pub mod mesh;
pub mod rotation;
pub mod scene;
pub mod wireframe;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::catalog::{BuiltinCatalog, CatalogRecord, PartCatalog};
    pub use crate::cost::CostModel;
    pub use crate::engagement::{interface_stubs, InterfaceStub};
    pub use crate::entity::{Entity, EntityId, EntityKind, Group, Interface, Part, PartSource};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::export::{ExportFormatter, ExportHook, NoExport};
    pub use crate::history::History;
    pub use crate::hull::{convex_hull, Hull};
    pub use crate::math::{
        closest_point_on_segment, snap_to_grid, BoundingBox2, BoundingBox3, Point2, Point3,
        Vector2, Vector3,
    };
    pub use crate::mesh::{normalize_points, MeshData, MeshImport};
    pub use crate::rotation::{right_angle_rotation, Generator, Transform};
    pub use crate::scene::{Alignment, Scene};
    pub use crate::wireframe::Wireframe;
}
