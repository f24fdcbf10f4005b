//! 实体模型
//!
//! 实体是一个闭合的变体集合：
//! - [`Part`]：叶子零件，自带线框、变换、接口与成本
//! - [`Group`]：有序、无重复的子实体列表，绕子实体顶点质心整体旋转
//!
//! 每个实体在创建时获得唯一的 [`EntityId`]，视口的命中索引以此反查实体。

use crate::cost::CostModel;
use crate::error::{CoreError, CoreResult};
use crate::export::ExportFormatter;
use crate::math::{snap_to_grid, BoundingBox3, Point3, Vector3};
use crate::rotation::{is_proper_rotation, right_angle_rotation, Transform};
use crate::wireframe::Wireframe;
use nalgebra::Rotation3;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// 全局实体ID计数器
static NEXT_ENTITY_ID: AtomicU64 = AtomicU64::new(1);

/// 判定正交矩阵的容差
const ORIENTATION_TOLERANCE: f64 = 1e-6;

/// 实体唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl EntityId {
    /// 分配新的ID
    pub fn next() -> Self {
        Self(NEXT_ENTITY_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// 保证之后分配的ID都大于 `max`（加载文档后调用）
    pub fn reserve_through(max: EntityId) {
        NEXT_ENTITY_ID.fetch_max(max.0 + 1, Ordering::Relaxed);
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// 零件接口：局部坐标系中的热点与单位方向
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    pub name: String,
    pub hotspot: Vector3,
    pub direction: Vector3,
}

impl Interface {
    pub fn new(name: impl Into<String>, hotspot: Vector3, direction: Vector3) -> Self {
        Self {
            name: name.into(),
            hotspot,
            direction,
        }
    }

    /// 世界坐标中的热点与方向
    pub fn world_pose(&self, owner: &Transform) -> (Point3, Vector3) {
        (
            owner.apply(&Point3::from(self.hotspot)),
            owner.apply_vector(&self.direction),
        )
    }
}

/// 零件几何的来源
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PartSource {
    /// 目录零件：单位模型按尺寸缩放
    Catalog,
    /// 外部网格：模型文件按原尺寸引用，`offset` 把底面移到 z=0
    Mesh { offset: Vector3 },
}

/// 叶子零件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub name: String,
    pub transform: Transform,
    pub dim1: f64,
    pub dim2: f64,
    pub length: f64,
    /// 长度由目录固定时为 true，`set_length` 不生效
    pub fixed_length: bool,
    unit_wireframe: Wireframe,
    pub interfaces: Vec<Interface>,
    pub cost_model: CostModel,
    pub color: String,
    /// 导出时引用的模型文件
    pub model_file: String,
    pub source: PartSource,
}

impl Part {
    /// 以单位线框和尺寸创建零件
    pub fn new(name: impl Into<String>, unit_wireframe: Wireframe, dims: Vector3) -> Self {
        Self {
            name: name.into(),
            transform: Transform::identity(),
            dim1: dims.x,
            dim2: dims.y,
            length: dims.z,
            fixed_length: false,
            unit_wireframe,
            interfaces: Vec::new(),
            cost_model: CostModel::default(),
            color: "silver".to_string(),
            model_file: String::new(),
            source: PartSource::Catalog,
        }
    }

    pub fn with_interfaces(mut self, interfaces: Vec<Interface>) -> Self {
        self.interfaces = interfaces;
        self
    }

    pub fn with_cost(mut self, cost_model: CostModel) -> Self {
        self.cost_model = cost_model;
        self
    }

    pub fn with_color(mut self, color: impl Into<String>) -> Self {
        self.color = color.into();
        self
    }

    pub fn with_model_file(mut self, model_file: impl Into<String>) -> Self {
        self.model_file = model_file.into();
        self
    }

    pub fn with_fixed_length(mut self, fixed: bool) -> Self {
        self.fixed_length = fixed;
        self
    }

    pub fn with_source(mut self, source: PartSource) -> Self {
        self.source = source;
        self
    }

    pub fn dims(&self) -> Vector3 {
        Vector3::new(self.dim1, self.dim2, self.length)
    }

    pub fn unit_wireframe(&self) -> &Wireframe {
        &self.unit_wireframe
    }

    /// 修改长度（目录固定长度的零件忽略）
    pub fn set_length(&mut self, length: f64) {
        if !self.fixed_length {
            self.length = length;
        }
    }

    /// 局部坐标系中按尺寸缩放后的线框
    pub fn local_wireframe(&self) -> Wireframe {
        self.unit_wireframe.scaled(&self.dims())
    }

    /// 世界坐标线框（含断点）
    pub fn wireframe(&self) -> Wireframe {
        self.local_wireframe().transformed(&self.transform)
    }

    pub fn cost(&self) -> f64 {
        self.cost_model.cost(self.length)
    }

    /// 物料清单行：`name,dim1,dim2,length,cost`
    pub fn bom_line(&self) -> String {
        format!(
            "{},{},{},{},{}",
            self.name,
            self.dim1,
            self.dim2,
            self.length,
            self.cost()
        )
    }
}

/// 组合实体
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Group {
    children: Vec<Entity>,
    /// 子实体顶点的质心（空组为原点）
    position: Point3,
}

impl Group {
    pub fn new() -> Self {
        Self::default()
    }

    /// 由实体列表构造，重复的ID被丢弃
    pub fn from_children(children: impl IntoIterator<Item = Entity>) -> Self {
        let mut group = Self::new();
        for child in children {
            group.append(child);
        }
        group
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[Entity] {
        &self.children
    }

    pub fn position(&self) -> Point3 {
        self.position
    }

    /// 添加子实体，已存在时返回 false
    pub fn append(&mut self, entity: Entity) -> bool {
        if self.children.iter().any(|c| c.id == entity.id) {
            return false;
        }
        self.children.push(entity);
        self.refresh_position();
        true
    }

    /// 移除直接子实体
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.children.iter().position(|c| c.id == id)?;
        let removed = self.children.remove(idx);
        self.refresh_position();
        Some(removed)
    }

    /// 解散组合，返回全部子实体
    pub fn into_children(self) -> Vec<Entity> {
        self.children
    }

    /// 是否（递归）包含该ID
    pub fn contains(&self, id: EntityId) -> bool {
        self.children.iter().any(|c| c.contains(id))
    }

    pub fn vertices(&self) -> Vec<Point3> {
        self.children.iter().flat_map(|c| c.vertices()).collect()
    }

    /// 旋转中心：单个子实体时取其位置，否则取顶点质心（可选网格捕捉）
    pub fn pivot(&self, snap_step: Option<f64>) -> Point3 {
        let members: Vec<&Entity> = self.children.iter().collect();
        rotation_pivot(&members, snap_step)
    }

    fn refresh_position(&mut self) {
        self.position = vertex_centroid(&self.vertices());
    }
}

fn vertex_centroid(vertices: &[Point3]) -> Point3 {
    if vertices.is_empty() {
        return Point3::origin();
    }
    let sum = vertices.iter().fold(Vector3::zeros(), |acc, v| acc + v.coords);
    Point3::from(sum / vertices.len() as f64)
}

/// 一组实体作为整体旋转时的中心
pub fn rotation_pivot(members: &[&Entity], snap_step: Option<f64>) -> Point3 {
    let center = match members {
        [only] => only.position(),
        _ => {
            let vertices: Vec<Point3> = members.iter().flat_map(|m| m.vertices()).collect();
            vertex_centroid(&vertices)
        }
    };
    match snap_step {
        Some(step) => Point3::from(snap_to_grid(&center.coords, step)),
        None => center,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    Part(Part),
    Group(Group),
}

/// 场景中的实体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub kind: EntityKind,
}

impl From<Part> for Entity {
    fn from(part: Part) -> Self {
        Entity::new(EntityKind::Part(part))
    }
}

impl From<Group> for Entity {
    fn from(group: Group) -> Self {
        Entity::new(EntityKind::Group(group))
    }
}

impl Entity {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            id: EntityId::next(),
            kind,
        }
    }

    pub fn as_part(&self) -> Option<&Part> {
        match &self.kind {
            EntityKind::Part(p) => Some(p),
            EntityKind::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&Group> {
        match &self.kind {
            EntityKind::Group(g) => Some(g),
            EntityKind::Part(_) => None,
        }
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, EntityKind::Group(_))
    }

    /// 自身或任一后代的ID等于 `id`
    pub fn contains(&self, id: EntityId) -> bool {
        self.id == id
            || match &self.kind {
                EntityKind::Part(_) => false,
                EntityKind::Group(g) => g.contains(id),
            }
    }

    /// 零件位置或组合质心
    pub fn position(&self) -> Point3 {
        match &self.kind {
            EntityKind::Part(p) => Point3::from(p.transform.position),
            EntityKind::Group(g) => g.position,
        }
    }

    pub fn translate(&mut self, v: &Vector3) {
        match &mut self.kind {
            EntityKind::Part(p) => p.transform.translate(v),
            EntityKind::Group(g) => {
                if g.children.is_empty() {
                    return;
                }
                for child in &mut g.children {
                    child.translate(v);
                }
                g.refresh_position();
            }
        }
    }

    /// 按直角旋转（参数以直角为单位）
    pub fn rotate(&mut self, roll: f64, pitch: f64, yaw: f64) {
        self.rotate_snapped(roll, pitch, yaw, None);
    }

    /// 组合的旋转中心可选网格捕捉
    pub fn rotate_snapped(&mut self, roll: f64, pitch: f64, yaw: f64, snap_step: Option<f64>) {
        let rotation = right_angle_rotation(roll, pitch, yaw);
        match &mut self.kind {
            EntityKind::Part(p) => p.transform.rotate(&rotation),
            EntityKind::Group(g) => {
                let pivot = g.pivot(snap_step);
                for child in &mut g.children {
                    child.rotate_about(&rotation, &pivot);
                }
                g.refresh_position();
            }
        }
    }

    /// 绕给定点刚体旋转
    pub fn rotate_about(&mut self, rotation: &Rotation3<f64>, center: &Point3) {
        match &mut self.kind {
            EntityKind::Part(p) => p.transform.rotate_about(rotation, center),
            EntityKind::Group(g) => {
                for child in &mut g.children {
                    child.rotate_about(rotation, center);
                }
                g.refresh_position();
            }
        }
    }

    /// 世界坐标线框；组合的子线框之间以断点分隔
    pub fn wireframe(&self) -> Wireframe {
        match &self.kind {
            EntityKind::Part(p) => p.wireframe(),
            EntityKind::Group(g) => {
                let mut rows = Vec::new();
                for child in &g.children {
                    if !rows.is_empty() {
                        rows.push(None);
                    }
                    rows.extend_from_slice(child.wireframe().rows());
                }
                Wireframe::from_rows(rows)
            }
        }
    }

    /// 世界坐标顶点（不含断点）
    pub fn vertices(&self) -> Vec<Point3> {
        match &self.kind {
            EntityKind::Part(p) => p.wireframe().vertices().collect(),
            EntityKind::Group(g) => g.vertices(),
        }
    }

    pub fn bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(self.vertices())
    }

    /// 深拷贝，保留变换，所有层级重新分配ID
    pub fn dup(&self) -> Entity {
        let kind = match &self.kind {
            EntityKind::Part(p) => EntityKind::Part(p.clone()),
            EntityKind::Group(g) => EntityKind::Group(Group {
                children: g.children.iter().map(Entity::dup).collect(),
                position: g.position,
            }),
        };
        Entity::new(kind)
    }

    pub fn cost(&self) -> f64 {
        match &self.kind {
            EntityKind::Part(p) => p.cost(),
            EntityKind::Group(g) => g.children.iter().map(Entity::cost).sum(),
        }
    }

    pub fn bom_lines(&self) -> Vec<String> {
        self.leaves().into_iter().map(|(_, p)| p.bom_line()).collect()
    }

    /// 所有叶子零件（含其ID），按深度优先顺序
    pub fn leaves(&self) -> Vec<(EntityId, &Part)> {
        match &self.kind {
            EntityKind::Part(p) => vec![(self.id, p)],
            EntityKind::Group(g) => g.children.iter().flat_map(Entity::leaves).collect(),
        }
    }

    /// 自身及所有后代的ID
    pub fn ids(&self) -> Vec<EntityId> {
        let mut out = vec![self.id];
        if let EntityKind::Group(g) = &self.kind {
            out.extend(g.children.iter().flat_map(Entity::ids));
        }
        out
    }

    pub fn to_export_string(&self, formatter: &dyn ExportFormatter) -> String {
        match &self.kind {
            EntityKind::Part(p) => formatter.part(p),
            EntityKind::Group(g) => {
                let members: Vec<String> = g
                    .children
                    .iter()
                    .map(|c| c.to_export_string(formatter))
                    .collect();
                formatter.group(&members)
            }
        }
    }

    /// 检查反序列化得到的实体满足工厂创建时的不变量
    pub fn validate(&self) -> CoreResult<()> {
        match &self.kind {
            EntityKind::Part(p) => {
                if !is_proper_rotation(p.transform.orientation().matrix(), ORIENTATION_TOLERANCE) {
                    return Err(CoreError::InvalidOrientation { id: self.id });
                }
                Ok(())
            }
            EntityKind::Group(g) => {
                let mut seen = HashSet::new();
                for child in &g.children {
                    if !seen.insert(child.id) {
                        return Err(CoreError::DuplicateMember(child.id));
                    }
                    child.validate()?;
                }
                Ok(())
            }
        }
    }

    /// 重新计算组合缓存的质心（反序列化后调用）
    pub fn refresh(&mut self) {
        if let EntityKind::Group(g) = &mut self.kind {
            for child in &mut g.children {
                child.refresh();
            }
            g.refresh_position();
        }
    }
}

/// 校验一组顶层实体：各自合法，且所有层级的ID全局唯一
pub fn validate_entities(entities: &[Entity]) -> CoreResult<()> {
    let mut seen = HashSet::new();
    for entity in entities {
        entity.validate()?;
        for id in entity.ids() {
            if !seen.insert(id) {
                return Err(CoreError::DuplicateMember(id));
            }
        }
    }
    Ok(())
}
