//! 显示列表
//!
//! 每个视口保留自己已绘制的图元，每个图元带一个标签说明它来自哪里。
//! 实体图元额外登记到反向索引（图元ID → 实体ID），命中测试据此找回实体。

use framecad_core::entity::EntityId;
use framecad_core::math::{closest_point_on_segment, BoundingBox2, Point2};
use std::collections::{BTreeMap, HashMap};

/// RGBA 颜色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 160, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const LIGHT_GREY: Color = Color::rgb(211, 211, 211);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub fn from_array(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }
}

/// 图元ID（视口内唯一）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrimitiveId(pub u64);

/// 图元来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// 实体线框
    Entity(EntityId),
    /// 实体上未啮合接口的提示线
    Interface(EntityId),
    /// 坐标轴
    Axes,
    /// 高亮轮廓
    Highlight,
    /// 框选矩形
    SelectionBox,
}

impl Tag {
    /// 是否属于该实体（线框或接口提示）
    pub fn belongs_to(&self, id: EntityId) -> bool {
        matches!(self, Tag::Entity(e) | Tag::Interface(e) if *e == id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Polyline(Vec<Point2>),
    Rectangle { min: Point2, max: Point2 },
    Dot { center: Point2, radius: f64 },
    Label { position: Point2, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub id: PrimitiveId,
    pub tag: Tag,
    pub shape: Shape,
    pub color: Color,
    pub width: f64,
}

#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    primitives: BTreeMap<PrimitiveId, Primitive>,
    /// 图元 → 实体
    owners: HashMap<PrimitiveId, EntityId>,
    next_id: u64,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.primitives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.primitives.is_empty()
    }

    /// 按绘制顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Primitive> {
        self.primitives.values()
    }

    pub fn add(&mut self, tag: Tag, shape: Shape, color: Color, width: f64) -> PrimitiveId {
        let id = PrimitiveId(self.next_id);
        self.next_id += 1;
        if let Tag::Entity(owner) = tag {
            self.owners.insert(id, owner);
        }
        self.primitives.insert(
            id,
            Primitive {
                id,
                tag,
                shape,
                color,
                width,
            },
        );
        id
    }

    /// 删除带某个标签的所有图元，返回删除数量
    pub fn erase_tag(&mut self, tag: Tag) -> usize {
        self.erase_where(|t| *t == tag)
    }

    /// 删除实体的线框和接口提示
    pub fn erase_entity(&mut self, id: EntityId) -> usize {
        self.erase_where(|t| t.belongs_to(id))
    }

    fn erase_where(&mut self, pred: impl Fn(&Tag) -> bool) -> usize {
        let before = self.primitives.len();
        self.primitives.retain(|pid, p| {
            let keep = !pred(&p.tag);
            if !keep {
                self.owners.remove(pid);
            }
            keep
        });
        before - self.primitives.len()
    }

    pub fn clear(&mut self) {
        self.primitives.clear();
        self.owners.clear();
    }

    /// 图元所属的实体
    pub fn owner(&self, id: PrimitiveId) -> Option<EntityId> {
        self.owners.get(&id).copied()
    }

    /// 引用该实体的图元数量
    pub fn count_for(&self, id: EntityId) -> usize {
        self.primitives.values().filter(|p| p.tag.belongs_to(id)).count()
    }

    pub fn count_tag(&self, tag: Tag) -> usize {
        self.primitives.values().filter(|p| p.tag == tag).count()
    }

    /// 离 `p` 最近的实体图元（距离不超过 `tolerance`）
    ///
    /// 距离相同时取后绘制的图元（画在上层的那个）。
    pub fn hit_test(&self, p: Point2, tolerance: f64) -> Option<(EntityId, f64)> {
        let mut best: Option<(EntityId, f64)> = None;
        for prim in self.primitives.values() {
            let (Tag::Entity(owner), Shape::Polyline(points)) = (prim.tag, &prim.shape) else {
                continue;
            };
            let distance = polyline_distance(points, p);
            if distance <= tolerance && best.map_or(true, |(_, d)| distance <= d) {
                best = Some((owner, distance));
            }
        }
        best
    }

    /// 所有图元的包围盒（标签和点不计入）
    pub fn bounds(&self) -> BoundingBox2 {
        let mut bbox = BoundingBox2::empty();
        for p in self.primitives.values() {
            match &p.shape {
                Shape::Polyline(points) => points.iter().for_each(|q| bbox.expand_to_include(q)),
                Shape::Rectangle { min, max } => {
                    bbox.expand_to_include(min);
                    bbox.expand_to_include(max);
                }
                Shape::Dot { .. } | Shape::Label { .. } => {}
            }
        }
        bbox
    }
}

/// 点到折线的最短距离
pub fn polyline_distance(points: &[Point2], p: Point2) -> f64 {
    match points {
        [] => f64::INFINITY,
        [only] => (p - only).norm(),
        _ => points
            .windows(2)
            .map(|w| closest_point_on_segment(w[0], w[1], p).1)
            .fold(f64::INFINITY, f64::min),
    }
}
