//! 正交视口
//!
//! 视口由两个正交基向量（投影平面）、缩放和像素偏移定义：
//! - 投影：`p = Bᵀ·v·scale + offset`
//! - 反投影：`v = B·(p - offset) / scale`
//!
//! 视口持有自己的显示列表，绘制实体时按路径断点拆分，每段一个图元。

use crate::display::{Color, DisplayList, Shape, Tag};
use crate::interaction::Gesture;
use framecad_core::engagement::interface_stubs;
use framecad_core::entity::{Entity, EntityId};
use framecad_core::hull::convex_hull;
use framecad_core::math::{BoundingBox2, Point2, Point3, Vector2, Vector3};
use framecad_core::scene::Scene;
use framecad_core::wireframe::Wireframe;
use nalgebra::Matrix3x2;

/// 坐标轴长度（像素）
const AXIS_LENGTH: f64 = 50.0;
/// 坐标轴标签距离（像素）
const AXIS_LABEL_DISTANCE: f64 = 55.0;

#[derive(Debug, Clone)]
pub struct Viewport {
    name: String,
    basis: Matrix3x2<f64>,
    scale: f64,
    offset: Vector2,
    size: Vector2,
    axes_on: bool,
    display: DisplayList,
    pub(crate) gesture: Gesture,
}

impl Viewport {
    /// `ihat`、`jhat` 为屏幕 x、y 方向对应的世界方向
    pub fn new(name: impl Into<String>, ihat: Vector3, jhat: Vector3, offset: Vector2, scale: f64) -> Self {
        let mut view = Self {
            name: name.into(),
            basis: Matrix3x2::from_columns(&[ihat.normalize(), jhat.normalize()]),
            scale,
            offset,
            size: Vector2::new(offset.x * 2.0, offset.y * 2.0),
            axes_on: true,
            display: DisplayList::new(),
            gesture: Gesture::Idle,
        };
        view.draw_axes();
        view
    }

    /// 等轴测视口：视线方位角 `theta`、俯角 `phi`（弧度）
    pub fn from_theta_phi(name: impl Into<String>, theta: f64, phi: f64, offset: Vector2, scale: f64) -> Self {
        let pov = Vector3::new(-phi.sin(), 0.0, -phi.cos());
        let (s, c) = theta.sin_cos();
        let pov = Vector3::new(c * pov.x + s * pov.y, -s * pov.x + c * pov.y, pov.z);

        let up = Vector3::z();
        let iso_z = (up - pov * up.dot(&pov)).normalize();
        let iso_x = pov.cross(&iso_z);
        let iso_y = iso_z.cross(&iso_x);
        Self::new(name, -iso_x, iso_y, offset, scale)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn basis(&self) -> &Matrix3x2<f64> {
        &self.basis
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn offset(&self) -> Vector2 {
        self.offset
    }

    pub fn size(&self) -> Vector2 {
        self.size
    }

    pub fn set_size(&mut self, size: Vector2) {
        self.size = size;
    }

    pub fn axes_on(&self) -> bool {
        self.axes_on
    }

    pub fn display(&self) -> &DisplayList {
        &self.display
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    // ========== 投影 ==========

    pub fn project(&self, v: &Point3) -> Point2 {
        Point2::from(self.basis.transpose() * v.coords * self.scale + self.offset)
    }

    pub fn invert(&self, p: &Point2) -> Point3 {
        Point3::from(self.basis * (p.coords - self.offset) / self.scale)
    }

    /// 像素坐标（不含偏移）→ 世界坐标，用于拖动增量
    pub fn unproject_delta(&self, p: &Point2) -> Vector3 {
        self.basis * p.coords / self.scale
    }

    /// 世界向量在本视口平面上的像素分量（不含缩放）
    pub fn plane_components(&self, v: &Vector3) -> Vector2 {
        self.basis.transpose() * v
    }

    /// 线框投影为像素折线，按断点拆分
    pub fn project_paths(&self, wireframe: &Wireframe) -> Vec<Vec<Point2>> {
        wireframe
            .paths()
            .iter()
            .map(|path| path.iter().map(|v| self.project(v)).collect())
            .collect()
    }

    /// 实体投影后的像素包围盒
    pub fn projected_bounds(&self, entity: &Entity) -> BoundingBox2 {
        BoundingBox2::from_points(entity.vertices().iter().map(|v| self.project(v)))
    }

    // ========== 视图变换 ==========

    /// 修改缩放，`pivot` 在屏幕上的位置保持不变
    ///
    /// `offset' = (s0 - s1)·Bᵀ·pivot + offset`
    pub fn set_scale(&mut self, scale: f64, pivot: Option<&Point3>) {
        let old = self.scale;
        self.scale = scale;
        if let Some(p) = pivot {
            self.offset += self.basis.transpose() * p.coords * (old - scale);
        }
    }

    /// 平移：世界向量按本视口的基换算为像素偏移
    pub fn slew(&mut self, delta: &Vector3) {
        self.offset += self.plane_components(delta);
    }

    /// 让世界点落在视口中心
    pub fn center_on(&mut self, p: &Point3) {
        self.offset = self.size / 2.0 - self.basis.transpose() * p.coords * self.scale;
    }

    // ========== 绘制 ==========

    fn stroke_width(&self, selected: bool) -> f64 {
        let cap = if selected { 3.0 } else { 1.5 };
        self.scale.min(cap).max(1.0)
    }

    /// 重新绘制单个实体（先擦除旧图元）
    pub fn render_entity(&mut self, entity: &Entity, selected: bool, scene: Option<&Scene>) {
        self.display.erase_entity(entity.id);
        let color = if selected { Color::RED } else { Color::BLACK };
        let width = self.stroke_width(selected);
        for path in self.project_paths(&entity.wireframe()) {
            self.display.add(Tag::Entity(entity.id), Shape::Polyline(path), color, width);
        }

        let Some(scene) = scene else {
            return;
        };
        for stub in interface_stubs(entity, scene) {
            let path = vec![self.project(&stub.start), self.project(&stub.end)];
            self.display.add(
                Tag::Interface(entity.id),
                Shape::Polyline(path),
                Color::from_array(stub.color),
                width,
            );
        }
    }

    pub fn erase_entity(&mut self, id: EntityId) {
        self.display.erase_entity(id);
    }

    pub fn erase_all(&mut self) {
        self.display.clear();
    }

    /// 擦除全部后重画坐标轴和整个场景
    pub fn redraw(&mut self, scene: &Scene, show_interfaces: bool) {
        self.erase_all();
        self.draw_axes();
        let context = show_interfaces.then_some(scene);
        for entity in scene.unselected() {
            self.render_entity(entity, false, context);
        }
        for entity in scene.selected() {
            self.render_entity(entity, true, context);
        }
    }

    pub fn draw_axes(&mut self) {
        self.display.erase_tag(Tag::Axes);
        if !self.axes_on {
            return;
        }
        let origin = Point2::from(self.offset);
        self.display.add(
            Tag::Axes,
            Shape::Dot {
                center: origin,
                radius: 2.0,
            },
            Color::BLACK,
            1.0,
        );
        let length = AXIS_LENGTH / self.scale;
        let axes = [
            (Vector3::x(), Color::RED, "x"),
            (Vector3::y(), Color::GREEN, "y"),
            (Vector3::z(), Color::BLUE, "z"),
        ];
        for (axis, color, label) in axes {
            let tip = self.project(&Point3::from(axis * length));
            self.display
                .add(Tag::Axes, Shape::Polyline(vec![origin, tip]), color, 0.25);

            // 垂直于屏幕的轴不画标签
            let label_offset = self.plane_components(&(axis * AXIS_LABEL_DISTANCE));
            if label_offset.norm_squared() > 10.0 {
                self.display.add(
                    Tag::Axes,
                    Shape::Label {
                        position: origin + label_offset,
                        text: label.to_string(),
                    },
                    Color::BLACK,
                    1.0,
                );
            }
        }
    }

    pub fn toggle_axes(&mut self) {
        self.axes_on = !self.axes_on;
        self.draw_axes();
    }

    /// 以投影凸包轮廓高亮实体
    pub fn highlight(&mut self, entity: &Entity, color: Color) {
        let projected: Vec<Option<Point2>> = entity
            .wireframe()
            .rows()
            .iter()
            .map(|row| row.as_ref().map(|v| self.project(v)))
            .collect();
        let hull = convex_hull(&projected);
        if hull.is_empty() {
            return;
        }
        let width = self.stroke_width(true) * 4.0;
        self.display
            .add(Tag::Highlight, Shape::Polyline(hull.closed_outline()), color, width);
    }

    pub fn unhighlight(&mut self) {
        self.display.erase_tag(Tag::Highlight);
    }

    pub fn draw_selection_box(&mut self, a: Point2, b: Point2) {
        self.display.erase_tag(Tag::SelectionBox);
        let rect = BoundingBox2::from_corners(a, b);
        self.display.add(
            Tag::SelectionBox,
            Shape::Rectangle {
                min: rect.min,
                max: rect.max,
            },
            Color::LIGHT_GREY,
            1.0,
        );
    }

    pub fn clear_selection_box(&mut self) {
        self.display.erase_tag(Tag::SelectionBox);
    }

    // ========== 查询 ==========

    /// 命中测试：返回图元所属的实体
    pub fn hit_test(&self, p: Point2, tolerance: f64) -> Option<EntityId> {
        self.display.hit_test(p, tolerance).map(|(id, _)| id)
    }

    /// 投影包围盒完全落在矩形内的顶层实体
    pub fn entities_in_rect(&self, scene: &Scene, a: Point2, b: Point2) -> Vec<EntityId> {
        let rect = BoundingBox2::from_corners(a, b);
        scene
            .entities()
            .iter()
            .filter(|e| rect.contains_box(&self.projected_bounds(e)))
            .map(|e| e.id)
            .collect()
    }
}
