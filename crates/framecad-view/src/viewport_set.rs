//! 视口集合
//!
//! 与单个视口相同的接口，逐个转发给所有视口；需要单一结果时取第一个视口的值。

use crate::config::EditorConfig;
use crate::display::Color;
use crate::viewport::Viewport;
use framecad_core::entity::{Entity, EntityId};
use framecad_core::math::{Point3, Vector2, Vector3};
use framecad_core::scene::Scene;

/// 等轴测视口的方位角、俯角（度）
pub const ISO_THETA_DEG: f64 = 240.0;
pub const ISO_PHI_DEG: f64 = 35.0;

/// 侧视图等视口的原点距底边的距离（像素）
const GROUND_MARGIN: f64 = 50.0;

#[derive(Debug, Clone, Default)]
pub struct ViewportSet {
    views: Vec<Viewport>,
}

impl ViewportSet {
    pub fn new(views: Vec<Viewport>) -> Self {
        Self { views }
    }

    /// 俯视、侧视、正视、等轴测四个视口
    pub fn standard(config: &EditorConfig) -> Self {
        let [w, h] = config.view_size;
        let scale = config.initial_scale;
        let center = Vector2::new(w / 2.0, h / 2.0);
        let ground = Vector2::new(w / 2.0, h - GROUND_MARGIN);
        let mut views = vec![
            Viewport::new("top", Vector3::x(), -Vector3::y(), center, scale),
            Viewport::new("side", Vector3::y(), -Vector3::z(), ground, scale),
            Viewport::new("front", Vector3::x(), -Vector3::z(), ground, scale),
            Viewport::from_theta_phi(
                "iso",
                ISO_THETA_DEG.to_radians(),
                ISO_PHI_DEG.to_radians(),
                ground,
                scale,
            ),
        ];
        for view in &mut views {
            view.set_size(Vector2::new(w, h));
        }
        Self::new(views)
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Viewport> {
        self.views.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Viewport> {
        self.views.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Viewport> {
        self.views.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Viewport> {
        self.views.iter_mut()
    }

    /// 第一个视口的缩放
    pub fn scale(&self) -> Option<f64> {
        self.views.first().map(Viewport::scale)
    }

    pub fn render(&mut self, entity: &Entity, selected: bool, scene: Option<&Scene>) {
        for view in &mut self.views {
            view.render_entity(entity, selected, scene);
        }
    }

    pub fn erase(&mut self, id: EntityId) {
        for view in &mut self.views {
            view.erase_entity(id);
        }
    }

    pub fn erase_all(&mut self) {
        for view in &mut self.views {
            view.erase_all();
        }
    }

    pub fn redraw(&mut self, scene: &Scene, show_interfaces: bool) {
        for view in &mut self.views {
            view.redraw(scene, show_interfaces);
        }
    }

    pub fn set_scale(&mut self, scale: f64, pivot: Option<&Point3>) {
        for view in &mut self.views {
            view.set_scale(scale, pivot);
        }
    }

    pub fn slew(&mut self, delta: &Vector3) {
        for view in &mut self.views {
            view.slew(delta);
        }
    }

    pub fn toggle_axes(&mut self) {
        for view in &mut self.views {
            view.toggle_axes();
        }
    }

    pub fn highlight(&mut self, entity: &Entity, color: Color) {
        for view in &mut self.views {
            view.highlight(entity, color);
        }
    }

    pub fn unhighlight(&mut self) {
        for view in &mut self.views {
            view.unhighlight();
        }
    }
}
