//! 编辑器上下文
//!
//! 持有场景、视口集合、撤销历史、配置、零件目录和导出钩子，
//! 所有命令和指针事件都通过它执行。每次变更遵循固定顺序：
//! 登记撤销 → 修改场景 → 重绘受影响的实体 → 调用导出钩子。

use crate::config::EditorConfig;
use crate::display::Color;
use crate::interaction::{drag_delta, Gesture, Modifiers};
use crate::viewport_set::ViewportSet;
use framecad_core::catalog::{BuiltinCatalog, PartCatalog};
use framecad_core::entity::{Entity, EntityId, Part};
use framecad_core::error::CoreResult;
use framecad_core::export::{ExportHook, NoExport};
use framecad_core::history::History;
use framecad_core::math::{BoundingBox2, Point2, Point3, Vector3, EPSILON};
use framecad_core::mesh::{normalize_points, MeshImport};
use framecad_core::scene::Scene;
use std::path::Path;
use tracing::{debug, info};

/// 缩放到选择集时占视口的比例
const ZOOM_FIT_FILL: f64 = 0.75;

/// 高亮颜色
const HIGHLIGHT_COLOR: Color = Color::RED;

pub struct Editor {
    scene: Scene,
    views: ViewportSet,
    history: History,
    config: EditorConfig,
    catalog: Box<dyn PartCatalog>,
    export_hook: Box<dyn ExportHook>,
    highlighted: bool,
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        let views = ViewportSet::standard(&config);
        Self::with_views(config, views)
    }

    pub fn with_views(config: EditorConfig, views: ViewportSet) -> Self {
        Self {
            scene: Scene::new(),
            views,
            history: History::new(config.history_depth),
            config,
            catalog: Box::new(BuiltinCatalog::new()),
            export_hook: Box::new(NoExport),
            highlighted: false,
        }
    }

    pub fn with_catalog(mut self, catalog: Box<dyn PartCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_export_hook(mut self, hook: Box<dyn ExportHook>) -> Self {
        self.export_hook = hook;
        self
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub(crate) fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    pub fn views(&self) -> &ViewportSet {
        &self.views
    }

    pub fn views_mut(&mut self) -> &mut ViewportSet {
        &mut self.views
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn catalog(&self) -> &dyn PartCatalog {
        self.catalog.as_ref()
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlighted
    }

    // ========== 场景变更 ==========

    /// 添加实体，只重绘该实体，然后导出
    pub fn append(&mut self, entity: Entity, select: bool) -> EntityId {
        let id = self.scene.append(entity, select);
        self.render_ids(&[id]);
        self.export();
        id
    }

    /// 移除实体并擦除它在所有视口中的图元
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.scene.remove(id)?;
        self.views.erase(id);
        self.export();
        Some(removed)
    }

    /// 从目录添加零件到原点
    pub fn add_part(&mut self, name: &str, length: f64) -> CoreResult<EntityId> {
        let part = self.catalog.resolve(name, length)?;
        self.register_undo();
        let id = self.append(Entity::from(part), false);
        info!("Added {} ({})", name, id);
        Ok(id)
    }

    /// 导入外部网格作为自定义零件，放在原点
    pub fn import_mesh(&mut self, importer: &dyn MeshImport, path: &Path, price: f64) -> CoreResult<EntityId> {
        let mesh = importer.import(path)?;
        let normalized = normalize_points(&mesh.vertices)?;
        let part = Part::from_mesh(&mesh, &normalized, price);
        self.register_undo();
        let id = self.append(Entity::from(part), false);
        info!("Imported mesh {} ({})", mesh.name, id);
        Ok(id)
    }

    /// 用加载的实体替换整个场景，清空历史
    pub fn load_entities(&mut self, entities: Vec<Entity>) {
        self.scene.clear();
        self.history.clear();
        self.highlighted = false;
        for entity in entities {
            self.scene.append(entity, false);
        }
        self.redraw();
        self.export();
        info!("Loaded {} entities", self.scene.len());
    }

    pub fn register_undo(&mut self) {
        self.history.register(&self.scene);
    }

    pub fn undo(&mut self) -> bool {
        if !self.history.undo(&mut self.scene) {
            return false;
        }
        self.redraw();
        self.export();
        true
    }

    pub fn redo(&mut self) -> bool {
        if !self.history.redo(&mut self.scene) {
            return false;
        }
        self.redraw();
        self.export();
        true
    }

    pub fn export(&mut self) {
        self.export_hook.export(&self.scene);
    }

    // ========== 绘制 ==========

    /// 在所有视口中重绘给定的顶层实体
    pub fn render_ids(&mut self, ids: &[EntityId]) {
        let context = self.config.show_interfaces.then_some(&self.scene);
        for id in ids {
            if let Some(entity) = self.scene.get(*id) {
                self.views.render(entity, self.scene.is_selected(*id), context);
            }
        }
    }

    pub fn render_selected(&mut self) {
        let ids = self.scene.selected_ids().to_vec();
        self.render_ids(&ids);
    }

    /// 擦除全部并重画
    pub fn redraw(&mut self) {
        self.views.redraw(&self.scene, self.config.show_interfaces);
        if self.highlighted {
            self.draw_highlight();
        }
    }

    fn draw_highlight(&mut self) {
        self.views.unhighlight();
        if let Some(last) = self.scene.last_selected() {
            self.views.highlight(last, HIGHLIGHT_COLOR);
        }
    }

    /// 切换最后选中实体的高亮
    pub fn toggle_highlight(&mut self) {
        if self.highlighted {
            self.views.unhighlight();
            self.highlighted = false;
        } else if self.scene.last_selected().is_some() {
            self.draw_highlight();
            self.highlighted = true;
        }
    }

    // ========== 视图 ==========

    /// 所有视口按系数缩放；`pivot` 在屏幕上保持不动
    pub fn zoom(&mut self, factor: f64, pivot: Option<Point3>) {
        let Some(scale) = self.views.scale() else {
            return;
        };
        self.views.set_scale(scale * factor, pivot.as_ref());
        self.redraw();
    }

    pub fn zoom_in(&mut self, pivot: Option<Point3>) {
        self.zoom(1.0 / self.config.zoom_factor, pivot);
    }

    pub fn zoom_out(&mut self, pivot: Option<Point3>) {
        self.zoom(self.config.zoom_factor, pivot);
    }

    pub fn zoom_in_lots(&mut self) {
        self.zoom(1.0 / self.config.zoom_factor_lots, None);
    }

    pub fn zoom_out_lots(&mut self) {
        self.zoom(self.config.zoom_factor_lots, None);
    }

    /// 滚轮缩放：以指针下的点为中心，`steps` 为正时放大
    pub fn zoom_at(&mut self, view: usize, pos: Point2, steps: i32) {
        let Some(viewport) = self.views.get(view) else {
            return;
        };
        let pivot = viewport.invert(&pos);
        let factor = self.config.zoom_factor.powi(-steps);
        self.zoom(factor, Some(pivot));
    }

    /// 缩放并平移，使选择集填满每个视口的 3/4，每个视口各自居中
    pub fn zoom_fit_selected(&mut self) -> bool {
        let vertices = self.scene.selection_vertices();
        if vertices.is_empty() {
            return false;
        }
        let Some(scale) = self.views.scale() else {
            return false;
        };

        let mut ratio = f64::INFINITY;
        for view in self.views.iter() {
            let extent = BoundingBox2::from_points(vertices.iter().map(|v| view.project(v))).size();
            let size = view.size();
            for (available, used) in [(size.x, extent.x), (size.y, extent.y)] {
                if used > EPSILON {
                    ratio = ratio.min(available / used);
                }
            }
        }
        if ratio.is_finite() {
            self.views.set_scale(ZOOM_FIT_FILL * ratio * scale, None);
        }

        let center = self.scene.selection_bounding_box().center();
        for view in self.views.iter_mut() {
            view.center_on(&center);
        }
        self.redraw();
        true
    }

    pub fn slew(&mut self, delta: &Vector3) {
        self.views.slew(delta);
        self.redraw();
    }

    pub fn toggle_axes(&mut self) {
        self.views.toggle_axes();
    }

    // ========== 指针事件 ==========

    fn set_gesture(&mut self, view: usize, gesture: Gesture) {
        if let Some(viewport) = self.views.get_mut(view) {
            viewport.gesture = gesture;
        }
    }

    /// 按下：点中实体时更新选择并开始拖动，否则开始框选
    pub fn pointer_down(&mut self, view: usize, pos: Point2, modifiers: Modifiers) {
        let Some(viewport) = self.views.get(view) else {
            return;
        };
        let hit = viewport
            .hit_test(pos, self.config.hit_tolerance)
            .and_then(|id| self.scene.owner_of(id));
        let start = viewport.unproject_delta(&pos);

        let gesture = match hit {
            Some(id) => {
                let changed = self.scene.click_select(id, modifiers.shift);
                self.render_ids(&changed);
                if self.scene.is_selected(id) {
                    Gesture::Dragging {
                        start,
                        last: Vector3::zeros(),
                        initialized: false,
                    }
                } else {
                    Gesture::Idle
                }
            }
            None => {
                if !modifiers.shift {
                    let changed = self.scene.clear_selection();
                    self.render_ids(&changed);
                }
                Gesture::BoxSelecting { anchor: pos }
            }
        };
        self.set_gesture(view, gesture);
    }

    pub fn pointer_move(&mut self, view: usize, pos: Point2, modifiers: Modifiers) {
        let Some(viewport) = self.views.get_mut(view) else {
            return;
        };
        let gesture = viewport.gesture;
        match gesture {
            Gesture::Idle => {}
            Gesture::BoxSelecting { anchor } => viewport.draw_selection_box(anchor, pos),
            Gesture::Dragging {
                start,
                last,
                initialized,
            } => {
                let current = viewport.unproject_delta(&pos);
                let delta = drag_delta(&start, &current, self.config.effective_grid_step(), modifiers);
                // 拖动中被移除的实体已不在选择集里，此时拖动没有效果
                if delta == last || self.scene.selection_len() == 0 {
                    return;
                }
                if !initialized {
                    self.register_undo();
                }
                let moved = self.scene.translate_selected(&(delta - last));
                self.render_ids(&moved);
                self.set_gesture(
                    view,
                    Gesture::Dragging {
                        start,
                        last: delta,
                        initialized: true,
                    },
                );
            }
        }
    }

    /// 松开：框选时选中矩形内的实体；无论手势如何都回到空闲并导出一次
    pub fn pointer_up(&mut self, view: usize, pos: Point2, _modifiers: Modifiers) {
        let Some(viewport) = self.views.get_mut(view) else {
            return;
        };
        let gesture = std::mem::take(&mut viewport.gesture);
        if let Gesture::BoxSelecting { anchor } = gesture {
            viewport.clear_selection_box();
            let inside = viewport.entities_in_rect(&self.scene, anchor, pos);
            let changed: Vec<EntityId> = inside.into_iter().filter(|id| self.scene.select(*id)).collect();
            debug!("Box selected {} entities", changed.len());
            self.render_ids(&changed);
        }
        self.export();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::Tag;
    use framecad_core::entity::Part;
    use framecad_core::wireframe::Wireframe;
    use std::cell::Cell;
    use std::rc::Rc;

    struct CountingHook(Rc<Cell<usize>>);

    impl ExportHook for CountingHook {
        fn export(&mut self, _scene: &Scene) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn cube_at(at: Vector3) -> Entity {
        let mut e = Entity::from(Part::new(
            "cube",
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(10.0, 10.0, 10.0),
        ));
        e.translate(&at);
        e
    }

    /// 俯视视口中，原点处立方体投影到 [195, 205] × [145, 155]
    fn editor_with_two_cubes() -> (Editor, EntityId, EntityId) {
        let mut editor = Editor::new(EditorConfig {
            show_interfaces: false,
            ..Default::default()
        });
        let a = editor.append(cube_at(Vector3::zeros()), false);
        let b = editor.append(cube_at(Vector3::new(100.0, 0.0, 0.0)), false);
        (editor, a, b)
    }

    #[test]
    fn test_box_select_only_contained_entity() {
        let (mut editor, a, _) = editor_with_two_cubes();
        editor.pointer_down(0, Point2::new(180.0, 130.0), Modifiers::NONE);
        assert!(matches!(editor.views().get(0).unwrap().gesture(), Gesture::BoxSelecting { .. }));
        editor.pointer_move(0, Point2::new(220.0, 170.0), Modifiers::NONE);
        assert_eq!(editor.views().get(0).unwrap().display().count_tag(Tag::SelectionBox), 1);
        editor.pointer_up(0, Point2::new(220.0, 170.0), Modifiers::NONE);

        assert_eq!(editor.scene().selected_ids(), &[a]);
        assert_eq!(editor.views().get(0).unwrap().display().count_tag(Tag::SelectionBox), 0);
        assert!(editor.views().get(0).unwrap().gesture().is_idle());
    }

    #[test]
    fn test_click_select_and_shift_deselect() {
        let (mut editor, a, b) = editor_with_two_cubes();
        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        editor.pointer_up(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        assert_eq!(editor.scene().selected_ids(), &[a]);

        editor.pointer_down(0, Point2::new(305.0, 150.0), Modifiers::SHIFT);
        editor.pointer_up(0, Point2::new(305.0, 150.0), Modifiers::SHIFT);
        assert_eq!(editor.scene().selected_ids(), &[a, b]);

        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::SHIFT);
        assert!(editor.views().get(0).unwrap().gesture().is_idle());
        assert_eq!(editor.scene().selected_ids(), &[b]);
    }

    #[test]
    fn test_drag_snaps_and_registers_undo_once() {
        let (mut editor, a, _) = editor_with_two_cubes();
        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        editor.pointer_move(0, Point2::new(217.6, 150.0), Modifiers::NONE);
        editor.pointer_move(0, Point2::new(218.2, 150.0), Modifiers::NONE);
        editor.pointer_move(0, Point2::new(218.5, 150.0), Modifiers::NONE);
        editor.pointer_up(0, Point2::new(218.5, 150.0), Modifiers::NONE);

        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.scene().get(a).unwrap().position(), Point3::new(13.0, 0.0, 0.0));

        assert!(editor.undo());
        assert_eq!(editor.scene().get(a).unwrap().position(), Point3::origin());
        assert!(editor.scene().is_selected(a));

        assert!(editor.redo());
        assert_eq!(editor.scene().get(a).unwrap().position(), Point3::new(13.0, 0.0, 0.0));
    }

    #[test]
    fn test_click_without_motion_leaves_no_history() {
        let (mut editor, _, _) = editor_with_two_cubes();
        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        editor.pointer_move(0, Point2::new(205.4, 150.0), Modifiers::NONE);
        editor.pointer_up(0, Point2::new(205.4, 150.0), Modifiers::NONE);
        assert!(editor.history().is_empty());
    }

    fn primitive_ids(editor: &Editor) -> Vec<Vec<crate::display::PrimitiveId>> {
        editor
            .views()
            .iter()
            .map(|v| v.display().iter().map(|p| p.id).collect())
            .collect()
    }

    #[test]
    fn test_zero_snapped_move_neither_redraws_nor_exports() {
        let count = Rc::new(Cell::new(0));
        let mut editor = Editor::new(EditorConfig {
            show_interfaces: false,
            ..Default::default()
        })
        .with_export_hook(Box::new(CountingHook(count.clone())));
        let a = editor.append(cube_at(Vector3::zeros()), false);

        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        assert!(editor.scene().is_selected(a));
        let before = primitive_ids(&editor);
        let exports = count.get();

        editor.pointer_move(0, Point2::new(205.4, 149.7), Modifiers::NONE);
        editor.pointer_move(0, Point2::new(205.9, 149.5), Modifiers::NONE);
        assert_eq!(primitive_ids(&editor), before);
        assert_eq!(count.get(), exports);
        assert!(editor.history().is_empty());

        editor.pointer_up(0, Point2::new(205.9, 149.5), Modifiers::NONE);
        assert_eq!(count.get(), exports + 1);
        assert_eq!(editor.scene().get(a).unwrap().position(), Point3::origin());
    }

    #[test]
    fn test_drag_of_removed_entity_is_harmless() {
        let (mut editor, a, b) = editor_with_two_cubes();
        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        assert!(matches!(editor.views().get(0).unwrap().gesture(), Gesture::Dragging { .. }));

        assert!(editor.remove(a).is_some());
        editor.pointer_move(0, Point2::new(230.0, 150.0), Modifiers::NONE);
        editor.pointer_move(0, Point2::new(260.0, 170.0), Modifiers::CONTROL);
        editor.pointer_up(0, Point2::new(260.0, 170.0), Modifiers::NONE);

        assert!(editor.views().get(0).unwrap().gesture().is_idle());
        assert!(editor.history().is_empty());
        assert!(!editor.scene().contains(a));
        assert!(editor.scene().selected_ids().is_empty());
        assert_eq!(editor.scene().get(b).unwrap().position(), Point3::new(100.0, 0.0, 0.0));
        assert!(editor.views().iter().all(|v| v.display().count_for(a) == 0));
        assert!(editor.views().iter().all(|v| v.display().count_for(b) > 0));
    }

    #[test]
    fn test_import_mesh_registers_undo() {
        use framecad_core::error::CoreError;
        use framecad_core::mesh::MeshData;

        struct Wedge;
        impl MeshImport for Wedge {
            fn import(&self, path: &Path) -> CoreResult<MeshData> {
                if path.ends_with("bad.stl") {
                    return Err(CoreError::InvalidMesh("unreadable".to_string()));
                }
                Ok(MeshData {
                    name: "wedge".to_string(),
                    file: path.display().to_string(),
                    vertices: vec![
                        Point3::new(0.0, 0.0, 0.0),
                        Point3::new(10.0, 0.0, 0.0),
                        Point3::new(0.0, 20.0, 10.0),
                    ],
                })
            }
        }

        let mut editor = Editor::new(EditorConfig::default());
        let id = editor.import_mesh(&Wedge, Path::new("wedge.stl"), 2.0).unwrap();
        assert_eq!(editor.history().len(), 1);
        assert_eq!(editor.scene().cost(), 2.0);
        assert!(editor.views().iter().all(|v| v.display().count_for(id) > 0));

        assert!(editor.import_mesh(&Wedge, Path::new("bad.stl"), 2.0).is_err());
        assert_eq!(editor.history().len(), 1);

        assert!(editor.undo());
        assert!(editor.scene().is_empty());
    }

    #[test]
    fn test_remove_selected_erases_everywhere() {
        let (mut editor, a, _) = editor_with_two_cubes();
        editor.pointer_down(0, Point2::new(205.0, 150.0), Modifiers::NONE);
        editor.pointer_up(0, Point2::new(205.0, 150.0), Modifiers::NONE);

        assert!(editor.remove(a).is_some());
        assert!(!editor.scene().contains(a));
        assert!(editor.scene().selected_ids().is_empty());
        assert!(editor.views().iter().all(|v| v.display().count_for(a) == 0));

        editor.redraw();
        assert!(editor.views().iter().all(|v| v.display().count_for(a) == 0));
    }

    #[test]
    fn test_export_hook_fires_after_mutations() {
        let count = Rc::new(Cell::new(0));
        let mut editor = Editor::new(EditorConfig::default())
            .with_export_hook(Box::new(CountingHook(count.clone())));
        let id = editor.append(cube_at(Vector3::zeros()), true);
        assert_eq!(count.get(), 1);
        editor.remove(id);
        assert_eq!(count.get(), 2);
        editor.pointer_down(0, Point2::new(10.0, 10.0), Modifiers::NONE);
        editor.pointer_up(0, Point2::new(12.0, 12.0), Modifiers::NONE);
        assert_eq!(count.get(), 3);
    }

    #[test]
    fn test_zoom_at_keeps_pointer_fixed() {
        let (mut editor, _, _) = editor_with_two_cubes();
        let pos = Point2::new(250.0, 120.0);
        let pivot = editor.views().get(0).unwrap().invert(&pos);
        editor.zoom_at(0, pos, 2);
        let view = editor.views().get(0).unwrap();
        assert!((view.scale() - 1.0 / 0.81).abs() < 1e-9);
        assert!((view.project(&pivot) - pos).norm() < 1e-9);
    }

    #[test]
    fn test_zoom_fit_centres_selection() {
        let (mut editor, a, _) = editor_with_two_cubes();
        assert!(!editor.zoom_fit_selected());
        editor.scene.select(a);
        assert!(editor.zoom_fit_selected());

        let entity = editor.scene().get(a).unwrap().clone();
        for view in editor.views().iter() {
            let bounds = view.projected_bounds(&entity);
            let size = view.size();
            assert!((bounds.center() - Point2::from(size / 2.0)).norm() < 1e-6);
            assert!(bounds.size().x <= size.x * ZOOM_FIT_FILL + 1e-6);
            assert!(bounds.size().y <= size.y * ZOOM_FIT_FILL + 1e-6);
        }
    }

    #[test]
    fn test_add_part_from_catalog() {
        let mut editor = Editor::new(EditorConfig::default());
        let id = editor.add_part("2020 Alex", 300.0).unwrap();
        assert!(editor.scene().contains(id));
        assert_eq!(editor.history().len(), 1);
        assert!(editor.add_part("no such part", 1.0).is_err());
        assert_eq!(editor.history().len(), 1);
    }

    #[test]
    fn test_toggle_highlight_needs_selection() {
        let (mut editor, a, _) = editor_with_two_cubes();
        editor.toggle_highlight();
        assert!(!editor.is_highlighted());
        editor.scene.select(a);
        editor.toggle_highlight();
        assert!(editor.is_highlighted());
        assert!(editor.views().iter().all(|v| v.display().count_tag(Tag::Highlight) == 1));
        editor.toggle_highlight();
        assert!(editor.views().iter().all(|v| v.display().count_tag(Tag::Highlight) == 0));
    }
}
