//! 撤销/重做历史
//!
//! 基于快照：每次变更前深拷贝（未选中实体, 选中实体），
//! 游标之后的记录在新的编辑到来时被截断，深度超限时丢弃最旧的记录。

use crate::entity::Entity;
use crate::scene::Scene;
use tracing::debug;

/// 默认历史深度
pub const DEFAULT_HISTORY_DEPTH: usize = 100;

/// 场景快照
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub unselected: Vec<Entity>,
    pub selected: Vec<Entity>,
}

impl Snapshot {
    pub fn capture(scene: &Scene) -> Self {
        Self {
            unselected: scene.unselected().cloned().collect(),
            selected: scene.selected().cloned().collect(),
        }
    }

    /// 用快照完全替换场景内容和选择集
    pub fn restore(&self, scene: &mut Scene) {
        scene.clear();
        for entity in &self.unselected {
            scene.append(entity.clone(), false);
        }
        for entity in &self.selected {
            scene.append(entity.clone(), true);
        }
    }

    pub fn entity_count(&self) -> usize {
        self.unselected.len() + self.selected.len()
    }
}

#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<Snapshot>,
    /// 下一条记录写入的位置；等于 `entries.len()` 时表示处于最新状态
    cursor: usize,
    max_depth: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_DEPTH)
    }
}

impl History {
    pub fn new(max_depth: usize) -> Self {
        Self {
            entries: Vec::new(),
            cursor: 0,
            max_depth: max_depth.max(2),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }

    /// 变更前调用：截断重做分支并记录当前状态
    pub fn register(&mut self, scene: &Scene) {
        self.entries.truncate(self.cursor);
        self.entries.push(Snapshot::capture(scene));
        self.evict();
        self.cursor = self.entries.len();
        debug!("Registered undo snapshot ({} entries)", self.entries.len());
    }

    /// 撤销；没有可撤销的记录时返回 false
    pub fn undo(&mut self, scene: &mut Scene) -> bool {
        if !self.can_undo() {
            debug!("Nothing to undo");
            return false;
        }
        if self.cursor >= self.entries.len() {
            // 保存当前状态，以便重做回来
            self.entries.push(Snapshot::capture(scene));
            self.evict();
            self.cursor = self.entries.len() - 1;
        }
        self.cursor -= 1;
        self.entries[self.cursor].restore(scene);
        true
    }

    /// 重做；已在最新状态时返回 false
    pub fn redo(&mut self, scene: &mut Scene) -> bool {
        if !self.can_redo() {
            debug!("Nothing to redo");
            return false;
        }
        self.cursor += 1;
        self.entries[self.cursor].restore(scene);
        true
    }

    fn evict(&mut self) {
        while self.entries.len() > self.max_depth {
            self.entries.remove(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Part;
    use crate::math::Vector3;
    use crate::wireframe::Wireframe;

    fn bar() -> Entity {
        Entity::from(Part::new(
            "bar",
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(20.0, 20.0, 100.0),
        ))
    }

    fn assert_same(a: &Scene, b: &Scene) {
        assert_eq!(a.len(), b.len());
        assert_eq!(a.selected_ids(), b.selected_ids());
        for entity in a.entities() {
            assert_eq!(Some(entity), b.get(entity.id));
        }
    }

    #[test]
    fn test_undo_restores_exactly() {
        let mut scene = Scene::new();
        scene.append(bar(), false);
        scene.append(bar(), true);
        let before = scene.clone();

        let mut history = History::default();
        history.register(&scene);
        scene.translate_selected(&Vector3::new(10.0, 0.0, 0.0));
        scene.rotate_selected(0.0, 0.0, 1.0, None);
        let after = scene.clone();

        assert!(history.undo(&mut scene));
        assert_same(&scene, &before);

        assert!(history.redo(&mut scene));
        assert_same(&scene, &after);
        assert!(!history.redo(&mut scene));
    }

    #[test]
    fn test_undo_of_delete_restores_selection() {
        let mut scene = Scene::new();
        let id = scene.append(bar(), true);
        let mut history = History::default();
        history.register(&scene);
        scene.delete_selected();
        assert!(scene.is_empty());

        history.undo(&mut scene);
        assert!(scene.contains(id));
        assert!(scene.is_selected(id));
    }

    #[test]
    fn test_new_edit_discards_redo_branch() {
        let mut scene = Scene::new();
        scene.append(bar(), true);
        let mut history = History::default();

        history.register(&scene);
        scene.translate_selected(&Vector3::x());
        history.undo(&mut scene);
        assert!(history.can_redo());

        history.register(&scene);
        scene.translate_selected(&Vector3::y());
        assert!(!history.can_redo());
        assert!(!history.redo(&mut scene));
    }

    #[test]
    fn test_empty_history_is_noop() {
        let mut scene = Scene::new();
        scene.append(bar(), false);
        let before = scene.clone();
        let mut history = History::default();
        assert!(!history.undo(&mut scene));
        assert!(!history.redo(&mut scene));
        assert_eq!(scene, before);
    }

    #[test]
    fn test_depth_is_capped() {
        let mut scene = Scene::new();
        scene.append(bar(), true);
        let mut history = History::new(3);
        for _ in 0..10 {
            history.register(&scene);
            scene.translate_selected(&Vector3::x());
        }
        assert_eq!(history.len(), 3);

        let mut undone = 0;
        while history.undo(&mut scene) {
            undone += 1;
        }
        assert_eq!(undone, 2);
    }
}
