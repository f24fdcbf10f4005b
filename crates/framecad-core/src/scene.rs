//! 场景：文档根与选择集
//!
//! 场景拥有有序的顶层实体列表；选择集只保存顶层实体的ID，
//! 是场景的非拥有子集。移除实体时同时从选择集中移除。
//!
//! 场景本身不知道视口和导出钩子，渲染与导出由编辑器上下文负责。

use crate::entity::{rotation_pivot, Entity, EntityId, EntityKind, Group};
use crate::math::{BoundingBox3, Point3, Vector3};
use crate::rotation::right_angle_rotation;
use tracing::debug;

/// 对齐方式（参照物为最后选中的实体）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Alignment {
    /// 中心对齐
    Center,
    /// 紧贴：`forward` 时把最小面贴到参照物最大面，否则反之
    Abut { forward: bool },
    /// 齐平：`forward` 时最小面对齐参照物最小面，否则最大面对齐
    Flush { forward: bool },
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    entities: Vec<Entity>,
    selected: Vec<EntityId>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.id == id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.iter().any(|e| e.id == id)
    }

    /// 包含 `id`（自身或后代）的顶层实体
    pub fn owner_of(&self, id: EntityId) -> Option<EntityId> {
        self.entities.iter().find(|e| e.contains(id)).map(|e| e.id)
    }

    /// 添加顶层实体；已存在时只更新选择状态
    pub fn append(&mut self, entity: Entity, select: bool) -> EntityId {
        let id = entity.id;
        if !self.contains(id) {
            self.entities.push(entity);
        }
        if select {
            self.select(id);
        }
        id
    }

    /// 移除顶层实体，同时取消选择
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        let idx = self.entities.iter().position(|e| e.id == id)?;
        self.selected.retain(|s| *s != id);
        Some(self.entities.remove(idx))
    }

    /// 清空场景，返回全部实体
    pub fn clear(&mut self) -> Vec<Entity> {
        self.selected.clear();
        std::mem::take(&mut self.entities)
    }

    // ========== 选择集 ==========

    pub fn selected_ids(&self) -> &[EntityId] {
        &self.selected
    }

    pub fn selection_len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_selected(&self, id: EntityId) -> bool {
        self.selected.contains(&id)
    }

    pub fn last_selected(&self) -> Option<&Entity> {
        self.selected.last().and_then(|id| self.get(*id))
    }

    /// 选中的实体，按选择顺序
    pub fn selected(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.selected.iter().filter_map(|id| self.get(*id))
    }

    /// 未选中的实体，按场景顺序
    pub fn unselected(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter().filter(|e| !self.is_selected(e.id))
    }

    /// 选中顶层实体，已选中或不存在时返回 false
    pub fn select(&mut self, id: EntityId) -> bool {
        if !self.contains(id) || self.is_selected(id) {
            return false;
        }
        self.selected.push(id);
        true
    }

    pub fn deselect(&mut self, id: EntityId) -> bool {
        let before = self.selected.len();
        self.selected.retain(|s| *s != id);
        before != self.selected.len()
    }

    /// 取消全部选择，返回原先选中的ID
    pub fn clear_selection(&mut self) -> Vec<EntityId> {
        std::mem::take(&mut self.selected)
    }

    /// 全选，返回新选中的ID
    pub fn select_all(&mut self) -> Vec<EntityId> {
        let ids: Vec<EntityId> = self.unselected().map(|e| e.id).collect();
        self.selected.extend(ids.iter().copied());
        ids
    }

    /// 点击选择
    ///
    /// `additive`（Shift）时：点中已选实体则取消选择，点中未选实体则追加；
    /// 否则点中未选实体时替换选择集，点中已选实体时保持不变（以便拖动整个选择集）。
    /// 返回选择状态发生变化的ID。
    pub fn click_select(&mut self, id: EntityId, additive: bool) -> Vec<EntityId> {
        if !self.contains(id) {
            return Vec::new();
        }
        if self.is_selected(id) {
            if additive {
                self.deselect(id);
                return vec![id];
            }
            return Vec::new();
        }
        let mut changed = if additive {
            Vec::new()
        } else {
            self.clear_selection()
        };
        self.select(id);
        changed.push(id);
        changed
    }

    // ========== 选择集上的编辑 ==========

    /// 平移整个选择集
    pub fn translate_selected(&mut self, v: &Vector3) -> Vec<EntityId> {
        let ids = self.selected.clone();
        for id in &ids {
            if let Some(entity) = self.get_mut(*id) {
                entity.translate(v);
            }
        }
        ids
    }

    /// 选择集作为一个整体的旋转中心
    pub fn selection_pivot(&self, snap_step: Option<f64>) -> Point3 {
        let members: Vec<&Entity> = self.selected().collect();
        rotation_pivot(&members, snap_step)
    }

    /// 把选择集当作一个组合旋转
    pub fn rotate_selected(
        &mut self,
        roll: f64,
        pitch: f64,
        yaw: f64,
        snap_step: Option<f64>,
    ) -> Vec<EntityId> {
        let ids = self.selected.clone();
        if ids.is_empty() {
            return ids;
        }
        let pivot = self.selection_pivot(snap_step);
        let rotation = right_angle_rotation(roll, pitch, yaw);
        for id in &ids {
            if let Some(entity) = self.get_mut(*id) {
                entity.rotate_about(&rotation, &pivot);
            }
        }
        ids
    }

    /// 复制选择集，副本替换原选择
    pub fn duplicate_selected(&mut self) -> Vec<EntityId> {
        let copies: Vec<Entity> = self.selected().map(Entity::dup).collect();
        self.selected.clear();
        copies
            .into_iter()
            .map(|copy| self.append(copy, true))
            .collect()
    }

    /// 删除选择集中的实体
    pub fn delete_selected(&mut self) -> Vec<Entity> {
        let ids = self.clear_selection();
        ids.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// 把选中的实体（至少两个）组合成一个新组合并选中它
    pub fn group_selected(&mut self) -> Option<EntityId> {
        if self.selected.len() < 2 {
            debug!("Group needs at least two selected entities");
            return None;
        }
        let ids = self.clear_selection();
        let members: Vec<Entity> = ids.into_iter().filter_map(|id| self.remove(id)).collect();
        let group = Entity::from(Group::from_children(members));
        Some(self.append(group, true))
    }

    /// 解散选中的组合，子实体回到场景顶层；非组合实体仅取消选择
    ///
    /// 返回新出现在顶层的实体ID。
    pub fn ungroup_selected(&mut self) -> Vec<EntityId> {
        let ids = self.clear_selection();
        let mut released = Vec::new();
        for id in ids {
            let is_group = self.get(id).is_some_and(Entity::is_group);
            if !is_group {
                continue;
            }
            if let Some(Entity {
                kind: EntityKind::Group(group),
                ..
            }) = self.remove(id)
            {
                for child in group.into_children() {
                    released.push(self.append(child, false));
                }
            }
        }
        released
    }

    /// 以最后选中的实体为参照，沿 `axis` 对齐其余选中实体
    pub fn align_selected(&mut self, axis: usize, alignment: Alignment) -> Vec<EntityId> {
        if self.selected.len() < 2 || axis > 2 {
            return Vec::new();
        }
        let (others, reference) = self.selected.split_at(self.selected.len() - 1);
        let others = others.to_vec();
        let Some(reference) = self.get(reference[0]).map(Entity::bounding_box) else {
            return Vec::new();
        };

        for id in &others {
            let Some(entity) = self.get_mut(*id) else {
                continue;
            };
            let bbox = entity.bounding_box();
            let target = match alignment {
                Alignment::Center => reference.center()[axis] - bbox.center()[axis],
                Alignment::Abut { forward: true } => reference.max[axis] - bbox.min[axis],
                Alignment::Abut { forward: false } => reference.min[axis] - bbox.max[axis],
                Alignment::Flush { forward: true } => reference.min[axis] - bbox.min[axis],
                Alignment::Flush { forward: false } => reference.max[axis] - bbox.max[axis],
            };
            let mut v = Vector3::zeros();
            v[axis] = target;
            entity.translate(&v);
        }
        others
    }

    /// 选择集所有顶点
    pub fn selection_vertices(&self) -> Vec<Point3> {
        self.selected().flat_map(Entity::vertices).collect()
    }

    pub fn selection_bounding_box(&self) -> BoundingBox3 {
        BoundingBox3::from_points(self.selection_vertices())
    }

    pub fn cost(&self) -> f64 {
        self.entities.iter().map(Entity::cost).sum()
    }

    pub fn bom_lines(&self) -> Vec<String> {
        self.entities.iter().flat_map(Entity::bom_lines).collect()
    }

    /// 所有层级中最大的实体ID
    pub fn max_id(&self) -> Option<EntityId> {
        self.entities.iter().flat_map(Entity::ids).max()
    }
}
