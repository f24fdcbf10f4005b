//! 文档：有序的顶层实体列表与元数据

use crate::error::FileError;
use chrono::{DateTime, Utc};
use framecad_core::entity::{validate_entities, Entity, EntityId};
use framecad_core::scene::Scene;
use serde::{Deserialize, Serialize};

/// 文档元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Default for DocumentMetadata {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            title: "Untitled".to_string(),
            author: String::new(),
            created: now,
            modified: now,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub metadata: DocumentMetadata,
    /// 顶层实体，保持场景顺序
    pub entities: Vec<Entity>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        let mut doc = Self::new();
        doc.metadata.title = title.into();
        doc
    }

    /// 复制场景中的全部顶层实体
    pub fn from_scene(scene: &Scene) -> Self {
        Self {
            metadata: DocumentMetadata::default(),
            entities: scene.entities().to_vec(),
        }
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn cost(&self) -> f64 {
        self.entities.iter().map(Entity::cost).sum()
    }

    /// 更新修改时间
    pub fn touch(&mut self) {
        self.metadata.modified = Utc::now();
    }

    /// 加载后处理：
    /// - 校验姿态、组合成员和ID唯一性
    /// - 重新计算组合质心
    /// - 让之后新建的实体ID大于文档中的最大ID
    pub fn prepare(&mut self) -> Result<(), FileError> {
        validate_entities(&self.entities)?;
        for entity in &mut self.entities {
            entity.refresh();
        }
        if let Some(max) = self.entities.iter().flat_map(Entity::ids).max() {
            EntityId::reserve_through(max);
        }
        Ok(())
    }

    pub fn into_entities(self) -> Vec<Entity> {
        self.entities
    }
}
