//! 导出接口
//!
//! 核心只定义实体 → 文本的格式化接口和场景变更后的导出钩子，
//! 具体格式（OpenSCAD 等）由文件层实现。

use crate::entity::Part;
use crate::scene::Scene;

/// 实体文本格式化器
pub trait ExportFormatter {
    /// 单个零件
    fn part(&self, part: &Part) -> String;

    /// 组合：子实体已格式化的文本
    fn group(&self, members: &[String]) -> String;

    /// 标记选中实体
    fn selected(&self, text: &str) -> String {
        format!("#{text}")
    }
}

/// 格式化整个场景：未选中实体在前，选中实体在后
pub fn export_scene(formatter: &dyn ExportFormatter, scene: &Scene) -> String {
    let mut out = String::new();
    for entity in scene.unselected() {
        out.push_str(&entity.to_export_string(formatter));
        out.push('\n');
    }
    for entity in scene.selected() {
        out.push_str(&formatter.selected(&entity.to_export_string(formatter)));
        out.push('\n');
    }
    out
}

/// 导出钩子：每次变更后调用，错误由实现方自行记录，不向上传播
pub trait ExportHook {
    fn export(&mut self, scene: &Scene);
}

/// 不做任何事的导出钩子
#[derive(Debug, Default, Clone, Copy)]
pub struct NoExport;

impl ExportHook for NoExport {
    fn export(&mut self, _scene: &Scene) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, Group};
    use crate::math::Vector3;
    use crate::wireframe::Wireframe;

    struct NameOnly;

    impl ExportFormatter for NameOnly {
        fn part(&self, part: &Part) -> String {
            part.name.clone()
        }

        fn group(&self, members: &[String]) -> String {
            format!("[{}]", members.join(","))
        }
    }

    fn part(name: &str) -> Entity {
        Entity::from(Part::new(
            name,
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(1.0, 1.0, 1.0),
        ))
    }

    #[test]
    fn test_selected_entities_follow_unselected() {
        let mut scene = Scene::new();
        let a = scene.append(part("a"), true);
        scene.append(part("b"), false);
        scene.append(Entity::from(Group::from_children([part("c"), part("d")])), false);
        assert!(scene.is_selected(a));

        let text = export_scene(&NameOnly, &scene);
        assert_eq!(text, "b\n[c,d]\n#a\n");
    }
}
