//! 编辑命令与按键绑定
//!
//! 按键绑定表支持：
//! - 命令名和短名（大小写不敏感）
//! - 按键组合 → 命令
//! - 命令名前缀补全

use crate::editor::Editor;
use framecad_core::catalog::{alex_name, corner_three_way_name, corner_two_way_name};
use framecad_core::entity::EntityId;
use framecad_core::math::Vector3;
use framecad_core::rotation::Generator;
use framecad_core::scene::Alignment;
use std::collections::HashMap;
use tracing::{debug, warn};

/// 键盘平移方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlewDirection {
    Left,
    Right,
    Up,
    Down,
    Back,
    Forward,
}

impl SlewDirection {
    /// 世界坐标位移
    pub fn vector(self, step: f64) -> Vector3 {
        match self {
            SlewDirection::Left => Vector3::new(-step, 0.0, 0.0),
            SlewDirection::Right => Vector3::new(step, 0.0, 0.0),
            SlewDirection::Up => Vector3::new(0.0, 0.0, step),
            SlewDirection::Down => Vector3::new(0.0, 0.0, -step),
            SlewDirection::Back => Vector3::new(0.0, step, 0.0),
            SlewDirection::Forward => Vector3::new(0.0, -step, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    SelectAll,
    Cancel,
    Duplicate,
    Delete,
    Group,
    Ungroup,
    Rotate { generator: Generator, fine: bool },
    Align { axis: usize, alignment: Alignment },
    ZoomIn,
    ZoomOut,
    ZoomInLots,
    ZoomOutLots,
    ZoomFit,
    Slew(SlewDirection),
    ToggleAxes,
    ToggleHighlight,
    AddAlex,
    AddCornerTwoWay,
    AddCornerThreeWay,
    Undo,
    Redo,
}

/// 按键
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Escape,
    Delete,
    Left,
    Right,
    Up,
    Down,
    Char(char),
}

/// 按键组合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: Key,
    pub control: bool,
}

impl KeyChord {
    pub const fn plain(key: Key) -> Self {
        Self {
            key,
            control: false,
        }
    }

    pub const fn ctrl(key: Key) -> Self {
        Self { key, control: true }
    }

    /// 字符键统一为小写
    fn normalized(self) -> Self {
        match self.key {
            Key::Char(c) => Self {
                key: Key::Char(c.to_ascii_lowercase()),
                control: self.control,
            },
            _ => self,
        }
    }
}

/// 按键绑定表
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// 命令名 → 命令
    names: HashMap<String, Command>,
    /// 短名 → 命令
    short_names: HashMap<String, Command>,
    /// 按键组合 → 命令
    chords: HashMap<KeyChord, Command>,
    /// 命令 → 命令名
    command_to_name: HashMap<Command, String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = Self::empty();
        bindings.register_defaults();
        bindings
    }

    pub fn empty() -> Self {
        Self {
            names: HashMap::new(),
            short_names: HashMap::new(),
            chords: HashMap::new(),
            command_to_name: HashMap::new(),
        }
    }

    fn register_defaults(&mut self) {
        use Key::*;
        use KeyChord as K;

        // 选择
        self.register(Command::SelectAll, "SELECT_ALL", &["ALL"], &[K::ctrl(Char('a'))]);
        self.register(Command::Cancel, "CANCEL", &["ESC"], &[K::plain(Escape)]);

        // 编辑
        self.register(Command::Duplicate, "DUPLICATE", &["DUP"], &[K::ctrl(Char('d'))]);
        self.register(Command::Delete, "DELETE", &["DEL", "ERASE"], &[K::plain(Delete)]);
        self.register(Command::Group, "GROUP", &["G"], &[K::ctrl(Char('g'))]);
        self.register(Command::Ungroup, "UNGROUP", &["UG"], &[K::ctrl(Char('u'))]);
        self.register(Command::Undo, "UNDO", &["U"], &[K::ctrl(Char('z'))]);
        self.register(Command::Redo, "REDO", &[], &[K::ctrl(Char('y'))]);

        // 旋转：按住 Control 为精细旋转
        for (generator, name, short, key) in [
            (Generator::Roll, "ROLL", "RR", 'r'),
            (Generator::Pitch, "PITCH", "RP", 'p'),
            (Generator::Yaw, "YAW", "RY", 'h'),
        ] {
            self.register(
                Command::Rotate {
                    generator,
                    fine: false,
                },
                name,
                &[short],
                &[K::plain(Char(key))],
            );
            self.register(
                Command::Rotate {
                    generator,
                    fine: true,
                },
                &format!("{name}_FINE"),
                &[],
                &[K::ctrl(Char(key))],
            );
        }

        // 对齐
        let alignments = [
            (Alignment::Center, "CENTER"),
            (Alignment::Abut { forward: true }, "ABUT"),
            (Alignment::Abut { forward: false }, "ABUT_BACK"),
            (Alignment::Flush { forward: true }, "FLUSH"),
            (Alignment::Flush { forward: false }, "FLUSH_BACK"),
        ];
        for (axis, axis_name) in ["X", "Y", "Z"].iter().enumerate() {
            for (alignment, name) in alignments {
                self.register(
                    Command::Align { axis, alignment },
                    &format!("ALIGN_{axis_name}_{name}"),
                    &[],
                    &[],
                );
            }
        }

        // 视图
        self.register(Command::ZoomIn, "ZOOM_IN", &["ZI"], &[K::plain(Char('+'))]);
        self.register(Command::ZoomOut, "ZOOM_OUT", &["ZO"], &[K::plain(Char('-'))]);
        self.register(Command::ZoomInLots, "ZOOM_IN_LOTS", &[], &[K::ctrl(Char('+'))]);
        self.register(Command::ZoomOutLots, "ZOOM_OUT_LOTS", &[], &[K::ctrl(Char('-'))]);
        self.register(Command::ZoomFit, "ZOOM_FIT", &["ZF"], &[K::plain(Char('f'))]);
        self.register(Command::ToggleAxes, "AXES", &[], &[K::plain(Char('a'))]);
        self.register(Command::ToggleHighlight, "HIGHLIGHT", &["HL"], &[K::plain(Char('l'))]);
        for (direction, name, key) in [
            (SlewDirection::Left, "SLEW_LEFT", Left),
            (SlewDirection::Right, "SLEW_RIGHT", Right),
            (SlewDirection::Up, "SLEW_UP", Up),
            (SlewDirection::Down, "SLEW_DOWN", Down),
            (SlewDirection::Back, "SLEW_BACK", Char('i')),
            (SlewDirection::Forward, "SLEW_FORWARD", Char('j')),
        ] {
            self.register(Command::Slew(direction), name, &[], &[K::plain(key)]);
        }

        // 新建零件
        self.register(Command::AddAlex, "ADD_ALEX", &["ALEX"], &[K::ctrl(Char('n'))]);
        self.register(Command::AddCornerTwoWay, "ADD_CORNER_TWO_WAY", &["C2"], &[]);
        self.register(Command::AddCornerThreeWay, "ADD_CORNER_THREE_WAY", &["C3"], &[]);
    }

    /// 注册命令
    ///
    /// # 参数
    /// - `command`: 命令
    /// - `name`: 完整命令名（如 "DUPLICATE"）
    /// - `short_names`: 短名列表（如 ["DUP"]）
    /// - `chords`: 按键组合
    pub fn register(&mut self, command: Command, name: &str, short_names: &[&str], chords: &[KeyChord]) {
        let name = name.to_uppercase();
        self.names.insert(name.clone(), command);
        self.command_to_name.insert(command, name);
        for short in short_names {
            self.short_names.insert(short.to_uppercase(), command);
        }
        for chord in chords {
            self.chords.insert(chord.normalized(), command);
        }
    }

    /// 重新绑定按键组合，返回原先绑定的命令
    pub fn bind(&mut self, chord: KeyChord, command: Command) -> Option<Command> {
        self.chords.insert(chord.normalized(), command)
    }

    pub fn unbind(&mut self, chord: KeyChord) -> Option<Command> {
        self.chords.remove(&chord.normalized())
    }

    /// 按命令名或短名查找
    pub fn lookup(&self, input: &str) -> Option<Command> {
        let input = input.trim().to_uppercase();
        self.names
            .get(&input)
            .or_else(|| self.short_names.get(&input))
            .copied()
    }

    pub fn lookup_chord(&self, chord: KeyChord) -> Option<Command> {
        self.chords.get(&chord.normalized()).copied()
    }

    /// 返回所有以 `prefix` 开头的命令名
    pub fn complete(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_uppercase();
        let mut results: Vec<String> = self
            .names
            .keys()
            .filter(|name| name.starts_with(&prefix))
            .cloned()
            .collect();
        results.sort();
        results
    }

    pub fn name_of(&self, command: Command) -> Option<&str> {
        self.command_to_name.get(&command).map(String::as_str)
    }

    /// 绑定到该命令的所有按键组合
    pub fn chords_for(&self, command: Command) -> Vec<KeyChord> {
        self.chords
            .iter()
            .filter(|(_, c)| **c == command)
            .map(|(chord, _)| *chord)
            .collect()
    }
}

impl Editor {
    /// 执行命令；没有产生任何效果时返回 false
    pub fn execute(&mut self, command: Command) -> bool {
        debug!("Execute {:?}", command);
        match command {
            Command::SelectAll => {
                let changed = self.scene_mut().select_all();
                self.render_ids(&changed);
                !changed.is_empty()
            }
            Command::Cancel => {
                let changed = self.scene_mut().clear_selection();
                self.render_ids(&changed);
                !changed.is_empty()
            }
            Command::Duplicate => self.duplicate_selected(),
            Command::Delete => self.delete_selected(),
            Command::Group => self.group_selected(),
            Command::Ungroup => self.ungroup_selected(),
            Command::Rotate { generator, fine } => self.rotate_selected(generator, fine),
            Command::Align { axis, alignment } => self.align_selected(axis, alignment),
            Command::ZoomIn => {
                self.zoom_in(None);
                true
            }
            Command::ZoomOut => {
                self.zoom_out(None);
                true
            }
            Command::ZoomInLots => {
                self.zoom_in_lots();
                true
            }
            Command::ZoomOutLots => {
                self.zoom_out_lots();
                true
            }
            Command::ZoomFit => self.zoom_fit_selected(),
            Command::Slew(direction) => {
                let delta = direction.vector(self.config().slew_step);
                self.slew(&delta);
                true
            }
            Command::ToggleAxes => {
                self.toggle_axes();
                true
            }
            Command::ToggleHighlight => {
                self.toggle_highlight();
                true
            }
            Command::AddAlex => {
                let section = self.config().default_section;
                self.add_named(&alex_name(section, section))
            }
            Command::AddCornerTwoWay => {
                let name = corner_two_way_name(self.config().default_section);
                self.add_named(&name)
            }
            Command::AddCornerThreeWay => {
                let name = corner_three_way_name(self.config().default_section);
                self.add_named(&name)
            }
            Command::Undo => self.undo(),
            Command::Redo => self.redo(),
        }
    }

    fn add_named(&mut self, name: &str) -> bool {
        let length = self.config().default_length;
        match self.add_part(name, length) {
            Ok(_) => true,
            Err(e) => {
                warn!("Cannot add part: {}", e);
                false
            }
        }
    }

    /// 复制选择集，副本替换原选择
    pub fn duplicate_selected(&mut self) -> bool {
        if self.scene().selection_len() == 0 {
            return false;
        }
        self.register_undo();
        let originals = self.scene().selected_ids().to_vec();
        let copies = self.scene_mut().duplicate_selected();
        self.render_ids(&originals);
        self.render_ids(&copies);
        self.export();
        true
    }

    pub fn delete_selected(&mut self) -> bool {
        if self.scene().selection_len() == 0 {
            return false;
        }
        self.register_undo();
        let removed = self.scene_mut().delete_selected();
        for entity in &removed {
            self.views_mut().erase(entity.id);
        }
        self.export();
        true
    }

    /// 至少选中两个实体时组合
    pub fn group_selected(&mut self) -> bool {
        if self.scene().selection_len() < 2 {
            return false;
        }
        self.register_undo();
        let members = self.scene().selected_ids().to_vec();
        let Some(group) = self.scene_mut().group_selected() else {
            return false;
        };
        for id in &members {
            self.views_mut().erase(*id);
        }
        self.render_ids(&[group]);
        self.export();
        true
    }

    pub fn ungroup_selected(&mut self) -> bool {
        if self.scene().selection_len() == 0 {
            return false;
        }
        self.register_undo();
        let previous = self.scene().selected_ids().to_vec();
        let released = self.scene_mut().ungroup_selected();
        for id in &previous {
            self.views_mut().erase(*id);
        }
        let remaining: Vec<EntityId> = previous
            .into_iter()
            .filter(|id| self.scene().contains(*id))
            .collect();
        self.render_ids(&remaining);
        self.render_ids(&released);
        self.export();
        true
    }

    /// 按直角（或精细步长）旋转选择集
    pub fn rotate_selected(&mut self, generator: Generator, fine: bool) -> bool {
        if self.scene().selection_len() == 0 {
            return false;
        }
        let amount = if fine {
            self.config().fine_rotation_step
        } else {
            1.0
        };
        let (roll, pitch, yaw) = match generator {
            Generator::Roll => (amount, 0.0, 0.0),
            Generator::Pitch => (0.0, amount, 0.0),
            Generator::Yaw => (0.0, 0.0, amount),
        };
        let snap = self
            .config()
            .snap_pivot
            .then(|| self.config().effective_grid_step());

        self.register_undo();
        let rotated = self.scene_mut().rotate_selected(roll, pitch, yaw, snap);
        self.render_ids(&rotated);
        self.export();
        true
    }

    /// 以最后选中的实体为参照对齐
    pub fn align_selected(&mut self, axis: usize, alignment: Alignment) -> bool {
        if self.scene().selection_len() < 2 || axis > 2 {
            return false;
        }
        self.register_undo();
        let moved = self.scene_mut().align_selected(axis, alignment);
        self.render_ids(&moved);
        self.export();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EditorConfig;
    use framecad_core::entity::{Entity, Part};
    use framecad_core::math::{Point3, EPSILON};
    use framecad_core::wireframe::Wireframe;

    fn cube_at(at: Vector3) -> Entity {
        let mut e = Entity::from(Part::new(
            "cube",
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(10.0, 10.0, 10.0),
        ));
        e.translate(&at);
        e
    }

    fn editor() -> Editor {
        Editor::new(EditorConfig {
            show_interfaces: false,
            ..Default::default()
        })
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::new();
        assert_eq!(bindings.lookup_chord(KeyChord::ctrl(Key::Char('d'))), Some(Command::Duplicate));
        assert_eq!(bindings.lookup_chord(KeyChord::ctrl(Key::Char('D'))), Some(Command::Duplicate));
        assert_eq!(bindings.lookup_chord(KeyChord::plain(Key::Escape)), Some(Command::Cancel));
        assert_eq!(
            bindings.lookup_chord(KeyChord::ctrl(Key::Char('r'))),
            Some(Command::Rotate {
                generator: Generator::Roll,
                fine: true
            })
        );
        assert_eq!(
            bindings.lookup_chord(KeyChord::plain(Key::Char('j'))),
            Some(Command::Slew(SlewDirection::Forward))
        );
        assert_eq!(bindings.lookup_chord(KeyChord::ctrl(Key::Char('q'))), None);
    }

    #[test]
    fn test_lookup_by_name() {
        let bindings = KeyBindings::new();
        assert_eq!(bindings.lookup("dup"), Some(Command::Duplicate));
        assert_eq!(bindings.lookup("Group"), Some(Command::Group));
        assert_eq!(
            bindings.lookup("align_z_flush_back"),
            Some(Command::Align {
                axis: 2,
                alignment: Alignment::Flush { forward: false }
            })
        );
        assert_eq!(bindings.name_of(Command::Redo), Some("REDO"));
        assert_eq!(bindings.complete("zoom_o"), ["ZOOM_OUT", "ZOOM_OUT_LOTS"]);
    }

    #[test]
    fn test_rebind() {
        let mut bindings = KeyBindings::new();
        let chord = KeyChord::plain(Key::Char('x'));
        assert_eq!(bindings.bind(chord, Command::Delete), None);
        assert_eq!(bindings.lookup_chord(chord), Some(Command::Delete));
        assert_eq!(bindings.chords_for(Command::Delete).len(), 2);
        assert_eq!(bindings.unbind(chord), Some(Command::Delete));
    }

    #[test]
    fn test_commands_without_selection_are_noops() {
        let mut editor = editor();
        editor.append(cube_at(Vector3::zeros()), false);
        for command in [
            Command::Duplicate,
            Command::Delete,
            Command::Group,
            Command::Ungroup,
            Command::Rotate {
                generator: Generator::Yaw,
                fine: false,
            },
            Command::ZoomFit,
        ] {
            assert!(!editor.execute(command), "{command:?}");
        }
        assert!(editor.history().is_empty());
    }

    #[test]
    fn test_duplicate_replaces_selection() {
        let mut editor = editor();
        let a = editor.append(cube_at(Vector3::zeros()), true);
        assert!(editor.execute(Command::Duplicate));
        assert_eq!(editor.scene().len(), 2);
        assert_eq!(editor.scene().selection_len(), 1);
        assert!(!editor.scene().is_selected(a));

        assert!(editor.execute(Command::Undo));
        assert_eq!(editor.scene().len(), 1);
        assert_eq!(editor.scene().selected_ids(), &[a]);
    }

    #[test]
    fn test_group_rotate_ungroup() {
        let mut editor = editor();
        editor.append(cube_at(Vector3::zeros()), true);
        editor.append(cube_at(Vector3::new(40.0, 0.0, 0.0)), true);
        assert!(editor.execute(Command::Group));
        assert_eq!(editor.scene().len(), 1);
        let group = editor.scene().selected_ids()[0];
        assert!(editor.views().iter().all(|v| v.display().count_for(group) > 0));

        assert!(editor.execute(Command::Rotate {
            generator: Generator::Yaw,
            fine: false
        }));
        // 质心 (20, 0, 5)，绕 z 轴 90° 后两个立方体落在 x = 20 上
        let positions: Vec<Point3> = editor
            .scene()
            .get(group)
            .unwrap()
            .as_group()
            .unwrap()
            .children()
            .iter()
            .map(|c| c.position())
            .collect();
        assert!((positions[0] - Point3::new(20.0, -20.0, 0.0)).norm() < EPSILON);
        assert!((positions[1] - Point3::new(20.0, 20.0, 0.0)).norm() < EPSILON);

        assert!(editor.execute(Command::Ungroup));
        assert_eq!(editor.scene().len(), 2);
        assert!(editor.scene().selected_ids().is_empty());
        assert!(editor.views().iter().all(|v| v.display().count_for(group) == 0));
    }

    #[test]
    fn test_delete_then_undo_redo() {
        let mut editor = editor();
        let a = editor.append(cube_at(Vector3::zeros()), true);
        editor.append(cube_at(Vector3::new(30.0, 0.0, 0.0)), false);
        assert!(editor.execute(Command::Delete));
        assert!(!editor.scene().contains(a));
        assert!(editor.views().iter().all(|v| v.display().count_for(a) == 0));

        assert!(editor.execute(Command::Undo));
        assert!(editor.scene().is_selected(a));
        assert!(editor.views().iter().all(|v| v.display().count_for(a) > 0));

        assert!(editor.execute(Command::Redo));
        assert!(!editor.scene().contains(a));
        assert!(!editor.execute(Command::Redo));
    }

    #[test]
    fn test_align_abut() {
        let mut editor = editor();
        let a = editor.append(cube_at(Vector3::new(0.0, 7.0, 0.0)), true);
        editor.append(cube_at(Vector3::new(50.0, 0.0, 0.0)), true);
        assert!(editor.execute(Command::Align {
            axis: 0,
            alignment: Alignment::Abut { forward: false }
        }));
        // 参照物 x ∈ [45, 55]，a 的最大面贴到 45
        let bbox = editor.scene().get(a).unwrap().bounding_box();
        assert!((bbox.max.x - 45.0).abs() < EPSILON);
        assert!((bbox.min.y - 2.0).abs() < EPSILON);
    }

    #[test]
    fn test_add_parts_and_slew() {
        let mut editor = editor();
        assert!(editor.execute(Command::AddAlex));
        assert!(editor.execute(Command::AddCornerThreeWay));
        assert_eq!(editor.scene().len(), 2);
        assert!(editor.execute(Command::SelectAll));
        assert_eq!(editor.scene().selection_len(), 2);

        let before = editor.views().get(0).unwrap().offset();
        assert!(editor.execute(Command::Slew(SlewDirection::Right)));
        let after = editor.views().get(0).unwrap().offset();
        assert!((after.x - before.x - 10.0).abs() < EPSILON);
    }
}
