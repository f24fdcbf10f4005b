//! FrameCAD 视口与交互
//!
//! 多个正交视口共享一个场景：投影、显示列表、命中测试、
//! 框选/拖动状态机，以及把命令和指针事件应用到场景的编辑器上下文。

pub mod command;
pub mod config;
pub mod display;
pub mod editor;
pub mod interaction;
pub mod viewport;
pub mod viewport_set;

pub use command::{Command, Key, KeyBindings, KeyChord, SlewDirection};
pub use config::{ConfigError, EditorConfig};
pub use display::{Color, DisplayList, Primitive, PrimitiveId, Shape, Tag};
pub use editor::Editor;
pub use interaction::{Gesture, Modifiers};
pub use viewport::Viewport;
pub use viewport_set::ViewportSet;
