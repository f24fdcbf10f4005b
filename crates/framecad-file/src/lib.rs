//! FrameCAD 文件格式处理
//!
//! 支持：
//! - `.fcad` 二进制格式（MessagePack + Zstd）
//! - `.json` 文档格式
//! - OpenSCAD 导出与物料清单
//! - STL 网格读取

pub mod document;
pub mod error;
pub mod export;
pub mod json;
pub mod native;
pub mod stl;

pub use document::{Document, DocumentMetadata};
pub use error::FileError;
pub use export::{bom_csv, export_scad, ScadExportHook, ScadFormatter};
pub use json::{load_any, load_json, save_any, save_json};
pub use stl::{parse_stl, StlImport};
