//! OpenSCAD 导出与物料清单
//!
//! 每个零件输出为 `translate(...) rotate(...) color(...) scale(...) import(...)`，
//! 组合输出为 `union(){ ... }`，选中的实体前加 `#`（OpenSCAD 的调试高亮）。

use crate::error::FileError;
use framecad_core::entity::{Part, PartSource};
use framecad_core::export::{export_scene, ExportFormatter, ExportHook};
use framecad_core::scene::Scene;
use std::path::{Path, PathBuf};

/// 组合成员缩进
const INDENT: &str = "  ";

/// BOM 表头
pub const BOM_HEADER: &str = "name,dim1,dim2,length,cost";

/// 舍去数值噪声，避免输出 `-0`
fn num(v: f64) -> f64 {
    if v.abs() < 1e-9 {
        0.0
    } else {
        v
    }
}

/// OpenSCAD 格式化器
#[derive(Debug, Clone, Default)]
pub struct ScadFormatter {
    /// 模型文件目录，拼接在 `import` 路径前
    model_dir: Option<PathBuf>,
}

impl ScadFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model_dir(model_dir: impl Into<PathBuf>) -> Self {
        Self {
            model_dir: Some(model_dir.into()),
        }
    }

    fn model_path(&self, file: &str) -> String {
        match &self.model_dir {
            Some(dir) => dir.join(file).display().to_string(),
            None => file.to_string(),
        }
    }
}

impl ExportFormatter for ScadFormatter {
    fn part(&self, part: &Part) -> String {
        let (axis, angle) = part.transform.axis_angle();
        let rotate = format!(
            "  rotate(a={:.0}, v=[{:.4}, {:.4}, {:.4}])",
            num(angle.to_degrees()),
            num(axis.x),
            num(axis.y),
            num(axis.z)
        );
        let file = self.model_path(&part.model_file);
        match &part.source {
            PartSource::Catalog => {
                let pos = part.transform.position;
                [
                    format!("translate([{}, {}, {}])", num(pos.x), num(pos.y), num(pos.z)),
                    rotate,
                    format!(
                        "  color(\"{}\")scale([{}, {}, {}])import(\"{}\");",
                        part.color, part.dim1, part.dim2, part.length, file
                    ),
                ]
                .join("\n")
            }
            PartSource::Mesh { offset } => {
                let pos = part.transform.position + offset * 2.0;
                [
                    format!("translate([{}, {}, {}])", num(pos.x), num(pos.y), num(pos.z)),
                    rotate,
                    format!(
                        "  color([0, 1, 0])translate([{}, {}, {}])import(\"{}\");",
                        num(-offset.x),
                        num(-offset.y),
                        num(-offset.z),
                        file
                    ),
                ]
                .join("\n")
            }
        }
    }

    fn group(&self, members: &[String]) -> String {
        let mut out = vec!["union(){".to_string()];
        for member in members {
            let body: Vec<&str> = member.lines().collect();
            out.push(format!("{INDENT}{}", body.join(&format!("\n{INDENT}"))));
        }
        out.push("}".to_string());
        out.join("\n")
    }
}

/// 把整个场景写成 OpenSCAD 文件
pub fn export_scad(scene: &Scene, formatter: &ScadFormatter, path: &Path) -> Result<(), FileError> {
    std::fs::write(path, export_scene(formatter, scene))?;
    Ok(())
}

/// 物料清单（CSV）
pub fn bom_csv(scene: &Scene) -> String {
    let mut out = String::from(BOM_HEADER);
    out.push('\n');
    for line in scene.bom_lines() {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// 每次场景变更后把场景导出到固定路径；失败只记录日志
#[derive(Debug, Clone)]
pub struct ScadExportHook {
    path: PathBuf,
    formatter: ScadFormatter,
}

impl ScadExportHook {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            formatter: ScadFormatter::new(),
        }
    }

    pub fn with_formatter(mut self, formatter: ScadFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ExportHook for ScadExportHook {
    fn export(&mut self, scene: &Scene) {
        match export_scad(scene, &self.formatter, &self.path) {
            Ok(()) => tracing::debug!("Exported {} entities to {}", scene.len(), self.path.display()),
            Err(e) => tracing::error!("Export to {} failed: {}", self.path.display(), e),
        }
    }
}
