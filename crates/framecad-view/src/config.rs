//! 编辑器配置
//!
//! 从 JSON 文件加载；缺省字段使用默认值，文件不存在时整体使用默认配置。

use framecad_core::rotation::FINE_ROTATION_STEP;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// 拖动网格步长（mm，至少为 1）
    pub grid_step: f64,
    /// 命中测试容差（屏幕像素）
    pub hit_tolerance: f64,
    /// 撤销历史深度
    pub history_depth: usize,
    /// 精细旋转步长（直角的分数）
    pub fine_rotation_step: f64,
    /// 普通缩放系数
    pub zoom_factor: f64,
    /// 大幅缩放系数
    pub zoom_factor_lots: f64,
    /// 键盘平移步长（mm）
    pub slew_step: f64,
    /// 初始缩放（像素/mm）
    pub initial_scale: f64,
    /// 视口初始尺寸（像素）
    pub view_size: [f64; 2],
    /// 组合旋转中心是否捕捉到网格
    pub snap_pivot: bool,
    /// 是否绘制未啮合接口的提示线
    pub show_interfaces: bool,
    /// 新建型材的默认长度与截面
    pub default_length: f64,
    pub default_section: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            grid_step: 1.0,
            hit_tolerance: 10.0,
            history_depth: 100,
            fine_rotation_step: FINE_ROTATION_STEP,
            zoom_factor: 0.9,
            zoom_factor_lots: 0.8,
            slew_step: 10.0,
            initial_scale: 1.0,
            view_size: [400.0, 300.0],
            snap_pivot: false,
            show_interfaces: true,
            default_length: 500.0,
            default_section: 20.0,
        }
    }
}

impl EditorConfig {
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_json(&text)?;
        tracing::info!("Loaded editor config from {}", path.display());
        Ok(config)
    }

    /// 路径为空或文件不存在时返回默认配置
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                tracing::warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("hit_tolerance", self.hit_tolerance),
            ("fine_rotation_step", self.fine_rotation_step),
            ("initial_scale", self.initial_scale),
            ("slew_step", self.slew_step),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be positive, got {value}"),
                });
            }
        }
        for (field, value) in [
            ("zoom_factor", self.zoom_factor),
            ("zoom_factor_lots", self.zoom_factor_lots),
        ] {
            if !(value > 0.0 && value < 1.0) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be in (0, 1), got {value}"),
                });
            }
        }
        Ok(())
    }

    /// 实际使用的网格步长
    pub fn effective_grid_step(&self) -> f64 {
        self.grid_step.max(1.0)
    }
}
