//! 零件目录
//!
//! 目录把名称解析为零件：尺寸、单位线框、接口与成本模型。
//! 内置目录收录 2020/3030 型材及其两通/三通角件。

use crate::cost::CostModel;
use crate::entity::{Interface, Part};
use crate::error::{CoreError, CoreResult};
use crate::math::Vector3;
use crate::wireframe::Wireframe;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// 接口表：名称 → [热点 x, y, z, 方向 x, y, z]
const INTERFACE_TABLE: &[(&str, [f64; 6])] = &[
    ("2020+X", [10.0, 0.0, 10.0, 1.0, 0.0, 0.0]),
    ("2020+Y", [0.0, 10.0, 10.0, 0.0, 1.0, 0.0]),
    ("2020+Z", [0.0, 0.0, 5.0, 0.0, 0.0, 1.0]),
    ("2020-X", [-10.0, 0.0, 10.0, -1.0, 0.0, 0.0]),
    ("2020-Y", [0.0, -10.0, 10.0, 0.0, -1.0, 0.0]),
    ("2020-Z", [0.0, 0.0, 0.0, 0.0, 0.0, -1.0]),
    ("3030+X", [15.0, 0.0, 15.0, 1.0, 0.0, 0.0]),
    ("3030+Y", [0.0, 15.0, 15.0, 0.0, 1.0, 0.0]),
    ("3030+Z", [15.0, 15.0, 6.0, 0.0, 0.0, 1.0]),
    ("3030-X", [-15.0, 0.0, 15.0, -1.0, 0.0, 0.0]),
    ("3030-Y", [0.0, -15.0, 15.0, 0.0, -1.0, 0.0]),
    ("3030-Z", [0.0, 0.0, 0.0, 0.0, 0.0, -1.0]),
];

/// 按名称查找接口
pub fn lookup_interface(name: &str) -> CoreResult<Interface> {
    INTERFACE_TABLE
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(n, r)| {
            Interface::new(
                *n,
                Vector3::new(r[0], r[1], r[2]),
                Vector3::new(r[3], r[4], r[5]),
            )
        })
        .ok_or_else(|| CoreError::UnknownInterface(name.to_string()))
}

/// 型材名称，例如 `2020 Alex`
pub fn alex_name(dim1: f64, dim2: f64) -> String {
    format!("{dim1:.0}{dim2:.0} Alex")
}

pub fn corner_two_way_name(dim: f64) -> String {
    format!("{dim:.0}{dim:.0} Corner Two Way")
}

pub fn corner_three_way_name(dim: f64) -> String {
    format!("{dim:.0}{dim:.0} Corner Three Way")
}

/// 目录记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub name: String,
    pub wireframe: String,
    pub dim1: f64,
    pub dim2: f64,
    /// `None` 表示长度由使用者指定
    pub length: Option<f64>,
    pub cost: CostModel,
    pub color: String,
    pub model_file: String,
    pub interfaces: Vec<String>,
}

impl CatalogRecord {
    /// 按记录创建零件；未知线框退回到 `Cube`
    pub fn instantiate(&self, length: f64) -> CoreResult<Part> {
        let unit = match Wireframe::builtin(&self.wireframe) {
            Ok(wf) => wf,
            Err(e) => {
                warn!("{e} in record {}, falling back to Cube", self.name);
                Wireframe::builtin("Cube")?
            }
        };
        let interfaces = self
            .interfaces
            .iter()
            .map(|name| lookup_interface(name))
            .collect::<CoreResult<Vec<_>>>()?;
        let length = self.length.unwrap_or(length);
        Ok(
            Part::new(&self.name, unit, Vector3::new(self.dim1, self.dim2, length))
                .with_fixed_length(self.length.is_some())
                .with_interfaces(interfaces)
                .with_cost(self.cost.clone())
                .with_color(&self.color)
                .with_model_file(&self.model_file),
        )
    }
}

/// 零件目录接口
pub trait PartCatalog {
    /// 名称 → 零件；目录固定长度的零件忽略 `length`
    fn resolve(&self, name: &str, length: f64) -> CoreResult<Part>;

    fn names(&self) -> Vec<String>;
}

/// 内置目录
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    records: Vec<CatalogRecord>,
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        let mut records = Vec::new();
        for (dim, short_price, long_price, corner_price) in
            [(20.0, 2.5, 30.0, 1.2), (30.0, 3.5, 42.0, 2.4)]
        {
            let axis = |suffix: &str| format!("{dim:.0}{dim:.0}{suffix}");
            records.push(CatalogRecord {
                name: alex_name(dim, dim),
                wireframe: "Cube".to_string(),
                dim1: dim,
                dim2: dim,
                length: None,
                cost: CostModel::piecewise([
                    (50.0, short_price + 0.5),
                    (299.0, short_price + 0.5),
                    (300.0, short_price),
                    (4000.0, long_price),
                ]),
                color: "silver".to_string(),
                model_file: format!("{dim:.0}{dim:.0}_Alex.stl"),
                interfaces: ["+X", "-X", "+Y", "-Y", "+Z", "-Z"]
                    .iter()
                    .map(|s| axis(s))
                    .collect(),
            });
            records.push(CatalogRecord {
                name: corner_two_way_name(dim),
                wireframe: "Prism".to_string(),
                dim1: dim,
                dim2: dim,
                length: Some(dim),
                cost: CostModel::Fixed(corner_price),
                color: "dimgray".to_string(),
                model_file: format!("{dim:.0}{dim:.0}_Corner_Two_Way.stl"),
                interfaces: vec![axis("-X"), axis("-Z")],
            });
            records.push(CatalogRecord {
                name: corner_three_way_name(dim),
                wireframe: "Cube".to_string(),
                dim1: dim,
                dim2: dim,
                length: Some(dim),
                cost: CostModel::Fixed(corner_price * 1.5),
                color: "dimgray".to_string(),
                model_file: format!("{dim:.0}{dim:.0}_Corner_Three_Way.stl"),
                interfaces: vec![axis("+X"), axis("+Y"), axis("+Z")],
            });
        }
        Self { records }
    }

    /// 添加或替换记录
    pub fn insert(&mut self, record: CatalogRecord) {
        match self.records.iter_mut().find(|r| r.name == record.name) {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    pub fn record(&self, name: &str) -> Option<&CatalogRecord> {
        self.records.iter().find(|r| r.name == name)
    }
}

impl PartCatalog for BuiltinCatalog {
    fn resolve(&self, name: &str, length: f64) -> CoreResult<Part> {
        self.record(name)
            .ok_or_else(|| CoreError::UnknownPart(name.to_string()))?
            .instantiate(length)
    }

    fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_interface() {
        let iface = lookup_interface("3030+Z").unwrap();
        assert_eq!(iface.hotspot, Vector3::new(15.0, 15.0, 6.0));
        assert_eq!(iface.direction, Vector3::z());
        assert_eq!(
            lookup_interface("4040+X"),
            Err(CoreError::UnknownInterface("4040+X".to_string()))
        );
    }

    #[test]
    fn test_resolve_alex_uses_requested_length() {
        let catalog = BuiltinCatalog::new();
        let part = catalog.resolve(&alex_name(20.0, 20.0), 650.0).unwrap();
        assert_eq!(part.name, "2020 Alex");
        assert_eq!(part.length, 650.0);
        assert!(!part.fixed_length);
        assert_eq!(part.interfaces.len(), 6);
        // 300..4000 之间线性插值
        let expected = 2.5 + (650.0 - 300.0) / 3700.0 * 27.5;
        assert!((part.cost() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_corner_ignores_requested_length() {
        let catalog = BuiltinCatalog::new();
        let part = catalog.resolve(&corner_three_way_name(30.0), 900.0).unwrap();
        assert_eq!(part.length, 30.0);
        assert!(part.fixed_length);
        assert!((part.cost() - 3.6).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_part() {
        let catalog = BuiltinCatalog::new();
        assert_eq!(
            catalog.resolve("Flux Capacitor", 1.0).unwrap_err(),
            CoreError::UnknownPart("Flux Capacitor".to_string())
        );
    }

    #[test]
    fn test_insert_custom_record_with_bad_wireframe() {
        let mut catalog = BuiltinCatalog::new();
        let count = catalog.names().len();
        catalog.insert(CatalogRecord {
            name: "Bracket".to_string(),
            wireframe: "Torus".to_string(),
            dim1: 40.0,
            dim2: 10.0,
            length: Some(5.0),
            cost: CostModel::Fixed(0.8),
            color: "black".to_string(),
            model_file: String::new(),
            interfaces: vec![],
        });
        assert_eq!(catalog.names().len(), count + 1);
        let part = catalog.resolve("Bracket", 100.0).unwrap();
        assert_eq!(part.unit_wireframe(), &Wireframe::builtin("Cube").unwrap());
    }
}
