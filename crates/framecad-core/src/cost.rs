//! 成本模型
//!
//! 零件价格可以是固定值，也可以是按长度分段线性的价格表
//! （型材按长度计价）。超出表格范围时沿首/尾两段线性外推。

use serde::{Deserialize, Serialize};

/// 价格表中的一行
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub length: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CostModel {
    Fixed(f64),
    Piecewise(Vec<PricePoint>),
}

impl Default for CostModel {
    fn default() -> Self {
        CostModel::Fixed(0.0)
    }
}

impl CostModel {
    /// 由 (长度, 价格) 行构造分段价格表，按长度排序
    pub fn piecewise(rows: impl IntoIterator<Item = (f64, f64)>) -> Self {
        let mut table: Vec<PricePoint> = rows
            .into_iter()
            .map(|(length, price)| PricePoint { length, price })
            .collect();
        table.sort_by(|a, b| a.length.total_cmp(&b.length));
        CostModel::Piecewise(table)
    }

    /// 给定长度下的价格
    pub fn cost(&self, length: f64) -> f64 {
        match self {
            CostModel::Fixed(price) => *price,
            CostModel::Piecewise(table) => interpolate(table, length),
        }
    }
}

fn interpolate(table: &[PricePoint], x: f64) -> f64 {
    match table {
        [] => 0.0,
        [only] => only.price,
        _ => {
            // 第一个长度 >= x 的行，限制在 [1, n-1]
            let upper = table
                .partition_point(|row| row.length < x)
                .clamp(1, table.len() - 1);
            let p0 = table[upper - 1];
            let p1 = table[upper];
            let span = p1.length - p0.length;
            if span.abs() < f64::EPSILON {
                return p0.price;
            }
            (x - p0.length) / span * (p1.price - p0.price) + p0.price
        }
    }
}
