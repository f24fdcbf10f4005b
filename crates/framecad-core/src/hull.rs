//! 2D 凸包
//!
//! 线框投影后大量线段共线或反向重合，直接做极角排序会出现并列。
//! 处理流程：
//! 1. 路径断点替换为点集质心
//! 2. 合并距离小于 [`MERGE_EPSILON`] 的重复点
//! 3. 对每个点施加亚像素抖动以打破并列
//! 4. 以最低点为起点按极角排序，维护只允许左转（逆时针）的栈
//! 5. 按原始坐标剔除共线点

use crate::math::{Point2, Vector2};
use std::cmp::Ordering;

/// 视为同一点的距离
pub const MERGE_EPSILON: f64 = 1e-6;

/// 抖动幅度（远小于一个像素，也远小于合并距离）
const JITTER: f64 = 1e-8;

/// 凸包结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hull {
    /// 逆时针顺序的凸包顶点（原始坐标）
    pub points: Vec<Point2>,
    /// 顶点在输入点集中的索引
    pub indices: Vec<usize>,
}

impl Hull {
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 首尾相接的轮廓线
    pub fn closed_outline(&self) -> Vec<Point2> {
        let mut outline = self.points.clone();
        if let Some(first) = self.points.first() {
            outline.push(*first);
        }
        outline
    }

    /// 凸包包围盒的中点
    pub fn midpoint(&self) -> Option<Point2> {
        if self.points.is_empty() {
            return None;
        }
        let bbox = crate::math::BoundingBox2::from_points(self.points.iter().copied());
        Some(bbox.center())
    }
}

/// 确定性的伪随机抖动（splitmix64）
fn jitter(index: usize) -> Vector2 {
    fn mix(mut z: u64) -> u64 {
        z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
    let unit = |bits: u64| (bits >> 11) as f64 / (1u64 << 53) as f64 * 2.0 - 1.0;
    let a = mix(index as u64);
    let b = mix(a);
    Vector2::new(unit(a), unit(b)) * JITTER
}

/// 叉积 (b - a) × (c - a)，正值为左转
fn cross(a: &Point2, b: &Point2, c: &Point2) -> f64 {
    let ab = b - a;
    let ac = c - a;
    ab.x * ac.y - ab.y * ac.x
}

/// 点集中相距最远的两点（共线点集的两个端点）
fn extreme_pair(points: &[Point2], candidates: &[usize]) -> Vec<usize> {
    let farthest_from = |from: usize| {
        candidates
            .iter()
            .copied()
            .max_by(|&a, &b| {
                let da = (points[a] - points[from]).norm();
                let db = (points[b] - points[from]).norm();
                da.partial_cmp(&db).unwrap_or(Ordering::Equal)
            })
            .unwrap_or(from)
    };
    let Some(&first) = candidates.first() else {
        return Vec::new();
    };
    let a = farthest_from(first);
    let b = farthest_from(a);
    if a == b {
        vec![a]
    } else {
        vec![a, b]
    }
}

/// 计算凸包
///
/// `None` 表示线框中的路径断点。
pub fn convex_hull(points: &[Option<Point2>]) -> Hull {
    let valid: Vec<Point2> = points.iter().flatten().copied().collect();
    if valid.is_empty() {
        return Hull::default();
    }
    let centroid = Point2::from(
        valid.iter().fold(Vector2::zeros(), |acc, p| acc + p.coords) / valid.len() as f64,
    );
    let filled: Vec<Point2> = points.iter().map(|p| p.unwrap_or(centroid)).collect();

    // 去重（保留第一次出现的索引）
    let mut unique: Vec<usize> = Vec::with_capacity(filled.len());
    for (i, p) in filled.iter().enumerate() {
        if !unique.iter().any(|&j| (filled[j] - p).norm() < MERGE_EPSILON) {
            unique.push(i);
        }
    }

    if unique.len() < 3 {
        return Hull {
            points: unique.iter().map(|&i| filled[i]).collect(),
            indices: unique,
        };
    }

    let jittered: Vec<Point2> = filled
        .iter()
        .enumerate()
        .map(|(i, p)| p + jitter(i))
        .collect();

    // 起点：y 最小（并列取 x 最小）
    let start_pos = unique
        .iter()
        .enumerate()
        .min_by(|(_, &a), (_, &b)| {
            let (pa, pb) = (jittered[a], jittered[b]);
            pa.y.partial_cmp(&pb.y)
                .unwrap_or(Ordering::Equal)
                .then(pa.x.partial_cmp(&pb.x).unwrap_or(Ordering::Equal))
        })
        .map(|(pos, _)| pos)
        .unwrap_or(0);
    let start = unique.swap_remove(start_pos);
    let candidates: Vec<usize> = std::iter::once(start).chain(unique.iter().copied()).collect();
    let origin = jittered[start];

    unique.sort_by(|&a, &b| {
        let da = jittered[a] - origin;
        let db = jittered[b] - origin;
        let angle_a = da.y.atan2(da.x);
        let angle_b = db.y.atan2(db.x);
        angle_a
            .partial_cmp(&angle_b)
            .unwrap_or(Ordering::Equal)
            .then(da.norm().partial_cmp(&db.norm()).unwrap_or(Ordering::Equal))
    });

    let mut stack: Vec<usize> = vec![start];
    for &i in &unique {
        while stack.len() >= 2 {
            let top = stack[stack.len() - 1];
            let below = stack[stack.len() - 2];
            if cross(&jittered[below], &jittered[top], &jittered[i]) > 0.0 {
                break;
            }
            stack.pop();
        }
        stack.push(i);
    }

    // 抖动可能让真正共线的点幸存，按原始坐标再筛一遍
    let n = stack.len();
    let mut indices: Vec<usize> = if n < 3 {
        stack
    } else {
        (0..n)
            .filter(|&k| {
                let prev = &filled[stack[(k + n - 1) % n]];
                let cur = &filled[stack[k]];
                let next = &filled[stack[(k + 1) % n]];
                let scale = (next - prev).norm().max(1.0);
                cross(prev, cur, next).abs() > MERGE_EPSILON * scale
            })
            .map(|k| stack[k])
            .collect()
    };
    // 全部共线：退化为两个端点
    if indices.len() < 3 {
        indices = extreme_pair(&filled, &candidates);
    }

    Hull {
        points: indices.iter().map(|&i| filled[i]).collect(),
        indices,
    }
}
