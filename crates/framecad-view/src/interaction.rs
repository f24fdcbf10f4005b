//! 交互状态机
//!
//! 每个视口独立维护一个手势状态：
//! - `Idle`：无操作
//! - `BoxSelecting`：在空白处按下，拖出选择框
//! - `Dragging`：在实体上按下，拖动整个选择集
//!
//! 拖动的撤销快照只在第一次产生非零位移时登记一次。

use framecad_core::math::{snap_to_grid, Point2, Vector3};

/// 修饰键状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// 追加/取消选择
    pub shift: bool,
    /// 单轴拖动、精细旋转
    pub control: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        control: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        control: false,
    };
    pub const CONTROL: Modifiers = Modifiers {
        shift: false,
        control: true,
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    BoxSelecting {
        /// 按下位置（像素）
        anchor: Point2,
    },
    Dragging {
        /// 按下位置换算到世界坐标（不含偏移）
        start: Vector3,
        /// 已应用到选择集的累计位移
        last: Vector3,
        /// 本次拖动是否已登记撤销
        initialized: bool,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Gesture::Idle)
    }
}

/// 只保留绝对值最大的分量
pub fn dominant_axis(v: &Vector3) -> Vector3 {
    let axis = v.iamax();
    let mut out = Vector3::zeros();
    out[axis] = v[axis];
    out
}

/// 拖动位移：网格捕捉，按住 Control 时约束到单轴
pub fn drag_delta(start: &Vector3, current: &Vector3, grid_step: f64, modifiers: Modifiers) -> Vector3 {
    let delta = snap_to_grid(&(current - start), grid_step);
    if modifiers.control {
        dominant_axis(&delta)
    } else {
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dominant_axis() {
        let v = dominant_axis(&Vector3::new(3.0, -7.0, 5.0));
        assert_eq!(v, Vector3::new(0.0, -7.0, 0.0));
    }

    #[test]
    fn test_drag_delta_snaps_and_constrains() {
        let start = Vector3::new(0.0, 0.0, 0.0);
        let current = Vector3::new(12.7, 3.2, 0.0);
        assert_eq!(
            drag_delta(&start, &current, 5.0, Modifiers::NONE),
            Vector3::new(10.0, 0.0, 0.0)
        );
        let current = Vector3::new(12.7, 8.2, 0.0);
        assert_eq!(
            drag_delta(&start, &current, 1.0, Modifiers::CONTROL),
            Vector3::new(12.0, 0.0, 0.0)
        );
    }

    #[test]
    fn test_default_gesture_is_idle() {
        assert!(Gesture::default().is_idle());
    }
}
