//! 接口啮合检测
//!
//! 对零件的每个接口：在垂直于接口方向的平面上投影其他顶层零件，
//! 若某个零件投影凸包的中点与接口热点重合，且其包围盒与所属零件的包围盒齐平
//! （任一轴向上一方的最大面贴着另一方的最小面），则该接口已啮合。
//! 未啮合的接口绘制一段短的彩色提示线。
//!
//! 组合本身不参与检测，只检测叶子零件。

use crate::entity::{Entity, EntityId, Interface, Part};
use crate::hull::convex_hull;
use crate::math::{BoundingBox3, Point2, Point3, Vector3};
use crate::scene::Scene;
use nalgebra::Matrix3x2;

/// 中点重合与包围盒齐平的容差（mm）
pub const ENGAGEMENT_EPSILON: f64 = 0.01;

/// 提示线长度（接口方向的倍数）
pub const STUB_LENGTH: f64 = 5.0;

/// 未啮合接口的提示线
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceStub {
    pub owner: EntityId,
    pub name: String,
    pub start: Point3,
    pub end: Point3,
    /// 颜色编码方向分量的绝对值
    pub color: [u8; 3],
}

/// 垂直于 `direction` 的投影基（两列）
fn perpendicular_basis(direction: &Vector3) -> Option<Matrix3x2<f64>> {
    let d = direction.try_normalize(f64::EPSILON)?;
    let axis = d.iamin();
    let mut u0 = Vector3::zeros();
    u0[axis] = 1.0;
    let u0 = (u0 - d * d.dot(&u0)).try_normalize(f64::EPSILON)?;
    let u1 = d.cross(&u0);
    Some(Matrix3x2::from_columns(&[u0, u1]))
}

fn project(basis: &Matrix3x2<f64>, p: &Point3) -> Point2 {
    Point2::from(basis.transpose() * p.coords)
}

/// 两个包围盒在某个轴向上面对面贴合（不限于接口方向）
fn is_flush(a: &BoundingBox3, b: &BoundingBox3) -> bool {
    (0..3).any(|i| {
        (a.max[i] - b.min[i]).abs() < ENGAGEMENT_EPSILON
            || (a.min[i] - b.max[i]).abs() < ENGAGEMENT_EPSILON
    })
}

/// 接口是否与场景中另一个顶层零件啮合
pub fn is_engaged(interface: &Interface, owner_id: EntityId, owner: &Part, scene: &Scene) -> bool {
    let (hotspot, direction) = interface.world_pose(&owner.transform);
    let Some(basis) = perpendicular_basis(&direction) else {
        return false;
    };
    let target = project(&basis, &hotspot);
    let owner_box = owner.wireframe().bounding_box();

    scene
        .entities()
        .iter()
        .filter(|e| e.id != owner_id)
        .filter_map(|e| e.as_part())
        .any(|candidate| {
            let wireframe = candidate.wireframe();
            let projected: Vec<Option<Point2>> = wireframe
                .rows()
                .iter()
                .map(|row| row.as_ref().map(|p| project(&basis, p)))
                .collect();
            let Some(midpoint) = convex_hull(&projected).midpoint() else {
                return false;
            };
            (midpoint - target).norm() < ENGAGEMENT_EPSILON
                && is_flush(&owner_box, &wireframe.bounding_box())
        })
}

/// 实体（及其所有叶子零件）上未啮合接口的提示线
pub fn interface_stubs(entity: &Entity, scene: &Scene) -> Vec<InterfaceStub> {
    let mut stubs = Vec::new();
    for (id, part) in entity.leaves() {
        for interface in &part.interfaces {
            if is_engaged(interface, id, part, scene) {
                continue;
            }
            let (start, direction) = interface.world_pose(&part.transform);
            let color = direction.map(|c| (c.abs().min(1.0) * 255.0) as u8);
            stubs.push(InterfaceStub {
                owner: id,
                name: interface.name.clone(),
                start,
                end: start + direction * STUB_LENGTH,
                color: [color.x, color.y, color.z],
            });
        }
    }
    stubs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Group;
    use crate::wireframe::Wireframe;

    const EPS: f64 = 1e-9;

    fn bar_with_top_interface() -> Part {
        Part::new(
            "bar",
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(20.0, 20.0, 100.0),
        )
        .with_interfaces(vec![Interface::new(
            "top",
            Vector3::new(0.0, 0.0, 100.0),
            Vector3::z(),
        )])
    }

    fn plain_bar(at: Vector3) -> Entity {
        let mut e = Entity::from(Part::new(
            "bar",
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(20.0, 20.0, 100.0),
        ));
        e.translate(&at);
        e
    }

    #[test]
    fn test_perpendicular_basis_is_orthonormal() {
        let d = Vector3::new(0.0, 1.0, 0.0);
        let b = perpendicular_basis(&d).unwrap();
        let u0 = b.column(0).into_owned();
        let u1 = b.column(1).into_owned();
        assert!(u0.dot(&d).abs() < EPS);
        assert!(u1.dot(&d).abs() < EPS);
        assert!(u0.dot(&u1).abs() < EPS);
        assert!((u0.norm() - 1.0).abs() < EPS);
        assert!(perpendicular_basis(&Vector3::zeros()).is_none());
    }

    #[test]
    fn test_stacked_bar_engages_top_interface() {
        let mut scene = Scene::new();
        let owner = scene.append(Entity::from(bar_with_top_interface()), false);
        let other = scene.append(plain_bar(Vector3::new(0.0, 0.0, 100.0)), false);

        let entity = scene.get(owner).unwrap();
        let part = entity.as_part().unwrap();
        assert!(is_engaged(&part.interfaces[0], owner, part, &scene));
        assert!(interface_stubs(entity, &scene).is_empty());

        scene.get_mut(other).unwrap().translate(&Vector3::new(50.0, 0.0, 0.0));
        let entity = scene.get(owner).unwrap();
        let stubs = interface_stubs(entity, &scene);
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].color, [0, 0, 255]);
        assert!((stubs[0].end - Point3::new(0.0, 0.0, 105.0)).norm() < EPS);
    }

    #[test]
    fn test_overlapping_bar_is_not_flush() {
        let mut scene = Scene::new();
        let owner = scene.append(Entity::from(bar_with_top_interface()), false);
        scene.append(plain_bar(Vector3::new(0.0, 0.0, 50.0)), false);
        let part = scene.get(owner).unwrap().as_part().unwrap();
        assert!(!is_engaged(&part.interfaces[0], owner, part, &scene));
    }

    fn plate_at(z: f64) -> Entity {
        let mut e = Entity::from(Part::new(
            "plate",
            Wireframe::builtin("Cube").unwrap(),
            Vector3::new(40.0, 40.0, 5.0),
        ));
        e.translate(&Vector3::new(0.0, 0.0, z));
        e
    }

    #[test]
    fn test_contact_along_interface_axis_engages() {
        // 盖板比型材宽，x/y 方向的面都不贴合，只在 z 向接触
        let mut scene = Scene::new();
        let owner = scene.append(Entity::from(bar_with_top_interface()), false);
        scene.append(plate_at(100.0), false);
        let part = scene.get(owner).unwrap().as_part().unwrap();
        assert!(is_engaged(&part.interfaces[0], owner, part, &scene));
    }

    #[test]
    fn test_gap_along_interface_axis_is_not_flush() {
        let mut scene = Scene::new();
        let owner = scene.append(Entity::from(bar_with_top_interface()), false);
        scene.append(plate_at(100.5), false);
        let part = scene.get(owner).unwrap().as_part().unwrap();
        assert!(!is_engaged(&part.interfaces[0], owner, part, &scene));
    }

    #[test]
    fn test_is_flush_any_axis() {
        let a = BoundingBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(10.0, 10.0, 10.0));
        let beside = BoundingBox3::new(Point3::new(10.0, 3.0, 3.0), Point3::new(20.0, 7.0, 7.0));
        let below = BoundingBox3::new(Point3::new(2.0, 2.0, -5.0), Point3::new(8.0, 8.0, 0.005));
        let apart = BoundingBox3::new(Point3::new(11.0, 0.0, 0.0), Point3::new(20.0, 10.0, 10.0));
        assert!(is_flush(&a, &beside));
        assert!(is_flush(&a, &below));
        assert!(!is_flush(&a, &apart));
    }

    #[test]
    fn test_groups_are_not_candidates() {
        let mut scene = Scene::new();
        let owner = scene.append(Entity::from(bar_with_top_interface()), false);
        let stacked = plain_bar(Vector3::new(0.0, 0.0, 100.0));
        scene.append(Entity::from(Group::from_children([stacked])), false);
        let part = scene.get(owner).unwrap().as_part().unwrap();
        assert!(!is_engaged(&part.interfaces[0], owner, part, &scene));
    }
}
