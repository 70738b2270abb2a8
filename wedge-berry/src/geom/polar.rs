//! 图像坐标系下的直角坐标与极坐标互转.
//!
//! 角度均以 "度" 为单位. 0° 指向 +x, 角度向 +y (图像中的顺时针) 增长.

/// 将角度规范化到 `(-180, 180]`.
///
/// 先对 360 取欧几里得余数再平移, 调用方传入的角度常常是参考角与偏转角之和, 可能远超 360°.
/// 同一输入总是得到逐位相同的输出.
#[inline]
pub fn normalize_degrees(degrees: f64) -> f64 {
    let r = (degrees + 180.0).rem_euclid(360.0) - 180.0;
    if r <= -180.0 {
        r + 360.0
    } else {
        r
    }
}

/// 直角坐标偏移 `(dx, dy)` 转换为 `(半径, 角度)`.
///
/// `dx == dy == 0` 时返回 `(0.0, 0.0)`.
#[inline]
pub fn cartesian_to_polar(dx: f64, dy: f64) -> (f64, f64) {
    let radius = (dx * dx + dy * dy).sqrt();
    let angle = f64::atan2(dy, dx).to_degrees();
    (radius, angle)
}

/// `(半径, 角度)` 转换为直角坐标偏移 `(dx, dy)`.
///
/// 角度在求三角函数之前会先经过 [`normalize_degrees`].
#[inline]
pub fn polar_to_cartesian(radius: f64, degrees: f64) -> (f64, f64) {
    let theta = normalize_degrees(degrees).to_radians();
    (radius * theta.cos(), radius * theta.sin())
}

#[cfg(test)]
mod tests {
    use super::{cartesian_to_polar, normalize_degrees, polar_to_cartesian};
    use crate::geom::f64_eq;

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert_eq!(normalize_degrees(540.0), 180.0);
        assert_eq!(normalize_degrees(765.0), 45.0);
        assert_eq!(normalize_degrees(-90.0 + 450.0), 0.0);
        assert_eq!(normalize_degrees(-270.0), 90.0);
        assert_eq!(normalize_degrees(359.0), -1.0);
    }

    /// 图像坐标系下 90° 指向 +y, 即屏幕上的正下方.
    #[test]
    fn test_image_convention() {
        let (dx, dy) = polar_to_cartesian(10.0, 90.0);
        assert!(f64_eq(dx, 0.0) && f64_eq(dy, 10.0));

        let (dx, dy) = polar_to_cartesian(10.0, -90.0);
        assert!(f64_eq(dx, 0.0) && f64_eq(dy, -10.0));

        let (r, a) = cartesian_to_polar(0.0, 5.0);
        assert!(f64_eq(r, 5.0) && f64_eq(a, 90.0));

        // corner case
        assert_eq!(cartesian_to_polar(0.0, 0.0), (0.0, 0.0));
    }

    #[test]
    fn test_polar_round_trip() {
        for &r in &[0.5, 1.0, 123.25, 4800.0] {
            for k in -8..=8 {
                let theta = k as f64 * 67.5 + 0.3;
                let (dx, dy) = polar_to_cartesian(r, theta);
                let (r2, theta2) = cartesian_to_polar(dx, dy);
                assert!((r - r2).abs() < 1e-9 * r.max(1.0), "{r} vs {r2}");

                let diff = normalize_degrees(theta - theta2);
                assert!(diff.abs() < 1e-9, "{theta} vs {theta2}");
            }
        }
    }
}
