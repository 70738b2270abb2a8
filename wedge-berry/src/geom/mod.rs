//! 图像坐标系下的基础几何.
//!
//! 原点位于图像左上角, x 轴向右增长, y 轴向下增长.
//! 角度以 +x 方向为 0°, 朝 +y 方向增长. 由于 y 轴朝下, 这在屏幕上表现为 **顺时针** 方向,
//! 与数学上的习惯相反. 孔位偏转角和楔形朝向角都以此为准, 不可混用.

mod bbox;
mod polar;

pub use bbox::{compute_bbox, BBOX_SAMPLES};
pub use polar::{cartesian_to_polar, normalize_degrees, polar_to_cartesian};

use num::ToPrimitive;
use std::fmt::Formatter;
use std::ops::{Add, Sub};

#[cfg(test)]
pub(crate) fn f64_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-8
}

/// 整数像素坐标 `(x, y)`.
///
/// 公开接口中的像素位置一律四舍五入到最近的整数像素, 不对外暴露小数像素.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Point2d {
    /// 水平方向分量.
    pub x: i64,
    /// 垂直方向分量 (向下为正).
    pub y: i64,
}

/// 压缩到一行.
impl std::fmt::Debug for Point2d {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("({}, {})", self.x, self.y))
    }
}

impl Point2d {
    /// 直接构建.
    #[inline]
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// 从浮点坐标四舍五入构建. 坐标无法用 `i64` 表示 (如 NaN, inf) 时返回 `None`.
    #[inline]
    pub fn from_f64(x: f64, y: f64) -> Option<Self> {
        Some(Self {
            x: x.round().to_i64()?,
            y: y.round().to_i64()?,
        })
    }

    /// 以浮点偏移量 `(dx, dy)` 移动后四舍五入. 无法表示时保持原值.
    #[inline]
    pub fn offset_by(self, dx: f64, dy: f64) -> Self {
        Self::from_f64(self.x as f64 + dx, self.y as f64 + dy).unwrap_or(self)
    }

    /// 该点是否位于 `[0, width) x [0, height)` 之内?
    #[inline]
    pub fn is_within(&self, size: Size2d) -> bool {
        (0..size.width as i64).contains(&self.x) && (0..size.height as i64).contains(&self.y)
    }

    /// 将该点限制到 `[0, width - 1] x [0, height - 1]`. 空尺寸时返回原点.
    pub fn clamp_into(self, size: Size2d) -> Self {
        if size.is_empty() {
            return Self::default();
        }
        Self {
            x: self.x.clamp(0, size.width as i64 - 1),
            y: self.y.clamp(0, size.height as i64 - 1),
        }
    }

    /// 从该点出发沿 `(dx, dy)` 移动, 在 `[0, width - 1] x [0, height - 1]` 的边界处停下.
    ///
    /// 与 [`Point2d::clamp_into`] 分别限制两个分量不同, 这里按同一比例 `t <= 1` 缩短偏移量,
    /// 移动方向保持不变 (仅受四舍五入影响). 起点本身先经过 `clamp_into`.
    pub fn ray_into(self, dx: f64, dy: f64, size: Size2d) -> Self {
        if size.is_empty() {
            return Self::default();
        }
        let from = self.clamp_into(size);
        let reach = |p: i64, d: f64, len: u32| {
            if d > 0.0 {
                (len as i64 - 1 - p) as f64 / d
            } else if d < 0.0 {
                p as f64 / -d
            } else {
                f64::INFINITY
            }
        };
        let t = reach(from.x, dx, size.width)
            .min(reach(from.y, dy, size.height))
            .min(1.0);
        from.offset_by(t * dx, t * dy).clamp_into(size)
    }
}

impl Add for Point2d {
    type Output = Point2d;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2d {
    type Output = Point2d;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl From<(i64, i64)> for Point2d {
    #[inline]
    fn from((x, y): (i64, i64)) -> Self {
        Self::new(x, y)
    }
}

/// 图像尺寸 `(宽, 高)`, 以像素为单位.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Size2d {
    /// 宽, 即 x 方向像素数.
    pub width: u32,
    /// 高, 即 y 方向像素数.
    pub height: u32,
}

impl Size2d {
    /// 直接构建.
    #[inline]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 面积为 0?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// 像素个数.
    #[inline]
    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// 对角线长度, 以像素为单位.
    #[inline]
    pub fn diagonal(&self) -> f64 {
        (self.width as f64).hypot(self.height as f64)
    }

    /// 转换为 `ndarray` 的 `(高, 宽)` 形状.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.height as usize, self.width as usize)
    }
}

impl From<(u32, u32)> for Size2d {
    #[inline]
    fn from((width, height): (u32, u32)) -> Self {
        Self::new(width, height)
    }
}
