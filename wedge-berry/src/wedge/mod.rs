//! 图像上的楔形 (带角度限制的圆环扇区) 及其掩膜.
//!
//! 楔形由圆心, 朝向角, 总张角和内外半径组成. 角度约定与 [`crate::geom`] 相同:
//! 0° 指向 +x, 向 +y (图像中的顺时针) 增长.
//!
//! 判断像素方向时我们不直接比较两个角度, 而是先把像素偏移旋转到楔形朝向的坐标系中,
//! 再用 `atan2` 求出相对于朝向的夹角. 这样得到的夹角天然位于 `[-PI, PI]`,
//! 并且关于朝向轴严格对称.

mod mask;
mod save;

pub use mask::{rasterize, WedgeMask, WedgeParameters};
pub use save::{overlay, ImgWriteVis, WEDGE_GREEN};

use crate::geom::{cartesian_to_polar, normalize_degrees, Point2d};
use std::f64::consts::PI;
use std::fmt::Formatter;

/// 二维图像上的一个楔形.
///
/// 该结构不负责检测图像越界: 圆心可以位于图像之外, 半径也可以任意大.
#[derive(Copy, Clone)]
pub struct Wedge {
    center: Point2d,
    /// 朝向, 度. `(-180, 180]`
    facing: f64,
    /// 半张角, 弧度. `[0, PI]`
    half_span: f64,
    inner: f64,
    outer: f64,
    cos: f64,
    sin: f64,
}

/// 角度比弧度更直观. 压缩到一行.
impl std::fmt::Debug for Wedge {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!(
            "Wedge {{ center: {:?}, facing: {:.4}°, span: {:.4}°, r: [{:.2}, {:.2}] }}",
            self.center,
            self.facing,
            self.span(),
            self.inner,
            self.outer
        ))
    }
}

impl Wedge {
    /// 以 `center` 为圆心, 朝向 `facing` 度, 总张角 `span` 度 (关于朝向对称),
    /// 内外半径为 `inner` 和 `outer` 像素, 创建一个楔形.
    ///
    /// - `span` 被限制到 `[0, 360]`, 不小于 360 时楔形退化为完整圆环;
    /// - 负的 `inner` 按 0 处理;
    /// - `inner > outer` 时楔形为空.
    pub fn new(center: Point2d, facing: f64, span: f64, inner: f64, outer: f64) -> Self {
        let facing = normalize_degrees(facing);
        let theta = facing.to_radians();
        Self {
            center,
            facing,
            half_span: (span.clamp(0.0, 360.0) / 2.0).to_radians().min(PI),
            inner: inner.max(0.0),
            outer,
            cos: theta.cos(),
            sin: theta.sin(),
        }
    }

    /// 由圆心和孔位点构建. 朝向为圆心指向孔位点的方向,
    /// 内半径为两点距离加上 `offset`, 外半径再加上 `thickness` (均为像素).
    pub fn from_well(center: Point2d, well: Point2d, offset: f64, thickness: f64, span: f64) -> Self {
        let (length, facing) =
            cartesian_to_polar((well.x - center.x) as f64, (well.y - center.y) as f64);
        let inner = length + offset;
        Self::new(center, facing, span, inner, inner + thickness)
    }

    /// 获取圆心.
    #[inline]
    pub fn center(&self) -> Point2d {
        self.center
    }

    /// 获取朝向角, 位于 `(-180, 180]`.
    #[inline]
    pub fn facing(&self) -> f64 {
        self.facing
    }

    /// 获取总张角.
    #[inline]
    pub fn span(&self) -> f64 {
        (self.half_span * 2.0).to_degrees()
    }

    /// 获取内半径.
    #[inline]
    pub fn inner(&self) -> f64 {
        self.inner
    }

    /// 获取外半径.
    #[inline]
    pub fn outer(&self) -> f64 {
        self.outer
    }

    /// 判断像素 `point` 是否落在楔形内.
    #[inline]
    pub fn contains(&self, point: Point2d) -> bool {
        self.test(
            (point.x - self.center.x) as f64,
            (point.y - self.center.y) as f64,
        )
    }

    /// 相对于圆心的偏移 `(dx, dy)` 是否落在楔形内?
    #[inline]
    pub(crate) fn test(&self, dx: f64, dy: f64) -> bool {
        let d2 = dx * dx + dy * dy;
        let along = dx * self.cos + dy * self.sin;
        let across = dy * self.cos - dx * self.sin;
        let off = f64::atan2(across, along).abs();
        (self.inner * self.inner <= d2) & (d2 <= self.outer * self.outer) & (off <= self.half_span)
    }
}
