use super::{ExtractionJob, SlideSource};
use crate::config::WedgeExtent;
use crate::consts::WELL_REFERENCE_RADIUS_UM;
use crate::error::ExtractResult;
use crate::geom::{compute_bbox, polar_to_cartesian, Point2d, Size2d};
use image::ImageFormat;
use std::path::Path;

/// 单个任务的提取结果.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ExtractedRegion {
    /// 裁剪原点, 源图像坐标系.
    pub origin: Point2d,
    /// 装置中心, 裁剪图像坐标系.
    pub center: Point2d,
    /// 合成孔位点, 裁剪图像坐标系.
    pub well: Point2d,
    /// 裁剪尺寸.
    pub size: Size2d,
    /// 每像素微米数.
    pub mpp: f64,
}

impl ExtractedRegion {
    /// 外接矩形面积为 0, 没有写出裁剪图像.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.size.is_empty()
    }
}

/// 微米换算为像素. 缺失或非有限的参数返回 `None`.
#[inline]
fn um_to_px(um: Option<f64>, mpp: f64) -> Option<f64> {
    um.filter(|v| v.is_finite()).map(|v| v / mpp)
}

/// 对任务 `job` 执行一次提取, 将裁剪图像以 PNG 格式写入 `destination`.
///
/// 1. 读取源图像分辨率 (各向异性时取平均, 仅记录警告);
/// 2. 用分辨率将 `extent` 中的半径换算为像素. 内半径缺失时为 0, 外半径缺失时为图像对角线长度;
/// 3. 计算楔形外接矩形, 裁剪并写出;
/// 4. 计算裁剪图像内的装置中心, 以及沿楔形朝向距中心
///    [`WELL_REFERENCE_RADIUS_UM`] 的合成孔位点. 中心限制在裁剪图像之内; 孔位点沿朝向
///    在裁剪边界处截断, `孔位点 - 中心` 的方向仍是楔形朝向.
///
/// 外接矩形面积为 0 时不读取, 也不写出任何文件, 返回的 [`ExtractedRegion::is_degenerate`]
/// 为真, 此时标注点不做限制.
pub fn extract<S: SlideSource + ?Sized>(
    source: &S,
    destination: &Path,
    job: &ExtractionJob,
    extent: &WedgeExtent,
) -> ExtractResult<ExtractedRegion> {
    let mpp = source.resolution().effective_mpp(source.name())?;
    let dims = source.dimensions();
    let inner = um_to_px(extent.radius_inner_um, mpp).unwrap_or(0.0);
    let outer = um_to_px(extent.radius_outer_um, mpp).unwrap_or_else(|| dims.diagonal());

    let (origin, size) = compute_bbox(dims, job.center, job.facing, extent.span_degrees, inner, outer);
    let center = job.center - origin;
    let (dx, dy) = polar_to_cartesian(WELL_REFERENCE_RADIUS_UM / mpp, job.facing);

    if size.is_empty() {
        let well = center.offset_by(dx, dy);
        log::warn!(
            "{}: 楔形完全位于源图像 `{}` 之外, 外接矩形 {origin:?} + {size:?}",
            job.key,
            source.name()
        );
        return Ok(ExtractedRegion {
            origin,
            center,
            well,
            size,
            mpp,
        });
    }

    let crop = source.read_region(origin, size)?;
    if let Some(parent) = destination.parent() {
        std::fs::create_dir_all(parent)?;
    }
    crop.save_with_format(destination, ImageFormat::Png)?;
    log::debug!("{}: 已写出 {destination:?} ({size:?} @ {origin:?})", job.key);

    Ok(ExtractedRegion {
        origin,
        center: center.clamp_into(size),
        well: center.ray_into(dx, dy, size),
        size,
        mpp,
    })
}
