//! 源切片图像.
//!
//! 提取只需要三种能力: 图像尺寸, 分辨率 (每像素微米数), 以及读取一个矩形区域.
//! 目前仅支持 TIFF 源图像; 格式不符时直接报错, 不尝试其他解码方式.

use crate::consts::MPP_RELATIVE_TOLERANCE;
use crate::error::{ExtractError, ExtractResult};
use crate::geom::{Point2d, Size2d};
use image::{ImageFormat, Rgb, RgbImage};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::Duration;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::tags::Tag;
use tiff::ColorType;

/// 源图像的物理分辨率, 每像素微米数.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution {
    /// x 方向.
    pub mpp_x: f64,
    /// y 方向.
    pub mpp_y: f64,
}

impl Resolution {
    /// 各向同性的分辨率.
    #[inline]
    pub fn isotropic(mpp: f64) -> Self {
        Self {
            mpp_x: mpp,
            mpp_y: mpp,
        }
    }

    /// 用于单位换算的单一分辨率.
    ///
    /// x/y 分辨率超出容差时记录一条警告, 取二者平均值. 某一分辨率不是有限正数时返回
    /// `ExtractError::InvalidResolution`.
    pub fn effective_mpp(&self, source_name: &str) -> ExtractResult<f64> {
        let Self { mpp_x, mpp_y } = *self;
        let valid = |v: f64| v.is_finite() && v > 0.0;
        if !valid(mpp_x) || !valid(mpp_y) {
            return Err(ExtractError::InvalidResolution {
                source_name: source_name.to_owned(),
                mpp_x,
                mpp_y,
            });
        }
        if (mpp_x - mpp_y).abs() > MPP_RELATIVE_TOLERANCE * mpp_x.max(mpp_y) {
            log::warn!("源图像 `{source_name}` 分辨率各向异性 (x = {mpp_x}, y = {mpp_y}), 取平均值");
            return Ok((mpp_x + mpp_y) / 2.0);
        }
        Ok(mpp_x)
    }
}

/// 可供提取的源切片.
pub trait SlideSource {
    /// 用于日志和报错的名称.
    fn name(&self) -> &str;

    /// 图像尺寸.
    fn dimensions(&self) -> Size2d;

    /// 物理分辨率.
    fn resolution(&self) -> Resolution;

    /// 读取以 `origin` 为左上角, 尺寸为 `size` 的区域, 统一为不含透明通道的 RGB8 格式.
    ///
    /// 区域必须完全位于图像之内, 否则返回 `ExtractError::RegionOutOfBounds`.
    fn read_region(&self, origin: Point2d, size: Size2d) -> ExtractResult<RgbImage>;
}

/// 已经完整载入内存的源切片.
#[derive(Clone, Debug)]
pub struct MemorySlide {
    name: String,
    pixels: RgbImage,
    resolution: Resolution,
}

impl MemorySlide {
    /// 直接构建.
    pub fn new<S: Into<String>>(name: S, pixels: RgbImage, resolution: Resolution) -> Self {
        Self {
            name: name.into(),
            pixels,
            resolution,
        }
    }

    /// 像素数据.
    #[inline]
    pub fn pixels(&self) -> &RgbImage {
        &self.pixels
    }
}

impl SlideSource for MemorySlide {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> Size2d {
        Size2d::new(self.pixels.width(), self.pixels.height())
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_region(&self, origin: Point2d, size: Size2d) -> ExtractResult<RgbImage> {
        let dims = self.dimensions();
        let fits = origin.x >= 0
            && origin.y >= 0
            && origin.x + size.width as i64 <= dims.width as i64
            && origin.y + size.height as i64 <= dims.height as i64;
        if !fits {
            return Err(ExtractError::RegionOutOfBounds { origin, size, dims });
        }
        let (x, y) = (origin.x as u32, origin.y as u32);
        Ok(image::imageops::crop_imm(&self.pixels, x, y, size.width, size.height).to_image())
    }
}

/// 磁盘上的 TIFF 源切片.
///
/// 打开时只读取尺寸, 像素格式和分辨率标签; 每次 [`SlideSource::read_region`] 只解码与请求区域
/// 相交的条带 (strip) 或瓦片 (tile), 内存占用与裁剪区域成正比, 与整张切片的大小无关.
/// 两种操作都在独立线程中进行, 超过时限返回 `ExtractError::Timeout`.
#[derive(Clone, Debug)]
pub struct TiffSlide {
    path: PathBuf,
    name: String,
    dims: Size2d,
    resolution: Resolution,
    timeout: Duration,
}

/// 在独立线程中执行 `job`, 最多等待 `timeout`. 超时后解码线程自行结束, 结果被丢弃.
fn with_deadline<T, F>(path: &Path, timeout: Duration, job: F) -> ExtractResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> ExtractResult<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        // 接收端可能已经超时返回.
        let _ = tx.send(job());
    });
    match rx.recv_timeout(timeout) {
        Ok(loaded) => loaded,
        Err(mpsc::RecvTimeoutError::Timeout) => Err(ExtractError::Timeout {
            path: path.to_path_buf(),
            timeout,
        }),
        Err(mpsc::RecvTimeoutError::Disconnected) => {
            Err(ExtractError::DecoderLost(path.to_path_buf()))
        }
    }
}

type TiffDecoder = Decoder<BufReader<File>>;

fn open_decoder(path: &Path) -> ExtractResult<TiffDecoder> {
    Ok(Decoder::new(BufReader::new(File::open(path)?))?)
}

/// 每个像素的通道数. 仅支持 8/16 位的灰度, 灰度 + 透明, RGB 与 RGBA.
fn channels(color: ColorType, path: &Path) -> ExtractResult<usize> {
    match color {
        ColorType::Gray(8 | 16) => Ok(1),
        ColorType::GrayA(8 | 16) => Ok(2),
        ColorType::RGB(8 | 16) => Ok(3),
        ColorType::RGBA(8 | 16) => Ok(4),
        other => Err(ExtractError::UnsupportedColor {
            path: path.to_path_buf(),
            color: format!("{other:?}"),
        }),
    }
}

/// 解码结果统一为 8 位采样. 16 位采样取高 8 位.
fn to_u8_samples(chunk: DecodingResult, path: &Path) -> ExtractResult<Vec<u8>> {
    match chunk {
        DecodingResult::U8(v) => Ok(v),
        DecodingResult::U16(v) => Ok(v.into_iter().map(|s| (s >> 8) as u8).collect()),
        _ => Err(ExtractError::UnsupportedColor {
            path: path.to_path_buf(),
            color: "non-integer samples".to_owned(),
        }),
    }
}

/// 去掉透明通道, 灰度复制到三个通道.
#[inline]
fn to_rgb(px: &[u8]) -> Rgb<u8> {
    match *px {
        [g] | [g, _] => Rgb([g, g, g]),
        [r, g, b, ..] => Rgb([r, g, b]),
        _ => Rgb([0, 0, 0]),
    }
}

/// 读取 TIFF 首个 IFD 的头信息: 尺寸与分辨率. 同时检查像素格式.
fn read_header(path: &Path) -> ExtractResult<(Size2d, Resolution)> {
    let mut decoder = open_decoder(path)?;
    channels(decoder.colortype()?, path)?;
    let (width, height) = decoder.dimensions()?;
    let resolution = read_resolution(&mut decoder, path)?;
    Ok((Size2d::new(width, height), resolution))
}

/// 只解码与 `origin`, `size` 相交的条带或瓦片, 拼出裁剪图像. 区域必须位于图像之内.
fn read_tiff_region(path: &Path, origin: Point2d, size: Size2d) -> ExtractResult<RgbImage> {
    let mut decoder = open_decoder(path)?;
    let n = channels(decoder.colortype()?, path)?;
    let (width, _) = decoder.dimensions()?;
    // 条带的宽度即图像宽度, 每行只有一个条带.
    let (chunk_w, chunk_h) = decoder.chunk_dimensions();
    let across = width.div_ceil(chunk_w);

    let (x0, y0) = (origin.x as u32, origin.y as u32);
    let (x1, y1) = (x0 + size.width, y0 + size.height);
    let mut out = RgbImage::new(size.width, size.height);
    for row in y0 / chunk_h..=(y1 - 1) / chunk_h {
        for col in x0 / chunk_w..=(x1 - 1) / chunk_w {
            let index = row * across + col;
            let (data_w, data_h) = decoder.chunk_data_dimensions(index);
            let samples = to_u8_samples(decoder.read_chunk(index)?, path)?;
            let (cx, cy) = (col * chunk_w, row * chunk_h);
            for y in y0.max(cy)..y1.min(cy + data_h) {
                for x in x0.max(cx)..x1.min(cx + data_w) {
                    let at = (((y - cy) * data_w + (x - cx)) as usize) * n;
                    let px = samples.get(at..at + n).ok_or_else(|| {
                        ExtractError::Tiff(tiff::TiffError::FormatError(
                            tiff::TiffFormatError::InconsistentSizesEncountered,
                        ))
                    })?;
                    out.put_pixel(x - x0, y - y0, to_rgb(px));
                }
            }
        }
    }
    Ok(out)
}

impl TiffSlide {
    /// 打开 `path` 处的 TIFF 图像, 读取尺寸与分辨率. 不解码像素.
    ///
    /// `timeout` 同时作为之后每次读取区域的时限.
    pub fn open<P: AsRef<Path>>(path: P, timeout: Duration) -> ExtractResult<Self> {
        let path = path.as_ref().to_path_buf();
        if ImageFormat::from_path(&path).ok() != Some(ImageFormat::Tiff) {
            return Err(ExtractError::UnsupportedFormat(path));
        }

        let worker_path = path.clone();
        let (dims, resolution) = with_deadline(&path, timeout, move || read_header(&worker_path))?;
        log::debug!("已打开 {path:?}: {dims:?}, {resolution:?}");
        Ok(Self {
            name: path.display().to_string(),
            path,
            dims,
            resolution,
            timeout,
        })
    }

    /// 图像路径.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SlideSource for TiffSlide {
    fn name(&self) -> &str {
        &self.name
    }

    fn dimensions(&self) -> Size2d {
        self.dims
    }

    fn resolution(&self) -> Resolution {
        self.resolution
    }

    fn read_region(&self, origin: Point2d, size: Size2d) -> ExtractResult<RgbImage> {
        let dims = self.dims;
        let fits = origin.x >= 0
            && origin.y >= 0
            && origin.x + size.width as i64 <= dims.width as i64
            && origin.y + size.height as i64 <= dims.height as i64;
        if !fits {
            return Err(ExtractError::RegionOutOfBounds { origin, size, dims });
        }
        if size.is_empty() {
            return Ok(RgbImage::new(size.width, size.height));
        }
        let path = self.path.clone();
        with_deadline(&self.path, self.timeout, move || {
            read_tiff_region(&path, origin, size)
        })
    }
}

/// 读取 TIFF 首个 IFD 中的分辨率.
///
/// 优先使用 Aperio 风格 `ImageDescription` 中的 `MPP = <值>`; 否则使用
/// `XResolution`/`YResolution` 与 `ResolutionUnit` (英寸或厘米).
fn read_resolution(decoder: &mut TiffDecoder, path: &Path) -> ExtractResult<Resolution> {
    if let Some(Value::Ascii(desc)) = decoder.find_tag(Tag::ImageDescription)? {
        if let Some(mpp) = parse_aperio_mpp(&desc) {
            return Ok(Resolution::isotropic(mpp));
        }
    }

    // 缺省单位为英寸.
    let unit = match decoder.find_tag(Tag::ResolutionUnit)? {
        Some(Value::Short(u)) => u as u32,
        Some(Value::Unsigned(u)) => u,
        _ => 2,
    };
    let um_per_unit = match unit {
        2 => 25_400.0,
        3 => 10_000.0,
        _ => return Err(ExtractError::MissingResolution(path.to_path_buf())),
    };

    let x = decoder.find_tag(Tag::XResolution)?.and_then(rational);
    let y = decoder.find_tag(Tag::YResolution)?.and_then(rational);
    match (x, y) {
        (Some(x), Some(y)) => Ok(Resolution {
            mpp_x: um_per_unit / x,
            mpp_y: um_per_unit / y,
        }),
        _ => Err(ExtractError::MissingResolution(path.to_path_buf())),
    }
}

fn rational(value: Value) -> Option<f64> {
    match value {
        Value::Rational(n, d) => Some(n as f64 / d as f64),
        Value::RationalBig(n, d) => Some(n as f64 / d as f64),
        Value::Float(v) => Some(v as f64),
        Value::Double(v) => Some(v),
        Value::List(mut values) if !values.is_empty() => rational(values.swap_remove(0)),
        _ => None,
    }
}

/// 解析 `"Aperio ...|AppMag = 20|MPP = 0.4990|..."` 中的 `MPP` 字段.
fn parse_aperio_mpp(desc: &str) -> Option<f64> {
    desc.split('|').find_map(|field| {
        let (key, value) = field.split_once('=')?;
        if key.trim() == "MPP" {
            value.trim().parse().ok()
        } else {
            None
        }
    })
}
