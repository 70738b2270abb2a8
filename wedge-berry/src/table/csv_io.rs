//! 表格的 CSV 读写.
//!
//! 区域表在读取时先校验表头, 再逐行解析为强类型记录. 写出时使用固定的列顺序,
//! 并按身份键排序.

use super::{IdentityKey, RegionStatus, SlideRegionRecord};
use crate::consts::columns::REGION_REQUIRED;
use crate::error::{ConfigError, TableResult};
use crate::geom::{Point2d, Size2d};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

/// 区域表在 CSV 中的扁平表示. 字段顺序即列顺序.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct RegionRow {
    relpath: String,
    project: String,
    block: String,
    panel: String,
    level: u32,
    sample: String,
    cohorts: String,
    drug: String,
    origin_x: i64,
    origin_y: i64,
    center_x: i64,
    center_y: i64,
    well_x: i64,
    well_y: i64,
    mpp: f64,
    metadata: Option<String>,
    #[serde(default)]
    source: String,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
    #[serde(default)]
    status: RegionStatus,
}

impl From<&SlideRegionRecord> for RegionRow {
    fn from(r: &SlideRegionRecord) -> Self {
        Self {
            relpath: r.relpath.clone(),
            project: r.key.project.clone(),
            block: r.key.block.clone(),
            panel: r.key.panel.clone(),
            level: r.key.level,
            sample: r.key.sample.clone(),
            cohorts: r.cohorts.clone(),
            drug: r.key.drug.clone(),
            origin_x: r.origin.x,
            origin_y: r.origin.y,
            center_x: r.center.x,
            center_y: r.center.y,
            well_x: r.well.x,
            well_y: r.well.y,
            mpp: r.mpp,
            metadata: r.metadata.clone(),
            source: r.source.clone(),
            width: r.size.width,
            height: r.size.height,
            status: r.status,
        }
    }
}

impl From<RegionRow> for SlideRegionRecord {
    fn from(r: RegionRow) -> Self {
        Self {
            key: IdentityKey {
                project: r.project,
                block: r.block,
                panel: r.panel,
                level: r.level,
                sample: r.sample,
                drug: r.drug,
            },
            relpath: r.relpath,
            source: r.source,
            cohorts: r.cohorts,
            origin: Point2d::new(r.origin_x, r.origin_y),
            center: Point2d::new(r.center_x, r.center_y),
            well: Point2d::new(r.well_x, r.well_y),
            size: Size2d::new(r.width, r.height),
            mpp: r.mpp,
            metadata: r.metadata,
            status: r.status,
        }
    }
}

/// 检查表头是否包含全部 `required` 列.
fn check_header(headers: &csv::StringRecord, required: &[&str]) -> TableResult<()> {
    for &col in required {
        if !headers.iter().any(|h| h == col) {
            return Err(ConfigError::MissingColumn(col.to_owned()).into());
        }
    }
    Ok(())
}

/// 从 `reader` 读取区域表. 缺少必需的列时, 在解析任何一行之前返回
/// `ConfigError::MissingColumn`.
pub fn read_region_table<R: Read>(reader: R) -> TableResult<Vec<SlideRegionRecord>> {
    let mut rdr = csv::Reader::from_reader(reader);
    check_header(rdr.headers()?, &REGION_REQUIRED)?;
    let rows = rdr.deserialize::<RegionRow>().collect::<Result<Vec<_>, _>>()?;
    Ok(rows.into_iter().map(SlideRegionRecord::from).collect())
}

/// 从文件 `path` 读取区域表.
pub fn read_region_table_path<P: AsRef<Path>>(path: P) -> TableResult<Vec<SlideRegionRecord>> {
    read_region_table(File::open(path)?)
}

/// 按身份键排序后将区域表写入 `writer`.
pub fn write_region_table<W: Write>(writer: W, records: &[SlideRegionRecord]) -> TableResult<()> {
    let mut rows: Vec<_> = records.iter().collect();
    rows.sort_by(|a, b| a.key.cmp(&b.key));
    write_rows(writer, rows.into_iter().map(RegionRow::from))
}

/// 将区域表写入文件 `path`. 必要时创建上级目录.
pub fn write_region_table_path<P: AsRef<Path>>(
    path: P,
    records: &[SlideRegionRecord],
) -> TableResult<()> {
    write_region_table(create_file(path.as_ref())?, records)
}

/// 读取任意可反序列化的行.
pub fn read_rows<T: DeserializeOwned, R: Read>(reader: R) -> TableResult<Vec<T>> {
    let rows = csv::Reader::from_reader(reader)
        .deserialize()
        .collect::<Result<Vec<T>, _>>()?;
    Ok(rows)
}

/// 从文件 `path` 读取任意可反序列化的行.
pub fn read_rows_path<T: DeserializeOwned, P: AsRef<Path>>(path: P) -> TableResult<Vec<T>> {
    read_rows(File::open(path)?)
}

/// 按给定顺序写出任意可序列化的行.
pub fn write_rows<T: Serialize, W: Write, I: IntoIterator<Item = T>>(
    writer: W,
    rows: I,
) -> TableResult<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// 按给定顺序将任意可序列化的行写入文件 `path`. 必要时创建上级目录.
pub fn write_rows_path<T: Serialize, P: AsRef<Path>, I: IntoIterator<Item = T>>(
    path: P,
    rows: I,
) -> TableResult<()> {
    write_rows(create_file(path.as_ref())?, rows)
}

fn create_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::create(path)
}
