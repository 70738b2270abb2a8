//! 区块级别的提取流程: 展开任务, 逐张源切片提取, 与历史区域表合并.

use super::{extract, merge_with, sequence, ExtractionJob, SlideSource, TiffSlide};
use crate::config::{unpack_block, PipelineConfig, ProjectConfig};
use crate::consts::EMPTY_METADATA;
use crate::error::{ConfigError, ConfigResult, ExtractError, ExtractResult};
use crate::table::{IdentityKey, RegionStatus, SampleAngle, SlideCoord, SlideRegionRecord};
use itertools::Itertools;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
    }
}

/// 单个任务的失败. 同一张源切片无法打开时, 其上的每个任务共享同一个错误.
#[derive(Clone, Debug)]
pub struct JobFailure {
    /// 失败任务的身份键.
    pub key: IdentityKey,
    /// 失败原因.
    pub error: Arc<ExtractError>,
}

/// 一个区块的提取结果.
#[derive(Clone, Debug, Default)]
pub struct BlockReport {
    /// 区域表, 按身份键排序.
    pub regions: Vec<SlideRegionRecord>,
    /// 失败的任务, 按身份键排序.
    pub failures: Vec<JobFailure>,
}

impl BlockReport {
    /// 是否所有任务都成功?
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// 退化区域个数.
    pub fn degenerate_count(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| r.status.is_degenerate())
            .count()
    }
}

type JobOutcome = Result<SlideRegionRecord, JobFailure>;

/// 将失败任务在历史区域表中的行原样放回结果, 保持按身份键排序.
///
/// `previous` 的键在合并时已经检查过唯一性.
fn carry_failed(report: &mut BlockReport, previous: &[SlideRegionRecord]) {
    let failed: HashSet<&IdentityKey> = report.failures.iter().map(|f| &f.key).collect();
    let carried: Vec<SlideRegionRecord> = previous
        .iter()
        .filter(|r| failed.contains(&r.key))
        .cloned()
        .collect();
    if carried.is_empty() {
        return;
    }
    log::warn!("{} 个失败任务沿用历史区域行", carried.len());
    report.regions.extend(carried);
    report.regions.sort_by(|a, b| a.key.cmp(&b.key));
}

/// 提取流程. 所有路径都相对于配置中的 `base_path`.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// 以 `config` 构建流程.
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// 流程配置.
    #[inline]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// 任务输出的相对路径 `{项目}/{区块}/{步骤目录}/{文件名}.png`.
    pub fn crop_relpath(&self, key: &IdentityKey) -> String {
        format!(
            "{}/{}/{}/{}.png",
            key.project,
            key.block,
            self.config.output_step,
            key.file_stem()
        )
    }

    /// 相对路径对应的绝对路径.
    #[inline]
    pub fn abs_path(&self, relpath: &str) -> PathBuf {
        self.config.base_path.join(relpath)
    }

    /// 对区块 `block` 执行完整流程.
    ///
    /// 配置不一致 (区块不存在, 样本声明错误, 孔位查找失败, 任务或历史区域表有重复键)
    /// 时整个流程终止. 单个任务的失败记录在 [`BlockReport::failures`] 中, 不影响其他任务;
    /// 失败任务在 `previous` 中的历史行原样保留在结果里.
    pub fn run_block(
        &self,
        project: &ProjectConfig,
        block: &str,
        coords: &[SlideCoord],
        angles: &[SampleAngle],
        previous: Option<&[SlideRegionRecord]>,
    ) -> ConfigResult<BlockReport> {
        let block_def = project.block(block)?;
        let samples = unpack_block(block_def, &self.config.sample_prefix)?;
        let coords: Vec<SlideCoord> = coords.iter().filter(|c| c.block == block).cloned().collect();
        let jobs = sequence(&samples, &project.devices, &coords, angles)?;

        let timeout = self.config.read_timeout();
        let mut report = self.run_jobs_with(&jobs, |path| TiffSlide::open(path, timeout))?;
        if let Some(previous) = previous {
            report.regions = merge_with(report.regions, previous, self.config.upper_bound)?;
            carry_failed(&mut report, previous);
        }
        log::info!(
            "区块 `{block}`: {} 个区域 ({} 个退化), {} 个任务失败",
            report.regions.len(),
            report.degenerate_count(),
            report.failures.len()
        );
        Ok(report)
    }

    /// 执行提取任务. 任务按源切片分组, 每张源切片只用 `open` 打开一次.
    ///
    /// 开启 `rayon` 特性时各组并行执行. 结果按身份键排序, 与执行顺序无关.
    ///
    /// 两个任务的身份键相同时返回 `ConfigError::DuplicateIdentity`, 不执行任何任务.
    pub fn run_jobs_with<S, F>(&self, jobs: &[ExtractionJob], open: F) -> ConfigResult<BlockReport>
    where
        S: SlideSource,
        F: Fn(&Path) -> ExtractResult<S> + Sync,
    {
        let mut seen = HashSet::new();
        if let Some(dup) = jobs.iter().find(|j| !seen.insert(&j.key)) {
            return Err(ConfigError::DuplicateIdentity(dup.key.clone()));
        }

        let groups: Vec<(&str, Vec<&ExtractionJob>)> = jobs
            .iter()
            .into_group_map_by(|j| j.source.as_str())
            .into_iter()
            .sorted_by(|a, b| a.0.cmp(b.0))
            .collect();

        let run = |(source, jobs): &(&str, Vec<&ExtractionJob>)| -> Vec<JobOutcome> {
            self.run_group(source, jobs, &open)
        };

        #[cfg(feature = "rayon")]
        let outcomes: Vec<JobOutcome> = groups.par_iter().flat_map_iter(run).collect();
        #[cfg(not(feature = "rayon"))]
        let outcomes: Vec<JobOutcome> = groups.iter().flat_map(run).collect();

        let (mut regions, mut failures): (Vec<_>, Vec<_>) = outcomes.into_iter().partition_result();
        regions.sort_by(|a: &SlideRegionRecord, b| a.key.cmp(&b.key));
        failures.sort_by(|a: &JobFailure, b| a.key.cmp(&b.key));
        Ok(BlockReport { regions, failures })
    }

    fn run_group<S, F>(&self, source: &str, jobs: &[&ExtractionJob], open: &F) -> Vec<JobOutcome>
    where
        S: SlideSource,
        F: Fn(&Path) -> ExtractResult<S>,
    {
        let slide = match open(&self.abs_path(source)) {
            Ok(slide) => slide,
            Err(e) => {
                log::warn!("无法打开源切片 `{source}`: {e}");
                let error = Arc::new(e);
                return jobs
                    .iter()
                    .map(|job| {
                        Err(JobFailure {
                            key: job.key.clone(),
                            error: Arc::clone(&error),
                        })
                    })
                    .collect();
            }
        };

        jobs.iter()
            .map(|job| {
                self.run_job(&slide, job).map_err(|e| {
                    log::warn!("任务 {} 失败: {e}", job.key);
                    JobFailure {
                        key: job.key.clone(),
                        error: Arc::new(e),
                    }
                })
            })
            .collect()
    }

    fn run_job<S: SlideSource>(&self, slide: &S, job: &ExtractionJob) -> ExtractResult<SlideRegionRecord> {
        let relpath = self.crop_relpath(&job.key);
        let region = extract(slide, &self.abs_path(&relpath), job, &self.config.wedge)?;
        let status = if region.is_degenerate() {
            RegionStatus::Degenerate
        } else {
            RegionStatus::Extracted
        };
        Ok(SlideRegionRecord {
            key: job.key.clone(),
            relpath,
            source: job.source.clone(),
            cohorts: job.cohorts.clone(),
            origin: region.origin,
            center: region.center,
            well: region.well,
            size: region.size,
            mpp: region.mpp,
            metadata: Some(EMPTY_METADATA.to_owned()),
            status,
        })
    }
}
