#![warn(missing_docs)] // <= 合适时移除它.
// #![warn(clippy::missing_docs_in_private_items)]  // <= too strict.

//! 核心库. 在全切片显微图像上定位植入式装置的孔位, 裁剪每个孔位朝向的楔形组织区域,
//! 并为下游的逐细胞定量分析栅格化精确的楔形掩膜.
//!
//! 该 crate 只提供 `safe` 接口, 不接触任何 GUI 事件循环, 也不负责项目目录的发现.
//! 输入是简单的结构化数据 (样本列表, 装置孔位表, 历史标注表), 输出是裁剪图像,
//! 坐标表和布尔掩膜.
//!
//! # 坐标约定
//!
//! 原点位于图像左上角, y 轴向下. 角度以 +x 为 0°, 朝 +y 增长, 在屏幕上表现为顺时针.
//! 详见 [`geom`].
//!
//! # 注意
//!
//! 1. 配置不一致 (装置, 层级, 身份键) 会终止整个流程, 而单个提取任务的 I/O 失败只影响该任务.
//! 2. 库本身只通过 `log` 记录日志, 不安装任何 logger.
//!
//! # 开发计划
//!
//! ### 极坐标换算与楔形外接矩形 ✅
//!
//! 实现位于 `wedge-berry/src/geom`.
//!
//! ### 任务展开, 区域提取, 标注迁移 ✅
//!
//! 1. 装置孔位按 `(装置类型, 层级)` 预先建立索引. ✅
//! 2. 源图像读取带有时限. ✅
//! 3. 重新提取时保留人工调整过的标注点和审核结论. ✅
//!
//! 实现位于 `wedge-berry/src/extract`.
//!
//! ### 楔形掩膜栅格化 ✅
//!
//! 借助 `ndarray::Zip` 对整张图像批量求值, 开启 `rayon` 特性时并行.
//!
//! 实现位于 `wedge-berry/src/wedge`.
//!
//! ### 表格边界 ✅
//!
//! 区域表的 CSV 读写, 初始标注生成, 分析宿主输入表导出.
//!
//! 实现位于 `wedge-berry/src/table`.
//!
//! ### 重新定位后超出裁剪上界的标注点 ⌛️
//!
//! 目前默认只记录警告, 可选择限制到边界内. 最终行为待确认.

pub mod config;
pub mod consts;
pub mod error;
pub mod extract;
pub mod geom;
pub mod table;
pub mod wedge;

pub mod prelude;
