//! 运行结果.

use std::io::{self, Write};
use wedge_berry::extract::BlockReport;

/// 将 `report` 的结果写进 `w` 中.
fn describe_into<W: Write>(name: &str, report: &BlockReport, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Block `{name}`:")?;
    writeln!(w, "{S4}Regions: {}", report.regions.len())?;
    writeln!(w, "{S4}Degenerate regions: {}", report.degenerate_count())?;
    write!(w, "{S4}Failed jobs: {}", report.failures.len())?;
    for failure in &report.failures {
        write!(w, "\n{S4}{S4}{}: {}", failure.key, failure.error)?;
    }
    Ok(())
}

/// 区块运行的最终结果.
pub struct BlockSummary {
    name: String,
    report: BlockReport,
}

impl BlockSummary {
    pub fn new<S: Into<String>>(name: S, report: BlockReport) -> Self {
        Self {
            name: name.into(),
            report,
        }
    }

    /// 是否所有任务都成功?
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.report.is_complete()
    }

    /// 失败任务数.
    #[inline]
    pub fn failed(&self) -> usize {
        self.report.failures.len()
    }

    /// 打印运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);
        match describe_into(&self.name, &self.report, &mut buf) {
            Ok(()) => println!("{}", String::from_utf8_lossy(&buf)),
            Err(e) => log::error!("无法输出运行结果: {e}"),
        }
        utils::sep();
    }
}

#[cfg(test)]
mod tests {
    use super::describe_into;
    use wedge_berry::extract::BlockReport;

    #[test]
    fn test_describe_empty_report() {
        let mut buf = Vec::new();
        describe_into("B1", &BlockReport::default(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Block `B1`:"));
        assert!(text.ends_with("Failed jobs: 0"));
    }
}
