// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
//
// 占用报告上报: HTTP POST JSON, 尽力投递, 不重试

use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::occupancy::OccupancyReport;

/// 报告接收端
pub trait ReportSink {
    fn send(&mut self, report: &OccupancyReport) -> Result<()>;
}

/// 通过 HTTP POST 上报到固定地址
pub struct HttpReporter {
    endpoint: String,
    agent: ureq::Agent,
}

impl HttpReporter {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            endpoint: endpoint.into(),
            agent,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ReportSink for HttpReporter {
    fn send(&mut self, report: &OccupancyReport) -> Result<()> {
        match self.agent.post(&self.endpoint).send_json(report) {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(code, _)) => {
                Err(anyhow!("服务端返回 {}: {}", code, self.endpoint))
            }
            Err(e) => Err(e).with_context(|| format!("上报失败: {}", self.endpoint)),
        }
    }
}
