//! `otgen run`：把配置下发到 OTG 端点并跑完一次测试
//!
//! 状态机由 [`Orchestrator`] 驱动，结束判定是 [`targets`] 中的纯函数。

mod orchestrator;
mod settings;
mod targets;

pub use orchestrator::{Orchestrator, RunOutcome};
pub use settings::{MetricSelection, ProtocolsMode, RunSettings, RxBgp, parse_duration};
pub use targets::{BgpTargets, PeerTarget, TrafficProgress, TrafficTargets, traffic_progress};

use crate::api::HttpApi;
use crate::error::Result;
use crate::otg::{parse_config, parse_value, read_source};
use std::io::Write;

/// Reads the document named by `settings`, connects over HTTP and runs it.
pub fn run_document(settings: &RunSettings, out: &mut dyn Write) -> Result<RunOutcome> {
    let raw = read_source(settings.file.as_deref())?;
    let document = parse_value(&raw, settings.format)?;
    let config = parse_config(&raw, settings.format)?;

    let mut api = HttpApi::new(&settings.api, !settings.insecure)?;
    Orchestrator::new(&mut api, settings, out).run(&document, &config)
}
