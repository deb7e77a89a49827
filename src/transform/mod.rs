//! `otgen transform`：把逐行的 MetricsResponse JSON 转成便于下游处理的格式
//!
//! 每行输入都先按 [`MetricsResponse`] 校验，再经模板渲染。未指定指标类型时原样
//! 输出（紧凑 JSON）。

mod templates;

pub use templates::{convert_byte_rate_to_bps, frame_rate_to_byte_rate, rate_metric_name};

use crate::error::{OtgenError, Result};
use crate::otg::MetricsResponse;
use minijinja::{Environment, context};
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformMetric {
    Port,
    Flow,
}

impl FromStr for TransformMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "port" => Ok(TransformMetric::Port),
            "flow" => Ok(TransformMetric::Flow),
            _ => Err(format!("Unsupported metrics type requested: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Counter {
    #[default]
    Frames,
    Bytes,
    Pps,
    Tput,
    Kbps,
    Mbps,
    Gbps,
    Tbps,
}

impl Counter {
    pub fn as_str(self) -> &'static str {
        match self {
            Counter::Frames => "frames",
            Counter::Bytes => "bytes",
            Counter::Pps => "pps",
            Counter::Tput => "tput",
            Counter::Kbps => "Kbps",
            Counter::Mbps => "Mbps",
            Counter::Gbps => "Gbps",
            Counter::Tbps => "Tbps",
        }
    }
}

impl FromStr for Counter {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "frames" => Ok(Counter::Frames),
            "bytes" => Ok(Counter::Bytes),
            "pps" => Ok(Counter::Pps),
            "tput" => Ok(Counter::Tput),
            "Kbps" => Ok(Counter::Kbps),
            "Mbps" => Ok(Counter::Mbps),
            "Gbps" => Ok(Counter::Gbps),
            "Tbps" => Ok(Counter::Tbps),
            _ => Err(format!("Unsupported metrics counter requested: {s}")),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub metrics: Option<TransformMetric>,
    pub counters: Option<Counter>,
    /// User template; exclusive with `metrics`/`counters`.
    pub template_file: Option<PathBuf>,
}

/// Where the rendering template comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    PassThrough,
    Builtin(&'static str),
    File(String),
}

impl TemplateSource {
    pub fn select(opts: &TransformOptions) -> Result<Self> {
        if let Some(path) = &opts.template_file {
            if opts.metrics.is_some() || opts.counters.is_some() {
                return Err(OtgenError::invalid(
                    "--file cannot be combined with --metrics or --counters",
                ));
            }
            debug!(path = %path.display(), "reading template file");
            return Ok(TemplateSource::File(fs::read_to_string(path)?));
        }

        let counter = opts.counters.unwrap_or_default();
        let template = match opts.metrics {
            None => return Ok(TemplateSource::PassThrough),
            Some(TransformMetric::Port) => match counter {
                Counter::Frames => templates::PORT_FRAMES,
                Counter::Bytes => templates::PORT_BYTES,
                Counter::Pps => templates::PORT_FRAME_RATE,
                Counter::Tput => templates::PORT_BYTE_RATE,
                Counter::Kbps | Counter::Mbps | Counter::Gbps | Counter::Tbps => {
                    templates::PORT_BIT_RATE
                }
            },
            Some(TransformMetric::Flow) => match counter {
                Counter::Frames => templates::FLOW_FRAMES,
                Counter::Bytes => templates::FLOW_BYTES,
                Counter::Pps => templates::FLOW_FRAME_RATE,
                Counter::Tput => {
                    warn!(
                        "Flow throughput is a calculated metric which uses average frame size over a duration of the flow transmission."
                    );
                    templates::FLOW_BYTE_RATE
                }
                c @ (Counter::Kbps | Counter::Mbps | Counter::Gbps | Counter::Tbps) => {
                    return Err(OtgenError::invalid(format!(
                        "Unsupported metrics counters requested for flow metrics: {}",
                        c.as_str()
                    )));
                }
            },
        };
        Ok(TemplateSource::Builtin(template))
    }

    fn text(&self) -> Option<&str> {
        match self {
            TemplateSource::PassThrough => None,
            TemplateSource::Builtin(t) => Some(t),
            TemplateSource::File(t) => Some(t),
        }
    }
}

/// Renders one metrics response per input line.
pub struct Transformer<'s> {
    env: Option<Environment<'s>>,
}

impl<'s> Transformer<'s> {
    pub fn new(source: &'s TemplateSource, counter: Counter) -> Result<Self> {
        let env = source
            .text()
            .map(|text| templates::environment(text, counter))
            .transpose()?;
        Ok(Transformer { env })
    }

    pub fn render(&self, metrics: &MetricsResponse) -> Result<String> {
        let Some(env) = &self.env else {
            let mut line = serde_json::to_string(metrics)?;
            line.push('\n');
            return Ok(line);
        };
        let template = env.get_template(templates::TEMPLATE_NAME)?;
        let rendered = template.render(context! {
            choice => metrics.choice,
            port_metrics => metrics.port_metrics,
            flow_metrics => metrics.flow_metrics,
            bgpv4_metrics => metrics.bgpv4_metrics,
            response => metrics,
        })?;
        Ok(rendered)
    }

    /// 逐行读取输入并写出渲染结果；空行跳过，无法解析的行视为错误。
    pub fn transform<R: BufRead>(&self, input: R, out: &mut dyn Write) -> Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let metrics: MetricsResponse = serde_json::from_str(&line)?;
            out.write_all(self.render(&metrics)?.as_bytes())?;
            out.flush()?;
        }
        Ok(())
    }
}
