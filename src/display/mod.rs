//! `otgen display`：在终端中以表格或折线图显示逐行 JSON 数据
//!
//! 每行输入是对象数组，每个对象有一个 `name` 字段标识实体；其余字段为数值。
//! 第一行决定布局（列或序列），之后不再改变。

mod chart;
mod table;

pub use chart::{ChartModel, FieldChart, MAX_POINTS, Series, run_chart};
pub use table::{TableModel, run_table};

use crate::error::{OtgenError, Result};
use serde_json::Value;
use std::io::BufRead;
use std::str::FromStr;

pub const NAME_FIELD: &str = "name";

pub type DataPoint = serde_json::Map<String, Value>;

/// A view fed by parsed input lines.
pub trait DataProcessor {
    /// Called once with the first line.
    fn layout(&mut self, input: &[DataPoint]) -> Result<()>;
    fn process(&mut self, input: &[DataPoint]) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    Table,
    #[default]
    Chart,
}

impl FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "table" => Ok(DisplayMode::Table),
            "chart" => Ok(DisplayMode::Chart),
            _ => Err(format!("Unsupported display mode: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartType {
    #[default]
    Line,
}

impl FromStr for ChartType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "line" => Ok(ChartType::Line),
            _ => Err(format!("Unsupported chart type: {s}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DisplayOptions {
    pub mode: DisplayMode,
    /// Only meaningful in chart mode.
    pub chart_type: Option<ChartType>,
}

impl DisplayOptions {
    pub fn validate(&self) -> Result<()> {
        if self.chart_type.is_some() && self.mode != DisplayMode::Chart {
            return Err(OtgenError::invalid("--type is only supported with --mode chart"));
        }
        Ok(())
    }
}

pub fn run(opts: &DisplayOptions) -> Result<()> {
    opts.validate()?;
    match opts.mode {
        DisplayMode::Table => run_table(std::io::stdin().lock()),
        DisplayMode::Chart => run_chart(),
    }
}

/// Parses one input line; blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Vec<DataPoint>>> {
    if line.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

pub fn point_name(point: &DataPoint) -> Result<&str> {
    point
        .get(NAME_FIELD)
        .and_then(Value::as_str)
        .ok_or_else(|| OtgenError::invalid(format!("data point without a string \"{NAME_FIELD}\" field")))
}

/// Runs layout on the first batch, process on every batch.
#[derive(Debug, Default)]
pub struct Feeder {
    laid_out: bool,
}

impl Feeder {
    pub fn apply(&mut self, points: &[DataPoint], dp: &mut dyn DataProcessor) -> Result<()> {
        if !self.laid_out {
            dp.layout(points)?;
            self.laid_out = true;
        }
        dp.process(points)
    }

    /// Returns false for blank lines.
    pub fn feed(&mut self, line: &str, dp: &mut dyn DataProcessor) -> Result<bool> {
        match parse_line(line)? {
            Some(points) => {
                self.apply(&points, dp)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

pub fn feed_lines<R: BufRead>(input: R, dp: &mut dyn DataProcessor) -> Result<()> {
    let mut feeder = Feeder::default();
    for line in input.lines() {
        feeder.feed(&line?, dp)?;
    }
    Ok(())
}
