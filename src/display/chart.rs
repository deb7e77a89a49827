use super::{DataPoint, DataProcessor, Feeder, NAME_FIELD, parse_line, point_name};
use crate::error::{OtgenError, Result};
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use ratatui::widgets::{Axis, Block, Borders, Chart, Dataset, GraphType};
use serde_json::Value;
use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::Duration;
use tracing::debug;

/// Points kept per series.
pub const MAX_POINTS: usize = 100;

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

const PALETTE: [Color; 8] = [
    Color::Cyan,
    Color::Yellow,
    Color::Green,
    Color::Magenta,
    Color::LightRed,
    Color::LightBlue,
    Color::LightGreen,
    Color::LightMagenta,
];

#[derive(Debug, Clone, Default)]
pub struct Series {
    pub entity: String,
    pub points: VecDeque<f64>,
}

impl Series {
    fn push(&mut self, value: f64) {
        if self.points.len() == MAX_POINTS {
            self.points.pop_front();
        }
        self.points.push_back(value);
    }

    /// Contiguous runs of finite points as `(x, y)` pairs; a NaN ends a run.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut runs: Vec<Vec<(f64, f64)>> = Vec::new();
        let mut current = Vec::new();
        for (i, v) in self.points.iter().enumerate() {
            if v.is_finite() {
                current.push((i as f64, *v));
            } else if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        }
        if !current.is_empty() {
            runs.push(current);
        }
        runs
    }
}

/// One chart per field, one series per entity.
#[derive(Debug, Clone, Default)]
pub struct FieldChart {
    pub field: String,
    pub series: Vec<Series>,
}

#[derive(Debug, Default)]
pub struct ChartModel {
    charts: Vec<FieldChart>,
}

impl ChartModel {
    pub fn charts(&self) -> &[FieldChart] {
        &self.charts
    }

    fn series_mut(&mut self, field: &str, entity: &str) -> Option<&mut Series> {
        self.charts
            .iter_mut()
            .find(|c| c.field == field)?
            .series
            .iter_mut()
            .find(|s| s.entity == entity)
    }
}

/// 数值或数值字符串转为 f64；其他类型记为 NaN（图中断开）。
fn point_value(field: &str, value: &Value) -> Result<f64> {
    match value {
        Value::Number(n) => Ok(n.as_f64().unwrap_or(f64::NAN)),
        Value::String(s) => s.trim().parse().map_err(|_| {
            OtgenError::invalid(format!("field {field} has a non-numeric value: {s:?}"))
        }),
        _ => Ok(f64::NAN),
    }
}

impl DataProcessor for ChartModel {
    fn layout(&mut self, input: &[DataPoint]) -> Result<()> {
        self.charts.clear();
        for point in input {
            let entity = point_name(point)?;
            for field in point.keys().filter(|k| k.as_str() != NAME_FIELD) {
                let idx = match self.charts.iter().position(|c| &c.field == field) {
                    Some(idx) => idx,
                    None => {
                        self.charts.push(FieldChart {
                            field: field.clone(),
                            series: Vec::new(),
                        });
                        self.charts.len() - 1
                    }
                };
                let chart = &mut self.charts[idx];
                if !chart.series.iter().any(|s| s.entity == entity) {
                    chart.series.push(Series {
                        entity: entity.to_string(),
                        points: VecDeque::with_capacity(MAX_POINTS),
                    });
                }
            }
        }
        self.charts.sort_by(|a, b| a.field.cmp(&b.field));
        Ok(())
    }

    fn process(&mut self, input: &[DataPoint]) -> Result<()> {
        for point in input {
            let entity = point_name(point)?;
            for (field, value) in point.iter().filter(|(k, _)| k.as_str() != NAME_FIELD) {
                let value = point_value(field, value)?;
                // Layout is fixed after the first line.
                if let Some(series) = self.series_mut(field, entity) {
                    series.push(value);
                }
            }
        }
        Ok(())
    }
}

fn y_bounds(chart: &FieldChart) -> [f64; 2] {
    let (lo, hi) = chart
        .series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return [0.0, 1.0];
    }
    if lo == hi {
        return [lo - 1.0, hi + 1.0];
    }
    [lo, hi]
}

fn draw_charts(frame: &mut Frame, model: &ChartModel) {
    let charts = model.charts();
    if charts.is_empty() {
        return;
    }
    let areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, charts.len() as u32); charts.len()])
        .split(frame.area());

    for (chart, area) in charts.iter().zip(areas.iter()) {
        // one dataset per run, a NaN leaves a gap
        let runs: Vec<(usize, Vec<(f64, f64)>)> = chart
            .series
            .iter()
            .enumerate()
            .flat_map(|(i, s)| s.segments().into_iter().map(move |run| (i, run)))
            .collect();
        let mut named = vec![false; chart.series.len()];
        let datasets: Vec<Dataset> = runs
            .iter()
            .map(|(i, points)| {
                let graph = if points.len() == 1 {
                    GraphType::Scatter
                } else {
                    GraphType::Line
                };
                let mut dataset = Dataset::default()
                    .marker(symbols::Marker::Braille)
                    .graph_type(graph)
                    .style(Style::new().fg(PALETTE[i % PALETTE.len()]))
                    .data(points);
                if !named[*i] {
                    named[*i] = true;
                    dataset = dataset.name(chart.series[*i].entity.clone());
                }
                dataset
            })
            .collect();

        let [lo, hi] = y_bounds(chart);
        let widget = Chart::new(datasets)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(chart.field.clone()),
            )
            .x_axis(Axis::default().bounds([0.0, (MAX_POINTS - 1) as f64]))
            .y_axis(
                Axis::default()
                    .bounds([lo, hi])
                    .labels([format!("{lo:.0}"), format!("{hi:.0}")]),
            );
        frame.render_widget(widget, *area);
    }
}

/// 后台线程读取 stdin，把解析好的行通过 channel 交给界面循环。
fn spawn_reader() -> Receiver<Result<Vec<DataPoint>>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            match line.map_err(OtgenError::from).and_then(|l| parse_line(&l)) {
                Ok(None) => {}
                Ok(Some(points)) => {
                    if tx.send(Ok(points)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
        debug!("input exhausted");
    });
    rx
}

fn is_quit(code: KeyCode, modifiers: KeyModifiers) -> bool {
    match code {
        KeyCode::Esc | KeyCode::Char('q') => true,
        KeyCode::Char('c') => modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn chart_loop<B: Backend>(
    terminal: &mut Terminal<B>,
    input: &Receiver<Result<Vec<DataPoint>>>,
) -> Result<()> {
    let mut model = ChartModel::default();
    let mut feeder = Feeder::default();
    loop {
        loop {
            match input.try_recv() {
                Ok(batch) => feeder.apply(&batch?, &mut model)?,
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        terminal.draw(|frame| draw_charts(frame, &model))?;

        if event::poll(REDRAW_INTERVAL)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && is_quit(key.code, key.modifiers) {
                    return Ok(());
                }
            }
        }
    }
}

/// 全屏折线图，直到按下 Esc、Ctrl-C 或 q。
pub fn run_chart() -> Result<()> {
    let input = spawn_reader();

    io::stdout().execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;

    let result = chart_loop(&mut terminal, &input);

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;
    result
}
