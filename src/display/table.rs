use super::{DataPoint, DataProcessor, Feeder, NAME_FIELD, point_name};
use crate::error::Result;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Row, Table};
use ratatui::{TerminalOptions, Viewport};
use serde_json::Value;
use std::io::{self, BufRead};

/// 表格视图：`name` 列在前，其余字段按名称排序；每个实体一行。
#[derive(Debug, Default)]
pub struct TableModel {
    headers: Vec<String>,
    rows: Vec<(String, Vec<String>)>,
}

impl TableModel {
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in first-seen order, cells aligned with [`headers`](Self::headers).
    pub fn rows(&self) -> impl Iterator<Item = &[String]> {
        self.rows.iter().map(|(_, cells)| cells.as_slice())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lines needed to show every row: borders, header, one per entity.
    pub fn viewport_height(&self) -> u16 {
        u16::try_from(self.rows.len() + 3).unwrap_or(u16::MAX)
    }
}

fn cell_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(v) => v.to_string(),
    }
}

impl DataProcessor for TableModel {
    fn layout(&mut self, input: &[DataPoint]) -> Result<()> {
        let mut fields: Vec<String> = input
            .iter()
            .flat_map(|p| p.keys())
            .filter(|k| k.as_str() != NAME_FIELD)
            .cloned()
            .collect();
        fields.sort();
        fields.dedup();
        self.headers = std::iter::once(NAME_FIELD.to_string())
            .chain(fields)
            .collect();
        Ok(())
    }

    fn process(&mut self, input: &[DataPoint]) -> Result<()> {
        for point in input {
            let name = point_name(point)?;
            let cells: Vec<String> = self
                .headers
                .iter()
                .map(|h| cell_text(point.get(h)))
                .collect();
            match self.rows.iter_mut().find(|(n, _)| n == name) {
                Some((_, row)) => *row = cells,
                None => self.rows.push((name.to_string(), cells)),
            }
        }
        Ok(())
    }
}

fn draw_table(frame: &mut Frame, model: &TableModel) {
    let widths = vec![Constraint::Fill(1); model.headers().len().max(1)];
    let header = Row::new(model.headers().to_vec()).style(Style::new().bold());
    let rows: Vec<Row> = model.rows().map(|cells| Row::new(cells.to_vec())).collect();
    let table = Table::new(rows, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(table, frame.area());
}

fn inline_terminal(height: u16) -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    Ok(Terminal::with_options(
        CrosstermBackend::new(io::stdout()),
        TerminalOptions {
            viewport: Viewport::Inline(height),
        },
    )?)
}

/// 读取输入直到结束，每行之后原地重绘表格；出现新实体时视口随之变高。
pub fn run_table<R: BufRead>(input: R) -> Result<()> {
    let mut model = TableModel::default();
    let mut feeder = Feeder::default();
    let mut terminal: Option<Terminal<CrosstermBackend<io::Stdout>>> = None;
    let mut height = 0;

    for line in input.lines() {
        if !feeder.feed(&line?, &mut model)? {
            continue;
        }
        if model.viewport_height() > height {
            height = model.viewport_height();
            // Inline viewports have a fixed height: wipe the old one and redraw from its top.
            if let Some(old) = terminal.as_mut() {
                old.clear()?;
            }
            terminal = Some(inline_terminal(height)?);
        }
        if let Some(terminal) = terminal.as_mut() {
            terminal.draw(|frame| draw_table(frame, &model))?;
        }
    }
    println!();
    Ok(())
}
