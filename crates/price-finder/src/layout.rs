/// Table reconstruction from positioned text.
///
/// A page arrives as lines of runs, each run a piece of text at a horizontal position.
/// The first line with at least three runs is the header and its run positions become
/// the column anchors. Every later line with at least two runs becomes a row: each run
/// lands in the column with the nearest anchor, and columns no run reaches stay empty
/// cells, so a blank price never shifts the columns after it. A line that repeats the
/// header text starts a new table. Shorter lines (titles, section labels, footers) are
/// ignored.
use regex::Regex;

use crate::color::Rgb;
use crate::document::{Cell, Row, Table};

const MIN_HEADER_RUNS: usize = 3;
const MIN_ROW_RUNS: usize = 2;

/// Text at a horizontal position, with the color samples of its glyphs.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub x: f64,
    pub text: String,
    pub colors: Vec<Rgb>,
}

impl Run {
    pub fn new(x: f64, text: impl Into<String>) -> Self {
        Self {
            x,
            text: text.into(),
            colors: Vec::new(),
        }
    }
}

pub fn build_tables(lines: &[Vec<Run>]) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Option<TableBuilder> = None;

    for line in lines {
        let starts_table = line.len() >= MIN_HEADER_RUNS
            && current.as_ref().map_or(true, |table| table.is_header(line));
        if starts_table {
            if let Some(done) = current.take() {
                tables.push(done.rows);
            }
            current = Some(TableBuilder::new(line));
            continue;
        }

        let Some(table) = current.as_mut() else {
            continue;
        };
        if line.len() >= MIN_ROW_RUNS {
            table.push(line);
        }
    }

    if let Some(done) = current {
        tables.push(done.rows);
    }
    tables
}

/// Split fixed-width text into lines of runs.
///
/// Runs are separated by two or more spaces or a tab; a run's position is its
/// character column.
pub fn text_lines(text: &str) -> Vec<Vec<Run>> {
    let run_re = Regex::new(r"\S+(?: \S+)*").expect("valid regex");
    text.lines()
        .map(|line| {
            run_re
                .find_iter(line)
                .map(|m| Run::new(line[..m.start()].chars().count() as f64, m.as_str()))
                .collect::<Vec<_>>()
        })
        .filter(|runs| !runs.is_empty())
        .collect()
}

/// Rebuild the tables of a fixed-width text page.
pub fn split_text_tables(text: &str) -> Vec<Table> {
    build_tables(&text_lines(text))
}

struct TableBuilder {
    anchors: Vec<f64>,
    header: Vec<String>,
    rows: Table,
}

impl TableBuilder {
    fn new(header: &[Run]) -> Self {
        let mut builder = Self {
            anchors: header.iter().map(|run| run.x).collect(),
            header: header.iter().map(|run| normalize(&run.text)).collect(),
            rows: Vec::new(),
        };
        builder.push(header);
        builder
    }

    fn is_header(&self, line: &[Run]) -> bool {
        line.len() == self.header.len()
            && line
                .iter()
                .zip(&self.header)
                .all(|(run, text)| normalize(&run.text) == *text)
    }

    fn push(&mut self, line: &[Run]) {
        let mut row: Row = vec![Cell::empty(); self.anchors.len()];
        for run in line {
            let cell = &mut row[self.nearest_column(run.x)];
            match &mut cell.text {
                Some(text) => {
                    text.push(' ');
                    text.push_str(&run.text);
                }
                None => cell.text = Some(run.text.clone()),
            }
            cell.colors.extend_from_slice(&run.colors);
        }
        self.rows.push(row);
    }

    fn nearest_column(&self, x: f64) -> usize {
        self.anchors
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| (*a - x).abs().total_cmp(&(*b - x).abs()))
            .map(|(idx, _)| idx)
            .unwrap_or(0)
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(runs: &[(f64, &str)]) -> Vec<Run> {
        runs.iter().map(|(x, text)| Run::new(*x, *text)).collect()
    }

    fn header() -> Vec<Run> {
        line(&[
            (50.0, "Produto"),
            (160.0, "Venda"),
            (270.0, "Sistema"),
            (380.0, "Tabela"),
            (490.0, "5%"),
        ])
    }

    fn texts(row: &Row) -> Vec<Option<&str>> {
        row.iter().map(|cell| cell.text.as_deref()).collect()
    }

    #[test]
    fn runs_land_in_nearest_column_and_gaps_stay_empty() {
        let lines = vec![
            header(),
            line(&[
                (50.0, "Tubo PVC"),
                (158.0, "R$ 20,00"),
                (272.0, "R$ 19,00"),
                (381.0, "R$ 18,00"),
            ]),
            line(&[
                (50.0, "Cal"),
                (160.0, "R$ 9,00"),
                (380.0, "R$ 8,00"),
                (488.0, "R$ 7,60"),
            ]),
        ];
        let tables = build_tables(&lines);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            texts(&tables[0][1]),
            vec![
                Some("Tubo PVC"),
                Some("R$ 20,00"),
                Some("R$ 19,00"),
                Some("R$ 18,00"),
                None
            ]
        );
        assert_eq!(
            texts(&tables[0][2]),
            vec![Some("Cal"), Some("R$ 9,00"), None, Some("R$ 8,00"), Some("R$ 7,60")]
        );
    }

    #[test]
    fn runs_sharing_a_column_are_joined() {
        let mut green = Run::new(300.0, "R$ 1,00");
        green.colors = vec![Rgb::new(0.0, 1.0, 0.0)];
        let lines = vec![
            header(),
            vec![Run::new(50.0, "Cimento"), Run::new(95.0, "CP II"), green],
        ];
        let row = &build_tables(&lines)[0][1];
        assert_eq!(row[0].text.as_deref(), Some("Cimento CP II"));
        assert_eq!(row[2].colors, vec![Rgb::new(0.0, 1.0, 0.0)]);
    }

    #[test]
    fn lines_before_header_and_short_lines_are_ignored() {
        let lines = vec![
            line(&[(200.0, "TABELA DE PRECOS")]),
            line(&[(50.0, "Emitido em 01/05"), (400.0, "Pagina 1")]),
            header(),
            line(&[(50.0, "Cimentos")]),
            line(&[(50.0, "Cimento CP II"), (160.0, "R$ 35,90")]),
        ];
        let tables = build_tables(&lines);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 2);
        assert_eq!(tables[0][0][0].text.as_deref(), Some("Produto"));
        assert_eq!(tables[0][1][0].text.as_deref(), Some("Cimento CP II"));
    }

    #[test]
    fn repeated_header_starts_a_new_table() {
        let lines = vec![
            header(),
            line(&[(50.0, "Areia"), (160.0, "1")]),
            header(),
            line(&[(50.0, "Brita"), (160.0, "2")]),
        ];
        let tables = build_tables(&lines);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[1][1][0].text.as_deref(), Some("Brita"));
    }

    #[test]
    fn fixed_width_text_keeps_blank_columns() {
        let row = |cells: [&str; 5]| {
            format!(
                "{:<15}{:<10}{:<10}{:<10}{}",
                cells[0], cells[1], cells[2], cells[3], cells[4]
            )
        };
        let text = [
            "TABELA DE PRECOS".to_string(),
            row(["Produto", "Venda", "Sistema", "Tabela", "5%"]),
            row(["Tubo PVC", "R$ 20,00", "R$ 19,00", "R$ 18,00", ""]),
            row(["Cal", "R$ 9,00", "", "R$ 8,00", "R$ 7,60"]),
        ]
        .join("\n");

        let tables = split_text_tables(&text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].len(), 3);
        assert_eq!(
            texts(&tables[0][1]),
            vec![
                Some("Tubo PVC"),
                Some("R$ 20,00"),
                Some("R$ 19,00"),
                Some("R$ 18,00"),
                None
            ]
        );
        assert_eq!(
            texts(&tables[0][2]),
            vec![Some("Cal"), Some("R$ 9,00"), None, Some("R$ 8,00"), Some("R$ 7,60")]
        );
    }

    #[test]
    fn text_runs_split_on_wide_gaps_and_tabs() {
        let lines = text_lines("Areia media\tR$ 120,00  R$ 110,00\n\n   \n");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0][0], Run::new(0.0, "Areia media"));
        assert_eq!(lines[0][1], Run::new(12.0, "R$ 120,00"));
        assert_eq!(lines[0][2], Run::new(23.0, "R$ 110,00"));
    }
}
