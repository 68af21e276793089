/// PDF page reading on top of lopdf's content stream decoder.
///
/// Text-showing operators are interpreted with enough text and graphics state to place
/// each string on the page: `BT`, `Tf`, `TL`, `Td`, `TD`, `Tm`, `T*`, `Tj`, `TJ`, `'`,
/// `"`, `cm`, `q` and `Q`. The non-stroking color (`g`, `rg`, `k`, `sc`, `scn`) in
/// effect when a string is drawn is sampled once per glyph, and a rectangle filled
/// behind the string (`re` followed by a fill) adds its color for every glyph as well.
///
/// Glyph widths are not read from font metrics; a string advances the text position by
/// an average glyph width. Strings are decoded as UTF-16BE when they start with a byte
/// order mark and as Latin-1 otherwise.
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId};
use tracing::{debug, warn};

use crate::color::Rgb;
use crate::document::{Page, TableDocument};
use crate::error::AppError;
use crate::layout::{self, Run};

/// Average glyph advance as a fraction of the font size.
const AVG_GLYPH_WIDTH: f64 = 0.5;
/// Baselines closer than this fraction of the font size share a line.
const LINE_TOLERANCE: f64 = 0.4;
/// Strings closer than this fraction of the font size belong to one run.
const WORD_GAP: f64 = 0.8;
/// `TJ` adjustments beyond this many thousandths of an em read as a space.
const TJ_SPACE_THRESHOLD: f64 = 250.0;

type Matrix = [f64; 6];

const IDENTITY: Matrix = [1.0, 0.0, 0.0, 1.0, 0.0, 0.0];
const BLACK: Rgb = Rgb::new(0.0, 0.0, 0.0);

/// Read a PDF and rebuild its tables from the positioned text of each page.
///
/// A page whose content stream cannot be decoded is logged and skipped; the remaining
/// pages are still processed.
pub fn load_pdf(bytes: &[u8]) -> Result<TableDocument, AppError> {
    let doc = Document::load_mem(bytes)
        .map_err(|e| AppError::Document(format!("failed to read PDF: {e}")))?;

    let mut pages = Vec::new();
    for (page_num, page_id) in doc.get_pages() {
        match page_lines(&doc, page_id) {
            Ok(lines) => {
                let tables = layout::build_tables(&lines);
                debug!(
                    page = page_num,
                    lines = lines.len(),
                    tables = tables.len(),
                    "page layout rebuilt"
                );
                pages.push(Page { tables });
            }
            Err(e) => {
                warn!(page = page_num, error = %e, "failed to read page content, skipping page");
            }
        }
    }

    Ok(TableDocument { pages })
}

fn page_lines(doc: &Document, page_id: ObjectId) -> lopdf::Result<Vec<Vec<Run>>> {
    let raw = doc.get_page_content(page_id)?;
    let content = Content::decode(&raw)?;
    Ok(lines_from_operations(&content.operations))
}

fn lines_from_operations(operations: &[Operation]) -> Vec<Vec<Run>> {
    let mut interpreter = Interpreter::new();
    for op in operations {
        interpreter.apply(op);
    }
    group_lines(interpreter.fragments)
}

/// A string drawn at a page position, in device space.
#[derive(Debug, Clone)]
struct Fragment {
    x: f64,
    y: f64,
    end_x: f64,
    size: f64,
    text: String,
    colors: Vec<Rgb>,
}

#[derive(Debug, Clone, Copy)]
struct FilledRect {
    x0: f64,
    y0: f64,
    x1: f64,
    y1: f64,
    color: Rgb,
}

impl FilledRect {
    fn contains(&self, x: f64, y: f64) -> bool {
        (self.x0..=self.x1).contains(&x) && (self.y0..=self.y1).contains(&y)
    }
}

#[derive(Debug, Clone, Copy)]
struct GraphicsState {
    ctm: Matrix,
    fill: Rgb,
}

struct Interpreter {
    state: GraphicsState,
    saved: Vec<GraphicsState>,
    text_matrix: Matrix,
    line_matrix: Matrix,
    font_size: f64,
    leading: f64,
    path: Vec<[f64; 4]>,
    fills: Vec<FilledRect>,
    fragments: Vec<Fragment>,
}

impl Interpreter {
    fn new() -> Self {
        Self {
            state: GraphicsState {
                ctm: IDENTITY,
                fill: BLACK,
            },
            saved: Vec::new(),
            text_matrix: IDENTITY,
            line_matrix: IDENTITY,
            font_size: 1.0,
            leading: 0.0,
            path: Vec::new(),
            fills: Vec::new(),
            fragments: Vec::new(),
        }
    }

    fn apply(&mut self, op: &Operation) {
        let nums = numbers(&op.operands);
        match op.operator.as_str() {
            "q" => self.saved.push(self.state),
            "Q" => {
                if let Some(state) = self.saved.pop() {
                    self.state = state;
                }
            }
            "cm" => {
                if let Some(m) = matrix(&nums) {
                    self.state.ctm = multiply(&m, &self.state.ctm);
                }
            }
            "g" | "rg" | "k" | "sc" | "scn" => {
                if let Ok(Some(color)) = Rgb::from_components(&nums) {
                    self.state.fill = color;
                }
            }
            "re" => {
                if let &[x, y, w, h] = nums.as_slice() {
                    self.add_rect(x, y, w, h);
                }
            }
            "f" | "F" | "f*" | "B" | "B*" | "b" | "b*" => {
                let color = self.state.fill;
                self.fills
                    .extend(self.path.drain(..).map(|[x0, y0, x1, y1]| FilledRect {
                        x0,
                        y0,
                        x1,
                        y1,
                        color,
                    }));
            }
            "n" | "S" | "s" => self.path.clear(),
            "BT" => {
                self.text_matrix = IDENTITY;
                self.line_matrix = IDENTITY;
            }
            "Tf" => {
                if let Some(size) = nums.last() {
                    self.font_size = *size;
                }
            }
            "TL" => {
                if let &[leading] = nums.as_slice() {
                    self.leading = leading;
                }
            }
            "Td" => {
                if let &[tx, ty] = nums.as_slice() {
                    self.move_line(tx, ty);
                }
            }
            "TD" => {
                if let &[tx, ty] = nums.as_slice() {
                    self.leading = -ty;
                    self.move_line(tx, ty);
                }
            }
            "Tm" => {
                if let Some(m) = matrix(&nums) {
                    self.text_matrix = m;
                    self.line_matrix = m;
                }
            }
            "T*" => self.next_line(),
            "Tj" => {
                if let Some(text) = op.operands.first().and_then(decode_string) {
                    self.show(&text);
                }
            }
            "'" => {
                self.next_line();
                if let Some(text) = op.operands.first().and_then(decode_string) {
                    self.show(&text);
                }
            }
            "\"" => {
                self.next_line();
                if let Some(text) = op.operands.get(2).and_then(decode_string) {
                    self.show(&text);
                }
            }
            "TJ" => {
                if let Some(Object::Array(items)) = op.operands.first() {
                    self.show(&join_spaced(items));
                }
            }
            _ => {}
        }
    }

    fn add_rect(&mut self, x: f64, y: f64, w: f64, h: f64) {
        let (ax, ay) = transform(&self.state.ctm, x, y);
        let (bx, by) = transform(&self.state.ctm, x + w, y + h);
        self.path
            .push([ax.min(bx), ay.min(by), ax.max(bx), ay.max(by)]);
    }

    fn move_line(&mut self, tx: f64, ty: f64) {
        self.line_matrix = multiply(&translation(tx, ty), &self.line_matrix);
        self.text_matrix = self.line_matrix;
    }

    fn next_line(&mut self) {
        self.move_line(0.0, -self.leading);
    }

    fn show(&mut self, text: &str) {
        let glyphs = text.chars().count() as f64;
        let start = multiply(&self.text_matrix, &self.state.ctm);
        let advance = glyphs * self.font_size * AVG_GLYPH_WIDTH;
        self.text_matrix = multiply(&translation(advance, 0.0), &self.text_matrix);
        let end = multiply(&self.text_matrix, &self.state.ctm);

        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }

        let scale = start[2].hypot(start[3]);
        let size = self.font_size * if scale > 0.0 { scale } else { 1.0 };
        let (x, y) = (start[4], start[5]);
        let background = self
            .fills
            .iter()
            .rev()
            .find(|rect| rect.contains(x + 0.5, y + size * 0.3))
            .map(|rect| rect.color);

        let mut colors = Vec::new();
        for _ in trimmed.chars().filter(|c| !c.is_whitespace()) {
            colors.push(self.state.fill);
            colors.extend(background);
        }

        self.fragments.push(Fragment {
            x,
            y,
            end_x: end[4],
            size,
            text: trimmed.to_string(),
            colors,
        });
    }
}

/// Cluster fragments into lines by baseline, top of the page first, and merge
/// neighbouring fragments of a line into runs.
fn group_lines(mut fragments: Vec<Fragment>) -> Vec<Vec<Run>> {
    fragments.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

    let mut lines: Vec<Vec<Fragment>> = Vec::new();
    for fragment in fragments {
        match lines.last_mut() {
            Some(line)
                if (line[0].y - fragment.y).abs()
                    <= LINE_TOLERANCE * line[0].size.max(fragment.size) =>
            {
                line.push(fragment)
            }
            _ => lines.push(vec![fragment]),
        }
    }

    lines
        .into_iter()
        .map(|mut line| {
            line.sort_by(|a, b| a.x.total_cmp(&b.x));
            merge_runs(line)
        })
        .collect()
}

fn merge_runs(line: Vec<Fragment>) -> Vec<Run> {
    let mut runs: Vec<Run> = Vec::new();
    let mut last_end = f64::NEG_INFINITY;
    for fragment in line {
        match runs.last_mut() {
            Some(run) if fragment.x - last_end <= WORD_GAP * fragment.size => {
                run.text.push(' ');
                run.text.push_str(&fragment.text);
                run.colors.extend(fragment.colors);
            }
            _ => runs.push(Run {
                x: fragment.x,
                text: fragment.text,
                colors: fragment.colors,
            }),
        }
        last_end = fragment.end_x;
    }
    runs
}

fn join_spaced(items: &[Object]) -> String {
    let mut text = String::new();
    for item in items {
        if let Some(piece) = decode_string(item) {
            text.push_str(&piece);
        } else if number(item).is_some_and(|adjust| -adjust > TJ_SPACE_THRESHOLD) {
            text.push(' ');
        }
    }
    text
}

fn decode_string(obj: &Object) -> Option<String> {
    let Object::String(bytes, _) = obj else {
        return None;
    };
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        Some(String::from_utf16_lossy(&units))
    } else {
        Some(bytes.iter().map(|&b| char::from(b)).collect())
    }
}

fn number(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some(f64::from(*f)),
        _ => None,
    }
}

fn numbers(operands: &[Object]) -> Vec<f64> {
    operands.iter().filter_map(number).collect()
}

fn matrix(nums: &[f64]) -> Option<Matrix> {
    match *nums {
        [a, b, c, d, e, f] => Some([a, b, c, d, e, f]),
        _ => None,
    }
}

fn translation(tx: f64, ty: f64) -> Matrix {
    [1.0, 0.0, 0.0, 1.0, tx, ty]
}

fn multiply(m: &Matrix, n: &Matrix) -> Matrix {
    [
        m[0] * n[0] + m[1] * n[2],
        m[0] * n[1] + m[1] * n[3],
        m[2] * n[0] + m[3] * n[2],
        m[2] * n[1] + m[3] * n[3],
        m[4] * n[0] + m[5] * n[2] + n[4],
        m[4] * n[1] + m[5] * n[3] + n[5],
    ]
}

fn transform(m: &Matrix, x: f64, y: f64) -> (f64, f64) {
    (
        x * m[0] + y * m[2] + m[4],
        x * m[1] + y * m[3] + m[5],
    )
}
