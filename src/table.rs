use std::borrow::Cow;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Align {
    #[default]
    Left,
    Right,
}

/// A plain-text table: header, separator, body, and an optional footer set
/// off by a second separator.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    align: Vec<Align>,
    rows: Vec<Vec<String>>,
    footer: Option<Vec<String>>,
}

impl TextTable {
    pub fn new(headers: Vec<String>) -> Self {
        let align = vec![Align::Left; headers.len()];
        Self {
            headers,
            align,
            rows: Vec::new(),
            footer: None,
        }
    }

    pub fn with_align(mut self, align: Vec<Align>) -> Self {
        self.align = align;
        self
    }

    pub fn push_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    pub fn set_footer(&mut self, footer: Vec<String>) {
        self.footer = Some(footer);
    }

    pub fn render(&self) -> String {
        let column_count = self.headers.len();
        let mut widths = self
            .headers
            .iter()
            .map(|h| display_width(h))
            .collect::<Vec<_>>();

        for row in self.rows.iter().chain(self.footer.iter()) {
            for (idx, cell) in row.iter().enumerate().take(column_count) {
                widths[idx] = widths[idx].max(display_width(cell));
            }
        }

        for width in &mut widths {
            *width = (*width).max(1);
        }

        let mut output = String::new();

        // Header
        let header_line = format_row(&self.headers, &widths, &[]);
        let _ = writeln!(output, "{header_line}");

        // Separator
        let separator_widths = widths.iter().map(|w| (*w).max(3)).collect::<Vec<usize>>();
        let separator_cells = separator_widths
            .iter()
            .map(|w| "-".repeat(*w))
            .collect::<Vec<_>>();
        let separator_line = format_row(&separator_cells, &separator_widths, &[]);
        let _ = writeln!(output, "{separator_line}");

        // Rows
        for row in &self.rows {
            let row_line = format_row(row, &widths, &self.align);
            let _ = writeln!(output, "{row_line}");
        }

        if let Some(footer) = &self.footer {
            let _ = writeln!(output, "{separator_line}");
            let footer_line = format_row(footer, &widths, &self.align);
            let _ = writeln!(output, "{footer_line}");
        }

        output
    }
}

fn format_row(values: &[String], widths: &[usize], align: &[Align]) -> String {
    let mut cells = Vec::with_capacity(values.len());
    for (idx, value) in values.iter().enumerate() {
        if idx >= widths.len() {
            break;
        }
        let sanitized = sanitize_cell(value);
        let display = display_width(sanitized.as_ref());
        let padding = widths
            .get(idx)
            .copied()
            .unwrap_or_default()
            .saturating_sub(display);
        let pad = " ".repeat(padding);
        let cell = match align.get(idx).copied().unwrap_or_default() {
            Align::Left => format!("{sanitized}{pad}"),
            Align::Right => format!("{pad}{sanitized}"),
        };
        cells.push(cell);
    }
    let mut line = cells.join("  ");
    while line.ends_with(' ') {
        line.pop();
    }
    line
}

fn display_width(value: &str) -> usize {
    let mut width = 0usize;
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch == '\u{1b}' {
            // Skip ANSI escape sequence (e.g. \x1b[31m)
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            width += 1;
        }
    }
    width
}

fn sanitize_cell(value: &str) -> Cow<'_, str> {
    if value.contains(['\n', '\r', '\t']) {
        Cow::Owned(value.replace(['\n', '\r', '\t'], " "))
    } else {
        Cow::Borrowed(value)
    }
}
