//! Minimal single-font PDF writer for tabular reports
//!
//! Tables are laid out in Courier so columns line up by character count.
//! Every page repeats the title and column header and carries a page footer.

use super::Table;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 50.0;
const TITLE_SIZE: f32 = 13.0;
const FONT_SIZE: f32 = 9.0;
const FOOTER_SIZE: f32 = 8.0;
const LEADING: f32 = 12.0;
/// Courier advance width as a fraction of the font size
const CHAR_WIDTH: f32 = 0.6;
const COLUMN_GAP: usize = 2;
const MIN_COLUMN: usize = 4;

/// Characters that fit on one body line
pub fn line_capacity() -> usize {
    ((PAGE_WIDTH - 2.0 * MARGIN) / (FONT_SIZE * CHAR_WIDTH)) as usize
}

/// Body lines per page, after the title and the repeated header
pub fn rows_per_page() -> usize {
    let body = PAGE_HEIGHT - 2.0 * MARGIN - TITLE_SIZE - LEADING - 2.0 * LEADING;
    ((body / LEADING) as usize).max(1)
}

fn column_widths(table: &Table) -> Vec<usize> {
    let columns = table.headers.len();
    let mut widths: Vec<usize> = table.headers.iter().map(|h| h.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().take(columns).enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }
    for w in widths.iter_mut() {
        *w = (*w).max(MIN_COLUMN);
    }

    let capacity = line_capacity();
    let gaps = COLUMN_GAP * columns.saturating_sub(1);
    while widths.iter().sum::<usize>() + gaps > capacity {
        let Some((widest, _)) = widths
            .iter()
            .enumerate()
            .filter(|(_, w)| **w > MIN_COLUMN)
            .max_by_key(|(_, w)| **w)
        else {
            break;
        };
        widths[widest] -= 1;
    }
    widths
}

fn fit(cell: &str, width: usize) -> String {
    let count = cell.chars().count();
    if count <= width {
        format!("{:<width$}", cell, width = width)
    } else {
        let mut cut: String = cell.chars().take(width.saturating_sub(1)).collect();
        cut.push('~');
        cut
    }
}

fn format_row(cells: &[String], widths: &[usize]) -> String {
    let gap = " ".repeat(COLUMN_GAP);
    let parts: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, w)| fit(cells.get(i).map(String::as_str).unwrap_or(""), *w))
        .collect();
    parts.join(&gap).trim_end().to_string()
}

/// PDF string literal body; Latin-1 maps through WinAnsi, anything else is `?`
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '(' | ')' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            ' '..='~' => out.push(c),
            '\u{a0}'..='\u{ff}' => out.push_str(&format!("\\{:03o}", c as u32)),
            _ => out.push('?'),
        }
    }
    out
}

fn page_stream(title: &str, header: &[String], body: &[String], page: usize, pages: usize) -> String {
    let top = PAGE_HEIGHT - MARGIN;
    let mut s = String::new();
    s.push_str(&format!(
        "BT /F1 {} Tf {} {} Td ({}) Tj ET\n",
        TITLE_SIZE,
        MARGIN,
        top - TITLE_SIZE,
        escape_text(title)
    ));
    s.push_str(&format!(
        "BT /F1 {} Tf {} TL {} {} Td\n",
        FONT_SIZE,
        LEADING,
        MARGIN,
        top - TITLE_SIZE - 2.0 * LEADING
    ));
    for line in header.iter().chain(body) {
        s.push_str(&format!("({}) Tj T*\n", escape_text(line)));
    }
    s.push_str("ET\n");
    s.push_str(&format!(
        "BT /F1 {} Tf {} {} Td (Page {} of {}) Tj ET\n",
        FOOTER_SIZE,
        MARGIN,
        MARGIN / 2.0,
        page,
        pages
    ));
    s
}

struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    /// Append object `offsets.len() + 1`
    fn object(&mut self, body: &str) {
        self.offsets.push(self.buf.len());
        let number = self.offsets.len();
        self.buf
            .extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", number, body).as_bytes());
    }

    fn finish(mut self) -> Vec<u8> {
        let xref = self.buf.len();
        let mut tail = format!("xref\n0 {}\n0000000000 65535 f \n", self.offsets.len() + 1);
        for offset in &self.offsets {
            tail.push_str(&format!("{:010} 00000 n \n", offset));
        }
        tail.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.offsets.len() + 1,
            xref
        ));
        self.buf.extend_from_slice(tail.as_bytes());
        self.buf
    }
}

/// Render a table as a paginated PDF document
pub fn to_pdf(table: &Table) -> Vec<u8> {
    let widths = column_widths(table);
    let header_line = format_row(&table.headers, &widths);
    let rule = "-".repeat(header_line.chars().count().max(MIN_COLUMN));
    let header = [header_line, rule];

    let lines: Vec<String> = table.rows.iter().map(|r| format_row(r, &widths)).collect();
    let per_page = rows_per_page();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![lines.as_slice()]
    } else {
        lines.chunks(per_page).collect()
    };
    let pages = chunks.len();

    // 1 catalog, 2 page tree, 3 font, then a (page, content) pair per page
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", 4 + 2 * i)).collect();

    let mut pdf = PdfWriter::new();
    pdf.object("<< /Type /Catalog /Pages 2 0 R >>");
    pdf.object(&format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        kids.join(" "),
        pages
    ));
    pdf.object("<< /Type /Font /Subtype /Type1 /BaseFont /Courier /Encoding /WinAnsiEncoding >>");

    for (i, chunk) in chunks.iter().enumerate() {
        let content_ref = 5 + 2 * i;
        pdf.object(&format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] /Resources << /Font << /F1 3 0 R >> >> /Contents {} 0 R >>",
            PAGE_WIDTH, PAGE_HEIGHT, content_ref
        ));
        let stream = page_stream(&table.title, &header, chunk, i + 1, pages);
        pdf.object(&format!(
            "<< /Length {} >>\nstream\n{}endstream",
            stream.len(),
            stream
        ));
    }

    pdf.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: usize) -> Table {
        let mut table = Table::new("Expenses (FY 2024)", ["Project", "Description", "Amount"]);
        for i in 0..rows {
            table.push([format!("PRJ-2024-{:03}", i), "Cement".to_string(), "100.00".to_string()]);
        }
        table
    }

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_escape_text() {
        assert_eq!(escape_text("a (b) \\c"), "a \\(b\\) \\\\c");
        assert_eq!(escape_text("Dasmariñas"), "Dasmari\\361as");
        assert_eq!(escape_text("₱5"), "?5");
    }

    #[test]
    fn test_single_page_structure() {
        let doc = text(&to_pdf(&table(3)));
        assert!(doc.starts_with("%PDF-1.4\n"));
        assert!(doc.ends_with("%%EOF\n"));
        assert!(doc.contains("/Count 1"));
        assert!(doc.contains("(Expenses \\(FY 2024\\)) Tj"));
        assert!(doc.contains("(Page 1 of 1) Tj"));
    }

    #[test]
    fn test_paginates_and_xref_points_at_objects() {
        let rows = rows_per_page() * 2 + 1;
        let bytes = to_pdf(&table(rows));
        let doc = text(&bytes);
        assert!(doc.contains("/Count 3"));
        assert!(doc.contains("(Page 3 of 3) Tj"));

        let xref_at: usize = doc
            .rsplit("startxref\n")
            .next()
            .and_then(|rest| rest.lines().next())
            .and_then(|n| n.parse().ok())
            .unwrap();
        assert!(doc[xref_at..].starts_with("xref\n"));

        let first_entry = doc[xref_at..].lines().nth(3).unwrap();
        let offset: usize = first_entry[..10].parse().unwrap();
        assert!(doc[offset..].starts_with("1 0 obj"));
    }

    #[test]
    fn test_wide_tables_are_truncated_to_fit() {
        let mut wide = Table::new("Wide", ["A", "B"]);
        wide.push(["x".repeat(200), "y".repeat(200)]);
        let widths = column_widths(&wide);
        assert!(widths.iter().sum::<usize>() + COLUMN_GAP <= line_capacity());
        assert!(format_row(&wide.rows[0], &widths).contains('~'));
    }
}
