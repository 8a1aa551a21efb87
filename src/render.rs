//! HTML output: on-screen preview, floss table, and the printable pattern document.
//!
//! Everything here only reads a [`ColorBoard`]; cells that were never resolved render
//! blank.

use crate::color_board::ColorBoard;
use crate::config::SymbolStyle;
use crate::thread_palette::ThreadColor;

pub const ROWS_PER_PAGE: u32 = 50;
pub const COLUMNS_PER_PAGE: u32 = 50;
/// Labels and thick grid lines fall on every n-th row/column.
pub const GRID_EMPHASIS: u32 = 10;
pub const THREAD_TABLE_COLUMNS: usize = 4;

const PATTERN_CSS: &str = "\
body { font-family: sans-serif; }
#CoverPage { text-align: center; page-break-after: always; }
#CoverPage img { max-width: 90%; image-rendering: pixelated; }
table.Page { border-collapse: collapse; page-break-after: always; margin-bottom: 1em; }
table.Page td { width: 12px; height: 12px; padding: 0; text-align: center; font-size: 9px; line-height: 12px; }
table.Page td.Header { border: none; font-size: 8px; }
table.Page img { width: 10px; height: 10px; }
#Thread td { padding: 2px 6px; }
";

/// One printed page: a window of at most `ROWS_PER_PAGE` x `COLUMNS_PER_PAGE` stitches.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PageSpan {
    pub row_offset: u32,
    pub rows: u32,
    pub column_offset: u32,
    pub columns: u32,
}

/// Split a `width` x `height` pattern into pages, all pages of the first page-row first.
pub fn paginate(width: u32, height: u32) -> Vec<PageSpan> {
    let vertical_pages = height.div_ceil(ROWS_PER_PAGE);
    let horizontal_pages = width.div_ceil(COLUMNS_PER_PAGE);

    let mut pages = Vec::with_capacity((vertical_pages * horizontal_pages) as usize);
    for vertical in 0..vertical_pages {
        let row_offset = vertical * ROWS_PER_PAGE;
        for horizontal in 0..horizontal_pages {
            let column_offset = horizontal * COLUMNS_PER_PAGE;
            pages.push(PageSpan {
                row_offset,
                rows: (height - row_offset).min(ROWS_PER_PAGE),
                column_offset,
                columns: (width - column_offset).min(COLUMNS_PER_PAGE),
            });
        }
    }
    pages
}

/// Whether the cell at page-relative `index` gets a thick trailing border.
///
/// Every `GRID_EMPHASIS`-th line is thick, except on the page's last row/column.
pub fn thick_border(index: u32, limit: u32) -> bool {
    (index + 1) % GRID_EMPHASIS == 0 && index + 1 != limit
}

/// Label for header-row cell `j`; cell 0 is the corner above the row labels.
pub fn column_label(j: u32, column_offset: u32) -> Option<u32> {
    (j != 0 && j % GRID_EMPHASIS == 0).then_some(j + column_offset)
}

/// Label for page-relative row `i`, counted from 1.
pub fn row_label(i: u32, row_offset: u32) -> Option<u32> {
    ((i + 1) % GRID_EMPHASIS == 0).then_some(i + row_offset + 1)
}

/// Swatch size for the preview: big for narrow images, small for wide ones.
pub fn size_class(width: u32, wrapper_width: u32) -> Option<&'static str> {
    if width <= wrapper_width / 4 {
        Some("Large")
    } else if width >= wrapper_width / 2 {
        Some("Small")
    } else {
        None
    }
}

pub fn preview_markup(board: &ColorBoard, wrapper_width: u32) -> String {
    let class = size_class(board.width(), wrapper_width);
    let swatch_class = class.map(|c| format!(" class=\"{}\"", c)).unwrap_or_default();
    let unresolved_class = match class {
        Some(c) => format!(" class=\"Unresolved {}\"", c),
        None => " class=\"Unresolved\"".to_string(),
    };

    let mut html = String::from("<table class=\"Preview\" cellpadding=\"0\" cellspacing=\"0\">");
    for y in 0..board.height() {
        html.push_str("<tr>");
        for x in 0..board.width() {
            match board.color_at(x, y) {
                Some(color) => html.push_str(&format!(
                    "<td{} style=\"background-color: {};\"></td>",
                    swatch_class,
                    color.css_rgb()
                )),
                None => html.push_str(&format!("<td{}></td>", unresolved_class)),
            }
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Thread codes with swatches, `THREAD_TABLE_COLUMNS` pairs per row.
pub fn floss_table(colors: &[ThreadColor]) -> String {
    let mut html = String::from("<table id=\"FlossTable\">");
    for row in colors.chunks(THREAD_TABLE_COLUMNS) {
        html.push_str("<tr>");
        for color in row {
            html.push_str(&format!(
                "<td class=\"Code\">{}</td>",
                escape_html(&color.code)
            ));
            html.push_str(&format!(
                "<td class=\"Swatch\" style=\"background-color: {};\"></td>",
                color.css_rgb()
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table>");
    html
}

/// Full printable document: cover, one grid table per page, and the thread legend.
pub fn pattern_document(board: &ColorBoard, cover_image_name: &str, symbols: &SymbolStyle) -> String {
    let colors = board.colors();
    let mut html = String::new();

    html.push_str("<!doctype html>\n");
    html.push_str("<html lang=\"en-us\">\n");
    html.push_str("<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n");
    html.push_str("<title>Cross-stitch pattern</title>\n");
    html.push_str(&format!("<style>\n{}</style>\n", PATTERN_CSS));
    html.push_str("</head>\n");
    html.push_str("<body>\n");

    html.push_str("<div id=\"CoverPage\">");
    html.push_str(&format!(
        "<img src=\"{}\" alt=\"\" />",
        escape_html(cover_image_name)
    ));
    html.push_str(&format!(
        "<p>{} by {} stitches<br />{} thread colors</p>",
        board.width(),
        board.height(),
        colors.len()
    ));
    html.push_str("</div>\n");

    for page in paginate(board.width(), board.height()) {
        html.push_str(&page_table(board, &page, symbols));
        html.push('\n');
    }

    html.push_str("<div id=\"ThreadWrapper\"><table id=\"Thread\">");
    for row in colors.chunks(THREAD_TABLE_COLUMNS) {
        html.push_str("<tr>");
        for color in row {
            html.push_str(&format!(
                "<td class=\"Symbol\">{}</td>",
                symbol_markup(&color.symbol, symbols)
            ));
            html.push_str(&format!(
                "<td class=\"Code\">{}</td>",
                escape_html(&color.code)
            ));
        }
        html.push_str("</tr>");
    }
    html.push_str("</table></div>\n");
    html.push_str("</body>\n</html>\n");
    html
}

fn page_table(board: &ColorBoard, page: &PageSpan, symbols: &SymbolStyle) -> String {
    let mut html = String::from("<table class=\"Page\">");

    html.push_str("<tr>");
    for j in 0..=page.columns {
        match column_label(j, page.column_offset) {
            Some(label) => html.push_str(&format!("<td class=\"Header\">{}</td>", label)),
            None => html.push_str("<td class=\"Header\"></td>"),
        }
    }
    html.push_str("</tr>");

    for i in 0..page.rows {
        html.push_str("<tr>");
        match row_label(i, page.row_offset) {
            Some(label) => html.push_str(&format!("<td class=\"Header\">{}</td>", label)),
            None => html.push_str("<td class=\"Header\"></td>"),
        }

        let bottom = if thick_border(i, page.rows) { 2 } else { 1 };
        for j in 0..page.columns {
            let right = if thick_border(j, page.columns) { 2 } else { 1 };
            let content = board
                .color_at(page.column_offset + j, page.row_offset + i)
                .map(|color| symbol_markup(&color.symbol, symbols))
                .unwrap_or_default();
            html.push_str(&format!(
                "<td style=\"border-right: {}px solid #000; border-bottom: {}px solid #000;\">{}</td>",
                right, bottom, content
            ));
        }
        html.push_str("</tr>");
    }

    html.push_str("</table>");
    html
}

fn symbol_markup(symbol: &str, style: &SymbolStyle) -> String {
    match style {
        SymbolStyle::Glyph => escape_html(symbol),
        SymbolStyle::Image { dir } => format!(
            "<img src=\"{}/{}.png\" alt=\"\" />",
            escape_html(dir.trim_end_matches('/')),
            escape_html(symbol)
        ),
    }
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
