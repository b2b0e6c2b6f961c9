//! Expense report rendering
//!
//! Draws the landscape A4 table: company header, one row per expense line
//! with the amount placed in its category column, a bold totals row, and the
//! three-cell signature block. Long line lists paginate; each new page
//! repeats the column header row.

use chrono::{Datelike, NaiveDate};
use image::DynamicImage;
use printpdf::{
    BuiltinFont, Color, Image as PdfImage, ImageTransform, IndirectFontRef, Line, Mm,
    PdfDocumentReference, PdfLayerReference, Point, Rgb,
};

use crate::aggregate::{category_totals, sanitize_amount};
use crate::error::{Error, Result};
use crate::format::{format_amount, format_date, month_name_fr};
use crate::models::{Category, CompanyProfile, ExpenseLine};

/// Landscape A4
const PAGE_WIDTH: f32 = 297.0;
const PAGE_HEIGHT: f32 = 210.0;
const MARGIN: f32 = 10.0;

/// Table column widths in mm: date, supplier, description, budget code,
/// six category columns, row total.
const COL_WIDTHS: [f32; 11] = [
    22.0, 32.0, 40.0, 28.0, 24.0, 22.0, 24.0, 18.0, 21.0, 15.0, 20.0,
];

const HEADER_ROW_HEIGHT: f32 = 12.0;
const ROW_HEIGHT: f32 = 7.0;
/// Rows stop here; anything below is reserved for the page bottom margin.
const TABLE_FLOOR: f32 = MARGIN + 8.0;

const BODY_FONT_SIZE: f32 = 7.0;
const GRID_GRAY: f32 = 0.45;

/// Everything the renderer needs besides the lines themselves.
pub struct ReportContext<'a> {
    pub user_name: &'a str,
    pub company: &'a CompanyProfile,
    /// Appended to the grand total and the TOTAL column header
    pub currency_symbol: &'a str,
    /// Raster signature bytes for the beneficiary cell
    pub signature: Option<&'a [u8]>,
    /// Drives the report period label, the suggested filename and the
    /// pre-filled beneficiary date
    pub today: NaiveDate,
}

/// Render the expense report as a standalone PDF.
///
/// Always produces at least one page, even with no lines: the header, an
/// all-zero totals row and the signature block still appear so the document
/// can be printed and signed.
pub fn render_report(lines: &[ExpenseLine], ctx: &ReportContext) -> Result<Vec<u8>> {
    let (doc, page, layer) = printpdf::PdfDocument::new(
        "Note de frais",
        Mm(PAGE_WIDTH),
        Mm(PAGE_HEIGHT),
        "Layer 1",
    );
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(render_err)?;
    let font_bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(render_err)?;

    let mut writer = PageWriter {
        doc: &doc,
        layer: doc.get_page(page).get_layer(layer),
        font,
        font_bold,
        y: PAGE_HEIGHT - MARGIN,
    };
    writer.style_layer();

    draw_title_block(&mut writer, ctx);
    writer.draw_header_row(ctx.currency_symbol);

    for line in lines {
        if writer.y - ROW_HEIGHT < TABLE_FLOOR {
            writer.start_page(ctx.currency_symbol);
        }
        writer.draw_line_row(line);
    }

    let totals = category_totals(lines);
    if writer.y - ROW_HEIGHT < TABLE_FLOOR {
        writer.start_page(ctx.currency_symbol);
    }
    writer.draw_totals_row(&totals, ctx.currency_symbol);

    draw_signature_block(&mut writer, ctx);

    let mut buf = std::io::BufWriter::new(Vec::<u8>::new());
    doc.save(&mut buf).map_err(render_err)?;
    buf.into_inner().map_err(|e| Error::Render(e.to_string()))
}

fn render_err(e: printpdf::Error) -> Error {
    Error::Render(e.to_string())
}

/// Cursor over the current page. `y` is the top edge of the next row.
struct PageWriter<'a> {
    doc: &'a PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    font_bold: IndirectFontRef,
    y: f32,
}

impl PageWriter<'_> {
    fn style_layer(&self) {
        self.layer.set_outline_thickness(0.3);
        self.layer
            .set_outline_color(Color::Rgb(Rgb::new(GRID_GRAY, GRID_GRAY, GRID_GRAY, None)));
    }

    /// Open a fresh page and repeat the column header row.
    fn start_page(&mut self, currency_symbol: &str) {
        let (page, layer) = self
            .doc
            .add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.style_layer();
        self.y = PAGE_HEIGHT - MARGIN;
        self.draw_header_row(currency_symbol);
    }

    fn hline(&self, x1: f32, x2: f32, y: f32) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x1), Mm(y)), false),
                (Point::new(Mm(x2), Mm(y)), false),
            ],
            is_closed: false,
        });
    }

    fn vline(&self, x: f32, y1: f32, y2: f32) {
        self.layer.add_line(Line {
            points: vec![
                (Point::new(Mm(x), Mm(y1)), false),
                (Point::new(Mm(x), Mm(y2)), false),
            ],
            is_closed: false,
        });
    }

    fn text(&self, s: &str, size: f32, x: f32, y: f32, bold: bool) {
        let font = if bold { &self.font_bold } else { &self.font };
        self.layer.use_text(s, size, Mm(x), Mm(y), font);
    }

    /// Grid for one table row spanning all columns.
    fn row_grid(&self, y_top: f32, height: f32) {
        let x_end = MARGIN + table_width();
        self.hline(MARGIN, x_end, y_top);
        self.hline(MARGIN, x_end, y_top - height);
        let mut x = MARGIN;
        self.vline(x, y_top, y_top - height);
        for w in COL_WIDTHS {
            x += w;
            self.vline(x, y_top, y_top - height);
        }
    }

    fn draw_header_row(&mut self, currency_symbol: &str) {
        let y_top = self.y;
        self.row_grid(y_top, HEADER_ROW_HEIGHT);

        let labels: [&[&str]; 4] = [
            &["Date de", "dépense"],
            &["Fournisseur"],
            &["Objet", "(description)"],
            &["Imputation", "budgétaire"],
        ];
        for (i, lines) in labels.iter().enumerate() {
            self.header_cell_lines(i, y_top, lines);
        }
        for (i, cat) in Category::ALL.iter().enumerate() {
            self.header_cell_lines(4 + i, y_top, cat.header_lines());
        }
        let total_label = format!("TOTAL ({})", currency_symbol);
        self.header_cell_lines(10, y_top, &[total_label.as_str(), "TTC"]);

        self.y = y_top - HEADER_ROW_HEIGHT;
    }

    fn header_cell_lines(&self, col: usize, y_top: f32, lines: &[&str]) {
        let x = col_x(col) + 1.0;
        let mut y = y_top - 3.5;
        for line in lines {
            self.text(line, 6.0, x, y, true);
            y -= 2.8;
        }
    }

    fn draw_line_row(&mut self, line: &ExpenseLine) {
        let y_top = self.y;
        self.row_grid(y_top, ROW_HEIGHT);
        let y_text = y_top - 4.5;

        self.cell_text(0, y_text, &format_date(line.date), false);
        self.cell_text(1, y_text, &line.supplier, false);
        self.cell_text(2, y_text, &line.description, false);
        if let Some(code) = &line.budget_code {
            self.cell_text(3, y_text, code, false);
        }

        if let Some(amount) = sanitize_amount(line.amount) {
            let col = 4 + Category::ALL
                .iter()
                .position(|&c| c == line.category)
                .unwrap_or(0);
            self.cell_text(col, y_text, &format_amount(amount), false);
            // Row total equals the single category cell by construction.
            self.cell_text(10, y_text, &format_amount(amount), false);
        }

        self.y = y_top - ROW_HEIGHT;
    }

    fn draw_totals_row(&mut self, totals: &crate::aggregate::CategoryTotals, currency_symbol: &str) {
        let y_top = self.y;
        self.row_grid(y_top, ROW_HEIGHT);
        let y_text = y_top - 4.5;

        self.cell_text(0, y_text, "TOTAUX", true);
        for (i, cat) in Category::ALL.iter().enumerate() {
            self.cell_text(4 + i, y_text, &totals.formatted_for(*cat), true);
        }
        let grand = format!("{} {}", totals.formatted_grand_total(), currency_symbol);
        self.cell_text(10, y_text, &grand, true);

        self.y = y_top - ROW_HEIGHT;
    }

    /// Text clipped to its column width.
    fn cell_text(&self, col: usize, y: f32, s: &str, bold: bool) {
        let clipped = clip_to_width(s, COL_WIDTHS[col]);
        self.text(&clipped, BODY_FONT_SIZE, col_x(col) + 1.0, y, bold);
    }
}

fn table_width() -> f32 {
    COL_WIDTHS.iter().sum()
}

/// Left edge of a column.
fn col_x(col: usize) -> f32 {
    MARGIN + COL_WIDTHS[..col].iter().sum::<f32>()
}

/// Truncate to roughly what fits in `width_mm` at the body font size.
fn clip_to_width(s: &str, width_mm: f32) -> String {
    // Helvetica at 7pt averages about 1.3mm per character.
    let max_chars = ((width_mm - 2.0) / 1.3).max(1.0) as usize;
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

fn draw_title_block(writer: &mut PageWriter, ctx: &ReportContext) {
    let mut text_x = MARGIN;

    if let Some(logo_bytes) = &ctx.company.logo {
        match image::load_from_memory(logo_bytes) {
            Ok(img) => {
                place_image_in_box(
                    &writer.layer,
                    &img,
                    MARGIN,
                    PAGE_HEIGHT - MARGIN - 18.0,
                    34.0,
                    18.0,
                    true,
                );
                text_x = MARGIN + 40.0;
            }
            Err(e) => {
                tracing::warn!(error = %e, "company logo undecodable, rendering text-only header");
            }
        }
    }

    let mut y = PAGE_HEIGHT - MARGIN - 6.0;
    writer.text("NOTE DE FRAIS", 15.0, text_x, y, true);
    y -= 6.5;
    writer.text(
        &format!("Société / École : {}", ctx.company.name),
        9.0,
        text_x,
        y,
        false,
    );
    if let Some(address) = ctx.company.address.as_deref().filter(|a| !a.is_empty()) {
        y -= 4.5;
        writer.text(address, 8.0, text_x, y, false);
    }
    y -= 5.5;
    writer.text(
        &format!(
            "Nom : {}    Mois : {} {}",
            ctx.user_name,
            month_name_fr(ctx.today),
            ctx.today.year()
        ),
        9.0,
        text_x,
        y,
        false,
    );

    writer.y = y - 6.0;
}

/// Signature block: beneficiary, direction, accounting. Beneficiary gets the
/// uploaded signature image and a pre-filled date; the other two cells stay
/// blank for ink.
fn draw_signature_block(writer: &mut PageWriter, ctx: &ReportContext) {
    const CELL_WIDTH: f32 = 85.0;
    const TITLE_HEIGHT: f32 = 6.0;
    const SPACE_HEIGHT: f32 = 24.0;
    const DATE_HEIGHT: f32 = 6.0;
    const BLOCK_HEIGHT: f32 = TITLE_HEIGHT + SPACE_HEIGHT + DATE_HEIGHT;

    writer.y -= 4.0;
    if writer.y - BLOCK_HEIGHT < MARGIN {
        // The block never splits across pages.
        writer.start_page(ctx.currency_symbol);
        writer.y -= 4.0;
    }

    let y_top = writer.y;
    let titles = ["Le bénéficiaire", "La direction", "La comptabilité"];
    for (i, title) in titles.iter().enumerate() {
        let x = MARGIN + i as f32 * CELL_WIDTH;

        // Cell outline
        writer.hline(x, x + CELL_WIDTH, y_top);
        writer.hline(x, x + CELL_WIDTH, y_top - TITLE_HEIGHT);
        writer.hline(x, x + CELL_WIDTH, y_top - TITLE_HEIGHT - SPACE_HEIGHT);
        writer.hline(x, x + CELL_WIDTH, y_top - BLOCK_HEIGHT);
        writer.vline(x, y_top, y_top - BLOCK_HEIGHT);
        writer.vline(x + CELL_WIDTH, y_top, y_top - BLOCK_HEIGHT);

        writer.text(title, 8.0, x + 2.0, y_top - 4.2, true);

        let date_y = y_top - BLOCK_HEIGHT + 1.8;
        if i == 0 {
            writer.text(
                &format!("Date : {}", format_date(ctx.today)),
                8.0,
                x + 2.0,
                date_y,
                false,
            );
        } else {
            writer.text("Date :", 8.0, x + 2.0, date_y, false);
        }
    }

    if let Some(signature_bytes) = ctx.signature {
        match image::load_from_memory(signature_bytes) {
            Ok(img) => {
                // Stretched to the cell's shape on purpose, matching the
                // printed template.
                place_image_in_box(
                    &writer.layer,
                    &img,
                    MARGIN + 18.0,
                    y_top - TITLE_HEIGHT - SPACE_HEIGHT + 3.0,
                    48.0,
                    SPACE_HEIGHT - 6.0,
                    false,
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "signature image undecodable, leaving cell blank");
            }
        }
    }

    writer.y = y_top - BLOCK_HEIGHT;
}

/// Embed an image inside a box. `preserve_aspect` scales uniformly and
/// centers; otherwise the image fills the box exactly.
fn place_image_in_box(
    layer: &PdfLayerReference,
    img: &DynamicImage,
    x: f32,
    y: f32,
    box_w: f32,
    box_h: f32,
    preserve_aspect: bool,
) {
    const DPI: f32 = 300.0;
    let rgb = DynamicImage::ImageRgb8(img.to_rgb8());
    let (px_w, px_h) = (rgb.width(), rgb.height());
    if px_w == 0 || px_h == 0 {
        return;
    }
    let base_w = px_w as f32 * 25.4 / DPI;
    let base_h = px_h as f32 * 25.4 / DPI;

    let (scale_x, scale_y, tx, ty) = if preserve_aspect {
        let scale = (box_w / base_w).min(box_h / base_h);
        let dx = (box_w - base_w * scale) / 2.0;
        let dy = (box_h - base_h * scale) / 2.0;
        (scale, scale, x + dx, y + dy)
    } else {
        (box_w / base_w, box_h / base_h, x, y)
    };

    PdfImage::from_dynamic_image(&rgb).add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm(tx)),
            translate_y: Some(Mm(ty)),
            scale_x: Some(scale_x),
            scale_y: Some(scale_y),
            dpi: Some(DPI),
            ..Default::default()
        },
    );
}
