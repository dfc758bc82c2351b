//! Renders the month sheet as a paginated PDF. Pages are built from scratch
//! on top of lopdf: base-14 Helvetica fonts, one content stream per page,
//! and the attendance table repeated with its header row on every page it
//! spans.

use anyhow::Result;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream, StringFormat};
use time::Month;

use super::calendar::{self, DayClass, WorkLocation};
use super::images::EmbeddedImage;
use super::rows::TimesheetRow;

const PAGE_WIDTH: f32 = 595.28;
const PAGE_HEIGHT: f32 = 841.89;
const MARGIN: f32 = 20.0;

const HEADERS: [&str; 6] = ["Date", "Time-In", "Time-out", "Hours", "WFO/WFH", "Job Description"];
const COL_WIDTHS: [f32; 6] = [72.0, 57.6, 57.6, 50.4, 50.4, 252.0];
const TABLE_WIDTH: f32 = 540.0;
const TABLE_X: f32 = (PAGE_WIDTH - TABLE_WIDTH) / 2.0;

const HEADER_ROW_HEIGHT: f32 = 25.0;
const BODY_SIZE: f32 = 8.0;
const LEADING: f32 = 10.0;
const CELL_PAD_X: f32 = 4.0;
const CELL_PAD_Y: f32 = 6.0;

const FONT_REGULAR: &str = "F1";
const FONT_BOLD: &str = "F2";

const GREY: [f32; 3] = [0.5, 0.5, 0.5];
const WHITESMOKE: [f32; 3] = [0.96, 0.96, 0.96];
const BLACK: [f32; 3] = [0.0, 0.0, 0.0];

/// Identity block printed above the table.
#[derive(Debug, Clone)]
pub struct EmployeeInfo {
    pub name: String,
    pub id: String,
    pub location: String,
    pub manager: String,
}

/// Everything one export needs. Images are consumed because their pixel
/// streams move into the document.
pub struct SheetPdf {
    pub employee: EmployeeInfo,
    pub year: i32,
    pub month: Month,
    pub rows: Vec<TimesheetRow>,
    pub logo: Option<EmbeddedImage>,
    pub signature: Option<EmbeddedImage>,
    pub screenshots: Vec<EmbeddedImage>,
}

pub fn render(sheet: SheetPdf) -> Result<Vec<u8>> {
    let SheetPdf {
        employee,
        year,
        month,
        rows,
        logo,
        signature,
        screenshots,
    } = sheet;
    let mut renderer = Renderer::new();
    renderer.draw_heading(&employee, year, month, logo)?;
    renderer.draw_table(&rows)?;
    renderer.draw_signature(signature)?;
    renderer.draw_screenshots(screenshots)?;
    renderer.into_bytes()
}

/// Download name, e.g. `100270_PriyaNair_january-2025.pdf`.
pub fn filename(employee_id: &str, employee_name: &str, year: i32, month: Month) -> String {
    format!(
        "{}_{}_{}-{}.pdf",
        employee_id,
        employee_name.replace(' ', ""),
        calendar::month_name(month).to_lowercase(),
        year
    )
}

fn real(value: f32) -> Object {
    Object::Real(value)
}

/// Base-14 Helvetica has no embedded metrics, so text centering works off an
/// approximate per-glyph advance table. Close enough for column centering;
/// never used to clip.
fn glyph_width(c: char) -> f32 {
    match c {
        'i' | 'j' | 'l' | '.' | ',' | ':' | ';' | '\'' | '|' | '!' => 0.28,
        'f' | 't' | 'r' | '(' | ')' | '[' | ']' | '/' | '-' | ' ' => 0.33,
        'm' | 'w' | 'M' | 'W' | '@' => 0.89,
        c if c.is_ascii_uppercase() => 0.70,
        c if c.is_ascii_digit() => 0.56,
        _ => 0.50,
    }
}

fn text_width(text: &str, size: f32) -> f32 {
    text.chars().map(glyph_width).sum::<f32>() * size
}

/// Greedy word wrap; embedded newlines force line breaks. Words wider than
/// the column stay on their own line rather than being split.
fn wrap(text: &str, max_width: f32, size: f32) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut line = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if line.is_empty() {
                word.to_string()
            } else {
                format!("{line} {word}")
            };
            if line.is_empty() || text_width(&candidate, size) <= max_width {
                line = candidate;
            } else {
                lines.push(std::mem::take(&mut line));
                line = word.to_string();
            }
        }
        lines.push(line);
    }
    lines
}

fn row_tint(class: &DayClass) -> Option<[f32; 3]> {
    match class {
        DayClass::Holiday { .. } => Some([1.0, 0.9, 0.8]),
        DayClass::Weekend => Some([1.0, 0.98, 0.9]),
        DayClass::Leave { .. } => Some([0.784, 0.902, 0.788]),
        DayClass::Workday {
            location: WorkLocation::Home,
        } => Some([0.9, 0.95, 1.0]),
        DayClass::Workday {
            location: WorkLocation::Office,
        } => None,
    }
}

fn scale_screenshot(width: u32, height: u32) -> (f32, f32) {
    let aspect = width as f32 / height as f32;
    let mut w = 500.0;
    let mut h = w / aspect;
    if h > 700.0 {
        h = 700.0;
        w = h * aspect;
    }
    (w, h)
}

/// Helvetica standard encoding covers the Latin-1 range; anything outside it
/// degrades to '?' rather than producing broken glyphs.
fn pdf_text(text: &str) -> Object {
    let bytes = text
        .chars()
        .map(|c| if (c as u32) < 256 { c as u8 } else { b'?' })
        .collect();
    Object::String(bytes, StringFormat::Literal)
}

/// Accumulates pages top-down. `cursor` is the distance from the top edge;
/// emitted coordinates flip into PDF's bottom-up space.
struct Renderer {
    doc: Document,
    pages_id: ObjectId,
    font_regular: ObjectId,
    font_bold: ObjectId,
    page_ids: Vec<ObjectId>,
    ops: Vec<Operation>,
    page_images: Vec<(String, ObjectId)>,
    image_count: usize,
    cursor: f32,
}

impl Renderer {
    fn new() -> Self {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_regular = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica",
            "Encoding" => "WinAnsiEncoding",
        });
        let font_bold = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Helvetica-Bold",
            "Encoding" => "WinAnsiEncoding",
        });
        Self {
            doc,
            pages_id,
            font_regular,
            font_bold,
            page_ids: Vec::new(),
            ops: Vec::new(),
            page_images: Vec::new(),
            image_count: 0,
            cursor: MARGIN,
        }
    }

    fn op(&mut self, operator: &str, operands: Vec<Object>) {
        self.ops.push(Operation::new(operator, operands));
    }

    fn set_fill(&mut self, [r, g, b]: [f32; 3]) {
        self.op("rg", vec![real(r), real(g), real(b)]);
    }

    fn fill_rect(&mut self, x: f32, y_top: f32, width: f32, height: f32, color: [f32; 3]) {
        self.set_fill(color);
        let y = PAGE_HEIGHT - y_top - height;
        self.op("re", vec![real(x), real(y), real(width), real(height)]);
        self.op("f", vec![]);
        self.set_fill(BLACK);
    }

    fn stroke_rect(&mut self, x: f32, y_top: f32, width: f32, height: f32, line_width: f32) {
        self.op("w", vec![real(line_width)]);
        let y = PAGE_HEIGHT - y_top - height;
        self.op("re", vec![real(x), real(y), real(width), real(height)]);
        self.op("S", vec![]);
    }

    fn text(&mut self, font: &str, size: f32, x: f32, baseline_top: f32, text: &str) {
        self.op("BT", vec![]);
        self.op("Tf", vec![font.into(), real(size)]);
        self.op("Td", vec![real(x), real(PAGE_HEIGHT - baseline_top)]);
        self.op("Tj", vec![pdf_text(text)]);
        self.op("ET", vec![]);
    }

    fn text_centered(&mut self, font: &str, size: f32, center_x: f32, baseline_top: f32, text: &str) {
        let x = center_x - text_width(text, size) / 2.0;
        self.text(font, size, x, baseline_top, text);
    }

    fn draw_image(&mut self, image: EmbeddedImage, x: f32, y_top: f32, width: f32, height: f32) {
        self.image_count += 1;
        let name = format!("Im{}", self.image_count);
        let id = self.doc.add_object(image.xobject);
        self.page_images.push((name.clone(), id));
        let y = PAGE_HEIGHT - y_top - height;
        self.op("q", vec![]);
        self.op(
            "cm",
            vec![real(width), real(0.0), real(0.0), real(height), real(x), real(y)],
        );
        self.op("Do", vec![name.as_str().into()]);
        self.op("Q", vec![]);
    }

    fn finish_page(&mut self) -> Result<()> {
        let content = Content {
            operations: std::mem::take(&mut self.ops),
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));
        let mut resources = dictionary! {
            "Font" => dictionary! {
                FONT_REGULAR => self.font_regular,
                FONT_BOLD => self.font_bold,
            },
        };
        if !self.page_images.is_empty() {
            let mut xobjects = Dictionary::new();
            for (name, id) in self.page_images.drain(..) {
                xobjects.set(name, id);
            }
            resources.set("XObject", xobjects);
        }
        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_id,
            "Contents" => content_id,
            "Resources" => resources,
        });
        self.page_ids.push(page_id);
        self.cursor = MARGIN;
        Ok(())
    }

    fn draw_heading(
        &mut self,
        employee: &EmployeeInfo,
        year: i32,
        month: Month,
        logo: Option<EmbeddedImage>,
    ) -> Result<()> {
        if let Some(logo) = logo {
            // Fixed 2in x 0.8in slot, centered.
            let width = 144.0;
            let height = 57.6;
            self.draw_image(logo, (PAGE_WIDTH - width) / 2.0, self.cursor, width, height);
            self.cursor += height + 20.0;
        }

        let title = format!("Timesheet - {} {}", calendar::month_name(month), year);
        self.text_centered(FONT_BOLD, 16.0, PAGE_WIDTH / 2.0, self.cursor + 16.0 * 0.72, &title);
        self.cursor += 19.0 + 20.0;

        let info = [
            format!("Employee Name: {}", employee.name),
            format!("Employee ID: {}", employee.id),
            format!("Location: {}", employee.location),
            format!("Manager: {}", employee.manager),
        ];
        for line in &info {
            self.text(FONT_REGULAR, 10.0, MARGIN, self.cursor + 10.0 * 0.72, line);
            self.cursor += 15.0;
        }
        self.cursor += 30.0;
        Ok(())
    }

    fn draw_table_header(&mut self) {
        let h = HEADER_ROW_HEIGHT;
        self.fill_rect(TABLE_X, self.cursor, TABLE_WIDTH, h, GREY);
        self.set_fill(WHITESMOKE);
        let mut x = TABLE_X;
        for (title, width) in HEADERS.iter().zip(COL_WIDTHS) {
            self.text_centered(
                FONT_BOLD,
                9.0,
                x + width / 2.0,
                self.cursor + h / 2.0 + 9.0 * 0.35,
                title,
            );
            x += width;
        }
        self.set_fill(BLACK);
        self.grid_row(self.cursor, h);
        self.cursor += h;
    }

    fn grid_row(&mut self, y_top: f32, height: f32) {
        let mut x = TABLE_X;
        for width in COL_WIDTHS {
            self.stroke_rect(x, y_top, width, height, 0.5);
            x += width;
        }
    }

    fn draw_table(&mut self, rows: &[TimesheetRow]) -> Result<()> {
        let desc_width = COL_WIDTHS[5] - 2.0 * CELL_PAD_X;
        let mut segment_top = self.cursor;
        self.draw_table_header();

        for row in rows {
            let lines = wrap(&row.description, desc_width, BODY_SIZE);
            let height = lines.len().max(1) as f32 * LEADING + 2.0 * CELL_PAD_Y;

            // Break unless the row is the first under a fresh header; a row
            // taller than a whole page just overflows instead of looping.
            if self.cursor + height > PAGE_HEIGHT - MARGIN
                && self.cursor > segment_top + HEADER_ROW_HEIGHT
            {
                self.stroke_rect(TABLE_X, segment_top, TABLE_WIDTH, self.cursor - segment_top, 1.0);
                self.finish_page()?;
                segment_top = self.cursor;
                self.draw_table_header();
            }

            if let Some(tint) = row_tint(&row.class) {
                self.fill_rect(TABLE_X, self.cursor, TABLE_WIDTH, height, tint);
            }

            let centered = [
                &row.date,
                &row.time_in,
                &row.time_out,
                &row.hours,
                &row.work_location,
            ];
            let middle = self.cursor + height / 2.0 + BODY_SIZE * 0.35;
            let mut x = TABLE_X;
            for (value, width) in centered.iter().zip(COL_WIDTHS) {
                self.text_centered(FONT_REGULAR, BODY_SIZE, x + width / 2.0, middle, value.as_str());
                x += width;
            }

            let mut baseline = self.cursor + CELL_PAD_Y + BODY_SIZE * 0.72;
            for line in &lines {
                self.text(FONT_REGULAR, BODY_SIZE, x + CELL_PAD_X, baseline, line);
                baseline += LEADING;
            }

            self.grid_row(self.cursor, height);
            self.cursor += height;
        }

        self.stroke_rect(TABLE_X, segment_top, TABLE_WIDTH, self.cursor - segment_top, 1.0);
        Ok(())
    }

    fn draw_signature(&mut self, signature: Option<EmbeddedImage>) -> Result<()> {
        let height = if signature.is_some() { 54.0 } else { 14.0 };
        self.cursor += 30.0;
        if self.cursor + height > PAGE_HEIGHT - MARGIN {
            self.finish_page()?;
        }
        let x = (PAGE_WIDTH - 288.0) / 2.0;
        let middle = self.cursor + height / 2.0 + 10.0 * 0.35;
        self.text(FONT_REGULAR, 10.0, x, middle, "Employee Signature:");
        match signature {
            Some(image) => self.draw_image(image, x + 144.0, self.cursor, 108.0, 54.0),
            None => self.text(FONT_REGULAR, 10.0, x + 144.0, middle, "_________________"),
        }
        self.cursor += height;
        Ok(())
    }

    fn draw_screenshots(&mut self, screenshots: Vec<EmbeddedImage>) -> Result<()> {
        if screenshots.is_empty() {
            return Ok(());
        }
        self.finish_page()?;
        self.text_centered(
            FONT_BOLD,
            16.0,
            PAGE_WIDTH / 2.0,
            self.cursor + 16.0 * 0.72,
            "SAP Screenshots",
        );
        self.cursor += 19.0 + 40.0;

        for shot in screenshots {
            let (width, height) = scale_screenshot(shot.width, shot.height);
            if self.cursor + height > PAGE_HEIGHT - MARGIN && self.cursor > MARGIN {
                self.finish_page()?;
            }
            self.draw_image(shot, (PAGE_WIDTH - width) / 2.0, self.cursor, width, height);
            self.cursor += height + 20.0;
        }
        Ok(())
    }

    fn into_bytes(mut self) -> Result<Vec<u8>> {
        self.finish_page()?;
        let kids: Vec<Object> = self.page_ids.iter().map(|id| (*id).into()).collect();
        let count = self.page_ids.len() as i64;
        let pages = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), real(PAGE_WIDTH), real(PAGE_HEIGHT)],
        };
        self.doc
            .objects
            .insert(self.pages_id, Object::Dictionary(pages));
        let catalog_id = self.doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => self.pages_id,
        });
        self.doc.trailer.set("Root", catalog_id);
        let mut buffer = Vec::new();
        self.doc.save_to(&mut buffer)?;
        Ok(buffer)
    }
}
