//! Paginated A4 PDF rendering.
//!
//! A small PDF 1.4 writer: the three standard Helvetica faces with
//! WinAnsiEncoding, uncompressed content streams, and a cross-reference
//! table computed while the file is written. Layout works in millimetres from
//! the top-left corner and is converted to PDF points on output.

use chrono::NaiveDateTime;

use crate::LessonPlan;

use super::format_date_br;

// ---------------------------------------------------------------------------
// Page geometry (mm)
// ---------------------------------------------------------------------------

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
const CONTENT_W: f32 = PAGE_W - MARGIN * 2.0;
/// First baseline on a continuation page.
const TOP: f32 = 25.0;
/// Last usable baseline; the footer sits below it.
const BOTTOM: f32 = 280.0;
const FOOTER_Y: f32 = 290.0;
/// A section header starting below this line moves to a new page.
const SECTION_BREAK: f32 = 240.0;
const SUMMARY_BREAK: f32 = 250.0;

const PT_PER_MM: f32 = 72.0 / 25.4;

type Rgb = (u8, u8, u8);

const HEADER_BLUE: Rgb = (55, 88, 161);
const INFO_GRAY: Rgb = (240, 240, 245);
const OBJECTIVE_VIOLET: Rgb = (139, 92, 246);
const SECTION_BLUE: Rgb = (59, 130, 246);
const BADGE_YELLOW: Rgb = (255, 200, 50);
const ACTIVITY_GREEN_BG: Rgb = (230, 245, 230);
const ACTIVITY_GREEN: Rgb = (34, 139, 34);
const SUMMARY_NAVY: Rgb = (52, 66, 102);
const WHITE: Rgb = (255, 255, 255);
const FOOTER_GRAY: Rgb = (150, 150, 150);

// ---------------------------------------------------------------------------
// Fonts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
    Oblique,
}

impl Font {
    const ALL: [Font; 3] = [Font::Regular, Font::Bold, Font::Oblique];

    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
            Font::Oblique => "F3",
        }
    }

    fn base_font(self) -> &'static str {
        match self {
            Font::Regular => "Helvetica",
            Font::Bold => "Helvetica-Bold",
            Font::Oblique => "Helvetica-Oblique",
        }
    }

    /// Glyph advance in 1/1000 em.
    fn advance(self, c: char) -> u16 {
        let table = match self {
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
            Font::Regular | Font::Oblique => &HELVETICA_WIDTHS,
        };
        let c = fold_accent(c);
        match c {
            ' '..='~' => table[c as usize - 32],
            '•' => 350,
            '–' => 556,
            '—' => 1000,
            '“' | '”' => if self == Font::Bold { 500 } else { 333 },
            '‘' | '’' => if self == Font::Bold { 278 } else { 222 },
            '…' => 1000,
            _ => 556,
        }
    }

    /// Width of `text` in millimetres at `size` points.
    fn width_mm(self, text: &str, size: f32) -> f32 {
        let units: u32 = text.chars().map(|c| u32::from(self.advance(c))).sum();
        units as f32 / 1000.0 * size / PT_PER_MM
    }
}

/// Helvetica advances for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

/// Helvetica-Bold advances for U+0020..=U+007E.
#[rustfmt::skip]
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

/// Accented Latin-1 letters share the advance of their base letter.
fn fold_accent(c: char) -> char {
    match c {
        'à'..='å' => 'a',
        'ç' => 'c',
        'è'..='ë' => 'e',
        'ì'..='ï' => 'i',
        'ñ' => 'n',
        'ò'..='ö' => 'o',
        'ù'..='ü' => 'u',
        'ý' | 'ÿ' => 'y',
        'À'..='Å' => 'A',
        'Ç' => 'C',
        'È'..='Ë' => 'E',
        'Ì'..='Ï' => 'I',
        'Ñ' => 'N',
        'Ò'..='Ö' => 'O',
        'Ù'..='Ü' => 'U',
        'Ý' => 'Y',
        'º' | 'ª' => 'o',
        _ => c,
    }
}

/// Map a character to its WinAnsiEncoding byte, `?` when unrepresentable.
fn win_ansi(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7e}' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '\t' => b' ',
        _ => b'?',
    }
}

/// Encode `text` as a PDF literal string, parentheses included.
fn pdf_string(text: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() + 2);
    out.push(b'(');
    for c in text.chars() {
        match win_ansi(c) {
            b @ (b'\\' | b'(' | b')') => {
                out.push(b'\\');
                out.push(b);
            }
            b => out.push(b),
        }
    }
    out.push(b')');
    out
}

// ---------------------------------------------------------------------------
// Line wrapping
// ---------------------------------------------------------------------------

/// Break `text` into lines no wider than `max_mm`.
///
/// Explicit newlines start a new line; a blank input line is kept as an
/// empty line. A single word wider than the line is split by characters.
fn wrap(text: &str, font: Font, size: f32, max_mm: f32) -> Vec<String> {
    let space = font.width_mm(" ", size);
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut line = String::new();
        let mut line_w = 0.0_f32;

        for word in paragraph.split_whitespace() {
            let word_w = font.width_mm(word, size);
            if !line.is_empty() && line_w + space + word_w <= max_mm {
                line.push(' ');
                line.push_str(word);
                line_w += space + word_w;
                continue;
            }
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            if word_w <= max_mm {
                line.push_str(word);
                line_w = word_w;
                continue;
            }
            line_w = 0.0;
            for c in word.chars() {
                let c_w = font.width_mm(c.encode_utf8(&mut [0; 4]), size);
                if !line.is_empty() && line_w + c_w > max_mm {
                    lines.push(std::mem::take(&mut line));
                    line_w = 0.0;
                }
                line.push(c);
                line_w += c_w;
            }
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

/// Cut `text` with a trailing ellipsis so it fits on one line.
fn fit_line(text: &str, font: Font, size: f32, max_mm: f32) -> String {
    if font.width_mm(text, size) <= max_mm {
        return text.to_string();
    }
    let ellipsis = font.width_mm("...", size);
    let mut out = String::new();
    let mut w = 0.0;
    for c in text.chars() {
        let c_w = font.width_mm(c.encode_utf8(&mut [0; 4]), size);
        if w + c_w + ellipsis > max_mm {
            break;
        }
        out.push(c);
        w += c_w;
    }
    out.push_str("...");
    out
}

// ---------------------------------------------------------------------------
// Canvas
// ---------------------------------------------------------------------------

/// Page content streams plus a vertical cursor (baseline, mm from top).
struct Canvas {
    pages: Vec<Vec<u8>>,
    y: f32,
}

impl Canvas {
    fn new() -> Self {
        Self {
            pages: vec![Vec::new()],
            y: TOP,
        }
    }

    fn ops(&mut self) -> &mut Vec<u8> {
        if self.pages.is_empty() {
            self.pages.push(Vec::new());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn new_page(&mut self) {
        self.pages.push(Vec::new());
        self.y = TOP;
    }

    /// Start a new page unless `height` more mm fit above the bottom margin.
    fn ensure_room(&mut self, height: f32) {
        if self.y + height > BOTTOM {
            self.new_page();
        }
    }

    fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Rgb) {
        let op = format!(
            "{} rg {:.2} {:.2} {:.2} {:.2} re f\n",
            rgb(color),
            x * PT_PER_MM,
            (PAGE_H - y - h) * PT_PER_MM,
            w * PT_PER_MM,
            h * PT_PER_MM
        );
        self.ops().extend_from_slice(op.as_bytes());
    }

    fn text(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let op = text_op(x, y, font, size, color, text);
        self.ops().extend_from_slice(&op);
    }

    /// Append the same line at the same place on every page.
    fn stamp_all(&mut self, x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) {
        let op = text_op(x, y, font, size, color, text);
        for page in &mut self.pages {
            page.extend_from_slice(&op);
        }
    }

    /// Write wrapped lines at the cursor, one `leading` apart, breaking pages
    /// as needed. Leaves the cursor below the last line.
    #[allow(clippy::too_many_arguments)]
    fn paragraph(
        &mut self,
        x: f32,
        width: f32,
        font: Font,
        size: f32,
        leading: f32,
        color: Rgb,
        text: &str,
    ) {
        for line in wrap(text, font, size, width) {
            self.ensure_room(leading);
            self.text(x, self.y, font, size, color, &line);
            self.y += leading;
        }
    }
}

fn text_op(x: f32, y: f32, font: Font, size: f32, color: Rgb, text: &str) -> Vec<u8> {
    let mut op = format!(
        "BT /{} {size} Tf {} rg {:.2} {:.2} Td ",
        font.resource(),
        rgb(color),
        x * PT_PER_MM,
        (PAGE_H - y) * PT_PER_MM
    )
    .into_bytes();
    op.extend_from_slice(&pdf_string(text));
    op.extend_from_slice(b" Tj ET\n");
    op
}

fn rgb((r, g, b): Rgb) -> String {
    format!(
        "{:.3} {:.3} {:.3}",
        f32::from(r) / 255.0,
        f32::from(g) / 255.0,
        f32::from(b) / 255.0
    )
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// Render `plan` as a PDF document.
pub fn to_pdf(plan: &LessonPlan, generated_at: NaiveDateTime) -> Vec<u8> {
    let date = format_date_br(generated_at);
    let mut canvas = Canvas::new();

    // Header band.
    canvas.fill_rect(0.0, 0.0, PAGE_W, 45.0, HEADER_BLUE);
    canvas.text(MARGIN, 25.0, Font::Bold, 24.0, WHITE, "PLANO DE AULA");
    let subject = fit_line(plan.display_subject(), Font::Regular, 14.0, CONTENT_W);
    canvas.text(MARGIN, 37.0, Font::Regular, 14.0, WHITE, &subject);

    // Info box.
    let info_color = (60, 60, 60);
    canvas.fill_rect(MARGIN, 57.0, CONTENT_W, 25.0, INFO_GRAY);
    canvas.text(MARGIN + 5.0, 67.0, Font::Regular, 11.0, info_color, &format!("Data: {date}"));
    canvas.text(
        MARGIN + 80.0,
        67.0,
        Font::Regular,
        11.0,
        info_color,
        &format!("Duracao Total: {} minutos", plan.total_duration),
    );
    canvas.text(
        MARGIN + 5.0,
        77.0,
        Font::Regular,
        11.0,
        info_color,
        &format!("Secoes: {}", plan.sections.len()),
    );

    // Objective.
    canvas.fill_rect(MARGIN, 92.0, CONTENT_W, 8.0, OBJECTIVE_VIOLET);
    canvas.text(MARGIN + 5.0, 98.0, Font::Bold, 12.0, WHITE, "OBJETIVO DA AULA");
    canvas.y = 107.0;
    canvas.paragraph(
        MARGIN + 5.0,
        CONTENT_W - 10.0,
        Font::Regular,
        11.0,
        6.0,
        (40, 40, 40),
        &plan.objective,
    );
    canvas.y += 15.0;

    for (index, section) in plan.sections.iter().enumerate() {
        if canvas.y > SECTION_BREAK {
            canvas.new_page();
        }

        let top = canvas.y;
        let duration = format!("{} min", section.duration);
        let badge_w = Font::Regular.width_mm(&duration, 9.0) + 10.0;
        canvas.fill_rect(MARGIN, top, CONTENT_W, 10.0, SECTION_BLUE);
        let title = fit_line(
            &format!("{}. {}", index + 1, section.title.to_uppercase()),
            Font::Bold,
            11.0,
            CONTENT_W - badge_w - 15.0,
        );
        canvas.text(MARGIN + 5.0, top + 7.0, Font::Bold, 11.0, WHITE, &title);
        canvas.fill_rect(PAGE_W - MARGIN - badge_w - 5.0, top + 1.0, badge_w + 5.0, 8.0, BADGE_YELLOW);
        canvas.text(PAGE_W - MARGIN - badge_w, top + 6.5, Font::Regular, 9.0, (40, 40, 40), &duration);
        canvas.y = top + 18.0;

        canvas.paragraph(
            MARGIN + 5.0,
            CONTENT_W - 10.0,
            Font::Regular,
            10.0,
            5.0,
            (50, 50, 50),
            &section.content,
        );
        canvas.y += 8.0;

        let activities = section.activities();
        if !activities.is_empty() {
            draw_activities(&mut canvas, activities);
        }
        canvas.y += 8.0;
    }

    // Summary.
    if canvas.y > SUMMARY_BREAK {
        canvas.new_page();
    }
    let top = canvas.y;
    canvas.fill_rect(MARGIN, top, CONTENT_W, 10.0, SUMMARY_NAVY);
    canvas.text(MARGIN + 5.0, top + 7.0, Font::Bold, 11.0, WHITE, "RESUMO DO PLANO");
    canvas.y = top + 18.0;
    for (index, section) in plan.sections.iter().enumerate() {
        canvas.ensure_room(6.0);
        let line = fit_line(
            &format!("{}. {} - {} minutos", index + 1, section.title, section.duration),
            Font::Regular,
            10.0,
            CONTENT_W - 10.0,
        );
        let y = canvas.y;
        canvas.text(MARGIN + 5.0, y, Font::Regular, 10.0, (50, 50, 50), &line);
        canvas.y += 6.0;
    }
    canvas.y += 5.0;
    canvas.ensure_room(6.0);
    let y = canvas.y;
    canvas.text(
        MARGIN + 5.0,
        y,
        Font::Bold,
        10.0,
        (50, 50, 50),
        &format!("Total: {} minutos", plan.total_duration),
    );

    let footer = format!(
        "Gerado por ClassBuddy em {date} às {}",
        generated_at.format("%H:%M:%S")
    );
    canvas.stamp_all(MARGIN, FOOTER_Y, Font::Oblique, 8.0, FOOTER_GRAY, &footer);

    let title = plan.display_subject().to_string();
    write_document(&canvas.pages, &title)
}

fn draw_activities(canvas: &mut Canvas, activities: &[String]) {
    let bullets: Vec<Vec<String>> = activities
        .iter()
        .map(|a| wrap(&format!("• {a}"), Font::Regular, 10.0, CONTENT_W - 35.0))
        .collect();
    let lines: usize = bullets.iter().map(Vec::len).sum();
    let block = 10.0 + lines as f32 * 5.0 + bullets.len() as f32 * 2.0 + 5.0;

    if canvas.y + block > BOTTOM && block <= BOTTOM - TOP {
        canvas.new_page();
    }
    if canvas.y + block <= BOTTOM {
        canvas.fill_rect(MARGIN + 10.0, canvas.y - 3.0, CONTENT_W - 20.0, block, ACTIVITY_GREEN_BG);
    }

    let y = canvas.y;
    canvas.text(MARGIN + 15.0, y + 5.0, Font::Bold, 10.0, ACTIVITY_GREEN, "Atividades Praticas:");
    canvas.y += 10.0;
    for lines in bullets {
        for line in lines {
            canvas.ensure_room(5.0);
            let y = canvas.y;
            canvas.text(MARGIN + 20.0, y, Font::Regular, 10.0, (60, 60, 60), &line);
            canvas.y += 5.0;
        }
        canvas.y += 2.0;
    }
    canvas.y += 5.0;
}

// ---------------------------------------------------------------------------
// File structure
// ---------------------------------------------------------------------------

/// Object numbers: 1 catalog, 2 page tree, 3..=5 fonts, 6 info, then a
/// (page, contents) pair per page.
const FIRST_PAGE_OBJ: usize = 7;

fn write_document(pages: &[Vec<u8>], title: &str) -> Vec<u8> {
    let mut out: Vec<u8> = Vec::new();
    let mut offsets: Vec<usize> = Vec::new();

    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let kids: Vec<String> = (0..pages.len())
        .map(|i| format!("{} 0 R", FIRST_PAGE_OBJ + i * 2))
        .collect();

    push_object(&mut out, &mut offsets, b"<< /Type /Catalog /Pages 2 0 R >>");
    push_object(
        &mut out,
        &mut offsets,
        format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids.join(" "),
            pages.len()
        )
        .as_bytes(),
    );
    for font in Font::ALL {
        push_object(
            &mut out,
            &mut offsets,
            format!(
                "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                font.base_font()
            )
            .as_bytes(),
        );
    }
    let mut info = b"<< /Producer (ClassBuddy) /Title ".to_vec();
    info.extend_from_slice(&pdf_string(title));
    info.extend_from_slice(b" >>");
    push_object(&mut out, &mut offsets, &info);

    let font_resources = Font::ALL
        .iter()
        .enumerate()
        .map(|(i, f)| format!("/{} {} 0 R", f.resource(), 3 + i))
        .collect::<Vec<_>>()
        .join(" ");

    for (i, content) in pages.iter().enumerate() {
        let contents_obj = FIRST_PAGE_OBJ + i * 2 + 1;
        push_object(
            &mut out,
            &mut offsets,
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Resources << /Font << {font_resources} >> >> /Contents {contents_obj} 0 R >>",
                PAGE_W * PT_PER_MM,
                PAGE_H * PT_PER_MM
            )
            .as_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content);
        stream.extend_from_slice(b"\nendstream");
        push_object(&mut out, &mut offsets, &stream);
    }

    let xref_at = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", offsets.len() + 1).as_bytes());
    for offset in &offsets {
        out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R /Info 6 0 R >>\nstartxref\n{xref_at}\n%%EOF\n",
            offsets.len() + 1
        )
        .as_bytes(),
    );
    out
}

fn push_object(out: &mut Vec<u8>, offsets: &mut Vec<usize>, body: &[u8]) {
    offsets.push(out.len());
    out.extend_from_slice(format!("{} 0 obj\n", offsets.len()).as_bytes());
    out.extend_from_slice(body);
    out.extend_from_slice(b"\nendobj\n");
}
