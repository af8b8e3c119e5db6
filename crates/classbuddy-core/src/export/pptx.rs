//! Slide deck rendering as an Office Open XML presentation.
//!
//! Builds the minimum package PowerPoint, Keynote and LibreOffice accept:
//! one master, one blank layout, one theme and a slide per part of the plan.
//! Geometry is given in inches and written as EMUs on a 13.333 x 7.5 in
//! (16:9) page.

use std::io::{Cursor, Write};

use chrono::NaiveDateTime;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::LessonPlan;

use super::{ExportError, format_date_br};

const EMU_PER_INCH: f64 = 914_400.0;
const SLIDE_CX: i64 = 12_192_000;
const SLIDE_CY: i64 = 6_858_000;
const SLIDE_W_IN: f64 = SLIDE_CX as f64 / EMU_PER_INCH;

const FONT_FACE: &str = "Segoe UI";

const DEEP_NAVY: &str = "1B2A4A";
const ROYAL_BLUE: &str = "2E5090";
const VIVID_BLUE: &str = "4A90D9";
const SOFT_BLUE: &str = "6BB5F0";
const TEAL: &str = "1ABC9C";
const AMBER: &str = "F5A623";
const CORAL: &str = "E74C3C";
const WHITE: &str = "FFFFFF";
const OFF_WHITE: &str = "F8FAFC";
const LIGHT_GRAY: &str = "E2E8F0";
const DARK_TEXT: &str = "1E293B";
const MEDIUM_TEXT: &str = "475569";
const MUTED_TEXT: &str = "94A3B8";

const SECTION_COLORS: [&str; 10] = [
    "2E5090", "1ABC9C", "E67E22", "9B59B6", "E74C3C", "3498DB", "27AE60", "F39C12", "8E44AD",
    "16A085",
];

const NS: &str = r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main""#;
const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not legal XML 1.0.
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' => {}
            c => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Slide building
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

/// Text styling for one text box.
#[derive(Debug, Clone, Copy)]
struct Style {
    size: u32,
    bold: bool,
    color: &'static str,
    align: Align,
    middle: bool,
}

impl Style {
    const fn new(size: u32, color: &'static str) -> Self {
        Self {
            size,
            bold: false,
            color,
            align: Align::Left,
            middle: false,
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    const fn middle(mut self) -> Self {
        self.middle = true;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
}

const fn frame(x: f64, y: f64, w: f64, h: f64) -> Frame {
    Frame { x, y, w, h }
}

#[derive(Debug, Clone, Copy)]
enum Geometry {
    Rect,
    RoundRect,
    Ellipse,
}

impl Geometry {
    fn preset(self) -> &'static str {
        match self {
            Geometry::Rect => "rect",
            Geometry::RoundRect => "roundRect",
            Geometry::Ellipse => "ellipse",
        }
    }
}

struct Slide {
    background: &'static str,
    shapes: String,
    next_id: u32,
}

impl Slide {
    fn new(background: &'static str) -> Self {
        Self {
            background,
            shapes: String::new(),
            next_id: 2,
        }
    }

    fn id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn xfrm(f: Frame) -> String {
        format!(
            r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
            emu(f.x),
            emu(f.y),
            emu(f.w),
            emu(f.h)
        )
    }

    /// Filled shape. `alpha` is opacity in percent.
    fn shape(&mut self, geometry: Geometry, f: Frame, color: &str, alpha: u32) {
        let id = self.id();
        let alpha = if alpha < 100 {
            format!(r#"<a:alpha val="{}"/>"#, alpha * 1000)
        } else {
            String::new()
        };
        self.shapes.push_str(&format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Shape {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr>{xfrm}<a:prstGeom prst="{geom}"><a:avLst/></a:prstGeom>"#,
                r#"<a:solidFill><a:srgbClr val="{color}">{alpha}</a:srgbClr></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr>"#,
                r#"</p:sp>"#
            ),
            id = id,
            xfrm = Self::xfrm(f),
            geom = geometry.preset(),
            color = color,
            alpha = alpha,
        ));
    }

    fn rect(&mut self, f: Frame, color: &str) {
        self.shape(Geometry::Rect, f, color, 100);
    }

    /// Text box. Newlines in `text` become separate paragraphs.
    fn text(&mut self, f: Frame, text: &str, style: Style) {
        let id = self.id();
        let algn = match style.align {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        };
        let anchor = if style.middle { "ctr" } else { "t" };
        let bold = if style.bold { r#" b="1""# } else { "" };

        let mut paragraphs = String::new();
        for line in text.lines().chain(text.is_empty().then_some("")) {
            paragraphs.push_str(&format!(
                concat!(
                    r#"<a:p><a:pPr algn="{algn}"/><a:r><a:rPr lang="pt-BR" sz="{sz}"{bold} dirty="0">"#,
                    r#"<a:solidFill><a:srgbClr val="{color}"/></a:solidFill><a:latin typeface="{face}"/></a:rPr>"#,
                    r#"<a:t>{text}</a:t></a:r></a:p>"#
                ),
                algn = algn,
                sz = style.size * 100,
                bold = bold,
                color = style.color,
                face = FONT_FACE,
                text = escape_xml(line),
            ));
        }

        self.shapes.push_str(&format!(
            concat!(
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Text {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#,
                r#"<p:spPr>{xfrm}<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#,
                r#"<p:txBody><a:bodyPr wrap="square" lIns="91440" tIns="45720" rIns="91440" bIns="45720" anchor="{anchor}"><a:normAutofit/></a:bodyPr>"#,
                r#"<a:lstStyle/>{paragraphs}</p:txBody></p:sp>"#
            ),
            id = id,
            xfrm = Self::xfrm(f),
            anchor = anchor,
            paragraphs = paragraphs,
        ));
    }

    fn to_xml(&self) -> String {
        format!(
            concat!(
                "{decl}\n",
                r#"<p:sld {ns}><p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{bg}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
                r#"<p:spTree>{group}{shapes}</p:spTree></p:cSld>"#,
                r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>"#
            ),
            decl = XML_DECL,
            ns = NS,
            bg = self.background,
            group = GROUP_PROPS,
            shapes = self.shapes,
        )
    }
}

const GROUP_PROPS: &str = r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr><p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#;

// ---------------------------------------------------------------------------
// Deck layout
// ---------------------------------------------------------------------------

fn footer(slide: &mut Slide, date: &str) {
    slide.rect(frame(0.0, 6.85, SLIDE_W_IN, 0.65), DEEP_NAVY);
    slide.text(
        frame(0.6, 6.92, 3.0, 0.45),
        "ClassBuddy",
        Style::new(10, SOFT_BLUE).bold(),
    );
    slide.text(
        frame(9.5, 6.92, 3.0, 0.45),
        date,
        Style::new(9, MUTED_TEXT).align(Align::Right),
    );
}

fn deco_circles(slide: &mut Slide) {
    slide.shape(Geometry::Ellipse, frame(11.0, -0.8, 3.0, 3.0), VIVID_BLUE, 15);
    slide.shape(Geometry::Ellipse, frame(10.2, 5.0, 2.5, 2.5), TEAL, 12);
}

/// Light slide with a coloured left bar, a spaced label and a title.
fn titled_slide(label: &str, title: &str, accent: &'static str) -> Slide {
    let mut slide = Slide::new(OFF_WHITE);
    deco_circles(&mut slide);
    slide.rect(frame(0.0, 0.0, 0.12, 7.5), accent);
    slide.text(frame(0.8, 0.4, 6.0, 0.35), label, Style::new(11, accent).bold());
    slide.text(frame(0.8, 0.85, 9.0, 0.6), title, Style::new(28, DARK_TEXT).bold());
    slide.rect(frame(0.8, 1.6, 10.5, 0.02), LIGHT_GRAY);
    slide
}

fn cover_slide(plan: &LessonPlan, date: &str) -> Slide {
    let mut slide = Slide::new(DEEP_NAVY);
    slide.shape(Geometry::Ellipse, frame(-2.0, -2.0, 7.0, 7.0), ROYAL_BLUE, 30);
    slide.shape(Geometry::Ellipse, frame(9.0, 4.0, 5.0, 5.0), TEAL, 25);
    slide.rect(frame(0.8, 2.6, 1.2, 0.08), AMBER);
    slide.text(
        frame(0.8, 2.85, 9.0, 1.4),
        plan.display_subject(),
        Style::new(44, WHITE).bold(),
    );
    slide.text(frame(0.8, 4.3, 8.0, 1.0), &plan.objective, Style::new(16, MUTED_TEXT));

    let chip = Style::new(11, WHITE).bold().align(Align::Center).middle();
    slide.shape(Geometry::RoundRect, frame(0.8, 5.7, 2.4, 0.5), ROYAL_BLUE, 100);
    slide.text(
        frame(0.8, 5.7, 2.4, 0.5),
        &format!("{} minutos", plan.total_duration),
        chip,
    );
    slide.shape(Geometry::RoundRect, frame(3.5, 5.7, 2.4, 0.5), TEAL, 100);
    slide.text(
        frame(3.5, 5.7, 2.4, 0.5),
        &format!("{} seções", plan.sections.len()),
        chip,
    );
    footer(&mut slide, date);
    slide
}

fn objective_slide(plan: &LessonPlan, date: &str) -> Slide {
    let mut slide = Slide::new(OFF_WHITE);
    deco_circles(&mut slide);
    slide.rect(frame(0.0, 0.0, 0.12, 7.5), VIVID_BLUE);
    slide.text(
        frame(0.8, 0.5, 6.0, 0.4),
        "OBJETIVO DA AULA",
        Style::new(11, VIVID_BLUE).bold(),
    );
    slide.text(frame(0.8, 1.3, 10.0, 2.5), &plan.objective, Style::new(22, DARK_TEXT));
    slide.rect(frame(0.8, 4.2, 10.5, 0.02), LIGHT_GRAY);

    // Overview of the first three sections.
    let card_w = 3.3;
    for (i, section) in plan.sections.iter().take(3).enumerate() {
        let x = 0.8 + i as f64 * (card_w + 0.3);
        slide.shape(Geometry::RoundRect, frame(x, 4.6, card_w, 1.6), WHITE, 100);
        slide.shape(
            Geometry::Ellipse,
            frame(x + 0.15, 4.75, 0.4, 0.4),
            SECTION_COLORS[i % SECTION_COLORS.len()],
            100,
        );
        slide.text(
            frame(x + 0.15, 4.75, 0.4, 0.4),
            &format!("{}", i + 1),
            Style::new(12, WHITE).bold().align(Align::Center).middle(),
        );
        slide.text(
            frame(x + 0.65, 4.75, card_w - 0.85, 0.4),
            &section.title,
            Style::new(11, DARK_TEXT).bold(),
        );
        slide.text(
            frame(x + 0.15, 5.7, card_w - 0.3, 0.35),
            &format!("{} min", section.duration),
            Style::new(10, MUTED_TEXT),
        );
    }
    footer(&mut slide, date);
    slide
}

fn section_slide(plan: &LessonPlan, index: usize, date: &str) -> Slide {
    let section = &plan.sections[index];
    let accent = SECTION_COLORS[index % SECTION_COLORS.len()];

    let mut slide = Slide::new(OFF_WHITE);
    slide.rect(frame(0.0, 0.0, 0.12, 7.5), accent);
    slide.shape(Geometry::Ellipse, frame(11.2, -0.6, 2.0, 2.0), accent, 10);
    slide.text(
        frame(0.8, 0.4, 6.0, 0.35),
        &format!("SEÇÃO {} DE {}", index + 1, plan.sections.len()),
        Style::new(10, accent).bold(),
    );
    slide.text(frame(0.8, 0.85, 9.4, 0.7), &section.title, Style::new(28, DARK_TEXT).bold());
    slide.shape(Geometry::RoundRect, frame(10.4, 0.85, 1.8, 0.5), accent, 100);
    slide.text(
        frame(10.4, 0.85, 1.8, 0.5),
        &format!("{} min", section.duration),
        Style::new(11, WHITE).bold().align(Align::Center).middle(),
    );
    slide.rect(frame(0.8, 1.7, 10.5, 0.02), LIGHT_GRAY);

    let activities = section.activities();
    let content_h = if activities.is_empty() { 4.7 } else { 2.6 };
    slide.shape(Geometry::RoundRect, frame(0.8, 1.95, 10.5, content_h), WHITE, 100);
    slide.text(
        frame(1.1, 2.1, 10.0, content_h - 0.3),
        &section.content,
        Style::new(15, MEDIUM_TEXT),
    );

    if !activities.is_empty() {
        let top = 4.8;
        let row = (1.95 / activities.len() as f64).min(0.42);
        slide.shape(
            Geometry::RoundRect,
            frame(0.8, top, 10.5, 0.45 + activities.len() as f64 * row),
            accent,
            8,
        );
        slide.text(
            frame(1.1, top + 0.08, 6.0, 0.35),
            "Atividades Práticas",
            Style::new(12, accent).bold(),
        );
        for (i, activity) in activities.iter().enumerate() {
            let y = top + 0.45 + i as f64 * row;
            slide.shape(Geometry::Ellipse, frame(1.2, y + 0.08, 0.12, 0.12), accent, 100);
            slide.text(
                frame(1.5, y, 9.5, row.max(0.3) - 0.04),
                activity,
                Style::new(13, DARK_TEXT).middle(),
            );
        }
    }
    footer(&mut slide, date);
    slide
}

fn prose_slide(label: &str, title: &str, accent: &'static str, body: &str, date: &str) -> Slide {
    let mut slide = titled_slide(label, title, accent);
    slide.shape(Geometry::RoundRect, frame(0.8, 1.85, 10.5, 4.5), WHITE, 100);
    slide.text(frame(1.1, 2.0, 10.0, 4.2), body, Style::new(16, MEDIUM_TEXT));
    footer(&mut slide, date);
    slide
}

fn resources_slide(resources: &[String], date: &str) -> Slide {
    let mut slide = titled_slide("RECURSOS E MATERIAIS", "Materiais Necessários", AMBER);
    let row = (4.4 / resources.len() as f64).min(0.5);
    slide.shape(
        Geometry::RoundRect,
        frame(0.8, 1.85, 10.5, 0.6 + resources.len() as f64 * row),
        WHITE,
        100,
    );
    for (i, resource) in resources.iter().enumerate() {
        let y = 2.1 + i as f64 * row;
        slide.shape(Geometry::Ellipse, frame(1.2, y + 0.08, 0.14, 0.14), AMBER, 100);
        slide.text(
            frame(1.5, y, 9.5, row.max(0.3) - 0.05),
            resource,
            Style::new(14, DARK_TEXT).middle(),
        );
    }
    footer(&mut slide, date);
    slide
}

fn summary_slide(plan: &LessonPlan, date: &str) -> Slide {
    let mut slide = titled_slide("RESUMO DO PLANO", "Visão Geral", ROYAL_BLUE);
    let rows = plan.sections.len() + 2;
    let row_h = (4.9 / rows as f64).min(0.55);
    let (x, num_w, title_w, dur_w) = (0.8, 0.7, 7.8, 2.0);

    let header = Style::new(11, WHITE).bold().middle();
    let mut y = 1.7;
    slide.rect(frame(x, y, num_w + title_w + dur_w, row_h), ROYAL_BLUE);
    slide.text(frame(x, y, num_w, row_h), "#", header.align(Align::Center));
    slide.text(frame(x + num_w, y, title_w, row_h), "Seção", header);
    slide.text(
        frame(x + num_w + title_w, y, dur_w, row_h),
        "Duração",
        header.align(Align::Center),
    );

    for (i, section) in plan.sections.iter().enumerate() {
        y += row_h;
        let accent = SECTION_COLORS[i % SECTION_COLORS.len()];
        let row_bg = if i % 2 == 0 { WHITE } else { "F1F5F9" };
        slide.rect(frame(x, y, num_w, row_h), accent);
        slide.rect(frame(x + num_w, y, title_w + dur_w, row_h), row_bg);
        slide.text(
            frame(x, y, num_w, row_h),
            &format!("{}", i + 1),
            Style::new(12, WHITE).bold().align(Align::Center).middle(),
        );
        slide.text(
            frame(x + num_w, y, title_w, row_h),
            &section.title,
            Style::new(12, DARK_TEXT).middle(),
        );
        slide.text(
            frame(x + num_w + title_w, y, dur_w, row_h),
            &format!("{} min", section.duration),
            Style::new(12, accent).bold().align(Align::Center).middle(),
        );
    }

    y += row_h;
    slide.rect(frame(x, y, num_w + title_w + dur_w, row_h), DEEP_NAVY);
    slide.text(
        frame(x + num_w, y, title_w, row_h),
        "TOTAL",
        Style::new(13, WHITE).bold().middle(),
    );
    slide.text(
        frame(x + num_w + title_w, y, dur_w, row_h),
        &format!("{} min", plan.total_duration),
        Style::new(14, AMBER).bold().align(Align::Center).middle(),
    );
    footer(&mut slide, date);
    slide
}

fn closing_slide(plan: &LessonPlan) -> Slide {
    let mut slide = Slide::new(DEEP_NAVY);
    slide.shape(Geometry::Ellipse, frame(4.0, 0.5, 5.0, 5.0), ROYAL_BLUE, 25);
    slide.text(
        frame(0.0, 2.2, SLIDE_W_IN, 1.2),
        "Obrigado!",
        Style::new(48, WHITE).bold().align(Align::Center),
    );
    slide.text(
        frame(0.0, 3.5, SLIDE_W_IN, 0.6),
        plan.display_subject(),
        Style::new(18, SOFT_BLUE).align(Align::Center),
    );
    slide.text(
        frame(0.0, 4.3, SLIDE_W_IN, 0.4),
        "Gerado por ClassBuddy",
        Style::new(11, MUTED_TEXT).align(Align::Center),
    );
    slide
}

fn build_slides(plan: &LessonPlan, date: &str) -> Vec<Slide> {
    let mut slides = vec![cover_slide(plan, date), objective_slide(plan, date)];
    for index in 0..plan.sections.len() {
        slides.push(section_slide(plan, index, date));
    }
    if let Some(methodology) = plan.methodology.as_deref().filter(|s| !s.trim().is_empty()) {
        slides.push(prose_slide(
            "METODOLOGIA",
            "Abordagem Pedagógica",
            TEAL,
            methodology,
            date,
        ));
    }
    if let Some(evaluation) = plan.evaluation.as_deref().filter(|s| !s.trim().is_empty()) {
        slides.push(prose_slide(
            "AVALIAÇÃO",
            "Critérios de Avaliação",
            CORAL,
            evaluation,
            date,
        ));
    }
    if !plan.resources().is_empty() {
        slides.push(resources_slide(plan.resources(), date));
    }
    slides.push(summary_slide(plan, date));
    slides.push(closing_slide(plan));
    slides
}

// ---------------------------------------------------------------------------
// Package parts
// ---------------------------------------------------------------------------

fn content_types(slides: usize) -> String {
    let mut overrides = String::new();
    for n in 1..=slides {
        overrides.push_str(&format!(
            r#"<Override PartName="/ppt/slides/slide{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slide+xml"/>"#
        ));
    }
    format!(
        concat!(
            "{decl}\n",
            r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
            r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
            r#"<Default Extension="xml" ContentType="application/xml"/>"#,
            r#"<Override PartName="/ppt/presentation.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.presentation.main+xml"/>"#,
            r#"<Override PartName="/ppt/slideMasters/slideMaster1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideMaster+xml"/>"#,
            r#"<Override PartName="/ppt/slideLayouts/slideLayout1.xml" ContentType="application/vnd.openxmlformats-officedocument.presentationml.slideLayout+xml"/>"#,
            r#"<Override PartName="/ppt/theme/theme1.xml" ContentType="application/vnd.openxmlformats-officedocument.theme+xml"/>"#,
            r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#,
            r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#,
            "{overrides}</Types>"
        ),
        decl = XML_DECL,
        overrides = overrides,
    )
}

const RELS_NS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

fn relationships(rels: &[(String, String, String)]) -> String {
    let mut out = format!(r#"{XML_DECL}
<Relationships xmlns="{RELS_NS}">"#);
    for (id, kind, target) in rels {
        out.push_str(&format!(
            r#"<Relationship Id="{id}" Type="{kind}" Target="{target}"/>"#
        ));
    }
    out.push_str("</Relationships>");
    out
}

fn rel(id: &str, kind: &str, target: &str) -> (String, String, String) {
    (id.to_string(), kind.to_string(), target.to_string())
}

fn package_rels() -> String {
    relationships(&[
        rel("rId1", &format!("{REL_BASE}/officeDocument"), "ppt/presentation.xml"),
        rel(
            "rId2",
            "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties",
            "docProps/core.xml",
        ),
        rel("rId3", &format!("{REL_BASE}/extended-properties"), "docProps/app.xml"),
    ])
}

fn presentation_xml(slides: usize) -> String {
    let ids: String = (0..slides)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
        .collect();
    format!(
        concat!(
            "{decl}\n",
            r#"<p:presentation {ns} saveSubsetFonts="1">"#,
            r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#,
            r#"<p:sldIdLst>{ids}</p:sldIdLst>"#,
            r#"<p:sldSz cx="{cx}" cy="{cy}"/><p:notesSz cx="6858000" cy="9144000"/>"#,
            r#"</p:presentation>"#
        ),
        decl = XML_DECL,
        ns = NS,
        ids = ids,
        cx = SLIDE_CX,
        cy = SLIDE_CY,
    )
}

fn presentation_rels(slides: usize) -> String {
    let mut rels = vec![rel(
        "rId1",
        &format!("{REL_BASE}/slideMaster"),
        "slideMasters/slideMaster1.xml",
    )];
    for n in 1..=slides {
        rels.push(rel(
            &format!("rId{}", n + 1),
            &format!("{REL_BASE}/slide"),
            &format!("slides/slide{n}.xml"),
        ));
    }
    rels.push(rel(
        &format!("rId{}", slides + 2),
        &format!("{REL_BASE}/theme"),
        "theme/theme1.xml",
    ));
    relationships(&rels)
}

fn slide_master_xml() -> String {
    format!(
        concat!(
            "{decl}\n",
            r#"<p:sldMaster {ns}><p:cSld><p:bg><p:bgRef idx="1001"><a:schemeClr val="bg1"/></p:bgRef></p:bg>"#,
            r#"<p:spTree>{group}</p:spTree></p:cSld>"#,
            r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" hlink="hlink" folHlink="folHlink"/>"#,
            r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#,
            r#"<p:txStyles><p:titleStyle/><p:bodyStyle/><p:otherStyle/></p:txStyles></p:sldMaster>"#
        ),
        decl = XML_DECL,
        ns = NS,
        group = GROUP_PROPS,
    )
}

fn slide_layout_xml() -> String {
    format!(
        concat!(
            "{decl}\n",
            r#"<p:sldLayout {ns} type="blank" preserve="1"><p:cSld name="Blank">"#,
            r#"<p:spTree>{group}</p:spTree></p:cSld>"#,
            r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>"#
        ),
        decl = XML_DECL,
        ns = NS,
        group = GROUP_PROPS,
    )
}

fn theme_xml() -> String {
    let solid = |c: &str| format!(r#"<a:solidFill><a:schemeClr val="{c}"/></a:solidFill>"#);
    let line = |w: u32| {
        format!(
            r#"<a:ln w="{w}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#
        )
    };
    format!(
        concat!(
            "{decl}\n",
            r#"<a:theme xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" name="ClassBuddy">"#,
            r#"<a:themeElements><a:clrScheme name="ClassBuddy">"#,
            r#"<a:dk1><a:srgbClr val="{dark}"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#,
            r#"<a:dk2><a:srgbClr val="{navy}"/></a:dk2><a:lt2><a:srgbClr val="{off}"/></a:lt2>"#,
            r#"<a:accent1><a:srgbClr val="{royal}"/></a:accent1><a:accent2><a:srgbClr val="{teal}"/></a:accent2>"#,
            r#"<a:accent3><a:srgbClr val="{amber}"/></a:accent3><a:accent4><a:srgbClr val="{coral}"/></a:accent4>"#,
            r#"<a:accent5><a:srgbClr val="{vivid}"/></a:accent5><a:accent6><a:srgbClr val="{soft}"/></a:accent6>"#,
            r#"<a:hlink><a:srgbClr val="{vivid}"/></a:hlink><a:folHlink><a:srgbClr val="{royal}"/></a:folHlink>"#,
            r#"</a:clrScheme>"#,
            r#"<a:fontScheme name="ClassBuddy"><a:majorFont><a:latin typeface="{face}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont>"#,
            r#"<a:minorFont><a:latin typeface="{face}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
            r#"<a:fmtScheme name="ClassBuddy">"#,
            r#"<a:fillStyleLst>{fill}{fill}{fill}</a:fillStyleLst>"#,
            r#"<a:lnStyleLst>{ln1}{ln2}{ln3}</a:lnStyleLst>"#,
            r#"<a:effectStyleLst><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle><a:effectStyle><a:effectLst/></a:effectStyle></a:effectStyleLst>"#,
            r#"<a:bgFillStyleLst>{fill}{fill}{fill}</a:bgFillStyleLst>"#,
            r#"</a:fmtScheme></a:themeElements></a:theme>"#
        ),
        decl = XML_DECL,
        dark = DARK_TEXT,
        navy = DEEP_NAVY,
        off = OFF_WHITE,
        royal = ROYAL_BLUE,
        teal = TEAL,
        amber = AMBER,
        coral = CORAL,
        vivid = VIVID_BLUE,
        soft = SOFT_BLUE,
        face = FONT_FACE,
        fill = solid("phClr"),
        ln1 = line(6350),
        ln2 = line(12700),
        ln3 = line(19050),
    )
}

fn core_xml(title: &str, generated_at: NaiveDateTime) -> String {
    let stamp = generated_at.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        concat!(
            "{decl}\n",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            r#"<dc:title>{title}</dc:title><dc:creator>ClassBuddy</dc:creator><cp:lastModifiedBy>ClassBuddy</cp:lastModifiedBy>"#,
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{stamp}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{stamp}</dcterms:modified>"#,
            r#"</cp:coreProperties>"#
        ),
        decl = XML_DECL,
        title = escape_xml(title),
        stamp = stamp,
    )
}

fn app_xml(slides: usize) -> String {
    format!(
        concat!(
            "{decl}\n",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">"#,
            r#"<Application>ClassBuddy</Application><PresentationFormat>Widescreen</PresentationFormat>"#,
            r#"<Slides>{slides}</Slides></Properties>"#
        ),
        decl = XML_DECL,
        slides = slides,
    )
}

/// Render `plan` as a PPTX file.
pub fn to_slide_deck(plan: &LessonPlan, generated_at: NaiveDateTime) -> Result<Vec<u8>, ExportError> {
    let date = format_date_br(generated_at);
    let slides = build_slides(plan, &date);
    let slide_rels = relationships(&[rel(
        "rId1",
        &format!("{REL_BASE}/slideLayout"),
        "../slideLayouts/slideLayout1.xml",
    )]);

    let mut parts: Vec<(String, String)> = vec![
        ("[Content_Types].xml".to_string(), content_types(slides.len())),
        ("_rels/.rels".to_string(), package_rels()),
        ("docProps/app.xml".to_string(), app_xml(slides.len())),
        (
            "docProps/core.xml".to_string(),
            core_xml(plan.display_subject(), generated_at),
        ),
        ("ppt/presentation.xml".to_string(), presentation_xml(slides.len())),
        (
            "ppt/_rels/presentation.xml.rels".to_string(),
            presentation_rels(slides.len()),
        ),
        (
            "ppt/slideMasters/slideMaster1.xml".to_string(),
            slide_master_xml(),
        ),
        (
            "ppt/slideMasters/_rels/slideMaster1.xml.rels".to_string(),
            relationships(&[
                rel(
                    "rId1",
                    &format!("{REL_BASE}/slideLayout"),
                    "../slideLayouts/slideLayout1.xml",
                ),
                rel("rId2", &format!("{REL_BASE}/theme"), "../theme/theme1.xml"),
            ]),
        ),
        (
            "ppt/slideLayouts/slideLayout1.xml".to_string(),
            slide_layout_xml(),
        ),
        (
            "ppt/slideLayouts/_rels/slideLayout1.xml.rels".to_string(),
            relationships(&[rel(
                "rId1",
                &format!("{REL_BASE}/slideMaster"),
                "../slideMasters/slideMaster1.xml",
            )]),
        ),
        ("ppt/theme/theme1.xml".to_string(), theme_xml()),
    ];
    for (i, slide) in slides.iter().enumerate() {
        parts.push((format!("ppt/slides/slide{}.xml", i + 1), slide.to_xml()));
        parts.push((
            format!("ppt/slides/_rels/slide{}.xml.rels", i + 1),
            slide_rels.clone(),
        ));
    }

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let opts = FileOptions::default().compression_method(CompressionMethod::Deflated);
    for (name, body) in &parts {
        zip.start_file(name.as_str(), opts)?;
        zip.write_all(body.as_bytes())?;
    }
    let cursor = zip.finish()?;

    tracing::debug!(slides = slides.len(), "slide deck assembled");
    Ok(cursor.into_inner())
}
