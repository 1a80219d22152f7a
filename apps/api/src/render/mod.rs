//! Lays rewritten resume content out as a PDF.
//!
//! US letter, 1" margins, Helvetica body with Helvetica-Bold headings. Text is
//! wrapped with the static metrics in `font_metrics`; a new page starts
//! whenever the next line would cross the bottom margin.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream};
use thiserror::Error;

use crate::models::resume::RewrittenContent;

pub mod font_metrics;

use font_metrics::FontFace;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("rewritten content has no sections to render")]
    EmptyContent,

    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}

/// Turns rewritten content into a downloadable file. Runs on a blocking thread.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, content: &RewrittenContent) -> Result<Vec<u8>, RenderError>;
}

/// Page geometry and type sizes, all in points.
#[derive(Debug, Clone)]
pub struct PageLayout {
    pub width_pt: f32,
    pub height_pt: f32,
    pub margin_pt: f32,
    pub body_size_pt: f32,
    pub heading_size_pt: f32,
    /// Baseline-to-baseline distance as a multiple of the font size.
    pub line_spacing: f32,
    pub paragraph_gap_pt: f32,
    pub section_gap_pt: f32,
}

impl Default for PageLayout {
    fn default() -> Self {
        Self {
            width_pt: 612.0,
            height_pt: 792.0,
            margin_pt: 72.0,
            body_size_pt: 11.0,
            heading_size_pt: 14.0,
            line_spacing: 1.25,
            paragraph_gap_pt: 6.0,
            section_gap_pt: 14.0,
        }
    }
}

impl PageLayout {
    fn text_width(&self) -> f32 {
        self.width_pt - 2.0 * self.margin_pt
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Title(String),
    Heading(String),
    Paragraph(String),
}

/// `lopdf` backed renderer using the PDF base-14 fonts.
#[derive(Default)]
pub struct PdfRenderer {
    layout: PageLayout,
}

impl PdfRenderer {
    pub fn new(layout: PageLayout) -> Self {
        Self { layout }
    }
}

impl DocumentRenderer for PdfRenderer {
    fn render(&self, content: &RewrittenContent) -> Result<Vec<u8>, RenderError> {
        let blocks = layout_blocks(content);
        if blocks.is_empty() {
            return Err(RenderError::EmptyContent);
        }

        let mut writer = PageWriter::new(&self.layout);
        for block in &blocks {
            writer.write_block(block);
        }
        build_pdf(writer.finish(), &self.layout)
    }
}

fn layout_blocks(content: &RewrittenContent) -> Vec<Block> {
    let sections = &content.sections;
    let mut blocks = Vec::new();

    let mut header = sections.header.iter().filter(|l| !l.trim().is_empty());
    if let Some(name) = header.next() {
        blocks.push(Block::Title(name.trim().to_string()));
    }
    blocks.extend(header.map(|l| Block::Paragraph(l.trim().to_string())));

    if !sections.summary.trim().is_empty() {
        blocks.push(Block::Heading("Professional Summary".to_string()));
        blocks.push(Block::Paragraph(sections.summary.trim().to_string()));
    }

    let list_sections = [
        ("Professional Experience", &sections.experience),
        ("Education", &sections.education),
    ];
    for (title, items) in list_sections {
        push_list(&mut blocks, title, items);
    }

    let skills: Vec<&str> = sections
        .skills
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if !skills.is_empty() {
        blocks.push(Block::Heading("Skills".to_string()));
        blocks.push(Block::Paragraph(skills.join(", ")));
    }

    push_list(&mut blocks, "Additional Information", &sections.additional);
    blocks
}

fn push_list(blocks: &mut Vec<Block>, title: &str, items: &[String]) {
    let items: Vec<&str> = items
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if items.is_empty() {
        return;
    }
    blocks.push(Block::Heading(title.to_string()));
    blocks.extend(items.into_iter().map(|i| Block::Paragraph(i.to_string())));
}

// ────────────────────────────────────────────────────────────────────────────
// Page layout
// ────────────────────────────────────────────────────────────────────────────

struct PageWriter<'a> {
    layout: &'a PageLayout,
    pages: Vec<Vec<Operation>>,
    /// Top of the next line, measured from the bottom of the page.
    cursor_y: f32,
    first_block: bool,
}

impl<'a> PageWriter<'a> {
    fn new(layout: &'a PageLayout) -> Self {
        Self {
            layout,
            pages: vec![Vec::new()],
            cursor_y: layout.height_pt - layout.margin_pt,
            first_block: true,
        }
    }

    fn write_block(&mut self, block: &Block) {
        let (face, size, gap_before) = match block {
            Block::Title(_) => (FontFace::HelveticaBold, self.layout.heading_size_pt, 0.0),
            Block::Heading(_) => (
                FontFace::HelveticaBold,
                self.layout.heading_size_pt,
                self.layout.section_gap_pt,
            ),
            Block::Paragraph(_) => (
                FontFace::Helvetica,
                self.layout.body_size_pt,
                self.layout.paragraph_gap_pt,
            ),
        };
        let text = match block {
            Block::Title(t) | Block::Heading(t) | Block::Paragraph(t) => t,
        };

        if !self.first_block {
            self.cursor_y -= gap_before;
        }
        self.first_block = false;

        for line in face.metrics().wrap(text, size, self.layout.text_width()) {
            self.write_line(face, size, &line);
        }
    }

    fn write_line(&mut self, face: FontFace, size: f32, text: &str) {
        let advance = size * self.layout.line_spacing;
        if self.cursor_y - advance < self.layout.margin_pt {
            self.pages.push(Vec::new());
            self.cursor_y = self.layout.height_pt - self.layout.margin_pt;
        }
        self.cursor_y -= advance;

        let ops = vec![
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![
                    Object::Name(face.resource_name().as_bytes().to_vec()),
                    points(size),
                ],
            ),
            Operation::new(
                "Td",
                vec![points(self.layout.margin_pt), points(self.cursor_y)],
            ),
            Operation::new("Tj", vec![Object::string_literal(encode_win_ansi(text))]),
            Operation::new("ET", vec![]),
        ];
        if let Some(page) = self.pages.last_mut() {
            page.extend(ops);
        }
    }

    fn finish(self) -> Vec<Vec<Operation>> {
        self.pages
    }
}

fn points(value: f32) -> Object {
    Object::Integer(value.round() as i64)
}

/// Maps text onto WinAnsiEncoding. Latin-1 passes through, common typographic
/// punctuation maps to its cp1252 slot, everything else becomes '?'.
fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| match c {
            ' '..='~' => c as u8,
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
        })
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// PDF assembly
// ────────────────────────────────────────────────────────────────────────────

fn font_object(face: FontFace) -> Object {
    Object::Dictionary(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => face.base_font(),
        "Encoding" => "WinAnsiEncoding",
    })
}

fn build_pdf(pages: Vec<Vec<Operation>>, layout: &PageLayout) -> Result<Vec<u8>, RenderError> {
    let mut doc = Document::with_version("1.5");
    let pages_id: ObjectId = doc.new_object_id();

    let regular_id = doc.add_object(font_object(FontFace::Helvetica));
    let bold_id = doc.add_object(font_object(FontFace::HelveticaBold));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            FontFace::Helvetica.resource_name() => regular_id,
            FontFace::HelveticaBold.resource_name() => bold_id,
        },
    });

    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());
    for operations in pages {
        let encoded = Content { operations }
            .encode()
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let page_count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                points(layout.width_pt),
                points(layout.height_pt),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| RenderError::Pdf(e.to_string()))?;
    Ok(out)
}
