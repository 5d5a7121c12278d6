//! Renders filled responses as a new application PDF, or as plain text when
//! PDF output is not possible.
//!
//! Layout is US letter with one-inch margins. Text is set in the standard
//! Helvetica faces, so no fonts are embedded; line breaking uses their AFM
//! advance widths. Coordinates are whole points.

use std::collections::HashSet;

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

use crate::forms::{title_case, FieldResponses, FormError};

const PAGE_WIDTH: i64 = 612;
const PAGE_HEIGHT: i64 = 792;
const MARGIN: i64 = 72;
const VALUE_INDENT: i64 = 20;

pub const DOCUMENT_TITLE: &str = "Grant Application Form";
pub const ADDITIONAL_SECTION: &str = "Additional Information";
pub const FOOTER: &str = "This form was generated using AI-powered grant filling technology";

/// Template sections and the fields listed under each, in print order.
pub const SECTIONS: [(&str, &[&str]); 4] = [
    (
        "Organization Information",
        &["organization_name", "mission_statement", "years_active"],
    ),
    (
        "Project Details",
        &["project_title", "project_description", "project_duration"],
    ),
    (
        "Financial Information",
        &["requested_amount", "total_project_cost"],
    ),
    (
        "Impact & Outcomes",
        &["target_population", "expected_outcomes"],
    ),
];

// Advance widths in 1/1000 em for ASCII 0x20..=0x7E. Index = byte - 32.
const HELVETICA_WIDTHS: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource_name(&self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }

    /// Width of `text` in thousandths of a point at 1pt.
    fn text_units(&self, text: &str) -> i64 {
        let widths = match self {
            Font::Regular => &HELVETICA_WIDTHS,
            Font::Bold => &HELVETICA_BOLD_WIDTHS,
        };
        text.bytes()
            .map(|b| match b {
                32..=126 => widths[(b - 32) as usize] as i64,
                _ => 556,
            })
            .sum()
    }

    fn fits(&self, text: &str, size: i64, max_width: i64) -> bool {
        self.text_units(text) * size <= max_width * 1000
    }
}

/// Maps text onto printable ASCII so every byte has a Helvetica glyph.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\n' => out.push('\n'),
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => out.push('\''),
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => out.push('"'),
            '\u{2010}'..='\u{2015}' | '\u{2212}' => out.push('-'),
            '\u{2022}' | '\u{00B7}' => out.push('*'),
            '\u{2026}' => out.push_str("..."),
            c if c.is_whitespace() => out.push(' '),
            c if c.is_ascii_graphic() => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Greedy word wrap. Words wider than the line are broken by character.
fn wrap(text: &str, font: Font, size: i64, max_width: i64) -> Vec<String> {
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            let candidate = if current.is_empty() {
                word.to_string()
            } else {
                format!("{current} {word}")
            };
            if font.fits(&candidate, size, max_width) {
                current = candidate;
                continue;
            }
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            for c in word.chars() {
                current.push(c);
                if !font.fits(&current, size, max_width) && current.len() > 1 {
                    current.pop();
                    lines.push(std::mem::replace(&mut current, c.to_string()));
                }
            }
        }
        lines.push(current);
    }
    lines
}

/// Accumulates text operations, starting a new page when the cursor reaches
/// the bottom margin.
struct PageWriter {
    pages: Vec<Vec<Operation>>,
    operations: Vec<Operation>,
    y: i64,
}

impl PageWriter {
    fn new() -> Self {
        Self {
            pages: Vec::new(),
            operations: Vec::new(),
            y: PAGE_HEIGHT - MARGIN,
        }
    }

    fn break_page(&mut self) {
        self.pages.push(std::mem::take(&mut self.operations));
        self.y = PAGE_HEIGHT - MARGIN;
    }

    fn space(&mut self, points: i64) {
        if self.y - points < MARGIN {
            self.break_page();
        } else {
            self.y -= points;
        }
    }

    fn line(&mut self, text: &str, font: Font, size: i64, x: i64, leading: i64) {
        if self.y - leading < MARGIN {
            self.break_page();
        }
        self.y -= leading;
        self.operations.extend([
            Operation::new("BT", vec![]),
            Operation::new(
                "Tf",
                vec![font.resource_name().into(), Object::Integer(size)],
            ),
            Operation::new("Td", vec![Object::Integer(x), Object::Integer(self.y)]),
            Operation::new("Tj", vec![Object::string_literal(text)]),
            Operation::new("ET", vec![]),
        ]);
    }

    fn centered(&mut self, text: &str, font: Font, size: i64, leading: i64) {
        let width = font.text_units(text) * size / 1000;
        let x = ((PAGE_WIDTH - width) / 2).max(MARGIN);
        self.line(text, font, size, x, leading);
    }

    fn heading(&mut self, text: &str) {
        self.line(text, Font::Bold, 14, MARGIN, 18);
        self.space(10);
    }

    fn field(&mut self, name: &str, value: &str) {
        let label = sanitize(&format!("{}:", title_case(name)));
        self.line(&label, Font::Bold, 12, MARGIN, 16);
        let width = PAGE_WIDTH - 2 * MARGIN - VALUE_INDENT;
        for line in wrap(&sanitize(value), Font::Regular, 11, width) {
            self.line(&line, Font::Regular, 11, MARGIN + VALUE_INDENT, 14);
        }
        self.space(12);
    }

    fn finish(mut self) -> Vec<Vec<Operation>> {
        if !self.operations.is_empty() || self.pages.is_empty() {
            self.pages.push(self.operations);
        }
        self.pages
    }
}

/// Lays out the template and returns one operation list per page.
fn layout(responses: &FieldResponses) -> Vec<Vec<Operation>> {
    let mut writer = PageWriter::new();
    writer.centered(DOCUMENT_TITLE, Font::Bold, 18, 22);
    writer.space(20);

    for (section, fields) in SECTIONS {
        writer.heading(section);
        for name in fields {
            if let Some(value) = responses.get(*name) {
                writer.field(name, value);
            }
        }
        writer.space(20);
    }

    let listed: HashSet<&str> = SECTIONS
        .iter()
        .flat_map(|(_, fields)| fields.iter().copied())
        .collect();
    let mut remaining = responses
        .iter()
        .filter(|(name, _)| !listed.contains(name))
        .peekable();
    if remaining.peek().is_some() {
        writer.heading(ADDITIONAL_SECTION);
        for (name, value) in remaining {
            writer.field(name, value);
        }
    }

    writer.space(30);
    writer.centered(FOOTER, Font::Regular, 10, 12);
    writer.finish()
}

pub fn render_application_pdf(responses: &FieldResponses) -> Result<Vec<u8>, FormError> {
    let pages = layout(responses);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            Font::Regular.resource_name() => regular_id,
            Font::Bold.resource_name() => bold_id,
        },
    });

    let mut kids = Vec::with_capacity(pages.len());
    for operations in pages {
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Integer(PAGE_WIDTH),
                Object::Integer(PAGE_HEIGHT),
            ],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    crate::forms::pdf::save(&mut doc)
}

/// Plain-text rendition of the responses, one labelled block per field.
pub fn text_document(responses: &FieldResponses) -> String {
    let mut content = format!("FILLED GRANT APPLICATION\n{}\n\n", "=".repeat(50));
    for (name, value) in responses.iter() {
        content.push_str(&format!("{}:\n{value}\n\n", title_case(name)));
    }
    content
}
