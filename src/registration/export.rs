//! Spreadsheet and PDF exports of a completed registration.
//!
//! Both exports are pure functions of the record and the export time, so the
//! same inputs always produce the same bytes.

use chrono::{DateTime, Datelike, Timelike, Utc};
use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};
use rust_xlsxwriter::{DocProperties, ExcelDateTime, Format, Workbook};
use serde::{Deserialize, Serialize};

use super::model::RegistrationRecord;
use crate::error::ExportError;

/// Prefix shared by every exported file name.
const FILE_PREFIX: &str = "HybridFlow_Registration";

const SHEET_NAME: &str = "User Registration";
const DOCUMENT_TITLE: &str = "HybridFlow Registration";

// A4 in points.
const PAGE_WIDTH: i64 = 595;
const PAGE_HEIGHT: i64 = 842;
const MARGIN_LEFT: i64 = 57;
const MARGIN_BOTTOM: i64 = 57;
const TITLE_Y: i64 = 757;
const FIRST_LINE_Y: i64 = 700;
const LINE_HEIGHT: i64 = 28;
const VALUE_X: i64 = 180;
const TITLE_FONT_SIZE: i64 = 20;
const BODY_FONT_SIZE: i64 = 12;
/// Characters per value line before wrapping.
const WRAP_WIDTH: usize = 55;

/// Supported export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xlsx,
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unsupported export format: {other}")),
        }
    }
}

/// A rendered export ready to hand to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Render `record` in the requested format.
pub fn export(
    record: &RegistrationRecord,
    format: ExportFormat,
    exported_at: DateTime<Utc>,
) -> Result<ExportedFile, ExportError> {
    let bytes = match format {
        ExportFormat::Xlsx => export_spreadsheet(record, exported_at)?,
        ExportFormat::Pdf => export_document(record, exported_at)?,
    };
    Ok(ExportedFile {
        file_name: file_name(record, format),
        content_type: format.content_type(),
        bytes,
    })
}

/// `HybridFlow_Registration_<first>_<last>.<ext>`.
///
/// Anything outside `[A-Za-z0-9_-]` becomes `_` so the name is always a
/// single path component.
pub fn file_name(record: &RegistrationRecord, format: ExportFormat) -> String {
    format!(
        "{FILE_PREFIX}_{}_{}.{}",
        sanitize(&record.first_name),
        sanitize(&record.last_name),
        format.extension()
    )
}

fn sanitize(part: &str) -> String {
    part.trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn registration_date(exported_at: DateTime<Utc>) -> String {
    exported_at.format("%Y-%m-%d").to_string()
}

/// Header/value pairs of the single spreadsheet row.
pub fn spreadsheet_row(
    record: &RegistrationRecord,
    exported_at: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    vec![
        ("First Name", record.first_name.clone()),
        ("Last Name", record.last_name.clone()),
        ("Email", record.email.clone()),
        ("Company", record.company.clone()),
        ("Phone", record.phone.clone()),
        ("Job Title", record.job_title.clone()),
        ("Location", record.location.clone()),
        ("Team Size", display_or_empty(record.team_size)),
        ("Work Mode", display_or_empty(record.work_mode)),
        ("Interests", record.interests.joined()),
        ("Registration Date", registration_date(exported_at)),
    ]
}

/// Label/value lines of the PDF document.
pub fn document_lines(
    record: &RegistrationRecord,
    exported_at: DateTime<Utc>,
) -> Vec<(&'static str, String)> {
    vec![
        ("Name:", record.full_name()),
        ("Email:", record.email.clone()),
        ("Company:", record.company.clone()),
        ("Phone:", record.phone.clone()),
        ("Job Title:", record.job_title.clone()),
        ("Location:", record.location.clone()),
        ("Team Size:", display_or_empty(record.team_size)),
        ("Work Mode:", display_or_empty(record.work_mode)),
        ("Interests:", record.interests.joined()),
        ("Registration Date:", registration_date(exported_at)),
    ]
}

fn display_or_empty<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// One-row workbook with a bold header line.
pub fn export_spreadsheet(
    record: &RegistrationRecord,
    exported_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let err = |e: rust_xlsxwriter::XlsxError| ExportError::Spreadsheet(e.to_string());

    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME).map_err(err)?;
        for (col, (title, value)) in spreadsheet_row(record, exported_at).iter().enumerate() {
            let col = col as u16;
            worksheet
                .write_string_with_format(0, col, *title, &header)
                .map_err(err)?;
            worksheet.write_string(1, col, value.as_str()).map_err(err)?;
        }
        worksheet.autofit();
    }

    // Pin the document metadata to the export time; otherwise the workbook
    // stamps the wall clock and two exports of the same record differ.
    let created = ExcelDateTime::from_ymd(
        exported_at.year() as u16,
        exported_at.month() as u8,
        exported_at.day() as u8,
    )
    .and_then(|date| {
        date.and_hms(
            exported_at.hour() as u16,
            exported_at.minute() as u8,
            exported_at.second() as u8,
        )
    })
    .map_err(err)?;
    let properties = DocProperties::new()
        .set_title(SHEET_NAME)
        .set_creation_datetime(&created);
    workbook.set_properties(&properties);

    workbook.save_to_buffer().map_err(err)
}

/// A4 document with a title and one label/value line per field, spilling
/// onto further pages when needed.
pub fn export_document(
    record: &RegistrationRecord,
    exported_at: DateTime<Utc>,
) -> Result<Vec<u8>, ExportError> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular,
            "F2" => bold,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for operations in layout_pages(record, exported_at) {
        let page_id = add_page(&mut doc, pages_id, operations)?;
        kids.push(page_id.into());
    }

    let page_count = kids.len() as i64;
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => page_count,
        "Resources" => resources_id,
        "MediaBox" => vec![
            Object::Integer(0),
            Object::Integer(0),
            Object::Integer(PAGE_WIDTH),
            Object::Integer(PAGE_HEIGHT),
        ],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal(DOCUMENT_TITLE),
        "CreationDate" => Object::string_literal(
            exported_at.format("D:%Y%m%d%H%M%SZ").to_string(),
        ),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)
        .map_err(|e| ExportError::Document(e.to_string()))?;
    Ok(buffer)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    operations: Vec<Operation>,
) -> Result<ObjectId, ExportError> {
    let encoded = Content { operations }
        .encode()
        .map_err(|e| ExportError::Document(e.to_string()))?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));
    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    }))
}

/// Content-stream operations for each page.
fn layout_pages(record: &RegistrationRecord, exported_at: DateTime<Utc>) -> Vec<Vec<Operation>> {
    let mut pages = Vec::new();
    let mut ops = Vec::new();
    text_at(&mut ops, "F2", TITLE_FONT_SIZE, MARGIN_LEFT, TITLE_Y, DOCUMENT_TITLE);
    let mut y = FIRST_LINE_Y;

    for (label, value) in document_lines(record, exported_at) {
        let wrapped = wrap(&value, WRAP_WIDTH);
        for (i, line) in wrapped.iter().enumerate() {
            if y < MARGIN_BOTTOM {
                pages.push(std::mem::take(&mut ops));
                y = FIRST_LINE_Y;
            }
            if i == 0 {
                text_at(&mut ops, "F2", BODY_FONT_SIZE, MARGIN_LEFT, y, label);
            }
            text_at(&mut ops, "F1", BODY_FONT_SIZE, VALUE_X, y, line);
            y -= LINE_HEIGHT;
        }
    }
    pages.push(ops);
    pages
}

fn text_at(ops: &mut Vec<Operation>, font: &str, size: i64, x: i64, y: i64, text: &str) {
    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new(
        "Tf",
        vec![Object::Name(font.as_bytes().to_vec()), Object::Integer(size)],
    ));
    ops.push(Operation::new(
        "Td",
        vec![Object::Integer(x), Object::Integer(y)],
    ));
    ops.push(Operation::new("Tj", vec![Object::string_literal(latin1(text))]));
    ops.push(Operation::new("ET", vec![]));
}

/// The standard PDF fonts only cover Latin-1; anything else prints as `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Greedy word wrap. Words longer than `width` are split across lines.
/// Always returns at least one (possibly empty) line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;
    for word in text.split_whitespace() {
        let chars: Vec<char> = word.chars().collect();
        for piece in chars.chunks(width.max(1)) {
            if current_len > 0 && current_len + 1 + piece.len() > width {
                lines.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if current_len > 0 {
                current.push(' ');
                current_len += 1;
            }
            current.extend(piece);
            current_len += piece.len();
        }
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}
