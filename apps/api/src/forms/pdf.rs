//! Low-level PDF access: base64 transport, AcroForm text fields and text
//! extraction. All functions are synchronous and belong on the blocking pool.


use base64::{engine::general_purpose::STANDARD, Engine as _};
use lopdf::{Dictionary, Document, Object, ObjectId, StringFormat};
use tracing::debug;

use crate::forms::{FieldResponses, FormError};

/// Nested field hierarchies deeper than this are ignored.
const MAX_FIELD_DEPTH: usize = 16;

/// Decodes base64 PDF data, tolerating a `data:` URI prefix and line breaks.
pub fn decode_base64(data: &str) -> Result<Vec<u8>, FormError> {
    let payload = match data.split_once(";base64,") {
        Some((_, rest)) => rest,
        None => data,
    };
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(STANDARD.decode(cleaned)?)
}

pub fn encode_base64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub fn load(bytes: &[u8]) -> Result<Document, FormError> {
    Ok(Document::load_mem(bytes)?)
}

pub fn save(doc: &mut Document) -> Result<Vec<u8>, FormError> {
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer)?;
    Ok(buffer)
}

pub fn is_encrypted(doc: &Document) -> bool {
    doc.trailer.get(b"Encrypt").is_ok()
}

/// A terminal AcroForm text field (`/FT /Tx`).
#[derive(Debug, Clone, PartialEq)]
pub struct TextField {
    pub id: ObjectId,
    /// Fully qualified name: partial names joined with `.`.
    pub name: String,
    pub value: String,
}

pub fn text_fields(doc: &Document) -> Vec<TextField> {
    let fields = acro_form(doc)
        .and_then(|form| form.get(b"Fields").ok())
        .and_then(|fields| resolve(doc, fields).ok())
        .and_then(|fields| fields.as_array().ok());

    let mut out = Vec::new();
    for field in fields.into_iter().flatten() {
        if let Ok(id) = field.as_reference() {
            collect_text_fields(doc, id, None, None, 0, &mut out);
        }
    }
    out
}

fn collect_text_fields<'a>(
    doc: &'a Document,
    id: ObjectId,
    parent_name: Option<&str>,
    inherited_type: Option<&'a [u8]>,
    depth: usize,
    out: &mut Vec<TextField>,
) {
    if depth > MAX_FIELD_DEPTH {
        return;
    }
    let Ok(dict) = doc.get_object(id).and_then(Object::as_dict) else {
        return;
    };

    let partial = dict
        .get(b"T")
        .ok()
        .and_then(|t| t.as_str().ok())
        .map(decode_text_string);
    let name = match (parent_name, partial) {
        (Some(parent), Some(partial)) => Some(format!("{parent}.{partial}")),
        (None, Some(partial)) => Some(partial),
        (parent, None) => parent.map(str::to_string),
    };
    let field_type = dict
        .get(b"FT")
        .ok()
        .and_then(|t| t.as_name().ok())
        .or(inherited_type);

    // Kids without /T are widget annotations of this field, not child fields.
    let child_fields: Vec<ObjectId> = dict
        .get(b"Kids")
        .ok()
        .and_then(|kids| resolve(doc, kids).ok())
        .and_then(|kids| kids.as_array().ok())
        .into_iter()
        .flatten()
        .filter_map(|kid| kid.as_reference().ok())
        .filter(|kid| {
            doc.get_object(*kid)
                .and_then(Object::as_dict)
                .map(|d| d.has(b"T"))
                .unwrap_or(false)
        })
        .collect();

    if !child_fields.is_empty() {
        for kid in child_fields {
            collect_text_fields(doc, kid, name.as_deref(), field_type, depth + 1, out);
        }
        return;
    }

    if field_type == Some(b"Tx".as_slice()) {
        if let Some(name) = name {
            out.push(TextField {
                id,
                name,
                value: field_value(doc, dict),
            });
        }
    }
}

fn field_value(doc: &Document, dict: &Dictionary) -> String {
    dict.get(b"V")
        .ok()
        .and_then(|v| resolve(doc, v).ok())
        .and_then(|v| v.as_str().ok())
        .map(decode_text_string)
        .unwrap_or_default()
}

/// Writes each response into the field of the same name. Returns how many
/// fields were set.
pub fn set_field_values(
    doc: &mut Document,
    fields: &[TextField],
    responses: &FieldResponses,
) -> Result<usize, FormError> {
    let mut filled = 0;
    for field in fields {
        if let Some(value) = responses.get(&field.name) {
            doc.get_object_mut(field.id)?
                .as_dict_mut()?
                .set("V", text_string(value));
            filled += 1;
        }
    }
    Ok(filled)
}

/// Asks viewers to regenerate field appearances from the new values.
pub fn set_need_appearances(doc: &mut Document) -> Result<(), FormError> {
    let root_id = doc.trailer.get(b"Root")?.as_reference()?;
    let acro_form = doc.get_object(root_id)?.as_dict()?.get(b"AcroForm")?.clone();
    let form = match acro_form {
        Object::Reference(id) => doc.get_object_mut(id)?.as_dict_mut()?,
        _ => doc
            .get_object_mut(root_id)?
            .as_dict_mut()?
            .get_mut(b"AcroForm")?
            .as_dict_mut()?,
    };
    form.set("NeedAppearances", Object::Boolean(true));
    Ok(())
}

/// Full document text. Malformed files can panic inside the extractor, so
/// panics are reported as extraction errors.
pub fn extract_text(bytes: &[u8]) -> Result<String, FormError> {
    let text = without_panics(|| {
        pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| FormError::TextExtraction(e.to_string()))
    })?;
    debug!("Extracted {} chars of PDF text", text.len());
    Ok(text)
}

/// Text of a single page, with the same panic guard as `extract_text`.
pub fn page_text(doc: &Document, page: u32) -> Result<String, FormError> {
    without_panics(|| Ok(doc.extract_text(&[page])?))
}

fn without_panics<T>(extract: impl FnOnce() -> Result<T, FormError>) -> Result<T, FormError> {
    std::panic::catch_unwind(std::panic::AssertUnwindSafe(extract)).unwrap_or_else(|_| {
        Err(FormError::TextExtraction(
            "extractor panicked on malformed PDF".to_string(),
        ))
    })
}

fn catalog(doc: &Document) -> Option<&Dictionary> {
    let root = doc.trailer.get(b"Root").ok()?;
    resolve(doc, root).ok()?.as_dict().ok()
}

fn acro_form(doc: &Document) -> Option<&Dictionary> {
    let form = catalog(doc)?.get(b"AcroForm").ok()?;
    resolve(doc, form).ok()?.as_dict().ok()
}

fn resolve<'a>(doc: &'a Document, object: &'a Object) -> lopdf::Result<&'a Object> {
    match object {
        Object::Reference(id) => doc.get_object(*id),
        other => Ok(other),
    }
}

/// PDF text strings are UTF-16BE with a byte-order mark, or a single-byte
/// encoding otherwise.
fn decode_text_string(bytes: &[u8]) -> String {
    match bytes {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        _ => bytes.iter().map(|&b| b as char).collect(),
    }
}

fn text_string(value: &str) -> Object {
    if value.is_ascii() {
        Object::string_literal(value)
    } else {
        let mut bytes = vec![0xFE, 0xFF];
        bytes.extend(value.encode_utf16().flat_map(u16::to_be_bytes));
        Object::String(bytes, StringFormat::Hexadecimal)
    }
}
