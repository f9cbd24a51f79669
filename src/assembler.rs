//! Record assembly from ESummary XML and the GEO series text.
//!
//! A detail response is an ESummary `DocSum` whose fields are `Item` elements
//! told apart by their `Name` attribute. Five of them are required; the series
//! accession (`GSE`) then keys the supplementary plain-text lookup whose
//! `!Series_overall_design` lines become the record's design.

use crate::error::{Error, Result};
use crate::types::{DependentId, Identifier, Record};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event as XmlEvent};

/// Line prefix marking design lines in the series text
pub const DESIGN_MARKER: &str = "!Series_overall_design";

const DESIGN_PREFIX: &str = "!Series_overall_design = ";

/// `Item` names read from a detail response, in [`DetailFields`] order
const REQUIRED_ITEMS: [&str; 5] = ["title", "gdsType", "summary", "taxon", "GSE"];

/// Fields extracted from one detail response
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DetailFields {
    /// `title`
    pub title: String,
    /// `gdsType`
    pub experiment_type: String,
    /// `summary`
    pub summary: String,
    /// `taxon`
    pub organism: String,
    /// `GSE` (numeric part of the series accession)
    pub series: String,
}

impl DetailFields {
    /// Series accession for the supplementary lookup, e.g. `GSE12345`
    ///
    /// Datasets linked to several series list them separated by `;`; the first
    /// one is used.
    pub fn accession(&self) -> String {
        let first = self.series.split(';').map(str::trim).find(|s| !s.is_empty());
        format!("GSE{}", first.unwrap_or_default())
    }
}

/// Parse the required fields from an ESummary response
///
/// For each name the first matching `Item` in document order wins. An `Item`
/// that is present but empty yields an empty string, except `GSE`, which must
/// carry a value for the accession to exist.
///
/// # Errors
/// `Error::FieldMissing` if a required `Item` is absent, `Error::Xml` if the
/// document is malformed.
pub fn parse_detail(xml: &str, dependent_id: &DependentId) -> Result<DetailFields> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut found: [Option<String>; 5] = Default::default();
    // One entry per open element: the field it is capturing, if any
    let mut open: Vec<Option<usize>> = Vec::new();

    loop {
        match reader.read_event()? {
            XmlEvent::Start(e) => {
                let slot = wanted_slot(&e, &found)?;
                if let Some(idx) = slot {
                    found[idx] = Some(String::new());
                }
                open.push(slot);
            }
            XmlEvent::Empty(e) => {
                if let Some(idx) = wanted_slot(&e, &found)? {
                    found[idx] = Some(String::new());
                }
            }
            XmlEvent::Text(t) => {
                if let Some(Some(idx)) = open.last()
                    && let Some(value) = found[*idx].as_mut()
                {
                    value.push_str(&t.unescape()?);
                }
            }
            XmlEvent::CData(c) => {
                if let Some(Some(idx)) = open.last()
                    && let Some(value) = found[*idx].as_mut()
                {
                    value.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            XmlEvent::End(_) => {
                if let Some(Some(idx)) = open.pop()
                    && let Some(value) = found[idx].as_mut()
                {
                    *value = value.trim().to_string();
                }
            }
            XmlEvent::Eof => break,
            _ => {}
        }
    }

    let [title, experiment_type, summary, organism, series] = found;
    let require = |value: Option<String>, field: &'static str| {
        value.ok_or_else(|| Error::FieldMissing {
            dependent_id: dependent_id.to_string(),
            field,
        })
    };

    let fields = DetailFields {
        title: require(title, "title")?,
        experiment_type: require(experiment_type, "gdsType")?,
        summary: require(summary, "summary")?,
        organism: require(organism, "taxon")?,
        series: require(series.filter(|s| !s.is_empty()), "GSE")?,
    };

    Ok(fields)
}

/// Index into [`REQUIRED_ITEMS`] if `element` is an `Item` we still need
fn wanted_slot(element: &BytesStart<'_>, found: &[Option<String>; 5]) -> Result<Option<usize>> {
    if element.name().as_ref() != b"Item" {
        return Ok(None);
    }
    for attr in element.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == b"Name" {
            let name = attr.unescape_value()?;
            return Ok(REQUIRED_ITEMS
                .iter()
                .position(|wanted| *wanted == name)
                .filter(|idx| found[*idx].is_none()));
        }
    }
    Ok(None)
}

/// Join the design lines of a GEO series text into one string
///
/// Lines starting with [`DESIGN_MARKER`] have the `"!Series_overall_design = "`
/// prefix removed, `".  "` collapsed to `"."`, and surrounding whitespace
/// trimmed; the results are joined with single spaces. No design lines yields
/// an empty string.
pub fn extract_design(series_text: &str) -> String {
    series_text
        .lines()
        .filter(|line| line.starts_with(DESIGN_MARKER))
        .map(|line| {
            line.replace(DESIGN_PREFIX, "")
                .replace(".  ", ".")
                .trim()
                .to_string()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the immutable record for one DependentID
pub fn assemble(
    identifier: &Identifier,
    dependent_id: &DependentId,
    fields: DetailFields,
    series_text: &str,
) -> Record {
    Record {
        identifier: identifier.clone(),
        dependent_id: dependent_id.clone(),
        accession: fields.accession(),
        title: fields.title,
        experiment_type: fields.experiment_type,
        summary: fields.summary,
        organism: fields.organism,
        design: extract_design(series_text),
    }
}
