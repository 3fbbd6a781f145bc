//! Index (README) rendering.
//!
//! The index template is an embedded asset parsed once into an immutable
//! [`IndexTemplate`]. Parsing validates every placeholder, so rendering a
//! parsed template cannot fail.
//!
//! Template syntax:
//! - `{{name}}`, `{{description}}` outside the row block
//! - a `{{#decisions}}` … `{{/decisions}}` block repeated once per decision,
//!   with `{{id}}`, `{{short_id}}`, `{{title}}`, `{{status}}`, `{{url}}`,
//!   `{{filename}}` and `{{path}}`

use adrtools_shared::{AdrToolsError, Result};
use tracing::{debug, instrument};

use crate::decision::{Decision, DecisionCollection};

const EMBEDDED_TEMPLATE: &str = include_str!("../templates/README.md.tmpl");

const ROWS_START: &str = "{{#decisions}}";
const ROWS_END: &str = "{{/decisions}}";

// ---------------------------------------------------------------------------
// Template data
// ---------------------------------------------------------------------------

/// Everything the index template can reference.
#[derive(Debug, Clone)]
pub struct IndexData {
    pub name: String,
    pub description: String,
    pub rows: Vec<IndexRow>,
}

/// One decision projected for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexRow {
    pub id: String,
    pub short_id: String,
    /// Table-safe title, struck through when the decision is superseded.
    pub title: String,
    pub status: String,
    pub url: String,
    pub filename: String,
    pub path: String,
}

impl IndexRow {
    pub fn from_decision(decision: &Decision) -> Self {
        let title = escape_cell(&decision.title());
        let title = if decision.is_active() {
            title
        } else {
            format!("~~{title}~~")
        };

        Self {
            id: decision.id(),
            short_id: decision.short_id().to_string(),
            title,
            status: escape_cell(&decision.status()),
            url: decision.html_url().to_string(),
            filename: decision.filename().to_string(),
            path: decision.path().to_string(),
        }
    }
}

/// Keep a value from splitting a markdown table cell.
fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|")
}

// ---------------------------------------------------------------------------
// Template
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Description,
    Id,
    ShortId,
    Title,
    Status,
    Url,
    Filename,
    Path,
}

impl Field {
    fn parse(name: &str) -> Option<Self> {
        let field = match name {
            "name" => Self::Name,
            "description" => Self::Description,
            "id" => Self::Id,
            "short_id" => Self::ShortId,
            "title" => Self::Title,
            "status" => Self::Status,
            "url" => Self::Url,
            "filename" => Self::Filename,
            "path" => Self::Path,
            _ => return None,
        };
        Some(field)
    }

    fn is_row_field(self) -> bool {
        !matches!(self, Self::Name | Self::Description)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Field(Field),
}

/// A parsed, validated index template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexTemplate {
    header: Vec<Segment>,
    row: Vec<Segment>,
    footer: Vec<Segment>,
}

impl IndexTemplate {
    /// The template compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::parse(EMBEDDED_TEMPLATE)
    }

    /// Parse and validate template source.
    pub fn parse(source: &str) -> Result<Self> {
        let (header, rest) = source
            .split_once(ROWS_START)
            .ok_or_else(|| AdrToolsError::template(format!("missing {ROWS_START} block")))?;
        let (row, footer) = rest
            .split_once(ROWS_END)
            .ok_or_else(|| AdrToolsError::template(format!("unterminated {ROWS_START} block")))?;

        if row.contains(ROWS_START) || footer.contains(ROWS_START) || footer.contains(ROWS_END) {
            return Err(AdrToolsError::template(
                "only one decisions block is supported",
            ));
        }

        // Block markers sit on their own lines.
        let row = row.strip_prefix('\n').unwrap_or(row);
        let footer = footer.strip_prefix('\n').unwrap_or(footer);

        Ok(Self {
            header: parse_segments(header, false)?,
            row: parse_segments(row, true)?,
            footer: parse_segments(footer, false)?,
        })
    }

    /// Render `data`. Output depends only on `data`.
    pub fn render(&self, data: &IndexData) -> String {
        let mut out = String::new();
        write_segments(&mut out, &self.header, data, None);
        for row in &data.rows {
            write_segments(&mut out, &self.row, data, Some(row));
        }
        write_segments(&mut out, &self.footer, data, None);
        out
    }
}

fn parse_segments(text: &str, in_rows: bool) -> Result<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("{{") {
        if start > 0 {
            segments.push(Segment::Text(rest[..start].to_string()));
        }
        let after = &rest[start + 2..];
        let end = after
            .find("}}")
            .ok_or_else(|| AdrToolsError::template("unclosed placeholder"))?;
        let name = after[..end].trim();
        let field = Field::parse(name).ok_or_else(|| {
            AdrToolsError::template(format!("unknown placeholder '{name}'"))
        })?;
        if field.is_row_field() != in_rows {
            let place = if in_rows { "inside" } else { "outside" };
            return Err(AdrToolsError::template(format!(
                "placeholder '{name}' cannot be used {place} the decisions block"
            )));
        }
        segments.push(Segment::Field(field));
        rest = &after[end + 2..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Text(rest.to_string()));
    }
    Ok(segments)
}

fn write_segments(out: &mut String, segments: &[Segment], data: &IndexData, row: Option<&IndexRow>) {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Field(field) => out.push_str(field_value(*field, data, row)),
        }
    }
}

fn field_value<'a>(field: Field, data: &'a IndexData, row: Option<&'a IndexRow>) -> &'a str {
    match (field, row) {
        (Field::Name, _) => &data.name,
        (Field::Description, _) => &data.description,
        (Field::Id, Some(r)) => &r.id,
        (Field::ShortId, Some(r)) => &r.short_id,
        (Field::Title, Some(r)) => &r.title,
        (Field::Status, Some(r)) => &r.status,
        (Field::Url, Some(r)) => &r.url,
        (Field::Filename, Some(r)) => &r.filename,
        (Field::Path, Some(r)) => &r.path,
        // Row fields are rejected outside the block at parse time.
        (_, None) => "",
    }
}

// ---------------------------------------------------------------------------
// Rendering entry point
// ---------------------------------------------------------------------------

/// Render the index for `collection`, entries sorted ascending by filename.
#[instrument(skip_all, fields(decisions = collection.len()))]
pub fn render_index(
    template: &IndexTemplate,
    collection: &DecisionCollection,
    name: &str,
    description: &str,
) -> String {
    let rows: Vec<IndexRow> = collection
        .sorted()
        .into_iter()
        .map(IndexRow::from_decision)
        .collect();

    debug!(rows = rows.len(), "rendering index");

    template.render(&IndexData {
        name: name.to_string(),
        description: description.to_string(),
        rows,
    })
}
