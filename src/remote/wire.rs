//! Vendor JSON shapes for block payloads and creation requests.
//!
//! ```text
//! BlockDescriptor::Text("Hello **world**")
//!   → { "block_type": 2,
//!       "text": { "elements": [
//!           { "text_run": { "content": "Hello " } },
//!           { "text_run": { "content": "world",
//!                           "text_element_style": { "bold": true } } } ] } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::domain::{Align, BlockDescriptor, BlockKind, BlockPayload, RunList, StyledRun, TableSpec};

use super::RemoteBlock;

/// Temporary id of the table block inside a descendant request.
pub const TABLE_TEMP_ID: &str = "table";

fn is_false(value: &bool) -> bool {
    !*value
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElementStyle {
    #[serde(default, skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub inline_code: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<Link>,
}

impl TextElementStyle {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn from_run(run: &StyledRun) -> Self {
        Self {
            bold: run.bold,
            italic: run.italic,
            strikethrough: run.strikethrough,
            underline: run.underline,
            inline_code: run.inline_code,
            link: run.link.clone().map(|url| Link { url }),
        }
    }

    fn apply(&self, run: &mut StyledRun) {
        run.bold = self.bold;
        run.italic = self.italic;
        run.strikethrough = self.strikethrough;
        run.underline = self.underline;
        run.inline_code = self.inline_code;
        run.link = self.link.as_ref().map(|link| link.url.clone());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentRun {
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "TextElementStyle::is_empty")]
    pub text_element_style: TextElementStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionDoc {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// One inline element. Exactly one field is set on elements we produce.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextElement {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_run: Option<ContentRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equation: Option<ContentRun>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mention_doc: Option<MentionDoc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub align: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wrap: Option<bool>,
}

impl TextStyle {
    fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Payload shared by every text-like kind (text, headings, lists, code...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBody {
    #[serde(default)]
    pub elements: Vec<TextElement>,
    #[serde(default, skip_serializing_if = "TextStyle::is_empty")]
    pub style: TextStyle,
}

impl TextBody {
    fn new(runs: &RunList, style: TextStyle) -> Self {
        Self {
            elements: runs_to_elements(runs),
            style,
        }
    }

    /// Concatenated text of every element, ignoring styles.
    pub fn plain_text(&self) -> String {
        elements_to_runs(&self.elements)
            .iter()
            .map(|run| run.equation.as_deref().unwrap_or(&run.text))
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableProperty {
    pub row_size: usize,
    pub column_size: usize,
    #[serde(default)]
    pub header_row: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableBody {
    pub property: TableProperty,
    /// Cell ids in row-major order. Present on read only.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBody {
    #[serde(default)]
    pub token: String,
}

/// Converts runs to vendor elements. Never returns an empty list.
pub fn runs_to_elements(runs: &RunList) -> Vec<TextElement> {
    let mut elements: Vec<TextElement> = runs
        .runs()
        .iter()
        .map(|run| {
            let body = ContentRun {
                content: run.equation.clone().unwrap_or_else(|| run.text.clone()),
                text_element_style: TextElementStyle::from_run(run),
            };
            if run.is_equation() {
                TextElement {
                    equation: Some(body),
                    ..TextElement::default()
                }
            } else {
                TextElement {
                    text_run: Some(body),
                    ..TextElement::default()
                }
            }
        })
        .collect();
    if elements.is_empty() {
        elements.push(TextElement {
            text_run: Some(ContentRun::default()),
            ..TextElement::default()
        });
    }
    elements
}

/// Converts vendor elements back to runs. Unknown element kinds are dropped.
pub fn elements_to_runs(elements: &[TextElement]) -> Vec<StyledRun> {
    let mut runs = Vec::with_capacity(elements.len());
    for element in elements {
        if let Some(text) = &element.text_run {
            let mut run = StyledRun::plain(text.content.clone());
            text.text_element_style.apply(&mut run);
            runs.push(run);
        } else if let Some(eq) = &element.equation {
            let mut run = StyledRun::equation(eq.content.trim_end_matches('\n'));
            run.link = eq.text_element_style.link.as_ref().map(|l| l.url.clone());
            runs.push(run);
        } else if let Some(doc) = &element.mention_doc {
            runs.push(StyledRun {
                link: Some(doc.url.clone()),
                ..StyledRun::plain(doc.title.clone())
            });
        } else {
            log::debug!("dropping unknown text element {:?}", element);
        }
    }
    runs
}

fn align_style(align: Align) -> TextStyle {
    TextStyle {
        align: Some(align.code()),
        ..TextStyle::default()
    }
}

fn to_value<T: Serialize>(body: &T) -> Value {
    serde_json::to_value(body).unwrap_or(Value::Null)
}

/// The JSON payload object stored under the block's field name.
fn payload_json(payload: &BlockPayload) -> Value {
    match payload {
        BlockPayload::Heading { runs, align, .. } | BlockPayload::Text { runs, align } => {
            to_value(&TextBody::new(runs, align_style(*align)))
        }
        BlockPayload::Code {
            content,
            language,
            wrap,
        } => to_value(&TextBody::new(
            &RunList::plain(content.clone()),
            TextStyle {
                language: Some(*language),
                wrap: Some(*wrap),
                ..TextStyle::default()
            },
        )),
        BlockPayload::List { runs, .. } | BlockPayload::Quote { runs } => {
            to_value(&TextBody::new(runs, TextStyle::default()))
        }
        BlockPayload::Todo { runs, done } => to_value(&TextBody::new(
            runs,
            TextStyle {
                done: Some(*done),
                ..TextStyle::default()
            },
        )),
        BlockPayload::Equation { content } => to_value(&TextBody::new(
            &RunList::new(vec![StyledRun::equation(content.clone())]),
            TextStyle::default(),
        )),
        BlockPayload::Table(spec) => json!({ "property": table_property(spec) }),
        BlockPayload::Image(_) | BlockPayload::Divider => json!({}),
        BlockPayload::Whiteboard {
            align,
            width,
            height,
        } => json!({ "align": align.code(), "width": width, "height": height }),
    }
}

fn table_property(spec: &TableSpec) -> TableProperty {
    TableProperty {
        row_size: spec.row_size(),
        column_size: spec.column_size(),
        header_row: spec.header_row(),
    }
}

/// Vendor JSON for one block, without its children.
pub fn block_to_json(block: &BlockDescriptor) -> Value {
    let kind = block.kind();
    let mut object = serde_json::Map::new();
    object.insert("block_type".into(), json!(kind.code()));
    object.insert(kind.field_name().into(), payload_json(block.payload()));
    Value::Object(object)
}

/// Body of a children-creation call.
pub fn children_request(blocks: &[BlockDescriptor], index: usize) -> Value {
    json!({
        "children": blocks.iter().map(block_to_json).collect::<Vec<_>>(),
        "index": index,
    })
}

fn cell_id(row: usize, column: usize) -> String {
    format!("cell_{}_{}", row, column)
}

/// Body of a descendant call creating `spec` as one table at `index`.
///
/// Every cell holds one text block, and every text block at least one
/// element, even when the Markdown cell was empty.
pub fn table_request(spec: &TableSpec, index: usize) -> Value {
    let mut cells = Vec::with_capacity(spec.row_size() * spec.column_size());
    let mut descendants = Vec::new();

    for (r, row) in spec.rows().iter().enumerate() {
        for (c, runs) in row.iter().enumerate() {
            let id = cell_id(r, c);
            let text_id = format!("{}_text", id);
            descendants.push(json!({
                "block_id": id,
                "block_type": BlockKind::TableCell.code(),
                "table_cell": {},
                "children": [text_id],
            }));
            descendants.push(json!({
                "block_id": text_id,
                "block_type": BlockKind::Text.code(),
                "text": TextBody::new(runs, align_style(spec.column_align(c))),
                "children": [],
            }));
            cells.push(id);
        }
    }

    let mut all = Vec::with_capacity(descendants.len() + 1);
    all.push(json!({
        "block_id": TABLE_TEMP_ID,
        "block_type": BlockKind::Table.code(),
        "table": { "property": table_property(spec) },
        "children": cells,
    }));
    all.extend(descendants);

    json!({
        "children_id": [TABLE_TEMP_ID],
        "index": index,
        "descendants": all,
    })
}

/// Decodes the text-like payload stored under `field`, if any.
pub fn text_body(block: &RemoteBlock, field: &str) -> Option<TextBody> {
    let value = block.field(field)?;
    match serde_json::from_value(value.clone()) {
        Ok(body) => Some(body),
        Err(err) => {
            log::warn!("block {} has a malformed {} payload: {}", block.block_id, field, err);
            None
        }
    }
}

pub fn table_body(block: &RemoteBlock) -> Option<TableBody> {
    serde_json::from_value(block.field("table")?.clone()).ok()
}

/// Token of an image or whiteboard block.
pub fn token(block: &RemoteBlock, field: &str) -> Option<String> {
    let body: TokenBody = serde_json::from_value(block.field(field)?.clone()).ok()?;
    (!body.token.is_empty()).then_some(body.token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ListKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_block_json_shape() {
        let runs = RunList::new(vec![
            StyledRun::plain("Hello "),
            StyledRun {
                bold: true,
                ..StyledRun::plain("world")
            },
        ]);
        let value = block_to_json(&BlockDescriptor::text(runs));
        assert_eq!(
            value,
            json!({
                "block_type": 2,
                "text": {
                    "elements": [
                        { "text_run": { "content": "Hello " } },
                        { "text_run": { "content": "world", "text_element_style": { "bold": true } } }
                    ],
                    "style": { "align": 1 }
                }
            })
        );
    }

    #[test]
    fn heading_uses_level_field() {
        let block = BlockDescriptor::heading(9, RunList::plain("deep"), Align::Left).unwrap();
        let value = block_to_json(&block);
        assert_eq!(value["block_type"], json!(11));
        assert!(value.get("heading9").is_some());
    }

    #[test]
    fn code_block_carries_language_and_wrap() {
        let value = block_to_json(&BlockDescriptor::code("fn main() {}", 53));
        assert_eq!(value["code"]["style"], json!({ "language": 53, "wrap": false }));
        assert_eq!(
            value["code"]["elements"][0]["text_run"]["content"],
            json!("fn main() {}")
        );
    }

    #[test]
    fn list_and_link_runs() {
        let run = StyledRun {
            link: Some("https://example.com".into()),
            ..StyledRun::plain("site")
        };
        let block = BlockDescriptor::list_item(ListKind::Ordered, RunList::new(vec![run]));
        let value = block_to_json(&block);
        assert_eq!(value["block_type"], json!(13));
        assert_eq!(
            value["ordered"]["elements"][0]["text_run"]["text_element_style"]["link"]["url"],
            json!("https://example.com")
        );
    }

    #[test]
    fn equation_run_becomes_equation_element() {
        let runs = RunList::new(vec![StyledRun::equation("x^2")]);
        let elements = runs_to_elements(&runs);
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].equation.as_ref().map(|e| e.content.as_str()), Some("x^2"));
        assert!(elements[0].text_run.is_none());
    }

    #[test]
    fn table_request_gives_every_cell_one_element() {
        let spec = TableSpec::new(
            vec![
                vec![RunList::plain("a"), RunList::plain("b")],
                vec![RunList::plain("c"), RunList::empty()],
            ],
            vec![Align::Left, Align::Center],
            true,
        )
        .unwrap();
        let value = table_request(&spec, 4);

        assert_eq!(value["children_id"], json!(["table"]));
        assert_eq!(value["index"], json!(4));
        let descendants = value["descendants"].as_array().unwrap();
        assert_eq!(descendants.len(), 1 + 4 * 2);
        assert_eq!(
            descendants[0]["table"]["property"],
            json!({ "row_size": 2, "column_size": 2, "header_row": true })
        );

        let empty = descendants
            .iter()
            .find(|d| d["block_id"] == json!("cell_1_1_text"))
            .unwrap();
        assert_eq!(
            empty["text"]["elements"],
            json!([{ "text_run": { "content": "" } }])
        );
        assert_eq!(empty["text"]["style"]["align"], json!(2));
    }

    #[test]
    fn elements_decode_styles_and_mentions() {
        let elements: Vec<TextElement> = serde_json::from_value(json!([
            { "text_run": { "content": "a", "text_element_style": { "italic": true } } },
            { "equation": { "content": "E=mc^2\n" } },
            { "mention_doc": { "title": "Spec", "url": "https://x/doc" } },
            { "mention_user": { "user_id": "u1" } }
        ]))
        .unwrap();
        let runs = elements_to_runs(&elements);

        assert_eq!(runs.len(), 3);
        assert!(runs[0].italic);
        assert_eq!(runs[1].equation.as_deref(), Some("E=mc^2"));
        assert_eq!(runs[2].link.as_deref(), Some("https://x/doc"));
        assert_eq!(runs[2].text, "Spec");
    }
}
