//! JSON request bodies for element creation

use serde_json::{json, Map, Value};

use crate::color::{self, Rgba};
use crate::infotext::{parse_infotext, InfoLine};
use crate::layout::TextLocation;
use crate::metadata::{TraitKey, TraitSet};

use super::{NewCanvas, NewImage, PlacementRequest, TextBlock};

const FONT_FAMILY: &str = "Source_Sans_Pro";
const TITLE_FONT_SIZE: u32 = 63;
const DATA_FONT_SIZE: u32 = 32;
const LABEL_FONT_SIZE: u32 = 24;

/// Separator between the header and the title text in the top title
const TITLE_SEPARATOR: &str = "  |  ";

fn traits_body(traits: &TraitSet) -> Value {
    let content: Map<String, Value> = traits
        .iter()
        .map(|(key, value)| {
            let value = match key {
                TraitKey::Enabled => Value::Bool(value == "true"),
                _ => Value::String(value.to_string()),
            };
            (key.uri(), value)
        })
        .collect();
    json!({ "content": content })
}

pub fn find_free_area(request: &PlacementRequest) -> Value {
    let area = request.proposed;
    json!({
        "direction": request.direction,
        "proposedArea": {
            "x": area.x,
            "y": area.y,
            "width": area.width,
            "height": area.height
        }
    })
}

pub fn canvas(canvas: &NewCanvas) -> Value {
    json!({
        "type": "Canvas",
        "name": canvas.title,
        "style": {
            "width": canvas.bounds.width,
            "height": canvas.bounds.height,
            "fillColor": color::WHITE,
            "borderColor": canvas.border_color,
            "showName": true
        },
        "transform": { "x": canvas.bounds.x, "y": canvas.bounds.y },
        "traits": traits_body(&canvas.traits)
    })
}

/// Image element created before its pixels are uploaded
pub fn image(image: &NewImage<'_>) -> Value {
    json!({
        "type": "Image",
        "imageFormat": "png",
        "title": image.filename,
        "filename": image.filename,
        "width": image.bounds.width,
        "height": image.bounds.height,
        "transform": { "x": image.bounds.x, "y": image.bounds.y },
        "traits": traits_body(&image.traits)
    })
}

fn span(text: impl Into<String>) -> Value {
    json!({ "span": { "text": text.into() } })
}

fn bold(text: impl Into<String>) -> Value {
    json!({ "span": { "fontWeight": "bold", "text": text.into() } })
}

fn block(content: Vec<Value>) -> Value {
    json!({ "block": { "content": content } })
}

fn key_value_spans(entries: &[(String, String)]) -> Vec<Value> {
    entries
        .iter()
        .flat_map(|(key, value)| [bold(format!("{}: ", key)), span(format!("{}, ", value))])
        .collect()
}

fn text_element(
    blocks: Vec<Value>,
    location: TextLocation,
    font_size: u32,
    background: Rgba,
    color: Rgba,
) -> Value {
    json!({
        "type": "Text",
        "blocks": blocks,
        "style": {
            "fontFamily": FONT_FAMILY,
            "fontSize": font_size,
            "width": location.width,
            "backgroundColor": background,
            "color": color,
            "verticalAlign": "top"
        },
        "transform": { "x": location.x, "y": location.y }
    })
}

fn infotext_blocks(infotext: &str) -> Vec<Value> {
    parse_infotext(infotext)
        .into_iter()
        .map(|line| match line {
            InfoLine::NegativePrompt(value) => block(vec![bold("Negative prompt: "), span(value)]),
            InfoLine::Parameters(pairs) => block(key_value_spans(&pairs)),
            InfoLine::Plain(text) => block(vec![span(text)]),
        })
        .collect()
}

pub fn text_block(text: &TextBlock) -> Value {
    let location = text.location();
    match text {
        TextBlock::TopTitle { header, title, .. } => {
            let title = json!({
                "span": {
                    "color": color::CHARCOAL_50,
                    "text": format!("{}{}", TITLE_SEPARATOR, title)
                }
            });
            let content = vec![json!({ "text": header }), title];
            text_element(
                vec![block(content)],
                location,
                TITLE_FONT_SIZE,
                color::TRANSPARENT,
                color::CHARCOAL_100,
            )
        }
        TextBlock::GenerationData { infotext, .. } => text_element(
            infotext_blocks(infotext),
            location,
            DATA_FONT_SIZE,
            color::LIGHT_BLUE,
            color::CHARCOAL_90,
        ),
        TextBlock::ExtendedData { entries, .. } => text_element(
            vec![block(key_value_spans(entries))],
            location,
            DATA_FONT_SIZE,
            color::LIGHT_BLUE,
            color::CHARCOAL_90,
        ),
        TextBlock::GenerationLabel { text, .. } => text_element(
            vec![block(vec![bold(text.as_str())])],
            location,
            DATA_FONT_SIZE,
            color::TRANSPARENT,
            color::CHARCOAL_90,
        ),
        TextBlock::SeedLabel { seed, subseed, .. } => {
            let content = vec![
                bold("Seed: "),
                span(seed.as_str()),
                json!({
                    "span": { "fontStyle": "italic", "text": format!(" (sub: {})", subseed) }
                }),
            ];
            text_element(
                vec![block(content)],
                location,
                LABEL_FONT_SIZE,
                color::LIGHT_BLUE,
                color::CHARCOAL_90,
            )
        }
        TextBlock::Label { text, .. } => text_element(
            vec![block(vec![bold(text.as_str())])],
            location,
            LABEL_FONT_SIZE,
            color::SOFT_YELLOW,
            color::CHARCOAL_90,
        ),
    }
}
