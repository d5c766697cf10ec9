//! Remote canvas service collaborator
//!
//! Everything the upload pipeline needs from the destination workspace goes
//! through [`CanvasService`]. [`http::HttpCanvasService`] talks to the real
//! REST API; tests substitute an in-memory recorder.

pub mod body;
pub mod http;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::color::Rgba;
use crate::error::RemoteError;
use crate::layout::{BoundingBox, Point, TextLocation};
use crate::metadata::{EntityKind, TraitKey, TraitSet};
use crate::placement::Direction;

pub use http::HttpCanvasService;

/// Workspace listing stops after this many pages
pub const MAX_WORKSPACE_PAGES: usize = 3;

/// Identifier of an element created in the workspace
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ElementId(pub String);

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of an existing canvas, ordered the way the service issues them
///
/// Numeric ids compare numerically and text ids lexically. A numeric id
/// sorts below every text id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CanvasId {
    Number(i64),
    Text(String),
}

impl CanvasId {
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(match n.as_i64() {
                Some(n) => Self::Number(n),
                None => Self::Text(n.to_string()),
            }),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl Ord for CanvasId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use std::cmp::Ordering;
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.cmp(b),
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for CanvasId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl From<&str> for CanvasId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl From<i64> for CanvasId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl std::fmt::Display for CanvasId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

/// Ask the service for free space near a proposed area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementRequest {
    pub proposed: BoundingBox,
    pub direction: Direction,
}

impl PlacementRequest {
    pub fn new(proposed: BoundingBox, direction: Direction) -> Self {
        Self {
            proposed,
            direction,
        }
    }
}

/// An existing canvas in the workspace, read only to locate prior placements
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasRecord {
    pub id: Option<CanvasId>,
    pub transform: Option<Point>,
    pub traits: TraitSet,
}

impl CanvasRecord {
    pub fn new(id: Option<CanvasId>, transform: Option<Point>, traits: TraitSet) -> Self {
        Self {
            id,
            transform,
            traits,
        }
    }

    /// Build a record from an element as returned by the service
    ///
    /// Missing fields are kept as `None`; recognized trait keys are picked up
    /// wherever they appear inside the element.
    pub fn from_json(element: &Value) -> Self {
        let id = element.get("id").and_then(CanvasId::from_json);
        let transform = element.get("transform").and_then(|t| {
            let x = t.get("x").and_then(as_coordinate)?;
            let y = t.get("y").and_then(as_coordinate)?;
            Some(Point::new(x, y))
        });

        let mut traits = TraitSet::new(EntityKind::Canvas);
        collect_traits(element, &mut traits);

        Self::new(id, transform, traits)
    }

    /// Whether this canvas carries the placement tag of this tool
    pub fn is_tagged(&self) -> bool {
        self.traits.contains(TraitKey::Enabled)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.traits.get(TraitKey::UserId)
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn as_coordinate(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().map(|f| f.round() as i64))
}

fn collect_traits(value: &Value, traits: &mut TraitSet) {
    match value {
        Value::Object(map) => {
            for (key, inner) in map {
                if let Some(trait_key) = TraitKey::from_uri(key) {
                    if let Some(text) = scalar_to_string(inner) {
                        // Keys outside the canvas set are simply not recorded
                        let _ = traits.insert(trait_key, text);
                        continue;
                    }
                }
                collect_traits(inner, traits);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_traits(item, traits);
            }
        }
        _ => {}
    }
}

/// A canvas to create
#[derive(Debug, Clone, PartialEq)]
pub struct NewCanvas {
    pub title: String,
    pub bounds: BoundingBox,
    pub traits: TraitSet,
    pub border_color: Rgba,
}

/// An image to upload
#[derive(Debug, Clone, PartialEq)]
pub struct NewImage<'a> {
    pub filename: String,
    pub png: &'a [u8],
    pub bounds: BoundingBox,
    pub traits: TraitSet,
}

/// Text elements placed on a batch canvas
#[derive(Debug, Clone, PartialEq)]
pub enum TextBlock {
    /// Title row: a header followed by the muted title text
    TopTitle {
        location: TextLocation,
        header: String,
        title: String,
    },
    /// The first image's infotext, with keys emphasized
    GenerationData {
        location: TextLocation,
        infotext: String,
    },
    /// Extra parameters shown in verbose mode
    ExtendedData {
        location: TextLocation,
        entries: Vec<(String, String)>,
    },
    /// Bold heading above a data block
    GenerationLabel { location: TextLocation, text: String },
    /// Seed and subseed under a generated image
    SeedLabel {
        bounds: BoundingBox,
        seed: String,
        subseed: String,
    },
    /// Short caption under a source image or mask
    Label { bounds: BoundingBox, text: String },
}

impl TextBlock {
    /// Anchor of the block in canvas space
    pub fn location(&self) -> TextLocation {
        match self {
            Self::TopTitle { location, .. }
            | Self::GenerationData { location, .. }
            | Self::ExtendedData { location, .. }
            | Self::GenerationLabel { location, .. } => *location,
            Self::SeedLabel { bounds, .. } | Self::Label { bounds, .. } => (*bounds).into(),
        }
    }
}

/// A workspace the user can upload into
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub name: String,
}

impl Workspace {
    /// Label shown when picking a workspace
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.id)
    }
}

/// Operations the upload pipeline needs from the destination workspace
///
/// Every call is a blocking network round trip. Any of them may fail with
/// [`RemoteError::AuthorizationExpired`].
pub trait CanvasService {
    /// All canvases in the workspace, with whatever recognized traits they carry
    fn list_tagged_canvases(&mut self) -> Result<Vec<CanvasRecord>, RemoteError>;

    /// Free area near `request.proposed`, searching along `request.direction`
    fn find_free_area(&mut self, request: &PlacementRequest) -> Result<BoundingBox, RemoteError>;

    fn create_canvas(&mut self, canvas: &NewCanvas) -> Result<ElementId, RemoteError>;

    fn create_text_block(&mut self, block: &TextBlock) -> Result<ElementId, RemoteError>;

    fn upload_image(&mut self, image: &NewImage<'_>) -> Result<ElementId, RemoteError>;
}

/// Follow an opaque cursor through a paged listing
///
/// `fetch` receives the cursor of the page to load (`None` for the first)
/// and returns the page's items plus the next cursor. Stops when no cursor
/// is returned or after `max_pages` pages.
pub fn collect_pages<T, F>(max_pages: usize, mut fetch: F) -> Result<Vec<T>, RemoteError>
where
    F: FnMut(Option<&str>) -> Result<(Vec<T>, Option<String>), RemoteError>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;

    for page in 1..=max_pages {
        let (batch, next) = fetch(cursor.as_deref())?;
        items.extend(batch);
        log::debug!("loaded page {} of at most {}", page, max_pages);
        match next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }

    Ok(items)
}
