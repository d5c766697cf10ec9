//! Typed metadata ("traits") attached to uploaded canvases and images
//!
//! The destination workspace stores arbitrary traits on elements, keyed by
//! URI. This crate only ever writes and reads a fixed set of keys, and some
//! of them only make sense on one kind of element.

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;

const TRAIT_NAMESPACE: &str = "http://canvas-uploader.dev/sd-webui/v1/";

/// Element kinds that carry traits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Canvas,
    Image,
}

/// Recognized trait keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TraitKey {
    /// Marks an element as created by this tool; its presence is the placement tag
    Enabled,
    /// Batch-level generation parameters (canvases)
    Processed,
    /// Per-image generation parameters (images)
    Postprocess,
    UploadId,
    UserId,
}

impl TraitKey {
    pub const ALL: [TraitKey; 5] = [
        Self::Enabled,
        Self::Processed,
        Self::Postprocess,
        Self::UploadId,
        Self::UserId,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Processed => "processed",
            Self::Postprocess => "postprocess",
            Self::UploadId => "uploadId",
            Self::UserId => "userId",
        }
    }

    /// Full URI used as the trait key on the wire
    pub fn uri(&self) -> String {
        format!("{}{}", TRAIT_NAMESPACE, self.suffix())
    }

    /// Look up a key by its wire URI
    pub fn from_uri(uri: &str) -> Option<TraitKey> {
        let suffix = uri.strip_prefix(TRAIT_NAMESPACE)?;
        Self::ALL.into_iter().find(|key| key.suffix() == suffix)
    }

    pub fn allowed_on(&self, kind: EntityKind) -> bool {
        match self {
            Self::Processed => kind == EntityKind::Canvas,
            Self::Postprocess => kind == EntityKind::Image,
            Self::Enabled | Self::UploadId | Self::UserId => true,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("trait '{key:?}' is not allowed on {kind:?} elements")]
pub struct TraitError {
    pub key: TraitKey,
    pub kind: EntityKind,
}

/// Generation parameters recorded in the metadata traits
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationParams {
    pub prompt: String,
    pub negative_prompt: String,
    pub width: u32,
    pub height: u32,
    pub sampler_name: String,
    pub cfg_scale: f64,
    pub steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub denoising_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subseed_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sd_model_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clip_skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restore_faces: Option<bool>,
    pub all_seeds: Vec<i64>,
    pub all_subseeds: Vec<i64>,
}

#[derive(Serialize)]
struct CanvasPayload<'a> {
    #[serde(rename = "type")]
    generation_type: &'a str,
    #[serde(flatten)]
    params: &'a GenerationParams,
    num_images: usize,
    upload_id: &'a str,
}

#[derive(Serialize)]
struct ImagePayload<'a> {
    #[serde(rename = "type")]
    generation_type: &'a str,
    prompt: &'a str,
    negative_prompt: &'a str,
    seed: &'a str,
    subseed: &'a str,
    infotext: &'a str,
    width: u32,
    height: u32,
    sampler_name: &'a str,
    cfg_scale: f64,
    steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    subseed_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    denoising_strength: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sd_model_hash: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    clip_skip: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    restore_faces: Option<bool>,
    upload_id: &'a str,
}

/// Identity of the batch an element belongs to
#[derive(Debug, Clone, Copy)]
pub struct BatchIdentity<'a> {
    pub upload_id: &'a str,
    pub user_id: &'a str,
    pub generation_type: &'a str,
    pub metadata_enabled: bool,
}

/// Per-image values recorded on image elements
#[derive(Debug, Clone, Copy)]
pub struct ImageIdentity<'a> {
    pub seed: &'a str,
    pub subseed: &'a str,
    pub infotext: &'a str,
}

/// A set of traits for one element, restricted to the keys its kind allows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraitSet {
    kind: EntityKind,
    values: BTreeMap<TraitKey, String>,
}

impl TraitSet {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            values: BTreeMap::new(),
        }
    }

    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    /// Set a trait, rejecting keys that do not belong on this element kind
    pub fn insert(&mut self, key: TraitKey, value: impl Into<String>) -> Result<(), TraitError> {
        if !key.allowed_on(self.kind) {
            return Err(TraitError {
                key,
                kind: self.kind,
            });
        }
        self.values.insert(key, value.into());
        Ok(())
    }

    pub fn get(&self, key: TraitKey) -> Option<&str> {
        self.values.get(&key).map(|s| s.as_str())
    }

    pub fn contains(&self, key: TraitKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraitKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Traits for a batch canvas
    pub fn for_canvas(
        batch: BatchIdentity<'_>,
        params: &GenerationParams,
        num_images: usize,
    ) -> Self {
        let mut set = Self::new(EntityKind::Canvas);
        set.fill_identity(batch);
        if batch.metadata_enabled {
            let payload = CanvasPayload {
                generation_type: batch.generation_type,
                params,
                num_images,
                upload_id: batch.upload_id,
            };
            set.values.insert(TraitKey::Processed, to_json(&payload));
        }
        set
    }

    /// Traits for one uploaded image
    pub fn for_image(
        batch: BatchIdentity<'_>,
        params: &GenerationParams,
        image: ImageIdentity<'_>,
    ) -> Self {
        let mut set = Self::new(EntityKind::Image);
        set.fill_identity(batch);
        if batch.metadata_enabled {
            let payload = ImagePayload {
                generation_type: batch.generation_type,
                prompt: &params.prompt,
                negative_prompt: &params.negative_prompt,
                seed: image.seed,
                subseed: image.subseed,
                infotext: image.infotext,
                width: params.width,
                height: params.height,
                sampler_name: &params.sampler_name,
                cfg_scale: params.cfg_scale,
                steps: params.steps,
                subseed_strength: params.subseed_strength,
                denoising_strength: params.denoising_strength,
                sd_model_hash: params.sd_model_hash.as_deref(),
                clip_skip: params.clip_skip,
                restore_faces: params.restore_faces,
                upload_id: batch.upload_id,
            };
            set.values.insert(TraitKey::Postprocess, to_json(&payload));
        }
        set
    }

    fn fill_identity(&mut self, batch: BatchIdentity<'_>) {
        self.values
            .insert(TraitKey::Enabled, batch.metadata_enabled.to_string());
        self.values
            .insert(TraitKey::UserId, batch.user_id.to_string());
        if batch.metadata_enabled {
            self.values
                .insert(TraitKey::UploadId, batch.upload_id.to_string());
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> String {
    // Plain structs of strings and numbers always serialize
    serde_json::to_string(value).unwrap_or_default()
}
