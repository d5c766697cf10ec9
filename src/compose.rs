//! Canvas content composition for an upload batch
//!
//! Turns a batch of generated images into remote element creations: the
//! canvas first, then its title and generation data, then every image
//! followed by its label. The destination stacks later elements on top of
//! earlier ones, so this order is kept exactly.

use crate::error::RemoteError;
use crate::layout::{GridLayout, ImageSize};
use crate::metadata::{BatchIdentity, GenerationParams, ImageIdentity, TraitSet};
use crate::placement::{Placement, PlacementNegotiator};
use crate::remote::{CanvasService, ElementId, NewCanvas, NewImage, TextBlock};
use crate::settings::{CanvasHeaderStrategy, CanvasTitleStrategy, ServiceConfig, UploadSettings};
use crate::UploadError;

const DEFAULT_HEADER: &str = "Automatic1111";
const DEFAULT_TITLE_PREFIX: &str = "A1111";

/// How the images of a batch were generated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationType {
    Txt2Img,
    Img2Img,
}

impl GenerationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Txt2Img => "txt2img",
            Self::Img2Img => "img2img",
        }
    }
}

/// One generated image with its seeds
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub png: Vec<u8>,
    pub seed: String,
    pub subseed: String,
    pub infotext: String,
}

/// Everything needed to upload one generation run
#[derive(Debug, Clone)]
pub struct UploadBatch {
    pub generation_type: GenerationType,
    pub prompt: String,
    pub params: GenerationParams,
    /// Infotexts of the generated images; the first one fills the data panel
    pub infotexts: Vec<String>,
    /// Extra parameters shown in verbose mode
    pub extended_data: Vec<(String, String)>,
    /// Size of the generated images
    pub image_size: ImageSize,
    /// img2img inputs, uploaded ahead of the results when enabled
    pub source_images: Vec<Vec<u8>>,
    pub mask: Option<Vec<u8>>,
    pub generated: Vec<GeneratedImage>,
    /// Display timestamp for the timestamp title strategies
    pub timestamp: String,
}

/// Role of an image within the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ImageRole<'a> {
    Source { index: usize },
    Mask,
    Generated(&'a GeneratedImage),
}

impl ImageRole<'_> {
    pub fn filename(&self) -> String {
        match self {
            Self::Source { index } => format!("source-image_{}.png", index),
            Self::Mask => "image_mask.png".to_string(),
            Self::Generated(image) => format!("{}-{}.png", image.seed, image.subseed),
        }
    }

    fn identity(&self) -> ImageIdentity<'_> {
        match self {
            Self::Source { .. } => ImageIdentity {
                seed: "source_image",
                subseed: "unknown",
                infotext: "source_image",
            },
            Self::Mask => ImageIdentity {
                seed: "image_mask",
                subseed: "unknown",
                infotext: "image_mask",
            },
            Self::Generated(image) => ImageIdentity {
                seed: &image.seed,
                subseed: &image.subseed,
                infotext: &image.infotext,
            },
        }
    }
}

/// An image queued for upload, in canvas order
#[derive(Debug, Clone, Copy)]
pub struct PlannedImage<'a> {
    pub role: ImageRole<'a>,
    pub png: &'a [u8],
}

/// Order the images of a batch as they appear on the canvas
///
/// Source images come first, then the mask, then the generated images.
/// Inputs are only included for img2img batches and when enabled.
pub fn plan_images<'a>(batch: &'a UploadBatch, settings: &UploadSettings) -> Vec<PlannedImage<'a>> {
    let mut planned = Vec::new();
    let img2img = batch.generation_type == GenerationType::Img2Img;

    if img2img && settings.include_init_images {
        let sources = batch.source_images.iter().enumerate();
        planned.extend(sources.map(|(index, png)| PlannedImage {
            role: ImageRole::Source { index },
            png: png.as_slice(),
        }));
    }
    if img2img && settings.include_mask_image {
        if let Some(mask) = &batch.mask {
            planned.push(PlannedImage {
                role: ImageRole::Mask,
                png: mask.as_slice(),
            });
        }
    }
    planned.extend(batch.generated.iter().map(|image| PlannedImage {
        role: ImageRole::Generated(image),
        png: image.png.as_slice(),
    }));
    planned
}

/// Name of the canvas element
pub fn canvas_name(settings: &UploadSettings, batch: &UploadBatch) -> String {
    match settings.title {
        CanvasTitleStrategy::Default => format!("{} | {}", DEFAULT_TITLE_PREFIX, batch.prompt),
        CanvasTitleStrategy::GenerationMode => batch.generation_type.as_str().to_string(),
        CanvasTitleStrategy::Username => settings.nickname.clone(),
        CanvasTitleStrategy::Timestamp => batch.timestamp.clone(),
    }
}

/// Header and title text of the title row inside the canvas
pub fn header_and_title(settings: &UploadSettings, batch: &UploadBatch) -> (String, String) {
    let header = match settings.header {
        CanvasHeaderStrategy::Default => DEFAULT_HEADER.to_string(),
        CanvasHeaderStrategy::GenerationMode => batch.generation_type.as_str().to_string(),
        CanvasHeaderStrategy::Username => settings.nickname.clone(),
        CanvasHeaderStrategy::Timestamp => batch.timestamp.clone(),
    };
    (header, batch.prompt.clone())
}

/// Result of a completed upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub upload_id: String,
    pub canvas_id: ElementId,
    pub placement: Placement,
    /// Image elements in canvas order
    pub image_ids: Vec<ElementId>,
}

impl UploadReport {
    /// Browser link opening the workspace on the new canvas
    pub fn canvas_link(&self, config: &ServiceConfig, workspace_id: &str) -> String {
        config.element_link(workspace_id, &self.canvas_id.0)
    }
}

/// Uploads batches into one workspace
pub struct Uploader<'a, S: CanvasService + ?Sized> {
    service: &'a mut S,
    settings: &'a UploadSettings,
    user_id: String,
}

impl<'a, S: CanvasService + ?Sized> Uploader<'a, S> {
    pub fn new(
        service: &'a mut S,
        settings: &'a UploadSettings,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            service,
            settings,
            user_id: user_id.into(),
        }
    }

    /// Upload a batch under a fresh upload id
    pub fn upload(&mut self, batch: &UploadBatch) -> Result<UploadReport, UploadError> {
        let upload_id = uuid::Uuid::new_v4().to_string();
        self.upload_with_id(batch, &upload_id)
    }

    /// Upload a batch under the given upload id
    ///
    /// An expired authorization aborts the rest of the batch; elements
    /// created before the failure stay in the workspace.
    pub fn upload_with_id(
        &mut self,
        batch: &UploadBatch,
        upload_id: &str,
    ) -> Result<UploadReport, UploadError> {
        log::info!("uploading images (upload_id: {})", upload_id);

        let settings = self.settings;
        let user_id = self.user_id.clone();
        let images = plan_images(batch, settings);
        let image_size = if settings.scale_to_standard_size {
            ImageSize::standard()
        } else {
            batch.image_size
        };

        let mut layout = GridLayout::new(images.len(), image_size, settings.verbose)?;

        let negotiator = PlacementNegotiator::new(settings.swimlane, user_id.as_str());
        let placement = negotiator.negotiate(&mut *self.service, layout.canvas_bounds())?;
        layout.translate(&placement.target);

        let identity = BatchIdentity {
            upload_id,
            user_id: &user_id,
            generation_type: batch.generation_type.as_str(),
            metadata_enabled: settings.metadata,
        };

        let canvas_id = self.service.create_canvas(&NewCanvas {
            title: layout.canvas_title(&canvas_name(settings, batch)),
            bounds: layout.canvas_bounds(),
            traits: TraitSet::for_canvas(identity, &batch.params, images.len()),
            border_color: settings.canvas_border_color(),
        })?;

        self.create_text_blocks(&layout, batch, upload_id)?;

        let mut image_ids = Vec::with_capacity(images.len());
        let slots = layout.image_bounds().into_iter().zip(layout.label_bounds());
        for (i, (image, (bounds, label_bounds))) in images.iter().zip(slots).enumerate() {
            log::info!(
                "Uploading image: {} / {} (upload_id: {})",
                i + 1,
                images.len(),
                upload_id
            );
            let uploaded = self.service.upload_image(&NewImage {
                filename: image.role.filename(),
                png: image.png,
                bounds,
                traits: TraitSet::for_image(identity, &batch.params, image.role.identity()),
            });
            let id = uploaded.inspect_err(|e| log_abort(e, i, upload_id))?;
            image_ids.push(id);

            let label = match image.role {
                ImageRole::Source { .. } => TextBlock::Label {
                    bounds: label_bounds,
                    text: "Source image".to_string(),
                },
                ImageRole::Mask => TextBlock::Label {
                    bounds: label_bounds,
                    text: "Image mask".to_string(),
                },
                ImageRole::Generated(generated) => TextBlock::SeedLabel {
                    bounds: label_bounds,
                    seed: generated.seed.clone(),
                    subseed: generated.subseed.clone(),
                },
            };
            self.service.create_text_block(&label)?;
        }

        log::info!("upload complete (upload_id: {})", upload_id);
        Ok(UploadReport {
            upload_id: upload_id.to_string(),
            canvas_id,
            placement,
            image_ids,
        })
    }

    fn create_text_blocks(
        &mut self,
        layout: &GridLayout,
        batch: &UploadBatch,
        upload_id: &str,
    ) -> Result<(), RemoteError> {
        let (header, title) = header_and_title(self.settings, batch);
        self.service.create_text_block(&TextBlock::TopTitle {
            location: layout.top_title_location(),
            header,
            title: layout.top_title(&title),
        })?;

        self.service.create_text_block(&TextBlock::GenerationData {
            location: layout.generation_data_location(),
            infotext: batch.infotexts.first().cloned().unwrap_or_default(),
        })?;
        self.service.create_text_block(&TextBlock::GenerationLabel {
            location: layout.generation_data_label_location(),
            text: format!("Generation data ({}):", batch.generation_type.as_str()),
        })?;

        if layout.is_verbose() {
            let mut entries = batch.extended_data.clone();
            entries.push(("Upload id".to_string(), upload_id.to_string()));
            self.service.create_text_block(&TextBlock::ExtendedData {
                location: layout.bottom_infobar_location(),
                entries,
            })?;
            self.service.create_text_block(&TextBlock::GenerationLabel {
                location: layout.extended_data_label_location(),
                text: "Extended generation data:".to_string(),
            })?;
        }
        Ok(())
    }
}

fn log_abort(error: &RemoteError, uploaded: usize, upload_id: &str) {
    if error.is_authorization_expired() {
        log::warn!(
            "authorization expired after {} images, aborting batch (upload_id: {})",
            uploaded,
            upload_id
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::testing::{Call, RecordingService};
    use pretty_assertions::assert_eq;

    fn generated(seed: &str) -> GeneratedImage {
        GeneratedImage {
            png: vec![0x89, b'P', b'N', b'G'],
            seed: seed.to_string(),
            subseed: "0".to_string(),
            infotext: format!("a cat\nSteps: 20, Seed: {}", seed),
        }
    }

    fn batch(generation_type: GenerationType, count: usize) -> UploadBatch {
        UploadBatch {
            generation_type,
            prompt: "a cat".to_string(),
            params: GenerationParams::default(),
            infotexts: (0..count)
                .map(|i| format!("a cat\nSteps: 20, Seed: {}", i))
                .collect(),
            extended_data: vec![("ETA".to_string(), "0".to_string())],
            image_size: ImageSize::new(512, 512),
            source_images: vec![vec![1], vec![2]],
            mask: Some(vec![3]),
            generated: (0..count).map(|i| generated(&i.to_string())).collect(),
            timestamp: "2023-07-06 10:35:41".to_string(),
        }
    }

    #[test]
    fn test_plan_txt2img_ignores_inputs() {
        let settings = UploadSettings {
            include_mask_image: true,
            ..UploadSettings::default()
        };
        let b = batch(GenerationType::Txt2Img, 2);
        let names: Vec<String> = plan_images(&b, &settings)
            .iter()
            .map(|p| p.role.filename())
            .collect();
        assert_eq!(names, vec!["0-0.png", "1-0.png"]);
    }

    #[test]
    fn test_plan_img2img_order() {
        let settings = UploadSettings {
            include_mask_image: true,
            ..UploadSettings::default()
        };
        let b = batch(GenerationType::Img2Img, 1);
        let names: Vec<String> = plan_images(&b, &settings)
            .iter()
            .map(|p| p.role.filename())
            .collect();
        assert_eq!(
            names,
            vec![
                "source-image_0.png",
                "source-image_1.png",
                "image_mask.png",
                "0-0.png"
            ]
        );
    }

    #[test]
    fn test_plan_img2img_without_inputs() {
        let settings = UploadSettings {
            include_init_images: false,
            ..UploadSettings::default()
        };
        let b = batch(GenerationType::Img2Img, 3);
        assert_eq!(plan_images(&b, &settings).len(), 3);
    }

    #[test]
    fn test_title_strategies() {
        let b = batch(GenerationType::Img2Img, 1);
        let mut settings = UploadSettings {
            nickname: "Ada".to_string(),
            ..UploadSettings::default()
        };
        assert_eq!(canvas_name(&settings, &b), "A1111 | a cat");
        settings.title = CanvasTitleStrategy::GenerationMode;
        assert_eq!(canvas_name(&settings, &b), "img2img");
        settings.title = CanvasTitleStrategy::Username;
        assert_eq!(canvas_name(&settings, &b), "Ada");
        settings.title = CanvasTitleStrategy::Timestamp;
        assert_eq!(canvas_name(&settings, &b), "2023-07-06 10:35:41");
    }

    #[test]
    fn test_header_strategies() {
        let b = batch(GenerationType::Txt2Img, 1);
        let mut settings = UploadSettings::default();
        assert_eq!(
            header_and_title(&settings, &b),
            ("Automatic1111".to_string(), "a cat".to_string())
        );
        settings.header = CanvasHeaderStrategy::GenerationMode;
        assert_eq!(header_and_title(&settings, &b).0, "txt2img");
        settings.header = CanvasHeaderStrategy::Timestamp;
        assert_eq!(header_and_title(&settings, &b).0, "2023-07-06 10:35:41");
    }

    #[test]
    fn test_upload_call_order() {
        let mut service = RecordingService::new();
        let settings = UploadSettings::default();
        let b = batch(GenerationType::Txt2Img, 2);

        let report = Uploader::new(&mut service, &settings, "me")
            .upload_with_id(&b, "upload-1")
            .unwrap();

        let kinds: Vec<&str> = service
            .calls
            .iter()
            .map(|c| match c {
                Call::ListCanvases => "list",
                Call::FindFreeArea(_) => "find",
                Call::CreateCanvas(_) => "canvas",
                Call::CreateText(TextBlock::TopTitle { .. }) => "title",
                Call::CreateText(TextBlock::GenerationData { .. }) => "data",
                Call::CreateText(TextBlock::GenerationLabel { .. }) => "data-label",
                Call::CreateText(TextBlock::ExtendedData { .. }) => "extended",
                Call::CreateText(TextBlock::SeedLabel { .. }) => "seed",
                Call::CreateText(TextBlock::Label { .. }) => "label",
                Call::UploadImage { .. } => "image",
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                "list",
                "find",
                "canvas",
                "title",
                "data",
                "data-label",
                "image",
                "seed",
                "image",
                "seed"
            ]
        );
        assert_eq!(report.upload_id, "upload-1");
        assert_eq!(report.image_ids.len(), 2);
    }

    #[test]
    fn test_verbose_adds_extended_data() {
        let mut service = RecordingService::new();
        let settings = UploadSettings {
            verbose: true,
            ..UploadSettings::default()
        };
        let b = batch(GenerationType::Txt2Img, 1);

        Uploader::new(&mut service, &settings, "me")
            .upload_with_id(&b, "upload-2")
            .unwrap();

        let extended = service.calls.iter().find_map(|c| match c {
            Call::CreateText(TextBlock::ExtendedData { entries, .. }) => Some(entries.clone()),
            _ => None,
        });
        assert_eq!(
            extended,
            Some(vec![
                ("ETA".to_string(), "0".to_string()),
                ("Upload id".to_string(), "upload-2".to_string()),
            ])
        );
    }

    #[test]
    fn test_empty_batch_makes_no_remote_calls() {
        let mut service = RecordingService::new();
        let settings = UploadSettings::default();
        let b = batch(GenerationType::Txt2Img, 0);

        let err = Uploader::new(&mut service, &settings, "me")
            .upload_with_id(&b, "u")
            .unwrap_err();

        assert!(matches!(err, UploadError::Layout(_)));
        assert!(service.calls.is_empty());
    }

    #[test]
    fn test_expiry_mid_batch_keeps_earlier_elements() {
        let mut service = RecordingService {
            expire_after_images: Some(1),
            ..Default::default()
        };
        let settings = UploadSettings::default();
        let b = batch(GenerationType::Txt2Img, 3);

        let err = Uploader::new(&mut service, &settings, "me")
            .upload_with_id(&b, "u")
            .unwrap_err();

        assert!(err.is_authorization_expired());
        let uploaded = service
            .calls
            .iter()
            .filter(|c| matches!(c, Call::UploadImage { .. }))
            .count();
        assert_eq!(uploaded, 1);
        assert!(matches!(
            service.calls.last(),
            Some(Call::CreateText(TextBlock::SeedLabel { .. }))
        ));
    }

    #[test]
    fn test_report_link() {
        let mut service = RecordingService::new();
        let settings = UploadSettings::default();
        let report = Uploader::new(&mut service, &settings, "me")
            .upload_with_id(&batch(GenerationType::Txt2Img, 1), "u")
            .unwrap();
        let config = ServiceConfig {
            client_base_url: "https://client.example.com".to_string(),
            ..ServiceConfig::default()
        };
        assert_eq!(
            report.canvas_link(&config, "ws"),
            "https://client.example.com/applink/ws?objectId=el-1"
        );
    }
}
