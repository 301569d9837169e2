//! CLIP encoder adapter.
//!
//! Runs the CLIP vision and text towers locally via candle. Weights and
//! tokenizer are fetched from the HuggingFace hub on first use and
//! cached. Images are accepted as local paths or HTTP(S) URLs.

use async_trait::async_trait;
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use tokenizers::Tokenizer;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::encoder::{effective_text, fuse_normalized, l2_normalize, Encoder};

/// CLIP encoder running on CPU.
///
/// Text and image embeddings are each L2-normalized; when both inputs
/// are present they are fused by elementwise addition and
/// renormalization.
pub struct ClipEncoder {
    model: ClipModel,
    tokenizer: Tokenizer,
    config: ClipConfig,
    device: Device,
    dimension: usize,
    http: reqwest::Client,
}

impl ClipEncoder {
    /// Load the model and tokenizer from the HuggingFace hub.
    ///
    /// Downloads on first use; subsequent constructions hit the local
    /// hub cache.
    pub fn new(model_id: &str, revision: &str, dimension: usize) -> DomainResult<Self> {
        let device = Device::Cpu;

        let api = hf_hub::api::sync::Api::new()
            .map_err(|e| DomainError::Backend(format!("Failed to initialize hub client: {e}")))?;
        let repo = api.repo(hf_hub::Repo::with_revision(
            model_id.to_string(),
            hf_hub::RepoType::Model,
            revision.to_string(),
        ));

        let weights_path = repo.get("model.safetensors").map_err(|e| {
            DomainError::Backend(format!("Failed to fetch weights for {model_id}: {e}"))
        })?;
        let tokenizer_path = repo.get("tokenizer.json").map_err(|e| {
            DomainError::Backend(format!("Failed to fetch tokenizer for {model_id}: {e}"))
        })?;

        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| DomainError::Backend(format!("Failed to load tokenizer: {e}")))?;

        let config = ClipConfig::vit_base_patch32();

        let tensors = candle_core::safetensors::load(&weights_path, &device)
            .map_err(|e| DomainError::Backend(format!("Failed to load weights: {e}")))?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let model = ClipModel::new(vb, &config)
            .map_err(|e| DomainError::Backend(format!("Failed to build CLIP model: {e}")))?;

        tracing::info!("Loaded CLIP model {model_id} (dimension {dimension})");

        Ok(Self {
            model,
            tokenizer,
            config,
            device,
            dimension,
            http: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .map_err(|e| DomainError::Backend(format!("Failed to build HTTP client: {e}")))?,
        })
    }

    /// Fetch an image from a URL or read it from a local path.
    async fn load_image(&self, source: &str) -> DomainResult<image::DynamicImage> {
        let bytes = if source.starts_with("http://") || source.starts_with("https://") {
            let response = self.http.get(source).send().await?;
            if !response.status().is_success() {
                return Err(DomainError::Backend(format!(
                    "Image fetch returned {} for {source}",
                    response.status()
                )));
            }
            response.bytes().await?.to_vec()
        } else {
            std::fs::read(source).map_err(|e| {
                DomainError::InvalidInput(format!("Failed to read image {source}: {e}"))
            })?
        };

        image::load_from_memory(&bytes)
            .map_err(|e| DomainError::InvalidInput(format!("Failed to decode image {source}: {e}")))
    }

    /// Run the vision tower on a decoded image.
    fn embed_image(&self, img: &image::DynamicImage) -> DomainResult<Vec<f32>> {
        let size = self.config.image_size;
        #[allow(clippy::cast_possible_truncation)]
        let resized = img
            .resize_to_fill(size as u32, size as u32, image::imageops::FilterType::Triangle)
            .to_rgb8()
            .into_raw();

        let pixels = Tensor::from_vec(resized, (size, size, 3), &self.device)
            .and_then(|t| t.permute((2, 0, 1)))
            .and_then(|t| t.to_dtype(DType::F32))
            .and_then(|t| t.affine(2.0 / 255.0, -1.0))
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| DomainError::Backend(format!("Image preprocessing failed: {e}")))?;

        let features = self
            .model
            .get_image_features(&pixels)
            .map_err(|e| DomainError::Backend(format!("CLIP vision forward failed: {e}")))?;

        self.to_unit_vector(&features)
    }

    /// Run the text tower on a snippet.
    fn embed_text(&self, text: &str) -> DomainResult<Vec<f32>> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| DomainError::Backend(format!("Tokenization failed: {e}")))?;

        let mut ids = encoding.get_ids().to_vec();
        ids.truncate(self.config.text_config.max_position_embeddings);

        let input = Tensor::new(ids.as_slice(), &self.device)
            .and_then(|t| t.unsqueeze(0))
            .map_err(|e| DomainError::Backend(format!("Token tensor construction failed: {e}")))?;

        let features = self
            .model
            .get_text_features(&input)
            .map_err(|e| DomainError::Backend(format!("CLIP text forward failed: {e}")))?;

        self.to_unit_vector(&features)
    }

    fn to_unit_vector(&self, features: &Tensor) -> DomainResult<Vec<f32>> {
        let mut vector = features
            .flatten_all()
            .and_then(|t| t.to_vec1::<f32>())
            .map_err(|e| DomainError::Backend(format!("Feature extraction failed: {e}")))?;
        l2_normalize(&mut vector);
        Ok(vector)
    }
}

#[async_trait]
impl Encoder for ClipEncoder {
    fn name(&self) -> &'static str {
        "clip"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn encode(&self, image: Option<&str>, text: Option<&str>) -> DomainResult<Vec<f32>> {
        let image = image.filter(|s| !s.is_empty());
        let text = effective_text(text);

        let image_features = match image {
            Some(source) => {
                let img = self.load_image(source).await?;
                Some(self.embed_image(&img)?)
            }
            None => None,
        };

        let text_features = match text {
            Some(snippet) => Some(self.embed_text(snippet)?),
            None => None,
        };

        match (image_features, text_features) {
            (Some(img), Some(txt)) => Ok(fuse_normalized(&img, &txt)),
            (Some(vector), None) | (None, Some(vector)) => Ok(vector),
            (None, None) => Err(DomainError::InvalidInput(
                "An image or non-blank text is required for encoding".to_string(),
            )),
        }
    }
}
