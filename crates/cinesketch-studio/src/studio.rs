//! The studio: every user-facing operation as a recipe over the provider layer.
//!
//! Multi-provider operations (sketch analysis, scene generation and editing)
//! build an ordered candidate list and hand it to the fallback chain.
//! Single-provider operations (voice, speech, ambience, edit planning) call
//! Gemini directly through the retrier.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};

use cinesketch_core::config::Config;
use cinesketch_core::utils::{strip_data_url, timestamp_millis};
use cinesketch_core::{InlineImage, ProviderError};
use cinesketch_providers::{
    extract_json, BackoffRetrier, Candidate, DoubaoClient, FallbackChain, GeminiClient, ImageGen,
    ImageRequest, OpenAiClient, Part, RetryPolicy, SpeechRequest, SpeechSynth, VisionChat,
    VisionRequest,
};

use crate::prompts;
use crate::results::{
    edit_plan_from_json, ideas_from_json, voice_from_json, AmbienceDescription, EditPlan,
    EditRequest, SceneImage, SceneRequest, SketchAnalysis, SpeechClip, VoiceRecommendation,
};

/// Model name that selects the Doubao text-to-image branch.
pub const DOUBAO_MODEL: &str = "doubao";

const ANALYZE_MAX_TOKENS: u32 = 2048;
const ANALYZE_TEMPERATURE: f64 = 0.7;
const EDIT_PLAN_TEMPERATURE: f64 = 0.7;
const SCENE_TEMPERATURE: f64 = 0.5;

/// Strip any `data:` prefix and wrap as an inline PNG.
fn inline(image: &str) -> InlineImage {
    InlineImage::png(strip_data_url(image.trim()))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────
// Studio
// ─────────────────────────────────────────────

/// Composition root for all generative operations.
///
/// Holds one client per configured provider. Stateless between calls, so a
/// single `Studio` can serve concurrent operations.
pub struct Studio {
    config: Config,
    chain: FallbackChain,
    gemini: Option<Arc<GeminiClient>>,
    doubao: Option<Arc<DoubaoClient>>,
    /// Doubao text-to-image, present only when the image endpoint is set.
    doubao_image: Option<Candidate<dyn ImageGen>>,
    openai: Option<Arc<OpenAiClient>>,
}

impl Studio {
    /// Build from config, retrying with the configured backoff.
    pub fn new(config: Config) -> Result<Self, ProviderError> {
        let policy = RetryPolicy::from(&config.retry);
        Self::with_policy(config, policy)
    }

    /// Build with an explicit retry policy.
    pub fn with_policy(config: Config, policy: RetryPolicy) -> Result<Self, ProviderError> {
        let providers = &config.providers;
        let timeouts = &config.timeouts;

        let gemini = if providers.gemini.is_configured() {
            Some(Arc::new(GeminiClient::new(&providers.gemini, timeouts)?))
        } else {
            None
        };
        let doubao = if providers.doubao.vision_configured() || providers.doubao.image_configured() {
            Some(Arc::new(DoubaoClient::new(&providers.doubao, timeouts)?))
        } else {
            None
        };
        let doubao_image = doubao
            .as_ref()
            .filter(|_| providers.doubao.image_configured())
            .map(|client| {
                let adapter: Arc<dyn ImageGen> = client.clone();
                Candidate::new(adapter, client.image_model())
            });
        let openai = if providers.openai.is_configured() {
            Some(Arc::new(OpenAiClient::new(&providers.openai, timeouts)?))
        } else {
            None
        };

        debug!(
            gemini = gemini.is_some(),
            doubao = doubao.is_some(),
            openai = openai.is_some(),
            max_retries = policy.max_retries,
            "Studio initialized"
        );

        Ok(Self {
            config,
            chain: FallbackChain::new(BackoffRetrier::new(policy)),
            gemini,
            doubao,
            doubao_image,
            openai,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn retrier(&self) -> &BackoffRetrier {
        self.chain.retrier()
    }

    fn gemini(&self) -> Result<&Arc<GeminiClient>, ProviderError> {
        self.gemini
            .as_ref()
            .ok_or_else(|| ProviderError::config("Gemini API key not configured"))
    }

    // ── candidate lists ──────────────────────────

    /// Doubao (if configured), then Gemini, then OpenAI as the last resort.
    pub fn vision_candidates(&self) -> Vec<Candidate<dyn VisionChat>> {
        let mut candidates = Vec::with_capacity(3);

        if let Some(doubao) = self.doubao.as_ref().filter(|_| self.config.providers.doubao.vision_configured()) {
            let adapter: Arc<dyn VisionChat> = doubao.clone();
            candidates.push(Candidate::new(adapter, doubao.chat_model()));
        }
        if let Some(gemini) = &self.gemini {
            let adapter: Arc<dyn VisionChat> = gemini.clone();
            candidates.push(Candidate::new(adapter, self.config.providers.gemini.analyze_model.as_str()));
        }
        if let Some(openai) = &self.openai {
            let adapter: Arc<dyn VisionChat> = openai.clone();
            candidates.push(Candidate::new(adapter, openai.default_model()));
        }

        candidates
    }

    /// Requested model, then the fallback and default image models, deduplicated.
    pub fn image_candidates(&self, requested: &str) -> Vec<Candidate<dyn ImageGen>> {
        let Some(gemini) = &self.gemini else {
            return Vec::new();
        };
        let cfg = &self.config.providers.gemini;
        let adapter: Arc<dyn ImageGen> = gemini.clone();

        let mut models: Vec<&str> = Vec::with_capacity(3);
        for model in [requested, cfg.image_fallback_model.as_str(), cfg.image_model.as_str()] {
            if !model.is_empty() && model != DOUBAO_MODEL && !models.contains(&model) {
                models.push(model);
            }
        }

        models
            .into_iter()
            .map(|m| Candidate::new(Arc::clone(&adapter), m))
            .collect()
    }

    fn doubao_image_candidate(&self) -> Result<Vec<Candidate<dyn ImageGen>>, ProviderError> {
        self.doubao_image
            .clone()
            .map(|candidate| vec![candidate])
            .ok_or_else(|| ProviderError::config("Doubao API key or image endpoint not configured"))
    }

    fn requested_image_model<'a>(&'a self, model: Option<&'a str>) -> &'a str {
        non_blank(model).unwrap_or(self.config.providers.gemini.image_model.as_str())
    }

    async fn run_image_chain(
        &self,
        operation: &str,
        candidates: &[Candidate<dyn ImageGen>],
        request: ImageRequest,
    ) -> Result<SceneImage, ProviderError> {
        let request = &request;
        let won = self
            .chain
            .run(operation, candidates, move |c| async move {
                c.adapter.generate(&c.model, request).await
            })
            .await?;

        info!(
            operation,
            candidate = %won.candidate_label,
            attempts = won.attempts,
            cost = %won.value.usage.estimated_cost,
            "Image ready"
        );
        Ok(SceneImage {
            image_url: won.value.image_url,
            model: won.model,
            usage: won.value.usage,
        })
    }

    // ── operations ───────────────────────────────

    /// Interpret a sketch as up to three cinematic scene ideas.
    pub async fn analyze_sketch(&self, image: &str) -> Result<SketchAnalysis, ProviderError> {
        let request = VisionRequest::new(vec![Part::text(prompts::ANALYZE_SKETCH), Part::image(inline(image))])
            .json()
            .max_tokens(ANALYZE_MAX_TOKENS)
            .temperature(ANALYZE_TEMPERATURE);
        let request = &request;

        let candidates = self.vision_candidates();
        let won = self
            .chain
            .run("analyze_sketch", &candidates, move |c| async move {
                let output = c.adapter.complete(&c.model, request).await?;
                let ideas = ideas_from_json(&extract_json(&output.text)?)?;
                Ok::<_, ProviderError>(SketchAnalysis {
                    ideas,
                    usage: output.usage,
                })
            })
            .await?;

        info!(
            candidate = %won.candidate_label,
            ideas = won.value.ideas.len(),
            cost = %won.value.usage.estimated_cost,
            "Sketch analyzed"
        );
        Ok(won.value)
    }

    /// Render a scene from a prompt, optionally guided by a reference image.
    pub async fn generate_scene(&self, scene: &SceneRequest) -> Result<SceneImage, ProviderError> {
        let model = self.requested_image_model(scene.model.as_deref());
        let temperature = scene.temperature.unwrap_or(SCENE_TEMPERATURE);

        if model == DOUBAO_MODEL {
            if scene.reference_image.is_some() {
                debug!("Doubao branch: reference image ignored");
            }
            let candidates = self.doubao_image_candidate()?;
            let request = ImageRequest::new(vec![Part::text(scene.prompt.as_str())], scene.size);
            return self.run_image_chain("generate_scene", &candidates, request).await;
        }

        let mut parts = vec![Part::text(scene.prompt.as_str())];
        if let Some(reference) = non_blank(scene.reference_image.as_deref()) {
            parts.push(Part::image(inline(reference)));
        }
        let request = ImageRequest::new(parts, scene.size).temperature(temperature);

        let candidates = self.image_candidates(model);
        self.run_image_chain("generate_scene", &candidates, request).await
    }

    /// Edit a scene. With a blend image, the instruction becomes a compositing task.
    pub async fn edit_scene(&self, edit: &EditRequest) -> Result<SceneImage, ProviderError> {
        let model = self.requested_image_model(edit.model.as_deref());
        let blend = non_blank(edit.blend_image.as_deref());

        if model == DOUBAO_MODEL {
            let candidates = self.doubao_image_candidate()?;
            let prompt = prompts::text_only_edit(&edit.instruction, blend.is_some());
            let request = ImageRequest::new(vec![Part::text(prompt)], edit.size);
            return self.run_image_chain("edit_scene", &candidates, request).await;
        }

        let mut parts = vec![Part::image(inline(&edit.image))];
        if let Some(blend) = blend {
            parts.push(Part::image(inline(blend)));
        }
        parts.push(Part::text(prompts::compositor(&edit.instruction, blend.is_some())));
        let request = ImageRequest::new(parts, edit.size);

        let candidates = self.image_candidates(model);
        self.run_image_chain("edit_scene", &candidates, request).await
    }

    /// Expand a loose edit request into an optimized prompt and adjustable properties.
    pub async fn analyze_edit_prompt(
        &self,
        user_input: &str,
        image: &str,
        blend_image: Option<&str>,
    ) -> Result<EditPlan, ProviderError> {
        let gemini = self.gemini()?;
        let model = self.config.providers.gemini.analyze_model.as_str();

        let mut parts = vec![Part::image(inline(image))];
        if let Some(blend) = non_blank(blend_image) {
            parts.push(Part::image(inline(blend)));
        }
        parts.push(Part::text(prompts::edit_analyzer(user_input)));
        let request = VisionRequest::new(parts).json().temperature(EDIT_PLAN_TEMPERATURE);

        let output = self.retrier().run(|| gemini.complete(model, &request)).await?;
        let value = if output.text.trim().is_empty() {
            Value::Null
        } else {
            extract_json(&output.text)?
        };

        let plan = edit_plan_from_json(&value, timestamp_millis(), output.usage)?;
        info!(properties = plan.properties.len(), cost = %plan.usage.estimated_cost, "Edit plan ready");
        Ok(plan)
    }

    /// Pick the best prebuilt voice for a character and line of dialogue.
    pub async fn recommend_voice(&self, image: &str, dialogue: &str) -> Result<VoiceRecommendation, ProviderError> {
        let gemini = self.gemini()?;
        let model = self.config.providers.gemini.analyze_model.as_str();

        let request = VisionRequest::new(vec![
            Part::image(inline(image)),
            Part::text(prompts::dialogue_line(dialogue)),
        ])
        .with_system(prompts::casting_director(dialogue))
        .with_schema(prompts::voice_schema());

        let output = self.retrier().run(|| gemini.complete(model, &request)).await?;
        let value = if output.text.trim().is_empty() {
            Value::Null
        } else {
            extract_json(&output.text)?
        };

        let (voice_name, reason) = voice_from_json(&value);
        info!(voice = %voice_name, "Voice recommended");
        Ok(VoiceRecommendation {
            voice_name,
            reason,
            usage: output.usage,
        })
    }

    /// Speak `text` with a prebuilt voice. Blank voice means the default.
    pub async fn synthesize_speech(&self, text: &str, voice: &str) -> Result<SpeechClip, ProviderError> {
        let voice = non_blank(Some(voice)).unwrap_or(prompts::DEFAULT_VOICE);
        self.speak(text.to_string(), voice).await
    }

    /// One-sentence description of what the scene sounds like.
    pub async fn describe_ambience(&self, image: &str) -> Result<AmbienceDescription, ProviderError> {
        let gemini = self.gemini()?;
        let model = self.config.providers.gemini.analyze_model.as_str();

        let request = VisionRequest::new(vec![
            Part::image(inline(image)),
            Part::text(prompts::DESCRIBE_AMBIENCE),
        ]);

        let output = self.retrier().run(|| gemini.complete(model, &request)).await?;
        let description = match output.text.trim() {
            "" => prompts::SILENCE.to_string(),
            text => text.to_string(),
        };

        info!(chars = description.len(), "Ambience described");
        Ok(AmbienceDescription {
            description,
            usage: output.usage,
        })
    }

    /// Render an ambience description as narrated audio.
    pub async fn synthesize_ambience_audio(&self, description: &str) -> Result<SpeechClip, ProviderError> {
        self.speak(prompts::ambience_speech(description), prompts::AMBIENCE_VOICE)
            .await
    }

    async fn speak(&self, text: String, voice: &str) -> Result<SpeechClip, ProviderError> {
        let gemini = self.gemini()?;
        let model = self.config.providers.gemini.speech_model.as_str();
        let request = SpeechRequest {
            text,
            voice: voice.to_string(),
        };

        let output = self.retrier().run(|| gemini.synthesize(model, &request)).await?;
        info!(voice, bytes = output.pcm.len(), "Speech synthesized");
        Ok(SpeechClip {
            pcm: output.pcm,
            usage: output.usage,
        })
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::engine::general_purpose::STANDARD as BASE64;
    use base64::Engine;
    use cinesketch_core::config::{DoubaoConfig, GeminiConfig, OpenAiConfig};
    use cinesketch_core::{ErrorKind, ImageSize, ProviderId, UsageRecord};
    use cinesketch_providers::{Adapter, GeneratedImage};
    use std::sync::Mutex;
    use serde_json::json;
    use wiremock::matchers::{body_json, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gemini_config(server: &MockServer) -> GeminiConfig {
        GeminiConfig {
            api_key: "AIza-test".into(),
            api_base: server.uri(),
            ..Default::default()
        }
    }

    fn studio(config: Config) -> Studio {
        Studio::with_policy(config, RetryPolicy::none()).unwrap()
    }

    fn gemini_only(server: &MockServer) -> Studio {
        let mut config = Config::default();
        config.providers.gemini = gemini_config(server);
        studio(config)
    }

    fn text_response(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{ "content": { "parts": [{ "text": text }] }, "finishReason": "STOP" }],
            "usageMetadata": { "promptTokenCount": 1000, "candidatesTokenCount": 200, "totalTokenCount": 1200 }
        }))
    }

    #[test]
    fn test_candidate_order() {
        let mut config = Config::default();
        config.providers.gemini.api_key = "AIza-test".into();
        config.providers.openai = OpenAiConfig {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        config.providers.doubao = DoubaoConfig {
            api_key: "ark".into(),
            chat_endpoint: Some("http://127.0.0.1:1/chat".into()),
            ..Default::default()
        };
        let studio = studio(config);

        let labels: Vec<String> = studio.vision_candidates().iter().map(|c| c.label()).collect();
        assert_eq!(
            labels,
            vec![
                "Doubao/doubao-seed-1-6-lite-251015",
                "Gemini/gemini-2.5-flash",
                "OpenAI/gpt-4o-mini"
            ]
        );

        let images: Vec<String> = studio
            .image_candidates("gemini-2.5-flash-image")
            .iter()
            .map(|c| c.model.clone())
            .collect();
        assert_eq!(images, vec!["gemini-2.5-flash-image", "gemini-2.5-flash-preview-05-20"]);
    }

    #[test]
    fn test_nothing_configured() {
        let studio = studio(Config::default());
        assert!(studio.vision_candidates().is_empty());
        assert!(studio.image_candidates("gemini-2.5-flash-image").is_empty());
    }

    #[tokio::test]
    async fn test_analyze_without_providers_is_configuration_error() {
        let err = studio(Config::default()).analyze_sketch("AAAA").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_analyze_sketch_prose_wrapped_array() {
        let server = MockServer::start().await;

        let reply = "Here are three ideas for your sketch:\n\
            [{\"title\":\"Lantern Bay\",\"description\":\"Harbor at dusk\",\"technicalPrompt\":\"Ghibli\"},\
             {\"title\":\"Sky Fort\",\"description\":\"Clouds\",\"technicalPrompt\":\"Pixar\"},\
             {\"title\":\"Rose Hall\",\"description\":\"Ballroom\",\"technicalPrompt\":\"Disney\"}]\n\
            Enjoy!";

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [{}, { "inlineData": { "mimeType": "image/png", "data": "U0tFVENI" } }] }],
                "generationConfig": { "maxOutputTokens": 2048, "temperature": 0.7 }
            })))
            .respond_with(text_response(reply))
            .expect(1)
            .mount(&server)
            .await;

        let analysis = gemini_only(&server)
            .analyze_sketch("data:image/png;base64,U0tFVENI")
            .await
            .unwrap();

        assert_eq!(analysis.ideas.len(), 3);
        assert!(analysis.ideas.iter().all(|i| !i.title.is_empty()));
        assert_eq!(analysis.ideas[1].id, "idea-1");
        assert_eq!(analysis.usage.total_tokens, 1200);
    }

    #[tokio::test]
    async fn test_analyze_falls_through_unavailable_doubao() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash:generateContent"))
            .respond_with(text_response(
                "```json\n[{\"title\":\"Only\",\"description\":\"d\",\"technicalPrompt\":\"t\"}]\n```",
            ))
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.providers.gemini = gemini_config(&server);
        config.providers.doubao = DoubaoConfig {
            api_key: "ark".into(),
            chat_endpoint: Some(format!("{}/api/v3/chat/completions", server.uri())),
            ..Default::default()
        };

        let analysis = studio(config).analyze_sketch("AAAA").await.unwrap();
        assert_eq!(analysis.ideas.len(), 1);
        assert_eq!(analysis.ideas[0].title, "Only");
    }

    #[tokio::test]
    async fn test_generate_scene_doubao_ignores_reference() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/v3/images/generations"))
            .and(body_json(json!({
                "model": "doubao-seedream-4-0-250828",
                "prompt": "A paper boat sails through a stormy bathtub sea",
                "response_format": "url",
                "size": "2K",
                "stream": false,
                "watermark": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{ "url": "https://cdn.example/boat.png" }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.providers.doubao = DoubaoConfig {
            api_key: "ark".into(),
            image_endpoint: Some(server.uri()),
            ..Default::default()
        };

        let scene = SceneRequest {
            prompt: "A paper boat sails through a stormy bathtub sea".into(),
            model: Some("doubao".into()),
            size: ImageSize::FourK,
            reference_image: Some("data:image/png;base64,UkVG".into()),
            temperature: None,
        };

        let image = studio(config).generate_scene(&scene).await.unwrap();
        assert_eq!(image.image_url, "https://cdn.example/boat.png");
        assert_eq!(image.model, "doubao-seedream-4-0-250828");
        assert_eq!(image.usage.estimated_cost, "$0.000000");
    }

    #[tokio::test]
    async fn test_doubao_branch_requires_image_endpoint() {
        let server = MockServer::start().await;
        let studio = gemini_only(&server);

        let mut scene = SceneRequest::new("x");
        scene.model = Some("doubao".into());
        let err = studio.generate_scene(&scene).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[tokio::test]
    async fn test_generate_scene_sends_reference() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-image:generateContent"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [
                    { "text": "a lighthouse" },
                    { "inlineData": { "mimeType": "image/png", "data": "UkVG" } }
                ]}],
                "generationConfig": { "temperature": 0.5 }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "SU1H" } }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut scene = SceneRequest::new("a lighthouse");
        scene.reference_image = Some("data:image/png;base64,UkVG".into());

        let image = gemini_only(&server).generate_scene(&scene).await.unwrap();
        assert_eq!(image.image_url, "data:image/png;base64,SU1H");
        assert_eq!(image.model, "gemini-2.5-flash-image");
    }

    #[tokio::test]
    async fn test_edit_scene_falls_back_and_bills_fallback_model() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-3-pro-image-preview:generateContent"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": { "code": 404, "message": "models/gemini-3-pro-image-preview is not found", "status": "NOT_FOUND" }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-preview-05-20:generateContent"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [
                    { "inlineData": { "data": "QkFTRQ==" } },
                    { "inlineData": { "data": "QkxFTkQ=" } }
                ]}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "inlineData": { "mimeType": "image/png", "data": "RURJVA==" } }] } }],
                "usageMetadata": { "promptTokenCount": 1000, "candidatesTokenCount": 1000, "totalTokenCount": 2000 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let edit = EditRequest {
            image: "data:image/png;base64,QkFTRQ==".into(),
            instruction: "add the dragon to the sky".into(),
            blend_image: Some("QkxFTkQ=".into()),
            model: Some("gemini-3-pro-image-preview".into()),
            size: ImageSize::FourK,
        };

        let image = gemini_only(&server).edit_scene(&edit).await.unwrap();
        assert_eq!(image.model, "gemini-2.5-flash-preview-05-20");
        // Flash tier: 1000 * 0.000000075 + 1000 * 0.0000003
        assert_eq!(image.usage.estimated_cost, "$0.000375");

        let received = server.received_requests().await.unwrap();
        let body: Value = serde_json::from_slice(&received[1].body).unwrap();
        let prompt = body["contents"][0]["parts"][2]["text"].as_str().unwrap();
        assert!(prompt.contains("USER INSTRUCTION: add the dragon to the sky"));
    }

    #[tokio::test]
    async fn test_edit_scene_content_rejection_stops_chain() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-image:generateContent"))
            .respond_with(text_response("I can't edit that image."))
            .expect(1)
            .mount(&server)
            .await;

        let edit = EditRequest {
            image: "QkFTRQ==".into(),
            ..Default::default()
        };
        let err = gemini_only(&server).edit_scene(&edit).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentRejection);
    }

    #[tokio::test]
    async fn test_synthesize_speech_without_audio_fails_once() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-preview-tts:generateContent"))
            .respond_with(text_response("no audio for you"))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = Config::default();
        config.providers.gemini = gemini_config(&server);
        let studio = Studio::with_policy(
            config,
            RetryPolicy {
                max_retries: 3,
                initial_delay: std::time::Duration::from_millis(1),
                backoff_multiplier: 2.0,
                max_delay: std::time::Duration::from_millis(5),
            },
        )
        .unwrap();

        let err = studio.synthesize_speech("Ahoy!", "Puck").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ContentRejection);
        assert!(!err.is_availability());
    }

    #[tokio::test]
    async fn test_synthesize_speech_to_wav() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "generationConfig": { "speechConfig": { "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Kore" } } } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "inlineData": { "data": BASE64.encode([0u8; 8]) } }] } }]
            })))
            .mount(&server)
            .await;

        let clip = gemini_only(&server).synthesize_speech("Hello", "  ").await.unwrap();
        assert_eq!(clip.pcm.len(), 8);
        assert_eq!(clip.to_wav().len(), 52);
    }

    #[tokio::test]
    async fn test_recommend_voice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [{}, { "text": "Dialogue: Arr, the sea calls!" }] }],
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": { "type": "OBJECT", "required": ["voiceName", "reason"] }
                }
            })))
            .respond_with(text_response("{\"voiceName\":\"Fenrir\",\"reason\":\"Gruff pirate captain\"}"))
            .mount(&server)
            .await;

        let rec = gemini_only(&server)
            .recommend_voice("AAAA", "Arr, the sea calls!")
            .await
            .unwrap();
        assert_eq!(rec.voice_name, "Fenrir");
        assert_eq!(rec.reason, "Gruff pirate captain");
    }

    #[tokio::test]
    async fn test_describe_ambience_blank_is_silence() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(text_response("   "))
            .mount(&server)
            .await;

        let ambience = gemini_only(&server).describe_ambience("AAAA").await.unwrap();
        assert_eq!(ambience.description, "Silence.");
    }

    #[tokio::test]
    async fn test_ambience_audio_uses_narrator_voice() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(body_partial_json(json!({
                "contents": [{ "parts": [{ "text": "(Atmospheric soundscape description): Rain on tin roofs." }] }],
                "generationConfig": { "speechConfig": { "voiceConfig": { "prebuiltVoiceConfig": { "voiceName": "Charon" } } } }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "inlineData": { "data": BASE64.encode([1u8, 2]) } }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let clip = gemini_only(&server)
            .synthesize_ambience_audio("Rain on tin roofs.")
            .await
            .unwrap();
        assert_eq!(clip.pcm, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_analyze_edit_prompt() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(text_response(
                "{\"optimizedPrompt\":\"Moonlit harbor, cool blue palette\",\"properties\":[{\"category\":\"Atmosphere\",\"name\":\"Lighting\",\"value\":\"Moonlight\"}]}",
            ))
            .mount(&server)
            .await;

        let plan = gemini_only(&server)
            .analyze_edit_prompt("make it night", "AAAA", None)
            .await
            .unwrap();
        assert_eq!(plan.optimized_prompt, "Moonlit harbor, cool blue palette");
        assert_eq!(plan.properties.len(), 1);
        assert!(plan.properties[0].id.starts_with("prop-0-"));
    }

    #[tokio::test]
    async fn test_analyze_edit_prompt_invalid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(text_response("{\"properties\": []}"))
            .mount(&server)
            .await;

        let err = gemini_only(&server)
            .analyze_edit_prompt("make it night", "AAAA", Some("QkxFTkQ="))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
    }

    #[tokio::test]
    async fn test_single_provider_ops_need_gemini() {
        let studio = studio(Config::default());
        let err = studio.describe_ambience("AAAA").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    /// Text-to-image backend that records what it was asked to render.
    struct RecordingImages {
        requests: Mutex<Vec<(String, ImageRequest)>>,
    }

    impl Adapter for RecordingImages {
        fn provider(&self) -> ProviderId {
            ProviderId::Doubao
        }
    }

    #[async_trait]
    impl ImageGen for RecordingImages {
        fn supports_reference_images(&self) -> bool {
            false
        }

        async fn generate(&self, model: &str, request: &ImageRequest) -> Result<GeneratedImage, ProviderError> {
            self.requests.lock().unwrap().push((model.to_string(), request.clone()));
            Ok(GeneratedImage {
                image_url: "https://cdn.example/edit.png".into(),
                usage: UsageRecord::zero(),
            })
        }
    }

    #[tokio::test]
    async fn test_edit_scene_doubao_sends_text_only() {
        let recorder = Arc::new(RecordingImages {
            requests: Mutex::new(Vec::new()),
        });
        let mut studio = studio(Config::default());
        let adapter: Arc<dyn ImageGen> = recorder.clone();
        studio.doubao_image = Some(Candidate::new(adapter, "seedream-test"));

        let blended = EditRequest {
            image: "data:image/png;base64,U0NFTkU=".into(),
            instruction: "Add a lighthouse on the cliff".into(),
            blend_image: Some("QkxFTkQ=".into()),
            model: Some(DOUBAO_MODEL.into()),
            size: ImageSize::TwoK,
        };
        let image = studio.edit_scene(&blended).await.unwrap();
        assert_eq!(image.image_url, "https://cdn.example/edit.png");
        assert_eq!(image.model, "seedream-test");

        let plain = EditRequest {
            image: "U0NFTkU=".into(),
            model: Some(DOUBAO_MODEL.into()),
            ..Default::default()
        };
        studio.edit_scene(&plain).await.unwrap();

        let requests = recorder.requests.lock().unwrap();
        assert_eq!(requests.len(), 2);
        for (model, request) in requests.iter() {
            assert_eq!(model, "seedream-test");
            assert!(!request.has_images());
            assert!(request.parts.iter().all(|p| matches!(p, Part::Text(_))));
        }

        let prompt = requests[0].1.prompt();
        assert_eq!(prompt, prompts::text_only_edit("Add a lighthouse on the cliff", true));
        assert!(prompt.contains("CINEMATIC COMPOSITOR"));
        assert!(prompt.contains("Add a lighthouse on the cliff"));
        assert!(!prompt.contains("U0NFTkU=") && !prompt.contains("QkxFTkQ="));
        assert_eq!(requests[0].1.size, ImageSize::TwoK);

        assert_eq!(requests[1].1.prompt(), "Enhance this image");
    }
}
