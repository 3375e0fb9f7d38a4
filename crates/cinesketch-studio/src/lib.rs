//! Cinesketch Studio: the generative operations behind the sketch-to-storybook flow.
//!
//! This crate contains:
//! - **studio**: the [`Studio`] orchestrator and its operation recipes
//! - **prompts**: prompt templates and the voice catalogue
//! - **results**: operation inputs/outputs and shaping of model JSON into them

pub mod prompts;
pub mod results;
pub mod studio;

pub use results::{
    AmbienceDescription, EditPlan, EditProperty, EditRequest, SceneImage, SceneRequest,
    SketchAnalysis, SpeechClip, VoiceRecommendation,
};
pub use studio::{Studio, DOUBAO_MODEL};
