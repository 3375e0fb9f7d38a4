//! Prompt templates for every studio operation.

use serde_json::{json, Value};

/// Voices offered by the speech model, with casting notes.
pub const VOICES: &[(&str, &str)] = &[
    ("Puck", "Male, witty"),
    ("Charon", "Male, deep"),
    ("Kore", "Female, soothing"),
    ("Fenrir", "Male, intense"),
    ("Zephyr", "Female, bright"),
];

pub const DEFAULT_VOICE: &str = "Kore";
pub const DEFAULT_VOICE_REASON: &str = "Default";
pub const AMBIENCE_VOICE: &str = "Charon";
pub const SILENCE: &str = "Silence.";

pub const ANALYZE_SKETCH: &str = r#"You are a visual concept artist specializing in animation styles loved by children and families, such as Pixar, Disney, and Studio Ghibli (Miyazaki).
Analyze the provided sketch. It is a rough draft for an animated movie scene.
Your task is to interpret the sketch and generate 3 DISTINCT, HIGH-QUALITY cinematic scene descriptions based on these specific animation styles.

For each idea, provide:
1. A short, catchy Title (in Japanese if the prompt implies Ghibli style, otherwise English/Japanese mixed).
2. A simple, evocative Description for the user.
3. A highly detailed Technical Prompt for an image generation model. CRITICAL: The technical prompt MUST explicitly specify the art style.
   - Option 1: Pixar/Dreamworks style (3D render, high fidelity, vibrant lighting, soft shadows, expressive characters, octane render).
   - Option 2: Studio Ghibli/Miyazaki style (Hand-painted backgrounds, watercolor texture, anime character design, nostalgic atmosphere, Hayao Miyazaki style).
   - Option 3: Disney Renaissance or Modern Disney style (Magical realism, fluid shapes, theatrical lighting, storybook aesthetic).

Return ONLY a valid JSON array of exactly 3 objects, each with keys: "title", "description", "technicalPrompt". No markdown, no code fences, no other text."#;

pub const DESCRIBE_AMBIENCE: &str = "Describe the ambient sounds of this scene in 1 sentence. Focus on wind, rain, crowds, silence, or machines. Make it atmospheric.";

const EDIT_GUIDELINES: &str = r#"Your response must be valid JSON with this structure:
{
  "optimizedPrompt": "A hyper-specific, detailed prompt...",
  "properties": [
    {
      "category": "Visual Style",
      "name": "Art Style",
      "value": "Photorealistic"
    },
    {
      "category": "Atmosphere",
      "name": "Lighting",
      "value": "Warm golden hour"
    },
    {
      "category": "Elements",
      "name": "Added Object",
      "value": "Vintage car"
    }
  ]
}

CRITICAL GUIDELINES:
- Be hyper-specific in the optimized prompt (lighting, materials, perspective, style details)
- Generate 5-8 properties across categories: Visual Style, Atmosphere, Elements, Composition, Effects
- Property values should be descriptive but concise
- The optimized prompt should incorporate all property values coherently
- Follow Gemini best practices: specify camera angles, lighting details, material properties
- For inpainting/editing: describe what to preserve and what to change explicitly
- For style transfer: specify artistic techniques and aesthetic details"#;

/// System instruction for picking a voice for a line of dialogue.
pub fn casting_director(dialogue: &str) -> String {
    let voices = VOICES
        .iter()
        .map(|(name, note)| format!("{name} ({note})"))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "\nYou are a casting director for an animated movie. \n\
         Analyze the character in the image and the dialogue they are speaking: \"{dialogue}\".\n\
         Select the most suitable voice from: {voices}.\n\
         Return JSON with voiceName and reason.\n"
    )
}

/// Response schema constraining the casting answer to known voices.
pub fn voice_schema() -> Value {
    let names: Vec<&str> = VOICES.iter().map(|(name, _)| *name).collect();
    json!({
        "type": "OBJECT",
        "properties": {
            "voiceName": { "type": "STRING", "enum": names },
            "reason": { "type": "STRING" }
        },
        "required": ["voiceName", "reason"]
    })
}

pub fn is_known_voice(name: &str) -> bool {
    VOICES.iter().any(|(v, _)| *v == name)
}

pub fn dialogue_line(dialogue: &str) -> String {
    format!("Dialogue: {dialogue}")
}

pub fn ambience_speech(description: &str) -> String {
    format!("(Atmospheric soundscape description): {description}")
}

/// Prompt for turning a loose edit request into an optimized prompt plus
/// adjustable properties.
pub fn edit_analyzer(user_input: &str) -> String {
    format!(
        "You are an expert image editing AI specialized in Gemini's image generation capabilities.\n\n\
         Your task:\n\
         1. Analyze the provided image(s) and user's intent: \"{user_input}\"\n\
         2. Generate an optimized, detailed prompt following Gemini image editing best practices\n\
         3. Extract/generate dynamic properties that can be adjusted\n\n\
         {EDIT_GUIDELINES}"
    )
}

/// Text sent alongside the base (and optional reference) image to an
/// image-conditioned model.
pub fn compositor(instruction: &str, has_blend: bool) -> String {
    let instruction = instruction.trim();
    if !has_blend {
        return if instruction.is_empty() {
            "Enhance this image".to_string()
        } else {
            instruction.to_string()
        };
    }

    let instruction = if instruction.is_empty() {
        "Integrate the element from the second image into the scene naturally."
    } else {
        instruction
    };
    format!(
        "\nACT AS A CINEMATIC COMPOSITOR.\n\
         INPUTS: IMAGE 1 = BASE SCENE, IMAGE 2 = REFERENCE ELEMENT.\n\
         TASK: Seamlessly integrate the visual subject/elements from IMAGE 2 into IMAGE 1.\n\
         RULES: Match perspective, lighting, and art style of IMAGE 1. Final result must look like one painting.\n\
         USER INSTRUCTION: {instruction}\n"
    )
}

/// Text-only variant for backends that cannot see the images.
pub fn text_only_edit(instruction: &str, has_blend: bool) -> String {
    let instruction = instruction.trim();
    if has_blend {
        let instruction = if instruction.is_empty() {
            "Seamlessly blend the element into the scene."
        } else {
            instruction
        };
        format!("ACT AS A CINEMATIC COMPOSITOR. Integrate the reference element into the scene. {instruction}")
    } else if instruction.is_empty() {
        "Enhance this image".to_string()
    } else {
        instruction.to_string()
    }
}
