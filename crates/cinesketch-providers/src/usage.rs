//! Token usage normalization and cost estimation.

use serde_json::Value;

use cinesketch_core::{ProviderId, UsageRecord};

const INPUT_KEYS: &[&str] = &["prompt_tokens", "promptTokenCount", "input_tokens"];
const OUTPUT_KEYS: &[&str] = &["completion_tokens", "candidatesTokenCount", "output_tokens"];
const TOTAL_KEYS: &[&str] = &["total_tokens", "totalTokenCount"];

/// Per-token USD rates for one model family.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rates {
    pub input: f64,
    pub output: f64,
}

/// Gemini premium tier ($2.50 / $5.00 per million tokens).
pub const GEMINI_PRO: Rates = Rates {
    input: 0.000_002_5,
    output: 0.000_005,
};

/// Gemini economy tier ($0.075 / $0.30 per million tokens).
pub const GEMINI_FLASH: Rates = Rates {
    input: 0.000_000_075,
    output: 0.000_000_3,
};

/// Map a provider's raw usage block to a [`UsageRecord`].
///
/// Missing or non-numeric fields count as zero; a missing total is input + output.
pub fn normalize(provider: ProviderId, model: &str, raw: &Value) -> UsageRecord {
    let input = first_count(raw, INPUT_KEYS).unwrap_or(0);
    let output = first_count(raw, OUTPUT_KEYS).unwrap_or(0);
    let total = first_count(raw, TOTAL_KEYS).unwrap_or_else(|| input.saturating_add(output));

    UsageRecord {
        input_tokens: input,
        output_tokens: output,
        total_tokens: total,
        estimated_cost: estimate_cost(provider, model, input, output),
    }
}

/// Estimated USD cost formatted as `$0.000000`.
pub fn estimate_cost(provider: ProviderId, model: &str, input: u64, output: u64) -> String {
    let cost = match rates_for(provider, model) {
        Some(rates) => input as f64 * rates.input + output as f64 * rates.output,
        None => 0.0,
    };
    format!("${cost:.6}")
}

/// Rate table lookup. `None` for providers without published per-token pricing here.
pub fn rates_for(provider: ProviderId, model: &str) -> Option<Rates> {
    match provider {
        ProviderId::Gemini if model.contains("pro") => Some(GEMINI_PRO),
        ProviderId::Gemini => Some(GEMINI_FLASH),
        ProviderId::Doubao | ProviderId::OpenAi => None,
    }
}

fn first_count(raw: &Value, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| raw.get(*k).and_then(Value::as_u64))
}
