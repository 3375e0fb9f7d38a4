//! Provider registry: static specs for the three supported backends.
//!
//! Each `ProviderSpec` names a provider's config section and what it can do.
//! The CLI uses it for `status` and `onboard`.

use cinesketch_core::config::Config;
use cinesketch_core::ProviderId;

// ─────────────────────────────────────────────
// ProviderSpec: static metadata for one provider
// ─────────────────────────────────────────────

/// A capability a provider may offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Capability {
    Vision,
    Image,
    ImageEdit,
    Speech,
}

impl Capability {
    pub fn label(self) -> &'static str {
        match self {
            Capability::Vision => "vision",
            Capability::Image => "image",
            Capability::ImageEdit => "image-edit",
            Capability::Speech => "speech",
        }
    }
}

/// Static metadata describing one provider.
#[derive(Clone, Debug)]
pub struct ProviderSpec {
    pub id: ProviderId,
    /// Config section name (`providers.<name>`).
    pub name: &'static str,
    pub capabilities: &'static [Capability],
    /// Where to get a key, shown by `onboard`.
    pub signup_url: &'static str,
}

impl ProviderSpec {
    pub fn display_name(&self) -> &'static str {
        self.id.display_name()
    }

    pub fn supports(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }
}

/// All providers, in the order sketch analysis tries them.
pub static PROVIDERS: &[ProviderSpec] = &[
    ProviderSpec {
        id: ProviderId::Doubao,
        name: "doubao",
        capabilities: &[Capability::Vision, Capability::Image],
        signup_url: "https://console.volcengine.com/ark",
    },
    ProviderSpec {
        id: ProviderId::Gemini,
        name: "gemini",
        capabilities: &[
            Capability::Vision,
            Capability::Image,
            Capability::ImageEdit,
            Capability::Speech,
        ],
        signup_url: "https://aistudio.google.com/apikey",
    },
    ProviderSpec {
        id: ProviderId::OpenAi,
        name: "openai",
        capabilities: &[Capability::Vision],
        signup_url: "https://platform.openai.com/api-keys",
    },
];

/// Find a spec by provider id.
pub fn find_by_id(id: ProviderId) -> &'static ProviderSpec {
    // PROVIDERS covers every ProviderId variant
    PROVIDERS
        .iter()
        .find(|s| s.id == id)
        .unwrap_or(&PROVIDERS[0])
}

/// Whether `config` has usable credentials for `capability` on `id`.
pub fn is_configured_for(config: &Config, id: ProviderId, capability: Capability) -> bool {
    if !find_by_id(id).supports(capability) {
        return false;
    }
    let providers = &config.providers;
    match id {
        ProviderId::Gemini => providers.gemini.is_configured(),
        ProviderId::OpenAi => providers.openai.is_configured(),
        ProviderId::Doubao => match capability {
            Capability::Vision => providers.doubao.vision_configured(),
            _ => providers.doubao.image_configured(),
        },
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_provider_has_spec() {
        for id in [ProviderId::Gemini, ProviderId::Doubao, ProviderId::OpenAi] {
            assert_eq!(find_by_id(id).id, id);
        }
    }

    #[test]
    fn test_order_and_names() {
        let names: Vec<&str> = PROVIDERS.iter().map(|s| s.name).collect();
        assert_eq!(names, ["doubao", "gemini", "openai"]);
        assert_eq!(find_by_id(ProviderId::OpenAi).display_name(), "OpenAI");
    }

    #[test]
    fn test_capabilities() {
        assert!(find_by_id(ProviderId::Gemini).supports(Capability::Speech));
        assert!(!find_by_id(ProviderId::Doubao).supports(Capability::ImageEdit));
        assert!(!find_by_id(ProviderId::OpenAi).supports(Capability::Image));
    }

    #[test]
    fn test_is_configured_for() {
        let mut config = Config::default();
        assert!(!is_configured_for(&config, ProviderId::Gemini, Capability::Vision));

        config.providers.gemini.api_key = "AIza-test".into();
        config.providers.doubao.api_key = "ark".into();
        config.providers.doubao.image_endpoint = Some("https://ark.example".into());
        config.providers.openai.api_key = "sk-test".into();

        assert!(is_configured_for(&config, ProviderId::Gemini, Capability::Speech));
        assert!(is_configured_for(&config, ProviderId::Doubao, Capability::Image));
        assert!(!is_configured_for(&config, ProviderId::Doubao, Capability::Vision));
        assert!(!is_configured_for(&config, ProviderId::OpenAi, Capability::Image));
    }
}
