pub mod braip;

use {
    crate::domain::{
        abandon::NewAbandon,
        config::{GatewayConfig, GatewayKind},
        error::PipelineError,
        sale::NewSale,
    },
    std::collections::HashMap,
};

/// Gateway-agnostic result of translating one webhook payload.
#[derive(Debug)]
pub enum NormalizedEvent {
    Sale(NewSale),
    Abandon(NewAbandon),
    /// Well-formed but not a sale or abandon. Acknowledged without
    /// persistence; not an error.
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventClass {
    Sale,
    Abandon,
    Unrecognized,
}

/// Substring classification, case-insensitive. "venda" is the Portuguese
/// vocabulary Braip mixes into event names; "abandono" already contains
/// "abandon" as a substring.
pub fn classify_event(event_name: &str) -> EventClass {
    let name = event_name.to_ascii_lowercase();
    if name.contains("sale") || name.contains("venda") {
        EventClass::Sale
    } else if name.contains("abandon") {
        EventClass::Abandon
    } else {
        EventClass::Unrecognized
    }
}

/// Per-gateway translation of raw webhook JSON into canonical records.
pub trait GatewayNormalizer: Send + Sync {
    fn kind(&self) -> GatewayKind;

    fn normalize(
        &self,
        config: &GatewayConfig,
        event_name: &str,
        payload: &serde_json::Value,
    ) -> Result<NormalizedEvent, PipelineError>;
}

/// Registry of gateway variants. Adding a gateway means registering one
/// variant, not branching existing code.
pub struct NormalizerRegistry {
    by_kind: HashMap<GatewayKind, Box<dyn GatewayNormalizer>>,
}

impl NormalizerRegistry {
    pub fn new() -> Self {
        Self {
            by_kind: HashMap::new(),
        }
    }

    /// All gateways currently implemented.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(braip::BraipNormalizer));
        registry
    }

    pub fn register(&mut self, normalizer: Box<dyn GatewayNormalizer>) {
        self.by_kind.insert(normalizer.kind(), normalizer);
    }

    pub fn get(&self, kind: GatewayKind) -> Option<&dyn GatewayNormalizer> {
        self.by_kind.get(&kind).map(Box::as_ref)
    }
}

impl Default for NormalizerRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_is_substring_and_case_insensitive() {
        assert_eq!(classify_event("sale_approved"), EventClass::Sale);
        assert_eq!(classify_event("VENDA_REALIZADA"), EventClass::Sale);
        assert_eq!(classify_event("checkout_abandon"), EventClass::Abandon);
        assert_eq!(classify_event("abandono_carrinho"), EventClass::Abandon);
        assert_eq!(classify_event("subscription_canceled"), EventClass::Unrecognized);
        assert_eq!(classify_event(""), EventClass::Unrecognized);
    }

    #[test]
    fn default_registry_serves_braip_only() {
        let registry = NormalizerRegistry::with_defaults();
        assert!(registry.get(GatewayKind::Braip).is_some());
        assert!(registry.get(GatewayKind::Hotmart).is_none());
    }
}
