//! The generic provider adapter.
//!
//! One `ResourceProvider` instance fronts each resource kind: it asserts
//! the request's declared kind token, unmarshals wire payloads into the
//! typed object plus the generic property map, computes diffs and the
//! replace set, and dispatches to the kind's [`ResourceOps`]. A single
//! generic component replaces what would otherwise be N near-identical
//! per-kind facades.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::diff::{self, ObjectDiff};
use crate::error::{ProviderError, Result};
use crate::ident::ResourceId;
use crate::ops::ResourceOps;
use crate::property::{self, FieldFailure, PropertyMap};

/// Property name every resource kind uses for its symbolic name.
pub const NAME_PROPERTY: &str = "name";

/// Generic RPC-facing facade for one resource kind.
pub struct ResourceProvider<O: ResourceOps> {
    ops: O,
}

impl<O: ResourceOps> ResourceProvider<O> {
    pub fn new(ops: O) -> Self {
        Self { ops }
    }

    /// A kind-token mismatch means a request was routed to the wrong
    /// adapter. That is a programming error, never a user-facing failure.
    fn assert_token(&self, declared: &str) -> Result<()> {
        if declared == O::TOKEN {
            Ok(())
        } else {
            Err(ProviderError::Contract(format!(
                "request for kind '{declared}' dispatched to '{}' provider",
                O::TOKEN
            )))
        }
    }

    /// Decodes a wire payload into the typed object and the property map
    /// in one pass. Decode problems are fatal here; the check path handles
    /// them leniently instead.
    fn unmarshal(&self, payload: &Value) -> Result<(O::Resource, PropertyMap)> {
        let props = property::unmarshal_properties(payload).map_err(ProviderError::Decode)?;
        let obj = serde_json::from_value(payload.clone())
            .map_err(|e| ProviderError::Decode(e.to_string()))?;
        Ok((obj, props))
    }

    pub async fn check(&self, token: &str, properties: &Value) -> Result<Vec<FieldFailure>> {
        self.assert_token(token)?;
        // A structurally malformed payload is a fault; field-level decode
        // problems are data, merged with the ops-level failures.
        property::unmarshal_properties(properties).map_err(ProviderError::Decode)?;
        match serde_json::from_value::<O::Resource>(properties.clone()) {
            Ok(obj) => self.ops.check(&obj).await,
            Err(e) => Ok(vec![property::decode_failure(&e)]),
        }
    }

    pub async fn name(&self, token: &str, properties: &Value, unknowns: &[String]) -> Result<String> {
        self.assert_token(token)?;
        let (obj, _) = self.unmarshal(properties)?;
        let name = O::symbolic_name(&obj);
        if name.is_empty() {
            if unknowns.iter().any(|u| u == NAME_PROPERTY) {
                return Err(ProviderError::Name(
                    "name cannot be computed from unknown outputs".to_string(),
                ));
            }
            return Err(ProviderError::Name("name cannot be empty".to_string()));
        }
        Ok(name.to_string())
    }

    pub async fn create(&self, token: &str, properties: &Value) -> Result<ResourceId> {
        self.assert_token(token)?;
        let (obj, _) = self.unmarshal(properties)?;
        self.ops.create(&obj).await
    }

    pub async fn get(&self, token: &str, id: &str) -> Result<Value> {
        self.assert_token(token)?;
        let obj = self.ops.get(&ResourceId::from(id)).await?;
        serde_json::to_value(&obj).map_err(|e| ProviderError::Internal(e.to_string()))
    }

    /// Seeds the replace set from the kind's identity-defining keys, then
    /// unions in the kind-specific additions. Pure: no mutation.
    pub async fn inspect_change(
        &self,
        token: &str,
        id: &str,
        olds: &Value,
        news: &Value,
    ) -> Result<Vec<String>> {
        self.assert_token(token)?;
        let (old, oldprops) = self.unmarshal(olds)?;
        let (new, newprops) = self.unmarshal(news)?;
        let diff = diff::diff(&oldprops, &newprops);

        let mut replaces: Vec<String> = O::REPLACE_ON
            .iter()
            .filter(|key| diff.changed(key))
            .map(|key| (*key).to_string())
            .collect();
        let more = self
            .ops
            .inspect_change(&ResourceId::from(id), &old, &new, &diff)
            .await?;
        for key in more {
            if !replaces.contains(&key) {
                replaces.push(key);
            }
        }
        replaces.sort_unstable();
        debug!(token, id, replaces = ?replaces, "inspected change");
        Ok(replaces)
    }

    pub async fn update(&self, token: &str, id: &str, olds: &Value, news: &Value) -> Result<()> {
        self.assert_token(token)?;
        let (old, oldprops) = self.unmarshal(olds)?;
        let (new, newprops) = self.unmarshal(news)?;
        let diff = diff::diff(&oldprops, &newprops);

        // A replace-class change must have gone through delete-then-create
        // upstream; refusing here is fail-fast, not recovery. Kind-specific
        // replace triggers are re-derived, which is safe: inspect_change is
        // pure.
        if let Some(key) = O::REPLACE_ON.iter().find(|key| diff.changed(key)) {
            return Err(ProviderError::Contract(format!(
                "property '{key}' of '{token}' requires replacement, not update"
            )));
        }
        let resource_id = ResourceId::from(id);
        let specific = self
            .ops
            .inspect_change(&resource_id, &old, &new, &diff)
            .await?;
        if let Some(key) = specific.first() {
            return Err(ProviderError::Contract(format!(
                "property '{key}' of '{token}' requires replacement, not update"
            )));
        }
        self.ops.update(&resource_id, &old, &new, &diff).await
    }

    pub async fn delete(&self, token: &str, id: &str) -> Result<()> {
        self.assert_token(token)?;
        self.ops.delete(&ResourceId::from(id)).await
    }
}

/// Object-safe view of a [`ResourceProvider`], for the token-keyed
/// registry behind the RPC surface.
#[async_trait]
pub trait DynProvider: Send + Sync {
    fn token(&self) -> &'static str;
    async fn check(&self, token: &str, properties: &Value) -> Result<Vec<FieldFailure>>;
    async fn name(&self, token: &str, properties: &Value, unknowns: &[String]) -> Result<String>;
    async fn create(&self, token: &str, properties: &Value) -> Result<ResourceId>;
    async fn get(&self, token: &str, id: &str) -> Result<Value>;
    async fn inspect_change(
        &self,
        token: &str,
        id: &str,
        olds: &Value,
        news: &Value,
    ) -> Result<Vec<String>>;
    async fn update(&self, token: &str, id: &str, olds: &Value, news: &Value) -> Result<()>;
    async fn delete(&self, token: &str, id: &str) -> Result<()>;
}

#[async_trait]
impl<O: ResourceOps> DynProvider for ResourceProvider<O> {
    fn token(&self) -> &'static str {
        O::TOKEN
    }

    async fn check(&self, token: &str, properties: &Value) -> Result<Vec<FieldFailure>> {
        ResourceProvider::check(self, token, properties).await
    }

    async fn name(&self, token: &str, properties: &Value, unknowns: &[String]) -> Result<String> {
        ResourceProvider::name(self, token, properties, unknowns).await
    }

    async fn create(&self, token: &str, properties: &Value) -> Result<ResourceId> {
        ResourceProvider::create(self, token, properties).await
    }

    async fn get(&self, token: &str, id: &str) -> Result<Value> {
        ResourceProvider::get(self, token, id).await
    }

    async fn inspect_change(
        &self,
        token: &str,
        id: &str,
        olds: &Value,
        news: &Value,
    ) -> Result<Vec<String>> {
        ResourceProvider::inspect_change(self, token, id, olds, news).await
    }

    async fn update(&self, token: &str, id: &str, olds: &Value, news: &Value) -> Result<()> {
        ResourceProvider::update(self, token, id, olds, news).await
    }

    async fn delete(&self, token: &str, id: &str) -> Result<()> {
        ResourceProvider::delete(self, token, id).await
    }
}

/// Token-keyed set of registered resource kinds.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn DynProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a kind's operations behind a generic adapter.
    pub fn register<O: ResourceOps>(&mut self, ops: O) {
        self.providers
            .insert(O::TOKEN, Arc::new(ResourceProvider::new(ops)));
    }

    pub fn get(&self, token: &str) -> Option<Arc<dyn DynProvider>> {
        self.providers.get(token).cloned()
    }

    /// All registered kind tokens, sorted.
    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<&'static str> = self.providers.keys().copied().collect();
        tokens.sort_unstable();
        tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    const WIDGET_TOKEN: &str = "test:index/widget:Widget";

    #[derive(Debug, Clone, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Widget {
        #[serde(default)]
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        size: Option<f64>,
        #[serde(skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    }

    /// Stub ops recording create calls; `color` ending in "!" forces a
    /// kind-specific replace.
    #[derive(Default)]
    struct WidgetOps {
        creates: AtomicU32,
    }

    #[async_trait]
    impl ResourceOps for WidgetOps {
        type Resource = Widget;
        const TOKEN: &'static str = WIDGET_TOKEN;
        const REPLACE_ON: &'static [&'static str] = &["name", "size"];

        fn symbolic_name(obj: &Widget) -> &str {
            &obj.name
        }

        async fn check(&self, obj: &Widget) -> Result<Vec<FieldFailure>> {
            let mut failures = Vec::new();
            if let Some(size) = obj.size {
                if size <= 0.0 {
                    failures.push(FieldFailure::new("size", "must be positive"));
                }
            }
            Ok(failures)
        }

        async fn create(&self, obj: &Widget) -> Result<ResourceId> {
            self.creates.fetch_add(1, Ordering::SeqCst);
            Ok(crate::ident::resolve_id(None, &obj.name, 63))
        }

        async fn get(&self, id: &ResourceId) -> Result<Widget> {
            Ok(Widget {
                name: id.to_string(),
                size: Some(1.0),
                color: None,
            })
        }

        async fn inspect_change(
            &self,
            _id: &ResourceId,
            _old: &Widget,
            new: &Widget,
            diff: &ObjectDiff,
        ) -> Result<Vec<String>> {
            let mut extra = Vec::new();
            if diff.changed("color") && new.color.as_deref().is_some_and(|c| c.ends_with('!')) {
                extra.push("color".to_string());
            }
            Ok(extra)
        }

        async fn update(
            &self,
            _id: &ResourceId,
            _old: &Widget,
            _new: &Widget,
            _diff: &ObjectDiff,
        ) -> Result<()> {
            Ok(())
        }

        async fn delete(&self, _id: &ResourceId) -> Result<()> {
            Ok(())
        }
    }

    fn provider() -> ResourceProvider<WidgetOps> {
        ResourceProvider::new(WidgetOps::default())
    }

    #[tokio::test]
    async fn token_mismatch_is_a_contract_violation() {
        let p = provider();
        let err = p.check("test:index/other:Other", &json!({})).await.unwrap_err();
        assert!(matches!(err, ProviderError::Contract(_)));
    }

    #[tokio::test]
    async fn check_reports_failures_without_side_effects() {
        let p = provider();
        let failures = p
            .check(WIDGET_TOKEN, &json!({"name": "w", "size": -1.0}))
            .await
            .unwrap();
        assert_eq!(failures, vec![FieldFailure::new("size", "must be positive")]);
        // validation gating lives upstream: a failed check means create
        // was never attempted
        assert_eq!(p.ops.creates.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn check_surfaces_typed_decode_problems_as_failures() {
        let p = provider();
        let failures = p
            .check(WIDGET_TOKEN, &json!({"name": "w", "size": "big"}))
            .await
            .unwrap();
        assert_eq!(failures.len(), 1);
        assert!(failures[0].reason.contains("invalid type"));
    }

    #[tokio::test]
    async fn check_rejects_structurally_malformed_payloads() {
        let p = provider();
        let err = p.check(WIDGET_TOKEN, &json!(["not", "an", "object"])).await.unwrap_err();
        assert!(matches!(err, ProviderError::Decode(_)));
    }

    #[tokio::test]
    async fn name_distinguishes_empty_from_unknown() {
        let p = provider();
        assert_eq!(
            p.name(WIDGET_TOKEN, &json!({"name": "w"}), &[]).await.unwrap(),
            "w"
        );

        let empty = p.name(WIDGET_TOKEN, &json!({}), &[]).await.unwrap_err();
        assert!(empty.to_string().contains("cannot be empty"));

        let unknown = p
            .name(WIDGET_TOKEN, &json!({}), &["name".to_string()])
            .await
            .unwrap_err();
        assert!(unknown.to_string().contains("unknown outputs"));
    }

    #[tokio::test]
    async fn create_synthesizes_prefixed_id() {
        let p = provider();
        let id = p.create(WIDGET_TOKEN, &json!({"name": "gadget"})).await.unwrap();
        assert!(id.as_str().starts_with("gadget-"));
        assert_eq!(p.ops.creates.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn inspect_change_unions_generic_and_specific_replaces() {
        let p = provider();
        let olds = json!({"name": "w", "size": 1.0, "color": "red"});
        let news = json!({"name": "w2", "size": 1.0, "color": "red!"});
        let replaces = p
            .inspect_change(WIDGET_TOKEN, "w-1", &olds, &news)
            .await
            .unwrap();
        assert_eq!(replaces, vec!["color".to_string(), "name".to_string()]);

        // pure: identical inputs, identical output
        let again = p
            .inspect_change(WIDGET_TOKEN, "w-1", &olds, &news)
            .await
            .unwrap();
        assert_eq!(replaces, again);
    }

    #[tokio::test]
    async fn inspect_change_without_changes_is_empty() {
        let p = provider();
        let state = json!({"name": "w", "size": 1.0});
        let replaces = p
            .inspect_change(WIDGET_TOKEN, "w-1", &state, &state)
            .await
            .unwrap();
        assert!(replaces.is_empty());
    }

    #[tokio::test]
    async fn update_refuses_replace_class_changes() {
        let p = provider();
        let err = p
            .update(
                WIDGET_TOKEN,
                "w-1",
                &json!({"name": "w", "size": 1.0}),
                &json!({"name": "w", "size": 2.0}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Contract(_)));

        // in-place changes go through
        p.update(
            WIDGET_TOKEN,
            "w-1",
            &json!({"name": "w", "color": "red"}),
            &json!({"name": "w", "color": "blue"}),
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn update_refuses_kind_specific_replace_triggers() {
        let p = provider();
        let err = p
            .update(
                WIDGET_TOKEN,
                "w-1",
                &json!({"name": "w", "color": "red"}),
                &json!({"name": "w", "color": "red!"}),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Contract(_)));
        assert!(err.to_string().contains("color"));
    }

    #[tokio::test]
    async fn registry_dispatches_by_token() {
        let mut registry = ProviderRegistry::new();
        registry.register(WidgetOps::default());
        assert_eq!(registry.tokens(), vec![WIDGET_TOKEN]);

        let p = registry.get(WIDGET_TOKEN).expect("registered");
        assert_eq!(p.token(), WIDGET_TOKEN);
        assert!(registry.get("test:index/other:Other").is_none());
    }
}
