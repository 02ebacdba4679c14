//! Tools, plugins and the registry
//!
//! Tools are contributed by [`ToolProvider`]s and aggregated once, at session
//! start, into an immutable [`ToolRegistry`]. The agent loop only ever sees
//! tools through the registry.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AgentError, Result};
use crate::schema::{InputSchema, ToolArgs};

/// Tool definition shown to the reasoning engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ToolSpec {
    /// Unique within a registry
    pub name: String,

    /// Human-readable description (used verbatim by the engine)
    pub description: String,

    /// Accepted arguments
    pub input_schema: InputSchema,

    /// Plugin-defined grouping, for display only
    #[serde(default)]
    pub category: Option<String>,

    /// Whether tool has side effects (payments, transfers)
    #[serde(default)]
    pub has_side_effects: bool,
}

impl ToolSpec {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            category: None,
            has_side_effects: false,
        }
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub const fn with_side_effects(mut self) -> Self {
        self.has_side_effects = true;
        self
    }
}

/// Successful result of a tool execution
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ToolOutput {
    Text(String),
    Json(serde_json::Value),
}

impl std::fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Json(value) => write!(f, "{value}"),
        }
    }
}

impl From<String> for ToolOutput {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for ToolOutput {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for ToolOutput {
    fn from(value: serde_json::Value) -> Self {
        Self::Json(value)
    }
}

/// Failure raised by a tool body.
///
/// `code` is a stable identifier (`rpc_error`, `invalid_argument`,
/// `timeout`, ...) the engine and logs can key on; `message` is free text.
#[derive(Error, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {message}")]
pub struct ToolError {
    pub code: String,
    pub message: String,
}

impl ToolError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new("invalid_argument", message)
    }
}

/// One capability the agent can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    fn spec(&self) -> ToolSpec;

    /// Execute the tool with arguments already validated against
    /// `spec().input_schema`
    async fn execute(&self, args: &ToolArgs) -> std::result::Result<ToolOutput, ToolError>;
}

/// A configuration unit that contributes tools (ERC-20 support for a token
/// set, checkout support with an API key, ...)
pub trait ToolProvider: Send + Sync {
    /// Provider name, for diagnostics
    fn name(&self) -> &str;

    /// Tools in the order they should be listed
    fn tools(&self) -> Vec<Arc<dyn Tool>>;
}

/// A tool together with the spec it was registered under
#[derive(Clone)]
pub struct RegisteredTool {
    spec: ToolSpec,
    provider: String,
    tool: Arc<dyn Tool>,
}

impl RegisteredTool {
    pub const fn spec(&self) -> &ToolSpec {
        &self.spec
    }

    /// Name of the provider that contributed this tool
    pub fn provider(&self) -> &str {
        &self.provider
    }

    pub async fn execute(&self, args: &ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
        self.tool.execute(args).await
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("name", &self.spec.name)
            .field("provider", &self.provider)
            .finish_non_exhaustive()
    }
}

/// Registry for available tools.
///
/// Listing order is registration order, with each provider's tools kept
/// contiguous. Names are unique; a collision rejects the whole provider.
#[derive(Default, Debug)]
pub struct ToolRegistry {
    tools: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from providers, in order.
    ///
    /// Fails on the first duplicate name or invalid spec; no partially built
    /// registry is returned.
    pub fn from_providers(providers: &[Arc<dyn ToolProvider>]) -> Result<Self> {
        let mut registry = Self::new();
        for provider in providers {
            registry.register_provider(provider.as_ref())?;
        }
        Ok(registry)
    }

    /// Add all tools of one provider, or none of them
    pub fn register_provider(&mut self, provider: &dyn ToolProvider) -> Result<()> {
        let incoming: Vec<(ToolSpec, Arc<dyn Tool>)> = provider
            .tools()
            .into_iter()
            .map(|tool| (tool.spec(), tool))
            .collect();

        let mut seen = std::collections::HashSet::new();
        for (spec, _) in &incoming {
            if spec.name.trim().is_empty() {
                return Err(AgentError::InvalidToolSpec(format!(
                    "provider '{}' contributed a tool with an empty name",
                    provider.name()
                )));
            }
            if spec.description.trim().is_empty() {
                return Err(AgentError::InvalidToolSpec(format!(
                    "tool '{}' has an empty description",
                    spec.name
                )));
            }
            if self.index.contains_key(&spec.name) || !seen.insert(spec.name.as_str()) {
                return Err(AgentError::DuplicateToolName(spec.name.clone()));
            }
        }

        for (spec, tool) in incoming {
            tracing::debug!(tool = %spec.name, provider = provider.name(), "Registering tool");
            self.index.insert(spec.name.clone(), self.tools.len());
            self.tools.push(RegisteredTool {
                spec,
                provider: provider.name().to_string(),
                tool,
            });
        }

        Ok(())
    }

    /// Look up a tool by name
    pub fn lookup(&self, name: &str) -> Result<&RegisteredTool> {
        self.index
            .get(name)
            .map(|&i| &self.tools[i])
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))
    }

    /// Tool specs in registration order
    pub fn list(&self) -> impl Iterator<Item = &ToolSpec> {
        self.tools.iter().map(|t| &t.spec)
    }

    /// Owned copy of all specs (for reasoning requests)
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.list().cloned().collect()
    }

    /// Get tool names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.list().map(|s| s.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Render the tool catalog for prompt-based engines
    pub fn catalog_prompt(&self) -> String {
        render_catalog(self.list())
    }
}

/// Render a tool catalog as markdown
pub fn render_catalog<'a>(specs: impl IntoIterator<Item = &'a ToolSpec>) -> String {
    let mut out = String::from("## Tools\n\n");

    for spec in specs {
        let _ = writeln!(out, "### {}\n{}", spec.name, spec.description);
        for param in &spec.input_schema.parameters {
            let presence = if param.required { "required" } else { "optional" };
            let _ = write!(out, "- `{}`: {}, {presence}", param.name, param.param_type);
            if let Some(default) = &param.default {
                let _ = write!(out, ", default {default}");
            }
            let _ = writeln!(out, ". {}", param.description);
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{ParamType, ParameterSchema};

    struct NamedTool(&'static str, &'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn spec(&self) -> ToolSpec {
            ToolSpec::new(
                self.0,
                self.1,
                InputSchema::empty()
                    .param(ParameterSchema::required("to", ParamType::String, "Recipient")),
            )
        }

        async fn execute(&self, _args: &ToolArgs) -> std::result::Result<ToolOutput, ToolError> {
            Ok(ToolOutput::from(self.0))
        }
    }

    struct StaticProvider(&'static str, Vec<(&'static str, &'static str)>);

    impl ToolProvider for StaticProvider {
        fn name(&self) -> &str {
            self.0
        }

        fn tools(&self) -> Vec<Arc<dyn Tool>> {
            self.1
                .iter()
                .map(|&(n, d)| Arc::new(NamedTool(n, d)) as Arc<dyn Tool>)
                .collect()
        }
    }

    fn provider(name: &'static str, tools: Vec<(&'static str, &'static str)>) -> Arc<dyn ToolProvider> {
        Arc::new(StaticProvider(name, tools))
    }

    #[test]
    fn test_registration_order_is_provider_order() {
        let registry = ToolRegistry::from_providers(&[
            provider("wallet", vec![("get_address", "Address"), ("get_balance", "Balance")]),
            provider("checkout", vec![("create_order", "Order")]),
        ])
        .unwrap();

        assert_eq!(registry.names(), vec!["get_address", "get_balance", "create_order"]);
        assert_eq!(registry.lookup("create_order").unwrap().provider(), "checkout");
    }

    #[test]
    fn test_duplicate_across_providers_fails() {
        let err = ToolRegistry::from_providers(&[
            provider("erc20", vec![("transfer", "ERC-20 transfer")]),
            provider("native", vec![("transfer", "Native transfer")]),
        ])
        .unwrap_err();

        assert!(matches!(err, AgentError::DuplicateToolName(ref n) if n == "transfer"));
    }

    #[test]
    fn test_duplicate_within_provider_fails_atomically() {
        let mut registry = ToolRegistry::new();
        let err = registry
            .register_provider(provider("p", vec![("a", "A"), ("a", "A again")]).as_ref())
            .unwrap_err();

        assert!(matches!(err, AgentError::DuplicateToolName(_)));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_empty_description_rejected() {
        let err = ToolRegistry::from_providers(&[provider("p", vec![("a", "  ")])]).unwrap_err();
        assert!(matches!(err, AgentError::InvalidToolSpec(_)));
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = ToolRegistry::new();
        assert!(matches!(
            registry.lookup("nope"),
            Err(AgentError::UnknownTool(ref n)) if n == "nope"
        ));
    }

    #[test]
    fn test_catalog_prompt_lists_parameters() {
        let registry =
            ToolRegistry::from_providers(&[provider("p", vec![("transfer", "Send tokens")])]).unwrap();
        let prompt = registry.catalog_prompt();

        assert!(prompt.contains("### transfer"));
        assert!(prompt.contains("Send tokens"));
        assert!(prompt.contains("- `to`: string, required. Recipient"));
    }

    #[test]
    fn test_tool_output_display() {
        assert_eq!(ToolOutput::from("100 USDC").to_string(), "100 USDC");
        assert_eq!(
            ToolOutput::from(serde_json::json!({"ok": true})).to_string(),
            r#"{"ok":true}"#
        );
    }
}
