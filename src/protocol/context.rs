//! Layered context and prompt flattening.

use serde::{Deserialize, Serialize};

/// One of the three context layers, in prompt order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    System,
    Developer,
    User,
}

impl Layer {
    /// Tag prefixed to every message of this layer in the flattened prompt.
    pub fn tag(&self) -> &'static str {
        match self {
            Layer::System => "[SYSTEM]",
            Layer::Developer => "[DEVELOPER]",
            Layer::User => "[USER]",
        }
    }
}

/// Ordered system / developer / user messages forming one request.
///
/// Layers are append-only; only the user layer can be cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextLayers {
    #[serde(default)]
    pub system: Vec<String>,
    #[serde(default)]
    pub developer: Vec<String>,
    #[serde(default)]
    pub user: Vec<String>,
}

impl ContextLayers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style constructor used by callers assembling a request.
    pub fn with(mut self, layer: Layer, message: impl Into<String>) -> Self {
        self.push(layer, message);
        self
    }

    pub fn push(&mut self, layer: Layer, message: impl Into<String>) {
        let message = message.into();
        match layer {
            Layer::System => self.system.push(message),
            Layer::Developer => self.developer.push(message),
            Layer::User => self.user.push(message),
        }
    }

    pub fn add_system(&mut self, message: impl Into<String>) {
        self.push(Layer::System, message);
    }

    pub fn add_developer(&mut self, message: impl Into<String>) {
        self.push(Layer::Developer, message);
    }

    pub fn add_user(&mut self, message: impl Into<String>) {
        self.push(Layer::User, message);
    }

    /// Drop the user conversation history.
    pub fn clear_user(&mut self) {
        self.user.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.system.is_empty() && self.developer.is_empty() && self.user.is_empty()
    }

    /// Messages in prompt order, each paired with its layer.
    pub fn iter(&self) -> impl Iterator<Item = (Layer, &str)> {
        let system = self.system.iter().map(|m| (Layer::System, m.as_str()));
        let developer = self.developer.iter().map(|m| (Layer::Developer, m.as_str()));
        let user = self.user.iter().map(|m| (Layer::User, m.as_str()));
        system.chain(developer).chain(user)
    }

    /// A new context equal to this one plus one developer note.
    ///
    /// Used for tool-augmented regeneration; `self` is left untouched.
    pub fn derive_with_note(&self, note: impl Into<String>) -> Self {
        let mut derived = self.clone();
        derived.developer.push(note.into());
        derived
    }
}

/// Flatten layers into the prompt text sent to a model.
///
/// Deterministic: identical layers always produce byte-identical output.
pub fn build_prompt(context: &ContextLayers) -> String {
    let mut prompt = String::with_capacity(estimate_len(context));

    for (i, (layer, message)) in context.iter().enumerate() {
        if i > 0 {
            prompt.push('\n');
        }
        prompt.push_str(layer.tag());
        prompt.push(' ');
        prompt.push_str(message);
    }

    prompt
}

fn estimate_len(context: &ContextLayers) -> usize {
    context.iter().map(|(layer, m)| layer.tag().len() + m.len() + 2).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> ContextLayers {
        ContextLayers::new()
            .with(Layer::User, "Tell me about penguins")
            .with(Layer::System, "Follow the constitution")
            .with(Layer::Developer, "Use the search tool")
            .with(Layer::User, "And search for Arctic animals")
    }

    #[test]
    fn test_build_prompt_orders_layers() {
        let prompt = build_prompt(&sample());
        assert_eq!(
            prompt,
            "[SYSTEM] Follow the constitution\n\
             [DEVELOPER] Use the search tool\n\
             [USER] Tell me about penguins\n\
             [USER] And search for Arctic animals"
        );
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        assert_eq!(build_prompt(&sample()), build_prompt(&sample().clone()));
    }

    #[test]
    fn test_build_prompt_empty() {
        assert_eq!(build_prompt(&ContextLayers::new()), "");
    }

    #[test]
    fn test_derive_with_note_leaves_original() {
        let original = sample();
        let derived = original.derive_with_note("Tool search result: ok");

        assert_eq!(original.developer.len(), 1);
        assert_eq!(derived.developer.len(), 2);
        assert_eq!(derived.developer[1], "Tool search result: ok");
        assert_eq!(derived.system, original.system);
        assert_eq!(derived.user, original.user);
    }

    #[test]
    fn test_add_methods_match_builder() {
        let mut ctx = ContextLayers::new();
        ctx.add_user("Tell me about penguins");
        ctx.add_developer("Use the search tool");
        ctx.add_system("Follow the constitution");
        ctx.add_user("And search for Arctic animals");

        assert_eq!(ctx, sample());
    }

    #[test]
    fn test_clear_user() {
        let mut ctx = sample();
        ctx.clear_user();
        assert!(ctx.user.is_empty());
        assert_eq!(ctx.system.len(), 1);
        assert!(!ctx.is_empty());
    }
}
