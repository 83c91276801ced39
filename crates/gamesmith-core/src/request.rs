//! Outbound request construction.
//!
//! A [`GenerationRequest`] is built fresh for each run from the user's prompt
//! and the [`GeneratorConfig`].  It is immutable once built and serializes to
//! the chat-completion wire body via [`GenerationRequest::to_body`].

use serde::Serialize;
use serde_json::Value;

use crate::config::GeneratorConfig;

// ---------------------------------------------------------------------------
// Instruction template
// ---------------------------------------------------------------------------

const TEMPLATE_HEAD: &str = "\
You are a professional HTML5 game generator. Generate a complete, playable game \
that strictly follows the description below.

## Requirements
1. Implement the core game logic with Canvas.
2. Provide a complete control scheme:
   - Desktop: keyboard controls (arrow keys to move, space to shoot/act) plus \
mouse controls (click interaction and drag control)
   - Mobile: touch controls (virtual joystick/buttons) plus gestures (swipe, tap)
3. Implement a scoring system and a game-over condition.
4. Fully self-contained HTML+CSS+JS code.
5. Code smaller than 500KB.
6. Responsive design: adapt to phones, tablets and desktops.

## Game description
";

const TEMPLATE_TAIL: &str = "

## Output
Return only the raw code, without any explanation!";

/// Embed `prompt` in the fixed game-generation instruction template.
pub fn render_instructions(prompt: &str) -> String {
    let mut out = String::with_capacity(TEMPLATE_HEAD.len() + prompt.len() + TEMPLATE_TAIL.len());
    out.push_str(TEMPLATE_HEAD);
    out.push_str(prompt);
    out.push_str(TEMPLATE_TAIL);
    out
}

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A single request to the chat-completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    prompt: String,
    system_instructions: String,
    model: String,
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

impl GenerationRequest {
    /// Build a request for `prompt`.  The prompt is trimmed and embedded into
    /// the instruction template, which becomes the sole system message.
    pub fn new(prompt: &str, config: &GeneratorConfig) -> Self {
        let prompt = prompt.trim().to_owned();
        let system_instructions = render_instructions(&prompt);
        Self {
            prompt,
            system_instructions,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            stream: false,
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system_instructions(&self) -> &str {
        &self.system_instructions
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn stream(&self) -> bool {
        self.stream
    }

    /// Serialize into the chat-completion JSON body.
    pub fn to_body(&self) -> Value {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: [WireMessage {
                role: "system",
                content: &self.system_instructions,
            }],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            stream: self.stream,
        };
        // Serializing plain strings and numbers into a Value cannot fail.
        serde_json::to_value(body).unwrap_or(Value::Null)
    }
}

#[derive(Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 1],
    max_tokens: u32,
    temperature: f64,
    stream: bool,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_embeds_prompt_between_sections() {
        let text = render_instructions("a simple platformer");
        let desc = text.find("## Game description").unwrap();
        let prompt = text.find("a simple platformer").unwrap();
        let output = text.find("## Output").unwrap();
        assert!(desc < prompt && prompt < output);
        assert!(text.contains("Canvas"));
        assert!(text.contains("500KB"));
    }

    #[test]
    fn request_trims_prompt() {
        let request = GenerationRequest::new("  space shooter \n", &GeneratorConfig::default());
        assert_eq!(request.prompt(), "space shooter");
        assert!(request.system_instructions().contains("\nspace shooter\n"));
    }

    #[test]
    fn body_matches_wire_format() {
        let request = GenerationRequest::new("snake", &GeneratorConfig::default());
        let body = request.to_body();

        assert_eq!(body["model"], "deepseek-chat");
        assert_eq!(body["max_tokens"], 4000);
        assert_eq!(body["stream"], false);
        assert_eq!(body["temperature"], 0.7);

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[0]["content"], request.system_instructions());
    }

    #[test]
    fn body_uses_configured_model() {
        let config = GeneratorConfig {
            model: "deepseek-coder".into(),
            max_tokens: 1024,
            ..GeneratorConfig::default()
        };
        let body = GenerationRequest::new("pong", &config).to_body();
        assert_eq!(body["model"], "deepseek-coder");
        assert_eq!(body["max_tokens"], 1024);
    }
}
