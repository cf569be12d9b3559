use anyhow::{ensure, Context, Result};
use serde::{Deserialize, Serialize};

use crate::mode::EditorMode;
use crate::voice::VoiceClip;

/// Trailing context window sent with autocomplete requests, in chars.
pub const AUTOCOMPLETE_CONTEXT_CHARS: usize = 2000;

/// Completion budget for autocomplete responses.
pub const AUTOCOMPLETE_MAX_TOKENS: u32 = 300;

/// JSON Schema for the structured "rate" response.
///
/// The remote API enforces this via structured outputs; anything that does
/// not parse against it is a hard failure for the action.
pub const FEEDBACK_JSON_SCHEMA: &str = r#"{
  "type": "object",
  "additionalProperties": false,
  "required": ["score", "critique", "improvements"],
  "properties": {
    "score": { "type": "number", "description": "A score from 1-10 based on quality for the specific mode." },
    "critique": { "type": "string", "description": "A paragraph of constructive critique." },
    "improvements": {
      "type": "array",
      "items": { "type": "string" },
      "description": "List of 3-5 specific actionable improvements."
    }
  }
}"#;

/// JSON Schema for the structured voice-command response.
pub const VOICE_COMMAND_JSON_SCHEMA: &str = r#"{
  "type": "object",
  "additionalProperties": false,
  "required": ["action"],
  "properties": {
    "action": {
      "type": "string",
      "enum": ["REWRITE", "IMPROVE", "SUMMARIZE", "RATE", "AUTOCOMPLETE", "CHANGE_MODE", "UNKNOWN"],
      "description": "The intended action."
    },
    "mode": {
      "type": "string",
      "enum": ["ACADEMIC", "NOVEL", "GENERAL"],
      "description": "If action is CHANGE_MODE, the target mode."
    },
    "instruction": {
      "type": "string",
      "description": "Any specific instruction for rewrites (e.g., 'make it funny')."
    }
  }
}"#;

/// Structured quality feedback for a "rate" action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackData {
    pub score: f64,
    pub critique: String,
    pub improvements: Vec<String>,
}

/// Interpreted voice command, consumed exactly once by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum VoiceCommand {
    #[serde(rename = "REWRITE")]
    Rewrite {
        #[serde(default)]
        instruction: Option<String>,
    },
    #[serde(rename = "IMPROVE")]
    Improve,
    #[serde(rename = "SUMMARIZE")]
    Summarize,
    #[serde(rename = "RATE")]
    Rate,
    #[serde(rename = "AUTOCOMPLETE")]
    Autocomplete,
    #[serde(rename = "CHANGE_MODE")]
    ChangeMode {
        #[serde(default)]
        mode: Option<EditorMode>,
    },
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

/// Decode a voice-command reply. An empty (or missing) assistant message
/// degrades to `Unknown`; a non-empty message that is not valid command JSON
/// is an error.
pub fn parse_voice_reply(content: &str) -> Result<VoiceCommand> {
    let content = content.trim();
    if content.is_empty() {
        return Ok(VoiceCommand::Unknown);
    }
    serde_json::from_str(content).context("voice response is not valid JSON")
}

pub fn validate_feedback(feedback: &FeedbackData) -> Result<()> {
    ensure!(feedback.score.is_finite(), "score must be a finite number");
    ensure!(
        (1.0..=10.0).contains(&feedback.score),
        "score must be between 1 and 10"
    );
    ensure!(
        !feedback.improvements.is_empty(),
        "improvements must not be empty"
    );
    Ok(())
}

/// Last `max_chars` characters of `text`, on a char boundary.
pub fn trailing_window(text: &str, max_chars: usize) -> &str {
    let start = text
        .char_indices()
        .rev()
        .take(max_chars)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0);
    &text[start..]
}

pub fn autocomplete_prompt(context: &str, mode: EditorMode) -> String {
    format!(
        "You are a {persona} assistant.\n\
         Continue the following text naturally.\n\
         Return ONLY the continuation text. Do not contain or repeat the original text.\n\n\
         Current Text:\n\"{context}\"",
        persona = mode.persona(),
        context = trailing_window(context, AUTOCOMPLETE_CONTEXT_CHARS),
    )
}

pub fn rewrite_prompt(text: &str, mode: EditorMode, instruction: Option<&str>) -> String {
    let instruction = match instruction {
        Some(instruction) => format!("Instruction: {instruction}"),
        None => "Improve clarity, flow, and tone.".to_string(),
    };
    format!(
        "You are an expert {persona} editor.\n\
         Rewrite the selected text.\n\
         {instruction}\n\
         Return only the rewritten text, no explanations.\n\n\
         Text to rewrite:\n\"{text}\"",
        persona = mode.persona(),
    )
}

pub fn improve_prompt(text: &str, mode: EditorMode) -> String {
    format!(
        "You are a {persona} editor.\n\
         Significantly improve the grammar, vocabulary, and flow of the selected text without \
         changing its original meaning or removing key details.\n\
         Return ONLY the improved text. Do not add conversational filler.\n\n\
         Text to improve:\n\"{text}\"",
        persona = mode.persona(),
    )
}

pub fn summarize_prompt(text: &str, mode: EditorMode) -> String {
    format!(
        "Summarize the following text concisely for a {persona} context:\n\n\"{text}\"",
        persona = mode.persona(),
    )
}

pub fn rate_prompt(text: &str, mode: EditorMode) -> String {
    format!(
        "Analyze this text as a {persona} editor. Provide a score, critique, and improvements.\n\n\
         Text:\n\"{text}\"",
        persona = mode.persona(),
    )
}

pub fn voice_prompt(mode: EditorMode) -> String {
    format!(
        "You are a voice control assistant for a text editor. The user is currently in {mode} \
         mode. Interpret the user's audio command and map it to an editor action.",
    )
}

/// Boundary to the hosted generative service: one request per user action.
///
/// The orchestrator is generic over this trait so the action pipeline can be
/// driven by a scripted service in tests.
#[allow(async_fn_in_trait)]
pub trait AssistService {
    async fn autocomplete(&self, context: &str, mode: EditorMode) -> Result<String>;
    async fn rewrite(
        &self,
        text: &str,
        mode: EditorMode,
        instruction: Option<&str>,
    ) -> Result<String>;
    async fn improve(&self, text: &str, mode: EditorMode) -> Result<String>;
    async fn summarize(&self, text: &str, mode: EditorMode) -> Result<String>;
    async fn rate(&self, text: &str, mode: EditorMode) -> Result<FeedbackData>;
    async fn interpret_voice(&self, clip: &VoiceClip, mode: EditorMode) -> Result<VoiceCommand>;
}

pub mod openrouter {
    use super::*;

    use anyhow::{anyhow, Context, Result};
    use async_openai::{
        config::OpenAIConfig,
        types::chat::{
            ChatCompletionRequestMessageContentPartAudioArgs,
            ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestUserMessageArgs,
            CreateChatCompletionRequestArgs, CreateChatCompletionResponse, InputAudio,
            ResponseFormat, ResponseFormatJsonSchema,
        },
        Client,
    };
    use serde_json::Value;

    use crate::mode::EditorMode;
    use crate::voice::{AudioFormat, VoiceClip};

    pub const DEFAULT_MODEL: &str = "google/gemini-3-flash-preview";

    const OPENROUTER_API_KEY_ENV: &str = "OPENROUTER_API_KEY";
    const OPENROUTER_API_BASE: &str = "https://openrouter.ai/api/v1";

    #[derive(Debug, Clone)]
    pub struct OpenRouterAssistClient {
        client: Client<OpenAIConfig>,
        model: String,
        feedback_format: ResponseFormat,
        voice_format: ResponseFormat,
    }

    impl OpenRouterAssistClient {
        /// Build a client from `OPENROUTER_API_KEY`. Absent credentials fail
        /// here, on the first call attempt, with a distinct error.
        pub fn from_env() -> Result<Self> {
            dotenvy::dotenv().ok();
            let api_key = std::env::var(OPENROUTER_API_KEY_ENV)
                .with_context(|| format!("{OPENROUTER_API_KEY_ENV} is not set"))?;
            Self::new(api_key)
        }

        pub fn new(api_key: impl Into<String>) -> Result<Self> {
            let config = OpenAIConfig::new()
                .with_api_key(api_key.into())
                .with_api_base(OPENROUTER_API_BASE);

            // OpenRouter encourages these headers; set them to your app.
            let config = config
                .with_header("HTTP-Referer", "https://github.com")
                .context("failed to set HTTP-Referer header")?;
            let config = config
                .with_header("X-Title", "redraft")
                .context("failed to set X-Title header")?;

            Ok(Self {
                client: Client::with_config(config),
                model: DEFAULT_MODEL.to_string(),
                feedback_format: json_schema_format("editor_feedback", FEEDBACK_JSON_SCHEMA)?,
                voice_format: json_schema_format("voice_command", VOICE_COMMAND_JSON_SCHEMA)?,
            })
        }

        pub fn with_model(mut self, model: impl Into<String>) -> Self {
            self.model = model.into();
            self
        }

        async fn request_text(
            &self,
            prompt: String,
            max_tokens: Option<u32>,
            temperature: Option<f32>,
        ) -> Result<String> {
            let mut builder = CreateChatCompletionRequestArgs::default();
            builder.model(self.model.as_str()).messages([
                ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into(),
            ]);
            if let Some(max_tokens) = max_tokens {
                builder.max_completion_tokens(max_tokens);
            }
            if let Some(temperature) = temperature {
                builder.temperature(temperature);
            }
            let request = builder.build().context("failed to build assist request")?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .context("assist request failed")?;

            Ok(message_content(&response).unwrap_or_default().to_string())
        }

        async fn request_structured(
            &self,
            prompt: String,
            format: ResponseFormat,
        ) -> Result<CreateChatCompletionResponse> {
            let request = CreateChatCompletionRequestArgs::default()
                .model(self.model.as_str())
                .messages([ChatCompletionRequestUserMessageArgs::default()
                    .content(prompt)
                    .build()?
                    .into()])
                .response_format(format)
                .temperature(0.0)
                .build()
                .context("failed to build assist request")?;

            self.client
                .chat()
                .create(request)
                .await
                .context("assist request failed")
        }
    }

    impl AssistService for OpenRouterAssistClient {
        async fn autocomplete(&self, context: &str, mode: EditorMode) -> Result<String> {
            self.request_text(
                autocomplete_prompt(context, mode),
                Some(AUTOCOMPLETE_MAX_TOKENS),
                Some(0.5),
            )
            .await
        }

        async fn rewrite(
            &self,
            text: &str,
            mode: EditorMode,
            instruction: Option<&str>,
        ) -> Result<String> {
            let rewritten = self
                .request_text(rewrite_prompt(text, mode, instruction), None, None)
                .await?;
            if rewritten.is_empty() {
                return Ok(text.to_string());
            }
            Ok(rewritten)
        }

        async fn improve(&self, text: &str, mode: EditorMode) -> Result<String> {
            let improved = self
                .request_text(improve_prompt(text, mode), None, None)
                .await?;
            if improved.is_empty() {
                return Ok(text.to_string());
            }
            Ok(improved)
        }

        async fn summarize(&self, text: &str, mode: EditorMode) -> Result<String> {
            self.request_text(summarize_prompt(text, mode), None, None)
                .await
        }

        async fn rate(&self, text: &str, mode: EditorMode) -> Result<FeedbackData> {
            let response = self
                .request_structured(rate_prompt(text, mode), self.feedback_format.clone())
                .await?;
            let content = message_content(&response)
                .ok_or_else(|| anyhow!("missing choices[0].message.content"))?;
            let feedback: FeedbackData = serde_json::from_str(content.trim())
                .context("feedback response is not valid JSON")?;
            validate_feedback(&feedback).context("feedback response failed validation")?;
            Ok(feedback)
        }

        async fn interpret_voice(
            &self,
            clip: &VoiceClip,
            mode: EditorMode,
        ) -> Result<VoiceCommand> {
            let audio = ChatCompletionRequestMessageContentPartAudioArgs::default()
                .input_audio(InputAudio {
                    data: clip.data.clone(),
                    format: match clip.format {
                        AudioFormat::Wav => async_openai::types::chat::InputAudioFormat::Wav,
                        AudioFormat::Mp3 => async_openai::types::chat::InputAudioFormat::Mp3,
                    },
                })
                .build()?;
            let text = ChatCompletionRequestMessageContentPartTextArgs::default()
                .text(voice_prompt(mode))
                .build()?;

            let request = CreateChatCompletionRequestArgs::default()
                .model(self.model.as_str())
                .messages([ChatCompletionRequestUserMessageArgs::default()
                    .content(vec![audio.into(), text.into()])
                    .build()?
                    .into()])
                .response_format(self.voice_format.clone())
                .temperature(0.0)
                .build()
                .context("failed to build voice request")?;

            let response = self
                .client
                .chat()
                .create(request)
                .await
                .context("voice request failed")?;

            match message_content(&response) {
                Some(content) => parse_voice_reply(content),
                None => Ok(VoiceCommand::Unknown),
            }
        }
    }

    fn json_schema_format(name: &str, schema: &str) -> Result<ResponseFormat> {
        let schema: Value = serde_json::from_str(schema)
            .with_context(|| format!("{name} schema must be valid JSON"))?;
        Ok(ResponseFormat::JsonSchema {
            json_schema: ResponseFormatJsonSchema {
                name: name.to_string(),
                description: None,
                schema: Some(schema),
                strict: Some(true),
            },
        })
    }

    fn message_content(response: &CreateChatCompletionResponse) -> Option<&str> {
        response
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
    }
}
