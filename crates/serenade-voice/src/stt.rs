//! Speech-to-text backends for committed utterances.
//!
//! | Env | Default | Description |
//! |-----|---------|-------------|
//! | STT_API_URL | https://api.openai.com/v1 | OpenAI-compatible base URL |
//! | STT_API_KEY | (none) | Bearer key; without it the placeholder backend is used |
//! | STT_MODEL | whisper-1 | Transcription model |
//! | STT_LANGUAGE | (none) | Optional ISO-639-1 hint, e.g. `hi` |

use crate::error::{VoiceError, VoiceResult};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Turns mono f32 PCM into text. Empty string means nothing was understood.
pub trait SttBackend: Send + Sync {
    fn transcribe(&self, samples: &[f32], sample_rate: u32) -> VoiceResult<String>;

    fn name(&self) -> &str;
}

/// Encode mono f32 PCM as 16-bit WAV.
pub fn encode_wav(samples: &[f32], sample_rate: u32) -> VoiceResult<Vec<u8>> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::with_capacity(44 + samples.len() * 2));
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
        for &s in samples {
            writer.write_sample((s.clamp(-1.0, 1.0) * 32767.0).round() as i16)?;
        }
        writer.finalize()?;
    }
    Ok(cursor.into_inner())
}

/// Fixed-answer backend, used when no API key is configured.
#[derive(Debug, Default, Clone)]
pub struct PlaceholderStt {
    response: Option<String>,
}

impl PlaceholderStt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(text: impl Into<String>) -> Self {
        Self {
            response: Some(text.into()),
        }
    }
}

impl SttBackend for PlaceholderStt {
    fn transcribe(&self, _samples: &[f32], _sample_rate: u32) -> VoiceResult<String> {
        Ok(self.response.clone().unwrap_or_default())
    }

    fn name(&self) -> &str {
        "placeholder"
    }
}

/// OpenAI-compatible `/audio/transcriptions` client.
#[derive(Debug, Clone)]
pub struct OpenAiStt {
    base_url: String,
    api_key: String,
    model: String,
    language: Option<String>,
    client: reqwest::blocking::Client,
}

impl OpenAiStt {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> VoiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| VoiceError::Stt(e.to_string()))?;
        Ok(Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            language: None,
            client,
        })
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn from_env() -> VoiceResult<Self> {
        let api_key = std::env::var("STT_API_KEY")
            .map_err(|_| VoiceError::Config("STT_API_KEY not set".to_string()))?;
        let base_url = std::env::var("STT_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let model = std::env::var("STT_MODEL").unwrap_or_else(|_| "whisper-1".to_string());

        let stt = Self::new(base_url, api_key, model)?;
        Ok(match std::env::var("STT_LANGUAGE") {
            Ok(lang) if !lang.trim().is_empty() => stt.with_language(lang.trim()),
            _ => stt,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/audio/transcriptions", self.base_url.trim_end_matches('/'))
    }
}

impl SttBackend for OpenAiStt {
    fn transcribe(&self, samples: &[f32], sample_rate: u32) -> VoiceResult<String> {
        if samples.is_empty() {
            return Ok(String::new());
        }
        let wav = encode_wav(samples, sample_rate)?;
        let part = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("utterance.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoiceError::Stt(e.to_string()))?;
        let mut form = reqwest::blocking::multipart::Form::new()
            .part("file", part)
            .text("model", self.model.clone());
        if let Some(lang) = &self.language {
            form = form.text("language", lang.clone());
        }

        let res = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| VoiceError::Stt(e.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().unwrap_or_default();
            return Err(VoiceError::Stt(format!("STT API error {}: {}", status, body)));
        }

        let json: serde_json::Value = res.json().map_err(|e| VoiceError::Stt(e.to_string()))?;
        Ok(json
            .get("text")
            .and_then(|t| t.as_str())
            .unwrap_or("")
            .trim()
            .to_string())
    }

    fn name(&self) -> &str {
        "openai-compatible"
    }
}

/// Remote backend when `STT_API_KEY` is set, placeholder otherwise.
pub fn create_best_stt() -> Arc<dyn SttBackend> {
    match OpenAiStt::from_env() {
        Ok(stt) => {
            info!("🗣️ STT backend: {} ({})", stt.name(), stt.model);
            Arc::new(stt)
        }
        Err(e) => {
            warn!("STT falling back to placeholder: {}", e);
            Arc::new(PlaceholderStt::new())
        }
    }
}
