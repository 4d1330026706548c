use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

/// Remote status id of a run that finished and was accepted.
pub const STATUS_ACCEPTED: u32 = 3;
pub const STATUS_TIME_LIMIT_EXCEEDED: u32 = 5;

/// Body of `POST /submissions`.
#[derive(Debug, Clone, Serialize)]
pub struct RemoteSubmission {
    pub source_code: String,
    pub language_id: u32,
    pub stdin: String,
    /// KB
    pub memory_limit: u64,
    /// seconds
    pub cpu_time_limit: f64,
}

/// Raw HTTP answer, before any interpretation.
#[derive(Debug, Clone)]
pub struct RemoteReply {
    pub status: u16,
    pub body: String,
}

impl RemoteReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteStatus {
    pub id: u32,
    #[serde(default)]
    pub description: String,
}

/// The service reports numbers either as JSON numbers or as strings.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Measure {
    Number(f64),
    Text(String),
}

impl Measure {
    pub fn value(&self) -> Option<f64> {
        match self {
            Measure::Number(v) => Some(*v),
            Measure::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RemoteResponse {
    pub status: Option<RemoteStatus>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
    pub compile_output: Option<String>,
    pub message: Option<String>,
    /// seconds
    pub time: Option<Measure>,
    /// KB
    pub memory: Option<Measure>,
}

impl RemoteResponse {
    pub fn time_ms(&self) -> u64 {
        self.time
            .as_ref()
            .and_then(Measure::value)
            .map(|secs| (secs * 1000.0).round().max(0.0) as u64)
            .unwrap_or(0)
    }

    pub fn memory_kb(&self) -> u64 {
        self.memory
            .as_ref()
            .and_then(Measure::value)
            .map(|kb| kb.max(0.0) as u64)
            .unwrap_or(0)
    }

    pub fn accepted(&self) -> bool {
        matches!(&self.status, Some(s) if s.id == STATUS_ACCEPTED)
    }

    pub fn time_limit_exceeded(&self) -> bool {
        matches!(&self.status, Some(s) if s.id == STATUS_TIME_LIMIT_EXCEEDED)
    }

    /// Decoded compiler output, stderr and service message, in that order.
    pub fn diagnostics(&self, base64_encoded: bool) -> String {
        let mut parts = Vec::new();
        for field in [&self.compile_output, &self.stderr].iter() {
            if let Some(text) = field {
                let text = decode_field(text, base64_encoded);
                if !text.trim().is_empty() {
                    parts.push(text.trim_end().to_string());
                }
            }
        }
        if let Some(message) = &self.message {
            let message = decode_field(message, base64_encoded);
            if !message.trim().is_empty() {
                parts.push(message.trim_end().to_string());
            }
        }
        parts.join("\n")
    }
}

pub fn encode(text: &str) -> String {
    general_purpose::STANDARD.encode(text.as_bytes())
}

/// Decodes a base64 field. Text that is not valid base64 (or not UTF-8 once
/// decoded) is returned unchanged.
pub fn decode_field(text: &str, base64_encoded: bool) -> String {
    if !base64_encoded {
        return text.to_string();
    }
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD
        .decode(compact.as_bytes())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .unwrap_or_else(|| text.to_string())
}

/// Drops blank lines and joins what is left.
pub fn collapse_stdout(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
