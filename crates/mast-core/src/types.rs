//! Core type definitions shared across the Mast workspace

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Classification of one scenario log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    Pass,
    Fail,
    Comment,
}

impl std::fmt::Display for LogType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pass => write!(f, "pass"),
            Self::Fail => write!(f, "fail"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

impl std::str::FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" => Ok(Self::Pass),
            "fail" => Ok(Self::Fail),
            "comment" => Ok(Self::Comment),
            _ => Err(format!("Invalid log type: {}", s)),
        }
    }
}

/// One timestamped entry in a scenario's ordered log
///
/// External reporters (console, JSON output) read these records verbatim;
/// the core never formats them itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogLine {
    #[serde(rename = "type")]
    pub log_type: LogType,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl LogLine {
    pub fn new(log_type: LogType, message: impl Into<String>) -> Self {
        Self {
            log_type,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn pass(message: impl Into<String>) -> Self {
        Self::new(LogType::Pass, message)
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self::new(LogType::Fail, message)
    }

    pub fn comment(message: impl Into<String>) -> Self {
        Self::new(LogType::Comment, message)
    }
}

/// The kind of resource a response wraps
///
/// Each kind fixes what the response layer will accept at construction
/// and which operations it supports afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseKind {
    #[default]
    Html,
    Json,
    Image,
    Stylesheet,
    Script,
    Video,
    Resource,
    Browser,
}

impl ResponseKind {
    /// Does the Content-Type header satisfy this kind's format check?
    ///
    /// `None` for kinds that accept any content type.
    pub fn content_type_matches(&self, content_type: &str) -> Option<bool> {
        let ct = content_type.to_lowercase();
        match self {
            Self::Html | Self::Browser => Some(ct.contains("text/html")),
            Self::Json => Some(ct.contains("json")),
            Self::Image => Some(ct.starts_with("image/")),
            Self::Stylesheet => Some(ct.contains("text/css")),
            Self::Script => Some(ct.contains("javascript") || ct.contains("ecmascript")),
            Self::Video => Some(ct.contains("video") || ct.contains("mpegurl")),
            Self::Resource => None,
        }
    }

    /// Whether free-form `select`/`select_all` makes sense for this kind
    pub fn supports_selection(&self) -> bool {
        matches!(
            self,
            Self::Html | Self::Browser | Self::Json | Self::Stylesheet
        )
    }

    /// Whether script evaluation makes sense for this kind
    pub fn supports_evaluate(&self) -> bool {
        matches!(self, Self::Browser)
    }
}

impl std::fmt::Display for ResponseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Html => write!(f, "HTML"),
            Self::Json => write!(f, "JSON"),
            Self::Image => write!(f, "Image"),
            Self::Stylesheet => write!(f, "Stylesheet"),
            Self::Script => write!(f, "Script"),
            Self::Video => write!(f, "Video"),
            Self::Resource => write!(f, "Resource"),
            Self::Browser => write!(f, "Browser"),
        }
    }
}

impl std::str::FromStr for ResponseKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "json" => Ok(Self::Json),
            "image" => Ok(Self::Image),
            "stylesheet" | "css" => Ok(Self::Stylesheet),
            "script" => Ok(Self::Script),
            "video" => Ok(Self::Video),
            "resource" => Ok(Self::Resource),
            "browser" => Ok(Self::Browser),
            _ => Err(format!("Invalid response kind: {}", s)),
        }
    }
}
