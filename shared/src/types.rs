//! Core shared types and identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::errors::SharedError;

/// Unique identifier for one generation run
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunId(Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Short form keeps log lines readable
        let full = self.0.to_string();
        write!(f, "run_{}", &full[..8])
    }
}

/// Output format the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GenerationMode {
    /// Eight ordered slots with a skills/goals constrained pair
    Versus,
    /// Ten fixed-position pools
    Fein,
    /// Eleven fixed-position pools
    Creed,
    /// One clip pool cut to a lyric-timed track
    Autocut,
    /// Image pool shown as a slideshow
    Slideshow,
    /// Every hook line applied to every base video
    AddHook,
}

impl GenerationMode {
    /// Number of fixed-position pools for the N-part modes
    pub fn fixed_pool_count(&self) -> Option<usize> {
        match self {
            GenerationMode::Fein => Some(10),
            GenerationMode::Creed => Some(11),
            _ => None,
        }
    }

    /// Path of the render endpoint serving this mode
    pub fn render_path(&self) -> &'static str {
        match self {
            GenerationMode::Versus => "/api/render/versus",
            GenerationMode::Fein | GenerationMode::Creed => "/api/render/parts",
            GenerationMode::Autocut => "/api/render/autocut",
            GenerationMode::Slideshow => "/api/render/slideshow",
            GenerationMode::AddHook => "/api/render/add-hook",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationMode::Versus => write!(f, "versus"),
            GenerationMode::Fein => write!(f, "fein"),
            GenerationMode::Creed => write!(f, "creed"),
            GenerationMode::Autocut => write!(f, "autocut"),
            GenerationMode::Slideshow => write!(f, "slideshow"),
            GenerationMode::AddHook => write!(f, "add-hook"),
        }
    }
}

impl std::str::FromStr for GenerationMode {
    type Err = SharedError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "versus" => Ok(GenerationMode::Versus),
            "fein" => Ok(GenerationMode::Fein),
            "creed" => Ok(GenerationMode::Creed),
            "autocut" => Ok(GenerationMode::Autocut),
            "slideshow" => Ok(GenerationMode::Slideshow),
            "add-hook" | "addhook" => Ok(GenerationMode::AddHook),
            _ => Err(SharedError::UnknownMode { input: s.to_string() }),
        }
    }
}

/// Kind of uploaded asset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Video,
    Image,
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Video => write!(f, "video"),
            MediaKind::Image => write!(f, "image"),
        }
    }
}

/// Where the bytes of a media part live
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaSource {
    /// Local file that must be uploaded before rendering
    Local(PathBuf),
    /// Durable URL, e.g. loaded from the media library
    Remote(String),
}

/// An uploaded asset reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPart {
    pub id: String,
    pub kind: MediaKind,
    pub source: MediaSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_seconds: Option<u32>,
}

impl MediaPart {
    pub fn local(id: impl Into<String>, kind: MediaKind, path: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: MediaSource::Local(path.into()),
            duration_seconds: None,
        }
    }

    pub fn remote(id: impl Into<String>, kind: MediaKind, url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            source: MediaSource::Remote(url.into()),
            duration_seconds: None,
        }
    }

    /// Durable URL if the part already has one
    pub fn remote_url(&self) -> Option<&str> {
        match &self.source {
            MediaSource::Remote(url) => Some(url),
            MediaSource::Local(_) => None,
        }
    }

    pub fn local_path(&self) -> Option<&Path> {
        match &self.source {
            MediaSource::Local(path) => Some(path),
            MediaSource::Remote(_) => None,
        }
    }

    /// Human readable name, the file name when there is one
    pub fn label(&self) -> String {
        match &self.source {
            MediaSource::Local(path) => path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.id.clone()),
            MediaSource::Remote(url) => url
                .rsplit('/')
                .next()
                .filter(|segment| !segment.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| self.id.clone()),
        }
    }
}

/// Role of a slot in the final sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotRole {
    /// Internally permutable, every part appears once per output
    Free,
    /// Free half of the constrained pair ("skills")
    PairLead,
    /// Mandatory-tail half of the constrained pair ("goals")
    PairTail,
    /// One part per output chosen from the pool
    FixedPosition,
}

fn default_enabled() -> bool {
    true
}

/// A named, ordered collection of parts assigned to one slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartPool {
    pub name: String,
    pub role: SlotRole,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub parts: Vec<MediaPart>,
}

impl PartPool {
    pub fn new(name: impl Into<String>, role: SlotRole, parts: Vec<MediaPart>) -> Self {
        Self {
            name: name.into(),
            role,
            enabled: true,
            parts,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Parts that take part in generation (none when the slot is disabled)
    pub fn active_parts(&self) -> &[MediaPart] {
        if self.enabled {
            &self.parts
        } else {
            &[]
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

/// One concrete ordered part layout of a single output video
pub type Combination = Vec<MediaPart>;

/// Lifecycle of one unit of orchestrated work
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JobStatus {
    Pending,
    InFlight,
    Done,
    Failed(String),
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Failed(_))
    }
}
