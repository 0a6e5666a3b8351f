//! Session identity and file classification
//!
//! Dataset file stems follow `<prefix>_<YYYY-MM-DD>_<subsession>[_<tag>]`,
//! where the optional tag is `p<N>` (raw capture part), `full`, `trimmed`
//! or `split<N>`. Splits cut from a unified or trimmed file keep that tag in
//! front: `full_split<N>`, `trimmed_split<N>`.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};

static STEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<prefix>[A-Za-z0-9]+)_(?P<date>\d{4}-\d{2}-\d{2})_(?P<sub>[a-z])(?:_(?P<tag>p\d+|full|trimmed|(?:full_|trimmed_)?split\d+))?$",
    )
    .expect("stem pattern is a valid regex")
});

/// Identity shared by every file of one recording session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct SessionId {
    prefix: String,
    date: String,
    subsession: char,
}

impl SessionId {
    pub(crate) fn new(prefix: &str, date: &str, subsession: char) -> Self {
        Self {
            prefix: prefix.to_string(),
            date: date.to_string(),
            subsession,
        }
    }

    pub(crate) fn date(&self) -> &str {
        &self.date
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.prefix, self.date, self.subsession)
    }
}

impl Serialize for SessionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Recording modality, implied by the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Modality {
    Video,
    Audio,
    Midi,
    Flac,
}

impl Modality {
    pub(crate) fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "mp4" => Some(Self::Video),
            "aac" => Some(Self::Audio),
            "mid" | "midi" => Some(Self::Midi),
            "flac" => Some(Self::Flac),
            _ => None,
        }
    }

    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Video => "video",
            Self::Audio => "audio",
            Self::Midi => "midi",
            Self::Flac => "flac",
        }
    }

    /// Video and audio captures arrive in several parts; MIDI and FLAC do not.
    pub(crate) fn is_multi_part(self) -> bool {
        matches!(self, Self::Video | Self::Audio)
    }
}

/// Where a classified file goes inside its session component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Part(u32),
    Full,
    Trimmed,
    Split(u32),
}

impl Slot {
    /// Ordering key inside part and split lists
    pub(crate) fn number(self) -> u32 {
        match self {
            Slot::Part(n) | Slot::Split(n) => n,
            Slot::Full | Slot::Trimmed => 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Classified {
    pub(crate) id: SessionId,
    pub(crate) modality: Modality,
    pub(crate) slot: Slot,
}

/// Classify a path by its name. Returns `None` when the name does not follow
/// the convention or the tag makes no sense for the modality.
pub(crate) fn classify(path: &Path) -> Option<Classified> {
    let modality = Modality::from_path(path)?;
    let stem = path.file_stem()?.to_str()?;
    let caps = STEM_PATTERN.captures(stem)?;

    let subsession = caps.name("sub")?.as_str().chars().next()?;
    let id = SessionId::new(&caps["prefix"], &caps["date"], subsession);

    let slot = match caps.name("tag").map(|m| m.as_str()) {
        None if modality.is_multi_part() => Slot::Part(0),
        None | Some("full") => Slot::Full,
        Some("trimmed") if modality == Modality::Video => Slot::Trimmed,
        Some("trimmed") => return None,
        Some(tag) => {
            let split = ["full_", "trimmed_"]
                .iter()
                .find_map(|source| tag.strip_prefix(*source))
                .unwrap_or(tag)
                .strip_prefix("split");
            if let Some(n) = split {
                Slot::Split(n.parse().ok()?)
            } else if modality.is_multi_part() {
                Slot::Part(tag.strip_prefix('p')?.parse().ok()?)
            } else {
                return None;
            }
        }
    };

    Some(Classified { id, modality, slot })
}

/// Split number of a split output, read off its name.
pub(crate) fn split_number(path: &Path) -> Option<u32> {
    match classify(path)?.slot {
        Slot::Split(n) => Some(n),
        _ => None,
    }
}
