//! Session data model
//!
//! A session starts `Unresolved` after discovery. Merge outputs are attached
//! with [`Session::with_artifacts`], which consumes the session and returns
//! it in the `Merged` stage; a successful split moves it to `Split`.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;

use crate::consts::SUSTAIN_PEDAL_THRESHOLD;
use crate::error::{AppError, SessionError};

use super::identity::{Classified, Modality, SessionId, Slot, classify};

/// One modality of a session: a single file, raw parts, and derived outputs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub(crate) struct SessionFile {
    pub(crate) file: Option<PathBuf>,
    pub(crate) file_list: Vec<PathBuf>,
    pub(crate) trimmed: Option<PathBuf>,
    pub(crate) splits_list: Vec<PathBuf>,
}

impl SessionFile {
    fn has(&self, field: Field) -> bool {
        match field {
            Field::File => self.file.is_some(),
            Field::FileList => !self.file_list.is_empty(),
            Field::Trimmed => self.trimmed.is_some(),
            Field::SplitsList => !self.splits_list.is_empty(),
        }
    }

    /// Insert into a numbered list, keeping it sorted by part/split number.
    fn insert_sorted(list: &mut Vec<PathBuf>, path: PathBuf) {
        if list.contains(&path) {
            return;
        }
        list.push(path);
        list.sort_by_cached_key(|p| {
            let number = classify(p).map_or(0, |c| c.slot.number());
            (number, p.clone())
        });
    }

    /// Returns false when a single-file slot is already taken by another path
    /// and `replace` is not set.
    fn place(&mut self, slot: Slot, path: PathBuf, replace: bool) -> bool {
        let single = match slot {
            Slot::Part(_) => {
                Self::insert_sorted(&mut self.file_list, path);
                return true;
            }
            Slot::Split(_) => {
                Self::insert_sorted(&mut self.splits_list, path);
                return true;
            }
            Slot::Full => &mut self.file,
            Slot::Trimmed => &mut self.trimmed,
        };
        if let Some(existing) = single.as_ref()
            && *existing != path
            && !replace
        {
            return false;
        }
        *single = Some(path);
        true
    }

    fn files(&self) -> impl Iterator<Item = &PathBuf> {
        self.file
            .iter()
            .chain(self.trimmed.iter())
            .chain(self.splits_list.iter())
            .chain(self.file_list.iter())
    }
}

/// Attribute of a [`SessionFile`] that a run can require.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    File,
    FileList,
    Trimmed,
    SplitsList,
}

impl Field {
    fn name(self) -> &'static str {
        match self {
            Field::File => "file",
            Field::FileList => "file_list",
            Field::Trimmed => "trimmed",
            Field::SplitsList => "splits_list",
        }
    }
}

/// Dotted `<component>.<field>` path, e.g. `video.file_list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldPath {
    pub(crate) component: Modality,
    pub(crate) field: Field,
}

impl FromStr for FieldPath {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unknown = || AppError::UnknownField {
            input: s.to_string(),
        };
        let (component, field) = s.trim().split_once('.').ok_or_else(unknown)?;
        let component = match component {
            "video" => Modality::Video,
            "audio" => Modality::Audio,
            "midi" => Modality::Midi,
            "flac" => Modality::Flac,
            _ => return Err(unknown()),
        };
        let field = match field {
            "file" => Field::File,
            "file_list" => Field::FileList,
            "trimmed" => Field::Trimmed,
            "splits_list" => Field::SplitsList,
            _ => return Err(unknown()),
        };
        Ok(Self { component, field })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component.name(), self.field.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum Stage {
    Unresolved,
    Merged,
    Split,
}

/// What the split step needs to know about the performance, read off the MIDI file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Performance {
    pub(crate) session: SessionId,
    pub(crate) midi: PathBuf,
    pub(crate) sustain_pedal_threshold: u8,
}

/// Outcome of adding a discovered file to a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Placement {
    Added,
    SlotTaken,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct Session {
    id: SessionId,
    stage: Stage,
    pub(crate) video: SessionFile,
    pub(crate) audio: SessionFile,
    pub(crate) midi: SessionFile,
    pub(crate) flac: SessionFile,
}

impl Session {
    pub(crate) fn new(id: SessionId) -> Self {
        Self {
            id,
            stage: Stage::Unresolved,
            video: SessionFile::default(),
            audio: SessionFile::default(),
            midi: SessionFile::default(),
            flac: SessionFile::default(),
        }
    }

    pub(crate) fn id(&self) -> &SessionId {
        &self.id
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }

    pub(crate) fn component(&self, modality: Modality) -> &SessionFile {
        match modality {
            Modality::Video => &self.video,
            Modality::Audio => &self.audio,
            Modality::Midi => &self.midi,
            Modality::Flac => &self.flac,
        }
    }

    fn component_mut(&mut self, modality: Modality) -> &mut SessionFile {
        match modality {
            Modality::Video => &mut self.video,
            Modality::Audio => &mut self.audio,
            Modality::Midi => &mut self.midi,
            Modality::Flac => &mut self.flac,
        }
    }

    pub(crate) fn has(&self, path: &FieldPath) -> bool {
        self.component(path.component).has(path.field)
    }

    /// Add a file found during discovery. The caller has already classified it
    /// and matched its identity to this session.
    pub(crate) fn add_discovered(&mut self, path: PathBuf, classified: &Classified) -> Placement {
        debug_assert_eq!(classified.id, self.id);
        if self
            .component_mut(classified.modality)
            .place(classified.slot, path, false)
        {
            Placement::Added
        } else {
            Placement::SlotTaken
        }
    }

    /// Attach merge outputs, classifying each by name. Outputs replace any
    /// single file already in their slot.
    pub(crate) fn with_artifacts(mut self, artifacts: &[PathBuf]) -> Result<Self, SessionError> {
        for path in artifacts {
            let classified = classify(path).ok_or_else(|| SessionError::Unclassified {
                path: path.clone(),
            })?;
            if classified.id != self.id {
                return Err(SessionError::IdentityMismatch {
                    path: path.clone(),
                    expected: self.id.clone(),
                    found: classified.id,
                });
            }
            self.component_mut(classified.modality)
                .place(classified.slot, path.clone(), true);
        }
        self.stage = Stage::Merged;
        Ok(self)
    }

    pub(crate) fn into_split(mut self) -> Self {
        self.stage = Stage::Split;
        self
    }

    /// The pipeline merges whenever either unified stream is missing.
    pub(crate) fn needs_merge(&self) -> bool {
        self.audio.file.is_none() || self.video.file.is_none()
    }

    pub(crate) fn performance(&self) -> Result<Performance, SessionError> {
        let midi = self.midi.file.clone().ok_or_else(|| SessionError::MissingComponent {
            id: self.id.clone(),
            what: "midi file",
        })?;
        Ok(Performance {
            session: self.id.clone(),
            midi,
            sustain_pedal_threshold: SUSTAIN_PEDAL_THRESHOLD,
        })
    }

    /// Resolved single file of a component, or a `MissingComponent` error.
    pub(crate) fn require_file(&self, modality: Modality) -> Result<&Path, SessionError> {
        self.component(modality)
            .file
            .as_deref()
            .ok_or_else(|| SessionError::MissingComponent {
                id: self.id.clone(),
                what: match modality {
                    Modality::Video => "unified video file",
                    Modality::Audio => "unified audio file",
                    Modality::Midi => "midi file",
                    Modality::Flac => "flac file",
                },
            })
    }

    pub(crate) fn all_files(&self) -> Vec<&PathBuf> {
        [&self.audio, &self.video, &self.midi, &self.flac]
            .into_iter()
            .flat_map(SessionFile::files)
            .collect()
    }
}
