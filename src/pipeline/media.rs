//! Merge and split collaborators
//!
//! `FfmpegTools` merges raw captures with `ffmpeg` and hands splitting to an
//! external command, since MIDI-guided alignment lives outside this crate.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::MediaError;
use crate::session::{Performance, Session};

/// Everything the split step consumes for one session.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SplitRequest<'a> {
    pub(crate) midi: &'a Path,
    pub(crate) flac: &'a Path,
    pub(crate) audio: &'a Path,
    pub(crate) performance: &'a Performance,
    pub(crate) video: &'a Path,
    pub(crate) output_dir: &'a Path,
    pub(crate) overwrite: bool,
}

pub(crate) trait MediaTools {
    /// Produce unified video and/or audio for a session inside `scratch`.
    /// Without `overwrite`, existing targets are kept and still returned.
    /// On failure, nothing the call wrote is left in `scratch`.
    fn merge(
        &self,
        session: &Session,
        scratch: &Path,
        overwrite: bool,
        reencode: bool,
    ) -> Result<Vec<PathBuf>, MediaError>;

    /// Write the final segments into the request's output directory.
    fn split(&self, request: &SplitRequest<'_>) -> Result<(), MediaError>;
}

pub(crate) struct FfmpegTools {
    ffmpeg: String,
    split_command: Vec<String>,
}

impl FfmpegTools {
    pub(crate) fn new(ffmpeg: String, split_command: Vec<String>) -> Self {
        Self {
            ffmpeg,
            split_command,
        }
    }

    fn run(&self, program: &str, mut command: Command) -> Result<(), MediaError> {
        debug!(?command, "running");
        let output = command
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    MediaError::NotFound {
                        program: program.to_string(),
                    }
                } else {
                    MediaError::Spawn {
                        program: program.to_string(),
                        source: e,
                    }
                }
            })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(MediaError::Failed {
                program: program.to_string(),
                status: output.status,
                stderr: stderr.trim().to_string(),
            })
        }
    }

    fn ffmpeg(&self) -> Command {
        let mut command = Command::new(&self.ffmpeg);
        command.args(["-hide_banner", "-loglevel", "error", "-y"]);
        command
    }

    /// Concatenate parts with the concat demuxer.
    fn concat(
        &self,
        parts: &[PathBuf],
        list_file: &Path,
        target: &Path,
        codec_args: &[&str],
    ) -> Result<(), MediaError> {
        let mut list = String::new();
        for part in parts {
            let absolute = fs::canonicalize(part).unwrap_or_else(|_| part.clone());
            let escaped = absolute.to_string_lossy().replace('\'', r"'\''");
            list.push_str(&format!("file '{escaped}'\n"));
        }
        fs::write(list_file, list).map_err(|source| MediaError::Io {
            path: list_file.to_path_buf(),
            source,
        })?;

        let mut command = self.ffmpeg();
        command
            .args(["-f", "concat", "-safe", "0", "-i"])
            .arg(list_file)
            .args(codec_args)
            .arg(target);
        let result = self.run(&self.ffmpeg, command);
        let _ = fs::remove_file(list_file);
        result
    }

    fn extract_audio(&self, video: &Path, target: &Path) -> Result<(), MediaError> {
        let mut command = self.ffmpeg();
        command
            .arg("-i")
            .arg(video)
            .args(["-vn", "-c:a", "copy"])
            .arg(target);
        self.run(&self.ffmpeg, command)
    }

    /// Targets are pushed before they are written, so a failed step leaves
    /// its partial output listed too.
    fn merge_into(
        &self,
        session: &Session,
        scratch: &Path,
        overwrite: bool,
        reencode: bool,
        produced: &mut Vec<PathBuf>,
    ) -> Result<(), MediaError> {
        let id = session.id();

        let video = match &session.video.file {
            Some(existing) => existing.clone(),
            None => {
                if session.video.file_list.is_empty() {
                    return Err(MediaError::NothingToMerge {
                        what: format!("video parts for {id}"),
                    });
                }
                let target = scratch.join(format!("{id}_full.mp4"));
                produced.push(target.clone());
                if overwrite || !target.exists() {
                    let codec: &[&str] = if reencode {
                        &["-c:v", "libx264", "-preset", "fast", "-crf", "18", "-c:a", "aac"]
                    } else {
                        &["-c", "copy"]
                    };
                    let list = scratch.join(format!("{id}_video_parts.txt"));
                    self.concat(&session.video.file_list, &list, &target, codec)?;
                }
                target
            }
        };

        if session.audio.file.is_none() {
            let target = scratch.join(format!("{id}_full.aac"));
            produced.push(target.clone());
            if overwrite || !target.exists() {
                if session.audio.file_list.is_empty() {
                    self.extract_audio(&video, &target)?;
                } else {
                    let list = scratch.join(format!("{id}_audio_parts.txt"));
                    self.concat(&session.audio.file_list, &list, &target, &["-c", "copy"])?;
                }
            }
        }
        Ok(())
    }
}

impl MediaTools for FfmpegTools {
    fn merge(
        &self,
        session: &Session,
        scratch: &Path,
        overwrite: bool,
        reencode: bool,
    ) -> Result<Vec<PathBuf>, MediaError> {
        let mut produced = Vec::new();
        match self.merge_into(session, scratch, overwrite, reencode, &mut produced) {
            Ok(()) => Ok(produced),
            Err(e) => {
                for path in &produced {
                    if let Err(err) = fs::remove_file(path)
                        && err.kind() != std::io::ErrorKind::NotFound
                    {
                        warn!(path = %path.display(), error = %err, "failed to remove partial merge output");
                    }
                }
                Err(e)
            }
        }
    }

    fn split(&self, request: &SplitRequest<'_>) -> Result<(), MediaError> {
        let Some((program, base_args)) = self.split_command.split_first() else {
            return Err(MediaError::NoSplitCommand);
        };

        let mut command = Command::new(program);
        command
            .args(base_args)
            .arg("--midi")
            .arg(request.midi)
            .arg("--flac")
            .arg(request.flac)
            .arg("--audio")
            .arg(request.audio)
            .arg("--video")
            .arg(request.video)
            .arg("--output-dir")
            .arg(request.output_dir)
            .arg("--session")
            .arg(request.performance.session.to_string())
            .arg("--sustain-threshold")
            .arg(request.performance.sustain_pedal_threshold.to_string());
        if request.overwrite {
            command.arg("--overwrite");
        }
        self.run(program, command)
    }
}
