/// Standard date format used in dataset file names: "2022-03-15"
pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";

/// Header line written at the top of every hash store
pub(crate) const HASH_STORE_HEADER: &str = "# filename\thash";

/// Ledger of successfully processed sessions, kept in the output directory
pub(crate) const LEDGER_FILE: &str = "processed_sessions.txt";

/// Default pipeline output directory
pub(crate) const DEFAULT_OUTPUT_DIR: &str = "./processed_audio";

/// Extensions scanned by the pipeline when none are configured
pub(crate) const DEFAULT_EXTENSIONS: &[&str] = &["mp4", "mid", "flac", "aac"];

/// Fields a session needs before the pipeline will touch it
pub(crate) const DEFAULT_REQUIRED_FIELDS: &[&str] = &["video.file_list", "midi.file", "flac.file"];

/// Fields a session needs before its splits can be compared
pub(crate) const SPLIT_FIELDS: &[&str] = &["video.splits_list", "flac.splits_list", "midi.splits_list"];

/// Extensions scanned by the split consistency check
pub(crate) const SPLIT_EXTENSIONS: &[&str] = &["mp4", "flac", "mid"];

/// Sustain pedal threshold applied to every loaded performance
pub(crate) const SUSTAIN_PEDAL_THRESHOLD: u8 = 127;
