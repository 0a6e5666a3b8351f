use serde::Serialize;

use std::path::PathBuf;

use crate::integrity::{ComputeSummary, DirDiff, SplitReport, VerifyReport};
use crate::pipeline::RunSummary;
use crate::session::{FieldPath, Session, Unaffiliated, is_complete};

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| {
        eprintln!("Failed to serialize JSON output: {}", e);
        "{}".to_string()
    })
}

pub(crate) fn output_sessions_json(
    sessions: &[Session],
    required: &[FieldPath],
    unaffiliated: &[Unaffiliated],
) -> String {
    let rows: Vec<_> = sessions
        .iter()
        .map(|session| {
            let mut obj = serde_json::to_value(session).unwrap_or(serde_json::Value::Null);
            if let Some(map) = obj.as_object_mut() {
                map.insert(
                    "usable".to_string(),
                    serde_json::json!(is_complete(session, required)),
                );
            }
            obj
        })
        .collect();
    let usable = sessions
        .iter()
        .filter(|session| is_complete(session, required))
        .count();
    let required: Vec<String> = required.iter().map(ToString::to_string).collect();

    to_json(&serde_json::json!({
        "required": required,
        "total": sessions.len(),
        "usable": usable,
        "sessions": rows,
        "unaffiliated": unaffiliated,
    }))
}

pub(crate) fn output_run_json(summary: &RunSummary) -> String {
    to_json(summary)
}

pub(crate) fn output_hash_json(summary: &ComputeSummary, total: usize) -> String {
    to_json(&serde_json::json!({
        "computed": summary.computed,
        "already_known": summary.already_known,
        "unstorable": summary.unstorable,
        "total": total,
    }))
}

pub(crate) fn output_verify_json(report: &VerifyReport) -> String {
    to_json(&serde_json::json!({
        "intact": report.is_intact(),
        "checked": report.checked,
        "untracked": report.untracked,
        "mismatched": report.mismatched,
    }))
}

pub(crate) fn output_diff_json(diff: &DirDiff) -> String {
    to_json(diff)
}

pub(crate) fn output_split_json(report: &SplitReport, removed: &[PathBuf]) -> String {
    to_json(&serde_json::json!({
        "consistent": report.is_consistent(),
        "checked": report.checked,
        "invalid_sessions": report.invalid_sessions(),
        "issues": report.issues,
        "removed": removed,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::integrity::SplitIssue;
    use crate::session::{PathIndex, SessionId, parse_fields};

    #[test]
    fn verify_json_flags_mismatch() {
        let report = VerifyReport {
            checked: 2,
            untracked: 1,
            mismatched: vec![PathBuf::from("/v/2022-03-15/a.mp4")],
        };
        let value: serde_json::Value = serde_json::from_str(&output_verify_json(&report)).unwrap();
        assert_eq!(value["intact"], false);
        assert_eq!(value["checked"], 2);
        assert_eq!(value["mismatched"][0], "/v/2022-03-15/a.mp4");
    }

    #[test]
    fn diff_json_has_both_sides() {
        let diff = DirDiff {
            only_in_left: vec!["a.mid".to_string()],
            only_in_right: Vec::new(),
        };
        let value: serde_json::Value = serde_json::from_str(&output_diff_json(&diff)).unwrap();
        assert_eq!(value["only_in_left"][0], "a.mid");
        assert_eq!(value["only_in_right"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn split_json_lists_each_invalid_session_once() {
        let id = SessionId::new("rach3", "2022-03-15", 'a');
        let issue = |text: &str| SplitIssue {
            session: id.clone(),
            video: None,
            flac: None,
            issue: text.to_string(),
        };
        let report = SplitReport {
            checked: 3,
            issues: vec![issue("empty video split"), issue("empty flac split")],
        };
        let value: serde_json::Value =
            serde_json::from_str(&output_split_json(&report, &[])).unwrap();
        assert_eq!(value["consistent"], false);
        assert_eq!(value["checked"], 3);
        assert_eq!(value["invalid_sessions"], serde_json::json!(["rach3_2022-03-15_a"]));
        assert_eq!(value["issues"][1]["issue"], "empty flac split");
        assert_eq!(value["issues"][0]["video"], serde_json::Value::Null);
    }

    #[test]
    fn sessions_json_marks_usable() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("rach3_2022-03-15_a.mid"), b"x").unwrap();
        let session = PathIndex::new([dir.path().to_path_buf()])
            .extensions(["mid"])
            .discover()
            .sessions
            .remove(0);

        let required = parse_fields(&["midi.file"]).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&output_sessions_json(&[session], &required, &[])).unwrap();
        assert_eq!(value["usable"], 1);
        assert_eq!(value["sessions"][0]["id"], "rach3_2022-03-15_a");
        assert_eq!(value["sessions"][0]["stage"], "unresolved");
        assert_eq!(value["sessions"][0]["usable"], true);
        assert_eq!(value["required"][0], "midi.file");
    }
}
