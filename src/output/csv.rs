use std::fmt::Write;
use std::path::Path;

use crate::integrity::SplitIssue;

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

fn path_field(path: Option<&Path>) -> String {
    path.map(|p| csv_escape(&p.to_string_lossy()))
        .unwrap_or_default()
}

pub(crate) fn output_split_issues_csv(issues: &[SplitIssue]) -> String {
    let mut out = String::from("session_id,video_path,flac_path,issue\n");
    for issue in issues {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            csv_escape(&issue.session.to_string()),
            path_field(issue.video.as_deref()),
            path_field(issue.flac.as_deref()),
            csv_escape(&issue.issue),
        );
    }
    out
}
