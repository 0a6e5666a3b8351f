use std::path::{Path, PathBuf};

use comfy_table::{Cell, Color};

use crate::integrity::{ComputeSummary, DirDiff, SplitReport, VerifyReport};
use crate::pipeline::RunSummary;
use crate::session::{FieldPath, Modality, Session, Unaffiliated, UnaffiliatedReason, is_complete};

use super::format::{
    create_styled_table, format_number, header_cell, right_cell, status_color, styled_cell,
};

const MODALITIES: [Modality; 4] = [Modality::Video, Modality::Audio, Modality::Midi, Modality::Flac];

/// Short description of what a session holds for one modality.
fn component_summary(session: &Session, modality: Modality) -> String {
    let component = session.component(modality);
    let mut parts = Vec::new();
    if component.file.is_some() {
        parts.push("full".to_string());
    }
    if !component.file_list.is_empty() {
        parts.push(format!("{} parts", component.file_list.len()));
    }
    if component.trimmed.is_some() {
        parts.push("trimmed".to_string());
    }
    if !component.splits_list.is_empty() {
        parts.push(format!("{} splits", component.splits_list.len()));
    }
    if parts.is_empty() {
        "-".to_string()
    } else {
        parts.join(", ")
    }
}

fn reason_label(reason: UnaffiliatedReason) -> &'static str {
    match reason {
        UnaffiliatedReason::UnrecognizedName => "unrecognized name",
        UnaffiliatedReason::DuplicateComponent => "duplicate component",
    }
}

pub(crate) fn print_sessions_table(
    sessions: &[Session],
    required: &[FieldPath],
    unaffiliated: &[Unaffiliated],
    use_color: bool,
) {
    if sessions.is_empty() {
        println!("No sessions found.");
    } else {
        let mut table = create_styled_table();
        let mut header = vec![header_cell("Session", use_color), header_cell("Date", use_color)];
        header.extend(MODALITIES.iter().map(|m| header_cell(m.name(), use_color)));
        header.push(header_cell("Files", use_color));
        header.push(header_cell("Usable", use_color));
        table.set_header(header);

        let mut usable = 0;
        for session in sessions {
            let complete = is_complete(session, required);
            if complete {
                usable += 1;
            }
            let mut row = vec![
                Cell::new(session.id().to_string()),
                Cell::new(session.id().date()),
            ];
            row.extend(
                MODALITIES
                    .iter()
                    .map(|m| Cell::new(component_summary(session, *m))),
            );
            row.push(right_cell(
                &format_number(session.all_files().len()),
                None,
                false,
            ));
            row.push(styled_cell(
                if complete { "yes" } else { "no" },
                status_color(complete, use_color),
                false,
            ));
            table.add_row(row);
        }

        println!("\n  Sessions\n");
        println!("{table}");
        println!(
            "\n  {} of {} sessions are usable\n",
            format_number(usable),
            format_number(sessions.len())
        );
    }

    if !unaffiliated.is_empty() {
        let mut table = create_styled_table();
        table.set_header(vec![
            header_cell("Unaffiliated file", use_color),
            header_cell("Reason", use_color),
        ]);
        for file in unaffiliated {
            table.add_row(vec![
                Cell::new(file.path.display().to_string()),
                Cell::new(reason_label(file.reason)),
            ]);
        }
        println!("{table}");
    }
}

pub(crate) fn print_run_summary(summary: &RunSummary, output_dir: &Path, use_color: bool) {
    if !summary.failures.is_empty() {
        let mut table = create_styled_table();
        table.set_header(vec![
            header_cell("Session", use_color),
            header_cell("Step", use_color),
            header_cell("Error", use_color),
        ]);
        let red = status_color(false, use_color);
        for failure in &summary.failures {
            table.add_row(vec![
                Cell::new(failure.id.to_string()),
                styled_cell(&failure.step.to_string(), red, false),
                Cell::new(&failure.message),
            ]);
        }
        println!("\n  Failed sessions\n");
        println!("{table}");
    }

    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Usable", use_color),
        header_cell("Processed", use_color),
        header_cell("Skipped", use_color),
        header_cell("Failed", use_color),
    ]);
    table.add_row(vec![
        right_cell(&format_number(summary.usable), None, false),
        right_cell(
            &format_number(summary.processed.len()),
            status_color(true, use_color),
            true,
        ),
        right_cell(&format_number(summary.skipped.len()), None, false),
        right_cell(
            &format_number(summary.failures.len()),
            status_color(summary.failures.is_empty(), use_color),
            true,
        ),
    ]);
    println!("\n  Pipeline run\n");
    println!("{table}");
    println!("\n  Output written to {}\n", output_dir.display());
}

pub(crate) fn print_hash_summary(summary: &ComputeSummary, hash_file: &Path, total: usize) {
    println!(
        "Hashed {} new videos ({} already known); {} entries in {}",
        format_number(summary.computed),
        format_number(summary.already_known),
        format_number(total),
        hash_file.display()
    );
    for path in &summary.unstorable {
        println!("  skipped (name cannot be stored): {}", path.display());
    }
}

pub(crate) fn print_verify_report(report: &VerifyReport, use_color: bool) {
    if report.is_intact() {
        let text = format!(
            "All {} tracked videos match their stored hashes",
            format_number(report.checked)
        );
        if use_color {
            println!("\x1b[32m{text}\x1b[0m");
        } else {
            println!("{text}");
        }
    } else {
        let mut table = create_styled_table();
        table.set_header(vec![header_cell("Mismatched video", use_color)]);
        let red: Option<Color> = status_color(false, use_color);
        for path in &report.mismatched {
            table.add_row(vec![styled_cell(&path.display().to_string(), red, false)]);
        }
        println!("{table}");
        println!(
            "\n  {} of {} tracked videos do not match\n",
            format_number(report.mismatched.len()),
            format_number(report.checked)
        );
    }
    if report.untracked > 0 {
        println!(
            "{} videos have no stored hash; run `r3curate hash` to add them",
            format_number(report.untracked)
        );
    }
}

pub(crate) fn print_diff(diff: &DirDiff, left: &Path, right: &Path, use_color: bool) {
    if diff.is_empty() {
        println!("{} and {} hold the same names", left.display(), right.display());
        return;
    }

    for (names, side, other) in [
        (&diff.only_in_left, left, right),
        (&diff.only_in_right, right, left),
    ] {
        if names.is_empty() {
            continue;
        }
        let mut table = create_styled_table();
        table.set_header(vec![header_cell(
            &format!("In {} but not in {}", side.display(), other.display()),
            use_color,
        )]);
        for name in names {
            table.add_row(vec![Cell::new(name)]);
        }
        println!("{table}");
    }
}

fn optional_path(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "-".to_string(), |p| p.display().to_string())
}

pub(crate) fn print_split_report(report: &SplitReport, removed: &[PathBuf], use_color: bool) {
    if report.is_consistent() {
        let text = format!(
            "Splits of all {} checked sessions line up",
            format_number(report.checked)
        );
        if use_color {
            println!("\x1b[32m{text}\x1b[0m");
        } else {
            println!("{text}");
        }
        return;
    }

    let mut table = create_styled_table();
    table.set_header(vec![
        header_cell("Session", use_color),
        header_cell("Video split", use_color),
        header_cell("FLAC split", use_color),
        header_cell("Issue", use_color),
    ]);
    let red = status_color(false, use_color);
    for issue in &report.issues {
        table.add_row(vec![
            Cell::new(issue.session.to_string()),
            Cell::new(optional_path(issue.video.as_ref())),
            Cell::new(optional_path(issue.flac.as_ref())),
            styled_cell(&issue.issue, red, false),
        ]);
    }
    println!("\n  Split issues\n");
    println!("{table}");
    println!(
        "\n  {} of {} checked sessions have inconsistent splits\n",
        format_number(report.invalid_sessions().len()),
        format_number(report.checked)
    );
    if !removed.is_empty() {
        println!(
            "Removed {} files of inconsistent sessions",
            format_number(removed.len())
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::PathIndex;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn component_summary_describes_contents() {
        let dir = TempDir::new().unwrap();
        for name in [
            "rach3_2022-03-15_a_p001.mp4",
            "rach3_2022-03-15_a_p002.mp4",
            "rach3_2022-03-15_a_full.mp4",
            "rach3_2022-03-15_a.mid",
        ] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        let session = PathIndex::new([dir.path().to_path_buf()])
            .extensions(["mp4", "mid"])
            .discover()
            .sessions
            .remove(0);

        assert_eq!(component_summary(&session, Modality::Video), "full, 2 parts");
        assert_eq!(component_summary(&session, Modality::Midi), "full");
        assert_eq!(component_summary(&session, Modality::Flac), "-");
    }
}
