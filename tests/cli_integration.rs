use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "r3curate-{prefix}-{}-{nanos}",
        std::process::id()
    ));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write_file(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dirs");
    }
    fs::write(path, content).expect("write test file");
}

/// Runs the binary with an isolated config file so user settings never leak in.
fn run_r3curate(root: &Path, config: &str, args: &[&str]) -> (i32, Vec<u8>, Vec<u8>) {
    let bin = std::env::var("CARGO_BIN_EXE_r3curate").unwrap_or_else(|_| {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("target");
        path.push("debug");
        if cfg!(windows) {
            path.push("r3curate.exe");
        } else {
            path.push("r3curate");
        }
        path.to_string_lossy().into_owned()
    });
    let config_path = root.join("config.toml");
    write_file(&config_path, config);

    let output = Command::new(bin)
        .arg("--config")
        .arg(&config_path)
        .arg("--no-progress")
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("run r3curate");
    (
        output.status.code().unwrap_or(-1),
        output.stdout,
        output.stderr,
    )
}

fn s(path: &Path) -> &str {
    path.to_str().expect("utf-8 temp path")
}

#[test]
fn hash_then_verify_detects_modified_video() {
    let root = unique_temp_dir("verify");
    let videos = root.join("videos");
    let hash_file = root.join("hashes.tsv");
    write_file(&videos.join("2022-03-15").join("rach3_2022-03-15_a_p001.mp4"), "first part");
    write_file(&videos.join("2022-03-15").join("rach3_2022-03-15_a_p002.mp4"), "second part");
    write_file(&videos.join("2022-03-16").join("rach3_2022-03-16_a_p001.mp4"), "next day");

    let (code, stdout, stderr) = run_r3curate(
        &root,
        "",
        &["hash", "--hash-file", s(&hash_file), "--video-dir", s(&videos), "--json"],
    );
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["computed"], 3);
    assert_eq!(json["total"], 3);

    let store = fs::read_to_string(&hash_file).expect("hash store");
    let mut lines = store.lines();
    assert_eq!(lines.next(), Some("# filename\thash"));
    for line in lines {
        let (name, hash) = line.split_once('\t').expect("tab-separated row");
        assert!(name.ends_with(".mp4"));
        assert_eq!(hash.len(), 32);
    }

    // Second run finds nothing new
    let (code, stdout, _) = run_r3curate(
        &root,
        "",
        &["hash", "--hash-file", s(&hash_file), "--video-dir", s(&videos), "--json"],
    );
    assert_eq!(code, 0);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["computed"], 0);
    assert_eq!(json["already_known"], 3);

    let verify_args = [
        "verify",
        "--hash-file",
        s(&hash_file),
        "--video-dir",
        s(&videos),
        "--json",
    ];
    let (code, stdout, _) = run_r3curate(&root, "", &verify_args);
    assert_eq!(code, 0);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["intact"], true);
    assert_eq!(json["checked"], 3);

    write_file(&videos.join("2022-03-15").join("rach3_2022-03-15_a_p002.mp4"), "second");
    let (code, stdout, _) = run_r3curate(&root, "", &verify_args);
    assert_eq!(code, 1);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["intact"], false);
    let mismatched = json["mismatched"].as_array().expect("array");
    assert_eq!(mismatched.len(), 1);
    assert!(mismatched[0].as_str().unwrap().ends_with("rach3_2022-03-15_a_p002.mp4"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn hash_settings_can_come_from_config() {
    let root = unique_temp_dir("hash-config");
    let videos = root.join("videos");
    let hash_file = root.join("nested").join("hashes.tsv");
    write_file(&videos.join("day").join("rach3_2022-03-15_a_p001.mp4"), "video");

    let config = format!(
        "[integrity]\nhash_file = {:?}\nvideo_dirs = [{:?}]\n",
        s(&hash_file),
        s(&videos)
    );
    let (code, _, stderr) = run_r3curate(&root, &config, &["hash"]);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    assert!(hash_file.exists());

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn diff_reports_both_sides_symmetrically() {
    let root = unique_temp_dir("diff");
    let left = root.join("left");
    let right = root.join("right");
    write_file(&left.join("rach3_2022-03-15_a.mid"), "x");
    write_file(&left.join("rach3_2022-03-16_a.mid"), "x");
    write_file(&left.join("shared.mid"), "x");
    write_file(&right.join("shared.mid"), "x");
    write_file(&right.join("rach3_2022-04-01_b.flac"), "x");

    let (code, stdout, stderr) = run_r3curate(&root, "", &["diff", s(&left), s(&right), "--json"]);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let forward: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(
        forward["only_in_left"],
        serde_json::json!(["rach3_2022-03-15_a.mid", "rach3_2022-03-16_a.mid"])
    );
    assert_eq!(forward["only_in_right"], serde_json::json!(["rach3_2022-04-01_b.flac"]));

    let (_, stdout, _) = run_r3curate(&root, "", &["diff", s(&right), s(&left), "--json"]);
    let backward: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(forward["only_in_left"], backward["only_in_right"]);
    assert_eq!(forward["only_in_right"], backward["only_in_left"]);

    let (_, stdout, _) = run_r3curate(
        &root,
        "",
        &["diff", s(&left), s(&right), "--ext", "mid", "--since", "20220316", "--json"],
    );
    let filtered: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(filtered["only_in_left"], serde_json::json!(["rach3_2022-03-16_a.mid"]));
    assert_eq!(filtered["only_in_right"], serde_json::json!([]));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn diff_missing_directory_fails() {
    let root = unique_temp_dir("diff-missing");
    let left = root.join("left");
    fs::create_dir_all(&left).unwrap();
    let missing = root.join("absent");

    let (code, _, stderr) = run_r3curate(&root, "", &["diff", s(&left), s(&missing)]);
    assert_eq!(code, 1);
    assert!(String::from_utf8_lossy(&stderr).contains("Directory does not exist"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn sessions_lists_usable_and_incomplete() {
    let root = unique_temp_dir("sessions");
    let data = root.join("data");
    for name in [
        "rach3_2022-03-15_a_p001.mp4",
        "rach3_2022-03-15_a_p002.mp4",
        "rach3_2022-03-15_a.mid",
        "rach3_2022-03-15_a.flac",
        "rach3_2022-03-16_b_p001.mp4",
        "rach3_2022-03-16_b.flac",
        "notes.mid",
    ] {
        write_file(&data.join(name), "x");
    }

    let (code, stdout, stderr) =
        run_r3curate(&root, "", &["sessions", "--root_dir", s(&data), "--json"]);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["total"], 2);
    assert_eq!(json["usable"], 1);

    let sessions = json["sessions"].as_array().expect("array");
    assert_eq!(sessions[0]["id"], "rach3_2022-03-15_a");
    assert_eq!(sessions[0]["usable"], true);
    assert_eq!(sessions[0]["video"]["file_list"].as_array().unwrap().len(), 2);
    assert_eq!(sessions[1]["id"], "rach3_2022-03-16_b");
    assert_eq!(sessions[1]["usable"], false);

    let unaffiliated = json["unaffiliated"].as_array().expect("array");
    assert_eq!(unaffiliated.len(), 1);
    assert_eq!(unaffiliated[0]["reason"], "unrecognized_name");

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn sessions_rejects_unknown_required_field() {
    let root = unique_temp_dir("sessions-field");
    let (code, _, stderr) = run_r3curate(
        &root,
        "",
        &["sessions", "--root_dir", s(&root), "--required", "video.colour"],
    );
    assert_eq!(code, 1);
    assert!(String::from_utf8_lossy(&stderr).contains("Unknown session field"));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn pipeline_rejects_output_path_with_extension() {
    let root = unique_temp_dir("pipeline-output");
    let output = root.join("out.txt");

    let (code, _, stderr) = run_r3curate(
        &root,
        "",
        &["pipeline", "--root_dir", s(&root), "--output_dir", s(&output)],
    );
    assert_eq!(code, 1);
    assert!(String::from_utf8_lossy(&stderr).contains("should be a directory"));
    assert!(!output.exists());

    let _ = fs::remove_dir_all(&root);
}

fn write_unified_session(data: &Path) {
    for name in [
        "rach3_2022-03-15_a_full.mp4",
        "rach3_2022-03-15_a_full.aac",
        "rach3_2022-03-15_a.mid",
        "rach3_2022-03-15_a.flac",
    ] {
        write_file(&data.join(name), "x");
    }
}

#[test]
fn pipeline_failure_is_per_session() {
    let root = unique_temp_dir("pipeline-nosplit");
    let data = root.join("data");
    let output = root.join("out");
    write_unified_session(&data);

    let (code, stdout, stderr) = run_r3curate(
        &root,
        "",
        &[
            "pipeline",
            "--root_dir",
            s(&data),
            "--output_dir",
            s(&output),
            "--required",
            "midi.file",
            "flac.file",
            "--json",
        ],
    );
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["usable"], 1);
    assert_eq!(json["processed"], serde_json::json!([]));
    assert_eq!(json["failures"][0]["id"], "rach3_2022-03-15_a");
    assert_eq!(json["failures"][0]["step"], "splitting");
    assert_eq!(
        fs::read_to_string(output.join("processed_sessions.txt")).unwrap(),
        ""
    );

    let _ = fs::remove_dir_all(&root);
}

#[cfg(unix)]
#[test]
fn pipeline_records_sessions_split_by_configured_command() {
    use std::os::unix::fs::PermissionsExt;

    let root = unique_temp_dir("pipeline-split");
    let data = root.join("data");
    let output = root.join("out");
    write_unified_session(&data);

    let splitter = root.join("splitter.sh");
    write_file(&splitter, "#!/bin/sh\nexit 0\n");
    fs::set_permissions(&splitter, fs::Permissions::from_mode(0o755)).unwrap();
    let config = format!(
        "[pipeline]\nrequired = [\"midi.file\", \"flac.file\"]\n\n[media]\nsplit_command = [{:?}]\n",
        s(&splitter)
    );

    let args = [
        "pipeline",
        "--root_dir",
        s(&data),
        "--output_dir",
        s(&output),
        "--json",
    ];
    let (code, stdout, stderr) = run_r3curate(&root, &config, &args);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["processed"], serde_json::json!(["rach3_2022-03-15_a"]));
    assert_eq!(
        fs::read_to_string(output.join("processed_sessions.txt")).unwrap(),
        "rach3_2022-03-15_a\n"
    );

    // Resume skips what the ledger already holds
    let mut resumed = args.to_vec();
    resumed.push("--resume");
    let (code, stdout, _) = run_r3curate(&root, &config, &resumed);
    assert_eq!(code, 0);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["skipped"], serde_json::json!(["rach3_2022-03-15_a"]));
    assert_eq!(json["processed"], serde_json::json!([]));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn hash_resumes_after_interrupted_store_write() {
    let root = unique_temp_dir("hash-resume");
    let videos = root.join("videos");
    let hash_file = root.join("hashes.tsv");
    write_file(&videos.join("2022-03-15").join("rach3_2022-03-15_a_p001.mp4"), "first part");
    write_file(&videos.join("2022-03-15").join("rach3_2022-03-15_a_p002.mp4"), "second part");
    let args = ["hash", "--hash-file", s(&hash_file), "--video-dir", s(&videos), "--json"];

    let (code, _, stderr) = run_r3curate(&root, "", &args);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let complete = fs::read_to_string(&hash_file).unwrap();

    // Leave the last row half written
    fs::write(&hash_file, &complete[..complete.len() - 10]).unwrap();
    let (code, stdout, stderr) = run_r3curate(&root, "", &args);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["computed"], 1);
    assert_eq!(json["already_known"], 1);
    assert_eq!(fs::read_to_string(&hash_file).unwrap(), complete);

    let verify = ["verify", "--hash-file", s(&hash_file), "--video-dir", s(&videos)];
    let (code, _, stderr) = run_r3curate(&root, "", &verify);
    assert_eq!(code, 0, "stderr: {}", String::from_utf8_lossy(&stderr));

    let _ = fs::remove_dir_all(&root);
}

#[test]
fn check_reports_misaligned_splits_and_cleans() {
    let root = unique_temp_dir("check");
    let splits = root.join("splits");
    for n in 1..=2 {
        for ext in ["mp4", "flac", "mid"] {
            write_file(&splits.join(format!("rach3_2022-03-15_a_split{n}.{ext}")), "take");
        }
    }
    write_file(&splits.join("rach3_2022-03-16_a_split1.mp4"), "take");
    write_file(&splits.join("rach3_2022-03-16_a_split1.flac"), "take");
    write_file(&splits.join("rach3_2022-03-16_a_split2.mid"), "take");
    let csv = root.join("issues.csv");

    let (code, _, stderr) = run_r3curate(
        &root,
        "",
        &["check", "--root_dir", s(&splits), "-o", s(&csv), "--clean"],
    );
    assert_eq!(code, 1, "stderr: {}", String::from_utf8_lossy(&stderr));
    let written = fs::read_to_string(&csv).unwrap();
    let lines: Vec<&str> = written.lines().collect();
    assert_eq!(lines[0], "session_id,video_path,flac_path,issue");
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with("rach3_2022-03-16_a,"));
    assert!(lines[1].ends_with("\"split numbers differ: video 1, flac 1, midi 2\""));

    assert!(splits.join("rach3_2022-03-15_a_split2.mid").exists());
    assert!(!splits.join("rach3_2022-03-16_a_split1.mp4").exists());
    assert!(!splits.join("rach3_2022-03-16_a_split2.mid").exists());

    // Only consistent sessions remain
    let (code, stdout, _) = run_r3curate(&root, "", &["check", "--root_dir", s(&splits), "--json"]);
    assert_eq!(code, 0);
    let json: Value = serde_json::from_slice(&stdout).expect("json");
    assert_eq!(json["consistent"], true);
    assert_eq!(json["checked"], 1);

    let _ = fs::remove_dir_all(&root);
}
