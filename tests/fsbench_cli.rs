use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::Command;

#[cfg(unix)]
const STAT_STRATEGY: &str = "stat";
#[cfg(windows)]
const STAT_STRATEGY: &str = "attrs-ex";

#[cfg(unix)]
const WALK_STRATEGY: &str = "readdir";
#[cfg(windows)]
const WALK_STRATEGY: &str = "find";

fn binary_output(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_fsbench"))
        .args(args)
        .output()
        .unwrap_or_else(|error| panic!("failed to run fsbench: {error}"))
}

fn build_tree(root: &Path) {
    fs::write(root.join("a.txt"), b"a").expect("write a");
    fs::write(root.join("b.txt"), b"b").expect("write b");
    fs::write(root.join("c.txt"), b"c").expect("write c");
    let sub = root.join("sub");
    fs::create_dir(&sub).expect("mkdir");
    fs::write(sub.join("d.txt"), b"d").expect("write d");
    fs::write(sub.join("e.txt"), b"e").expect("write e");
}

#[test]
fn help_lists_usage() {
    let output = binary_output(&["--help"]);
    assert!(output.status.success(), "--help should succeed");
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    assert!(stdout.contains("Usage"));
    assert!(stdout.contains("fsbench"));
}

#[test]
fn unknown_subcommand_exits_with_usage_status() {
    let output = binary_output(&["teleport"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn avg_divides_and_truncates() {
    let output = binary_output(&["avg", "600", "3"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"200\n");

    let output = binary_output(&["avg", "7", "2"]);
    assert!(output.status.success());
    assert_eq!(output.stdout, b"3\n");
}

#[test]
fn walk_reports_the_entry_count_on_stderr() {
    let temp = tempfile::tempdir().expect("tempdir");
    build_tree(temp.path());

    let root = temp.path().to_str().expect("utf8 path");
    let output = binary_output(&["walk", "-w", WALK_STRATEGY, "-s", STAT_STRATEGY, root]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("entries: 6"), "{stderr}");
    assert!(stderr.contains("full time:"), "{stderr}");
    assert!(stderr.contains("time per entry:"), "{stderr}");
    assert!(output.stdout.is_empty(), "no result was requested");
}

#[test]
fn result_flag_prints_a_bare_integer_on_stdout() {
    let temp = tempfile::tempdir().expect("tempdir");
    build_tree(temp.path());

    let root = temp.path().to_str().expect("utf8 path");
    let output = binary_output(&[
        "walk",
        "-w",
        WALK_STRATEGY,
        "-r",
        "--repeat",
        "2",
        "--warm-up",
        root,
    ]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8(output.stdout).expect("stdout is UTF-8");
    stdout
        .trim()
        .parse::<u64>()
        .expect("stdout should carry only the per-entry nanosecond figure");
}

#[test]
fn stat_times_a_path_list() {
    let temp = tempfile::tempdir().expect("tempdir");
    let file = temp.path().join("dated.txt");
    fs::write(&file, b"x").expect("write");
    filetime::set_file_mtime(&file, filetime::FileTime::from_unix_time(1_700_000_000, 0))
        .expect("set mtime");

    let list = temp.path().join("paths.txt");
    let mut handle = fs::File::create(&list).expect("create list");
    writeln!(handle, "{}", file.display()).expect("write list");
    writeln!(handle, "{}", temp.path().display()).expect("write list");
    drop(handle);

    let list = list.to_str().expect("utf8 path");
    let output = binary_output(&["stat", "-s", STAT_STRATEGY, list]);
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("entries: 2"), "{stderr}");
}

#[test]
fn empty_tree_is_a_runtime_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let root = temp.path().to_str().expect("utf8 path");
    let output = binary_output(&["walk", "-w", WALK_STRATEGY, root]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("no entries"), "{stderr}");
}

#[test]
fn missing_path_list_is_a_runtime_failure() {
    let temp = tempfile::tempdir().expect("tempdir");
    let list = temp.path().join("gone.txt");
    let list = list.to_str().expect("utf8 path");
    let output = binary_output(&["stat", "-s", STAT_STRATEGY, list]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8(output.stderr).expect("stderr is UTF-8");
    assert!(stderr.contains("failed to read path list"), "{stderr}");
}
