use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn mdnb(args: &[&str], dir: &Path) -> Output {
    Command::new(env!("CARGO_BIN_EXE_mdnb"))
        .args(args)
        .current_dir(dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run mdnb")
}

fn fixtures() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../fixtures")
}

#[test]
fn fixture_suite_passes() {
    let dir = tempfile::tempdir().unwrap();
    let root = fixtures();
    let out = mdnb(&["--no-color", "test", root.to_str().unwrap()], dir.path());
    assert!(
        out.status.success(),
        "{}",
        String::from_utf8_lossy(&out.stderr)
    );
}

#[test]
fn bare_file_converts() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("guide.md"),
        "# Guide\n```bash\nls\n```\n```python\nx = 1\n```\n",
    )
    .unwrap();

    let out = mdnb(&["guide.md"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("Notebook created: guide.ipynb"), "{stdout}");
    assert!(stdout.contains("   - Code cells: 3 (1 shell)"), "{stdout}");

    let json = std::fs::read_to_string(dir.path().join("guide.ipynb")).unwrap();
    assert!(json.contains("\"%%bash\\n\""));
    assert!(json.ends_with("}\n"));
}

#[test]
fn unterminated_fence_fails_without_output() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("broken.md"), "text\n```python\nx = 1\n").unwrap();

    let out = mdnb(&["--no-color", "convert", "broken.md", "-o", "out.ipynb"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unterminated code fence opened on line 2"), "{stderr}");
    assert!(!dir.path().join("out.ipynb").exists());
}

#[test]
fn check_lists_failures_and_exits_nonzero() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("guide.md"),
        "```python\nx = 1\n```\n```python\nprint('x'\n```\n",
    )
    .unwrap();

    let out = mdnb(&["check", "guide.md"], dir.path());
    assert_eq!(out.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("guide.md:5:"), "{stdout}");
    assert!(stdout.contains("2 code blocks checked, 1 with syntax errors"), "{stdout}");
}

#[test]
fn check_reads_converted_notebooks() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("guide.md"),
        "# Guide\n```python\nimport os\n```\n```bash\nnot ( python\n```\n",
    )
    .unwrap();

    assert!(mdnb(&["convert", "guide.md", "--anchors"], dir.path()).status.success());
    let out = mdnb(&["check", "guide.ipynb"], dir.path());
    assert!(out.status.success(), "{}", String::from_utf8_lossy(&out.stdout));
}

#[test]
fn config_file_sets_defaults() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("mdnb.toml"),
        "[convert]\ninclude_setup_cell = false\ninclude_toc = false\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("guide.md"), "# Guide\n").unwrap();

    let out = mdnb(&["convert", "guide.md"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("   - Total cells: 1"), "{stdout}");
}

#[test]
fn segments_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("guide.md"), "intro\n```sh\nls\n```\n").unwrap();

    let out = mdnb(&["segments", "guide.md"], dir.path());
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].contains("prose"));
    assert!(lines[1].contains("code") && lines[1].ends_with("sh"));
}
