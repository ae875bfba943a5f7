use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::inherit_target_languages;

use mdnb::{CellRole, CellType, ConvertOptions, Notebook, Synthesizer};
use validator::{CheckOptions, Outcome};

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TestConfig {
    /// Human-readable test description.
    pub description: Option<String>,

    /// Conversion options for this fixture; unset fields take the defaults.
    pub convert: ConvertOptions,

    /// Validation options, used when a failure expectation is present.
    pub check: CheckOptions,

    /// Expected cells in order, by kind: setup, toc, markdown, code, shell.
    pub expect_cells: Option<Vec<String>>,

    pub expect_code_cells: Option<usize>,
    pub expect_markdown_cells: Option<usize>,
    pub expect_shell_cells: Option<usize>,

    /// Extraction must fail with an unterminated fence opened on this line.
    pub expect_unterminated: Option<usize>,

    /// Number of code blocks the validator must reject.
    pub expect_failures: Option<usize>,

    /// Lines of the rejected blocks' errors, in order.
    pub expect_failure_lines: Option<Vec<usize>>,
}

impl TestConfig {
    fn checks_syntax(&self) -> bool {
        self.expect_failures.is_some() || self.expect_failure_lines.is_some()
    }
}

/// Parse a `.test.md` file into its TOML config and Markdown source. Line
/// numbers in expectations count from the first line after the frontmatter.
fn parse_test_file(content: &str) -> Result<(TestConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}'); // strip BOM

    if !content.starts_with("---") {
        return Err("missing opening --- frontmatter delimiter".into());
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest_start = close_pos + 4; // skip \n---
    let source = after_open[rest_start..]
        .strip_prefix("\r\n")
        .or_else(|| after_open[rest_start..].strip_prefix('\n'))
        .unwrap_or(&after_open[rest_start..]);

    let table: toml::Table =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;
    let mut config: TestConfig = toml::Value::Table(table.clone())
        .try_into()
        .map_err(|e| format!("TOML parse error: {}", e))?;
    inherit_target_languages(&table, &config.convert, &mut config.check);

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("cannot read file: {}", e)),
            };
        }
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => {
            return TestResult {
                path: path.to_path_buf(),
                description: None,
                outcome: TestOutcome::Fail(format!("frontmatter error: {}", e)),
            };
        }
    };

    let outcome = match check_fixture(&config, source) {
        Ok(()) => TestOutcome::Pass,
        Err(reason) => TestOutcome::Fail(reason),
    };
    TestResult {
        path: path.to_path_buf(),
        description: config.description,
        outcome,
    }
}

/// Run every expectation of one fixture. `Err` carries the first mismatch.
fn check_fixture(config: &TestConfig, source: &str) -> Result<(), String> {
    let parsed = mdnb::Parser::new(source.to_string(), 0).parse();

    if let Some(expected_line) = config.expect_unterminated {
        return match parsed {
            Err(err) if err.line() == expected_line => Ok(()),
            Err(err) => Err(format!(
                "expected unterminated fence on line {}, got: {}",
                expected_line, err
            )),
            Ok(_) => Err(format!(
                "expected unterminated fence on line {}, but extraction succeeded",
                expected_line
            )),
        };
    }

    let document = parsed.map_err(|e| format!("unexpected extraction error: {}", e))?;

    if document.to_string() != source {
        return Err("segments do not reproduce the source text".into());
    }

    let notebook = Synthesizer::new(&config.convert)
        .with_source_file("fixture.md")
        .synthesize(&document.segments);
    check_serialization(&notebook)?;
    check_cells(config, &notebook)?;

    if config.checks_syntax() {
        check_syntax(config, &document.segments)?;
    }
    Ok(())
}

/// The written notebook must read back to the same JSON.
fn check_serialization(notebook: &Notebook) -> Result<(), String> {
    let json = notebook
        .to_json()
        .map_err(|e| format!("serialization failed: {}", e))?;
    let reread = Notebook::from_json(&json).map_err(|e| format!("re-reading failed: {}", e))?;
    let reread = Notebook::new(
        reread.cells().to_vec(),
        reread.metadata().clone(),
        notebook.marker_style(),
    );
    let rejson = reread
        .to_json()
        .map_err(|e| format!("serialization failed: {}", e))?;
    if rejson != json {
        return Err("notebook does not survive a write/read cycle".into());
    }
    Ok(())
}

fn cell_kind(cell: &mdnb::Cell) -> &'static str {
    match (cell.role(), cell.cell_type()) {
        (CellRole::Setup, _) => "setup",
        (CellRole::TableOfContents, _) => "toc",
        (_, CellType::Markdown) => "markdown",
        (_, CellType::Code) if cell.is_shell() => "shell",
        (_, CellType::Code) => "code",
    }
}

fn check_cells(config: &TestConfig, notebook: &Notebook) -> Result<(), String> {
    if let Some(expected) = &config.expect_cells {
        let actual: Vec<&str> = notebook.cells().iter().map(cell_kind).collect();
        if actual != *expected {
            return Err(format!(
                "cell mismatch\n  expected: {}\n  actual:   {}",
                expected.join(", "),
                actual.join(", ")
            ));
        }
    }

    let stats = notebook.stats();
    let counts = [
        ("code", config.expect_code_cells, stats.code),
        ("markdown", config.expect_markdown_cells, stats.markdown),
        ("shell", config.expect_shell_cells, stats.shell),
    ];
    for (kind, expected, actual) in counts {
        if let Some(expected) = expected {
            if expected != actual {
                return Err(format!(
                    "expected {} {} cell(s), got {}",
                    expected, kind, actual
                ));
            }
        }
    }
    Ok(())
}

fn check_syntax(config: &TestConfig, segments: &[mdnb::Segment]) -> Result<(), String> {
    let checker = config.check.build_checker();
    let report = validator::validate(segments, &config.check, checker.as_ref())
        .map_err(|e| format!("checker failed: {}", e))?;

    if let Some(expected) = config.expect_failures {
        if report.failure_count() != expected {
            return Err(format!(
                "expected {} failing block(s), got {}\n{}",
                expected,
                report.failure_count(),
                report.display("fixture.md")
            ));
        }
    }

    if let Some(expected) = &config.expect_failure_lines {
        let actual: Vec<usize> = report
            .failures()
            .filter_map(|entry| match entry.outcome {
                Outcome::Invalid { line, .. } => Some(line),
                Outcome::Valid => None,
            })
            .collect();
        if actual != *expected {
            return Err(format!(
                "failure lines mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }
    Ok(())
}

/// Discover `.test.md` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "" (uncategorized).
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
            if name.ends_with(".test.md") {
                let category = path
                    .parent()
                    .and_then(|p| p.strip_prefix(root).ok())
                    .map(|p| p.to_string_lossy().replace('\\', "/"))
                    .unwrap_or_default();
                out.entry(category).or_default().push(path);
            }
        }
    }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test.md files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        let label = if cat.is_empty() { "(root)" } else { cat.as_str() };
        eprintln!("  {} ({} tests)", label, files.len());
    }
}

struct Style {
    no_color: bool,
}

impl Style {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.no_color {
            text.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

/// Select the categories to run. Unknown names are warned about.
fn filter_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut filtered = BTreeMap::new();
    for requested in requested {
        let req = requested.trim_matches('/');
        let mut found = false;
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                filtered.insert(cat.as_str(), files);
                found = true;
            }
        }
        if !found {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| if k.is_empty() { "(root)" } else { k.as_str() })
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    filtered
}

/// Run all `.test.md` files under `path` (or a single file).
/// If `categories` is non-empty, only run tests in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let style = Style { no_color };

    let groups: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all_categories = discover_categorized(path);
        if all_categories.is_empty() {
            eprintln!("no .test.md files found in {}", path.display());
            return 1;
        }
        let selected = filter_categories(&all_categories, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(cat, files)| (cat.to_string(), files.clone()))
            .collect()
    };
    let single = path.is_file();

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &groups {
        if !single {
            let header = if cat.is_empty() { "(root)" } else { cat.as_str() };
            eprintln!();
            eprintln!("{}", style.bold(header));
        }

        for file in files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", style.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", style.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    let failed = failures.len();
    if failed == 0 {
        eprintln!(
            "test result: {}. {} passed, 0 failed",
            style.paint("ok", "32"),
            passed
        );
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            style.paint("FAILED", "31"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    fn outcome(content: &str) -> Result<(), String> {
        let (config, source) = parse_test_file(content)?;
        check_fixture(&config, source)
    }

    #[test]
    fn frontmatter_is_split_from_source() {
        let (config, source) =
            parse_test_file("---\ndescription = \"x\"\n---\n# Title\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("x"));
        assert_eq!(source, "# Title\n");
    }

    #[test]
    fn missing_delimiters_are_reported() {
        assert!(parse_test_file("# Title\n").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn unknown_expectation_is_rejected() {
        assert!(parse_test_file("---\nexpect_celss = []\n---\n").is_err());
    }

    #[test]
    fn cell_expectations() {
        let content = "---\nexpect_cells = [\"setup\", \"markdown\", \"shell\"]\n\n[convert]\ninclude_toc = true\n---\nintro\n```sh\nls\n```\n";
        assert_eq!(outcome(content), Ok(()));

        let wrong = "---\nexpect_cells = [\"markdown\"]\n---\nintro\n";
        let reason = outcome(wrong).unwrap_err();
        assert!(reason.contains("cell mismatch"), "{reason}");
    }

    #[test]
    fn unterminated_expectation() {
        let content = "---\nexpect_unterminated = 2\n---\ntext\n```python\nx = 1\n";
        assert_eq!(outcome(content), Ok(()));

        let reason = outcome("---\nexpect_unterminated = 1\n---\ntext\n").unwrap_err();
        assert!(reason.contains("extraction succeeded"), "{reason}");
    }

    #[test]
    fn target_languages_drive_syntax_checks() {
        let content = "---\nexpect_failures = 0\n\n[convert]\ntarget_languages = [\"python\"]\n---\n```py\nprint('x'\n```\n";
        assert_eq!(outcome(content), Ok(()));
    }

    #[test]
    fn syntax_expectations() {
        let content = "---\nexpect_failures = 1\nexpect_failure_lines = [2]\n---\n```python\nprint('x'\n```\n```python\nx = 1\n```\n";
        assert_eq!(outcome(content), Ok(()));
    }

    #[test]
    fn directory_run_reports_failures() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("conversion");
        std::fs::create_dir(&sub).unwrap();
        fixture(&sub, "ok.test.md", "---\nexpect_code_cells = 2\n---\n```py\nx\n```\n");
        assert_eq!(run_tests(dir.path(), true, &[]), 0);

        fixture(&sub, "bad.test.md", "---\nexpect_code_cells = 5\n---\n");
        assert_eq!(run_tests(dir.path(), true, &[]), 1);
        assert_eq!(run_tests(dir.path(), true, &["missing".to_string()]), 1);
    }
}
