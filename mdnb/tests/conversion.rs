use mdnb::{
    CellRole, CellType, ConvertOptions, Error, ExtractError, MarkerStyle, Notebook, Parser,
    SegmentKind, Synthesizer, synthesize,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::Value;

const GUIDE: &str = "# Mastering Libraries\n\nIntro text.\n```python\nimport requests\nprint(requests.__version__)\n```\n## Install\n```bash\npip install requests\n```\nDone.\n";

fn bare() -> ConvertOptions {
    ConvertOptions {
        include_setup_cell: false,
        include_toc: false,
        ..ConvertOptions::default()
    }
}

fn convert(source: &str, options: &ConvertOptions) -> Notebook {
    let document = Parser::new(source.to_string(), 0)
        .parse()
        .expect("extraction failed");
    Synthesizer::new(options)
        .with_source_file("README.md")
        .synthesize(&document.segments)
}

fn cell_kinds(notebook: &Notebook) -> Vec<&'static str> {
    notebook
        .cells()
        .iter()
        .map(|cell| match (cell.role(), cell.cell_type(), cell.is_shell()) {
            (CellRole::Setup, ..) => "setup",
            (CellRole::TableOfContents, ..) => "toc",
            (_, CellType::Markdown, _) => "markdown",
            (_, CellType::Code, true) => "shell",
            (_, CellType::Code, false) => "code",
        })
        .collect()
}

#[test]
fn cells_follow_segment_order() {
    let notebook = convert(GUIDE, &bare());
    assert_eq!(
        cell_kinds(&notebook),
        vec!["markdown", "code", "markdown", "shell", "markdown"]
    );
}

#[test]
fn setup_cell_first_then_toc() {
    let notebook = convert(GUIDE, &ConvertOptions::default());
    assert_eq!(
        cell_kinds(&notebook),
        vec!["setup", "toc", "markdown", "code", "markdown", "shell", "markdown"]
    );
    let toc = notebook.cells()[1].text();
    assert!(toc.contains("- [Mastering Libraries](#mastering-libraries)"));
    assert!(toc.contains("  - [Install](#install)"));
}

#[test]
fn toc_is_skipped_without_headings() {
    let notebook = convert("plain text\n```py\nx = 1\n```\n", &ConvertOptions::default());
    assert_eq!(cell_kinds(&notebook), vec!["setup", "markdown", "code"]);
}

#[test]
fn shell_block_is_marked_and_target_block_is_not() {
    let notebook = convert(GUIDE, &bare());
    let python = &notebook.cells()[1];
    let bash = &notebook.cells()[3];
    assert_eq!(python.execution_marker(), None);
    assert_eq!(bash.execution_marker(), Some("%%bash"));
    assert_eq!(bash.source(), ["pip install requests".to_string()]);
}

#[test]
fn unknown_and_untagged_languages_stay_code() {
    let notebook = convert("```yaml\nkey: value\n```\n```\nplain\n```\n", &bare());
    assert_eq!(cell_kinds(&notebook), vec!["code", "code"]);
}

#[test]
fn custom_shell_languages() {
    let options = ConvertOptions {
        shell_languages: mdnb::config::language_set(&["zsh"]),
        ..bare()
    };
    let notebook = convert("```zsh\nls\n```\n```bash\nls\n```\n", &options);
    assert_eq!(cell_kinds(&notebook), vec!["shell", "code"]);
}

#[test]
fn empty_block_becomes_empty_code_cell() {
    let notebook = convert("```python\n```\n", &bare());
    assert_eq!(notebook.cells().len(), 1);
    assert!(notebook.cells()[0].is_code());
    assert!(notebook.cells()[0].source().is_empty());
}

#[test]
fn broken_code_is_kept_verbatim() {
    let notebook = convert("```python\ndef broken(:\n    pass  \n```\n", &bare());
    assert_eq!(
        notebook.cells()[0].source(),
        ["def broken(:".to_string(), "    pass  ".to_string()]
    );
}

#[test]
fn cell_magic_json_layout() {
    let json = convert(GUIDE, &ConvertOptions::default()).to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();

    assert_eq!(value["nbformat"], 4);
    assert_eq!(value["nbformat_minor"], 4);
    assert_eq!(value["metadata"]["kernelspec"]["name"], "python3");

    let cells = value["cells"].as_array().unwrap();
    assert_eq!(cells[0]["metadata"]["mdnb"]["role"], "setup");

    let shell = &cells[5];
    assert_eq!(shell["cell_type"], "code");
    assert_eq!(shell["execution_count"], Value::Null);
    assert_eq!(shell["outputs"], serde_json::json!([]));
    assert_eq!(
        shell["source"],
        serde_json::json!(["%%bash\n", "pip install requests"])
    );
    assert_eq!(shell["metadata"]["source_line"], 9);
    assert_eq!(shell["metadata"]["source_anchor"], "README.md:9");

    let prose = &cells[2];
    assert_eq!(prose["cell_type"], "markdown");
    assert!(prose.get("outputs").is_none());
}

#[test]
fn metadata_marker_style_leaves_source_alone() {
    let options = ConvertOptions {
        marker_style: MarkerStyle::Metadata,
        ..bare()
    };
    let json = convert(GUIDE, &options).to_json().unwrap();
    let value: Value = serde_json::from_str(&json).unwrap();
    let shell = &value["cells"][3];
    assert_eq!(shell["source"], serde_json::json!(["pip install requests"]));
    assert_eq!(shell["metadata"]["mdnb"]["execution_marker"], "%%bash");
}

#[test]
fn source_anchors_prefix_document_cells() {
    let options = ConvertOptions {
        source_anchors: true,
        ..bare()
    };
    let notebook = convert(GUIDE, &options);
    assert_eq!(notebook.cells()[0].source()[0], "<!-- source:README.md:1 -->");
    assert_eq!(notebook.cells()[1].source()[0], "# [source:README.md:4]");
}

#[test]
fn synthesis_is_idempotent() {
    let options = ConvertOptions::default();
    let first = convert(GUIDE, &options).to_json().unwrap();
    let second = convert(GUIDE, &options).to_json().unwrap();
    assert_eq!(first, second);
}

#[test]
fn notebook_json_reads_back() {
    let notebook = convert(GUIDE, &ConvertOptions::default());
    let reread = Notebook::from_json(&notebook.to_json().unwrap()).unwrap();
    assert_eq!(reread, notebook);
    assert_eq!(reread.kernel_language(), Some("python"));
}

#[test]
fn special_bytes_survive_conversion() {
    let source = "```python\nname = 'caf\u{e9} \u{6f22}\u{5b57} \u{1f40d}'\nnull = '\0'\n```\n";
    let notebook = convert(source, &bare());
    let json = notebook.to_json().unwrap();
    assert!(json.contains("caf\u{e9} \u{6f22}\u{5b57}"));
    assert!(json.contains("\\u0000"));
    let reread = Notebook::from_json(&json).unwrap();
    assert_eq!(reread.cells()[0].source(), notebook.cells()[0].source());
}

#[test]
fn stats_count_cell_types() {
    let stats = convert(GUIDE, &ConvertOptions::default()).stats();
    assert_eq!(stats.total, 7);
    assert_eq!(stats.code, 3);
    assert_eq!(stats.shell, 1);
    assert_eq!(stats.markdown, 4);
}

#[test]
fn convert_file_writes_notebook() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("guide.md");
    let output = dir.path().join("guide.ipynb");
    std::fs::write(&input, GUIDE).unwrap();

    let notebook = mdnb::convert_file(&input, &output, &ConvertOptions::default()).unwrap();
    let written = Notebook::read(&output).unwrap();
    assert_eq!(written.cells().len(), notebook.cells().len());
}

#[test]
fn unterminated_fence_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("broken.md");
    let output = dir.path().join("broken.ipynb");
    std::fs::write(&input, "# Title\n\n```python\nprint('never closed')\n").unwrap();

    let err = mdnb::convert_file(&input, &output, &ConvertOptions::default()).unwrap_err();
    match err {
        Error::Extract(ExtractError::UnterminatedFence { line, .. }) => assert_eq!(line, 3),
        other => panic!("unexpected error: {other}"),
    }
    assert!(!output.exists());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn invalid_utf8_is_replaced() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bytes.md");
    std::fs::write(&input, b"```python\nx = '\xff'\n```\n").unwrap();
    let source = mdnb::read_source(&input).unwrap();
    assert!(source.contains('\u{fffd}'));
}

#[test]
fn missing_input_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = mdnb::read_source(&dir.path().join("nope.md")).unwrap_err();
    assert!(matches!(err, Error::Read { .. }));
}

fn doc_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("```".to_string()),
        Just("```python".to_string()),
        Just("  ```Bash  ".to_string()),
        Just(String::new()),
        Just("# Heading".to_string()),
        Just("trailing space   ".to_string()),
        Just("x = 1\r".to_string()),
        "[a-z \t]{0,12}",
    ]
}

fn doc() -> impl Strategy<Value = String> {
    (prop::collection::vec(doc_line(), 0..40), any::<bool>()).prop_map(|(lines, trailing)| {
        let mut source = lines.join("\n");
        if trailing && !source.is_empty() {
            source.push('\n');
        }
        source
    })
}

proptest! {
    #[test]
    fn segments_reproduce_source(source in doc()) {
        let fences = source
            .split('\n')
            .filter(|line| line.trim().starts_with("```"))
            .count();
        match Parser::new(source.clone(), 0).parse() {
            Ok(document) => {
                prop_assert_eq!(fences % 2, 0);
                prop_assert_eq!(document.to_string(), source);
            }
            Err(err) => {
                prop_assert_eq!(fences % 2, 1);
                let line = source.split('\n').nth(err.line() - 1).unwrap_or_default();
                prop_assert!(line.trim().starts_with("```"));
            }
        }
    }

    #[test]
    fn cell_types_match_segment_kinds(source in doc()) {
        if let Ok(document) = Parser::new(source, 0).parse() {
            let notebook = synthesize(&document.segments, &bare());
            let expected: Vec<CellType> = document
                .segments
                .iter()
                .map(|s| match s.kind {
                    SegmentKind::Prose => CellType::Markdown,
                    SegmentKind::Code => CellType::Code,
                })
                .collect();
            let actual: Vec<CellType> = notebook.cells().iter().map(|c| c.cell_type()).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}
