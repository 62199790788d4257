//! Integration tests for region regeneration in host files

use std::fs;
use std::path::{Path, PathBuf};

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use regmark::{
    build, Config, Error, ExpandError, FilePair, Generator, ScanError, TableRow, WriteOutcome,
};

const EN_TEMPLATE: &str = "{% set f = registers.CTRL.entries.EN %}bit {{ f.LSB }}: {{ f.access }}\n";

/// Write the CTRL/EN register map and a template rendering its single field
fn workspace() -> TempDir {
    let dir = tempfile::tempdir().expect("tempdir");
    let rows = vec![
        TableRow::register("CTRL", "0x0", ""),
        TableRow::field("EN", "RW", "0", "0", "0"),
    ];
    let json = build(rows).expect("builds").to_json().expect("serializes");
    write(&dir, "regs.json", &json);
    write(&dir, "bit.j2", EN_TEMPLATE);
    dir
}

fn write(dir: &TempDir, name: &str, text: &str) -> PathBuf {
    let path = dir.path().join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("mkdir");
    }
    fs::write(&path, text).expect("write");
    path
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).expect("read")
}

const HOST: &str = "\
void init(void) {
  // marker_template_start
  // data: regs.json
  // template: bit.j2
  // marker_template_code
  // marker_template_end
}
";

#[test]
fn test_example_end_to_end() {
    let dir = workspace();
    let host = write(&dir, "main.c", HOST);

    let outcome = Generator::new(Config::new())
        .generate(&host, &host)
        .expect("Should generate");

    assert_eq!(outcome, WriteOutcome::Changed);
    assert_eq!(
        read(&host),
        "\
void init(void) {
  // marker_template_start
  // data: regs.json
  // template: bit.j2
  // marker_template_code
  bit 0: RW
  // marker_template_end
}
"
    );
}

#[test]
fn test_second_run_is_unchanged() {
    let dir = workspace();
    let host = write(&dir, "main.c", HOST);
    let mut generator = Generator::new(Config::new());

    let first = generator.generate(&host, &host).expect("first run");
    let after_first = read(&host);
    let second = generator.generate(&host, &host).expect("second run");

    assert_eq!(first, WriteOutcome::Changed);
    assert_eq!(second, WriteOutcome::Unchanged);
    assert_eq!(read(&host), after_first);
}

#[test]
fn test_fresh_generator_is_idempotent() {
    let dir = workspace();
    let host = write(&dir, "main.c", HOST);
    let pairs = [FilePair::in_place(&host)];

    let first = Generator::new(Config::new()).run(&pairs).expect("first run");
    let second = Generator::new(Config::new()).run(&pairs).expect("second run");
    assert_eq!(first.changed, 1);
    assert_eq!(second.changed, 0);
    assert_eq!(second.unchanged, 1);
}

#[test]
fn test_indentation_follows_end_marker() {
    let dir = workspace();
    write(
        &dir,
        "block.j2",
        "if (x) {\n  y();\n}\n\n// tail",
    );
    let host = write(
        &dir,
        "main.c",
        "\
/* marker_template_start
 * data: regs.json
 * template: block.j2
 * marker_template_code */
    /* marker_template_end */",
    );

    Generator::new(Config::new())
        .generate(&host, &host)
        .expect("Should generate");

    let text = read(&host);
    let body: Vec<&str> = text.lines().skip(4).take(5).collect();
    assert_eq!(
        body,
        vec!["    if (x) {", "      y();", "    }", "    ", "    // tail"]
    );
    assert!(text.ends_with("\n    /* marker_template_end */"));
}

#[test]
fn test_crlf_document_keeps_line_endings() {
    let dir = workspace();
    write(&dir, "two.j2", "a\nb");
    let source = "int x;\r\n// marker_template_start\r\n// data: regs.json\r\n// template: two.j2\r\n// marker_template_code\r\n  // marker_template_end\r\nx\r\n";
    let host = write(&dir, "main.c", source);
    let mut generator = Generator::new(Config::new());

    let first = generator.generate(&host, &host).expect("first run");
    let second = generator.generate(&host, &host).expect("second run");

    assert_eq!(first, WriteOutcome::Changed);
    assert_eq!(second, WriteOutcome::Unchanged);
    assert_eq!(
        read(&host),
        "int x;\r\n// marker_template_start\r\n// data: regs.json\r\n// template: two.j2\r\n// marker_template_code\r\n  a\r\n  b\r\n  // marker_template_end\r\nx\r\n"
    );
}

#[test]
fn test_previous_body_is_replaced() {
    let dir = workspace();
    let host = write(
        &dir,
        "main.c",
        "\
// marker_template_start
// data: regs.json
// template: bit.j2
// marker_template_code
stale 1
stale 2
// marker_template_end
",
    );

    Generator::new(Config::new())
        .generate(&host, &host)
        .expect("Should generate");

    let text = read(&host);
    assert!(!text.contains("stale"));
    assert!(text.contains("// marker_template_code\nbit 0: RW\n// marker_template_end\n"));
}

#[test]
fn test_template_change_regenerates() {
    let dir = workspace();
    let host = write(&dir, "main.c", HOST);
    let mut generator = Generator::new(Config::new());
    generator.generate(&host, &host).expect("first run");

    write(&dir, "bit.j2", "{% set f = registers.CTRL.entries.EN %}reset {{ f.reset }}");
    // a fresh generator does not reuse cached templates
    let outcome = Generator::new(Config::new())
        .generate(&host, &host)
        .expect("second run");

    assert_eq!(outcome, WriteOutcome::Changed);
    assert!(read(&host).contains("  reset 0\n"));
}

#[test]
fn test_separate_output_leaves_input() {
    let dir = workspace();
    let host = write(&dir, "main.c", HOST);
    let out = dir.path().join("main.gen.c");

    Generator::new(Config::new())
        .generate(&host, &out)
        .expect("Should generate");

    assert_eq!(read(&host), HOST);
    assert!(read(&out).contains("  bit 0: RW\n"));
}

#[test]
fn test_unterminated_region_writes_nothing() {
    let dir = workspace();
    let source = "a\n// marker_template_start\n// data: regs.json\n// template: bit.j2\n// marker_template_code\n";
    let host = write(&dir, "main.c", source);
    let out = dir.path().join("out.c");

    let err = Generator::new(Config::new())
        .generate(&host, &out)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Scan {
            source: ScanError::UnterminatedRegion { line: 2, .. },
            ..
        }
    ));
    assert!(!out.exists());
    assert_eq!(read(&host), source);
}

#[test]
fn test_run_stops_at_first_failure() {
    let dir = workspace();
    let good = write(&dir, "good.c", HOST);
    let bad = write(&dir, "bad.c", "// marker_template_start\n");
    let later = write(&dir, "later.c", HOST);
    let pairs = [
        FilePair::new(&good, dir.path().join("good.out")),
        FilePair::new(&bad, dir.path().join("bad.out")),
        FilePair::new(&later, dir.path().join("later.out")),
    ];

    let result = Generator::new(Config::new()).run(&pairs);

    assert!(matches!(
        result,
        Err(Error::Scan {
            source: ScanError::UnterminatedRegion { line: 1, .. },
            ..
        })
    ));
    assert!(dir.path().join("good.out").exists());
    assert!(!dir.path().join("bad.out").exists());
    assert!(!dir.path().join("later.out").exists());
}

#[test]
fn test_configured_roots() {
    let dir = tempfile::tempdir().expect("tempdir");
    let rows = vec![
        TableRow::register("CTRL", "0x0", ""),
        TableRow::field("EN", "RW", "0", "0", "0"),
    ];
    let json = build(rows).expect("builds").to_json().expect("serializes");
    write(&dir, "design/regs.json", &json);
    write(&dir, "templates/c/bit.j2", EN_TEMPLATE);
    let host = write(
        &dir,
        "firmware/main.c",
        "// marker_template_start\n// data: regs.json\n// template: c/bit.j2\n// marker_template_code\n// marker_template_end",
    );

    let config = Config::new()
        .with_data_root(dir.path().join("design"))
        .with_template_root(dir.path().join("templates"));
    Generator::new(config)
        .generate(&host, &host)
        .expect("Should generate");

    assert!(read(&host).contains("\nbit 0: RW\n"));
}

#[test]
fn test_missing_data_reports_line() {
    let dir = workspace();
    let host = write(
        &dir,
        "main.c",
        "int a;\n// marker_template_start\n// data: nope.json\n",
    );

    let err = Generator::new(Config::new())
        .generate(&host, &host)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Scan {
            source: ScanError::DataNotFound { line: 3, .. },
            ..
        }
    ));
    let report = err.report();
    assert!(report.contains("main.c"));
    assert!(report.contains("data file not found"));
}

#[test]
fn test_malformed_data_is_expand_error() {
    let dir = workspace();
    write(&dir, "broken.json", "{\"registers\": [");
    let host = write(
        &dir,
        "main.c",
        "x\n// marker_template_start\n// data: broken.json\n// template: bit.j2\n// marker_template_code\n// marker_template_end\n",
    );

    let err = Generator::new(Config::new())
        .generate(&host, &host)
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Expand {
            line: 2,
            source: ExpandError::DataLoad { .. },
            ..
        }
    ));
}

#[test]
fn test_dry_run_writes_nothing() {
    let dir = workspace();
    let host = write(&dir, "main.c", HOST);

    let summary = Generator::new(Config::new().with_dry_run(true))
        .run(&[FilePair::in_place(&host)])
        .expect("Should run");

    assert_eq!(summary.changed, 1);
    assert!(!summary.is_clean());
    assert_eq!(read(&host), HOST);

    Generator::new(Config::new())
        .run(&[FilePair::in_place(&host)])
        .expect("Should run");
    let summary = Generator::new(Config::new().with_dry_run(true))
        .run(&[FilePair::in_place(&host)])
        .expect("Should run");
    assert!(summary.is_clean());
}

#[test]
fn test_document_without_regions_is_unchanged() {
    let dir = workspace();
    let host = write(&dir, "plain.c", "int main(void) { return 0; }\n");

    let outcome = Generator::new(Config::new())
        .generate(&host, &host)
        .expect("Should generate");

    assert_eq!(outcome, WriteOutcome::Unchanged);
}
