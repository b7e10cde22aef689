//! End-to-end command runs over temporary files

use pretty_assertions::assert_eq;
use quire_cli::{build_cli, commands};
use quire_session::QuireConfig;
use quire_table::{Cell, JsonTableCodec, Table, TableLoader, TableWriter};
use quire_test_utils::{question_table, sales_table};
use std::path::{Path, PathBuf};

fn write_sheet(dir: &Path, name: &str, table: &Table) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, JsonTableCodec::new().serialize(table, "Sheet1").unwrap()).unwrap();
    path
}

fn output(buf: Vec<u8>) -> String {
    String::from_utf8(buf).unwrap()
}

#[test]
fn review_session_over_stdin() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "questions.json", &question_table(3));
    let script = format!(
        "a\nh\n7\nwhat\nls\no 1\nexport all {dir}\nexport held {dir}\nq\nn\n",
        dir = dir.path().display()
    );

    let mut out = Vec::new();
    let ok = commands::review(
        &QuireConfig::default(),
        &sheet,
        Some(2),
        script.as_bytes(),
        &mut out,
    )
    .unwrap();
    assert!(ok);
    let text = output(out);
    assert!(text.starts_with("[ok] Loaded 3 questions (3 left to review)\nQuestion 1 / 3 [unreviewed]\n"));
    assert!(text.contains("[ok] Question 1 approved\nQuestion 2 / 3 [unreviewed]\n"));
    assert!(text.contains("[warning] record number 7 is out of range (1-3)\n"));
    assert!(text.contains("[warning] unknown command 'what' (try 'help')\n"));
    assert!(text.contains("   1. 1 / Q_IDX: 1001 [approved]\n   2. 2 / Q_IDX: 1002 [held]\nPage 1 / 2\n"));

    let exported = JsonTableCodec::new()
        .parse(&std::fs::read(dir.path().join("output_check.json")).unwrap())
        .unwrap();
    assert_eq!(
        exported.column("status").unwrap(),
        vec![Cell::text("approved"), Cell::text("held"), Cell::text("")]
    );
    let held = JsonTableCodec::new()
        .parse(&std::fs::read(dir.path().join("output_check_held.json")).unwrap())
        .unwrap();
    assert_eq!(held.len(), 1);

    // input after quit is ignored
    assert!(text.ends_with("output_check_held.json\n"));
}

#[test]
fn review_rejects_sheet_without_question_columns() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "sales.json", &sales_table());
    let mut out = Vec::new();
    let ok = commands::review(&QuireConfig::default(), &sheet, None, &b""[..], &mut out).unwrap();
    assert!(!ok);
    assert!(output(out).starts_with("[error] missing required columns: subject, chapter, q_idx"));
}

#[test]
fn merge_applies_edits_and_writes_the_result() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_sheet(dir.path(), "q1.json", &sales_table());
    let extra = Table::from_rows(
        ["region", "units"],
        vec![vec![Cell::text("west"), Cell::Int(5)]],
    )
    .unwrap();
    let second = write_sheet(dir.path(), "q2.json", &extra);

    let mut out = Vec::new();
    let ok = commands::merge(
        &QuireConfig::default(),
        &[first, second],
        &["q1.json=price".to_string()],
        &["q1.json=0".to_string()],
        dir.path(),
        &mut out,
    )
    .unwrap();
    assert!(ok, "{}", output(out.clone()));

    let path = dir.path().join("merged_result.json");
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(JsonTableCodec::sheet_name(&bytes).unwrap().as_deref(), Some("병합데이터"));
    let merged = JsonTableCodec::new().parse(&bytes).unwrap();
    assert_eq!(merged.columns(), &["region", "product", "units"]);
    assert_eq!(merged.len(), 4);
    assert_eq!(merged.cell(3, "region"), Some(&Cell::text("west")));
}

#[test]
fn merge_reports_bad_edits() {
    let dir = tempfile::tempdir().unwrap();
    let first = write_sheet(dir.path(), "q1.json", &sales_table());
    let mut out = Vec::new();
    let ok = commands::merge(
        &QuireConfig::default(),
        &[first.clone()],
        &["q1.json=nope".to_string()],
        &[],
        dir.path(),
        &mut out,
    )
    .unwrap();
    assert!(!ok);
    assert!(output(out).contains("[error] unknown column: 'nope'"));
    assert!(!dir.path().join("merged_result.json").exists());

    let err = commands::merge(
        &QuireConfig::default(),
        &[first],
        &["price".to_string()],
        &[],
        dir.path(),
        &mut Vec::new(),
    )
    .unwrap_err();
    assert!(err.to_string().contains("expected FILE=VALUE"));
}

#[test]
fn validate_lists_findings() {
    let dir = tempfile::tempdir().unwrap();
    let safe = dir.path().join("safe.py");
    std::fs::write(&safe, "plt.bar(df['region'], df['units'])\n").unwrap();
    let mut out = Vec::new();
    assert!(commands::validate(&safe, &mut out).unwrap());
    assert_eq!(output(out), "[ok] no findings\n");

    let risky = dir.path().join("risky.py");
    std::fs::write(&risky, "import subprocess\nsubprocess.run(['ls'])\n").unwrap();
    let mut out = Vec::new();
    assert!(!commands::validate(&risky, &mut out).unwrap());
    let text = output(out);
    assert!(text.starts_with("line 1: "));
    assert!(text.ends_with("finding(s)\n"));
}

#[test]
fn run_prints_the_chart_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let table = write_sheet(dir.path(), "sales.json", &sales_table());
    let code = dir.path().join("chart.py");
    std::fs::write(
        &code,
        "fig, ax = plt.subplots(figsize=(6, 3))\nax.bar(df['product'], df['units'])\nax.set_title('Units')\n",
    )
    .unwrap();

    let mut out = Vec::new();
    assert!(commands::run(&QuireConfig::default(), &code, &table, &mut out).unwrap());
    let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(json["outcome"]["kind"], "chart");
    assert_eq!(json["outcome"]["chart"]["size"], serde_json::json!([6.0, 3.0]));
    assert_eq!(json["outcome"]["chart"]["axes"][0]["title"], "Units");
    assert_eq!(json["printed"], "");
}

#[test]
fn run_honours_configured_limits() {
    let dir = tempfile::tempdir().unwrap();
    let table = write_sheet(dir.path(), "sales.json", &sales_table());
    let code = dir.path().join("loop.py");
    std::fs::write(&code, "total = 0\nfor i in range(50000):\n    total += i\n").unwrap();
    let config_path = dir.path().join("quire.toml");
    std::fs::write(&config_path, "[sandbox.limits]\nmax_steps = 5000\n").unwrap();

    let config = commands::load_config(Some(&config_path)).unwrap();
    let mut out = Vec::new();
    assert!(!commands::run(&config, &code, &table, &mut out).unwrap());
    assert!(output(out).starts_with("[error] line "));
}

#[tokio::test]
async fn visualize_replays_a_saved_reply() {
    let dir = tempfile::tempdir().unwrap();
    let sheet = write_sheet(dir.path(), "sales.json", &sales_table());
    let reply = dir.path().join("reply.md");
    std::fs::write(
        &reply,
        "```python\ndf['revenue'] = df['units'] * df['price']\ndf.plot(x='product', y='revenue', kind='bar')\n```\n",
    )
    .unwrap();

    let mut out = Vec::new();
    let ok = commands::visualize(&QuireConfig::default(), &[sheet], &reply, "revenue", &mut out)
        .await
        .unwrap();
    let text = output(out);
    assert!(ok, "{text}");
    assert!(text.contains("[ok] Chart ready\n"));
    let json_start = text.find('{').unwrap();
    let viz: serde_json::Value = serde_json::from_str(&text[json_start..]).unwrap();
    assert_eq!(viz["request"], "revenue");
    assert_eq!(
        viz["chart"]["axes"][0]["traces"][0]["y"],
        serde_json::json!([15.0, 6.0, 21.0, 4.5])
    );
}

#[test]
fn missing_files_are_errors() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.json");
    let err = commands::read_sheet(&missing).unwrap_err();
    assert!(format!("{err:#}").contains("absent.json"));
    assert!(commands::load_config(Some(&missing)).is_err());
}

#[test]
fn global_options_reach_subcommands() {
    let matches = build_cli()
        .try_get_matches_from(["quire", "validate", "x.py", "--config", "q.toml", "--log-json"])
        .unwrap();
    assert!(matches.get_flag("log-json"));
    assert_eq!(
        matches.get_one::<PathBuf>("config").map(PathBuf::as_path),
        Some(Path::new("q.toml"))
    );
}
