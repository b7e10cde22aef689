//! Analysis workflow: edit, merge, ask and chart

use pretty_assertions::assert_eq;
use quire_sandbox::{ExecutionLimits, Sandbox, TraceKind};
use quire_session::{AnalysisConfig, AnalysisSession, CannedGenerator, NoticeLevel};
use quire_table::{Cell, JsonTableCodec, Table, TableLoader};
use quire_test_utils::sales_table;
use std::sync::Arc;

fn session(generator: &Arc<CannedGenerator>) -> AnalysisSession {
    AnalysisSession::new(AnalysisConfig::default(), Sandbox::new(), generator.clone())
}

fn extra_sales() -> Table {
    Table::from_rows(
        ["region", "units", "channel"],
        vec![vec![Cell::text("west"), Cell::Int(5), Cell::text("web")]],
    )
    .unwrap()
}

fn merged_session(generator: &Arc<CannedGenerator>) -> AnalysisSession {
    let mut session = session(generator);
    session.upload_table("q1.xlsx", sales_table());
    session.upload_table("q2.xlsx", extra_sales());
    assert_eq!(session.merge().level, NoticeLevel::Success);
    session
}

#[test]
fn edits_apply_per_upload_before_merge() {
    let generator = Arc::new(CannedGenerator::new());
    let mut session = session(&generator);
    session.upload_table("q1.xlsx", sales_table());
    session.upload_table("q2.xlsx", extra_sales());

    let notice = session.drop_columns("q1.xlsx", &["price".to_string()]);
    assert_eq!(notice.level, NoticeLevel::Success);
    session.drop_rows("q1.xlsx", &[1, 3]);
    session.drop_columns("q2.xlsx", &["channel".to_string()]);

    assert_eq!(session.merge().level, NoticeLevel::Success);
    let merged = session.merged().unwrap();
    assert_eq!(merged.columns(), &["region", "product", "units"]);
    assert_eq!(
        merged.column("region").unwrap(),
        vec![Cell::text("north"), Cell::text("north"), Cell::text("west")]
    );
    assert_eq!(merged.cell(2, "product"), Some(&Cell::Empty));
}

#[test]
fn failed_edits_change_nothing() {
    let generator = Arc::new(CannedGenerator::new());
    let mut session = session(&generator);
    session.upload_table("q1.xlsx", sales_table());

    let notice = session.drop_columns("q1.xlsx", &["units".to_string(), "nope".to_string()]);
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(session.upload_named("q1.xlsx").unwrap().columns().len(), 4);

    assert_eq!(session.drop_rows("q1.xlsx", &[9]).level, NoticeLevel::Error);
    assert_eq!(session.upload_named("q1.xlsx").unwrap().len(), 4);

    assert_eq!(session.drop_rows("missing.xlsx", &[0]).level, NoticeLevel::Error);
}

#[test]
fn merge_needs_uploads_and_download_needs_merge() {
    let generator = Arc::new(CannedGenerator::new());
    let mut session = session(&generator);
    assert_eq!(session.merge().level, NoticeLevel::Warning);
    assert!(session.download(&JsonTableCodec::new()).is_err());

    session.upload_table("q1.xlsx", sales_table());
    session.merge();
    let download = session.download(&JsonTableCodec::new()).unwrap();
    assert_eq!(download.file_name, "merged_result.json");
    assert_eq!(
        JsonTableCodec::sheet_name(&download.bytes).unwrap().as_deref(),
        Some("병합데이터")
    );
    assert_eq!(JsonTableCodec::new().parse(&download.bytes).unwrap(), sales_table());
}

#[tokio::test]
async fn summary_and_answers_embed_the_merged_csv() {
    let generator = Arc::new(
        CannedGenerator::new()
            .with_reply("North sells the most.")
            .with_reply("23 units in total."),
    );
    let mut session = merged_session(&generator);

    assert_eq!(session.summarize().await.level, NoticeLevel::Success);
    assert_eq!(session.summary(), Some("North sells the most."));

    assert_eq!(session.ask("  How many units?  ").await.level, NoticeLevel::Success);
    assert_eq!(session.answer(), Some("23 units in total."));

    let prompts = generator.prompts().await;
    assert_eq!(prompts.len(), 2);
    assert!(prompts[0]
        .user
        .contains("region,product,units,price,channel\nnorth,pen,10,1.5,\n"));
    assert!(prompts[1].user.ends_with("[Question]\nHow many units?\n"));
    assert!((prompts[1].temperature - 0.5).abs() < f32::EPSILON);
}

#[tokio::test]
async fn requests_need_a_merge_and_a_question() {
    let generator = Arc::new(CannedGenerator::new().with_reply("unused"));
    let mut session = session(&generator);
    assert_eq!(session.summarize().await.level, NoticeLevel::Warning);
    assert_eq!(session.visualize("a chart").await.level, NoticeLevel::Warning);

    session.upload_table("q1.xlsx", sales_table());
    session.merge();
    assert_eq!(session.ask("   ").await.level, NoticeLevel::Warning);
    assert!(session.answer().is_none());
    assert_eq!(generator.remaining().await, 1);
}

#[tokio::test]
async fn generation_failure_keeps_previous_answer() {
    let generator = Arc::new(CannedGenerator::new().with_reply("first").with_failure("rate limited"));
    let mut session = merged_session(&generator);
    session.ask("one").await;
    let notice = session.ask("two").await;
    assert_eq!(notice.level, NoticeLevel::Error);
    assert!(notice.message.contains("rate limited"));
    assert_eq!(session.answer(), Some("first"));
}

#[tokio::test]
async fn visualization_runs_fenced_code_in_the_sandbox() {
    let reply = "Sure!\n```python\nimport matplotlib.pyplot as plt\n\
                 totals = df.groupby('region')['units'].sum()\n\
                 totals.plot(kind='bar')\nplt.title('Units by region')\nplt.show()\n```\n";
    let generator = Arc::new(CannedGenerator::new().with_reply(reply));
    let mut session = merged_session(&generator);

    let notice = session.visualize("units per region as bars").await;
    assert_eq!(notice.level, NoticeLevel::Success, "{notice}");
    let viz = session.visualization().unwrap();
    assert!(viz.code.starts_with("import matplotlib.pyplot as plt"));
    assert!(viz.error.is_none());
    let chart = viz.chart.as_ref().unwrap();
    let trace = &chart.axes[0].traces[0];
    assert_eq!(trace.kind, TraceKind::Bar);
    assert_eq!(
        trace.x,
        vec![Cell::text("east"), Cell::text("north"), Cell::text("south"), Cell::text("west")]
    );
    assert_eq!(trace.y, vec![2.0, 17.0, 4.0, 5.0]);

    // the program worked on a copy
    assert_eq!(session.merged().unwrap().len(), 5);
}

#[tokio::test]
async fn unsafe_code_is_rejected_and_clears_the_chart() {
    let generator = Arc::new(
        CannedGenerator::new()
            .with_reply("plt.bar(['a'], [1])")
            .with_reply("```python\nimport os\nos.system('rm -rf /')\n```"),
    );
    let mut session = merged_session(&generator);
    session.visualize("first").await;
    assert!(session.visualization().unwrap().chart.is_some());

    let notice = session.visualize("second").await;
    assert_eq!(notice.level, NoticeLevel::Error);
    let viz = session.visualization().unwrap();
    assert_eq!(viz.request, "second");
    assert_eq!(viz.code, "import os\nos.system('rm -rf /')");
    assert!(viz.chart.is_none());
    assert!(viz.error.as_deref().unwrap().starts_with("code rejected"));
}

#[tokio::test]
async fn runaway_code_times_out() {
    let generator = Arc::new(CannedGenerator::new().with_reply("n = 0\nwhile n < 1:\n    n = n - 1\n"));
    let sandbox = Sandbox::new().with_limits(ExecutionLimits::new().with_max_steps(1_000));
    let mut session = AnalysisSession::new(AnalysisConfig::default(), sandbox, generator.clone());
    session.upload_table("q1.xlsx", sales_table());
    session.merge();

    let notice = session.visualize("spin").await;
    assert_eq!(notice.level, NoticeLevel::Error);
    let viz = session.visualization().unwrap();
    assert!(viz.chart.is_none());
    assert!(viz.error.as_deref().unwrap().contains("step budget of 1000"), "{:?}", viz.error);
}

#[tokio::test]
async fn failing_program_leaves_the_session_usable() {
    let generator = Arc::new(
        CannedGenerator::new()
            .with_reply("```python\nlabel = f'{1.5:.70000f}'\nplt.title(label)\n```")
            .with_reply("plt.bar(['a', 'b'], [1, 2])"),
    );
    let mut session = merged_session(&generator);

    let notice = session.visualize("wide label").await;
    assert_eq!(notice.level, NoticeLevel::Error);
    let viz = session.visualization().unwrap();
    assert!(viz.chart.is_none());
    assert!(viz.error.as_deref().unwrap().contains("precision"), "{:?}", viz.error);

    let notice = session.visualize("two bars").await;
    assert_eq!(notice.level, NoticeLevel::Success, "{notice}");
    assert_eq!(session.visualization().unwrap().request, "two bars");
    assert_eq!(session.merged().unwrap().len(), 5);
}

#[tokio::test]
async fn generation_failure_records_a_comment() {
    let generator = Arc::new(CannedGenerator::new().with_failure("service unavailable"));
    let mut session = merged_session(&generator);
    session.visualize("anything").await;
    let viz = session.visualization().unwrap();
    assert_eq!(viz.code, "# text generation failed: service unavailable");
    assert!(viz.chart.is_none());
}

#[tokio::test]
async fn program_without_chart_is_reported() {
    let generator = Arc::new(CannedGenerator::new().with_reply("print(df['units'].sum())"));
    let mut session = merged_session(&generator);
    let notice = session.visualize("total").await;
    assert_eq!(notice.level, NoticeLevel::Warning);
    let viz = session.visualization().unwrap();
    assert_eq!(viz.printed, "28\n");
    assert!(viz.chart.is_none());
    assert!(viz.error.is_some());
}

#[tokio::test]
async fn reset_clears_everything() {
    let generator = Arc::new(CannedGenerator::new().with_reply("ok"));
    let mut session = merged_session(&generator);
    session.summarize().await;
    session.reset();
    assert!(session.merged().is_none());
    assert!(session.summary().is_none());
    assert_eq!(session.uploads().count(), 0);
}
