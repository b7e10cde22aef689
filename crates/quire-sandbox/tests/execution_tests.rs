//! Validate-then-execute scenarios

use pretty_assertions::assert_eq;
use quire_sandbox::{
    Bindings, ExecutionLimits, Outcome, RuntimeFault, Sandbox, SandboxError, TimeoutCause,
    TraceKind,
};
use quire_table::Cell;
use quire_test_utils::sales_table;

fn run(code: &str) -> Result<quire_sandbox::Execution, SandboxError> {
    Sandbox::new().execute(code, &Bindings::standard(sales_table()))
}

fn texts(cells: &[Cell]) -> Vec<String> {
    cells.iter().map(Cell::as_text).collect()
}

#[test]
fn grouped_bar_chart() {
    let code = r#"
import matplotlib.pyplot as plt
totals = df.groupby('region')['units'].sum()
totals.plot(kind='bar', title='Units by region')
plt.ylabel('units')
plt.tight_layout()
plt.show()
"#;
    let execution = run(code).unwrap();
    let Outcome::Chart { source, chart } = &execution.outcome else {
        panic!("expected a chart, got {:?}", execution.outcome);
    };
    assert_eq!(source, "plt");
    let axes = &chart.axes[0];
    assert_eq!(axes.title.as_deref(), Some("Units by region"));
    assert_eq!(axes.ylabel.as_deref(), Some("units"));
    assert_eq!(axes.xlabel.as_deref(), Some("region"));
    assert_eq!(axes.traces.len(), 1);
    assert_eq!(axes.traces[0].kind, TraceKind::Bar);
    assert_eq!(texts(&axes.traces[0].x), vec!["east", "north", "south"]);
    assert_eq!(axes.traces[0].y, vec![2.0, 17.0, 4.0]);
    assert!(execution.steps > 0);
}

#[test]
fn program_without_chart_reports_no_artifact() {
    let execution = run("total = df['units'].sum()\nprint('total:', total)\n").unwrap();
    assert_eq!(execution.outcome, Outcome::NoArtifact);
    assert_eq!(execution.printed, "total: 23\n");
}

#[test]
fn subplots_with_size_and_labels() {
    let code = r#"
fig, ax = plt.subplots(figsize=(8, 4))
ax.barh(df['product'], df['price'], color='teal')
ax.set_title('Price per product')
ax.set_xlabel('price')
fig.suptitle('Catalogue')
"#;
    let execution = run(code).unwrap();
    let chart = execution.outcome.chart().unwrap();
    assert_eq!(chart.size, Some([8.0, 4.0]));
    assert_eq!(chart.title.as_deref(), Some("Catalogue"));
    let trace = &chart.axes[0].traces[0];
    assert_eq!(trace.kind, TraceKind::BarH);
    assert_eq!(trace.color.as_deref(), Some("teal"));
    assert_eq!(texts(&trace.x), vec!["pen", "pen", "ink", "pad"]);
    assert_eq!(trace.y, vec![1.5, 1.5, 3.0, 2.25]);
}

#[test]
fn boolean_masks_and_pie() {
    let code = "big = df[df['units'] > 5]\nplt.pie(big['units'], labels=big['region'])\n";
    let chart = run(code).unwrap().outcome.chart().cloned().unwrap();
    let trace = &chart.axes[0].traces[0];
    assert_eq!(trace.kind, TraceKind::Pie);
    assert_eq!(texts(&trace.x), vec!["north", "north"]);
    assert_eq!(trace.y, vec![10.0, 7.0]);
}

#[test]
fn loops_comprehensions_and_formatting() {
    let code = r#"
labels = []
for region, units in zip(df['region'], df['units']):
    if units > 5:
        labels.append(f"{region.upper()}={units:03d}")
    elif units < 3:
        continue
    else:
        labels.append(region)
revenue = {p: round(u * c, 1) for p, u, c in zip(df['product'], df['units'], df['price'])}
print(", ".join(labels))
print(max(revenue.values()))
print("{:.1%}".format(df['units'].max() / df['units'].sum()))
"#;
    let execution = run(code).unwrap();
    assert_eq!(execution.outcome, Outcome::NoArtifact);
    assert_eq!(execution.printed, "NORTH=010, south, NORTH=007\n21.0\n43.5%\n");
}

#[test]
fn frame_construction_and_line_plot() {
    let code = r#"
months = ['jan', 'feb', 'mar']
trend = pd.DataFrame({'month': months, 'sales': [3, 5, 4], 'cost': [1, 2, 2]})
trend['margin'] = trend['sales'] - trend['cost']
trend.plot(x='month', y=['sales', 'margin'], figsize=(6, 3))
plt.legend()
plt.grid(True)
"#;
    let chart = run(code).unwrap().outcome.chart().cloned().unwrap();
    assert_eq!(chart.size, Some([6.0, 3.0]));
    let axes = &chart.axes[0];
    assert!(axes.legend);
    assert!(axes.grid);
    assert_eq!(axes.xlabel.as_deref(), Some("month"));
    let labels: Vec<Option<&str>> = axes.traces.iter().map(|t| t.label.as_deref()).collect();
    assert_eq!(labels, vec![Some("sales"), Some("margin")]);
    assert_eq!(axes.traces[1].y, vec![2.0, 3.0, 2.0]);
    assert_eq!(texts(&axes.traces[0].x), vec!["jan", "feb", "mar"]);
}

#[test]
fn histogram_counts_samples() {
    let chart = run("plt.hist(df['units'], bins=2)\n")
        .unwrap()
        .outcome
        .chart()
        .cloned()
        .unwrap();
    let trace = &chart.axes[0].traces[0];
    assert_eq!(trace.kind, TraceKind::Hist);
    assert_eq!(trace.y, vec![2.0, 2.0]);
}

#[test]
fn program_edits_its_own_copy_of_the_table() {
    let table = sales_table();
    let bindings = Bindings::standard(table.clone());
    Sandbox::new()
        .execute("df['units'] = 0\ndel df['price']\n", &bindings)
        .unwrap();
    assert_eq!(bindings.get("df"), Some(&quire_sandbox::Binding::Table(table)));
}

#[test]
fn first_chart_capable_binding_wins() {
    // once plt lets go of the figure, the handle the script kept is found
    let code = "fig, ax = plt.subplots()\nax.plot([1, 2, 3])\nplt.close()\n";
    let Outcome::Chart { source, chart } = run(code).unwrap().outcome else {
        panic!("expected a chart");
    };
    assert_eq!(source, "fig");
    assert_eq!(chart.axes[0].traces[0].y, vec![1.0, 2.0, 3.0]);

    let code = "fig = plt.figure()\nplt.close()\nother = plt.figure()\nplt.plot([4])\n";
    let Outcome::Chart { source, .. } = run(code).unwrap().outcome else {
        panic!("expected a chart");
    };
    assert_eq!(source, "plt");
}

#[test]
fn empty_figure_is_not_an_artifact() {
    let execution = run("fig = plt.figure(figsize=(4, 4))\nplt.title('nothing drawn')\n").unwrap();
    assert_eq!(execution.outcome, Outcome::NoArtifact);
}

#[test]
fn step_budget_stops_runaway_loops() {
    let sandbox = Sandbox::new().with_limits(ExecutionLimits::new().with_max_steps(10_000));
    let err = sandbox
        .execute("n = 0\nwhile n < 10:\n    n = n - 1\n", &Bindings::new())
        .unwrap_err();
    assert!(err.was_executed());
    assert!(matches!(
        err,
        SandboxError::RuntimeFailure {
            fault: RuntimeFault::Timeout(TimeoutCause::Steps(10_000)),
            ..
        }
    ));
}

#[test]
fn wall_clock_stops_long_runs() {
    let sandbox = Sandbox::new().with_limits(
        ExecutionLimits::new()
            .with_max_steps(u64::MAX)
            .with_wall_clock_ms(0),
    );
    let err = sandbox
        .execute("total = 0\nfor i in range(50000):\n    total += i\n", &Bindings::new())
        .unwrap_err();
    assert!(matches!(
        err,
        SandboxError::RuntimeFailure {
            fault: RuntimeFault::Timeout(TimeoutCause::WallClock(0)),
            ..
        }
    ));
}

#[test]
fn memory_ceiling_stops_huge_collections() {
    let sandbox = Sandbox::new().with_limits(
        ExecutionLimits::new()
            .with_max_elements(1_000)
            .with_max_string_bytes(4_096),
    );
    for code in [
        "items = [0] * 5000\n",
        "items = list(range(5000))\n",
        "s = 'ab' * 4000\n",
        "d = {i: i for i in range(2000)}\n",
    ] {
        let err = sandbox.execute(code, &Bindings::new()).unwrap_err();
        assert!(
            matches!(
                err,
                SandboxError::RuntimeFailure {
                    fault: RuntimeFault::MemoryCeiling { .. },
                    line: 1
                }
            ),
            "{code:?} gave {err:?}"
        );
    }
}

#[test]
fn allocations_add_up_across_a_run() {
    let err = Sandbox::new()
        .execute("x = [[0] * 99999 for i in range(1000)]\n", &Bindings::new())
        .unwrap_err();
    assert!(
        matches!(
            err,
            SandboxError::RuntimeFailure {
                line: 1,
                fault: RuntimeFault::MemoryCeiling {
                    what: "total allocated elements",
                    ..
                }
            }
        ),
        "{err:?}"
    );

    let sandbox =
        Sandbox::new().with_limits(ExecutionLimits::new().with_max_total_elements(2_000));
    let copies = "big = list(range(100))\nkept = [sorted(big) for i in range(30)]\n";
    let err = sandbox.execute(copies, &Bindings::new()).unwrap_err();
    assert!(
        matches!(
            err,
            SandboxError::RuntimeFailure {
                line: 2,
                fault: RuntimeFault::MemoryCeiling { limit: 2_000, .. }
            }
        ),
        "{err:?}"
    );

    // reading the same list repeatedly allocates nothing new
    let reads = "big = list(range(100))\ntotal = 0\nfor i in range(30):\n    total += len(big) + big[0]\n";
    assert!(sandbox.execute(reads, &Bindings::new()).is_ok());

    let sandbox = Sandbox::new()
        .with_limits(ExecutionLimits::new().with_max_total_string_bytes(1_000));
    let err = sandbox
        .execute("parts = []\nfor i in range(20):\n    parts.append('x' * 100)\n", &Bindings::new())
        .unwrap_err();
    assert!(
        matches!(
            err,
            SandboxError::RuntimeFailure {
                line: 3,
                fault: RuntimeFault::MemoryCeiling {
                    what: "total allocated string bytes",
                    ..
                }
            }
        ),
        "{err:?}"
    );
}

#[test]
fn huge_format_fields_fault_instead_of_crashing() {
    for code in [
        "x = f'{1.5:.70000f}'\n",
        "x = f'{1:>99999999}'\n",
        "x = '{:.70000f}'.format(1.5)\n",
    ] {
        let err = run(code).unwrap_err();
        assert!(
            matches!(
                err,
                SandboxError::RuntimeFailure {
                    line: 1,
                    fault: RuntimeFault::Value(_)
                }
            ),
            "{code:?} gave {err:?}"
        );
    }
    let execution = run("label = f'{2.5:>12.3f}'\nprint(label)\n").unwrap();
    assert_eq!(execution.printed, "       2.500\n");
}

#[test]
fn runtime_failures_carry_the_line() {
    let err = run("x = 1\ny = 2\nz = x / (y - 2)\n").unwrap_err();
    assert_eq!(
        err,
        SandboxError::RuntimeFailure {
            line: 3,
            fault: RuntimeFault::ZeroDivision
        }
    );

    let err = run("total = df['missing'].sum()\n").unwrap_err();
    assert!(matches!(
        err,
        SandboxError::RuntimeFailure {
            line: 1,
            fault: RuntimeFault::Key(_)
        }
    ));

    let err = run("big = 9223372036854775807\nbigger = big + 1\n").unwrap_err();
    assert!(matches!(
        err,
        SandboxError::RuntimeFailure {
            line: 2,
            fault: RuntimeFault::Overflow
        }
    ));
}

#[test]
fn only_aliased_modules_import() {
    let err = run("import numpy as np\n").unwrap_err();
    assert_eq!(
        err,
        SandboxError::RuntimeFailure {
            line: 1,
            fault: RuntimeFault::Import("numpy".to_string())
        }
    );

    let execution = run("from matplotlib import pyplot\nimport pandas\npyplot.bar(['a'], [1])\nn = len(pandas.Series([1, 2]))\n");
    assert!(execution.unwrap().outcome.chart().is_some());

    let sandbox = Sandbox::new().with_module_alias("seaborn", "plt");
    let execution = sandbox
        .execute("import seaborn as sns\nsns.plot([1, 2])\n", &Bindings::standard(sales_table()))
        .unwrap();
    assert!(execution.outcome.chart().is_some());
}

#[test]
fn unsupported_constructs_fault() {
    for code in [
        "def f(x):\n    return x\n",
        "class A:\n    pass\n",
        "square = lambda x: x * x\n",
        "label = 'units: %d' % 3\n",
    ] {
        let err = run(code).unwrap_err();
        assert!(
            matches!(
                err,
                SandboxError::RuntimeFailure {
                    fault: RuntimeFault::Unsupported(_),
                    ..
                }
            ),
            "{code:?} gave {err:?}"
        );
    }
}

#[test]
fn rejected_code_never_runs() {
    let err = run("import os\nplt.bar(['a'], [1])\n").unwrap_err();
    assert!(matches!(err, SandboxError::ValidationRejected { .. }));
    assert!(!err.was_executed());

    let err = run("plt.bar(['a'], [1]\n").unwrap_err();
    assert!(matches!(err, SandboxError::SyntaxInvalid { line: 1, .. }));
}

#[test]
fn chart_serializes_for_the_renderer() {
    let execution = run("plt.bar(['a', 'b'], [1, 2.5])\nplt.title('T')\n").unwrap();
    let json = serde_json::to_value(&execution.outcome).unwrap();
    assert_eq!(json["kind"], "chart");
    assert_eq!(json["source"], "plt");
    assert_eq!(json["chart"]["axes"][0]["title"], "T");
    assert_eq!(json["chart"]["axes"][0]["traces"][0]["kind"], "bar");
    assert_eq!(json["chart"]["axes"][0]["traces"][0]["y"][1], 2.5);
}
