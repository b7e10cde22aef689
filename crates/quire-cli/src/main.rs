use quire_cli::{build_cli, commands};
use std::path::PathBuf;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let matches = build_cli().get_matches();
    commands::init_tracing(matches.get_flag("log-json"));

    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let config = commands::load_config(config_path)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let ok = match matches.subcommand() {
        Some(("review", args)) => {
            let sheet = required_path(args, "sheet")?;
            let page_size = args.get_one::<usize>("page-size").copied();
            commands::review(&config, sheet, page_size, std::io::stdin().lock(), &mut out)?
        }
        Some(("merge", args)) => {
            let sheets = paths(args, "sheets");
            let drop_columns = strings(args, "drop-column");
            let drop_rows = strings(args, "drop-row");
            let output = required_path(args, "output")?;
            commands::merge(&config, &sheets, &drop_columns, &drop_rows, output, &mut out)?
        }
        Some(("validate", args)) => commands::validate(required_path(args, "code")?, &mut out)?,
        Some(("run", args)) => {
            let code = required_path(args, "code")?;
            let table = required_path(args, "table")?;
            commands::run(&config, code, table, &mut out)?
        }
        Some(("visualize", args)) => {
            let sheets = paths(args, "sheets");
            let reply = required_path(args, "reply")?;
            let request = args.get_one::<String>("request").map_or("chart", String::as_str);
            commands::visualize(&config, &sheets, reply, request, &mut out).await?
        }
        _ => anyhow::bail!("unknown command"),
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn required_path<'a>(
    args: &'a clap::ArgMatches,
    name: &str,
) -> anyhow::Result<&'a std::path::Path> {
    args.get_one::<PathBuf>(name)
        .map(PathBuf::as_path)
        .ok_or_else(|| anyhow::anyhow!("missing argument <{name}>"))
}

fn strings(args: &clap::ArgMatches, name: &str) -> Vec<String> {
    args.get_many::<String>(name)
        .into_iter()
        .flatten()
        .cloned()
        .collect()
}

fn paths(args: &clap::ArgMatches, name: &str) -> Vec<PathBuf> {
    args.get_many::<PathBuf>(name)
        .into_iter()
        .flatten()
        .cloned()
        .collect()
}
