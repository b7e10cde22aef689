//! Command-line definition

use clap::{value_parser, Arg, ArgAction, Command};
use std::path::PathBuf;

/// Build the `quire` command
#[must_use]
pub fn build_cli() -> Command {
    Command::new("quire")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Question review queue and sandboxed chart execution")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Write logs as JSON lines"),
        )
        .subcommand(
            Command::new("review")
                .about("Review a question sheet interactively (commands on stdin)")
                .arg(
                    Arg::new("sheet")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Question sheet (JSON sheet document)"),
                )
                .arg(
                    Arg::new("page-size")
                        .long("page-size")
                        .value_parser(value_parser!(usize))
                        .help("Records per list page"),
                ),
        )
        .subcommand(
            Command::new("merge")
                .about("Edit and stack several sheets into one")
                .arg(
                    Arg::new("sheets")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Sheets to merge, in order"),
                )
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .default_value(".")
                        .value_parser(value_parser!(PathBuf))
                        .help("Directory for the merged sheet"),
                )
                .arg(
                    Arg::new("drop-column")
                        .long("drop-column")
                        .action(ArgAction::Append)
                        .help("FILE=COLUMN to remove before merging"),
                )
                .arg(
                    Arg::new("drop-row")
                        .long("drop-row")
                        .action(ArgAction::Append)
                        .help("FILE=ROW (0-based) to remove before merging"),
                ),
        )
        .subcommand(
            Command::new("validate")
                .about("Check a chart program without running it")
                .arg(
                    Arg::new("code")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Program file"),
                ),
        )
        .subcommand(
            Command::new("run")
                .about("Validate and run a chart program against a sheet")
                .arg(
                    Arg::new("code")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Program file"),
                )
                .arg(
                    Arg::new("table")
                        .long("table")
                        .short('t')
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Sheet bound as `df`"),
                ),
        )
        .subcommand(
            Command::new("visualize")
                .about("Replay a saved model reply through the analysis workflow")
                .arg(
                    Arg::new("sheets")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Sheets to merge"),
                )
                .arg(
                    Arg::new("reply")
                        .long("reply")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("File holding the model reply"),
                )
                .arg(
                    Arg::new("request")
                        .long("request")
                        .default_value("chart")
                        .help("Visualization request text"),
                ),
        )
}
