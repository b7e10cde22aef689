//! Line-oriented review loop

use anyhow::Context;
use quire_queue::Status;
use quire_session::{Notice, ReviewCommand, ReviewSession};
use quire_table::TableWriter;
use std::io::{BufRead, Write};
use std::path::PathBuf;

pub const HELP: &str = "\
commands:
  n, next            next question
  p, prev            previous question
  <N>, g <N>         go to question N
  a, approve         approve and move on
  h, hold            hold and move on
  rm, remove         delete the current question
  ls                 show the list page
  pn, pp             next / previous list page
  o <K>              open entry K of the list page
  s, show            show the current question
  export [all|approved|held|pending] [DIR]
  reset              unload the sheet
  q, quit            leave";

/// One parsed input line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplInput {
    Command(ReviewCommand),
    Show,
    List,
    /// 1-based entry on the list page
    OpenEntry(usize),
    Export {
        status: Option<Status>,
        dir: PathBuf,
    },
    Reset,
    Help,
    Quit,
    Blank,
}

/// Parse one input line
///
/// # Errors
/// Returns a message for unknown commands or malformed arguments
pub fn parse_line(line: &str) -> Result<ReplInput, String> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(ReplInput::Blank);
    };
    let rest: Vec<&str> = words.collect();
    let input = match (head, rest.as_slice()) {
        ("n" | "next", []) => ReplInput::Command(ReviewCommand::Next),
        ("p" | "prev", []) => ReplInput::Command(ReviewCommand::Previous),
        ("g" | "goto", [target]) => ReplInput::Command(ReviewCommand::Goto((*target).to_string())),
        ("a" | "approve", []) => ReplInput::Command(ReviewCommand::Approve),
        ("h" | "hold", []) => ReplInput::Command(ReviewCommand::Hold),
        ("rm" | "remove", []) => ReplInput::Command(ReviewCommand::Remove),
        ("pn", []) => ReplInput::Command(ReviewCommand::NextPage),
        ("pp", []) => ReplInput::Command(ReviewCommand::PreviousPage),
        ("ls" | "list", []) => ReplInput::List,
        ("s" | "show", []) => ReplInput::Show,
        ("o" | "open", [k]) => k
            .parse()
            .map(ReplInput::OpenEntry)
            .map_err(|_| format!("'{k}' is not an entry number"))?,
        ("export", args) => parse_export(args)?,
        ("reset", []) => ReplInput::Reset,
        ("help" | "?", []) => ReplInput::Help,
        ("q" | "quit" | "exit", []) => ReplInput::Quit,
        (number, []) if number.starts_with(|c: char| c.is_ascii_digit() || c == '-') => {
            ReplInput::Command(ReviewCommand::Goto(number.to_string()))
        }
        _ => return Err(format!("unknown command '{}' (try 'help')", line.trim())),
    };
    Ok(input)
}

fn parse_export(args: &[&str]) -> Result<ReplInput, String> {
    let (status, dir) = match args {
        [] => (None, "."),
        [scope] | [scope, _] => {
            let status = match *scope {
                "all" => None,
                "approved" => Some(Status::Approved),
                "held" => Some(Status::Held),
                "pending" => Some(Status::Unset),
                other => return Err(format!("unknown export scope '{other}'")),
            };
            (status, args.get(1).copied().unwrap_or("."))
        }
        _ => return Err("usage: export [all|approved|held|pending] [DIR]".to_string()),
    };
    Ok(ReplInput::Export {
        status,
        dir: PathBuf::from(dir),
    })
}

/// Drive a review session from `input` until it ends or `quit`
///
/// # Errors
/// Returns I/O errors on the terminal streams or the export directory
pub fn run_review<R, W>(
    session: &mut ReviewSession,
    writer: &dyn TableWriter,
    input: R,
    out: &mut W,
) -> anyhow::Result<()>
where
    R: BufRead,
    W: Write,
{
    show_current(session, out)?;
    for line in input.lines() {
        let line = line.context("reading command")?;
        let parsed = match parse_line(&line) {
            Ok(parsed) => parsed,
            Err(message) => {
                writeln!(out, "{}", Notice::warning(message))?;
                continue;
            }
        };
        match parsed {
            ReplInput::Blank => {}
            ReplInput::Quit => break,
            ReplInput::Help => writeln!(out, "{HELP}")?,
            ReplInput::Show => show_current(session, out)?,
            ReplInput::List => show_list(session, out)?,
            ReplInput::Reset => writeln!(out, "{}", session.reset())?,
            ReplInput::Command(command) => {
                let moves_list = matches!(
                    command,
                    ReviewCommand::NextPage | ReviewCommand::PreviousPage
                );
                let notice = session.handle(command);
                writeln!(out, "{notice}")?;
                if moves_list {
                    show_list(session, out)?;
                } else if !notice.is_failure() {
                    show_current(session, out)?;
                }
            }
            ReplInput::OpenEntry(k) => {
                let id = session
                    .list()
                    .and_then(|list| k.checked_sub(1).and_then(|i| list.entries.get(i).map(|e| e.id)));
                match id {
                    Some(id) => {
                        writeln!(out, "{}", session.handle(ReviewCommand::Open(id)))?;
                        show_current(session, out)?;
                    }
                    None => writeln!(out, "{}", Notice::warning(format!("no entry {k} on this page")))?,
                }
            }
            ReplInput::Export { status, dir } => match session.export(writer, status) {
                Ok(download) => {
                    let path = dir.join(&download.file_name);
                    std::fs::write(&path, &download.bytes)
                        .with_context(|| format!("writing {}", path.display()))?;
                    writeln!(out, "{}", Notice::success(format!("Saved {}", path.display())))?;
                }
                Err(notice) => writeln!(out, "{notice}")?,
            },
        }
    }
    Ok(())
}

fn show_current<W: Write>(session: &ReviewSession, out: &mut W) -> std::io::Result<()> {
    let Some(view) = session.view() else {
        return writeln!(out, "(no question to show)");
    };
    writeln!(
        out,
        "Question {} / {} [{}]",
        view.position, view.total, view.status
    )?;
    for (name, value) in &view.fields {
        writeln!(out, "  {name}: {value}")?;
    }
    Ok(())
}

fn show_list<W: Write>(session: &ReviewSession, out: &mut W) -> std::io::Result<()> {
    let Some(list) = session.list() else {
        return writeln!(out, "(no sheet loaded)");
    };
    for (k, entry) in list.entries.iter().enumerate() {
        let marker = if entry.current { '*' } else { ' ' };
        writeln!(out, "{marker} {:>2}. {}", k + 1, entry.label)?;
    }
    writeln!(out, "Page {} / {}", list.number, list.total_pages)
}
