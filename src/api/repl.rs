use std::io::{self, Write};

use chrono::Local;
use rustyline::error::ReadlineError;
use rustyline::{DefaultEditor, Result};
use tracing::debug;

use super::calc::CalcClient;
use super::dispatcher::Dispatcher;
use super::error::ExchangeError;
use super::ShellCommand;
use crate::link::FrameLink;

pub const SECURE_INTRO: &str = "send_simple uses a basic XOR encryption to scramble/descramble a short \
message (ASCII-encoded) sent to/from a network device that is running encrypt_simple.p4";

pub const SECURE_HELP: &str = "To use the program type a command word and a string, eg. $e Hello World!
\t| cmd  | description              |
\t|------|--------------------------|
\t| $d   | Send msg to be decrypted |
\t| $e   | Send msg to be encrypted |
\t| $r   | Send msg to be reflected |
\t| help | Display this message     |
\t| quit | Quit program             |
\t| :q   | Quit program             |";

pub const CALC_HELP: &str = "Type an expression <num> <op> <num>, eg. 3 + 4
\tSupported operators: + - & | ^
\tquit or :q to leave";

pub fn classify(line: &str) -> ShellCommand {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.starts_with("quit") || line.starts_with(":q") {
        ShellCommand::Quit
    } else if line.starts_with("help") {
        ShellCommand::Help
    } else if line.trim().is_empty() {
        ShellCommand::Empty
    } else {
        ShellCommand::Line(line.to_string())
    }
}

/// A tool plugged into the shell loop.
pub trait LineHandler {
    fn name(&self) -> &str;
    fn help(&self) -> String;
    /// Handles one operator line. Exchange failures are rendered into `out`,
    /// only failures to write `out` itself are returned.
    fn handle(&mut self, line: &str, out: &mut dyn Write) -> io::Result<()>;
}

fn report(err: &ExchangeError, out: &mut dyn Write) -> io::Result<()> {
    if err.is_no_reply() {
        writeln!(out, "{}  ERROR: {}", Local::now().format("%Y-%m-%d %H:%M:%S"), err)
    } else {
        writeln!(out, "ERROR: {}", err)
    }
}

pub struct SecureShell<L> {
    dispatcher: Dispatcher<L>,
    show_frames: bool,
}

impl<L: FrameLink> SecureShell<L> {
    pub fn new(dispatcher: Dispatcher<L>, show_frames: bool) -> Self {
        SecureShell { dispatcher, show_frames }
    }

    pub fn dispatcher(&self) -> &Dispatcher<L> {
        &self.dispatcher
    }
}

impl<L: FrameLink> LineHandler for SecureShell<L> {
    fn name(&self) -> &str {
        "send_simple"
    }

    fn help(&self) -> String {
        format!("{}\n{}", SECURE_INTRO, SECURE_HELP)
    }

    fn handle(&mut self, line: &str, out: &mut dyn Write) -> io::Result<()> {
        let prepared = match self.dispatcher.prepare_line(line) {
            Ok(prepared) => prepared,
            Err(err) => return report(&err, out),
        };
        if self.show_frames {
            writeln!(out, "{}", prepared.frame)?;
            writeln!(out, "{}", prepared.record)?;
        }

        match self.dispatcher.exchange(&prepared) {
            Ok(outcome) => writeln!(out, "{}", outcome),
            Err(err) => report(&err, out),
        }
    }
}

pub struct CalcShell<L> {
    client: CalcClient<L>,
    show_frames: bool,
}

impl<L: FrameLink> CalcShell<L> {
    pub fn new(client: CalcClient<L>, show_frames: bool) -> Self {
        CalcShell { client, show_frames }
    }

    pub fn client(&self) -> &CalcClient<L> {
        &self.client
    }
}

impl<L: FrameLink> LineHandler for CalcShell<L> {
    fn name(&self) -> &str {
        "calc"
    }

    fn help(&self) -> String {
        CALC_HELP.to_string()
    }

    fn handle(&mut self, line: &str, out: &mut dyn Write) -> io::Result<()> {
        let (header, frame) = match self.client.prepare(line) {
            Ok(prepared) => prepared,
            Err(err) => return report(&err, out),
        };
        if self.show_frames {
            writeln!(out, "{}", frame)?;
            writeln!(out, "{}", header)?;
        }

        match self.client.exchange(&frame) {
            Ok(result) => writeln!(out, "{}", result),
            Err(err) => report(&err, out),
        }
    }
}

/// Reads operator lines until `quit`, `:q`, end of input or interrupt.
pub fn repl(handler: &mut dyn LineHandler) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let mut stdout = io::stdout();
    println!("Type help for short documentation");

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                match classify(&line) {
                    ShellCommand::Quit => {
                        println!("Stopped running {}", handler.name());
                        break;
                    }
                    ShellCommand::Help => println!("{}", handler.help()),
                    ShellCommand::Empty => continue,
                    ShellCommand::Line(line) => {
                        handler.handle(&line, &mut stdout)?;
                        stdout.flush()?;
                    }
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("input closed");
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(classify("quit"), ShellCommand::Quit);
        assert_eq!(classify("quitting"), ShellCommand::Quit);
        assert_eq!(classify(":q"), ShellCommand::Quit);
        assert_eq!(classify("help"), ShellCommand::Help);
        assert_eq!(classify("   "), ShellCommand::Empty);
        assert_eq!(
            classify("$e Hello World!\n"),
            ShellCommand::Line("$e Hello World!".to_string())
        );
    }

    #[test]
    fn test_help_lists_every_command() {
        for word in ["$d", "$e", "$r", "help", "quit", ":q"] {
            assert!(SECURE_HELP.contains(word), "{word} missing from help");
        }
    }
}
