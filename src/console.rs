//! Output sink handed to every command.
//!
//! Status lines are best-effort: a closed stdout should not turn a finished
//! command into a failure. Streamed model output goes through [`Console::fragment`],
//! which does report write errors so the stream can stop early.

use colored::Colorize;
use std::io::{self, IsTerminal, Write};

const BANNER: &str = r"
██████╗ ███████╗███████╗██████╗     ██████╗ ███████╗███╗   ███╗
██╔══██╗██╔════╝██╔════╝██╔══██╗   ██╔════╝ ██╔════╝████╗ ████║
██║  ██║█████╗  █████╗  ██████╔╝   ██║  ███╗█████╗  ██╔████╔██║
██║  ██║██╔══╝  ██╔══╝  ██╔═══╝    ██║   ██║██╔══╝  ██║╚██╔╝██║
██████╔╝███████╗███████╗██║        ╚██████╔╝███████╗██║ ╚═╝ ██║
╚═════╝ ╚══════╝╚══════╝╚═╝         ╚═════╝ ╚══════╝╚═╝     ╚═╝

                      deepgem by eeko systems
";

pub struct Console<W: Write> {
    out: W,
    color: bool,
}

impl Console<io::Stdout> {
    /// Console on stdout, colored only when attached to a terminal.
    pub fn stdout() -> Self {
        let out = io::stdout();
        let color = out.is_terminal();
        Self::new(out, color)
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self { out, color }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Write a piece of streamed output and flush it immediately.
    pub fn fragment(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())?;
        self.out.flush()
    }

    pub fn line(&mut self, text: impl AsRef<str>) {
        self.emit(text.as_ref());
    }

    pub fn blank(&mut self) {
        self.emit("");
    }

    pub fn banner(&mut self) {
        let text = if self.color {
            BANNER.bold().to_string()
        } else {
            BANNER.to_string()
        };
        self.emit(&text);
    }

    /// `label` in red followed by plain `detail`.
    pub fn error(&mut self, label: &str, detail: impl AsRef<str>) {
        let label = self.paint(label, |s| s.red().to_string());
        match detail.as_ref() {
            "" => self.emit(&label),
            detail => self.emit(&format!("{label} {detail}")),
        }
    }

    pub fn warn(&mut self, text: impl AsRef<str>) {
        let text = self.paint(text.as_ref(), |s| s.yellow().to_string());
        self.emit(&text);
    }

    pub fn success(&mut self, text: impl AsRef<str>) {
        let text = self.paint(text.as_ref(), |s| s.green().to_string());
        self.emit(&text);
    }

    pub fn dim(&mut self, text: impl AsRef<str>) {
        let text = self.paint(text.as_ref(), |s| s.dimmed().to_string());
        self.emit(&text);
    }

    pub fn heading(&mut self, text: impl AsRef<str>) {
        let text = self.paint(text.as_ref(), |s| s.bold().cyan().to_string());
        self.emit(&text);
    }

    /// Commands, URLs and other things the user should copy.
    pub fn highlight(&self, text: &str) -> String {
        self.paint(text, |s| s.cyan().to_string())
    }

    fn paint(&self, text: &str, style: impl Fn(&str) -> String) -> String {
        if self.color {
            style(text)
        } else {
            text.to_string()
        }
    }

    fn emit(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
        let _ = self.out.flush();
    }
}
