//! Line prompts for the terminal driver.
//!
//! Identity details are trimmed. Passcodes and passwords are taken exactly as typed:
//! only the line terminator is removed, and the service decides what is acceptable.

use std::io::Write as _;

use anyhow::{bail, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::tty::IsTty;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Prompt<R> {
    lines: Lines<R>,
    /// Secrets are read with echo off, straight from the terminal
    terminal: bool,
}

impl Prompt<BufReader<Stdin>> {
    pub fn stdin() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            terminal: std::io::stdin().is_tty(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> Prompt<R> {
    /// Reads answers from `reader`; secrets are echoed like everything else.
    pub fn from_reader(reader: R) -> Self {
        Self { lines: reader.lines(), terminal: false }
    }

    /// Trimmed answer. An empty answer keeps `current`.
    pub async fn ask(&mut self, label: &str, current: &str) -> Result<String> {
        if current.is_empty() {
            show(&format!("{}: ", label))?;
        } else {
            show(&format!("{} [{}]: ", label, current))?;
        }
        let line = self.read_line().await?;
        let answer = line.trim();
        Ok(if answer.is_empty() { current.to_owned() } else { answer.to_owned() })
    }

    /// The answer exactly as typed, surrounding whitespace included.
    pub async fn ask_verbatim(&mut self, label: &str) -> Result<String> {
        show(&format!("{}: ", label))?;
        self.read_line().await
    }

    /// Like [`ask_verbatim`](Self::ask_verbatim), without echoing when on a terminal.
    pub async fn ask_secret(&mut self, label: &str) -> Result<String> {
        if !self.terminal {
            return self.ask_verbatim(label).await;
        }
        show(&format!("{}: ", label))?;
        let secret = tokio::task::spawn_blocking(read_hidden_line).await??;
        println!();
        Ok(secret)
    }

    async fn read_line(&mut self) -> Result<String> {
        let line = self
            .lines
            .next_line()
            .await?
            .ok_or_else(|| anyhow::anyhow!("input closed before signup finished"))?;
        Ok(strip_line_ending(&line).to_owned())
    }
}

fn show(text: &str) -> Result<()> {
    print!("{}", text);
    std::io::stdout().flush()?;
    Ok(())
}

fn strip_line_ending(line: &str) -> &str {
    line.trim_end_matches(|c: char| c == '\r' || c == '\n')
}

/// Restores cooked mode when dropped, even on early return.
struct RawMode;

impl RawMode {
    fn enable() -> std::io::Result<Self> {
        enable_raw_mode()?;
        Ok(RawMode)
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
    }
}

#[derive(Debug, Eq, PartialEq)]
enum Editing {
    Continue,
    Done,
    Interrupted,
}

fn edit(line: &mut String, key: KeyEvent) -> Editing {
    if key.kind == KeyEventKind::Release {
        return Editing::Continue;
    }
    match key.code {
        KeyCode::Enter => Editing::Done,
        KeyCode::Char('c') | KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Editing::Interrupted
        }
        KeyCode::Char(c) => {
            line.push(c);
            Editing::Continue
        }
        KeyCode::Backspace => {
            line.pop();
            Editing::Continue
        }
        _ => Editing::Continue,
    }
}

fn read_hidden_line() -> Result<String> {
    let _raw = RawMode::enable()?;
    let mut line = String::new();
    loop {
        if let Event::Key(key) = event::read()? {
            match edit(&mut line, key) {
                Editing::Continue => {}
                Editing::Done => return Ok(line),
                Editing::Interrupted => bail!("interrupted"),
            }
        }
    }
}
