// UI layer: the terminal the workflow talks through. Prompts use `dialoguer`,
// screen clearing uses `crossterm`, and the pause between bulk submissions
// shows an `indicatif` countdown. The workflow only sees the `Console` and
// `Pacer` traits so tests can script both.

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use dialoguer::{Input, Password};
use indicatif::{ProgressBar, ProgressStyle};

/// Line-oriented operator interaction.
pub trait Console {
    /// Prompt for one line of input. Empty input is allowed.
    fn read_line(&mut self, prompt: &str) -> io::Result<String>;

    /// Prompt for a line without echoing it.
    fn read_secret(&mut self, prompt: &str) -> io::Result<String>;

    /// Wait for the "continue or exit" answer and return its first character.
    fn read_key(&mut self) -> io::Result<Option<char>>;

    fn say(&mut self, message: &str);

    fn clear(&mut self);
}

/// Blocking waits on the single control flow.
pub trait Pacer {
    fn sleep(&mut self, delay: Duration);

    /// The wait after a bulk submission.
    fn pace(&mut self, delay: Duration) {
        self.sleep(delay);
    }
}

/// The real terminal.
#[derive(Debug, Default)]
pub struct TerminalConsole;

impl Console for TerminalConsole {
    fn read_line(&mut self, prompt: &str) -> io::Result<String> {
        Input::<String>::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    }

    fn read_secret(&mut self, prompt: &str) -> io::Result<String> {
        Password::new().with_prompt(prompt).interact()
    }

    fn read_key(&mut self) -> io::Result<Option<char>> {
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
        Ok(line.chars().next())
    }

    fn say(&mut self, message: &str) {
        println!("{message}");
    }

    fn clear(&mut self) {
        let mut out = io::stdout();
        if let Err(e) = execute!(out, Clear(ClearType::All), MoveTo(0, 0)).and_then(|_| out.flush())
        {
            tracing::warn!(error = %e, "cannot clear terminal");
        }
    }
}

/// Sleeps the calling thread; bulk pacing shows a countdown spinner.
#[derive(Debug, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn sleep(&mut self, delay: Duration) {
        thread::sleep(delay);
    }

    fn pace(&mut self, delay: Duration) {
        if delay.is_zero() {
            return;
        }
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("  {spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.enable_steady_tick(Duration::from_millis(120));

        let mut remaining = delay;
        while !remaining.is_zero() {
            spinner.set_message(format!("next submission in {}s", remaining.as_secs().max(1)));
            let step = remaining.min(Duration::from_secs(1));
            thread::sleep(step);
            remaining -= step;
        }
        spinner.finish_and_clear();
    }
}
