//! Console reporter - stage spinners and colored status lines

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::time::Duration;
use xwalk_migrate::{MigrateError, Reporter, Stage};

/// How much progress to print
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Errors only
    Quiet,
    Normal,
    /// Also print informational messages
    Verbose,
}

/// Reporter that draws a spinner per stage on the terminal
pub struct ConsoleReporter {
    verbosity: Verbosity,
    spinner: RefCell<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            spinner: RefCell::new(None),
        }
    }

    fn shows_progress(&self) -> bool {
        self.verbosity != Verbosity::Quiet
    }

    /// Print a line without tearing the active spinner
    fn print(&self, line: String) {
        match self.spinner.borrow().as_ref() {
            Some(spinner) => spinner.suspend(|| println!("{}", line)),
            None => println!("{}", line),
        }
    }

    fn clear_spinner(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }
}

fn visible(stage: Stage) -> bool {
    !matches!(stage, Stage::Init | Stage::Done)
}

impl Reporter for ConsoleReporter {
    fn stage_started(&self, stage: Stage) {
        if !self.shows_progress() || !visible(stage) {
            return;
        }

        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(stage.description());
        spinner.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.borrow_mut() = Some(spinner);
    }

    fn stage_finished(&self, stage: Stage) {
        self.clear_spinner();
        if self.shows_progress() && visible(stage) {
            println!("{} {}", "✓".green().bold(), stage.description());
        }
    }

    fn stage_skipped(&self, stage: Stage, reason: &str) {
        self.clear_spinner();
        if self.shows_progress() {
            println!(
                "{} {} {}",
                "-".yellow().bold(),
                stage.description(),
                format!("(skipped: {})", reason).dimmed()
            );
        }
    }

    fn stage_failed(&self, stage: Stage, error: &MigrateError) {
        self.clear_spinner();
        eprintln!("{} {}", "✗".red().bold(), stage.description());
        eprintln!("  {} {}", format!("{}:", error.kind()).red(), error);
        if let Some(guidance) = error.guidance() {
            eprintln!("  {} {}", "hint:".cyan().bold(), guidance);
        }
    }

    fn info(&self, message: &str) {
        if self.verbosity == Verbosity::Verbose {
            self.print(format!("  {}", message.dimmed()));
        }
    }

    fn warn(&self, message: &str) {
        match self.spinner.borrow().as_ref() {
            Some(spinner) => spinner.suspend(|| eprintln!("{} {}", "warning:".yellow().bold(), message)),
            None => eprintln!("{} {}", "warning:".yellow().bold(), message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quiet_reporter_never_starts_spinner() {
        let reporter = ConsoleReporter::new(Verbosity::Quiet);
        reporter.stage_started(Stage::Download);
        assert!(reporter.spinner.borrow().is_none());
    }

    #[test]
    fn test_spinner_lifecycle() {
        let reporter = ConsoleReporter::new(Verbosity::Normal);
        reporter.stage_started(Stage::Init);
        assert!(reporter.spinner.borrow().is_none());

        reporter.stage_started(Stage::Replace);
        assert!(reporter.spinner.borrow().is_some());

        reporter.stage_finished(Stage::Replace);
        assert!(reporter.spinner.borrow().is_none());
    }
}
