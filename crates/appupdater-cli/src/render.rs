use std::io::{self, IsTerminal};
use std::time::{Duration, Instant};

use anstyle::{AnsiColor, Effects, Style};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

#[derive(Copy, Clone, Debug)]
pub(crate) struct TerminalRenderer {
    style: OutputStyle,
}

pub(crate) struct TerminalProgress {
    style: OutputStyle,
    label: String,
    total: u64,
    current: u64,
    progress_bar: Option<ProgressBar>,
    started_at: Instant,
}

impl TerminalRenderer {
    pub(crate) fn from_style(style: OutputStyle) -> Self {
        Self { style }
    }

    pub(crate) fn current() -> Self {
        Self::from_style(current_output_style())
    }

    pub(crate) fn print_status(self, status: &str, message: &str) {
        let line = render_status_line(self.style, status, message);
        match self.style {
            OutputStyle::Plain => println!("{line}"),
            OutputStyle::Rich => println!("{}", colorize(status_style(status), &line)),
        }
    }

    /// Error lines go to stderr so they survive a redirected stdout.
    pub(crate) fn print_error(self, message: &str) {
        let line = render_status_line(self.style, "err", message);
        match self.style {
            OutputStyle::Plain => eprintln!("{line}"),
            OutputStyle::Rich => eprintln!("{}", colorize(status_style("err"), &line)),
        }
    }

    pub(crate) fn start_progress(self, label: &str, total: u64) -> TerminalProgress {
        let progress_bar = if self.style == OutputStyle::Rich {
            let progress_bar = ProgressBar::new(total.max(1));
            if let Ok(style) = ProgressStyle::with_template(
                "{spinner:.cyan.bold} {msg:<8} [{bar:20.cyan/blue}] {pos:>4}/{len:4} {elapsed_precise}",
            ) {
                progress_bar.set_style(style.tick_chars("<^>v ").progress_chars("=>-"));
            }
            progress_bar.set_message(label.to_string());
            progress_bar.enable_steady_tick(Duration::from_millis(80));
            Some(progress_bar)
        } else {
            None
        };

        TerminalProgress {
            style: self.style,
            label: label.to_string(),
            total,
            current: 0,
            progress_bar,
            started_at: Instant::now(),
        }
    }
}

impl TerminalProgress {
    pub(crate) fn set(&mut self, current: u64) {
        self.current = current.min(self.total);

        let Some(progress_bar) = &self.progress_bar else {
            return;
        };

        let safe_total = self.total.max(1);
        progress_bar.set_length(safe_total);
        progress_bar.set_position(self.current.min(safe_total));
    }

    /// Hides the bar while `prompt` talks to the operator.
    pub(crate) fn suspend<F, R>(&self, prompt: F) -> R
    where
        F: FnOnce() -> R,
    {
        match &self.progress_bar {
            Some(progress_bar) => progress_bar.suspend(prompt),
            None => prompt(),
        }
    }

    pub(crate) fn finish_success(mut self) {
        let Some(progress_bar) = self.progress_bar.take() else {
            return;
        };

        progress_bar.finish_and_clear();
        if let Some(line) = render_progress_line(
            self.style,
            &self.label,
            self.current,
            self.total,
            Some(self.started_at.elapsed()),
        ) {
            eprintln!("{line}");
        }
    }

    pub(crate) fn finish_abandon(mut self) {
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }
}

pub(crate) fn current_output_style() -> OutputStyle {
    resolve_output_style(io::stderr().is_terminal())
}

pub(crate) fn resolve_output_style(stderr_is_tty: bool) -> OutputStyle {
    if stderr_is_tty {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {message}", status_badge(status)),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        _ => "[..]",
    }
}

pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    let millis = elapsed.subsec_millis();
    format!("{secs}.{millis:03}s")
}

fn status_style(status: &str) -> Style {
    let color = match status {
        "ok" => AnsiColor::BrightGreen,
        "warn" => AnsiColor::BrightYellow,
        "err" => AnsiColor::BrightRed,
        _ => AnsiColor::BrightBlue,
    };
    Style::new().fg_color(Some(color.into())).effects(Effects::BOLD)
}

fn progress_label_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightCyan.into()))
        .effects(Effects::BOLD)
}

fn progress_bar_style() -> Style {
    Style::new().fg_color(Some(AnsiColor::BrightBlue.into()))
}

fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}

pub(crate) fn render_progress_line(
    style: OutputStyle,
    label: &str,
    current: u64,
    total: u64,
    elapsed: Option<Duration>,
) -> Option<String> {
    if style == OutputStyle::Plain {
        return None;
    }

    let width = 18_usize;
    let safe_total = total.max(1);
    let bounded_current = current.min(safe_total);
    let filled = ((bounded_current as usize) * width) / (safe_total as usize);
    let bar = format!(
        "{}{}",
        "=".repeat(filled),
        "-".repeat(width.saturating_sub(filled))
    );
    let percent = (bounded_current * 100) / safe_total;
    let counts = format!("{}/{}", HumanCount(current), HumanCount(total));
    let suffix = elapsed
        .map(|value| format!(" complete in {}", format_elapsed(value)))
        .unwrap_or_default();

    Some(format!(
        "{} [{}] {:>3}% {}{}",
        colorize(progress_label_style(), label),
        colorize(progress_bar_style(), &bar),
        percent,
        counts,
        suffix
    ))
}
