//! textdisp - Entry Point
//!
//! Lays out a text file in a fixed-size view, prints the visible display
//! lines, then completes the background line metrics and reports the final
//! scroll position.

use clap::Parser;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use textdisp::config::CliOverrides;
use textdisp::host::RecordingHost;
use textdisp::logging::LogTarget;
use textdisp::model::{AppError, TextIndex, TextStore, WrapMode};
use textdisp::widget::TextWidget;
use tracing::info;

/// textdisp - incremental text layout and scrolling
#[derive(Parser, Debug)]
#[command(name = "textdisp")]
#[command(version)]
#[command(about = "Lay out a text file in a fixed-size view and report what is visible")]
pub struct Args {
    /// Path to the text file (reads from stdin if not provided)
    pub file: Option<PathBuf>,

    /// View width in pixels
    #[arg(long)]
    pub width: Option<i32>,

    /// View height in pixels
    #[arg(long)]
    pub height: Option<i32>,

    /// Wrap mode: none, char, word or codepoint
    #[arg(long)]
    pub wrap: Option<WrapMode>,

    /// Logical line (1-based) to put at the top of the view
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub yview_line: Option<u32>,

    /// Display lines laid out per metric slice
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub budget: Option<u32>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log to stderr instead of the log file
    #[arg(long)]
    pub log_stderr: bool,
}

fn read_input(file: Option<&PathBuf>) -> Result<String, AppError> {
    match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| AppError::InputRead {
            path: path.clone(),
            source,
        }),
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .map_err(|source| AppError::InputRead {
                    path: PathBuf::from("-"),
                    source,
                })?;
            Ok(text)
        }
    }
}

fn run(args: Args) -> Result<(), AppError> {
    // Defaults -> Config File -> Env Vars -> CLI Args
    let config = {
        let config_file = textdisp::config::load_config_with_precedence(args.config.clone())?;
        let merged = textdisp::config::merge_config(config_file)?;
        let with_env = textdisp::config::apply_env_overrides(merged)?;
        let overrides = CliOverrides {
            width: args.width,
            height: args.height,
            wrap: args.wrap,
            metric_budget: args.budget.map(|b| b as usize),
        };
        textdisp::config::apply_cli_overrides(with_env, &overrides)
    };

    let target = if args.log_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::File(config.log_file_path.clone())
    };
    textdisp::logging::init(&target)?;
    info!(config = ?config, "Configuration loaded and resolved");

    let text = read_input(args.file.as_ref())?;
    let mut widget = TextWidget::from_config(&text, &config);
    info!(lines = widget.buffer().line_count(), "document loaded");

    if let Some(line) = args.yview_line {
        let last = widget.buffer().line_count().saturating_sub(1);
        let line = (line as usize - 1).min(last);
        widget.set_yview(TextIndex::line_start(line), 0);
    }

    let mut out = io::stdout().lock();
    let (first, last) = widget.yview();
    writeln!(out, "yview {first:.4} {last:.4} (estimated)")?;
    for line in widget.visible_lines() {
        writeln!(out, "{:>6} {:>6} | {}", line.index.line + 1, line.y, line.text)?;
    }

    let steps = widget.finish_metrics();
    let mut host = RecordingHost::default();
    widget.deliver(&mut host);
    let stats = *widget.state().stats();
    info!(steps, layouts = stats.layouts, metric_layouts = stats.metric_layouts, "metrics complete");

    writeln!(
        out,
        "metrics complete after {steps} steps: {} px, {} layouts",
        widget.buffer().total_pixels(),
        stats.layouts
    )?;
    let (first, last) = host.last_yview().unwrap_or_else(|| widget.yview());
    writeln!(out, "yview {first:.4} {last:.4}")?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    run(args)?;
    Ok(())
}
