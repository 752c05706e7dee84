use anyhow::{Context, Result};
use clap::Parser;
use std::io;

use pdf_toolkit::cli::{run_menu, Args};
use pdf_toolkit::config::Settings;

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(match args.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    let settings = Settings::new(&args.workspace);

    let Some(command) = args.command else {
        settings.ensure_workspace().with_context(|| {
            format!("Failed to create workspace: {}", settings.workspace().display())
        })?;
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        return run_menu(&settings, &mut input, &mut output).with_context(|| "Menu session failed");
    };

    let task = command.into_task().with_context(|| "Invalid arguments")?;
    let report = task
        .run(&settings)
        .with_context(|| format!("Failed to run {}", task))?;

    print!("{}", report);

    if report.failed() > 0 {
        anyhow::bail!("{} of {} files failed", report.failed(), report.outcomes.len());
    }

    Ok(())
}
