mod args;
mod log_capture;
mod project;
mod session;

use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;

use crate::args::EditorArgs;
use crate::session::Session;

const LOG_CAPACITY: usize = 10_000;

fn main() -> ExitCode {
    let started = Instant::now();
    let args = EditorArgs::parse();

    let loaded = project::load_project(&args.project);
    let filter = if args.verbose {
        "debug".to_string()
    } else {
        loaded
            .as_ref()
            .map(|config| config.editor.log_filter.clone())
            .unwrap_or_else(|_| "info".to_string())
    };
    if let Err(err) = log_capture::install(&filter, LOG_CAPACITY) {
        eprintln!("{err}");
        return ExitCode::FAILURE;
    }
    let config = project::or_default(loaded);

    let result = run(&args, &config);
    report_problems(started);
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &EditorArgs, config: &project::ProjectConfig) -> canvas_scene::SceneResult {
    let mut session = Session::open(config, &args.scene)?;

    if let Some(transcript) = &args.replay {
        let applied = session.replay_file(transcript)?;
        log::info!("applied {applied} records");
    }

    if let Some(record) = &args.record {
        session.write_transcript(record)?;
        log::info!("wrote transcript to {}", record.display());
    }

    let dirty = session.summary().state == canvas_core::abstract_editor::DocumentState::Dirty;
    if args.output.is_some() || dirty {
        let path = session.save(args.output.as_deref())?;
        log::debug!("wrote {}", path.display());
    } else {
        log::debug!("{} unchanged, not saved", session.scene_path().display());
    }

    log::info!("[{}] {}", config.project.name, session.summary());
    Ok(())
}

/// Repeats warnings and errors from the session so they are not lost in the
/// output of a long replay.
fn report_problems(started: Instant) {
    let Some(buffer) = log_capture::log_buffer() else {
        return;
    };
    let buffer = buffer.lock();
    let count = buffer.count_at_least(log::Level::Warn);
    if count == 0 {
        return;
    }
    eprintln!("{count} warning(s) during the session:");
    for entry in buffer
        .entries()
        .iter()
        .filter(|e| e.level <= log::Level::Warn)
    {
        eprintln!(
            "  +{:>6}ms {:<5} {}: {}",
            entry.timestamp.duration_since(started).as_millis(),
            entry.level,
            entry.target,
            entry.message
        );
    }
}
