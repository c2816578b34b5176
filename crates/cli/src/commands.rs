use anyhow::{Result, bail};
use playlist::clip::format_tags;
use playlist::{
    Command, Controller, DraftField, EditMode, Event, JsonFileStorage, PlaylistConfig,
    probe_duration_seconds, spawn_ffplay_bridge,
};
use tracing::{info, warn};

/// Draft fields given on the command line; `None` keeps the current value.
#[derive(Debug, Default)]
pub struct DraftInput {
    pub name: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub tags: Option<String>,
}

pub fn list(config: &PlaylistConfig, tag: Option<&str>) -> Result<()> {
    let mut controller = Controller::with_file_storage(config)?;
    if let Some(tag) = tag {
        controller.handle_command(Command::SetFilter {
            tag: tag.to_string(),
        })?;
    }

    let snapshot = controller.snapshot();
    for index in snapshot.visible {
        let clip = &snapshot.clips[index];
        println!(
            "{index:>3}  {:<24} {:>8} - {:<8} {}",
            clip.name,
            clip.start,
            clip.end,
            format_tags(&clip.tags)
        );
    }
    Ok(())
}

pub fn add(config: &PlaylistConfig, duration: Option<f64>, input: DraftInput) -> Result<()> {
    let mut controller = open_with_duration(config, duration)?;
    submit_draft(&mut controller, EditMode::Add, None, input)?;
    let index = controller.clips().len() - 1;
    println!("added clip {index}");
    Ok(())
}

pub fn edit(
    config: &PlaylistConfig,
    duration: Option<f64>,
    index: usize,
    input: DraftInput,
) -> Result<()> {
    let mut controller = open_with_duration(config, duration)?;
    submit_draft(&mut controller, EditMode::Edit, Some(index), input)?;
    println!("updated clip {index}");
    Ok(())
}

pub fn delete(config: &PlaylistConfig, index: usize) -> Result<()> {
    let mut controller = Controller::with_file_storage(config)?;
    submit_draft(
        &mut controller,
        EditMode::Delete,
        Some(index),
        DraftInput::default(),
    )?;
    println!("deleted clip {index}");
    Ok(())
}

/// Plays from `from` until the sequencer stops after the last clip.
pub fn play(config: &PlaylistConfig, duration: Option<f64>, from: usize) -> Result<()> {
    let (command_tx, event_rx) = spawn_ffplay_bridge(config)?;
    if let Some(seconds) = duration {
        command_tx.send(Command::DurationKnown { seconds })?;
    }
    command_tx.send(Command::PlayClip { index: from })?;

    for event in event_rx.iter() {
        match event {
            Event::PlayRange(directive) if directive.autoplay => {
                println!("playing clip {}: {}", directive.clip_index, directive.locator);
            }
            Event::TransitionScheduled { delay, .. } => {
                println!("next clip in {:.1}s", delay.as_secs_f64());
            }
            Event::DurationChanged { seconds } => {
                info!(seconds, "source duration known");
            }
            Event::PlaybackStopped { index } => {
                println!("playlist finished after clip {index}");
                return Ok(());
            }
            Event::Error(error) => bail!("{}", error.message),
            _ => {}
        }
    }

    bail!("playback bridge stopped unexpectedly")
}

fn open_with_duration(
    config: &PlaylistConfig,
    duration: Option<f64>,
) -> Result<Controller<JsonFileStorage>> {
    let mut controller = Controller::with_file_storage(config)?;
    let seconds = duration.unwrap_or_else(|| probe_or_fallback(config));
    controller.handle_command(Command::DurationKnown { seconds })?;
    Ok(controller)
}

fn probe_or_fallback(config: &PlaylistConfig) -> f64 {
    match probe_duration_seconds(&config.source_uri) {
        Ok(Some(seconds)) => seconds,
        Ok(None) => {
            warn!(
                source = %config.source_uri,
                fallback = config.full_video_end,
                "source reports no duration"
            );
            config.full_video_end
        }
        Err(error) => {
            warn!(
                source = %config.source_uri,
                %error,
                fallback = config.full_video_end,
                "duration probe failed"
            );
            config.full_video_end
        }
    }
}

fn submit_draft(
    controller: &mut Controller<JsonFileStorage>,
    mode: EditMode,
    index: Option<usize>,
    input: DraftInput,
) -> Result<()> {
    controller.handle_command(Command::SetMode { mode })?;
    if let Some(index) = index {
        controller.handle_command(Command::SelectClip { index })?;
    }

    let fields = [
        (DraftField::Name, input.name),
        (DraftField::Start, input.start),
        (DraftField::End, input.end),
        (DraftField::Tags, input.tags),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            controller.handle_command(Command::UpdateDraft { field, value })?;
        }
    }

    let events = controller.handle_command(Command::Submit)?;
    if let Some(message) = events.into_iter().find_map(|event| match event {
        Event::Error(error) => Some(error.message),
        _ => None,
    }) {
        bail!("{message}");
    }
    Ok(())
}
