//! Worker thread that owns a controller, its media surface and the
//! transition clock.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::api::{Command, Controller, Event, PlaylistErrorEvent};
use crate::config::PlaylistConfig;
use crate::error::{PlaylistError, Result};
use crate::media::{FfplayMediaSurface, MediaNotification, MediaSurface};
use crate::sequencer::TransitionToken;
use crate::storage::{ClipStorage, JsonFileStorage};

const COMMAND_CHANNEL_CAPACITY: usize = 32;
const EVENT_CHANNEL_CAPACITY: usize = 32;
const SURFACE_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Sender used by a front end to dispatch commands to the controller thread.
pub type ControllerCommandSender = mpsc::SyncSender<Command>;

/// Receiver used by a front end to read events emitted by the controller thread.
pub type ControllerEventReceiver = mpsc::Receiver<Event>;

/// Spawns the production bridge: file-backed storage and an `ffplay` surface.
pub fn spawn_ffplay_bridge(
    config: &PlaylistConfig,
) -> Result<(ControllerCommandSender, ControllerEventReceiver)> {
    let controller = Controller::<JsonFileStorage>::with_file_storage(config)?;
    Ok(spawn_controller_bridge(controller, FfplayMediaSurface::new()))
}

/// Spawns a bridge around any storage and media surface.
///
/// The thread first emits the controller's start events, then serves
/// commands until every sender is dropped or the receiver goes away.
pub fn spawn_controller_bridge<S, M>(
    controller: Controller<S>,
    surface: M,
) -> (ControllerCommandSender, ControllerEventReceiver)
where
    S: ClipStorage + Send + 'static,
    M: MediaSurface + Send + 'static,
{
    let (command_tx, command_rx) = mpsc::sync_channel::<Command>(COMMAND_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::sync_channel::<Event>(EVENT_CHANNEL_CAPACITY);

    thread::spawn(move || {
        let mut worker = BridgeWorker {
            controller,
            surface,
            event_tx,
            pending: None,
        };
        worker.run(command_rx);
    });

    (command_tx, event_rx)
}

struct BridgeWorker<S, M> {
    controller: Controller<S>,
    surface: M,
    event_tx: mpsc::SyncSender<Event>,
    pending: Option<PendingTransition>,
}

#[derive(Debug, Clone, Copy)]
struct PendingTransition {
    token: TransitionToken,
    deadline: Instant,
}

impl<S, M> BridgeWorker<S, M>
where
    S: ClipStorage,
    M: MediaSurface,
{
    fn run(&mut self, command_rx: mpsc::Receiver<Command>) {
        let started = self.controller.start();
        if !self.dispatch(started) {
            return;
        }

        loop {
            if !self.poll_surface() || !self.fire_due_transition() {
                return;
            }

            match command_rx.recv_timeout(self.next_wait()) {
                Ok(command) => {
                    let result = self.controller.handle_command(command);
                    if !self.dispatch(result) {
                        return;
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    debug!("command channel closed; bridge stopping");
                    return;
                }
            }
        }
    }

    fn next_wait(&self) -> Duration {
        match self.pending {
            Some(pending) => pending
                .deadline
                .saturating_duration_since(Instant::now())
                .min(SURFACE_POLL_INTERVAL),
            None => SURFACE_POLL_INTERVAL,
        }
    }

    fn fire_due_transition(&mut self) -> bool {
        let Some(pending) = self.pending else {
            return true;
        };
        if Instant::now() < pending.deadline {
            return true;
        }

        self.pending = None;
        let result = self.controller.handle_command(Command::TransitionElapsed {
            token: pending.token,
        });
        self.dispatch(result)
    }

    fn poll_surface(&mut self) -> bool {
        let notifications = match self.surface.poll_notifications() {
            Ok(notifications) => notifications,
            Err(error) => return self.send_error(&error),
        };

        for notification in notifications {
            let command = match notification {
                MediaNotification::Ended => Command::MediaEnded,
                MediaNotification::DurationKnown { seconds } => Command::DurationKnown { seconds },
            };
            let result = self.controller.handle_command(command);
            if !self.dispatch(result) {
                return false;
            }
        }
        true
    }

    /// Applies side effects of `result` and forwards its events.
    ///
    /// Returns false once the event receiver is gone.
    fn dispatch(&mut self, result: Result<Vec<Event>>) -> bool {
        let events = match result {
            Ok(events) => events,
            Err(error) => return self.send_error(&error),
        };

        for event in events {
            let surface_error = self.apply(&event).err();
            if self.event_tx.send(event).is_err() {
                return false;
            }
            if let Some(error) = surface_error {
                if !self.send_error(&error) {
                    return false;
                }
            }
        }
        true
    }

    fn apply(&mut self, event: &Event) -> Result<()> {
        match event {
            Event::PlayRange(directive) => {
                self.surface.load(directive)?;
                if directive.autoplay {
                    self.surface.play()?;
                }
            }
            Event::TransitionScheduled { token, delay } => {
                self.pending = Some(PendingTransition {
                    token: *token,
                    deadline: Instant::now() + *delay,
                });
            }
            Event::TransitionCancelled { token } => {
                if self.pending.is_some_and(|pending| pending.token == *token) {
                    self.pending = None;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn send_error(&self, error: &PlaylistError) -> bool {
        warn!(%error, "controller error");
        self.event_tx
            .send(Event::Error(PlaylistErrorEvent::from_error(error)))
            .is_ok()
    }
}
