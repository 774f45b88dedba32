// Session driver: credential discovery, connect/reconnect, and the poll
// loop.
//
// The driver alternates between two states. Disconnected, it polls the
// credential provider on the reconnect delay; connected, it runs one poll
// tick per interval and dispatches inbound commands between ticks. Polling
// and command handling share one select loop, so they never overlap on the
// session state. A hard session-API failure tears the session down, emits
// `lcuDisconnected`, and goes back to discovery.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep, MissedTickBehavior};
use tracing::{info, warn};

use super::synth::Session;
use crate::config::Config;
use crate::ddragon::{load_reference, ReferenceSource};
use crate::lcu::client::Gateway;
use crate::lcu::credentials::{CredentialProvider, LcuCreds};
use crate::protocol::{Command, EventSink, GameEvent};

enum Control {
    Handled,
    Shutdown,
}

/// Handle a command that needs no session state. Returns `None` for match
/// commands, which only make sense against a connected session.
async fn handle_control_command(command: &Command, sink: &EventSink) -> Option<Control> {
    match command {
        Command::Ping => {
            sink.emit(GameEvent::Pong).await;
            Some(Control::Handled)
        }
        Command::Shutdown => {
            sink.emit(GameEvent::ShutdownAck).await;
            Some(Control::Shutdown)
        }
        Command::ToggleAutoSend { enabled } => {
            sink.emit(GameEvent::AutoSend { enabled: *enabled }).await;
            Some(Control::Handled)
        }
        Command::ResetChat => {
            sink.emit(GameEvent::ChatReset).await;
            Some(Control::Handled)
        }
        _ => None,
    }
}

/// Wait out a reconnect delay without going deaf to the command channel, so
/// a shutdown during backoff does not wait for the timer. Returns `false`
/// when the caller should stop (shutdown, or the channel closed).
async fn backoff(delay: Duration, cmd_rx: &mut mpsc::Receiver<Command>, sink: &EventSink) -> bool {
    tokio::select! {
        _ = sleep(delay) => true,
        command = cmd_rx.recv() => {
            let Some(command) = command else {
                return false;
            };
            match handle_control_command(&command, sink).await {
                Some(Control::Shutdown) => false,
                Some(Control::Handled) => true,
                None => {
                    warn!("ignoring {command:?} while disconnected");
                    true
                }
            }
        }
    }
}

/// Run the companion until a `shutdown` command arrives or the command
/// channel closes.
pub async fn run<P, R, G, F>(
    config: Config,
    provider: P,
    reference: R,
    make_gateway: F,
    sink: EventSink,
    mut cmd_rx: mpsc::Receiver<Command>,
) -> anyhow::Result<()>
where
    P: CredentialProvider,
    R: ReferenceSource,
    G: Gateway,
    F: Fn(&Config, &LcuCreds) -> anyhow::Result<G>,
{
    loop {
        // -------------------------------------------------------------------
        // Discovery
        // -------------------------------------------------------------------
        let creds = loop {
            match provider.discover().await {
                Ok(Some(creds)) => break creds,
                Ok(None) => {}
                Err(e) => warn!("credential discovery failed: {e:#}"),
            }
            if !backoff(config.reconnect_delay(), &mut cmd_rx, &sink).await {
                return Ok(());
            }
        };

        info!("client connected on port {}", creds.port);
        sink.emit(GameEvent::LcuConnected { port: creds.port }).await;

        let gateway = match make_gateway(&config, &creds) {
            Ok(gateway) => gateway,
            Err(e) => {
                warn!("failed to build gateway: {e:#}");
                sink.emit(GameEvent::LcuDisconnected {
                    message: e.to_string(),
                })
                .await;
                if !backoff(config.reconnect_delay(), &mut cmd_rx, &sink).await {
                    return Ok(());
                }
                continue;
            }
        };
        let tables = load_reference(&reference, &sink).await;
        let mut session = Session::new(gateway, tables, sink.clone(), config.detail_interval());

        // -------------------------------------------------------------------
        // Poll loop
        // -------------------------------------------------------------------
        let mut interval = tokio::time::interval(config.poll_interval());
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut first_check = true;
        let teardown = loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = session.tick(first_check).await {
                        break e.to_string();
                    }
                    first_check = false;
                }
                command = cmd_rx.recv() => {
                    let Some(command) = command else {
                        return Ok(());
                    };
                    match handle_control_command(&command, &sink).await {
                        Some(Control::Shutdown) => return Ok(()),
                        Some(Control::Handled) => {}
                        None => {
                            if let Err(e) = session.handle_match_command(&command).await {
                                break e.to_string();
                            }
                        }
                    }
                }
            }
        };

        warn!("session torn down: {teardown}");
        sink.emit(GameEvent::LcuDisconnected { message: teardown }).await;
        if !backoff(config.reconnect_delay(), &mut cmd_rx, &sink).await {
            return Ok(());
        }
    }
}
