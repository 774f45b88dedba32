// Companion entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not the stdio protocol streams)
// 2. Load config
// 3. Create mpsc channels
// 4. Spawn stdout event writer and stdin command reader tasks
// 5. Run the session driver until shutdown

use lcu_companion::config;
use lcu_companion::ddragon::DataDragonClient;
use lcu_companion::game::driver;
use lcu_companion::lcu::client::LcuGateway;
use lcu_companion::lcu::credentials::{LcuCreds, ProcessScanner};
use lcu_companion::protocol::{Command, Envelope, EventSink};

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (stdout/stdin carry the line protocol)
    init_tracing()?;
    info!("Companion starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: poll every {}ms, locale {}",
        config.connection.poll_interval_ms, config.ddragon.locale
    );

    // 3. Create mpsc channels
    let (event_tx, event_rx) = mpsc::channel::<Envelope>(256);
    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(64);

    // 4a. Event writer: one JSON line per envelope on stdout
    let writer_handle = tokio::spawn(write_events(event_rx));

    // 4b. Command reader: JSON lines on stdin; bad lines are logged and
    // dropped
    tokio::spawn(read_commands(cmd_tx.clone()));

    // Ctrl+C maps to an ordinary shutdown command
    let ctrl_c_tx = cmd_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_c_tx.send(Command::Shutdown).await;
        }
    });

    // 5. Run the driver until shutdown
    let reference = DataDragonClient::new(&config).context("failed to build reference client")?;
    let result = driver::run(
        config,
        ProcessScanner,
        reference,
        make_gateway,
        EventSink::new(event_tx),
        cmd_rx,
    )
    .await;

    // Reader/signal tasks hold clones of cmd_tx; the driver has already
    // returned, so just flush the event stream.
    drop(cmd_tx);
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), writer_handle).await;

    info!("Companion shut down cleanly");
    result
}

fn make_gateway(config: &config::Config, creds: &LcuCreds) -> anyhow::Result<LcuGateway> {
    Ok(LcuGateway::new(config, creds)?)
}

/// Serialize envelopes to stdout, one JSON line each.
async fn write_events(mut event_rx: mpsc::Receiver<Envelope>) {
    let mut stdout = tokio::io::stdout();
    while let Some(envelope) = event_rx.recv().await {
        let mut line = match serde_json::to_string(&envelope) {
            Ok(line) => line,
            Err(e) => {
                error!("failed to serialize event: {e}");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            error!("stdout write failed, stopping event writer: {e}");
            break;
        }
        let _ = stdout.flush().await;
    }
}

/// Parse commands from stdin. EOF closes the channel, which the driver
/// treats as shutdown.
async fn read_commands(cmd_tx: mpsc::Sender<Command>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<Command>(line) {
                    Ok(command) => {
                        if cmd_tx.send(command).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("ignoring unparsable command line: {e}"),
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("stdin read failed: {e}");
                break;
            }
        }
    }
}

/// Initialize tracing to log to a file (stdout carries the event protocol).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("lcu-companion.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lcu_companion=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
