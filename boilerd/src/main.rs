#![deny(unsafe_code)]

use boiler_api::{Error, Mailbox, Message, Mode, Result};
use boilerd::{config, Controller};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt};
use tracing::{error, info, warn};

/// Determines the configuration and sets up the logger. Returns
/// `None` if the program should exit immediately (the user asked for
/// `--print-config`, or configuration loading failed).
async fn init_app() -> Option<config::Config> {
    if let Some(cfg) = config::get().await {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(cfg.get_log_level())
            .with_target(false)
            .finish();

        tracing::subscriber::set_global_default(subscriber)
            .expect("unable to set global default subscriber");
        Some(cfg)
    } else {
        None
    }
}

/// Parses one line of the tick feed: a JSON array of the inbound
/// messages the plant sent this tick.
fn parse_tick_line(line: &str) -> Result<Mailbox> {
    let msgs: Vec<Message> = serde_json::from_str(line).map_err(|e| {
        Error::ProtocolError(format!("malformed tick line: {}", e))
    })?;

    if let Some(bad) = msgs.iter().find(|m| !m.is_inbound()) {
        return Err(Error::ProtocolError(format!(
            "tick feed contained an outbound message: {:?}",
            bad
        )));
    }

    Ok(msgs.into_iter().collect())
}

async fn run_feed<R>(
    cfg: &config::Config,
    mut lines: tokio::io::Lines<R>,
) -> Result<()>
where
    R: tokio::io::AsyncBufRead + Unpin,
{
    let mut ctl = Controller::new(cfg.plant.clone());
    let mut stdout = tokio::io::stdout();

    loop {
        let next = lines.next_line().await.map_err(|e| {
            Error::OperationError(format!("reading tick feed: {}", e))
        })?;
        let Some(line) = next else { break };

        if line.trim().is_empty() {
            continue;
        }

        let inbox = parse_tick_line(&line)?;
        let outbox = ctl.tick(&inbox);

        let encoded = serde_json::to_string(&outbox.iter().collect::<Vec<_>>())
            .map_err(|e| Error::OperationError(format!("{}", e)))?;

        stdout.write_all(encoded.as_bytes()).await.ok();
        stdout.write_all(b"\n").await.ok();

        if ctl.mode() == Mode::EmergencyStop {
            warn!("controller entered emergency stop, ending feed");
            break;
        }
    }

    info!(mode = %ctl.mode(), "tick feed exhausted");
    Ok(())
}

async fn run() -> Result<()> {
    let Some(cfg) = init_app().await else {
        return Ok(());
    };

    info!("starting steam boiler controller");

    match &cfg.input {
        Some(path) => {
            let file = tokio::fs::File::open(path).await.map_err(|e| {
                Error::ConfigError(format!(
                    "couldn't open tick feed '{}': {}",
                    path, e
                ))
            })?;
            let reader = tokio::io::BufReader::new(file);
            run_feed(&cfg, reader.lines()).await
        }
        None => {
            let stdin = tokio::io::stdin();
            let reader = tokio::io::BufReader::new(stdin);
            run_feed(&cfg, reader.lines()).await
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        eprintln!("ERROR: {e}");
        std::process::exit(1);
    }
}
