//! Radio bridge process entry point
//!
//! Reads inbound events as JSON lines on stdin and writes outbound messages as
//! JSON lines on stdout. Logs go to stderr. An optional JSON config path may be
//! given as the first argument.

use cabin_radio::prelude::*;
use crossbeam_channel::Receiver;
use fundsp::prelude::{sine_hz, AudioUnit};
use std::env;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

/// 440 Hz test tone standing in for the remote player's stream.
#[derive(Default)]
struct TestTone {
    published: u64,
}

impl StreamProvider for TestTone {
    fn stream_handle(&mut self) -> Option<StreamHandle> {
        self.published += 1;
        let unit: Box<dyn AudioUnit> = Box::new(sine_hz::<f32>(440.0) * 0.2);
        StreamHandle::from_unit(self.published, "test tone", unit).ok()
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match env::args().nth(1) {
        Some(path) => RadioConfig::from_json_file(path)?,
        None => RadioConfig::default(),
    };

    let (mut engine, outbound) = RadioEngine::builder()
        .config(config)
        .provider(Box::new(TestTone::default()))
        .build()?;

    tracing::info!("radio bridge starting");
    engine.start();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        flush(&outbound, &mut stdout).await?;

        let deadline = engine.next_deadline();
        tokio::select! {
            line = lines.next_line() => match line? {
                Some(line) => handle_line(&mut engine, &line),
                None => break,
            },
            _ = sleep_until(deadline) => engine.poll(Instant::now()),
        }
    }

    engine.disconnect();
    flush(&outbound, &mut stdout).await?;
    tracing::info!("radio bridge shutting down");
    Ok(())
}

fn handle_line(engine: &mut RadioEngine, line: &str) {
    let line = line.trim();
    if line.is_empty() {
        return;
    }

    let event: InboundEvent = match serde_json::from_str(line) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!("ignoring malformed event: {e}");
            return;
        }
    };

    let now = Instant::now();
    match engine.handle(event, now) {
        Ok(()) => {}
        Err(Error::PlaybackNotPermitted) => tracing::info!("playback vetoed by vehicle state"),
        Err(e) => tracing::warn!("event rejected: {e}"),
    }
    engine.poll(now);
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline.into()).await,
        None => std::future::pending().await,
    }
}

async fn flush(outbound: &Receiver<Outbound>, stdout: &mut tokio::io::Stdout) -> Result<()> {
    for message in outbound.try_iter() {
        let mut line = serde_json::to_string(&message)?;
        line.push('\n');
        stdout.write_all(line.as_bytes()).await?;
    }
    stdout.flush().await?;
    Ok(())
}
