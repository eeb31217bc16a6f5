//! Binary entrypoint: replay JSON-lines commands from stdin, write lifecycle
//! events to stdout.
//!
//! Each input line is `{"op":"create", ...report}` or
//! `{"op":"update","id":"...", ...patch}`. Output lines are either:
//! - A LifecycleEvent (one per successful command)
//! - An ErrorOutput (when a line is invalid or the command fails)

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use incident_core::types::ErrorOutput;
use incident_core::{
  Broadcaster, ChannelObserver, Config, EngineError, IncidentService, InboundPatch, InboundReport, MemoryStore,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
enum Command {
  Create(InboundReport),
  Update {
    id: Uuid,
    #[serde(flatten)]
    patch: InboundPatch,
  },
}

#[tokio::main]
async fn main() {
  let config = Config::default();
  let broadcaster = Arc::new(Broadcaster::new());
  let (observer, mut events) = ChannelObserver::channel(config.observer_buffer);
  broadcaster.subscribe(observer).await;
  let service = IncidentService::new(config, MemoryStore::new(), broadcaster);

  let stdin = io::stdin();
  let stdout = io::stdout();
  let mut out = io::BufWriter::new(stdout.lock());

  for line in stdin.lock().lines() {
    let line = match line {
      Ok(l) => l,
      Err(e) => {
        let _ = writeln!(io::stderr(), "incident-replay: read error: {}", e);
        std::process::exit(1);
      }
    };

    // Skip blank lines.
    let trimmed = line.trim();
    if trimmed.is_empty() {
      continue;
    }

    let command: Command = match serde_json::from_str(trimmed) {
      Ok(c) => c,
      Err(e) => {
        write_error(&mut out, ErrorOutput::new(format!("json parse: {}", e)));
        continue;
      }
    };

    let result = match &command {
      Command::Create(report) => service.create(report).await,
      Command::Update { id, patch } => service.update(*id, patch).await,
    };

    match result {
      Ok(_) => {
        while let Ok(frame) = events.try_recv() {
          let _ = writeln!(out, "{}", frame);
        }
      }
      Err(e) => {
        let err = match &e {
          EngineError::Validation { field, reason } => ErrorOutput::new(reason.clone()).with_field(field.clone()),
          _ => ErrorOutput::new(e.to_string()),
        };
        write_error(&mut out, err);
      }
    }
  }

  let _ = out.flush();
}

fn write_error(out: &mut impl Write, err: ErrorOutput) {
  let _ = serde_json::to_writer(&mut *out, &err);
  let _ = writeln!(out);
}
