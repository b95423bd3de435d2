//! Line-oriented front end for an editing session.
//!
//! Commands: `:open <project> <path>`, `:w` (save now), `:p` (print the
//! buffer), `:status`, `:q` (final save and exit). Any other line is
//! appended to the buffer.

use editor_session::{
    BufferSurface, ChannelObserver, EditorSession, Generation, HttpFileStore, SessionConfig,
    SessionEvent, SessionHandle, SwitchOutcome, TextSurface,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "editor_session=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = SessionConfig::from_env()?;
    tracing::info!(backend_url = %config.backend_url, "editor session starting");

    let store = HttpFileStore::new(config.backend_url.clone(), config.request_timeout)?;
    let surface = BufferSurface::default();
    let (observer, mut events) = ChannelObserver::new();

    let (session, join) = EditorSession::start(
        &config,
        Arc::new(store),
        Arc::new(surface.clone()),
        Arc::new(observer),
    )
    .await?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                SessionEvent::DirtyChanged(true) => println!("[modified]"),
                SessionEvent::DirtyChanged(false) => println!("[saved state: clean]"),
                SessionEvent::Saved(target) => println!("[saved {target}]"),
                SessionEvent::Loaded { target, .. } => println!("[opened {target}]"),
                SessionEvent::Error(e) => println!("[error] {e}"),
            }
        }
    });

    let mut generation: Option<Generation> = None;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match Command::parse(&line) {
            Command::Open { project, path } => {
                generation = open(&session, project, path).await;
            }
            Command::Save => match session.force_save().await {
                Ok(outcome) => tracing::debug!(?outcome, "manual save"),
                Err(e) => tracing::debug!(error = %e, "manual save failed"),
            },
            Command::Print => print!("{}", surface.value()),
            Command::Status => {
                let status = session.status().await?;
                println!("{}", serde_json::to_string_pretty(&status)?);
            }
            Command::Quit => break,
            Command::Append(text) => {
                let Some(generation) = generation else {
                    println!("no file open; use :open <project> <path>");
                    continue;
                };
                surface.edit(|buffer| {
                    buffer.push_str(text);
                    buffer.push('\n');
                });
                session.notify_edit(generation)?;
            }
        }
    }

    match session.dispose().await {
        Ok(outcome) => tracing::info!(?outcome, "final save"),
        Err(e) => println!("[error] {e}"),
    }
    join.await?;
    Ok(())
}

async fn open(session: &SessionHandle, project: &str, path: &str) -> Option<Generation> {
    match session.select_target(project, path).await {
        Ok(SwitchOutcome::Loaded { generation, .. }) => Some(generation),
        Ok(SwitchOutcome::Superseded { target }) => {
            tracing::debug!(file = %target, "open superseded");
            None
        }
        Err(e) => {
            tracing::debug!(error = %e, "open failed");
            // The placeholder is editable; its generation is current.
            session.status().await.ok().map(|status| status.generation)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Open { project: &'a str, path: &'a str },
    Save,
    Print,
    Status,
    Quit,
    Append(&'a str),
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let mut words = line.split_whitespace();
        match words.next() {
            Some(":open") => match (words.next(), words.next()) {
                (Some(project), Some(path)) => Command::Open { project, path },
                _ => Command::Append(line),
            },
            Some(":w") => Command::Save,
            Some(":p") => Command::Print,
            Some(":status") => Command::Status,
            Some(":q") => Command::Quit,
            _ => Command::Append(line),
        }
    }
}
