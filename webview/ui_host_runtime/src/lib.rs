pub mod binder;
pub mod bridge;
pub mod coerce;
pub mod config;
pub mod document;
pub mod error;
pub mod events;
pub mod fragments;
pub mod front_end;
pub mod navigation;
pub mod protocol;
pub mod registry;
pub mod render;
pub mod snapshot;

use std::sync::mpsc;
use std::thread;

use tokio::sync::mpsc as async_mpsc;
use tracing::{error, info, warn};

use crate::bridge::ChannelSink;
use crate::protocol::{reader_loop, writer_loop};

pub use crate::binder::InteractionKind;
pub use crate::config::{ContentLocation, DEFAULT_UI_OUTBOUND_QUEUE_CAP, HostConfig};
pub use crate::document::{Document, WidgetId};
pub use crate::error::{UiError, UiResult};
pub use crate::front_end::FrontEnd;
pub use crate::protocol::{HOST_TO_UI_CAP, HostEnvelope, UI_TO_HOST_CAP, UiEnvelope};
pub use serde_json;

/// Run the UI host until the host closes its end of stdin.
pub fn run(config: HostConfig) -> UiResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(serve(config))
}

async fn serve(config: HostConfig) -> UiResult<()> {
    let source = config.source();
    info!(content = %config.content, shell = %config.shell, "loading page shell");

    let shell = source.fetch(&config.shell).await?;
    let mut front_end = FrontEnd::new(Document::parse(&shell)?)
        .with_default_art(config.default_art.clone());

    let tasks = front_end.fragment_tasks();
    info!(count = tasks.len(), source = %source.describe(), "fetching fragments");
    let batch = fragments::fetch_all(source.as_ref(), tasks);
    tokio::pin!(batch);
    let mut fragments_pending = true;

    let queue_capacity = config.queue_capacity();
    let (tx, rx) = mpsc::sync_channel(queue_capacity);
    let writer_handle = thread::spawn(move || writer_loop(rx));
    front_end.attach_host(Box::new(ChannelSink::new(tx, queue_capacity)));

    let (inbound_tx, mut inbound_rx) = async_mpsc::unbounded_channel();
    let reader_handle = thread::spawn(move || {
        let read_result = reader_loop(|envelope| inbound_tx.send(envelope).is_ok());
        if let Err(err) = &read_result {
            error!(error = %err, "reader loop terminated with error");
        }
        read_result
    });

    loop {
        tokio::select! {
            results = &mut batch, if fragments_pending => {
                fragments_pending = false;
                let report = front_end.finish_fragments(results);
                if !report.failed.is_empty() {
                    warn!(failed = ?report.failed, "some fragments could not be loaded");
                }
            }
            envelope = inbound_rx.recv() => match envelope {
                Some(HostEnvelope::Event { name, payload }) => front_end.dispatch(&name, payload),
                Some(HostEnvelope::Input { target, kind, value }) => {
                    front_end.interact(&target, kind, value.as_deref());
                }
                None => {
                    info!("host channel closed");
                    break;
                }
            },
        }
    }

    // Releases the sink's sender so the writer drains and exits.
    drop(front_end);

    match writer_handle.join() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => warn!(error = %err, "writer thread returned error"),
        Err(err) => warn!(?err, "writer thread join failed"),
    }

    if reader_handle.is_finished() {
        match reader_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => return Err(err.into()),
            Err(err) => warn!(?err, "reader thread join failed"),
        }
    } else {
        // A blocked stdin read must not hold up exit.
        warn!("reader thread still active during shutdown; skipping join");
    }

    Ok(())
}
