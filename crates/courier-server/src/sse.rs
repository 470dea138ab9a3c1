//! SSE transport: event framing and the producer-driven response.

use axum::response::sse::{Event, KeepAlive, Sse};
use courier_types::{ProgressState, StreamEvent};
use futures_util::Stream;
use std::convert::Infallible;
use std::future::Future;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

const CHANNEL_CAPACITY: usize = 32;

#[derive(Debug, Error)]
#[error("client disconnected")]
pub struct ClientGone;

/// Write half of one streaming response. Dropping it ends the stream.
#[derive(Clone)]
pub struct SseSender {
    tx: mpsc::Sender<Event>,
}

impl SseSender {
    /// Sends one event, framed per the protocol: text deltas go as
    /// bare escaped text, everything else as a JSON envelope. Fails
    /// only when the client has gone away.
    pub async fn send(&self, event: StreamEvent) -> Result<(), ClientGone> {
        let framed = Event::default().data(frame_data(&event));
        self.tx.send(framed).await.map_err(|_| ClientGone)
    }
}

/// Text deltas take the fast path: raw text with newlines escaped as
/// literal `\n`, no JSON envelope. Every other event is one line of
/// JSON (serde_json never emits raw newlines).
fn frame_data(event: &StreamEvent) -> String {
    match event {
        StreamEvent::TextDelta { text } => text.replace('\n', "\\n"),
        other => serde_json::to_string(other)
            .unwrap_or_else(|e| format!(r#"{{"type":"error","message":"{e}"}}"#)),
    }
}

/// Builds an SSE response driven by `producer`.
///
/// The producer runs in its own task and pushes events through the
/// [`SseSender`]; the response body drains the channel. A producer
/// failure emits a terminal `ProgressUpdate{error}` before the stream
/// closes, so clients can distinguish failure from completion. A
/// disconnect surfaces to the producer as [`ClientGone`] on its next
/// send.
pub fn stream_response<F, Fut, E>(producer: F) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    F: FnOnce(SseSender) -> Fut,
    Fut: Future<Output = Result<(), E>> + Send + 'static,
    E: std::fmt::Display + Send,
{
    let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
    let sender = SseSender { tx };
    let fut = producer(sender.clone());

    tokio::spawn(async move {
        if let Err(e) = fut.await {
            tracing::error!(error = %e, "stream producer failed");
            let _ = sender
                .send(StreamEvent::progress(ProgressState::Error, e.to_string()))
                .await;
        }
    });

    Sse::new(ReceiverStream::new(rx).map(Ok)).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_delta_takes_the_raw_fast_path() {
        let data = frame_data(&StreamEvent::TextDelta {
            text: "line one\nline two".to_string(),
        });
        assert_eq!(data, "line one\\nline two");
    }

    #[test]
    fn other_events_frame_as_single_line_json() {
        let data = frame_data(&StreamEvent::Error {
            message: "a\nb".to_string(),
        });
        assert!(!data.contains('\n'));
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert_eq!(value["type"], "error");
        assert_eq!(value["message"], "a\nb");
    }
}
