//! Completion stream type shared by every assistant backend

use crate::errors::AssistantError;
use crate::errors::Result;
use futures::Stream;
use futures::StreamExt;
use std::pin::Pin;
use std::task::Context;
use std::task::Poll;
use tokio::sync::mpsc;

/// Events yielded by a completion stream.
///
/// A well-behaved stream yields zero or more `Delta` chunks followed by
/// exactly one `Done`. A stream that ends without `Done` was cut off
/// upstream and must not be treated as complete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionEvent {
    /// A chunk of generated text, in order.
    Delta(String),
    /// Terminal marker: the completion finished normally.
    Done,
}

/// A stream of completion events backed by a channel.
///
/// The producer half lives in a spawned task that parses the provider's
/// wire format. Dropping this stream drops the receiver, which stops the
/// producer the next time it tries to send; no partial output survives a
/// cancelled stream.
#[derive(Debug)]
pub struct CompletionStream {
    rx: mpsc::Receiver<Result<CompletionEvent>>,
}

impl CompletionStream {
    /// Wrap a channel receiver. This is the seam test doubles and
    /// alternative backends use to produce a stream without HTTP.
    pub fn new(rx: mpsc::Receiver<Result<CompletionEvent>>) -> Self {
        Self { rx }
    }

    /// Drain the stream and return the concatenated text.
    ///
    /// Fails if any event is an error, or if the stream ends without the
    /// `Done` marker. Callers that want progressive output should consume
    /// the stream directly instead.
    pub async fn collect_text(mut self) -> Result<String> {
        let mut text = String::new();
        while let Some(event) = self.next().await {
            match event? {
                CompletionEvent::Delta(chunk) => text.push_str(&chunk),
                CompletionEvent::Done => return Ok(text),
            }
        }
        Err(AssistantError::Stream(
            "stream ended without a completion marker".to_string(),
        ))
    }
}

impl Stream for CompletionStream {
    type Item = Result<CompletionEvent>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tokio_test::assert_pending;

    #[tokio::test]
    async fn collect_text_concatenates_deltas_in_order() {
        let (tx, rx) = mpsc::channel(8);
        tx.try_send(Ok(CompletionEvent::Delta("Hello ".to_string())))
            .unwrap();
        tx.try_send(Ok(CompletionEvent::Delta("world".to_string())))
            .unwrap();
        tx.try_send(Ok(CompletionEvent::Done)).unwrap();
        drop(tx);

        let text = CompletionStream::new(rx).collect_text().await.unwrap();
        assert_eq!(text, "Hello world");
    }

    #[tokio::test]
    async fn collect_text_rejects_a_truncated_stream() {
        let (tx, rx) = mpsc::channel(8);
        tx.try_send(Ok(CompletionEvent::Delta("partial".to_string())))
            .unwrap();
        drop(tx);

        let err = CompletionStream::new(rx).collect_text().await.unwrap_err();
        assert!(matches!(err, AssistantError::Stream(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn collect_text_propagates_stream_errors() {
        let (tx, rx) = mpsc::channel(8);
        tx.try_send(Ok(CompletionEvent::Delta("before".to_string())))
            .unwrap();
        tx.try_send(Err(AssistantError::Upstream {
            status: 429,
            message: "rate limited".to_string(),
        }))
        .unwrap();
        drop(tx);

        let err = CompletionStream::new(rx).collect_text().await.unwrap_err();
        match err {
            AssistantError::Upstream { status, message } => {
                assert_eq!(status, 429);
                assert_eq!(message, "rate limited");
            }
            other => panic!("expected upstream error, got {other:?}"),
        }
    }

    #[test]
    fn poll_is_pending_until_an_event_arrives() {
        let (tx, rx) = mpsc::channel(4);
        let mut stream = tokio_test::task::spawn(CompletionStream::new(rx));

        assert_pending!(stream.poll_next());

        tx.try_send(Ok(CompletionEvent::Delta("chunk".to_string())))
            .unwrap();
        assert!(stream.is_woken());
        match stream.poll_next() {
            Poll::Ready(Some(Ok(CompletionEvent::Delta(text)))) => assert_eq!(text, "chunk"),
            other => panic!("expected a delta, got {other:?}"),
        }
    }

    #[test]
    fn poll_sees_the_channel_close() {
        let (tx, rx) = mpsc::channel::<Result<CompletionEvent>>(4);
        let mut stream = tokio_test::task::spawn(CompletionStream::new(rx));
        drop(tx);

        match stream.poll_next() {
            Poll::Ready(None) => {}
            other => panic!("expected end of stream, got {other:?}"),
        }
    }
}
