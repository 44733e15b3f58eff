//! Streaming of multi-batch cursor results.
//!
//! A producer task walks the cursor (first request, then `PUT` continuations)
//! and forwards each page over a bounded channel. The consumer sees pages in
//! server order followed by exactly one [`StreamItem::Terminal`] or
//! [`StreamItem::Error`]; after that the stream only yields `None`.

use std::future::poll_fn;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use std::time::Instant;

use futures::Stream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::aggregate::aggregate;
use crate::client::Database;
use crate::error::{Error, Result};
use crate::logging::LogRecord;
use crate::request::Request;

/// Default number of pages buffered between producer and consumer.
pub const DEFAULT_STREAM_CAPACITY: usize = 16;

/// One element of a cursor stream.
#[derive(Debug)]
pub enum StreamItem {
    /// Raw JSON of one batch, normally an array.
    Page(Vec<u8>),
    /// The cursor is exhausted.
    Terminal,
    /// The stream failed; no further items follow.
    Error(Error),
}

impl StreamItem {
    /// Returns true for `Terminal` and `Error`.
    pub fn is_final(&self) -> bool {
        !matches!(self, StreamItem::Page(_))
    }
}

/// Consumer half of a cursor stream.
#[derive(Debug)]
pub struct CursorStream {
    receiver: mpsc::Receiver<StreamItem>,
    finished: bool,
}

impl CursorStream {
    fn new(receiver: mpsc::Receiver<StreamItem>) -> Self {
        Self {
            receiver,
            finished: false,
        }
    }

    /// Builds a stream that yields `items` and then closes.
    #[cfg(test)]
    pub(crate) fn from_items(items: Vec<StreamItem>) -> Self {
        let (sender, receiver) = mpsc::channel(items.len().max(1));
        for item in items {
            let _ = sender.try_send(item);
        }
        Self::new(receiver)
    }

    /// Waits for the next item. Returns `None` once a final item was delivered.
    pub async fn next(&mut self) -> Option<StreamItem> {
        poll_fn(|cx| self.poll_item(cx)).await
    }

    /// True once `Terminal` or `Error` has been delivered.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Drains the stream into a single JSON array.
    pub async fn collect_all(mut self) -> Result<Vec<u8>> {
        aggregate(&mut self).await
    }

    fn poll_item(&mut self, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
        if self.finished {
            return Poll::Ready(None);
        }
        let item = match ready!(self.receiver.poll_recv(cx)) {
            Some(page @ StreamItem::Page(_)) => return Poll::Ready(Some(page)),
            Some(item) => item,
            None => StreamItem::Error(Error::StreamInterrupted),
        };
        self.finished = true;
        self.receiver.close();
        Poll::Ready(Some(item))
    }
}

impl Stream for CursorStream {
    type Item = StreamItem;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<StreamItem>> {
        self.get_mut().poll_item(cx)
    }
}

enum Outcome {
    Exhausted,
    Failed(Error),
    /// The consumer went away; holds the cursor still open on the server.
    Abandoned(Option<String>),
}

struct Producer {
    db: Database,
    cancel: CancellationToken,
    sender: mpsc::Sender<StreamItem>,
}

/// Spawns the producer for `first` and returns the consumer half.
pub(crate) fn spawn(db: Database, first: Request, cancel: CancellationToken) -> CursorStream {
    let (sender, receiver) = mpsc::channel(db.stream_capacity());
    let producer = Producer { db, cancel, sender };
    tokio::spawn(producer.run(first));
    CursorStream::new(receiver)
}

impl Producer {
    async fn run(self, first: Request) {
        let start = Instant::now();
        let mut pages = 0usize;
        let mut request = first;
        let mut open_cursor: Option<String> = None;

        let outcome = loop {
            let result = tokio::select! {
                _ = self.sender.closed() => break Outcome::Abandoned(open_cursor),
                result = self.db.send_with_cancel(&request, &self.cancel) => result,
            };
            let response = match result {
                Ok(response) => response,
                Err(err) => break Outcome::Failed(err),
            };

            let next = if response.has_more() {
                response.cursor_id().map(str::to_string)
            } else {
                None
            };
            if self
                .sender
                .send(StreamItem::Page(response.into_payload()))
                .await
                .is_err()
            {
                break Outcome::Abandoned(next);
            }
            pages += 1;

            match next {
                Some(id) => {
                    request = Request::follow_cursor(&id);
                    open_cursor = Some(id);
                }
                None => break Outcome::Exhausted,
            }
        };

        let elapsed = start.elapsed();
        match outcome {
            Outcome::Exhausted => {
                self.db.logger().log(&LogRecord::StreamFinished {
                    pages,
                    elapsed,
                    error: None,
                });
                let _ = self.sender.send(StreamItem::Terminal).await;
            }
            Outcome::Failed(err) => {
                self.db.logger().log(&LogRecord::StreamFinished {
                    pages,
                    elapsed,
                    error: Some(&err),
                });
                let _ = self.sender.send(StreamItem::Error(err)).await;
            }
            Outcome::Abandoned(cursor) => {
                tracing::debug!(target: "arango", pages, ?elapsed, "cursor stream dropped by consumer");
                if let Some(id) = cursor {
                    self.release(&id).await;
                }
            }
        }
    }

    async fn release(&self, id: &str) {
        if let Err(err) = self.db.send(&Request::delete_cursor(id)).await {
            tracing::debug!(target: "arango", cursor = id, error = %err, "failed to delete cursor");
        }
    }
}
