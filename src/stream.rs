// src/stream.rs

//! Pipeline integration: the named stream-transform registry and an async
//! adapter that decodes records out of a stream of physical lines.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};

use futures::Stream;
use once_cell::sync::Lazy;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_stream::wrappers::LinesStream;

use crate::decode::CsvDecoder;
use crate::record::Record;

/// A line-in, records-out transform that a host pipeline can drive.
pub trait StreamTransform: Send {
    /// Feed one physical line; returns the records it completed.
    fn on_line(&mut self, line: &str) -> Vec<Record>;

    /// End of input; returns any final records.
    fn on_end(&mut self) -> Vec<Record>;
}

impl StreamTransform for CsvDecoder {
    fn on_line(&mut self, line: &str) -> Vec<Record> {
        self.push_line(line)
    }

    fn on_end(&mut self) -> Vec<Record> {
        self.finish()
    }
}

type TransformFactory = Box<dyn Fn() -> Box<dyn StreamTransform> + Send + Sync>;

/// Named transform factories, keyed the way the host pipeline refers to
/// them. The CSV decoder is pre-registered as `"csv"` in the global
/// registry.
#[derive(Default)]
pub struct TransformRegistry {
    factories: HashMap<String, TransformFactory>,
}

static GLOBAL: Lazy<Mutex<TransformRegistry>> = Lazy::new(|| {
    let mut registry = TransformRegistry::new();
    registry.register("csv", || Box::new(CsvDecoder::new()));
    Mutex::new(registry)
});

impl TransformRegistry {
    pub fn new() -> Self {
        TransformRegistry {
            factories: HashMap::new(),
        }
    }

    /// Register a factory under `name`, replacing any previous entry.
    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> Box<dyn StreamTransform> + Send + Sync + 'static,
    {
        self.factories.insert(name.to_string(), Box::new(factory));
    }

    /// Instantiate the transform registered under `name`.
    pub fn create(&self, name: &str) -> Option<Box<dyn StreamTransform>> {
        self.factories.get(name).map(|f| f())
    }

    /// Names of all registered transforms.
    pub fn names(&self) -> Vec<String> {
        self.factories.keys().cloned().collect()
    }

    /// Process-wide registry.
    pub fn global() -> &'static Mutex<TransformRegistry> {
        &GLOBAL
    }
}

/// Adapts a stream of physical lines into a stream of decoded records.
/// Driven synchronously by its caller; one logical line is fully processed
/// before the next physical line is taken from the source.
pub struct RecordStream<S> {
    lines: S,
    decoder: CsvDecoder,
    queued: VecDeque<Record>,
    finished: bool,
}

impl<S> RecordStream<S> {
    pub fn new(lines: S) -> Self {
        RecordStream {
            lines,
            decoder: CsvDecoder::new(),
            queued: VecDeque::new(),
            finished: false,
        }
    }

    /// Dropped-line count so far.
    pub fn rejected(&self) -> u64 {
        self.decoder.rejected()
    }
}

impl<R: AsyncBufRead + Unpin> RecordStream<LinesStream<R>> {
    /// Decode records from an async reader, one physical line at a time.
    pub fn from_reader(reader: R) -> Self {
        RecordStream::new(LinesStream::new(reader.lines()))
    }
}

impl<S> Stream for RecordStream<S>
where
    S: Stream<Item = io::Result<String>> + Unpin,
{
    type Item = io::Result<Record>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if let Some(record) = this.queued.pop_front() {
                return Poll::Ready(Some(Ok(record)));
            }
            if this.finished {
                return Poll::Ready(None);
            }
            match Pin::new(&mut this.lines).poll_next(cx) {
                Poll::Ready(Some(Ok(line))) => {
                    this.queued.extend(this.decoder.push_line(&line));
                }
                Poll::Ready(Some(Err(e))) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(None) => {
                    this.finished = true;
                    this.queued.extend(this.decoder.finish());
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
