use std::sync::Arc;

use crate::store::ObjectStore;
use crate::{ByteStream, RangedRead, SpacesError, SpacesResult};

/// Window used when the caller does not pick one: 5 MiB
pub const DEFAULT_WINDOW: u64 = 5 * 1024 * 1024;

/// Parameters of a windowed read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangedReadOptions {
    pub key: String,
    /// Size of the whole object, from a prior head request
    pub total_size: u64,
    pub window: u64,
    pub start: u64,
}

impl RangedReadOptions {
    /// `window` of `None` or `0` falls back to [`DEFAULT_WINDOW`]
    pub fn new<S: Into<String>>(key: S, total_size: u64, window: Option<u64>, start: Option<u64>) -> Self {
        Self {
            key: key.into(),
            total_size,
            window: window.filter(|w| *w > 0).unwrap_or(DEFAULT_WINDOW),
            start: start.unwrap_or(0),
        }
    }
}

/// Open a lazy reader that fetches `window` bytes per ranged GET.
///
/// Nothing is requested until the stream is polled. A backend failure is
/// yielded as an `io::Error` and ends the stream.
pub fn open_ranged(store: Arc<dyn ObjectStore>, options: RangedReadOptions) -> SpacesResult<RangedRead> {
    if options.start > options.total_size {
        return Err(SpacesError::invalid_range(options.start, options.total_size));
    }

    let RangedReadOptions {
        key,
        total_size,
        window,
        start,
    } = options;

    let stream: ByteStream = Box::pin(async_stream::stream! {
        let mut cursor = start;
        while cursor < total_size {
            let end = cursor.saturating_add(window).min(total_size) - 1;
            match store.get_range(&key, cursor, end).await {
                Ok(chunk) if chunk.is_empty() => break,
                Ok(chunk) => {
                    cursor += chunk.len() as u64;
                    yield Ok(chunk);
                }
                Err(err) => {
                    tracing::warn!(key = %key, cursor, error = %err, "ranged read failed");
                    yield Err(std::io::Error::other(err));
                    break;
                }
            }
        }
    });

    Ok(RangedRead {
        stream,
        total_size,
        window,
        start,
    })
}
