// SPDX-License-Identifier: GPL-3.0-only

//! Cursor-style native enumeration
//!
//! The native service exposes enumerations as stateful, forward-only
//! cursors: each call fetches up to N items and an empty batch signals
//! exhaustion. Order is backend-defined and not guaranteed stable
//! across separate enumerations.

use tokio_util::sync::CancellationToken;

use crate::error::VdsError;

/// Items fetched per native round trip.
pub const DEFAULT_BATCH_SIZE: usize = 16;

/// A native enumerator cursor: finite, forward-only, restartable only
/// by opening a new cursor.
pub trait NativeCursor: Send {
    type Item: Send + 'static;

    /// Fetch up to `count` items. An empty result means the cursor is
    /// exhausted. Blocking native call.
    fn next_batch(&mut self, count: usize) -> Result<Vec<Self::Item>, VdsError>;
}

/// Drain a cursor to completion, fetching batches on the blocking
/// pool and honoring cancellation between rounds.
pub async fn drain_cursor<T: Send + 'static>(
    mut cursor: Box<dyn NativeCursor<Item = T>>,
    batch_size: usize,
    cancel: &CancellationToken,
) -> Result<Vec<T>, VdsError> {
    let mut items = Vec::new();

    loop {
        if cancel.is_cancelled() {
            return Err(VdsError::Cancelled);
        }

        let (result, returned) = tokio::task::spawn_blocking(move || {
            let result = cursor.next_batch(batch_size);
            (result, cursor)
        })
        .await
        .map_err(|e| VdsError::Native(format!("enumeration task failed: {e}")))?;
        cursor = returned;

        let batch = result?;
        if batch.is_empty() {
            return Ok(items);
        }
        items.extend(batch);
    }
}

/// Drain a cursor on the calling thread.
///
/// For the synchronous pieces of the operations contract
/// (drive-letter accessors); everything long-running goes through
/// [`drain_cursor`].
pub fn drain_cursor_blocking<T: Send + 'static>(
    cursor: &mut dyn NativeCursor<Item = T>,
    batch_size: usize,
) -> Result<Vec<T>, VdsError> {
    let mut items = Vec::new();
    loop {
        let batch = cursor.next_batch(batch_size)?;
        if batch.is_empty() {
            return Ok(items);
        }
        items.extend(batch);
    }
}

/// Cursor over a pre-materialized item list.
///
/// Backends whose native enumerator was already drained (and the
/// fixture loaders) wrap their items in this.
pub struct VecCursor<T> {
    items: std::vec::IntoIter<T>,
}

impl<T> VecCursor<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items: items.into_iter(),
        }
    }
}

impl<T: Send + 'static> NativeCursor for VecCursor<T> {
    type Item = T;

    fn next_batch(&mut self, count: usize) -> Result<Vec<T>, VdsError> {
        Ok(self.items.by_ref().take(count).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn drain_collects_all_batches_in_order() {
        let cursor = Box::new(VecCursor::new((0..37).collect::<Vec<u32>>()));
        let cancel = CancellationToken::new();

        let items = drain_cursor(cursor, 16, &cancel).await.unwrap();
        assert_eq!(items, (0..37).collect::<Vec<u32>>());
    }

    #[tokio::test]
    async fn drain_of_empty_cursor_is_empty() {
        let cursor = Box::new(VecCursor::new(Vec::<u32>::new()));
        let cancel = CancellationToken::new();

        let items = drain_cursor(cursor, DEFAULT_BATCH_SIZE, &cancel).await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn pre_cancelled_token_stops_before_the_first_fetch() {
        struct PanicCursor;
        impl NativeCursor for PanicCursor {
            type Item = u32;
            fn next_batch(&mut self, _count: usize) -> Result<Vec<u32>, VdsError> {
                panic!("cursor must not be touched after cancellation");
            }
        }

        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = drain_cursor(Box::new(PanicCursor), 4, &cancel).await;
        assert_eq!(result, Err(VdsError::Cancelled));
    }
}
