//! Opaque cursor pagination
//!
//! A cursor is the base64 encoding of a decimal start offset. Cursors are
//! produced and consumed only by this system, so anything that fails to
//! decode is treated as the first page rather than an error.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Encode a start offset as an opaque cursor
pub fn encode_cursor(offset: usize) -> String {
    STANDARD.encode(offset.to_string())
}

/// Decode a cursor back to its offset, falling back to zero
pub fn decode_cursor(cursor: &str) -> usize {
    STANDARD
        .decode(cursor.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .and_then(|text| text.trim().parse::<usize>().ok())
        .unwrap_or(0)
}

/// One page of a sorted sequence
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_cursor: Option<String>,
}

/// Slice `[cursor, cursor + limit)` out of `items`.
///
/// `next_cursor` is set only when items remain past the returned page.
pub fn paginate<T: Clone>(items: &[T], cursor: Option<&str>, limit: usize) -> Page<T> {
    let start = cursor.map(decode_cursor).unwrap_or(0).min(items.len());
    let end = start.saturating_add(limit).min(items.len());

    let next_cursor = if end < items.len() {
        Some(encode_cursor(end))
    } else {
        None
    };

    Page {
        items: items[start..end].to_vec(),
        next_cursor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_cursor_encoding_is_base64_decimal() {
        assert_eq!(encode_cursor(20), "MjA=");
        assert_eq!(decode_cursor("MjA="), 20);
    }

    #[test]
    fn test_garbage_cursor_is_offset_zero() {
        assert_eq!(decode_cursor("%%% not base64 %%%"), 0);
        assert_eq!(decode_cursor(""), 0);
        // valid base64, not a number
        assert_eq!(decode_cursor(&STANDARD.encode("abc")), 0);
        // negative offsets are rejected too
        assert_eq!(decode_cursor(&STANDARD.encode("-5")), 0);
    }

    #[test]
    fn test_paginate_walks_all_pages() {
        let items: Vec<u32> = (0..45).collect();

        let first = paginate(&items, None, 20);
        assert_eq!(first.items, (0..20).collect::<Vec<_>>());
        let second = paginate(&items, first.next_cursor.as_deref(), 20);
        assert_eq!(second.items, (20..40).collect::<Vec<_>>());
        let third = paginate(&items, second.next_cursor.as_deref(), 20);
        assert_eq!(third.items, (40..45).collect::<Vec<_>>());
        assert!(third.next_cursor.is_none());
    }

    #[test]
    fn test_offset_past_end_is_empty() {
        let items = vec![1, 2, 3];
        let page = paginate(&items, Some(&encode_cursor(10)), 5);

        assert!(page.items.is_empty());
        assert!(page.next_cursor.is_none());
    }

    proptest! {
        #[test]
        fn prop_cursor_round_trip(offset in 0usize..10_000_000) {
            prop_assert_eq!(decode_cursor(&encode_cursor(offset)), offset);
        }

        #[test]
        fn prop_first_page_size(len in 0usize..200, limit in 1usize..100) {
            let items: Vec<usize> = (0..len).collect();
            let page = paginate(&items, Some(&encode_cursor(0)), limit);

            prop_assert_eq!(page.items.len(), limit.min(len));
            prop_assert_eq!(page.next_cursor.is_some(), limit < len);
        }
    }
}
