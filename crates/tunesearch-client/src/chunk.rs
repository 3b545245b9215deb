// SPDX-License-Identifier: GPL-3.0-or-later

/// Split `items` into contiguous, order-preserving batches of at most `size`.
///
/// A `size` of zero is treated as one.
pub fn chunk<T: Clone>(items: &[T], size: usize) -> Vec<Vec<T>> {
    items.chunks(size.max(1)).map(<[T]>::to_vec).collect()
}
