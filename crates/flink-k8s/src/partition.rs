//! Splitting an application's objects into the current image generation and
//! stale ones.

use flink_types::{Labeled, Labels};

/// Objects matching `labels` go left (current), the rest go right (old).
/// Input order is kept on both sides.
pub fn match_by_label<T: Labeled>(objects: Vec<T>, labels: &Labels) -> (Vec<T>, Vec<T>) {
    objects
        .into_iter()
        .partition(|o| o.metadata().matches(labels))
}
