//! Greedy non-maximum suppression.

use std::cmp::Ordering;

use crate::geometry::Rect;

/// Returns the indices of boxes that survive non-maximum suppression, in
/// descending score order.
///
/// Boxes scoring at or below `score_threshold` are dropped first. The rest
/// are visited from highest to lowest score; a box is kept unless its IoU
/// with an already-kept box exceeds `iou_threshold`. Suppression is
/// class-agnostic. Ties keep input order.
pub fn nms_boxes<S>(
    boxes: &[Rect<S>],
    scores: &[f32],
    score_threshold: f32,
    iou_threshold: f32,
) -> Vec<usize> {
    debug_assert_eq!(boxes.len(), scores.len());
    let count = boxes.len().min(scores.len());

    let mut order: Vec<usize> = (0..count)
        .filter(|&i| scores[i] > score_threshold)
        .collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut keep: Vec<usize> = Vec::with_capacity(order.len());
    for i in order {
        let overlaps = keep
            .iter()
            .any(|&k| boxes[k].iou(&boxes[i]) > iou_threshold);
        if !overlaps {
            keep.push(i);
        }
    }
    keep
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Pixel;

    fn rect(x: u32, y: u32, w: u32, h: u32) -> Rect<Pixel> {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn test_overlapping_lower_score_is_suppressed() {
        let boxes = [rect(0, 0, 10, 10), rect(1, 1, 10, 10), rect(50, 50, 10, 10)];
        let scores = [0.6, 0.9, 0.5];
        assert_eq!(nms_boxes(&boxes, &scores, 0.1, 0.3), vec![1, 2]);
    }

    #[test]
    fn test_score_threshold_is_exclusive() {
        let boxes = [rect(0, 0, 10, 10), rect(20, 20, 10, 10)];
        let scores = [0.1, 0.2];
        assert_eq!(nms_boxes(&boxes, &scores, 0.1, 0.5), vec![1]);
    }

    #[test]
    fn test_disjoint_boxes_all_survive_in_score_order() {
        let boxes = [rect(0, 0, 5, 5), rect(10, 0, 5, 5), rect(20, 0, 5, 5)];
        let scores = [0.3, 0.8, 0.5];
        assert_eq!(nms_boxes(&boxes, &scores, 0.0, 0.1), vec![1, 2, 0]);
    }

    #[test]
    fn test_empty_input() {
        let boxes: [Rect<Pixel>; 0] = [];
        assert!(nms_boxes(&boxes, &[], 0.1, 0.1).is_empty());
    }
}
