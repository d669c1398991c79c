//! Rectangle helpers shared by the aggregator and the tracker boundary.

use park_proto::BBox;

/// Strict overlap test: boxes that only touch along an edge do not overlap.
pub fn overlaps(a: &BBox, b: &BBox) -> bool {
    a.x1 < b.x2 && a.x2 > b.x1 && a.y1 < b.y2 && a.y2 > b.y1
}

/// Area of the intersection of two corner boxes, 0 when they do not overlap.
pub fn intersection_area(a: &BBox, b: &BBox) -> f64 {
    if !overlaps(a, b) {
        return 0.0;
    }
    let ix1 = a.x1.max(b.x1) as f64;
    let iy1 = a.y1.max(b.y1) as f64;
    let ix2 = a.x2.min(b.x2) as f64;
    let iy2 = a.y2.min(b.y2) as f64;
    ((ix2 - ix1) * (iy2 - iy1)).max(0.0)
}

pub fn iou(a: &BBox, b: &BBox) -> f64 {
    let inter = intersection_area(a, b);
    let union = a.area().max(0.0) + b.area().max(0.0) - inter;
    if union <= 0.0 { 0.0 } else { inter / union }
}

/// Corner box to `(cx, cy, w, h)`. Corners may arrive in either order.
pub fn to_center_width_height(b: &BBox) -> (f32, f32, f32, f32) {
    let left = b.x1.min(b.x2);
    let top = b.y1.min(b.y2);
    let w = (b.x1 - b.x2).abs();
    let h = (b.y1 - b.y2).abs();
    (left + w / 2.0, top + h / 2.0, w, h)
}

/// Corner box to tracker-style `(x, y, w, h)` with `(x, y)` the top-left corner.
pub fn to_top_left_width_height(b: &BBox) -> (f32, f32, f32, f32) {
    (b.x1, b.y1, b.x2 - b.x1, b.y2 - b.y1)
}

pub fn from_center_width_height(cx: f32, cy: f32, w: f32, h: f32) -> BBox {
    BBox::new(cx - w / 2.0, cy - h / 2.0, cx + w / 2.0, cy + h / 2.0)
}

pub fn from_top_left_width_height(x: f32, y: f32, w: f32, h: f32) -> BBox {
    BBox::new(x, y, x + w, y + h)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disjoint_boxes_have_zero_intersection() {
        let a = BBox::new(0.0, 0.0, 10.0, 10.0);
        let cases = [
            BBox::new(20.0, 0.0, 30.0, 10.0),
            BBox::new(0.0, 20.0, 10.0, 30.0),
            BBox::new(-30.0, -30.0, -1.0, -1.0),
            // touching edges only
            BBox::new(10.0, 0.0, 20.0, 10.0),
            BBox::new(0.0, 10.0, 10.0, 20.0),
        ];
        for b in cases {
            assert_eq!(intersection_area(&a, &b), 0.0, "{:?}", b);
            assert_eq!(intersection_area(&b, &a), 0.0, "{:?}", b);
        }
    }

    #[test]
    fn identical_boxes_intersect_fully() {
        for b in [
            BBox::new(0.0, 0.0, 100.0, 100.0),
            BBox::new(3.0, 7.0, 4.0, 9.0),
            BBox::new(-5.0, -5.0, 5.0, 15.0),
        ] {
            assert_eq!(intersection_area(&b, &b), b.area());
            assert!((iou(&b, &b) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn partial_overlap_area() {
        let zone = BBox::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(intersection_area(&zone, &BBox::new(0.0, 0.0, 60.0, 100.0)), 6000.0);
        assert_eq!(intersection_area(&zone, &BBox::new(90.0, 0.0, 200.0, 100.0)), 1000.0);
        assert_eq!(intersection_area(&zone, &BBox::new(50.0, 50.0, 150.0, 150.0)), 2500.0);
    }

    #[test]
    fn format_conversions_invert() {
        let b = BBox::new(10.0, 20.0, 50.0, 100.0);

        let (cx, cy, w, h) = to_center_width_height(&b);
        assert_eq!((cx, cy, w, h), (30.0, 60.0, 40.0, 80.0));
        assert_eq!(from_center_width_height(cx, cy, w, h), b);

        let (x, y, w, h) = to_top_left_width_height(&b);
        assert_eq!((x, y, w, h), (10.0, 20.0, 40.0, 80.0));
        assert_eq!(from_top_left_width_height(x, y, w, h), b);
    }

    #[test]
    fn center_format_tolerates_swapped_corners() {
        let b = BBox::new(50.0, 100.0, 10.0, 20.0);
        assert_eq!(to_center_width_height(&b), (30.0, 60.0, 40.0, 80.0));
    }
}
