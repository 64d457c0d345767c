pub mod inference_yolo_detect;

/// One raw YOLO proposal in model input space: centre `(x, y)` plus box size.
#[derive(Debug, Clone, PartialEq)]
pub struct YoloCandidate {
    pub class_index: usize,
    pub score: f32,

    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl YoloCandidate {
    pub fn corners(&self) -> (f32, f32, f32, f32) {
        (
            self.x - self.width / 2.,
            self.y - self.height / 2.,
            self.x + self.width / 2.,
            self.y + self.height / 2.,
        )
    }

    /// Intersection over union of the two boxes.
    pub fn iou(&self, other: &YoloCandidate) -> f32 {
        let (ax1, ay1, ax2, ay2) = self.corners();
        let (bx1, by1, bx2, by2) = other.corners();

        let intersection_width = (ax2.min(bx2) - ax1.max(bx1)).max(0.0);
        let intersection_height = (ay2.min(by2) - ay1.max(by1)).max(0.0);
        let intersection_area = intersection_width * intersection_height;

        let union = self.width * self.height + other.width * other.height - intersection_area;
        if union > 0.0 {
            intersection_area / union
        } else {
            0.0
        }
    }
}

pub trait NMSImplement {
    /// Greedy per-class suppression: a box survives unless a higher scored box of the same class
    /// overlaps it by `iou_threshold` or more.
    fn non_maximum_suppression(self, iou_threshold: f32) -> Vec<YoloCandidate>;
}

impl NMSImplement for Vec<YoloCandidate> {
    fn non_maximum_suppression(self, iou_threshold: f32) -> Vec<YoloCandidate> {
        let mut candidates = self;
        candidates.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        let mut result: Vec<YoloCandidate> = Vec::new();
        while !candidates.is_empty() {
            let best = candidates.remove(0);
            candidates.retain(|d| d.class_index != best.class_index || best.iou(d) < iou_threshold);
            result.push(best);
        }

        result
    }
}
