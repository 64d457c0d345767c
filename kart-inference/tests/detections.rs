use kart_inference::inference::yolo::inference_yolo_detect::{
    decode_candidates, into_detections, Letterbox,
};
use kart_inference::inference::yolo::{NMSImplement, YoloCandidate};
use kart_inference::{BoundingBox, CocoClass, Detection};
use ndarray::Array2;

fn candidate(class_index: usize, score: f32, x: f32, y: f32, size: f32) -> YoloCandidate {
    YoloCandidate {
        class_index,
        score,
        x,
        y,
        width: size,
        height: size,
    }
}

/// `[4 + classes, proposals]` output with one proposal per column.
fn raw_output(classes: usize, proposals: &[([f32; 4], usize, f32)]) -> Array2<f32> {
    let mut output = Array2::<f32>::zeros((4 + classes, proposals.len()));
    for (column, (geometry, class, score)) in proposals.iter().enumerate() {
        for (row, value) in geometry.iter().enumerate() {
            output[[row, column]] = *value;
        }
        output[[4 + class, column]] = *score;
    }
    output
}

#[test]
fn coco_subset_maps_to_names() -> anyhow::Result<()> {
    assert_eq!(CocoClass::try_from(0usize)?.name(), "person");
    assert_eq!(CocoClass::try_from(11usize)?.name(), "stop sign");
    assert_eq!(CocoClass::TrafficLight.to_string(), "traffic light");
    assert!(CocoClass::try_from(12usize).is_err());
    Ok(())
}

#[test]
fn detection_contract_is_enforced() -> anyhow::Result<()> {
    assert!(BoundingBox::new(10, 10, 10, 20).is_err());
    assert!(BoundingBox::new(10, 20, 30, 5).is_err());

    let bounding_box = BoundingBox::new(0, 0, 150, 50)?;
    assert_eq!(bounding_box.width(), 150);
    assert_eq!(bounding_box.height(), 50);
    assert!(Detection::new("person", 1.2, bounding_box).is_err());

    let person = Detection::new("person", 0.87, bounding_box)?;
    assert!(person.is(CocoClass::Person));
    assert!(!person.is(CocoClass::StopSign));
    assert_eq!(person.to_string(), "person 0.87 [0, 0, 150, 50]");
    Ok(())
}

#[test]
fn decode_keeps_confident_proposals_only() {
    let output = raw_output(
        3,
        &[
            ([100.0, 100.0, 20.0, 20.0], 2, 0.9),
            ([200.0, 200.0, 20.0, 20.0], 1, 0.1),
            ([300.0, 300.0, 40.0, 10.0], 0, 0.5),
        ],
    );

    let candidates = decode_candidates(output.view(), 0.25);
    assert_eq!(
        candidates,
        vec![
            candidate(2, 0.9, 100.0, 100.0, 20.0),
            YoloCandidate {
                class_index: 0,
                score: 0.5,
                x: 300.0,
                y: 300.0,
                width: 40.0,
                height: 10.0,
            },
        ]
    );
}

#[test]
fn suppression_is_per_class() {
    let candidates = vec![
        candidate(0, 0.6, 100.0, 100.0, 50.0),
        candidate(0, 0.9, 102.0, 100.0, 50.0),
        candidate(11, 0.7, 101.0, 100.0, 50.0),
        candidate(0, 0.8, 400.0, 400.0, 50.0),
    ];

    let kept = candidates.non_maximum_suppression(0.7);
    let summary = kept
        .iter()
        .map(|c| (c.class_index, c.score))
        .collect::<Vec<_>>();
    assert_eq!(summary, vec![(0, 0.9), (0, 0.8), (11, 0.7)]);
}

#[test]
fn iou_of_identical_and_disjoint_boxes() {
    let a = candidate(0, 1.0, 50.0, 50.0, 10.0);
    let b = candidate(0, 1.0, 80.0, 80.0, 10.0);
    assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    assert_eq!(a.iou(&b), 0.0);
}

#[test]
fn detections_are_mapped_back_into_the_frame() -> anyhow::Result<()> {
    // 1280x640 frame letterboxed into 640x640: scale 0.5, 160 px of padding on top.
    let letterbox = Letterbox {
        scale: 0.5,
        offset: (0, 160),
        frame_size: (1280, 640),
    };
    let candidates = vec![
        candidate(11, 0.876, 100.0, 260.0, 40.0),
        candidate(20, 0.99, 300.0, 300.0, 40.0),
        candidate(0, 0.5, 5.0, 170.0, 40.0),
    ];

    let detections = into_detections(candidates, letterbox)?;
    assert_eq!(detections.len(), 2);

    let stop_sign = &detections[0];
    assert_eq!(stop_sign.class_name, "stop sign");
    assert!((stop_sign.confidence - 0.88).abs() < 1e-6);
    assert_eq!(stop_sign.bounding_box, BoundingBox::new(160, 160, 240, 240)?);

    let person = &detections[1];
    assert_eq!(person.class_name, "person");
    assert_eq!(person.bounding_box, BoundingBox::new(0, 0, 50, 60)?);
    Ok(())
}
