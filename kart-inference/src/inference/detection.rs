use anyhow::{ensure, Result};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt::{Display, Formatter};

/// The leading COCO classes; everything after `stop sign` has nothing to do with the road.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, TryFromPrimitive, IntoPrimitive)]
#[repr(usize)]
pub enum CocoClass {
    Person = 0,
    Bicycle,
    Car,
    Motorcycle,
    Airplane,
    Bus,
    Train,
    Truck,
    Boat,
    TrafficLight,
    FireHydrant,
    StopSign,
}

impl CocoClass {
    pub fn name(self) -> &'static str {
        match self {
            CocoClass::Person => "person",
            CocoClass::Bicycle => "bicycle",
            CocoClass::Car => "car",
            CocoClass::Motorcycle => "motorcycle",
            CocoClass::Airplane => "airplane",
            CocoClass::Bus => "bus",
            CocoClass::Train => "train",
            CocoClass::Truck => "truck",
            CocoClass::Boat => "boat",
            CocoClass::TrafficLight => "traffic light",
            CocoClass::FireHydrant => "fire hydrant",
            CocoClass::StopSign => "stop sign",
        }
    }
}

impl Display for CocoClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Axis aligned box in frame pixels, corners `(x1, y1)` top-left and `(x2, y2)` bottom-right.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoundingBox {
    pub x1: i32,
    pub y1: i32,
    pub x2: i32,
    pub y2: i32,
}

impl BoundingBox {
    pub fn new(x1: i32, y1: i32, x2: i32, y2: i32) -> Result<Self> {
        ensure!(
            x1 < x2 && y1 < y2,
            "degenerate bounding box ({x1}, {y1}, {x2}, {y2})"
        );
        Ok(Self { x1, y1, x2, y2 })
    }

    pub fn width(&self) -> i32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> i32 {
        self.y2 - self.y1
    }

    pub fn corners(&self) -> (i32, i32, i32, i32) {
        (self.x1, self.y1, self.x2, self.y2)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    pub class_name: String,
    pub confidence: f32,
    pub bounding_box: BoundingBox,
}

impl Detection {
    pub fn new(
        class_name: impl Into<String>,
        confidence: f32,
        bounding_box: BoundingBox,
    ) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&confidence),
            "detection confidence {confidence} outside [0, 1]"
        );
        ensure!(
            bounding_box.x1 < bounding_box.x2 && bounding_box.y1 < bounding_box.y2,
            "degenerate bounding box {:?}",
            bounding_box
        );
        Ok(Self {
            class_name: class_name.into(),
            confidence,
            bounding_box,
        })
    }

    pub fn is(&self, class: CocoClass) -> bool {
        self.class_name == class.name()
    }

    pub fn width(&self) -> i32 {
        self.bounding_box.width()
    }
}

impl Display for Detection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (x1, y1, x2, y2) = self.bounding_box.corners();
        write!(
            f,
            "{} {:.2} [{}, {}, {}, {}]",
            self.class_name, self.confidence, x1, y1, x2, y2
        )
    }
}
