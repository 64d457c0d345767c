pub mod inference_road_seg;

/// ADE20K label of `road` once the background label is dropped.
pub const ROAD_CLASS_ID: usize = 6;
pub const SEGFORMER_INPUT_SIZE: u32 = 512;
