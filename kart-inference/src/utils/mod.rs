pub mod extractor;
pub mod masks;
