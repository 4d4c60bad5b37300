//! Individual segmentation steps

pub mod artifacts;
pub mod background_mask;
pub mod edge_contours;
pub mod rectify;
pub mod void_fill;
