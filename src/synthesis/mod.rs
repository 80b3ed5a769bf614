//! Command Synthesis from UI Elements
//!
//! Turns a list of classified UI elements (delivered by an image-analysis
//! collaborator) into an executable command sequence: elements are visited
//! top-to-bottom and left-to-right, with small y differences treated as one
//! row, emitting move/click/type steps separated by randomized delays.

pub mod elements;

pub use elements::{
    synthesize_sequence, Bounds, ClassifiedElement, ElementType, ROW_TOLERANCE_PX,
};
