//! Utility functions and types

pub mod data_loader;

pub use data_loader::{frame_to_matrix, frame_to_records, matrix_to_frame, sample_rows, DataLoader, DataSaver};
