//! COVID-19 cases by country, drawn as colored markers on a terminal map.

pub mod app;
pub mod braille;
pub mod config;
pub mod data;
pub mod error;
pub mod map;
pub mod severity;
pub mod stats;
pub mod ui;
pub mod visualizer;
