// App module for lidar-gate-viz
// Handles the display shell state and keyboard input

pub mod input;
pub mod state;

pub use input::handle_input;
pub use state::{App, ScanView};
