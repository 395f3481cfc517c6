// UI module - panels and the Slint front end
//
// This module contains:
// - panels: Per-resource panels owning the background tasks, free of Slint
// - GuiController: Wires the Slint window to the application state and runs the frame timer

pub mod controller;
pub mod panels;

pub use controller::GuiController;
