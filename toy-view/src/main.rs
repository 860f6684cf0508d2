//! Application entry point for the physics toy viewer.
//!
//! This binary installs the logger, sets up eframe/egui and delegates all
//! interactive logic and rendering to [`Viewer`] from the `viewer` module.

mod viewer;

use viewer::Viewer;

/// Starts the native eframe application.
///
/// Logging goes through `env_logger`; set `RUST_LOG=debug` to see geometry
/// rebuilds and population changes. The window is titled `"Physics Toy"`
/// and all UI state and rendering are handled by [`Viewer`].
///
/// ### Returns
/// - `Ok(())` if the application runs to completion without errors.
/// - `Err` if eframe fails to create the native window or event loop.
fn main() -> eframe::Result<()> {
    env_logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1280.0, 800.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Physics Toy",
        options,
        Box::new(|_cc| Ok(Box::new(Viewer::new()))),
    )
}
