/// User interface module
///
/// - Crop square editor drawn over the preview (crop_overlay.rs)
/// - Probability bar chart (chart.rs)
/// - Window panels built from the session (panels.rs)
/// - Opening product links in the browser (links.rs)

pub mod chart;
pub mod crop_overlay;
pub mod links;
pub mod panels;
