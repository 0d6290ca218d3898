/// State management module
///
/// This module handles all application state:
/// - Shared data structures: results, recommendations (data.rs)
/// - The session: current image, tickets, what to render (session.rs)

pub mod data;
pub mod session;
