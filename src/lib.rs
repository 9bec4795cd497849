pub mod canvas;
pub mod logging;
pub mod turtle;
