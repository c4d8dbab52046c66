//! Preview rendering of validated pages: a software rasterizer with PNG
//! output and an X11 window.

pub mod hit_test;
pub mod raster;
pub mod window;

pub use hit_test::HitTestIndex;
pub use raster::{load_font, render_page, Frame};
