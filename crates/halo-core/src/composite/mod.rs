//! Compositing: masks, blur and the canvas they end up on

pub mod blur;
pub mod canvas;
pub mod compositor;
pub mod mask;

pub use blur::gaussian_blur;
pub use canvas::Canvas;
pub use compositor::{CompositeStage, Composited, Compositor};
pub use mask::{max_blend, CoverageMask};
