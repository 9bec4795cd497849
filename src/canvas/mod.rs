pub mod engine;
pub mod input;
pub mod mapper;
pub mod model;
pub mod ops;
pub mod queue;
pub mod render;
pub mod settings;
pub mod settings_store;
pub mod slots;
pub mod sprite;
pub mod state;
pub mod surface;
pub mod text;

pub use engine::{CanvasCommands, TurtleCanvas};
pub use input::{KeyHandler, KeyInput, MouseButton, MouseHandler};
pub use mapper::CoordinateMapper;
pub use model::{FontSpec, FontStyle, LogicalPoint, Rgb};
pub use ops::GraphicsOp;
pub use render::{DamageRect, Raster};
pub use settings::CanvasSettings;
pub use sprite::SpriteHandle;
pub use state::{PaintProgress, PaintState};
pub use surface::{BlitStatus, FrameSurface, Surface};
