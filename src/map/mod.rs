pub mod geometry;
pub mod projection;
pub mod renderer;
pub mod surface;

pub use projection::Viewport;
pub use renderer::{DisplaySettings, Lod, MapLayers, MapRenderer, PlacedMarker};
pub use surface::{point_position, MapSurface, MarkerSpec, PointToMarker, Tooltip};
