use bevy::color::Color;

/// Screen-space size of committed measure and draw vertices, in pixels.
pub const MARKER_PIXEL_SIZE: f32 = 5.0;
pub const MARKER_COLOUR: Color = Color::srgb(1.0, 0.0, 0.0);

/// World units per marker pixel when markers are realised as spheres.
pub const MARKER_WORLD_SCALE: f32 = 0.1;

/// Finalised measurement segment.
pub const MEASURE_LINE_COLOUR: Color = Color::srgb(1.0, 1.0, 0.0);
pub const MEASURE_LINE_WIDTH: f32 = 0.5;

/// Rubber-band segment shown between the first click and the cursor.
pub const MEASURE_PREVIEW_WIDTH: f32 = 2.0;

pub const MEASURE_LABEL_COLOUR: Color = Color::srgb(1.0, 1.0, 0.0);
pub const MEASURE_LABEL_FONT_SIZE: f32 = 20.0;
/// Label offset from its anchor in pixels, negative y is up.
pub const MEASURE_LABEL_PIXEL_OFFSET: [f32; 2] = [0.0, -20.0];

pub const DRAW_LINE_COLOUR: Color = Color::srgb(1.0, 1.0, 0.0);
pub const DRAW_LINE_WIDTH: f32 = 1.5;
pub const DRAW_POLYGON_FILL: Color = Color::srgba(1.0, 1.0, 1.0, 0.7);

/// Fill applied to vector features when a layer loads.
pub const DEFAULT_VECTOR_COLOUR: Color = Color::srgb(1.0, 0.0, 0.0);
pub const DEFAULT_VECTOR_OPACITY: f32 = 0.5;
pub const DEFAULT_VECTOR_COLOUR_HEX: &str = "#FF0000";

/// Selected features take this colour at the layer's current opacity.
pub const HIGHLIGHT_COLOUR: Color = Color::srgb(1.0, 1.0, 0.0);

/// Raster overlays are drawn as a ground quad in this tint until imagery tiles stream in.
pub const IMAGERY_TINT: Color = Color::srgba(0.55, 0.6, 0.55, 0.85);
/// Mesh tilesets are represented by their bounding volume.
pub const TILESET_PROXY_COLOUR: Color = Color::srgba(0.35, 0.55, 0.9, 0.35);

pub const DEFAULT_FLY_DURATION_SECS: f32 = 2.0;

/// Camera pitch for framed (non top-down) views.
pub const FRAMING_PITCH: f32 = -0.6;
pub const TOP_DOWN_PITCH: f32 = -std::f32::consts::FRAC_PI_2;

/// Half-thickness given to flat features when testing them against pick rays.
pub const PICK_SLAB_HALF_THICKNESS: f32 = 0.25;
