//! Interactive workspace core of the drone survey console.
//!
//! A single scene per mount shows one survey iteration in either a 3D mesh view or a 2D
//! vector-over-imagery view. Pointer input is routed to exactly one interaction at a time:
//! feature picking, two-point distance measurement, or line/polygon drawing.
//!
//! The interaction logic talks to the renderer only through
//! [`engine::scene::adapter::SceneAdapter`], so everything under [`tools`] and [`workspace`]
//! runs against the in-memory [`engine::scene::recording::RecordingScene`] in tests and
//! against Bevy at runtime.

pub mod engine;
pub mod error;
pub mod geometry;
pub mod rpc;
pub mod tools;
pub mod workspace;
