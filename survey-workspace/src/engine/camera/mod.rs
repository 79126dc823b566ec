pub mod viewport_camera;
