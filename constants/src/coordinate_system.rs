/// Survey-to-render transformation matrix (row-major: [x_new, y_new, z_new]).
/// Survey space is Z-up (easting, northing, height); the renderer is Y-up.
pub const COORDINATE_TRANSFORM: [[f64; 3]; 3] = [
    [1.0, 0.0, 0.0],  // X = easting
    [0.0, 0.0, 1.0],  // Y = height
    [0.0, -1.0, 0.0], // Z = -northing
];

/// Map a survey-space coordinate into render space.
pub fn transform_coordinates(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    apply(&COORDINATE_TRANSFORM, [x, y, z], false)
}

/// Map a render-space coordinate back into survey space.
/// The matrix is a pure rotation so its transpose is the inverse.
pub fn inverse_transform_coordinates(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    apply(&COORDINATE_TRANSFORM, [x, y, z], true)
}

fn apply(matrix: &[[f64; 3]; 3], input: [f64; 3], transpose: bool) -> (f64, f64, f64) {
    let mut output = [0.0; 3];

    for i in 0..3 {
        for j in 0..3 {
            let m = if transpose { matrix[j][i] } else { matrix[i][j] };
            output[i] += m * input[j];
        }
    }

    (output[0], output[1], output[2])
}
