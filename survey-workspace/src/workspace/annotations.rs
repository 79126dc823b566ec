use crate::tools::draw::FinalizedShape;
use crate::tools::measure::Measurement;

/// Completed measurements and shapes, kept until the host clears them.
#[derive(Debug, Default)]
pub struct AnnotationLog {
    measurements: Vec<Measurement>,
    shapes: Vec<FinalizedShape>,
}

impl AnnotationLog {
    pub fn record_measurement(&mut self, measurement: Measurement) {
        self.measurements.push(measurement);
    }

    pub fn record_shape(&mut self, shape: FinalizedShape) {
        self.shapes.push(shape);
    }

    pub fn last_measurement(&self) -> Option<&Measurement> {
        self.measurements.last()
    }

    pub fn measurements(&self) -> &[Measurement] {
        &self.measurements
    }

    pub fn finalized_shapes(&self) -> &[FinalizedShape] {
        &self.shapes
    }

    pub fn clear(&mut self) {
        self.measurements.clear();
        self.shapes.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty() && self.shapes.is_empty()
    }
}
