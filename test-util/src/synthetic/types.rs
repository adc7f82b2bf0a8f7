use light_curve_transit::ndarray::Array1;

// We cannot return `TimeSeries`, because it would cause cyclic crate dependencies
pub type TripleArray = (Array1<f64>, Array1<f64>, Array1<f64>);
