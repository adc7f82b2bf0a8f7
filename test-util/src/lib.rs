pub use synthetic::batch::{BATCH_LIGHT_CURVES, batch_dip};
pub use synthetic::box_dip::{BoxDip, box_dip_light_curve, noise_light_curve};
pub use synthetic::transit::{HOT_JUPITER, TransitSignal, transit_light_curve};
pub use synthetic::types::TripleArray;

mod synthetic;
