use criterion::Criterion;
use light_curve_common::linspace;
use light_curve_transit::ndarray::Array1;
use light_curve_transit::{TransitModel, TransitParameters};
use light_curve_transit_test_util::HOT_JUPITER;
use std::hint::black_box;

pub fn bench_transit_model(c: &mut Criterion) {
    let circular = HOT_JUPITER.parameters();
    let eccentric = TransitParameters {
        eccentricity: 0.3,
        omega_deg: 40.0,
        ..circular
    };
    // a single transit, so every observation needs the occultation integral
    let t_in_transit = Array1::from_vec(linspace(1.25, 1.35, 1000));
    let t_baseline = Array1::from_vec(linspace(0.0, 27.0, 10000));

    for quadrature_intervals in [8, 32] {
        let model = TransitModel::new(quadrature_intervals).unwrap();
        for (name, params) in [("circular", &circular), ("eccentric", &eccentric)] {
            for (t_name, t) in [("in-transit", &t_in_transit), ("27 days", &t_baseline)] {
                c.bench_function(
                    format!(
                        "Transit model: {name} orbit, {t_name}, {} points, {quadrature_intervals} intervals",
                        t.len()
                    )
                    .as_str(),
                    |b| b.iter(|| model.light_curve(black_box(params), t.view()).unwrap()),
                );
            }
        }
    }
}
