mod data_sample;
pub use data_sample::DataSample;

mod sorted_array;
pub use sorted_array::SortedArray;

mod time_series;
pub use time_series::TimeSeries;

/// Light curve with a source identifier, the unit of batch processing
#[derive(Clone, Debug)]
pub struct LightCurve {
    pub id: String,
    pub series: TimeSeries,
}

impl LightCurve {
    pub fn new(id: impl Into<String>, series: TimeSeries) -> Self {
        Self {
            id: id.into(),
            series,
        }
    }
}
