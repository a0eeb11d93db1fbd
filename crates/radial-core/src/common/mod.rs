pub mod config;
pub mod constants;

pub use config::{
    CalculationOptions, ConvergenceMetric, Gauge, GridOptions, OptionsError,
    load_calculation_options,
};
