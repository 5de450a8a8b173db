pub mod benchmark;
pub mod curve;
pub mod diode_model;
pub mod mpp;
pub mod parameters;
pub mod solvers;
pub mod sweep;
pub mod units;
