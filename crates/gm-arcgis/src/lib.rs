//! HTTP route solving against an ArcGIS-style `NAServer` service.

pub mod solver;
pub mod wire;

pub use solver::{ArcgisRouteSolver, solve_url, stops_param};
pub use wire::parse_solution;
