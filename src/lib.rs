#[cfg(feature = "python")]
use pyo3::prelude::*;

pub mod core;
pub mod error;
pub mod optimization;
pub mod optimizer;
pub mod report;

pub use self::core::*;
pub use error::{PlacementError, Result};
pub use optimization::*;
pub use optimizer::{PlacementOutcome, PlacementResult, Placer};

#[cfg(feature = "python")]
#[pymodule]
fn fogplacement(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(optimizer::python::place, m)?)?;
    Ok(())
}
