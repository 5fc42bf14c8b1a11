//! Hardware abstraction traits

use crate::{error::ErrorKind, reading::Reading};

/// A thermometer that can be read from any request handler
#[allow(async_fn_in_trait)]
pub trait Thermometer {
    /// Run one full conversion cycle
    async fn read(&self) -> Result<Reading, ErrorKind>;
}
