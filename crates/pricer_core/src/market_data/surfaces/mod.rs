//! Black volatility term structures.
//!
//! - [`VolatilitySurface`]: Black volatility by expiry and strike
//! - [`BlackConstantVol`]: Single volatility read from a quote

mod flat;
mod traits;

pub use flat::BlackConstantVol;
pub use traits::VolatilitySurface;
