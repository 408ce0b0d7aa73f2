//! Yield term structures.
//!
//! - [`YieldCurve`]: Discount factors and zero rates anchored at a reference date
//! - [`FlatForward`]: Constant continuously-compounded rate read from a quote

mod flat;
mod traits;

pub use flat::FlatForward;
pub use traits::YieldCurve;
