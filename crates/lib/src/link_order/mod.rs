//! Link input ordering.
//!
//! [`DepSet`] is an immutable, structurally shared set of transitive items.
//! [`LinkRank`] sorts flattened sets by one graph-wide order, and
//! [`order_static_deps`] uses the ranked set to put a consumer's declared
//! static libraries into a consistent link order.

mod depset;
mod order;

pub use depset::{DepSet, DepSetBuilder, Order};
pub use order::{LinkOrderError, LinkRank, order_static_deps};
