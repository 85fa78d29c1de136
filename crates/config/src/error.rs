pub use ctxswitch_common::{Error, Result};

ctxswitch_common::impl_context!();
