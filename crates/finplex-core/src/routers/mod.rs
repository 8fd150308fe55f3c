//! Routers compiled into this build, each mounted at `/<name>`.

pub mod coverage;
pub mod crypto;
pub mod economy;
pub mod equity;

use crate::router::RouterExtension;

pub const INSTALLED_ROUTERS: &[RouterExtension] = &[
    RouterExtension::new("coverage", coverage::router),
    RouterExtension::new("crypto", crypto::router),
    RouterExtension::new("economy", economy::router),
    RouterExtension::new("equity", equity::router),
];
