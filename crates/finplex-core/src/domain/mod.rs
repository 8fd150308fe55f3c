mod date;
mod symbol;

pub use date::{ensure_date_range, IsoDate};
pub use symbol::Symbol;
