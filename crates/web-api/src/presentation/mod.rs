pub mod charts;
pub mod histogram;
pub mod page;
