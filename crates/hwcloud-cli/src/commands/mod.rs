pub mod mrs;
