pub mod table;

pub use table::{format_general, summary_block, Column, TableWriter, COLUMNS};
