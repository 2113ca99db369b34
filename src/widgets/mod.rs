pub mod chart;
pub mod controls;
pub mod debug;
pub mod share_table;
