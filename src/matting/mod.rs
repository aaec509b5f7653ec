pub mod bilateral;
pub mod box_filter;
pub mod cleanup;
pub mod color;
pub mod composite;
pub mod decontaminate;
pub mod enhance;
pub mod face;
pub mod guided_filter;
pub mod hair;
pub mod inter_area;
pub mod normalizer;
pub mod refiner;
pub mod summed_area_table;
pub mod trimap;
