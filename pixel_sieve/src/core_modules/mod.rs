pub mod pixel;
pub mod pixel_grid;
pub mod flood_fill;
pub mod aggregator;
pub mod utils {
    pub mod image_helper;
}
