pub mod detail;
pub mod feed;
pub mod normalize;
pub mod page_data;
pub mod traits;
pub mod yad2;

pub use traits::ListingSource;
pub use yad2::Yad2Scraper;
