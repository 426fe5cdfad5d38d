pub mod channels;
pub mod convolve;
pub mod f64;
pub mod io;
pub mod traits;

pub use self::channels::{merge_interleaved, split_interleaved, PixelLayout};
pub use self::convolve::{convolve, convolve_into};
pub use self::f64::ImageF64;
pub use self::traits::{ImageView, Rows};
