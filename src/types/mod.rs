pub mod dates;
pub mod error;
pub mod frames;
pub mod location;
pub mod parameter;
pub mod stats;
