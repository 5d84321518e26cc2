pub mod crypto;
pub mod locator;
pub mod normalize;
pub mod token;
