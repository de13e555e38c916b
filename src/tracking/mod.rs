pub mod sample;
pub mod session;
pub mod speed;
pub mod tracker;
pub mod window;

#[cfg(test)]
mod tests;
