pub mod api;
pub mod build;
pub mod display;
pub mod error;
pub mod otg;
pub mod run;
pub mod transform;
pub mod version;

#[cfg(test)]
mod test;
