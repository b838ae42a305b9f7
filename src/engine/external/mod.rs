#[cfg(feature = "native")]
pub mod sdftd3;
