#[cfg(feature = "axum")]
pub mod axum;

#[cfg(feature = "axum")]
pub use self::axum::AxumIntegration;
