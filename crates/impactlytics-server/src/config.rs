/// Re-export `Config` from `impactlytics-core` for use within this crate.
///
/// All environment-variable parsing lives in `impactlytics-core` so it can be
/// shared with integration tests without depending on the full server.
pub use impactlytics_core::config::Config;
