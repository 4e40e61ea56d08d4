use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the global logger once; subsequent calls are ignored.
///
/// `filter` follows the `env_logger` syntax (e.g. "info",
/// "pathlight_core=debug,wgpu=warn"). When `None`, `RUST_LOG` wins, with an
/// info-level default.
pub fn init(filter: Option<&str>) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = filter {
            builder.parse_filters(filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(log::LevelFilter::Info);
        }

        builder.init();

        log::debug!("logging initialized");
    });
}
