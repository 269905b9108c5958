//! `log` backend: the browser console on wasm32, `env_logger` on native hosts.

use log::LevelFilter;

#[cfg(target_arch = "wasm32")]
mod console {
    use log::{Level, Log, Metadata, Record};
    use wasm_bindgen::JsValue;

    pub(super) struct ConsoleLogger;

    pub(super) static LOGGER: ConsoleLogger = ConsoleLogger;

    impl Log for ConsoleLogger {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.level() <= log::max_level()
        }

        fn log(&self, record: &Record) {
            if !self.enabled(record.metadata()) {
                return;
            }
            let line = format!("[{}] {}: {}", record.level(), record.target(), record.args());
            let msg = JsValue::from_str(&line);
            match record.level() {
                Level::Error => web_sys::console::error_1(&msg),
                Level::Warn => web_sys::console::warn_1(&msg),
                Level::Info => web_sys::console::info_1(&msg),
                Level::Debug | Level::Trace => web_sys::console::debug_1(&msg),
            }
        }

        fn flush(&self) {}
    }
}

/// Install the logger. Safe to call more than once; later calls only adjust
/// the global level filter.
pub fn init(filter: LevelFilter) {
    #[cfg(target_arch = "wasm32")]
    {
        let _ = log::set_logger(&console::LOGGER);
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = env_logger::Builder::from_default_env()
            .filter_level(filter)
            .try_init();
    }
    log::set_max_level(filter);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_only_moves_the_filter() {
        init(LevelFilter::Info);
        init(LevelFilter::Warn);
        assert_eq!(log::max_level(), LevelFilter::Warn);
        init(LevelFilter::Info);
        assert_eq!(log::max_level(), LevelFilter::Info);
    }
}
