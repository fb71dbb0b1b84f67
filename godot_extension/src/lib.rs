//! GDExtension entry point for the ray cast correlation engine.

use godot::init::InitLevel;
use godot::prelude::*;

mod point_convert;

mod raycast_bridge;
pub use raycast_bridge::RayCastBridge;

/// Forwards `log` records from raycast_core to the Godot console.
struct GodotLogger;

impl log::Log for GodotLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        match record.level() {
            log::Level::Error => godot_error!("[{}] {}", record.target(), record.args()),
            log::Level::Warn => godot_warn!("[{}] {}", record.target(), record.args()),
            _ => godot_print!("[{}] {}", record.target(), record.args()),
        }
    }

    fn flush(&self) {}
}

static LOGGER: GodotLogger = GodotLogger;

struct RayCastExtension;

#[gdextension]
unsafe impl ExtensionLibrary for RayCastExtension {
    fn on_level_init(level: InitLevel) {
        if level == InitLevel::Scene && log::set_logger(&LOGGER).is_ok() {
            log::set_max_level(log::LevelFilter::Info);
        }
    }
}
