//! Structured logging (spec §9 design note: the teacher's global
//! `println!`/`eprintln!` stderr logging is replaced by `tracing` events
//! carrying structured fields instead of interpolated strings). The library
//! never installs a subscriber itself — only `bin/`-level entry points and
//! tests do that, so embedding applications keep control of log routing.

/// Installs a `tracing_subscriber` suitable for examples, tests, and
/// benches. Library code must never call this.
#[cfg(test)]
pub fn init_test_subscriber() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}
