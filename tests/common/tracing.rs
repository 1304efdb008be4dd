use std::sync::Once;

/// Install a subscriber once per test binary when `RUST_LOG` is set
pub fn init_tracing_from_env() {
    static INIT: Once = Once::new();
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    INIT.call_once(|| {
        let subscriber = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer();
        let _ = subscriber.try_init();
    });
}
