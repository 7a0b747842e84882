use env_logger::{Builder, Env};

/// Diagnostics go to stderr so they never interleave with sample rows on stdout.
pub fn setup_logger() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}
