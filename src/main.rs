fn main() {
    if let Err(e) = healthguard_lib::run() {
        tracing::error!(error = %e, "HealthGuard failed to start");
        eprintln!("healthguard: {e}");
        std::process::exit(1);
    }
}
