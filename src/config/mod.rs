//! Configuration management module

pub mod env;
pub mod parser;
pub mod validation;

pub use env::EnvManager;
pub use parser::{display_config_summary, load_config, ConfigParser};
pub use validation::{validate_config, ConfigValidator, ValidationLevel, ValidationWarning};

// Re-export from models for convenience
pub use crate::models::Config;


#[cfg(test)]
pub(crate) mod tests_support {
    use std::sync::{Mutex, MutexGuard};

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    /// Remove every variable the configuration layer reads
    pub fn clear_bench_env() {
        for (name, _, _) in super::EnvManager::get_supported_env_vars() {
            std::env::remove_var(name);
        }
    }

    /// Serializes tests that touch process environment and keeps a local .env out of the way
    pub struct IsolatedEnv {
        moved_env_file: bool,
        _guard: MutexGuard<'static, ()>,
    }

    impl IsolatedEnv {
        const BACKUP: &'static str = ".env.devbench_test_backup";

        pub fn acquire() -> Self {
            let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            clear_bench_env();
            let moved_env_file =
                std::path::Path::new(".env").exists() && std::fs::rename(".env", Self::BACKUP).is_ok();
            Self {
                moved_env_file,
                _guard: guard,
            }
        }
    }

    impl Drop for IsolatedEnv {
        fn drop(&mut self) {
            clear_bench_env();
            if self.moved_env_file {
                let _ = std::fs::rename(Self::BACKUP, ".env");
            }
        }
    }
}
