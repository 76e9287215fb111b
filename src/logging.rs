use crate::config::Environment;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is unset. `--verbose` opens up the client and
/// its HTTP traffic regardless of environment.
fn default_filter(env: &Environment, verbose: bool) -> &'static str {
    if verbose {
        return "diagnosis_client=trace,reqwest=debug,info";
    }
    match env {
        Environment::Dev => "diagnosis_client=info,warn",
        Environment::Staging => "diagnosis_client=warn,error",
        Environment::Prod => "error",
    }
}

/// Logs go to stderr; stdout belongs to the interview.
pub fn init_logging(env: &Environment, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(env, verbose)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_file(env.is_dev() && verbose)
        .with_line_number(env.is_dev() && verbose);

    // Machine-readable in production
    if env.is_prod() {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer.compact().without_time())
            .init();
    }

    tracing::debug!(?env, verbose, "Logging initialized");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interview_stays_quiet_by_default() {
        assert_eq!(default_filter(&Environment::Dev, false), "diagnosis_client=info,warn");
        assert_eq!(default_filter(&Environment::Prod, false), "error");
    }

    #[test]
    fn verbose_wins_over_environment() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            assert!(default_filter(&env, true).contains("diagnosis_client=trace"));
        }
    }

    #[test]
    fn every_default_is_a_valid_directive() {
        for env in [Environment::Dev, Environment::Staging, Environment::Prod] {
            for verbose in [false, true] {
                assert!(EnvFilter::try_new(default_filter(&env, verbose)).is_ok());
            }
        }
    }
}
