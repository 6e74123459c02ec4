use anyhow::Result;
use cli_shell::Interpreter;
use cli_shell::config::ShellConfig;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let config: ShellConfig = argh::from_env();
    init_tracing(&config.log_level);

    let mut shell = Interpreter::default();
    match &config.command {
        Some(line) => {
            let outcome = shell.execute_line(line);
            cli_shell::print_outcome(&mut std::io::stdout().lock(), &outcome)?;
            if outcome.is_failure() {
                std::process::exit(1);
            }
            Ok(())
        }
        None => shell.repl(&config),
    }
}
