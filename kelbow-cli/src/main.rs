use kelbow_cli::{run, Options};
use structopt::StructOpt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let options = Options::from_args();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let config = options.into_config()?;
    let report = run(&config)?;
    print!("{}", report);

    Ok(())
}
