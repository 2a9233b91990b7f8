use mio::Poll;
use server_proxy::config::{display_config, Config, FromYaml};
use server_proxy::error::Result;
use server_proxy::server::Server;
use std::process::ExitCode;

fn load_config(path: &str) -> Result<Config> {
    let content =
        std::fs::read_to_string(path).map_err(|e| format!("failed to read '{}': {}", path, e))?;
    Ok(Config::from_str(&content)?)
}

fn serve(config: Config) -> Result<()> {
    let poll = Poll::new()?;
    let server = Server::new(config, &poll)?;
    server.run(poll)
}

fn main() -> ExitCode {
    let Some(config_path) = std::env::args().nth(1) else {
        eprintln!("usage: server_proxy <config-file>");
        return ExitCode::from(1);
    };

    let config = match load_config(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(1);
        }
    };

    display_config(&config.servers);

    match serve(config) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::from(2)
        }
    }
}
