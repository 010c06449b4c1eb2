use clap::{Parser, Subcommand};
use drawctl::{ControlCommand, DrawCode, SOCKET_PATH};
use std::io::Write;
use std::os::unix::net::UnixStream;

#[derive(Parser, Debug)]
#[command(name = "drawctl", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Redeem a code and spin the sphere.
    Spin {
        /// The lucky code to redeem
        code: String,
    },
    /// Check whether a code has already won a prize.
    Verify {
        /// The code to look up
        code: String,
    },
    /// Reload the prize catalog and profile settings
    Reload,
    /// Stop the lucky draw daemon
    Close,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let command = match cli.command {
        Commands::Spin { code } => ControlCommand::Spin(non_blank(code)?),
        Commands::Verify { code } => ControlCommand::Verify(non_blank(code)?),
        Commands::Reload => ControlCommand::Reload,
        Commands::Close => ControlCommand::Close,
    };

    send_command(&command)
}

fn non_blank(code: String) -> anyhow::Result<DrawCode> {
    let code = DrawCode::new(code);
    if code.is_blank() {
        anyhow::bail!("Please enter a code");
    }
    Ok(code)
}

fn send_command(cmd: &ControlCommand) -> anyhow::Result<()> {
    let mut stream = UnixStream::connect(SOCKET_PATH).map_err(|e| {
        anyhow::anyhow!(
            "Failed to connect to luckysphere daemon at {}: {}. Is luckysphere running?",
            SOCKET_PATH,
            e
        )
    })?;

    log::debug!("Sending '{}'", cmd);
    writeln!(stream, "{}", cmd)?;
    Ok(())
}
