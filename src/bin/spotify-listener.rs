use std::path::PathBuf;
use std::process;

use clap::Parser;

use spotifyctl::{Listener, PolybarIpc, Spotify, DEFAULT_IPC_DIRECTORY};

/// Watch Spotify over D-Bus and update polybar modules through IPC hooks
#[derive(Parser)]
#[command(name = "spotify-listener", version)]
struct Cli {
    /// Log every signal received
    #[arg(short, long)]
    verbose: bool,

    /// Directory holding polybar's message queues
    #[arg(long, value_name = "DIR", default_value = DEFAULT_IPC_DIRECTORY)]
    ipc_dir: PathBuf,
}

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        },
    );
    clog.init();

    let spotify = match Spotify::new() {
        Ok(spotify) => spotify,
        Err(error) => {
            log::error!("{}", error);
            process::exit(1);
        }
    };

    let ipc = PolybarIpc::new(cli.ipc_dir);

    if let Err(error) = Listener::new().run(&spotify, &ipc) {
        log::error!("{}", error);
        process::exit(1);
    }
}
