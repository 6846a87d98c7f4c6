use std::num::NonZeroUsize;
use std::process;

use clap::{Parser, Subcommand};

use spotifyctl::{
    extract_artist, extract_title, format, Command, FormatConfig, FormatError, Spotify,
    TransportError, DEFAULT_FORMAT, DEFAULT_TRUNCATION_MARKER,
};

const EXAMPLES: &str = "\
Examples:
  spotifyctl status --format '%artist%: %title%' \\
      --max-length 30 --max-artist-length 10 \\
      --max-title-length 20 --trunc '...'
  If the artist name is 'Eminem' and the track title is 'Sing For The Moment',
  the output will be:
  Eminem: Sing For The Moment
  since the total length is less than 30 characters.

  spotifyctl status --format '%artist%: %title%' \\
      --max-length 20 --max-artist-length 10 \\
      --max-title-length 10 --trunc '...'
  With the same track, the output will be:
  Eminem: Sing Fo...
  since the total length is more than 20 characters, so the title is
  truncated to 10 characters.

  spotifyctl status --format '%artist%: %title%' \\
      --max-title-length 13 --trunc '...'
  With the same track, the output will be:
  Eminem: Sing For T...
  since without --max-length the artist and title limits always apply.";

#[derive(Parser)]
#[command(
    name = "spotifyctl",
    version,
    about = "Control Spotify and show what it is playing",
    after_help = EXAMPLES
)]
struct Cli {
    /// Hide errors caused by Spotify not running
    #[arg(short = 'q', global = true)]
    quiet: bool,

    /// Log what is sent over D-Bus
    #[arg(short, long, global = true)]
    verbose: bool,

    /// The maximum length of the artist name to show. If --max-length is given, this only
    /// restricts the artist when the output is longer than --max-length [default: no limit]
    #[arg(long, value_name = "N", global = true)]
    max_artist_length: Option<NonZeroUsize>,

    /// The maximum length of the track title to show. If --max-length is given, this only
    /// restricts the title when the output is longer than --max-length [default: no limit]
    #[arg(long, value_name = "N", global = true)]
    max_title_length: Option<NonZeroUsize>,

    /// The maximum length of the status output. Works best as the sum of the max artist and max
    /// title length if those are given [default: no limit]
    #[arg(long, value_name = "N", global = true)]
    max_length: Option<NonZeroUsize>,

    /// The format to show the status in. The %artist% and %title% tokens are replaced by the
    /// artist name and track title
    #[arg(long, value_name = "FORMAT", default_value = DEFAULT_FORMAT, global = true)]
    format: String,

    /// Shows that the artist name, track title, or output was cut short. Counts towards the max
    /// lengths and may be empty
    #[arg(
        long,
        value_name = "STRING",
        default_value = DEFAULT_TRUNCATION_MARKER,
        allow_hyphen_values = true,
        global = true
    )]
    trunc: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the artist name and title of the current track
    Status,
    /// Play Spotify
    Play,
    /// Pause Spotify
    Pause,
    /// Toggle between playing and paused
    #[command(name = "playpause")]
    PlayPause,
    /// Go to the next track
    Next,
    /// Go to the previous track
    Previous,
}

impl Cli {
    fn format_config(&self) -> FormatConfig {
        FormatConfig {
            max_artist_length: self.max_artist_length,
            max_title_length: self.max_title_length,
            max_length: self.max_length,
            format: self.format.clone(),
            trunc: self.trunc.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Format(#[from] FormatError),
}

impl Error {
    /// Spotify not running is expected in a status bar and hidden by `-q`. Anything else is
    /// always shown.
    fn is_suppressed_by(&self, quiet: bool) -> bool {
        match self {
            Error::Transport(error) => quiet && error.is_player_not_running(),
            Error::Format(_) => false,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let mut clog = colog::default_builder();
    clog.filter(
        None,
        if cli.verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Warn
        },
    );
    clog.init();

    if let Err(error) = run(&cli) {
        if !error.is_suppressed_by(cli.quiet) {
            log::error!("{}", error);
        }
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Error> {
    let spotify = Spotify::new()?;

    let command = match cli.command {
        Commands::Status => return status(&spotify, &cli.format_config()),
        Commands::Play => Command::Play,
        Commands::Pause => Command::Pause,
        Commands::PlayPause => Command::PlayPause,
        Commands::Next => Command::Next,
        Commands::Previous => Command::Previous,
    };

    spotify.send_command(command)?;
    Ok(())
}

fn status(spotify: &Spotify, config: &FormatConfig) -> Result<(), Error> {
    let reply = spotify.query_metadata()?;

    let title = extract_title(&reply);
    let artist = extract_artist(&reply);
    log::debug!("artist: {:?}, title: {:?}", artist, title);

    let output = format(artist.as_deref(), title.as_deref(), config)?;
    println!("{}", output);

    Ok(())
}
