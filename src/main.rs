use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    sync::{Arc, Mutex},
    time::Duration,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use typewell::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    difficulty::Difficulty,
    loader::TextLoader,
    runtime::{CrosstermEventSource, FixedTicker, Runner},
    word_source::{GeminiWordSource, LocalWordSource, WordSource},
};

const TICK_RATE_MS: u64 = 100;

/// terminal typing practice with generated text
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type generated paragraphs in the terminal and watch your words per minute and accuracy update with every keystroke."
)]
pub struct Cli {
    /// difficulty of the generated text
    #[clap(short = 'd', long, value_enum)]
    difficulty: Option<Difficulty>,

    /// API key for the generative word source
    #[clap(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// model used to generate text
    #[clap(long)]
    model: Option<String>,

    /// seconds to wait for generated text before giving up
    #[clap(long)]
    timeout_secs: Option<u64>,

    /// use the built-in word lists instead of the generative source
    #[clap(long, conflicts_with = "online")]
    offline: bool,

    /// use the generative source even if offline mode was saved as default
    #[clap(long)]
    online: bool,

    /// number of words per text in offline mode
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// custom prompt to use
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// persist the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line flags win over the config file.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(difficulty) = self.difficulty {
            config.difficulty = difficulty;
        }
        if let Some(ref api_key) = self.api_key {
            config.api_key = Some(api_key.clone());
        }
        if let Some(ref model) = self.model {
            config.model = model.clone();
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.timeout_secs = timeout_secs;
        }
        if let Some(number_of_words) = self.number_of_words {
            config.number_of_words = number_of_words;
        }
        if self.offline {
            config.offline = true;
        } else if self.online {
            config.offline = false;
        }
        config
    }
}

fn init_logging() -> Result<(), Box<dyn Error>> {
    let Some(log_path) = AppDirs::log_path() else {
        return Ok(());
    };
    if let Some(parent) = log_path.parent() {
        fs::create_dir_all(parent)?;
    }
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    // the terminal belongs to the UI, so logs go to a file
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("TYPEWELL_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    Ok(())
}

fn build_app(cli: &Cli, config: &Config) -> Result<App, Box<dyn Error>> {
    if let Some(ref prompt) = cli.prompt {
        return Ok(App::with_prompt(prompt, config.difficulty));
    }

    let source: Arc<dyn WordSource> = if config.use_offline_source() {
        tracing::info!("using offline word lists");
        Arc::new(LocalWordSource::new(config.number_of_words))
    } else {
        tracing::info!(model = %config.model, "using generative word source");
        Arc::new(GeminiWordSource::new(config.gemini())?)
    };

    let loader = TextLoader::new(source, config.timeout());
    Ok(App::new(loader, config.difficulty))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging()?;

    let store = FileConfigStore::new();
    let config = cli.apply_to(store.load());
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "saved config");
    }

    let mut app = build_app(&cli, &config)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    runner.run(app, |app| {
        terminal
            .draw(|f| f.render_widget(app, f.area()))
            .map(|_| ())
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::parse_from(std::iter::once("typewell").chain(args.iter().copied()))
    }

    fn saved_config() -> Config {
        Config {
            difficulty: Difficulty::Medium,
            model: "saved-model".to_string(),
            timeout_secs: 7,
            offline: true,
            number_of_words: 40,
            ..Config::default()
        }
    }

    #[test]
    fn test_flags_override_file_values() {
        let config = cli(&[
            "-d",
            "death",
            "--model",
            "flag-model",
            "--timeout-secs",
            "3",
            "-w",
            "10",
            "--api-key",
            "flag-key",
        ])
        .apply_to(saved_config());

        assert_eq!(config.difficulty, Difficulty::Death);
        assert_eq!(config.model, "flag-model");
        assert_eq!(config.timeout_secs, 3);
        assert_eq!(config.number_of_words, 10);
        assert_eq!(config.api_key.as_deref(), Some("flag-key"));
    }

    #[test]
    fn test_file_values_kept_without_flags() {
        let config = cli(&[]).apply_to(saved_config());

        assert_eq!(config.difficulty, Difficulty::Medium);
        assert_eq!(config.model, "saved-model");
        assert_eq!(config.timeout_secs, 7);
        assert_eq!(config.number_of_words, 40);
        assert!(config.offline);
    }

    #[test]
    fn test_online_flag_undoes_saved_offline() {
        let config = cli(&["--online"]).apply_to(saved_config());
        assert!(!config.offline);

        let config = cli(&["--offline"]).apply_to(Config::default());
        assert!(config.offline);
    }

    #[test]
    fn test_offline_and_online_conflict() {
        let result = Cli::try_parse_from(["typewell", "--offline", "--online"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_saved_config_never_contains_api_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileConfigStore::with_path(dir.path().join("config.json"));
        let config = cli(&["-d", "hard", "--api-key", "do-not-persist"]).apply_to(store.load());

        store.save(&config).unwrap();

        let written = fs::read_to_string(store.path()).unwrap();
        assert!(!written.contains("do-not-persist"));
        assert_eq!(store.load().difficulty, Difficulty::Hard);
    }
}
