use std::io::{self, Read};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use textmate_view::pager::Pager;
use textmate_view::primitives::grammar_registry::{resolve_language_token, Registry};
use textmate_view::processor::RenderBatches;
use textmate_view::view::ansi::write_lines;
use textmate_view::view::table::Table;
use textmate_view::view::text::StyledText;
use textmate_view::{HighlightedText, RenderConfig, TextMateProcessor, ThemeId, ThemeName};

#[derive(Debug, Parser)]
#[command(
    name = "tmview",
    version,
    about = "Syntax-highlight source files and render markdown in the terminal"
)]
struct Cli {
    /// File to render; reads stdin when absent or "-"
    path: Option<PathBuf>,

    /// Language id (rust, python, csharp...)
    #[arg(short, long, conflicts_with = "extension")]
    language: Option<String>,

    /// File extension used to pick the grammar (rs, .py...)
    #[arg(short, long)]
    extension: Option<String>,

    /// Built-in theme name
    #[arg(short, long, conflicts_with = "theme_file")]
    theme: Option<String>,

    /// Load a .tmTheme file
    #[arg(long)]
    theme_file: Option<PathBuf>,

    /// Show a line-number gutter
    #[arg(short = 'n', long)]
    line_numbers: bool,

    /// Wrap the output in a bordered panel
    #[arg(long)]
    panel: bool,

    /// Show the result in an interactive pager
    #[arg(short, long, conflicts_with = "batch_size")]
    pager: bool,

    /// Highlight markdown as plain lines instead of rendering it
    #[arg(long)]
    alternate: bool,

    /// Stream the input in batches of N lines (N defaults to the configured size)
    #[arg(long, value_name = "N")]
    batch_size: Option<Option<usize>>,

    /// Output width (default: terminal width, else 80)
    #[arg(short, long, value_name = "N")]
    width: Option<usize>,

    /// List the languages that can be highlighted and exit
    #[arg(long, conflicts_with = "check")]
    list_languages: bool,

    /// Print whether the language, extension or file is supported and exit
    #[arg(long)]
    check: bool,
}

impl Cli {
    /// The file to read, `None` for stdin
    fn input_path(&self) -> Option<&Path> {
        self.path.as_deref().filter(|p| *p != Path::new("-"))
    }
}

/// Log to stderr, and only when asked, so the pager screen stays clean
fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_none() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn resolve_theme(cli: &Cli, config: &RenderConfig) -> Result<ThemeId> {
    if let Some(path) = &cli.theme_file {
        return Ok(ThemeId::File(path.clone()));
    }
    match &cli.theme {
        Some(name) => ThemeName::from_name(name)
            .map(ThemeId::Builtin)
            .ok_or_else(|| {
                let known: Vec<&str> = ThemeName::ALL.iter().map(|t| t.as_str()).collect();
                anyhow!("unknown theme '{}' (known: {})", name, known.join(", "))
            }),
        None => Ok(ThemeId::from_config_name(&config.theme)),
    }
}

/// `(grammar id, is_extension)` from the flags or the input file name
fn resolve_grammar(cli: &Cli) -> Result<(String, bool)> {
    let registry = Registry::shared();
    if let Some(token) = cli.language.as_deref().or(cli.extension.as_deref()) {
        return resolve_language_token(&registry, token)
            .ok_or_else(|| anyhow!("empty language or extension"));
    }
    let extension = cli
        .input_path()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .context("cannot determine the language; pass --language or --extension")?;
    Ok((format!(".{}", extension), true))
}

fn read_lines(cli: &Cli) -> Result<Vec<String>> {
    let text = match cli.input_path() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };
    Ok(text.lines().map(str::to_string).collect())
}

fn list_languages(width: usize) -> Result<()> {
    let mut table = Table::new(vec!["Language".into(), "Id".into(), "Extensions".into()]);
    table.rows = Registry::shared()
        .languages()
        .into_iter()
        .map(|language| {
            vec![
                StyledText::plain(language.name),
                StyledText::plain(language.id.unwrap_or("")),
                StyledText::plain(language.extensions.join(", ")),
            ]
        })
        .collect();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_lines(&mut out, &table.render(width)).context("failed to write output")
}

/// Prints `true` or `false`; unsupported input exits with status 1
fn check_support(cli: &Cli) -> Result<()> {
    if let Some(path) = cli.input_path() {
        if !path.exists() {
            bail!("file not found: {}", path.display());
        }
    }
    let (grammar_id, is_extension) = resolve_grammar(cli)?;
    let supported = Registry::shared().supports(&grammar_id, is_extension);
    println!("{}", supported);
    if !supported {
        std::process::exit(1);
    }
    Ok(())
}

fn decorate(container: &mut HighlightedText, cli: &Cli, config: &RenderConfig) {
    container.show_line_numbers = cli.line_numbers;
    container.wrap_in_panel = cli.panel;
    container.gutter_separator = config.gutter_separator.clone();
}

fn stream(batches: RenderBatches<'_>, cli: &Cli, config: &RenderConfig, width: usize) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for batch in batches {
        let mut container = batch.context("rendering failed")?.into_container();
        decorate(&mut container, cli, config);
        container
            .write_ansi(&mut out, width)
            .context("failed to write output")?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let width = cli
        .width
        .or_else(|| crossterm::terminal::size().ok().map(|(w, _)| w as usize))
        .unwrap_or(80);
    if cli.list_languages {
        return list_languages(width);
    }
    if cli.check {
        return check_support(&cli);
    }

    let config = RenderConfig::load();
    let theme = resolve_theme(&cli, &config)?;
    let (grammar_id, is_extension) = resolve_grammar(&cli)?;
    tracing::debug!(
        "Rendering with grammar {} (extension: {}), theme {}",
        grammar_id,
        is_extension,
        theme
    );

    let mut processor = TextMateProcessor::new(config.clone());
    if let Some(dir) = cli.input_path().and_then(Path::parent) {
        processor = processor.with_base_dir(dir);
    }

    if let Some(batch_size) = cli.batch_size.map(|n| n.unwrap_or(config.batch_size)) {
        let batches = match cli.input_path() {
            Some(path) => processor
                .render_file_batched(path, batch_size, &theme, &grammar_id, is_extension)
                .with_context(|| format!("failed to render {}", path.display()))?,
            None => processor
                .render_reader_batched(
                    io::stdin().lock(),
                    batch_size,
                    &theme,
                    &grammar_id,
                    is_extension,
                )
                .context("failed to render stdin")?,
        };
        return stream(batches, &cli, &config, width);
    }

    let lines = read_lines(&cli)?;
    let Some(mut container) = processor
        .render_auto(&lines, &theme, &grammar_id, is_extension, cli.alternate)
        .context("rendering failed")?
    else {
        return Ok(());
    };
    decorate(&mut container, &cli, &config);

    if cli.pager {
        return Pager::new(&mut container)
            .with_config(&config)
            .show()
            .context("pager failed");
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    container
        .write_ansi(&mut out, width)
        .context("failed to write output")
}
