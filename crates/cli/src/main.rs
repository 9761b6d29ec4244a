use prompt_genius_core::{
    PromptGenius,
    capture::{CaptureDevice, ScreenSource},
    clipboard::{format_all_prompts, save_preview_as},
    config::Config,
    image_processing::{EncodedImage, ImageProcessor},
    init,
    model::{STYLE_CATALOG, StyleCategory},
    session::Session,
    state::{Event, ViewState},
};
use anyhow::{Context, Result, anyhow, bail};
use arboard::Clipboard;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use termimad::MadSkin;
use termimad::crossterm::style::Color;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Override the model defined in .env
    #[arg(short, long, global = true)]
    model: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the desktop app (default)
    Gui(DeviceArgs),
    /// Analyze a photo and print its description and styled prompts
    Analyze(AnalyzeArgs),
    /// List the style catalog and the categories
    Styles,
    /// List available monitors
    Monitors,
}

#[derive(Args, Debug, Default)]
struct DeviceArgs {
    /// Capture from this monitor
    #[arg(long)]
    monitor: Option<usize>,

    /// Capture from this camera instead of a monitor
    #[arg(long, num_args = 0..=1, default_missing_value = "0")]
    webcam: Option<u32>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Image file to analyze (png or jpeg); omit to capture instead
    image: Option<PathBuf>,

    #[command(flatten)]
    device: DeviceArgs,

    /// Art direction applied to every prompt
    #[arg(short, long, default_value = "general")]
    category: StyleCategory,

    /// Print the translated variant
    #[arg(short, long)]
    translate: bool,

    /// Print the raw result as JSON
    #[arg(long)]
    json: bool,

    /// Copy the formatted prompt list to the clipboard
    #[arg(long)]
    copy_all: bool,

    /// Render a preview for the N-th prompt (1-based)
    #[arg(short, long, value_name = "N")]
    generate: Option<usize>,

    /// Where to write the preview image
    #[arg(short, long, default_value = "promptgenius-masterpiece.png")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup
    init();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    // Load config and override model if specified via CLI
    let mut config = Config::load().context("Failed to load configuration")?;
    if let Some(m) = cli.model {
        config.model_name = m;
    }
    let app = PromptGenius::with_config(config);

    match cli.command.unwrap_or(Command::Gui(DeviceArgs::default())) {
        Command::Gui(device) => {
            app.run_interactive(device.open_device())?;
        }
        Command::Analyze(args) => analyze(&app, args).await?,
        Command::Styles => print_styles(),
        Command::Monitors => {
            println!("Available monitors:");
            for info in app
                .list_monitors()
                .context("Failed to initialize screen capturer")?
            {
                println!("{}", info);
            }
        }
    }

    Ok(())
}

impl DeviceArgs {
    fn open_device(&self) -> Box<dyn CaptureDevice> {
        #[cfg(feature = "webcam")]
        if let Some(index) = self.webcam {
            return Box::new(prompt_genius_core::capture::WebcamSource::new(index));
        }
        #[cfg(not(feature = "webcam"))]
        if self.webcam.is_some() {
            tracing::warn!("built without the `webcam` feature, capturing a monitor instead");
        }
        Box::new(ScreenSource::new(self.monitor.unwrap_or(0)))
    }
}

async fn analyze(app: &PromptGenius, args: AnalyzeArgs) -> Result<()> {
    let image = load_image(app, &args)?;
    let mut session = app
        .session(args.category)
        .context("Set GEMINI_API_KEY in the environment or a .env file")?;

    let spinner = spinner(format!(
        "Analyzing with {} ({})...",
        app.config().model_name,
        args.category
    ))?;
    session.handle(Event::ImageProvided(image)).await;
    spinner.finish_and_clear();
    fail_on_alert(&mut session)?;

    if args.translate {
        let spinner = self::spinner(format!("Translating to {}...", app.config().translation_language))?;
        session.handle(Event::ToggleTranslation).await;
        spinner.finish_and_clear();
        fail_on_alert(&mut session)?;
    }

    let state = session.state();
    let analysis = state
        .analysis
        .as_ref()
        .ok_or_else(|| anyhow!("The analysis returned no result"))?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
    } else {
        print_markdown(&render_result(state));
    }

    // Copy to clipboard if requested
    if args.copy_all {
        let text = format_all_prompts(analysis, state.showing_translation());
        match Clipboard::new() {
            Ok(mut clipboard) => {
                if let Err(e) = clipboard.set_text(text) {
                    eprintln!("Warning: Failed to copy to clipboard: {}", e);
                } else {
                    eprintln!("(Copied {} prompts to clipboard)", analysis.prompts.len());
                }
            }
            Err(e) => eprintln!("Warning: Could not access clipboard: {}", e),
        }
    }

    if let Some(n) = args.generate {
        let prompt = n
            .checked_sub(1)
            .and_then(|i| analysis.prompts.get(i))
            .ok_or_else(|| anyhow!("No prompt #{} (have {})", n, analysis.prompts.len()))?;
        let request = state
            .preview_request(&prompt.style)
            .ok_or_else(|| anyhow!("No prompt for {}", prompt.style))?;

        let spinner = self::spinner(format!("Generating a preview for {}...", prompt.style))?;
        session.handle(request).await;
        spinner.finish_and_clear();
        fail_on_alert(&mut session)?;

        let image = session
            .state()
            .generated_image
            .as_ref()
            .ok_or_else(|| anyhow!("No preview was generated"))?;
        let path = save_preview_as(image, &args.output)
            .with_context(|| format!("Failed to write {}", args.output.display()))?;
        println!("Preview saved to {}", path.display());
    }

    Ok(())
}

fn load_image(app: &PromptGenius, args: &AnalyzeArgs) -> Result<EncodedImage> {
    match &args.image {
        Some(path) => ImageProcessor::load_file(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => app
            .capture(args.device.open_device().as_ref())
            .context("Failed to capture. Try `prompt-genius monitors` to check indices"),
    }
}

fn fail_on_alert(session: &mut Session) -> Result<()> {
    match session.take_alerts().pop() {
        Some(message) => bail!(message),
        None => Ok(()),
    }
}

fn spinner(message: String) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
            .template("{spinner:.green} {msg}")?,
    );
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

/// Markdown view of the displayed language variant.
fn render_result(state: &ViewState) -> String {
    let Some(analysis) = &state.analysis else {
        return String::new();
    };
    let translated = state.showing_translation();

    let mut out = String::from("# Detailed context\n\n");
    out.push_str(&format!("*{}*\n\n", analysis.description_text(translated)));
    for (i, prompt) in analysis.prompts.iter().enumerate() {
        out.push_str(&format!("## {}. {}\n\n", i + 1, prompt.style));
        out.push_str(&format!("> {}\n\n", prompt.description_text(translated)));
        out.push_str(&format!("```\n{}\n```\n\n", prompt.prompt_text(translated)));
    }
    out
}

fn print_styles() {
    println!("Categories:");
    for category in StyleCategory::ALL {
        println!("  {}", category.label());
    }
    println!("\nStyles:");
    for (i, style) in STYLE_CATALOG.iter().enumerate() {
        println!("  {:>2}. {}", i + 1, style);
    }
}

/// Helper to print markdown
fn print_markdown(text: &str) {
    let mut skin = MadSkin::default();
    skin.bold.set_fg(Color::Yellow);
    skin.italic.set_fg(Color::Magenta);
    skin.code_block.set_bg(Color::Rgb { r: 40, g: 40, b: 40 });

    skin.print_text(text);
}
