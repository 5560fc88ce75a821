use std::fs;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;

use anyhow::Context;
use clap::Parser;
use echoscape_core::{
    AnalysisResult, ExtractionResult, Pipeline, PipelineConfig, PipelineConfigBuilder, SharedAnalyzer, fetch_file,
    fetch_stdin,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Output format for extracted articles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Invalid format: {}. Valid options: text, json", s)),
        }
    }
}

/// Extract the article text, metadata and sentiment from news pages
#[derive(Parser, Debug)]
#[command(name = "echoscape")]
#[command(author = "Echoscape Contributors")]
#[command(version)]
#[command(about = "Extract article text and metadata from news pages", long_about = None)]
struct Args {
    /// URL to fetch, local HTML file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output file (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text", value_name = "FORMAT")]
    format: OutputFormat,

    /// Run sentiment, keyword and category analysis on the body
    #[arg(short, long)]
    analyze: bool,

    /// Never fall back to headless browser rendering
    #[arg(long)]
    no_render: bool,

    /// Minimum body length in characters
    #[arg(long, value_name = "NUM")]
    min_length: Option<usize>,

    /// HTTP timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Configuration file (default: <config dir>/echoscape/config.toml)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn is_url(&self) -> bool {
        self.input.starts_with("http://") || self.input.starts_with("https://")
    }

    /// Command-line flags override the configuration file.
    fn pipeline_config(&self) -> anyhow::Result<PipelineConfig> {
        let base = PipelineConfig::load_or_default(self.config.as_deref()).context("Failed to load configuration")?;
        let mut builder = PipelineConfigBuilder::from_config(base);

        if let Some(min_length) = self.min_length {
            builder = builder.min_length(min_length);
        }
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(user_agent) = &self.user_agent {
            builder = builder.user_agent(user_agent.clone());
        }
        if self.no_render {
            builder = builder.render_fallback(false);
        }

        Ok(builder.build())
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "echoscape_core=debug,echoscape=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn render_text(result: &ExtractionResult, analysis: Option<&AnalysisResult>) -> String {
    let mut out = String::new();

    out.push_str(&format!("Title: {}\n", result.title));
    out.push_str(&format!("Author: {}\n", result.author_or_sentinel()));
    if let Some(date) = &result.publish_date {
        out.push_str(&format!("Published: {}\n", date));
    }
    if let Some(source) = &result.source {
        out.push_str(&format!("Source: {}\n", source));
    }
    if let Some(url) = &result.url {
        out.push_str(&format!("URL: {}\n", url));
    }
    out.push_str(&format!("Strategy: {}\n", result.extraction_strategy));

    if let Some(analysis) = analysis {
        out.push_str(&format!("Sentiment: {:.3}\n", analysis.sentiment_score));
        out.push_str(&format!("Category: {}\n", analysis.category));
        out.push_str(&format!("Keywords: {}\n", analysis.keywords.join(", ")));
    }

    if result.has_body() {
        out.push('\n');
        out.push_str(&result.body_text);
        out.push('\n');
    }

    out
}

fn render_json(result: &ExtractionResult, analysis: Option<&AnalysisResult>) -> anyhow::Result<String> {
    let value = serde_json::json!({ "extraction": result, "analysis": analysis });
    let mut json = serde_json::to_string_pretty(&value).context("Failed to serialize result")?;
    json.push('\n');
    Ok(json)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let total_steps = if args.analyze { 4 } else { 3 };
    let mut timings = Vec::new();
    let started = Instant::now();

    if args.verbose {
        echo::print_banner();
        echo::print_step(1, total_steps, "Loading configuration");
    }

    let config = args.pipeline_config()?;
    let analysis_config = config.analysis.clone();

    if args.verbose {
        if let Some(path) = args.config.clone().or_else(PipelineConfig::default_path) {
            eprintln!("  {} {}", "Config:".dimmed(), path.display().bright_white());
        }
        eprintln!("  {} {}", "Min length:".dimmed(), config.min_length().to_string().bright_white());
        eprintln!();
    }

    let pipeline = Pipeline::with_config(config).context("Failed to build extraction pipeline")?;
    tracing::debug!(input = %args.input, analyze = args.analyze, "starting extraction");

    let stage = Instant::now();
    let result = if args.is_url() {
        if args.verbose {
            echo::print_step(2, total_steps, &format!("Fetching {}", args.input.bright_white().underline()));
        }
        pipeline.extract_from_url(&args.input).await
    } else {
        let html = if args.input == "-" {
            if args.verbose {
                echo::print_step(2, total_steps, "Reading from stdin");
            }
            fetch_stdin().context("Failed to read from stdin")?
        } else {
            if args.verbose {
                echo::print_step(2, total_steps, &format!("Reading from file {}", args.input.bright_white()));
            }
            fetch_file(&args.input).with_context(|| format!("Failed to read file: {}", args.input))?
        };
        pipeline.extract_from_html(&html, None)
    };

    let result = match result {
        Ok(result) => result,
        Err(e) if e.is_blocked() => {
            echo::print_error("The site blocked automated access");
            return Err(e).context("Failed to extract article");
        }
        Err(e) => return Err(e).context("Failed to extract article"),
    };
    timings.push(("Extraction".to_string(), stage.elapsed()));

    if args.verbose {
        echo::print_extraction_details(&result);
    }
    if !result.has_body() {
        echo::print_warning("No article body found");
    }

    let analysis = if args.analyze {
        if args.verbose {
            echo::print_step(3, total_steps, "Analyzing article");
        }
        let stage = Instant::now();
        let analyzer = SharedAnalyzer::new(analysis_config);
        let analysis = analyzer.analyze_or_neutral(&result.body_text).await;
        timings.push(("Analysis".to_string(), stage.elapsed()));
        Some(analysis)
    } else {
        None
    };

    let output = match args.format {
        OutputFormat::Text => render_text(&result, analysis.as_ref()),
        OutputFormat::Json => render_json(&result, analysis.as_ref())?,
    };

    if args.verbose {
        echo::print_step(total_steps, total_steps, "Writing output");
        eprintln!("  {} {}", "Format:".dimmed(), format!("{:?}", args.format).bright_white());
        eprintln!();
        echo::print_timing_summary(started.elapsed(), &timings);
    }

    match args.output {
        Some(path) => {
            fs::write(&path, &output).with_context(|| format!("Failed to write to file: {}", path.display()))?;
            echo::print_success(&format!(
                "Output written to {} ({})",
                path.display().bright_white(),
                echo::format_size(output.len())
            ));
        }
        None => {
            print!("{}", output);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use echoscape_core::{Category, ExtractionStrategy, Metadata};

    use super::*;

    fn sample() -> ExtractionResult {
        let metadata = Metadata { title: "Budget passes".to_string(), ..Default::default() };
        ExtractionResult::new(
            Some("https://www.example.com/budget".to_string()),
            metadata,
            "First paragraph.\n\nSecond paragraph.".to_string(),
            ExtractionStrategy::KnownSelector,
        )
    }

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("TXT".parse::<OutputFormat>(), Ok(OutputFormat::Text));
        assert_eq!("json".parse::<OutputFormat>(), Ok(OutputFormat::Json));
        assert!("markdown".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample(), None);
        assert!(text.starts_with("Title: Budget passes\nAuthor: No Author Found\n"));
        assert!(text.contains("Source: example.com\n"));
        assert!(text.contains("Strategy: known_selector\n"));
        assert!(text.ends_with("\n\nFirst paragraph.\n\nSecond paragraph.\n"));
    }

    #[test]
    fn test_render_text_with_analysis() {
        let analysis = AnalysisResult::new(0.5, vec!["budget".to_string()], Category::Politics, 10);
        let text = render_text(&sample(), Some(&analysis));
        assert!(text.contains("Sentiment: 0.500\n"));
        assert!(text.contains("Category: Politics\n"));
        assert!(text.contains("Keywords: budget\n"));
    }

    #[test]
    fn test_render_json() {
        let json = render_json(&sample(), None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["extraction"]["title"], "Budget passes");
        assert_eq!(value["extraction"]["extraction_strategy"], "known_selector");
        assert!(value["analysis"].is_null());
    }
}
