// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
//
// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0

use std::path::Path;
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::cli::{Cli, Commands};
use crate::config::Config;
use crate::domain::PromptSource;
use crate::error::{Error, Result};
use crate::services::llm;
use crate::services::orchestrator::{Orchestrator, RunSettings};

pub struct App {
    cli: Cli,
    config: Config,
    cancel_token: CancellationToken,
}

impl App {
    pub fn new(cli: Cli) -> Result<Self> {
        let config = Config::load(&cli)?;
        debug!(
            provider = %config.provider,
            model = %config.model(),
            extensions = ?config.extensions,
            "config loaded"
        );
        Ok(Self {
            cli,
            config,
            cancel_token: CancellationToken::new(),
        })
    }

    pub async fn run(&mut self) -> Result<()> {
        // Ctrl+C cancels the in-flight request; remaining files are skipped
        let cancel = self.cancel_token.clone();
        tokio::spawn(async move {
            signal::ctrl_c().await.ok();
            cancel.cancel();
        });

        if let Some(ref cmd) = self.cli.command {
            return self.handle_command(cmd);
        }

        self.analyze().await
    }

    async fn analyze(&self) -> Result<()> {
        let Some(ref root) = self.cli.root else {
            return Err(Error::Config("missing root directory argument".into()));
        };

        // The transport refuses to start without a credential
        let client = llm::create_client(&self.config)?;

        self.print_status(&format!(
            "Analyzing {} with {} ({})",
            style(root.display()).bold(),
            self.config.provider,
            self.config.model()
        ));

        let settings = RunSettings::from_config(root, &self.config);
        let mut orchestrator = Orchestrator::new(client.as_ref(), settings)
            .with_cancel(self.cancel_token.clone())
            .with_progress(Self::progress_bar());

        let report = orchestrator.run().await?;

        if report.is_empty() {
            self.print_warning(&format!(
                "No files with extension {} found",
                self.config.extensions.join(", ")
            ));
        }

        report.write_to(&self.config.output)?;
        if self.config.output != Path::new("-") {
            self.print_info(&format!(
                "Report saved to {}",
                style(self.config.output.display()).bold()
            ));
        }

        eprintln!("\n{}", report.summary_box());

        if self.cancel_token.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(())
    }

    fn handle_command(&self, cmd: &Commands) -> Result<()> {
        match cmd {
            Commands::Init => {
                let path = Config::create_default()?;
                println!("Created config: {}", path.display());
                Ok(())
            }
            Commands::Config => {
                println!("Provider: {}", self.config.provider);
                println!("Model: {}", self.config.model());
                println!(
                    "API key: {}",
                    if self.config.api_key.is_some() {
                        "configured"
                    } else {
                        "not set"
                    }
                );
                println!("Extensions: {}", self.config.extensions.join(", "));
                println!("Recursive: {}", self.config.recursive);
                if !self.config.exclude.is_empty() {
                    println!("Exclude: {}", self.config.exclude.join(", "));
                }
                println!("Max file bytes: {}", self.config.max_file_bytes);
                println!("Skip secrets: {}", self.config.skip_secrets);
                println!("System prompt: {}", describe_prompt(&self.config.prompt_source()));
                println!("Output: {}", self.config.output.display());
                println!("Timeout: {}s", self.config.timeout_secs);
                println!("Temperature: {}", self.config.temperature);
                println!("Max tokens: {}", self.config.max_tokens);
                if let Some(ref path) = Config::config_path() {
                    let status = if path.exists() { "found" } else { "not found" };
                    println!("Config file: {} ({})", path.display(), status);
                }
                Ok(())
            }
            Commands::Completions { shell } => {
                let mut cmd = <Cli as clap::CommandFactory>::command();
                clap_complete::generate(*shell, &mut cmd, "deepwalker", &mut std::io::stdout());
                Ok(())
            }
        }
    }

    fn progress_bar() -> ProgressBar {
        let bar = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr());
        if let Ok(template) =
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {wide_msg:.dim}")
        {
            bar.set_style(template);
        }
        bar.enable_steady_tick(Duration::from_millis(120));
        bar
    }

    // ─── Output Helpers ───

    fn print_status(&self, msg: &str) {
        eprintln!("{} {}", style("→").cyan(), msg);
    }

    fn print_info(&self, msg: &str) {
        eprintln!("{} {}", style("info:").cyan(), msg);
    }

    fn print_warning(&self, msg: &str) {
        eprintln!("{} {}", style("warning:").yellow().bold(), msg);
    }
}

fn describe_prompt(source: &PromptSource) -> String {
    match source {
        PromptSource::Auto(value) => format!("{value} (file if present, else literal)"),
        PromptSource::File(path) => format!("{} (file)", path.display()),
        PromptSource::Literal(text) => format!("literal ({} chars)", text.chars().count()),
        PromptSource::Default => format!(
            "{} if present, else built-in",
            crate::services::prompt::DEFAULT_PROMPT_FILE
        ),
    }
}
