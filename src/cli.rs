// SPDX-FileCopyrightText: 2026 Sephyi <me@sephy.io>
// SPDX-License-Identifier: GPL-3.0-only

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "deepwalker")]
#[command(version)]
#[command(about = "Security triage of a source tree with a hosted LLM", long_about = None)]
#[command(subcommand_negates_reqs = true)]
#[command(group(clap::ArgGroup::new("prompt").multiple(false)))]
pub struct Cli {
    /// Directory to analyze
    #[arg(required = true)]
    pub root: Option<PathBuf>,

    /// System prompt: a file path if it exists, otherwise the literal text
    #[arg(short = 's', long, group = "prompt")]
    pub system_prompt: Option<String>,

    /// Read the system prompt from this file (error if missing)
    #[arg(long, value_name = "PATH", group = "prompt")]
    pub system_prompt_file: Option<PathBuf>,

    /// Use this text as the system prompt, never as a path
    #[arg(long, value_name = "TEXT", group = "prompt")]
    pub system_prompt_text: Option<String>,

    /// File extensions to analyze, without the dot (repeatable)
    #[arg(short = 'e', long = "ext", value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,

    /// LLM provider (anthropic, openai, ollama)
    #[arg(short, long, env = "DEEPWALKER_PROVIDER")]
    pub provider: Option<String>,

    /// Model name
    #[arg(short, long, env = "DEEPWALKER_MODEL")]
    pub model: Option<String>,

    /// Report destination ("-" for stdout)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Only look at files directly inside the root directory
    #[arg(long)]
    pub no_recursive: bool,

    /// Glob pattern (relative to the root) of files to leave out (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Skip files larger than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub max_file_bytes: Option<u64>,

    /// Do not send files that appear to contain secrets
    #[arg(long)]
    pub skip_secrets: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Initialize config file
    Init,
    /// Show current configuration
    Config,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: clap_complete::Shell,
    },
}
