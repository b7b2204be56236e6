// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod config;
mod logging;
mod runtime;

use anyhow::{Context, Result};
use basecoat_app::AppState;
use basecoat_client::Client;
use basecoat_tui::{AppRuntime, TuiOptions};
use config::Config;
use runtime::{DemoRuntime, HttpRuntime};
use std::env;
use std::path::PathBuf;

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let options = parse_cli_args(env::args().skip(1), Config::default_path()?)?;
    if options.show_help {
        print_help();
        return Ok(());
    }

    if options.print_config_path {
        println!("{}", options.config_path.display());
        return Ok(());
    }

    if options.print_example {
        print!("{}", Config::example_config(&options.config_path));
        return Ok(());
    }

    let config = Config::load(&options.config_path).with_context(|| {
        format!(
            "load config {}; run `basecoat --print-example-config` to generate a template",
            options.config_path.display()
        )
    })?;
    let tui_options = TuiOptions {
        debounce: config.search_debounce()?,
    };

    if options.demo {
        let mut runtime = DemoRuntime::new();
        return launch(&config, &options, &mut runtime, tui_options);
    }

    let base_url = options
        .server
        .clone()
        .unwrap_or_else(|| config.server_base_url());
    let client = Client::new(&base_url, config.server_timeout()?).with_context(|| {
        format!(
            "invalid [server] config in {}; fix base_url/timeout or pass --server",
            options.config_path.display()
        )
    })?;
    let mut runtime = HttpRuntime::new(client);
    launch(&config, &options, &mut runtime, tui_options)
}

fn launch<R: AppRuntime>(
    config: &Config,
    options: &CliOptions,
    runtime: &mut R,
    tui_options: TuiOptions,
) -> Result<()> {
    if options.check_only {
        let catalog = runtime
            .load_catalog()
            .context("load formula listing for --check")?;
        println!(
            "ok: {} formulas, {} columns",
            catalog.rows.len(),
            catalog.columns.len()
        );
        return Ok(());
    }

    let log_path = logging::init(config)?;
    tracing::info!(
        log = %log_path.display(),
        config = %options.config_path.display(),
        demo = options.demo,
        "basecoat starting"
    );

    let mut state = AppState::default();
    basecoat_tui::run_app(&mut state, runtime, tui_options)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct CliOptions {
    config_path: PathBuf,
    server: Option<String>,
    print_config_path: bool,
    demo: bool,
    print_example: bool,
    check_only: bool,
    show_help: bool,
}

fn parse_cli_args<I, S>(args: I, default_config_path: PathBuf) -> Result<CliOptions>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut options = CliOptions {
        config_path: default_config_path,
        server: None,
        print_config_path: false,
        demo: false,
        print_example: false,
        check_only: false,
        show_help: false,
    };

    let mut iter = args.into_iter();
    while let Some(arg) = iter.next() {
        match arg.as_ref() {
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a file path"))?;
                options.config_path = PathBuf::from(value.as_ref());
            }
            "--server" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--server requires a base URL"))?;
                options.server = Some(value.as_ref().to_owned());
            }
            "--print-config-path" => {
                options.print_config_path = true;
            }
            "--print-example-config" => {
                options.print_example = true;
            }
            "--demo" => {
                options.demo = true;
            }
            "--check" => {
                options.check_only = true;
            }
            "--help" | "-h" => {
                options.show_help = true;
            }
            unknown => {
                return Err(anyhow::anyhow!(
                    "unknown argument {unknown:?}; run with --help to see supported options"
                ));
            }
        }
    }

    Ok(options)
}

fn print_help() {
    println!("basecoat");
    println!("  --config <path>          Use a specific config path");
    println!("  --server <url>           Formula server base URL (overrides config)");
    println!("  --print-config-path      Print resolved config path");
    println!("  --print-example-config   Print a config template");
    println!("  --demo                   Browse a seeded in-memory catalog, no server");
    println!("  --check                  Validate config and fetch the listing, then exit");
    println!("  --help                   Show this help");
}
