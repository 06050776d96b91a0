use std::path::PathBuf;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::BufReader;
use tracing::debug;

use crate::cli::args::{CliArgs, Command, FieldArgs};
use crate::cli::validation;
use crate::client::{ClientOptions, InventoryClient};
use crate::config::{self, ConfigFile};
use crate::controller::{Action, Controller};
use crate::form::{self, Field, FormState};
use crate::output::{self, OutputFormat};
use crate::query::{self, SearchFilters};
use crate::shell;

const DEFAULT_BASE_URL: &str = "http://localhost:8080";
const DEFAULT_TIMEOUT_SECONDS: u64 = 30;

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn init_tracing(verbose: u8) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = match verbose {
        0 => "error",
        1 => "info",
        _ => "debug",
    };
    let directive = std::env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| format!("invctl={level}"));
    let _ = fmt()
        .with_env_filter(EnvFilter::new(directive))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    command: Command,
    client: ClientOptions,
    no_color: bool,
    force_color: bool,
    form_path: PathBuf,
    save_form: bool,
    output: Option<String>,
    output_format: Option<OutputFormat>,
    filters: SearchFilters,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let no_color = if args.color {
        false
    } else {
        args.no_color || cfg.no_color.unwrap_or(false)
    };

    let base_url = args
        .base_url
        .or(cfg.base_url)
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    reqwest::Url::parse(&base_url).map_err(|e| format!("invalid base url '{base_url}': {e}"))?;

    let timeout_seconds = args.timeout.or(cfg.timeout).unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let proxy = args.proxy.or(cfg.proxy).filter(|p| !p.trim().is_empty());
    let header = args.header.or(cfg.header).filter(|h| !h.trim().is_empty());

    let form_path = match args.form_file.or(cfg.form_file) {
        Some(p) => config::expand_tilde(&p),
        None => config::default_form_path()
            .ok_or_else(|| "cannot locate home directory, use --form".to_string())?,
    };

    let output = args
        .output
        .or(cfg.output)
        .map(|p| config::expand_tilde_string(&p));
    let output_format = match args.output_format.or(cfg.output_format) {
        Some(raw) => Some(
            OutputFormat::parse(&raw).ok_or_else(|| format!("invalid output format '{raw}'"))?,
        ),
        None => None,
    };

    let search_cfg = cfg.search.unwrap_or_default();
    let mut filters = SearchFilters::default();
    if let Some(raw) = args
        .search_fields
        .or_else(|| search_cfg.fields.map(|f| f.join(",")))
    {
        filters.fields = query::parse_search_fields_csv(&raw)
            .map_err(|e| format!("invalid search fields '{raw}': {e}"))?;
    }
    filters.legacy_name_filter =
        args.legacy_name_filter || search_cfg.legacy_name_filter.unwrap_or(false);

    Ok(RunConfig {
        command: args.command,
        client: ClientOptions {
            base_url,
            timeout_seconds,
            proxy,
            header,
        },
        no_color,
        force_color: args.color,
        form_path,
        save_form: !args.no_save,
        output,
        output_format,
        filters,
    })
}

fn apply_field_args(state: &mut FormState, fields: &FieldArgs) {
    for raw in fields.reset.iter() {
        if let Some(field) = Field::parse(raw) {
            state.fields.reset(field);
        }
    }
    for (field, value) in fields.overrides() {
        state.fields.set(field, value);
    }
}

fn command_action(command: &Command) -> Option<(Action, Option<&FieldArgs>)> {
    match command {
        Command::Create(f) => Some((Action::Create, Some(f))),
        Command::Update(f) => Some((Action::Update, Some(f))),
        Command::Restock(f) => Some((Action::Restock, Some(f))),
        Command::Retrieve(f) => Some((Action::Retrieve, Some(f))),
        Command::Delete(f) => Some((Action::Delete, Some(f))),
        Command::Search(f) => Some((Action::Search, Some(f))),
        Command::Clear => Some((Action::Clear, None)),
        Command::Show | Command::Health | Command::Shell | Command::Init => None,
    }
}

fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Dispatches one action and waits for its single response.
async fn run_action(client: &InventoryClient, controller: &mut Controller, action: Action) {
    let ticket = controller.dispatch(action);
    if let Some(request) = ticket.request.as_ref() {
        let pb = spinner(format!("{} {}", request.method, request.target()));
        let outcome = client.execute(request).await;
        pb.finish_and_clear();
        controller.complete(&ticket, &outcome);
    }
}

async fn write_results(run: &RunConfig, state: &FormState) -> Result<(), String> {
    let (Some(path), Some(results)) = (run.output.as_deref(), state.results.as_ref()) else {
        return Ok(());
    };
    let format = run
        .output_format
        .or_else(|| output::infer_format_from_path(path))
        .unwrap_or(OutputFormat::Text);
    tokio::fs::write(path, output::render(results, format))
        .await
        .map_err(|e| format!("failed to write output file '{path}': {e}"))?;
    format_kv_line("output", path);
    Ok(())
}

fn save_state(run: &RunConfig, state: &FormState) -> Result<(), String> {
    if !run.save_form {
        return Ok(());
    }
    form::save_form(&run.form_path, state).map_err(|e| e.to_string())?;
    debug!(path = %run.form_path.display(), "form saved");
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.force_color {
        colored::control::set_override(true);
    } else if run.no_color {
        colored::control::set_override(false);
    }

    let state = form::load_form(&run.form_path).map_err(|e| e.to_string())?;

    if let Command::Show = run.command {
        output::print_state(&state, true);
        return write_results(&run, &state).await;
    }

    let client = InventoryClient::new(&run.client).map_err(|e| e.to_string())?;

    match &run.command {
        Command::Health => {
            let status = client.health().await.map_err(|e| e.user_message())?;
            format_kv_line("service", client.base_url().as_str());
            format_kv_line("health", &status);
            Ok(())
        }
        Command::Shell => {
            let controller = Controller::new(state, run.filters.clone());
            let input = BufReader::new(tokio::io::stdin());
            let state = shell::run_session(input, client, controller, true).await?;
            save_state(&run, &state)?;
            write_results(&run, &state).await
        }
        command => {
            let Some((action, fields)) = command_action(command) else {
                return Err(format!("unsupported command {command:?}"));
            };
            let mut state = state;
            if let Some(fields) = fields {
                apply_field_args(&mut state, fields);
            }
            let mut controller = Controller::new(state, run.filters.clone());
            run_action(&client, &mut controller, action).await;

            let state = controller.into_state();
            output::print_state(&state, action == Action::Search);
            save_state(&run, &state)?;
            if action == Action::Search {
                write_results(&run, &state).await?;
            }
            Ok(())
        }
    }
}

fn init_config(args: &CliArgs) -> Result<(), String> {
    let path = match args.config.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => config::default_config_path()
            .ok_or_else(|| "cannot locate home directory, use --config".to_string())?,
    };
    let written = config::ensure_default_config_file(&path)?;
    let label = if written { "created" } else { "exists" };
    format_kv_line(label, &path.display().to_string());
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                print!("{e}");
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_tracing(args.verbose);

    if let Command::Init = args.command {
        return init_config(&args);
    }

    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
