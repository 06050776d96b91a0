use clap::{ArgAction, Args, Parser, Subcommand};

use crate::form::Field;

#[derive(Parser, Debug, Clone)]
#[command(
    name = "invctl",
    version,
    about = "form-driven client for the inventory REST API",
    long_about = "invctl keeps an inventory form between invocations and drives the inventory REST API from it.\n\nExamples:\n  invctl retrieve --id 42\n  invctl update --quantity 15 --condition USED\n  invctl search --name bolt -o results.html\n  invctl -u http://inventory.local:8080 shell\n\nTip: Use --config to persist the service URL and search filters."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        global = true,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'c',
        long = "color",
        global = true,
        help_heading = "Output",
        help = "Enable colored output (overrides --no-color)."
    )]
    pub color: bool,

    #[arg(
        short = 'n',
        long = "no-color",
        visible_alias = "nc",
        global = true,
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "output",
        visible_alias = "out",
        value_name = "FILE",
        global = true,
        help_heading = "Output",
        help = "Write search results to a file."
    )]
    pub output: Option<String>,

    #[arg(
        short = 'A',
        long = "output-format",
        visible_alias = "of",
        value_name = "FORMAT",
        global = true,
        help_heading = "Output",
        help = "Results file format (text, json, xml, html)."
    )]
    pub output_format: Option<String>,

    #[arg(
        short = 'C',
        long = "config",
        visible_alias = "cfg",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Path to config file (defaults to ~/.invctl/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        short = 'F',
        long = "form",
        visible_alias = "form-file",
        value_name = "FILE",
        global = true,
        help_heading = "Input",
        help = "Form state file (defaults to ~/.invctl/form.yml)."
    )]
    pub form_file: Option<String>,

    #[arg(
        long = "no-save",
        global = true,
        help_heading = "Input",
        help = "Do not write the resulting form back to the form file."
    )]
    pub no_save: bool,

    #[arg(
        short = 'u',
        long = "url",
        visible_alias = "base-url",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "Base URL of the inventory service."
    )]
    pub base_url: Option<String>,

    #[arg(
        short = 'T',
        long = "timeout",
        visible_alias = "to",
        value_name = "SECONDS",
        global = true,
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "proxy",
        visible_alias = "px",
        value_name = "URL",
        global = true,
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'H',
        long = "header",
        visible_alias = "hdr",
        value_name = "HEADER",
        global = true,
        help_heading = "HTTP",
        help = "Add a header to all requests (format: 'Key: Value')."
    )]
    pub header: Option<String>,

    #[arg(
        long = "search-fields",
        visible_alias = "sf",
        value_name = "FIELDS",
        global = true,
        help_heading = "Search",
        help = "Comma-separated form fields used as search filters (default: id,name,quantity,condition)."
    )]
    pub search_fields: Option<String>,

    #[arg(
        long = "legacy-name-filter",
        global = true,
        help_heading = "Search",
        help = "Send the quantity under 'name' when an earlier filter is present, like the old front end."
    )]
    pub legacy_name_filter: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a record from the form.
    Create(FieldArgs),
    /// Update the record named by the form's id.
    Update(FieldArgs),
    /// Restock the record named by the form's id.
    Restock(FieldArgs),
    /// Load the record named by the form's id into the form.
    Retrieve(FieldArgs),
    /// Delete the record named by the form's id.
    Delete(FieldArgs),
    /// Search with the non-empty filter fields and show the matches.
    Search(FieldArgs),
    /// Clear the id, every field and the status message.
    Clear,
    /// Print the stored form without contacting the service.
    Show,
    /// Check the service health endpoint.
    Health,
    /// Interactive session holding the form in memory.
    Shell,
    /// Write a commented default config file.
    Init,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FieldArgs {
    #[arg(
        long = "id",
        value_name = "ID",
        help_heading = "Form",
        help = "Record identifier."
    )]
    pub id: Option<String>,

    #[arg(
        long = "name",
        value_name = "TEXT",
        help_heading = "Form",
        help = "Product name."
    )]
    pub name: Option<String>,

    #[arg(
        long = "quantity",
        visible_alias = "qty",
        value_name = "N",
        help_heading = "Form",
        help = "Units in stock."
    )]
    pub quantity: Option<String>,

    #[arg(
        long = "restock-level",
        value_name = "N",
        help_heading = "Form",
        help = "Reorder threshold."
    )]
    pub restock_level: Option<String>,

    #[arg(
        long = "restock-count",
        value_name = "N",
        help_heading = "Form",
        help = "Units added per restock."
    )]
    pub restock_count: Option<String>,

    #[arg(
        long = "condition",
        value_name = "CONDITION",
        help_heading = "Form",
        help = "NEW, OPEN_BOX, USED or UNKNOWN."
    )]
    pub condition: Option<String>,

    #[arg(
        long = "first-entry-date",
        value_name = "YYYY-MM-DD",
        help_heading = "Form",
        help = "Date first entered."
    )]
    pub first_entry_date: Option<String>,

    #[arg(
        long = "last-restock-date",
        value_name = "YYYY-MM-DD",
        help_heading = "Form",
        help = "Date last restocked."
    )]
    pub last_restock_date: Option<String>,

    #[arg(
        long = "reset",
        value_name = "FIELD",
        action = ArgAction::Append,
        help_heading = "Form",
        help = "Reset a field to its default before the action (repeatable)."
    )]
    pub reset: Vec<String>,
}

impl FieldArgs {
    /// Field values given on the command line, in canonical field order.
    pub fn overrides(&self) -> Vec<(Field, String)> {
        let values = [
            &self.id,
            &self.name,
            &self.quantity,
            &self.restock_level,
            &self.restock_count,
            &self.condition,
            &self.first_entry_date,
            &self.last_restock_date,
        ];
        Field::ALL
            .into_iter()
            .zip(values)
            .filter_map(|(field, value)| value.clone().map(|v| (field, v)))
            .collect()
    }
}
