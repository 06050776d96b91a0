use crate::cli::args::{CliArgs, Command, FieldArgs};

fn validate_field_args(fields: &FieldArgs) -> Result<(), String> {
    for raw in fields.reset.iter() {
        if crate::form::Field::parse(raw).is_none() {
            return Err(format!("invalid --reset '{raw}': unknown field"));
        }
    }
    Ok(())
}

pub fn validate(args: &CliArgs) -> Result<(), String> {
    if let Some(timeout) = args.timeout {
        if timeout == 0 {
            return Err("invalid timeout, expected positive integer".to_string());
        }
    }
    if let Some(raw) = args.base_url.as_deref() {
        reqwest::Url::parse(raw.trim()).map_err(|e| format!("invalid --url '{raw}': {e}"))?;
    }
    if let Some(raw) = args.header.as_deref() {
        crate::client::parse_header(raw).map_err(|e| e.to_string())?;
    }
    if let Some(raw) = args.output_format.as_deref() {
        if crate::output::OutputFormat::parse(raw).is_none() {
            return Err(format!(
                "invalid --output-format '{raw}', expected text, json, xml or html"
            ));
        }
    }
    if let Some(raw) = args.search_fields.as_deref() {
        crate::query::parse_search_fields_csv(raw)
            .map_err(|e| format!("invalid --search-fields '{raw}': {e}"))?;
    }
    match &args.command {
        Command::Create(f)
        | Command::Update(f)
        | Command::Restock(f)
        | Command::Retrieve(f)
        | Command::Delete(f)
        | Command::Search(f) => validate_field_args(f)?,
        Command::Clear | Command::Show | Command::Health | Command::Shell | Command::Init => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> CliArgs {
        CliArgs::parse_from(argv)
    }

    #[test]
    fn accepts_plain_invocation() {
        assert!(validate(&parse(&["invctl", "retrieve", "--id", "1"])).is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        assert!(validate(&parse(&["invctl", "-T", "0", "show"])).is_err());
        assert!(validate(&parse(&["invctl", "-u", "not a url", "show"])).is_err());
        assert!(validate(&parse(&["invctl", "-H", "nocolon", "show"])).is_err());
        assert!(validate(&parse(&["invctl", "-A", "csv", "show"])).is_err());
        assert!(validate(&parse(&["invctl", "--sf", "id,price", "search"])).is_err());
        assert!(validate(&parse(&["invctl", "update", "--reset", "colour"])).is_err());
    }
}
