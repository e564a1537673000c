use anyhow::Result;
use colored::Colorize;
use oauth2_docstore::{Client, TokenRecord};
use serde_json::{Value, json};
use tabled::builder::Builder;
use tabled::settings::Style;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::cli::OutputFormat;

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

pub fn print_client(client: &Client, show_secret: bool, format: OutputFormat) -> Result<()> {
    let secret = if show_secret {
        client.secret.clone()
    } else {
        mask(&client.secret)
    };
    let value = json!({
        "id": client.id,
        "secret": secret,
        "domain": client.domain,
        "user_id": client.user_id,
    });
    print_value(&value, format)
}

pub fn print_token(record: &TokenRecord, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(record)?);
        }
        OutputFormat::Table => {
            let now = OffsetDateTime::now_utc();
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            builder.push_record(["client_id", record.client_id.as_str()]);
            builder.push_record(["user_id", record.user_id.as_str()]);
            builder.push_record(["redirect_uri", record.redirect_uri.as_str()]);
            builder.push_record(["scope", record.scope.as_str()]);
            for (name, value, expires_at, expired) in [
                (
                    "code",
                    &record.code,
                    record.code_expires_at(),
                    record.is_code_expired(now),
                ),
                (
                    "access",
                    &record.access,
                    record.access_expires_at(),
                    record.is_access_expired(now),
                ),
                (
                    "refresh",
                    &record.refresh,
                    record.refresh_expires_at(),
                    record.is_refresh_expired(now),
                ),
            ] {
                let Some(value) = value else { continue };
                builder.push_record([name.to_string(), value.clone()]);
                builder.push_record([
                    format!("{name}_expires_at"),
                    describe_expiry(expires_at, expired),
                ]);
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
    Ok(())
}

fn print_value(value: &Value, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
        }
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Field", "Value"]);
            if let Some(obj) = value.as_object() {
                for (key, val) in obj {
                    let shown = val.as_str().map_or_else(|| val.to_string(), str::to_string);
                    builder.push_record([key.clone(), shown]);
                }
            }
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
    Ok(())
}

fn describe_expiry(expires_at: Option<OffsetDateTime>, expired: bool) -> String {
    match expires_at {
        None => "never".to_string(),
        Some(at) => {
            let formatted = at.format(&Rfc3339).unwrap_or_else(|_| at.to_string());
            if expired {
                format!("{formatted} (expired)")
            } else {
                formatted
            }
        }
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        String::new()
    } else {
        "****".to_string()
    }
}
