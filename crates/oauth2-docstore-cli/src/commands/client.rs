use anyhow::{Context, Result};
use oauth2_docstore::{Client, ClientStorage};

use crate::cli::{ClientGetArgs, ClientSetArgs, OutputFormat};
use crate::output::{print_client, print_success};

pub async fn set(clients: &impl ClientStorage, args: &ClientSetArgs) -> Result<()> {
    let client = Client::new(&args.id, &args.secret, &args.domain, &args.user_id);
    clients
        .set(&client)
        .await
        .with_context(|| format!("Failed to store client '{}'", args.id))?;
    print_success(&format!("Stored client {}", args.id));
    Ok(())
}

pub async fn get(
    clients: &impl ClientStorage,
    args: &ClientGetArgs,
    format: OutputFormat,
) -> Result<()> {
    let client = clients.get_by_id(&args.id).await?;
    print_client(&client, args.show_secret, format)
}

pub async fn remove(clients: &impl ClientStorage, id: &str) -> Result<()> {
    clients
        .remove_by_id(id)
        .await
        .with_context(|| format!("Failed to remove client '{id}'"))?;
    print_success(&format!("Removed client {id}"));
    Ok(())
}
