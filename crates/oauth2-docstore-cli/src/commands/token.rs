use anyhow::{Result, bail};
use oauth2_docstore::{TokenIndex, TokenRecord, TokenStorage};

use crate::cli::{OutputFormat, TokenKeyArgs};
use crate::output::{print_success, print_token, print_warning};

async fn lookup(
    tokens: &impl TokenStorage,
    index: TokenIndex,
    key: &str,
) -> Result<Option<TokenRecord>> {
    let record = match index {
        TokenIndex::Code => tokens.get_by_code(key).await?,
        TokenIndex::Access => tokens.get_by_access(key).await?,
        TokenIndex::Refresh => tokens.get_by_refresh(key).await?,
    };
    Ok(record)
}

pub async fn get(
    tokens: &impl TokenStorage,
    args: &TokenKeyArgs,
    format: OutputFormat,
) -> Result<()> {
    let (index, key) = args.key();
    match lookup(tokens, index, key).await? {
        Some(record) => print_token(&record, format),
        None => bail!("No token record holds this {index}"),
    }
}

pub async fn remove(tokens: &impl TokenStorage, args: &TokenKeyArgs) -> Result<()> {
    let (index, key) = args.key();
    let result = match index {
        TokenIndex::Code => tokens.remove_by_code(key).await,
        TokenIndex::Access => tokens.remove_by_access(key).await,
        TokenIndex::Refresh => tokens.remove_by_refresh(key).await,
    };

    match result {
        Ok(()) => print_success(&format!("Token record for {index} removed")),
        Err(e) if e.is_conflict() => {
            print_warning(&format!("Token record for {index} was removed concurrently"));
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
