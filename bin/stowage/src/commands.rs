//! Subcommand handlers.

use std::{io::Write, path::Path};

use eyre::{Result, WrapErr, bail};
use stowage_client::{
    Client, CreateBucketOptions, CreateObjectOptions, ListObjectsOptions, TxOptions, TxOutcome, TxSubmission,
    cancel_pair,
};
use tracing::{info, warn};

use crate::cli::{BucketCommand, Commands, CreateBucketArgs, ObjectCommand, TxCommand};

/// Run `command`. Ctrl-C stops confirmation polling; the hash is still
/// reported.
pub(crate) async fn run(client: Client, command: Commands) -> Result<()> {
    let (handle, token) = cancel_pair();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted; giving up on confirmation");
            handle.cancel();
        }
    });
    let tx = TxOptions { cancel: Some(token), ..client.tx_options() };

    match command {
        Commands::Bucket(BucketCommand::Create(args)) => create_bucket(&client, args, tx).await,
        Commands::Bucket(BucketCommand::Ls { account, include_removed }) => {
            for bucket in client.list_buckets(account.as_deref(), include_removed).await? {
                let removed = if bucket.removed { " (removed)" } else { "" };
                println!("{}\t{}\t{}{removed}", bucket.create_at, bucket.visibility, bucket.bucket_name);
            }
            Ok(())
        }
        Commands::Object(ObjectCommand::Put { bucket, object, file, content_type, visibility }) => {
            let content = tokio::fs::read(&file).await.wrap_err_with(|| format!("reading {}", file.display()))?;
            let opts = CreateObjectOptions { visibility, content_type: content_type.clone(), tx, ..Default::default() };
            let submission = client.create_object(&bucket, &object, &content, &opts).await?;
            let hash = submission.hash;
            let confirmed = match &submission.outcome {
                Some(outcome) => matches!(outcome, TxOutcome::Confirmed(_)),
                None => matches!(client.wait_for_tx(hash, &opts.tx).await, TxOutcome::Confirmed(_)),
            };
            report(submission)?;
            if !confirmed {
                bail!("object {object} is not confirmed on chain; upload the payload once {hash} is included");
            }
            client.put_object(&bucket, &object, content.into(), content_type.as_deref(), Some(hash)).await?;
            info!(%bucket, %object, "uploaded");
            Ok(())
        }
        Commands::Object(ObjectCommand::Get { bucket, object, output, range }) => {
            let fetched = client.get_object(&bucket, &object, range).await?;
            write_output(output.as_deref(), &fetched.content).await
        }
        Commands::Object(ObjectCommand::Ls { bucket, prefix, delimiter, max_keys, continuation_token }) => {
            let opts = ListObjectsOptions { prefix, delimiter, max_keys, continuation_token };
            let listing = client.list_objects(&bucket, &opts).await?;
            for object in &listing.objects {
                println!("{}\t{}\t{}", object.create_at, object.payload_size, object.object_name);
            }
            for prefix in &listing.common_prefixes {
                println!("PRE\t{prefix}");
            }
            if listing.is_truncated {
                println!("more results: --continuation-token {}", listing.next_continuation_token);
            }
            Ok(())
        }
        Commands::Tx(TxCommand::Wait { hash }) => {
            let outcome = client.wait_for_tx(hash, &tx).await;
            report(TxSubmission { hash, outcome: Some(outcome) })
        }
    }
}

async fn create_bucket(client: &Client, args: CreateBucketArgs, tx: TxOptions) -> Result<()> {
    let primary_sp = match args.primary_sp {
        Some(sp) => sp,
        None => client.default_primary_sp().await?.to_string(),
    };
    let opts = CreateBucketOptions {
        visibility: Some(args.visibility),
        payment_address: args.payment_address,
        charged_quota: args.charged_quota,
        tags: args.tags,
        tx,
    };
    report(client.create_bucket(&args.bucket, &primary_sp, &opts).await?)
}

/// Print the hash and the outcome. A definite failure is an error.
fn report(submission: TxSubmission) -> Result<()> {
    println!("{}", submission.hash);
    match submission.outcome {
        Some(TxOutcome::Confirmed(inclusion)) => println!("confirmed at height {}", inclusion.height),
        Some(TxOutcome::Failed(inclusion)) => {
            bail!("failed code={} codespace={}: {}", inclusion.code, inclusion.codespace, inclusion.raw_log)
        }
        Some(TxOutcome::Unconfirmed) => {
            println!("submitted, not yet confirmed; check later with `stowage tx wait {}`", submission.hash)
        }
        None => println!("submitted asynchronously"),
    }
    Ok(())
}

async fn write_output(path: Option<&Path>, content: &[u8]) -> Result<()> {
    match path {
        Some(path) => {
            tokio::fs::write(path, content).await.wrap_err_with(|| format!("writing {}", path.display()))
        }
        None => std::io::stdout().write_all(content).wrap_err("writing to stdout"),
    }
}
