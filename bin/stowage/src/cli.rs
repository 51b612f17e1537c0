//! Command-line definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stowage_client::{AuthArgs, ByteRange, ChainArgs, SpArgs, Tag, TxArgs, TxHash, Visibility};

use crate::{config::StowageConfig, logging::LogArgs};

/// Stowage - client for a decentralized object-storage network
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub(crate) logs: LogArgs,

    /// TOML configuration file.
    #[arg(long, global = true, value_name = "FILE")]
    pub(crate) config: Option<PathBuf>,

    #[command(flatten)]
    pub(crate) chain: ChainArgs,

    #[command(flatten)]
    pub(crate) tx: TxArgs,

    #[command(flatten)]
    pub(crate) auth: AuthArgs,

    #[command(flatten)]
    pub(crate) sp: SpArgs,

    #[command(subcommand)]
    pub(crate) command: Commands,
}

impl Cli {
    /// The flag layer of the configuration.
    pub(crate) fn overrides(&self) -> StowageConfig {
        StowageConfig {
            chain: self.chain.clone(),
            tx: self.tx.clone(),
            auth: self.auth.clone(),
            sp: self.sp.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
pub(crate) enum Commands {
    /// Bucket operations.
    #[command(subcommand)]
    Bucket(BucketCommand),
    /// Object operations.
    #[command(subcommand)]
    Object(ObjectCommand),
    /// Transaction queries.
    #[command(subcommand)]
    Tx(TxCommand),
}

#[derive(Debug, Subcommand)]
pub(crate) enum BucketCommand {
    /// Create a bucket.
    Create(CreateBucketArgs),
    /// List buckets of an account.
    Ls {
        /// Account to list; defaults to the configured account.
        #[arg(long)]
        account: Option<String>,
        /// Include buckets that were deleted.
        #[arg(long)]
        include_removed: bool,
    },
}

#[derive(Debug, Args)]
pub(crate) struct CreateBucketArgs {
    pub(crate) bucket: String,

    /// Operator address of the primary provider.
    #[arg(long, value_name = "ADDRESS")]
    pub(crate) primary_sp: Option<String>,

    #[arg(long, default_value_t = Visibility::Private)]
    pub(crate) visibility: Visibility,

    /// Account paying for the bucket; defaults to the sender.
    #[arg(long, value_name = "ADDRESS")]
    pub(crate) payment_address: Option<String>,

    #[arg(long, default_value_t = 0)]
    pub(crate) charged_quota: u64,

    /// Tag as `key=value`. Repeatable.
    #[arg(long = "tag", value_parser = parse_tag)]
    pub(crate) tags: Vec<Tag>,
}

#[derive(Debug, Subcommand)]
pub(crate) enum ObjectCommand {
    /// Create an object and upload its payload.
    Put {
        bucket: String,
        object: String,
        /// File to upload.
        file: PathBuf,
        #[arg(long)]
        content_type: Option<String>,
        /// Defaults to the bucket's visibility.
        #[arg(long)]
        visibility: Option<Visibility>,
    },
    /// Download an object.
    Get {
        bucket: String,
        object: String,
        /// Write here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// Byte range `start-end` or `start-`.
        #[arg(long, value_parser = parse_range)]
        range: Option<ByteRange>,
    },
    /// List objects in a bucket.
    Ls {
        bucket: String,
        #[arg(long)]
        prefix: Option<String>,
        #[arg(long)]
        delimiter: Option<String>,
        #[arg(long)]
        max_keys: Option<u64>,
        #[arg(long)]
        continuation_token: Option<String>,
    },
}

#[derive(Debug, Subcommand)]
pub(crate) enum TxCommand {
    /// Wait for a submitted transaction.
    Wait {
        hash: TxHash,
    },
}

fn parse_tag(s: &str) -> Result<Tag, String> {
    let (key, value) = s.split_once('=').ok_or_else(|| format!("expected key=value, got {s}"))?;
    Ok(Tag::new(key, value))
}

fn parse_range(s: &str) -> Result<ByteRange, String> {
    let (start, end) = s.split_once('-').ok_or_else(|| format!("expected start-end, got {s}"))?;
    let start = start.parse().map_err(|e| format!("range start: {e}"))?;
    let end = if end.is_empty() { None } else { Some(end.parse().map_err(|e| format!("range end: {e}"))?) };
    Ok(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_bucket_create() {
        let cli = Cli::parse_from([
            "stowage",
            "--chain.id",
            "x_1-1",
            "bucket",
            "create",
            "photos",
            "--visibility",
            "public-read",
            "--tag",
            "team=media",
        ]);
        assert_eq!(cli.overrides().chain.id.as_deref(), Some("x_1-1"));
        let Commands::Bucket(BucketCommand::Create(args)) = cli.command else { panic!("wrong command") };
        assert_eq!(args.bucket, "photos");
        assert_eq!(args.visibility, Visibility::PublicRead);
        assert_eq!(args.tags, vec![Tag::new("team", "media")]);
    }

    #[test]
    fn ranges_and_tags() {
        assert_eq!(parse_range("10-19").unwrap(), ByteRange { start: 10, end: Some(19) });
        assert_eq!(parse_range("5-").unwrap(), ByteRange { start: 5, end: None });
        assert!(parse_range("5").is_err());
        assert!(parse_tag("novalue").is_err());
    }
}
