use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context};
use bytes::Bytes;
use cdngate::Gateway;
use clap::{Args, Subcommand};
use colored::Colorize;

#[derive(Subcommand, Debug)]
pub enum BlobCommand {
    /// Upload a local file as a blob
    Put(PutArgs),
    /// Download a blob to a file or stdout
    Get(GetArgs),
    /// Check whether a blob exists
    Exists(NameArgs),
    /// Delete a blob
    Rm(NameArgs),
}

#[derive(Args, Debug)]
pub struct PutArgs {
    /// Blob name, including the extension used to infer its content type
    name: String,

    /// Local file to upload
    file: PathBuf,

    /// Explicit content type instead of inferring it from the name
    #[arg(long)]
    content_type: Option<String>,
}

#[derive(Args, Debug)]
pub struct GetArgs {
    name: String,

    /// Output file (stdout when omitted)
    #[arg(long, short)]
    output: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    name: String,
}

impl BlobCommand {
    pub async fn execute(self, gateway: &mut Gateway) -> anyhow::Result<()> {
        match self {
            BlobCommand::Put(args) => {
                let contents = tokio::fs::read(&args.file)
                    .await
                    .with_context(|| format!("Failed to read {}", args.file.display()))?;

                let mut blob = gateway.blob(&args.name);
                blob.set_contents(Bytes::from(contents)).await?;
                if let Some(content_type) = args.content_type {
                    blob.set_content_type(content_type).await?;
                }
                let receipt = blob.save().await?;
                let content_type = blob
                    .content_type()
                    .await?
                    .unwrap_or("unknown")
                    .to_string();

                println!(
                    "{} {} ({} bytes, {})",
                    "Saved".green().bold(),
                    args.name,
                    receipt.size,
                    content_type
                );
                if let Some(uri) = blob.uri().await? {
                    println!("  uri:        {}", uri);
                }
                if let Some(uri) = blob.secure_uri().await? {
                    println!("  secure uri: {}", uri);
                }
            }
            BlobCommand::Get(args) => {
                let mut blob = gateway.blob(&args.name);
                if !blob.is_exists().await? {
                    bail!("Blob '{}' does not exist", args.name);
                }
                let contents = blob.contents().await?.cloned().unwrap_or_default();

                match args.output {
                    Some(path) => {
                        tokio::fs::write(&path, &contents)
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        eprintln!("Wrote {} bytes to {}", contents.len(), path.display());
                    }
                    None => {
                        let mut stdout = std::io::stdout().lock();
                        stdout.write_all(&contents)?;
                        stdout.flush()?;
                    }
                }
            }
            BlobCommand::Exists(args) => {
                let exists = gateway.blob(&args.name).is_exists().await?;
                println!("{}", exists);
            }
            BlobCommand::Rm(args) => {
                if gateway.blob(&args.name).delete().await? {
                    println!("{} {}", "Deleted".red().bold(), args.name);
                } else {
                    println!("{} {} does not exist", "Skipped".yellow(), args.name);
                }
            }
        }
        Ok(())
    }
}
