use cdngate::Gateway;
use clap::{Args, Subcommand};
use colored::Colorize;
use tracing::info;

#[derive(Subcommand, Debug)]
pub enum ContainerCommand {
    /// Show account usage and the bound container as JSON
    Info,
    /// List blob names in the bound container
    List,
    /// Delete every blob and then the container itself
    DeleteContainer(DeleteContainerArgs),
}

#[derive(Args, Debug)]
pub struct DeleteContainerArgs {
    /// Must be exactly "yes I confirm deletion of current container"
    #[arg(long)]
    confirm: String,
}

impl ContainerCommand {
    pub async fn execute(self, gateway: &mut Gateway) -> anyhow::Result<()> {
        match self {
            ContainerCommand::Info => {
                let info = gateway.info().await?;
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            ContainerCommand::List => {
                let blobs = gateway.blobs().await?;
                for blob in &blobs {
                    println!("{}", blob.name());
                }
                info!("{} blob(s)", blobs.len());
            }
            ContainerCommand::DeleteContainer(args) => {
                let name = gateway
                    .container()
                    .map(|c| c.name.clone())
                    .unwrap_or_default();
                let deleted = gateway.delete(&args.confirm).await?;
                println!(
                    "{} container {} ({} blob(s) removed)",
                    "Deleted".red().bold(),
                    name.bold(),
                    deleted
                );
            }
        }
        Ok(())
    }
}
